use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Normalized inbound chat message, decoupled from the gateway SDK.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Platform channel the message arrived in
    pub channel_id: u64,
    /// Platform user id of the author
    pub author_id: u64,
    /// Display name of the author
    pub author_name: String,
    /// True for messages authored by any bot account, including ourselves
    pub is_bot_author: bool,
    /// Raw message text
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// Outbound reply destined for the channel the triggering message came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub channel_id: u64,
    pub text: String,
}

impl Reply {
    pub fn new(channel_id: u64, text: impl Into<String>) -> Self {
        Self {
            channel_id,
            text: text.into(),
        }
    }
}
