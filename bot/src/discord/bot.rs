use std::{collections::HashMap, sync::Arc};

use serenity::all::{ChannelId, Message, Ready};
use serenity::async_trait;
use serenity::prelude::*;
use tokio::sync::{Mutex as TokioMutex, MutexGuard};

use crate::discord::channel::{ChannelEvent, ChannelHandle};
use crate::engine::{Dispatcher, types::InboundMessage};

pub struct Handler {
    dispatcher: Arc<TokioMutex<Dispatcher>>,
    channel_handles: Arc<TokioMutex<HashMap<ChannelId, ChannelHandle>>>,
}

impl Handler {
    pub fn new(dispatcher: Arc<TokioMutex<Dispatcher>>) -> Self {
        Self {
            dispatcher,
            channel_handles: Arc::new(TokioMutex::new(HashMap::new())),
        }
    }

    fn get_or_create_channel_handle<'a>(
        &self,
        lock: &'a mut MutexGuard<'_, HashMap<ChannelId, ChannelHandle>>,
        channel_id: ChannelId,
    ) -> &'a mut ChannelHandle {
        lock.entry(channel_id)
            .or_insert_with(|| ChannelHandle::new(channel_id, self.dispatcher.clone()))
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, ctx: Context, msg: Message) {
        let inbound = normalize(&msg);
        let _ = self
            .get_or_create_channel_handle(&mut self.channel_handles.lock().await, msg.channel_id)
            .send_event(ChannelEvent::Message(inbound, ctx.http.clone()))
            .await
            .inspect_err(|e| {
                tracing::error!(?e, "Failed to send Message event");
            });
    }

    async fn ready(&self, _ctx: Context, ready: Ready) {
        tracing::info!("Discord bot {} is connected!", ready.user.name);
    }
}

fn normalize(msg: &Message) -> InboundMessage {
    let timestamp = chrono::DateTime::from_timestamp(
        msg.timestamp.timestamp(),
        msg.timestamp.timestamp_subsec_nanos(),
    )
    .unwrap_or_else(chrono::Utc::now);

    InboundMessage {
        channel_id: msg.channel_id.get(),
        author_id: msg.author.id.get(),
        author_name: msg.author.name.clone(),
        is_bot_author: msg.author.bot,
        text: msg.content.clone(),
        timestamp,
    }
}
