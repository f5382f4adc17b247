use std::sync::Arc;

use futures::{
    SinkExt as _, StreamExt,
    channel::mpsc::{UnboundedReceiver, UnboundedSender},
};
use serenity::all::ChannelId;
use serenity::http::Http;
use tokio::sync::Mutex;
use tracing::Instrument as _;

use crate::engine::{Dispatcher, types::InboundMessage};

pub enum ChannelEvent {
    /// A new message has been received in the channel. Carries the http
    /// handle from the triggering gateway event so replies use a live
    /// connection.
    Message(InboundMessage, Arc<Http>),
}

struct ChannelState {
    event_recv: UnboundedReceiver<ChannelEvent>,
    channel_id: ChannelId,
    dispatcher: Arc<Mutex<Dispatcher>>,
}

impl ChannelState {
    // One task per channel: messages are dispatched strictly in arrival
    // order, so per-channel replies and the session FIFOs never interleave.
    async fn main_loop(mut self) {
        while let Some(event) = self.event_recv.next().await {
            let ChannelEvent::Message(msg, http) = event;
            let replies = self.dispatcher.lock().await.handle(&msg).await;
            for reply in replies {
                if let Err(e) = self.channel_id.say(&http, &reply.text).await {
                    tracing::error!(error = %e, "Failed to send reply");
                }
            }
        }
        tracing::info!("Channel event receiver closed, exiting main loop");
    }
}

pub struct ChannelHandle {
    event_send: UnboundedSender<ChannelEvent>,
    _main_loop_handle: tokio::task::JoinHandle<()>,
}

impl ChannelHandle {
    pub fn new(channel_id: ChannelId, dispatcher: Arc<Mutex<Dispatcher>>) -> Self {
        let (event_send, event_recv) = futures::channel::mpsc::unbounded();

        let state = ChannelState {
            event_recv,
            channel_id,
            dispatcher,
        };

        let main_loop_handle = tokio::spawn(state.main_loop().instrument(tracing::info_span!(
            "channel_main_loop",
            channel_id = channel_id.get()
        )));

        Self {
            event_send,
            _main_loop_handle: main_loop_handle,
        }
    }

    pub async fn send_event(&mut self, event: ChannelEvent) -> Result<(), eyre::Error> {
        self.event_send
            .send(event)
            .await
            .map_err(|e| eyre::eyre!(e))
    }
}
