use async_trait::async_trait;
use tracing::info;

use crate::engine::VoiceHook;

/// Voice audio plumbing lives outside the engine; sleeping a channel only
/// needs a best-effort release signal, which this hook satisfies by logging.
pub struct LoggingVoiceHook;

#[async_trait]
impl VoiceHook for LoggingVoiceHook {
    async fn release(&self, channel_id: u64) -> eyre::Result<()> {
        info!(channel_id, "Releasing voice resources for sleeping channel");
        Ok(())
    }
}
