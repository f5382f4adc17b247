mod config;
mod discord;
mod engine;
mod research;

use std::sync::Arc;

use dotenv::dotenv;
use serenity::all::GatewayIntents;
use tokio::sync::Mutex;
use tracing_subscriber::EnvFilter;

use config::BotConfig;
use discord::Handler;
use discord::voice::LoggingVoiceHook;
use engine::{ConversationState, Dispatcher, UniformPicker};
use research::WebResearcher;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = BotConfig::new_from_env();
    let research = Arc::new(WebResearcher::new()?);
    let state = ConversationState::new(&config);
    let dispatcher = Dispatcher::new(
        config.clone(),
        state,
        research,
        Arc::new(LoggingVoiceHook),
        Box::new(UniformPicker),
    );

    let intents = GatewayIntents::non_privileged() | GatewayIntents::MESSAGE_CONTENT;
    let mut client = serenity::Client::builder(&config.discord_token, intents)
        .event_handler(Handler::new(Arc::new(Mutex::new(dispatcher))))
        .await?;

    tracing::info!("Starting gateway client");
    client.start().await?;
    Ok(())
}
