use std::str::FromStr;
use std::time::Duration;

use crate::engine::constants::{
    DEFAULT_RECENT_CAPACITY, DEFAULT_RESEARCH_TIMEOUT, DEFAULT_SEEN_KEYWORDS_CAP,
    DEFAULT_SLEEP_PHRASE, DEFAULT_THOUGHT_CAPACITY, DEFAULT_WAKE_PHRASES,
};

/// Everything tunable about the bot, supplied explicitly at construction.
/// No component reads the environment after this is built.
#[derive(Clone)]
pub struct BotConfig {
    pub discord_token: String,
    /// Lowercased phrases that wake an asleep channel
    pub wake_phrases: Vec<String>,
    /// Lowercased phrase that puts an awake channel back to sleep
    pub sleep_phrase: String,
    pub recent_capacity: usize,
    pub thought_capacity: usize,
    pub seen_keywords_cap: usize,
    /// Upper bound on any one research collaborator call
    pub research_timeout: Duration,
    /// Freeze the intent classifier after seeding (disables online learning)
    pub freeze_model: bool,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            discord_token: String::new(),
            wake_phrases: DEFAULT_WAKE_PHRASES.iter().map(|s| s.to_string()).collect(),
            sleep_phrase: DEFAULT_SLEEP_PHRASE.to_string(),
            recent_capacity: DEFAULT_RECENT_CAPACITY,
            thought_capacity: DEFAULT_THOUGHT_CAPACITY,
            seen_keywords_cap: DEFAULT_SEEN_KEYWORDS_CAP,
            research_timeout: DEFAULT_RESEARCH_TIMEOUT,
            freeze_model: false,
        }
    }
}

fn var(key: &str) -> Option<String> {
    match std::env::var(key) {
        Ok(val) => Some(val),
        Err(std::env::VarError::NotPresent) => None,
        Err(std::env::VarError::NotUnicode(_)) => {
            tracing::warn!("Environment variable `{key}` is not valid unicode, ignoring");
            None
        }
    }
}

fn required_var(key: &str) -> String {
    match var(key) {
        Some(val) => val,
        None => {
            tracing::error!("Environment variable `{key}` is required");
            std::process::exit(1)
        }
    }
}

fn parsed_var<T: FromStr>(key: &str, default: T) -> T {
    match var(key) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!("Could not parse environment variable `{key}`, using default");
            default
        }),
        None => default,
    }
}

fn parse_phrase_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|p| p.trim().to_lowercase())
        .filter(|p| !p.is_empty())
        .collect()
}

impl BotConfig {
    pub fn new_from_env() -> Self {
        let defaults = Self::default();

        let wake_phrases = match var("BOT_WAKE_PHRASES").as_deref().map(parse_phrase_list) {
            Some(phrases) if !phrases.is_empty() => phrases,
            _ => defaults.wake_phrases,
        };

        Self {
            discord_token: required_var("DISCORD_BOT_TOKEN"),
            wake_phrases,
            sleep_phrase: var("BOT_SLEEP_PHRASE")
                .map(|p| p.to_lowercase())
                .unwrap_or(defaults.sleep_phrase),
            recent_capacity: parsed_var("BOT_RECENT_CAPACITY", defaults.recent_capacity),
            thought_capacity: parsed_var("BOT_THOUGHT_CAPACITY", defaults.thought_capacity),
            seen_keywords_cap: parsed_var("BOT_SEEN_KEYWORDS_CAP", defaults.seen_keywords_cap),
            research_timeout: Duration::from_secs(parsed_var(
                "BOT_RESEARCH_TIMEOUT_SECS",
                defaults.research_timeout.as_secs(),
            )),
            freeze_model: parsed_var("BOT_FREEZE_MODEL", false),
        }
    }
}
