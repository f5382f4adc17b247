pub mod classify;
pub mod constants;
pub mod safety;
pub mod session;
pub mod types;

use std::sync::Arc;

use async_trait::async_trait;
use rand::seq::IndexedRandom;
use regex::Regex;
use tracing::warn;

use crate::config::BotConfig;
use classify::{IntentClassifier, Topic, tokenize};
use constants::*;
use safety::{SafetyFilter, Verdict};
use session::SessionStore;
use types::{InboundMessage, Reply};

/// External best-effort answering service consulted for question-shaped
/// input. Implementations must never surface errors; failures become `None`.
#[async_trait]
pub trait ResearchCollaborator: Send + Sync {
    async fn query(&self, text: &str) -> Option<String>;

    /// Public repository metadata summary for `github repo owner/repo`.
    async fn repo_info(&self, owner: &str, repo: &str) -> Option<String>;
}

/// Best-effort release of any voice resource attached to a channel, invoked
/// when the channel goes to sleep. Failures are logged by the caller.
#[async_trait]
pub trait VoiceHook: Send + Sync {
    async fn release(&self, channel_id: u64) -> eyre::Result<()>;
}

/// Uniform choice over a fixed phrase set. Injected so tests can substitute
/// a deterministic picker.
pub trait PhrasePicker: Send + Sync {
    fn pick<'a>(&mut self, options: &'a [&'a str]) -> &'a str;
}

pub struct UniformPicker;

impl PhrasePicker for UniformPicker {
    fn pick<'a>(&mut self, options: &'a [&'a str]) -> &'a str {
        options
            .choose(&mut rand::rng())
            .copied()
            .unwrap_or(NO_ANSWER_FILLER)
    }
}

/// All mutable conversational state, aggregated so it is injected into the
/// dispatcher rather than living in module-level globals.
pub struct ConversationState {
    pub sessions: SessionStore,
    pub classifier: IntentClassifier,
}

impl ConversationState {
    pub fn new(config: &BotConfig) -> Self {
        Self {
            sessions: SessionStore::new(
                config.recent_capacity,
                config.thought_capacity,
                config.seen_keywords_cap,
            ),
            classifier: IntentClassifier::new(config.freeze_model),
        }
    }
}

/// The conversational core: one ordered rule list evaluated per inbound
/// message, first match wins. Owns the injected state exclusively; the
/// discord layer only feeds it normalized messages and ships the replies
/// back out.
pub struct Dispatcher {
    config: BotConfig,
    state: ConversationState,
    safety: SafetyFilter,
    research: Arc<dyn ResearchCollaborator>,
    voice: Arc<dyn VoiceHook>,
    picker: Box<dyn PhrasePicker>,
    github_command: Regex,
}

impl Dispatcher {
    pub fn new(
        config: BotConfig,
        state: ConversationState,
        research: Arc<dyn ResearchCollaborator>,
        voice: Arc<dyn VoiceHook>,
        picker: Box<dyn PhrasePicker>,
    ) -> Self {
        Self {
            config,
            state,
            safety: SafetyFilter::new(),
            research,
            voice,
            picker,
            github_command: Regex::new(r"github repo\s+([\w-]+)/([\w.-]+)").unwrap(),
        }
    }

    /// Process one inbound message and return the replies to emit, in order.
    /// Never fails: every internal failure degrades to a fixed phrase.
    pub async fn handle(&mut self, msg: &InboundMessage) -> Vec<Reply> {
        if msg.is_bot_author {
            return vec![];
        }
        if msg.text.trim().is_empty() {
            return vec![];
        }

        let lower = msg.text.to_lowercase();
        self.state
            .sessions
            .record_message(msg.channel_id, &msg.author_name, &msg.text, msg.timestamp);

        // Online learning: fold every utterance back in under its own best
        // guess, as the source bot did. Drifts with conversation history.
        let topic = self.state.classifier.classify(&lower);
        self.state.classifier.train(&lower, topic);

        if !self.state.sessions.is_awake(msg.channel_id) {
            return self.handle_asleep(msg, &lower);
        }

        if lower.contains(&self.config.sleep_phrase) {
            return self.handle_sleep(msg).await;
        }

        if let Some(caps) = self.github_command.captures(&lower) {
            let owner = caps[1].to_string();
            let repo = caps[2].to_string();
            let reply = self
                .bounded(self.research.repo_info(&owner, &repo))
                .await
                .unwrap_or_else(|| GITHUB_LOOKUP_FAILED.to_string());
            return vec![Reply::new(msg.channel_id, reply)];
        }

        if let Some(command) = msg.text.trim().strip_prefix(COMMAND_PREFIX) {
            return self.handle_command(msg, command);
        }

        self.handle_conversation(msg, &lower, topic).await
    }

    fn handle_asleep(&mut self, msg: &InboundMessage, lower: &str) -> Vec<Reply> {
        let mentioned = self
            .config
            .wake_phrases
            .iter()
            .any(|phrase| lower.contains(phrase.as_str()));
        if mentioned {
            self.state.sessions.wake(msg.channel_id);
            let greeting = self.picker.pick(&GREETINGS);
            return vec![Reply::new(msg.channel_id, greeting)];
        }

        // Narrow fallback: only fires once the channel has already talked
        // about one of the two home topics. No state change.
        if self.state.sessions.has_keyword(msg.channel_id, "discord") {
            return vec![Reply::new(msg.channel_id, ASLEEP_DISCORD_FALLBACK)];
        }
        if self.state.sessions.has_keyword(msg.channel_id, "runescape")
            || self.state.sessions.has_keyword(msg.channel_id, "rs")
        {
            return vec![Reply::new(msg.channel_id, ASLEEP_RUNESCAPE_FALLBACK)];
        }
        vec![]
    }

    async fn handle_sleep(&mut self, msg: &InboundMessage) -> Vec<Reply> {
        self.state.sessions.sleep(msg.channel_id);
        if let Err(e) = self.voice.release(msg.channel_id).await {
            warn!(channel_id = msg.channel_id, error = %e, "Failed to release voice resource");
        }
        vec![Reply::new(msg.channel_id, FAREWELL)]
    }

    fn handle_command(&mut self, msg: &InboundMessage, command: &str) -> Vec<Reply> {
        let name = command
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_lowercase();
        let text = match name.as_str() {
            "help" => HELP_TEXT.to_string(),
            "ping" => PONG.to_string(),
            "tip" => format!("Wise Old Man's Tip: {}", self.picker.pick(&TIPS)),
            _ => UNKNOWN_COMMAND.to_string(),
        };
        vec![Reply::new(msg.channel_id, text)]
    }

    async fn handle_conversation(
        &mut self,
        msg: &InboundMessage,
        lower: &str,
        topic: Topic,
    ) -> Vec<Reply> {
        let mut replies = Vec::new();
        let action;

        match self.safety.classify(&msg.text) {
            Verdict::Forbidden => {
                replies.push(Reply::new(msg.channel_id, FORBIDDEN_REFUSAL));
                action = "refused forbidden topic";
                self.finish_with_notes(msg, topic, action, &mut replies);
                return replies;
            }
            Verdict::InGameTrade => {
                // Advisory only; the substantive answer still follows.
                replies.push(Reply::new(msg.channel_id, TRADE_REMINDER));
            }
            Verdict::Neutral => {}
        }

        if is_question(&msg.text, lower) {
            let answer = self
                .bounded(self.research.query(&msg.text))
                .await
                .unwrap_or_else(|| NO_ANSWER_FILLER.to_string());
            replies.push(Reply::new(msg.channel_id, answer));
            action = "researched online";
        } else {
            replies.push(Reply::new(msg.channel_id, template_reply(lower, topic)));
            action = "general conversation";
        }

        self.finish_with_notes(msg, topic, action, &mut replies);
        replies
    }

    /// Rule 8: record a structured thought entry and append the rendered
    /// notes summary as a trailing reply.
    fn finish_with_notes(
        &mut self,
        msg: &InboundMessage,
        topic: Topic,
        action: &str,
        replies: &mut Vec<Reply>,
    ) {
        let entry = format!(
            "Thought[{}]: author={}, topic={}, query=\"{}\", action={}",
            msg.timestamp.format("%H:%M:%S"),
            msg.author_name,
            topic,
            msg.text,
            action,
        );
        self.state.sessions.push_thought(msg.channel_id, entry);
        let notes = self.state.sessions.render_thoughts(msg.channel_id);
        replies.push(Reply::new(
            msg.channel_id,
            format!("{NOTES_HEADER}{notes}"),
        ));
    }

    /// Research calls are the only suspension point and must never stall a
    /// channel; past the deadline they are treated as a null answer.
    async fn bounded<F>(&self, fut: F) -> Option<String>
    where
        F: Future<Output = Option<String>>,
    {
        match tokio::time::timeout(self.config.research_timeout, fut).await {
            Ok(answer) => answer,
            Err(_) => {
                warn!(
                    timeout_secs = self.config.research_timeout.as_secs(),
                    "Research collaborator timed out"
                );
                None
            }
        }
    }

    #[cfg(test)]
    pub fn sessions_mut(&mut self) -> &mut SessionStore {
        &mut self.state.sessions
    }
}

fn is_question(text: &str, lower: &str) -> bool {
    if text.trim_end().ends_with('?') {
        return true;
    }
    tokenize(lower)
        .iter()
        .any(|t| matches!(t.as_str(), "what" | "where" | "how"))
}

fn template_reply(lower: &str, topic: Topic) -> String {
    let tokens = tokenize(lower);
    if tokens
        .iter()
        .any(|t| matches!(t.as_str(), "hey" | "hi" | "hello"))
    {
        return "Hello there! The Wise Old Man greets you warmly.".to_string();
    }
    match topic {
        Topic::Economy => {
            "Coin, coin, coin! Consult the Grand Exchange for prices; the market waits for no one."
        }
        Topic::Quest => {
            "Questing, are we? Read the journal twice and check the Wiki before you set out."
        }
        Topic::Skill => "Every level is earned one action at a time. Which skill calls to you?",
        Topic::Pvm | Topic::Boss => {
            "Bosses fall to preparation, not bravado. Bring food, learn the mechanics, and mind the enrage."
        }
        Topic::Discord => {
            "With the wisdom of many years, I say: Discord is a fine tool for gathering adventurers. What do you wish to know, young one?"
        }
        Topic::Voice => {
            "If it's voices you're after, gather your party in a voice channel and speak up. These old ears still work!"
        }
        Topic::Event | Topic::Activity => {
            "Seasonal events and distractions aplenty! Don't let the XP pass you by."
        }
        Topic::Achievement | Topic::Collection => {
            "Chasing capes and codexes, eh? Patience fills every log eventually."
        }
        Topic::Player => "Every adventurer leaves a trail. The hiscores remember what we forget.",
        Topic::Routine | Topic::Meta => {
            "Dailies, rotations, and good habits: that is how fortunes are quietly made."
        }
        Topic::Drop | Topic::Pet | Topic::Magic => {
            "Rare things come to those who keep rolling the dice. Stay at it!"
        }
        Topic::General => "The world is full of mysteries! Ask away, and perhaps this old wizard can help.",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubResearcher {
        answer: Option<String>,
        queries: Mutex<Vec<String>>,
        repo_lookups: Mutex<Vec<(String, String)>>,
    }

    impl StubResearcher {
        fn answering(answer: Option<&str>) -> Arc<Self> {
            Arc::new(Self {
                answer: answer.map(String::from),
                queries: Mutex::new(vec![]),
                repo_lookups: Mutex::new(vec![]),
            })
        }
    }

    #[async_trait]
    impl ResearchCollaborator for StubResearcher {
        async fn query(&self, text: &str) -> Option<String> {
            self.queries.lock().unwrap().push(text.to_string());
            self.answer.clone()
        }

        async fn repo_info(&self, owner: &str, repo: &str) -> Option<String> {
            self.repo_lookups
                .lock()
                .unwrap()
                .push((owner.to_string(), repo.to_string()));
            self.answer.clone()
        }
    }

    struct CountingVoice {
        releases: AtomicUsize,
    }

    #[async_trait]
    impl VoiceHook for CountingVoice {
        async fn release(&self, _channel_id: u64) -> eyre::Result<()> {
            self.releases.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Deterministic picker: always the first phrase.
    struct FirstPicker;

    impl PhrasePicker for FirstPicker {
        fn pick<'a>(&mut self, options: &'a [&'a str]) -> &'a str {
            options[0]
        }
    }

    fn dispatcher_with(
        research: Arc<StubResearcher>,
        voice: Arc<CountingVoice>,
    ) -> Dispatcher {
        let config = BotConfig::default();
        let state = ConversationState::new(&config);
        Dispatcher::new(config, state, research, voice, Box::new(FirstPicker))
    }

    fn dispatcher() -> (Dispatcher, Arc<StubResearcher>, Arc<CountingVoice>) {
        let research = StubResearcher::answering(None);
        let voice = Arc::new(CountingVoice {
            releases: AtomicUsize::new(0),
        });
        (
            dispatcher_with(research.clone(), voice.clone()),
            research,
            voice,
        )
    }

    fn message(channel_id: u64, text: &str) -> InboundMessage {
        InboundMessage {
            channel_id,
            author_id: 77,
            author_name: "alice".to_string(),
            is_bot_author: false,
            text: text.to_string(),
            timestamp: Utc::now(),
        }
    }

    async fn wake(dispatcher: &mut Dispatcher, channel_id: u64) {
        let replies = dispatcher.handle(&message(channel_id, "hey cab")).await;
        assert_eq!(replies.len(), 1);
    }

    #[tokio::test]
    async fn bot_authored_messages_are_ignored() {
        let (mut dispatcher, _, _) = dispatcher();
        let mut msg = message(1, "hey cab");
        msg.is_bot_author = true;
        assert!(dispatcher.handle(&msg).await.is_empty());
        assert!(!dispatcher.sessions_mut().is_awake(1));
    }

    #[tokio::test]
    async fn whitespace_only_messages_are_skipped() {
        let (mut dispatcher, _, _) = dispatcher();
        assert!(dispatcher.handle(&message(1, "   \t")).await.is_empty());
    }

    #[tokio::test]
    async fn wake_phrase_transitions_to_awake_with_greeting() {
        let (mut dispatcher, _, _) = dispatcher();
        let replies = dispatcher.handle(&message(1, "hey cab")).await;
        assert_eq!(replies.len(), 1);
        assert!(GREETINGS.contains(&replies[0].text.as_str()));
        assert!(dispatcher.sessions_mut().is_awake(1));
    }

    #[tokio::test]
    async fn second_wake_phrase_does_not_refire_greeting() {
        let (mut dispatcher, _, _) = dispatcher();
        wake(&mut dispatcher, 1).await;
        let replies = dispatcher.handle(&message(1, "hey cab")).await;
        assert!(dispatcher.sessions_mut().is_awake(1));
        // Handled as ordinary awake conversation, not a fresh greeting
        assert!(!GREETINGS.contains(&replies[0].text.as_str()));
    }

    #[tokio::test]
    async fn asleep_channel_stays_silent_for_ordinary_chat() {
        let (mut dispatcher, _, _) = dispatcher();
        let replies = dispatcher.handle(&message(1, "nice weather today")).await;
        assert!(replies.is_empty());
        assert!(!dispatcher.sessions_mut().is_awake(1));
    }

    #[tokio::test]
    async fn asleep_fallback_fires_on_seen_home_keywords() {
        let (mut dispatcher, _, _) = dispatcher();
        let replies = dispatcher
            .handle(&message(1, "this discord server is great"))
            .await;
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].text, ASLEEP_DISCORD_FALLBACK);
        assert!(!dispatcher.sessions_mut().is_awake(1));

        let replies = dispatcher.handle(&message(2, "runescape was my childhood")).await;
        assert_eq!(replies[0].text, ASLEEP_RUNESCAPE_FALLBACK);
    }

    #[tokio::test]
    async fn sleep_phrase_releases_voice_exactly_once() {
        let (mut dispatcher, _, voice) = dispatcher();
        wake(&mut dispatcher, 1).await;
        let replies = dispatcher.handle(&message(1, "cab sleep")).await;
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].text, FAREWELL);
        assert!(!dispatcher.sessions_mut().is_awake(1));
        assert_eq!(voice.releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn forbidden_query_is_refused_and_research_never_runs() {
        let (mut dispatcher, research, _) = dispatcher();
        wake(&mut dispatcher, 1).await;
        let replies = dispatcher
            .handle(&message(1, "how do I buy gold for cash"))
            .await;
        assert_eq!(replies[0].text, FORBIDDEN_REFUSAL);
        assert!(research.queries.lock().unwrap().is_empty());
        // Rule 8 still records the thought
        assert!(replies[1].text.starts_with(NOTES_HEADER));
        assert!(replies[1].text.contains("buy gold for cash"));
    }

    #[tokio::test]
    async fn question_shaped_text_delegates_to_research() {
        let (mut dispatcher, research, _) = dispatcher();
        wake(&mut dispatcher, 1).await;
        let replies = dispatcher.handle(&message(1, "what level is slayer?")).await;
        assert_eq!(
            research.queries.lock().unwrap().as_slice(),
            ["what level is slayer?"]
        );
        // Stub returns None, so the fixed filler is used
        assert_eq!(replies[0].text, NO_ANSWER_FILLER);
    }

    #[tokio::test]
    async fn research_answer_is_used_when_present() {
        let research = StubResearcher::answering(Some("Level 99, naturally."));
        let voice = Arc::new(CountingVoice {
            releases: AtomicUsize::new(0),
        });
        let mut dispatcher = dispatcher_with(research, voice);
        wake(&mut dispatcher, 1).await;
        let replies = dispatcher.handle(&message(1, "what level is slayer?")).await;
        assert_eq!(replies[0].text, "Level 99, naturally.");
    }

    #[tokio::test]
    async fn in_game_trade_advisory_precedes_the_answer() {
        let (mut dispatcher, _, _) = dispatcher();
        wake(&mut dispatcher, 1).await;
        let replies = dispatcher
            .handle(&message(1, "how do I trade with a friend?"))
            .await;
        assert_eq!(replies[0].text, TRADE_REMINDER);
        assert_eq!(replies[1].text, NO_ANSWER_FILLER);
        assert!(replies[2].text.starts_with(NOTES_HEADER));
    }

    #[tokio::test]
    async fn statements_get_a_templated_reply_and_notes() {
        let (mut dispatcher, research, _) = dispatcher();
        wake(&mut dispatcher, 1).await;
        let replies = dispatcher
            .handle(&message(1, "the price of yew logs keeps dropping"))
            .await;
        assert!(research.queries.lock().unwrap().is_empty());
        assert_eq!(replies.len(), 2);
        assert!(replies[1].text.starts_with(NOTES_HEADER));
        assert!(replies[1].text.contains("yew logs"));
    }

    #[tokio::test]
    async fn notes_keep_the_last_five_queries_in_order() {
        let (mut dispatcher, _, _) = dispatcher();
        wake(&mut dispatcher, 1).await;
        for i in 0..7 {
            dispatcher
                .handle(&message(1, &format!("tell me about entry{i}")))
                .await;
        }
        let replies = dispatcher.handle(&message(1, "one more thing")).await;
        let notes = &replies[1].text;
        assert!(!notes.contains("entry0"));
        assert!(!notes.contains("entry1"));
        assert!(!notes.contains("entry2"));
        for i in 3..7 {
            assert!(notes.contains(&format!("entry{i}")));
        }
    }

    #[tokio::test]
    async fn commands_reply_without_notes() {
        let (mut dispatcher, _, _) = dispatcher();
        wake(&mut dispatcher, 1).await;

        let replies = dispatcher.handle(&message(1, "!ping")).await;
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].text, PONG);

        let replies = dispatcher.handle(&message(1, "!help")).await;
        assert_eq!(replies[0].text, HELP_TEXT);

        let replies = dispatcher.handle(&message(1, "!tip")).await;
        assert_eq!(replies[0].text, format!("Wise Old Man's Tip: {}", TIPS[0]));

        let replies = dispatcher.handle(&message(1, "!frobnicate")).await;
        assert_eq!(replies[0].text, UNKNOWN_COMMAND);
    }

    #[tokio::test]
    async fn github_command_parses_owner_and_repo() {
        let (mut dispatcher, research, _) = dispatcher();
        wake(&mut dispatcher, 1).await;
        let replies = dispatcher
            .handle(&message(1, "github repo rust-lang/rust please"))
            .await;
        assert_eq!(
            research.repo_lookups.lock().unwrap().as_slice(),
            [("rust-lang".to_string(), "rust".to_string())]
        );
        // Stub returns None, so the fixed apology is used
        assert_eq!(replies[0].text, GITHUB_LOOKUP_FAILED);
    }

    #[tokio::test]
    async fn channels_are_independent() {
        let (mut dispatcher, _, _) = dispatcher();
        wake(&mut dispatcher, 1).await;
        assert!(dispatcher.sessions_mut().is_awake(1));
        assert!(!dispatcher.sessions_mut().is_awake(2));
        // Sleeping channel 1 leaves channel 2 untouched
        dispatcher.handle(&message(1, "cab sleep")).await;
        let replies = dispatcher.handle(&message(2, "hey cab")).await;
        assert!(GREETINGS.contains(&replies[0].text.as_str()));
    }

    #[test]
    fn question_detection_covers_interrogatives_and_question_marks() {
        assert!(is_question("what level is slayer?", "what level is slayer?"));
        assert!(!is_question("slayer level", "slayer level"));
        assert!(is_question("Where is the GE", "where is the ge"));
        assert!(is_question("How to train agility", "how to train agility"));
        assert!(is_question("is this a question?", "is this a question?"));
        assert!(!is_question("whatever you say", "whatever you say"));
    }
}
