use std::collections::{HashMap, HashSet, VecDeque};

use chrono::{DateTime, Utc};

use crate::engine::classify::tokenize;
use crate::engine::constants::THOUGHT_SEPARATOR;

/// One recorded utterance in a channel's rolling context window.
#[derive(Debug, Clone)]
pub struct RecordedMessage {
    pub author: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// Per-channel conversational state. Created lazily on the first observed
/// message and kept for the life of the process.
#[derive(Debug)]
pub struct Session {
    pub awake: bool,
    recent_messages: VecDeque<RecordedMessage>,
    // Grows with every distinct token seen in the channel. The source never
    // evicts this set, so we cap it; tokens past the cap are dropped.
    seen_keywords: HashSet<String>,
    thought_log: VecDeque<String>,
    recent_capacity: usize,
    thought_capacity: usize,
    keyword_cap: usize,
}

impl Session {
    fn new(recent_capacity: usize, thought_capacity: usize, keyword_cap: usize) -> Self {
        Self {
            awake: false,
            recent_messages: VecDeque::with_capacity(recent_capacity),
            seen_keywords: HashSet::new(),
            thought_log: VecDeque::with_capacity(thought_capacity),
            recent_capacity,
            thought_capacity,
            keyword_cap,
        }
    }

    fn record(&mut self, author: &str, text: &str, timestamp: DateTime<Utc>) {
        if self.recent_messages.len() == self.recent_capacity {
            self.recent_messages.pop_front();
        }
        self.recent_messages.push_back(RecordedMessage {
            author: author.to_string(),
            text: text.to_string(),
            timestamp,
        });
        for token in tokenize(text) {
            if self.seen_keywords.len() < self.keyword_cap || self.seen_keywords.contains(&token) {
                self.seen_keywords.insert(token);
            }
        }
    }

    fn push_thought(&mut self, entry: String) {
        if self.thought_log.len() == self.thought_capacity {
            self.thought_log.pop_front();
        }
        self.thought_log.push_back(entry);
    }

    fn render_thoughts(&self) -> String {
        self.thought_log
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(THOUGHT_SEPARATOR)
    }

    pub fn has_keyword(&self, word: &str) -> bool {
        self.seen_keywords.contains(word)
    }

    /// Rolling context window, oldest first.
    pub fn recent_messages(&self) -> impl Iterator<Item = &RecordedMessage> {
        self.recent_messages.iter()
    }

    pub fn recent_len(&self) -> usize {
        self.recent_messages.len()
    }

    pub fn thought_len(&self) -> usize {
        self.thought_log.len()
    }
}

/// Owns every [`Session`]; nothing else mutates them.
#[derive(Debug)]
pub struct SessionStore {
    sessions: HashMap<u64, Session>,
    recent_capacity: usize,
    thought_capacity: usize,
    keyword_cap: usize,
}

impl SessionStore {
    pub fn new(recent_capacity: usize, thought_capacity: usize, keyword_cap: usize) -> Self {
        Self {
            sessions: HashMap::new(),
            recent_capacity,
            thought_capacity,
            keyword_cap,
        }
    }

    pub fn get_or_create(&mut self, channel_id: u64) -> &mut Session {
        let (recent, thought, keywords) =
            (self.recent_capacity, self.thought_capacity, self.keyword_cap);
        self.sessions
            .entry(channel_id)
            .or_insert_with(|| Session::new(recent, thought, keywords))
    }

    pub fn record_message(
        &mut self,
        channel_id: u64,
        author: &str,
        text: &str,
        timestamp: DateTime<Utc>,
    ) {
        self.get_or_create(channel_id).record(author, text, timestamp);
    }

    pub fn wake(&mut self, channel_id: u64) {
        self.get_or_create(channel_id).awake = true;
    }

    pub fn sleep(&mut self, channel_id: u64) {
        self.get_or_create(channel_id).awake = false;
    }

    pub fn is_awake(&mut self, channel_id: u64) -> bool {
        self.get_or_create(channel_id).awake
    }

    pub fn has_keyword(&mut self, channel_id: u64, word: &str) -> bool {
        self.get_or_create(channel_id).has_keyword(word)
    }

    pub fn push_thought(&mut self, channel_id: u64, entry: String) {
        self.get_or_create(channel_id).push_thought(entry);
    }

    pub fn render_thoughts(&mut self, channel_id: u64) -> String {
        self.get_or_create(channel_id).render_thoughts()
    }
}
