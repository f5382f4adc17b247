use std::collections::{HashMap, HashSet};

use strum::IntoEnumIterator;

/// Closed topic vocabulary. Classification always lands on one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Topic {
    Skill,
    Economy,
    Quest,
    Discord,
    Voice,
    Player,
    Pvm,
    Event,
    Activity,
    Achievement,
    Boss,
    Meta,
    Routine,
    Collection,
    Drop,
    Pet,
    Magic,
    General,
}

/// Fixed training phrases the model is seeded with at startup. A couple of
/// examples per topic is plenty for a bag-of-words model at this scale.
const SEED_CORPUS: [(&str, Topic); 32] = [
    ("slayer runescape", Topic::Skill),
    ("gp runescape", Topic::Economy),
    ("quest runescape", Topic::Quest),
    ("channel discord", Topic::Discord),
    ("role discord", Topic::Discord),
    ("voice discord", Topic::Voice),
    ("player runescape", Topic::Player),
    ("how much runescape", Topic::Economy),
    ("how many runescape", Topic::Quest),
    ("next step runescape", Topic::Quest),
    ("price of runescape", Topic::Economy),
    ("needed for runescape", Topic::Quest),
    ("archaeology runescape", Topic::Skill),
    ("invention runescape", Topic::Skill),
    ("dungeoneering runescape", Topic::Skill),
    ("elite dungeons runescape", Topic::Pvm),
    ("boss mechanics runescape", Topic::Pvm),
    ("reaper assignments runescape", Topic::Pvm),
    ("best money making runescape", Topic::Economy),
    ("grand exchange runescape", Topic::Economy),
    ("double xp runescape", Topic::Event),
    ("yak track runescape", Topic::Event),
    ("clue scroll runescape", Topic::Activity),
    ("treasure trails runescape", Topic::Activity),
    ("achievement runescape", Topic::Achievement),
    ("comp cape runescape", Topic::Achievement),
    ("telos runescape", Topic::Boss),
    ("arch glacor runescape", Topic::Boss),
    ("ability rotations runescape", Topic::Meta),
    ("farming runs runescape", Topic::Routine),
    ("slayer codex runescape", Topic::Collection),
    ("rare drop table runescape", Topic::Drop),
];

/// Lowercased word tokens, the unit both the classifier and the per-channel
/// keyword memory operate on.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Multinomial naive-Bayes bag-of-words model over [`Topic`].
///
/// Seeded once at construction; by default every classified utterance is also
/// folded back in as a training example under its best-guess label, so the
/// model drifts with conversation history. `frozen` disables that.
pub struct IntentClassifier {
    token_counts: HashMap<Topic, HashMap<String, u32>>,
    token_totals: HashMap<Topic, u32>,
    doc_counts: HashMap<Topic, u32>,
    total_docs: u32,
    vocab: HashSet<String>,
    frozen: bool,
}

impl IntentClassifier {
    pub fn new(frozen: bool) -> Self {
        let mut classifier = Self {
            token_counts: HashMap::new(),
            token_totals: HashMap::new(),
            doc_counts: HashMap::new(),
            total_docs: 0,
            vocab: HashSet::new(),
            frozen: false,
        };
        for (phrase, topic) in SEED_CORPUS {
            classifier.train(phrase, topic);
        }
        classifier.frozen = frozen;
        classifier
    }

    /// Add one training example. Repeated calls with the same text strengthen
    /// the association. A no-op once the model is frozen.
    pub fn train(&mut self, text: &str, topic: Topic) {
        if self.frozen {
            return;
        }
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return;
        }
        let counts = self.token_counts.entry(topic).or_default();
        for token in tokens {
            *counts.entry(token.clone()).or_insert(0) += 1;
            *self.token_totals.entry(topic).or_insert(0) += 1;
            self.vocab.insert(token);
        }
        *self.doc_counts.entry(topic).or_insert(0) += 1;
        self.total_docs += 1;
    }

    /// Best-effort topic for an utterance. Total over the closed set: unseen
    /// vocabulary, empty input, and a degenerate (unseeded) model all land on
    /// [`Topic::General`]. Ties fall to the earlier declared variant.
    pub fn classify(&self, text: &str) -> Topic {
        let tokens = tokenize(text);
        if self.total_docs == 0 || tokens.is_empty() {
            return Topic::General;
        }
        if !tokens.iter().any(|t| self.vocab.contains(t)) {
            return Topic::General;
        }

        let vocab_size = self.vocab.len() as f64;
        let mut best = Topic::General;
        let mut best_score = f64::NEG_INFINITY;
        for topic in Topic::iter() {
            let docs = self.doc_counts.get(&topic).copied().unwrap_or(0);
            if docs == 0 {
                continue;
            }
            let total = self.token_totals.get(&topic).copied().unwrap_or(0) as f64;
            let counts = &self.token_counts[&topic];
            let mut score = (f64::from(docs) / f64::from(self.total_docs)).ln();
            for token in &tokens {
                let count = counts.get(token).copied().unwrap_or(0);
                score += (f64::from(count + 1) / (total + vocab_size)).ln();
            }
            if score > best_score {
                best_score = score;
                best = topic;
            }
        }
        best
    }
}
