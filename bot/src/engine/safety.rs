use regex::RegexSet;

/// Outcome of screening a message for trading talk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Real-world trading or another topic the bot always refuses
    Forbidden,
    /// In-game marketplace or player-to-player trade talk, allowed with a reminder
    InGameTrade,
    Neutral,
}

/// Pure pattern screen. Forbidden is checked first and wins whenever a text
/// matches both families.
pub struct SafetyFilter {
    forbidden: RegexSet,
    in_game: RegexSet,
}

const FORBIDDEN_PATTERNS: [&str; 15] = [
    r"(?i)buy.*gold",
    r"(?i)sell.*gold",
    r"(?i)buy.*account",
    r"(?i)sell.*account",
    r"(?i)buy.*item",
    r"(?i)sell.*item",
    r"(?i)\brwt\b",
    r"(?i)real.?world.?trad",
    r"(?i)gp for (money|cash|usd|eur|paypal|bitcoin|btc|crypto)",
    r"(?i)account shop",
    r"(?i)item shop",
    r"(?i)\bosrs\b",
    r"(?i)old school",
    r"(?i)real[-\s]?money",
    r"(?i)irl\s*(money|cash|usd|eur|paypal|bitcoin|btc|crypto)",
];

const IN_GAME_PATTERNS: [&str; 8] = [
    r"(?i)grand exchange",
    r"(?i)\bge\b",
    r"(?i)trade.*(player|friend|other)",
    r"(?i)player.*trade",
    r"(?i)in[-\s]?game.*trade",
    r"(?i)selling.*in game",
    r"(?i)buying.*in game",
    r"(?i)offer.*(ge|grand exchange)",
];

impl SafetyFilter {
    pub fn new() -> Self {
        Self {
            forbidden: RegexSet::new(FORBIDDEN_PATTERNS).unwrap(),
            in_game: RegexSet::new(IN_GAME_PATTERNS).unwrap(),
        }
    }

    pub fn classify(&self, text: &str) -> Verdict {
        if self.forbidden.is_match(text) {
            Verdict::Forbidden
        } else if self.in_game.is_match(text) {
            Verdict::InGameTrade
        } else {
            Verdict::Neutral
        }
    }
}

impl Default for SafetyFilter {
    fn default() -> Self {
        Self::new()
    }
}
