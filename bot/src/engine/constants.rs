use const_format::formatcp;
use std::time::Duration;

pub const COMMAND_PREFIX: char = '!';

/// Default names the bot wakes up to, matched case-insensitively anywhere in a message
pub const DEFAULT_WAKE_PHRASES: [&str; 3] = ["cab", "celestial", "celestial artisans bot"];
pub const DEFAULT_SLEEP_PHRASE: &str = "cab sleep";

pub const DEFAULT_RECENT_CAPACITY: usize = 5;
pub const DEFAULT_THOUGHT_CAPACITY: usize = 5;
pub const DEFAULT_SEEN_KEYWORDS_CAP: usize = 4096;
pub const DEFAULT_RESEARCH_TIMEOUT: Duration = Duration::from_secs(8);

pub const GREETINGS: [&str; 3] = [
    "Ahh, greetings, young adventurer! The Wise Old Man is here. Ask, and perhaps you'll learn a thing or two!",
    "You called? Dust off a chair, the Wise Old Man is listening.",
    "Radiant XP descends! What wisdom do you seek, whippersnapper?",
];

pub const FAREWELL: &str = "A nap, you say? Even the Wise Old Man needs his rest. Farewell for now, and may your bank remain untrimmed! Zzz...";

pub const FORBIDDEN_REFUSAL: &str = "Sorry, young adventurer, I cannot assist with buying or selling gold, accounts, or items for real-world money. Such things are forbidden by the laws of Gielinor!";

pub const TRADE_REMINDER: &str = "Remember: Always double-check trades and use the Grand Exchange or secure in-game methods. If something seems too good to be true, it probably is!";

pub const NO_ANSWER_FILLER: &str = "The stars withhold their wisdom. Rephrase thy question!";

/// Asleep-channel fallbacks, keyed on keywords already seen in the channel
pub const ASLEEP_DISCORD_FALLBACK: &str = "Ah, Discord! In my day, we just used carrier pigeons. Ask me about channels, roles, invites, or permissions. I've picked up a trick or two over the years.";
pub const ASLEEP_RUNESCAPE_FALLBACK: &str = "RuneScape, eh? Now that's a name I haven't heard in a long time. Need help with quests, skills, or gear? The Wise Old Man is here to help. Just don't ask me to trim your bank!";

pub const PONG: &str = "Pong! The Wise Old Man is listening.";

pub const UNKNOWN_COMMAND: &str = "I'm not sure what you mean, young adventurer! Try `!help` for a list of things I can do.";

pub const HELP_TEXT: &str = formatcp!(
    "**Wise Old Man's Guide:**\n\
     - Mention me or say 'cab' to wake me up!\n\
     - Ask about RuneScape 3 skills, bosses, quests, or mechanics.\n\
     - Use `github repo owner/repo` for GitHub info.\n\
     - Use `{COMMAND_PREFIX}tip` for a random tip, `{COMMAND_PREFIX}ping` to check I'm awake.\n\
     - Type `cab sleep` to let me rest.\n\
     - I will never help with real-world trading or forbidden topics.\n\
     - For a summary of recent wisdom, see my 'Wise Old Man's Notes'!"
);

pub const TIPS: [&str; 6] = [
    "Always bring food to boss fights.",
    "Check the Wiki for quest requirements before setting out.",
    "Keep your familiar summoned; a beast of burden pays for itself.",
    "Daily challenges stack up to three days. Don't let them rot.",
    "An aura on cooldown is an aura wasted.",
    "Bank before you gamble with a one-item teleport.",
];

pub const NOTES_HEADER: &str = "Wise Old Man's Notes: ";
pub const THOUGHT_SEPARATOR: &str = " | ";

pub const RESEARCH_PREFIX_SCROLLS: &str = "Here's what I've found in my old scrolls: ";
pub const RESEARCH_PREFIX_TRAVELS: &str = "A bit of wisdom from my travels: ";
pub const RESEARCH_PREFIX_WIKI: &str = "From the annals of the RuneScape Wiki: ";

pub const GITHUB_LOOKUP_FAILED: &str = "Something went wrong fetching from GitHub. Perhaps check the repository name?";
