//! Default disallowed-language table
//!
//! Entries are matched case-insensitively on whole words, so multi-word
//! phrases only match when the words are adjacent and separated by a single
//! space. Bump [`BLOCKLIST_VERSION`] when the table changes.

pub const BLOCKLIST_VERSION: u32 = 1;

pub const DEFAULT_BLOCKLIST: &[&str] = &[
    // profanity
    "fuck", "shit", "ass", "bitch", "damn", "crap", "bastard", "dick", "cock", "pussy",
    // slurs and insults
    "whore", "slut", "nigger", "fag", "retard", "idiot", "stupid",
    // violence
    "hate", "kill", "die", "murder", "rape",
    // sexual
    "porn", "xxx", "nude", "naked",
    // spam and scams
    "spam", "scam", "fraud", "fake", "click here", "free money", "bitcoin", "crypto",
    "invest now", "make money fast", "get rich", "lottery", "winner",
];
