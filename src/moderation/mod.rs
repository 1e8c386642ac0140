//! Rule-based moderation for wall posts and comments
//!
//! [`ContentModerator::validate`] runs two checks in order and stops at the
//! first failure:
//!
//! 1. rubbish detection (empty, too short, repetitive, mostly non-letters,
//!    or one long keyboard-mashed token);
//! 2. whole-word matching against a block list.
//!
//! It is a pure function of its input and never fails; a rejection is a
//! [`Verdict`] carrying the message to show the author.

pub mod blocklist;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::error::{AppError, AppResult};

pub const RUBBISH_REASON: &str =
    "Your post appears to be empty or random characters. Please write something meaningful.";
pub const INAPPROPRIATE_REASON: &str =
    "Your post contains inappropriate language. Please keep the content respectful.";

const MIN_LENGTH: usize = 3;
const MIN_DISTINCT_CHARS: usize = 3;
/// Letters must make up at least 3/10 of the text
const MIN_ALPHA_RATIO: (usize, usize) = (3, 10);
const MAX_SINGLE_WORD_LENGTH: usize = 50;

static DEFAULT_MODERATOR: Lazy<ContentModerator> = Lazy::new(|| {
    ContentModerator::with_terms(blocklist::DEFAULT_BLOCKLIST)
        .expect("default block list compiles")
});

/// Why a text was turned down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionKind {
    Rubbish,
    Inappropriate,
}

impl RejectionKind {
    pub fn reason(&self) -> &'static str {
        match self {
            RejectionKind::Rubbish => RUBBISH_REASON,
            RejectionKind::Inappropriate => INAPPROPRIATE_REASON,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub accepted: bool,
    pub kind: Option<RejectionKind>,
    pub reason: Option<&'static str>,
}

impl Verdict {
    fn accept() -> Self {
        Self {
            accepted: true,
            kind: None,
            reason: None,
        }
    }

    fn reject(kind: RejectionKind) -> Self {
        Self {
            accepted: false,
            kind: Some(kind),
            reason: Some(kind.reason()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ContentModerator {
    /// `None` when the block list is empty
    blocked: Option<Regex>,
}

impl Default for ContentModerator {
    fn default() -> Self {
        DEFAULT_MODERATOR.clone()
    }
}

impl ContentModerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a moderator around a custom block list
    pub fn with_terms<S: AsRef<str>>(terms: &[S]) -> AppResult<Self> {
        let alternatives: Vec<String> = terms
            .iter()
            .map(|t| t.as_ref().trim())
            .filter(|t| !t.is_empty())
            .map(|t| regex::escape(&t.to_lowercase()))
            .collect();

        if alternatives.is_empty() {
            return Ok(Self { blocked: None });
        }

        let pattern = format!(r"(?i)\b(?:{})\b", alternatives.join("|"));
        let blocked = Regex::new(&pattern)
            .map_err(|e| AppError::Validation(format!("invalid block list: {}", e)))?;
        Ok(Self {
            blocked: Some(blocked),
        })
    }

    pub fn validate(&self, text: &str) -> Verdict {
        if is_rubbish(text) {
            tracing::debug!("Moderation: rejected as rubbish");
            return Verdict::reject(RejectionKind::Rubbish);
        }
        if self.contains_blocked(text) {
            tracing::debug!("Moderation: rejected for block-listed language");
            return Verdict::reject(RejectionKind::Inappropriate);
        }
        Verdict::accept()
    }

    pub fn contains_blocked(&self, text: &str) -> bool {
        self.blocked
            .as_ref()
            .map(|re| re.is_match(text))
            .unwrap_or(false)
    }
}

/// Low-information noise rather than prose
pub fn is_rubbish(text: &str) -> bool {
    let text = text.trim();
    let length = text.chars().count();
    if length < MIN_LENGTH {
        return true;
    }

    let mut distinct: Vec<char> = text.chars().flat_map(char::to_lowercase).collect();
    distinct.sort_unstable();
    distinct.dedup();
    if distinct.len() < MIN_DISTINCT_CHARS {
        return true;
    }

    let letters = text.chars().filter(|c| c.is_alphabetic()).count();
    let (num, den) = MIN_ALPHA_RATIO;
    if letters * den < length * num {
        return true;
    }

    let single_word = !text.chars().any(char::is_whitespace);
    single_word && length > MAX_SINGLE_WORD_LENGTH
}
