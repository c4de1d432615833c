/// Core types used throughout the domain layer
///
/// This module defines the identity value object (`Session`), completed-item
/// identifiers, and the two calendar-date key formats the persisted layout uses.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lesson ordinal id (1-based, counting only plain lessons in the curriculum)
pub type LessonId = u32;

/// The identity whose data is visible
///
/// Every persisted key is prefixed with this identity's namespace. Switching
/// identity switches the whole visible data set; guest and user data are never merged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Session {
    /// Unauthenticated visitor
    Guest,
    /// Authenticated user with the provider's user id
    User(String),
}

impl Session {
    /// Build a session from an optional user id; blank ids are treated as guest
    pub fn from_user_id(user_id: Option<&str>) -> Self {
        match user_id.map(str::trim) {
            Some(id) if !id.is_empty() => Session::User(id.to_string()),
            _ => Session::Guest,
        }
    }

    /// Key prefix for this identity: `user_<id>_` or `guest_`
    pub fn namespace(&self) -> String {
        match self {
            Session::Guest => "guest_".to_string(),
            Session::User(id) => format!("user_{}_", id),
        }
    }

    pub fn is_guest(&self) -> bool {
        matches!(self, Session::Guest)
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Session::Guest => write!(f, "guest"),
            Session::User(id) => write!(f, "user {}", id),
        }
    }
}

/// An entry of the completed-items list
///
/// Personalized practice entries are stored as their numeric roadmap index,
/// reviews and skip quizzes as string keys (`review_<unit>`, `skipQuiz_<unit>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CompletedItem {
    Index(usize),
    Key(String),
}

const REVIEW_PREFIX: &str = "review_";
const SKIP_QUIZ_PREFIX: &str = "skipQuiz_";

impl CompletedItem {
    /// Practice entry at a roadmap position
    pub fn practice(index: usize) -> Self {
        CompletedItem::Index(index)
    }

    /// Review of a 1-based unit number
    pub fn review(unit_number: usize) -> Self {
        CompletedItem::Key(format!("{}{}", REVIEW_PREFIX, unit_number))
    }

    /// Skip quiz of a 1-based unit number
    pub fn skip_quiz(unit_number: usize) -> Self {
        CompletedItem::Key(format!("{}{}", SKIP_QUIZ_PREFIX, unit_number))
    }

    pub fn is_review(&self) -> bool {
        matches!(self, CompletedItem::Key(k) if k.starts_with(REVIEW_PREFIX))
    }

    pub fn is_skip_quiz(&self) -> bool {
        matches!(self, CompletedItem::Key(k) if k.starts_with(SKIP_QUIZ_PREFIX))
    }

    /// Reviews and skip quizzes count toward the streak; practice does not
    pub fn is_meaningful_action(&self) -> bool {
        self.is_review() || self.is_skip_quiz()
    }

    /// Decode one element of the persisted list, dropping anything that is
    /// neither a non-negative integer nor a string
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_u64().map(|n| CompletedItem::Index(n as usize)),
            Value::String(s) => Some(CompletedItem::Key(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for CompletedItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletedItem::Index(i) => write!(f, "{}", i),
            CompletedItem::Key(k) => write!(f, "{}", k),
        }
    }
}

/// Coerce a persisted or user-supplied lesson id
///
/// Numbers and numeric strings are accepted; everything else (null, floats,
/// text) yields `None`.
pub fn parse_lesson_id(value: &Value) -> Option<LessonId> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| LessonId::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<LessonId>().ok(),
        _ => None,
    }
}

/// `YYYY-MM-DD` key used for daily lesson flags and completion stamps
pub fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse a `YYYY-MM-DD` key
pub fn parse_day_key(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

/// `Sat Oct 18 2026` key used for daily XP and daily quests
pub fn date_string_key(date: NaiveDate) -> String {
    date.format("%a %b %d %Y").to_string()
}

/// Whether a string has the shape of a `YYYY-MM-DD` date
pub fn looks_like_day_key(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit())
}
