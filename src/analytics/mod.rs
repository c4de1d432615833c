/// Consent-gated learning analytics
///
/// This module records retention, lesson drop-off points and flagged questions.
/// Nothing is written unless analytical consent has been granted; the data is
/// best effort and never affects progress.

pub mod consent;

pub use consent::{ConsentManager, ConsentPreferences, CookieCategory, Region};

use chrono::{NaiveDate, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{date_string_key, LessonId};
use crate::storage::KeyValueStore;

const SESSION_ID_KEY: &str = "analytics_session_id";
const USER_ID_KEY: &str = "analytics_user_id";
const FLAGGED_QUESTIONS_KEY: &str = "analytics_flagged_questions";
const DROP_OFFS_KEY: &str = "analytics_drop_offs";
const RETENTION_DATA_KEY: &str = "analytics_retention_data";

/// Retention history is capped at one year of visits
pub const RETENTION_WINDOW: usize = 365;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetentionEntry {
    pub date: String,
    pub timestamp: String,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropOff {
    pub lesson_id: LessonId,
    /// Lesson step the learner left from (content, task, quiz, ...)
    pub step: String,
    /// Seconds spent before leaving
    pub time_spent: u64,
    pub timestamp: String,
    pub session_id: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlaggedQuestion {
    pub lesson_id: LessonId,
    pub question_index: u32,
    pub reason: String,
    pub timestamp: String,
    pub session_id: Option<String>,
    pub user_id: Option<String>,
}

/// Everything recorded so far
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsData {
    pub flagged_questions: Vec<FlaggedQuestion>,
    pub drop_offs: Vec<DropOff>,
    pub retention_data: Vec<RetentionEntry>,
}

/// Analytics recorder bound to the device-wide consent state
pub struct AnalyticsTracker<'a, S: KeyValueStore + ?Sized> {
    kv: &'a S,
    consent: ConsentManager<'a, S>,
}

impl<'a, S: KeyValueStore + ?Sized> AnalyticsTracker<'a, S> {
    pub fn new(kv: &'a S, timezone: Option<String>) -> Self {
        Self {
            kv,
            consent: ConsentManager::new(kv, timezone),
        }
    }

    pub fn consent(&self) -> &ConsentManager<'a, S> {
        &self.consent
    }

    pub fn is_enabled(&self) -> bool {
        self.consent.is_category_allowed(CookieCategory::Analytical)
    }

    fn read_list<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        match self.kv.get(key) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!("Discarding unreadable analytics list {}: {}", key, e);
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::error!("Failed to read {}: {}", key, e);
                Vec::new()
            }
        }
    }

    fn write_list<T: Serialize>(&self, key: &str, list: &[T]) {
        let result = serde_json::to_string(list)
            .map_err(crate::storage::StorageError::from)
            .and_then(|raw| self.kv.set(key, &raw));
        if let Err(e) = result {
            tracing::error!("Failed to save {}: {}", key, e);
        }
    }

    /// Get or create an anonymous id stored under `key`
    fn anonymous_id(&self, key: &str, prefix: &str) -> Option<String> {
        if !self.is_enabled() {
            return None;
        }
        match self.kv.get(key) {
            Ok(Some(id)) => Some(id),
            Ok(None) => {
                let id = format!("{}_{}", prefix, Uuid::new_v4().simple());
                if let Err(e) = self.kv.set(key, &id) {
                    tracing::error!("Failed to save {}: {}", key, e);
                }
                Some(id)
            }
            Err(e) => {
                tracing::error!("Failed to read {}: {}", key, e);
                None
            }
        }
    }

    pub fn session_id(&self) -> Option<String> {
        self.anonymous_id(SESSION_ID_KEY, "session")
    }

    pub fn user_id(&self) -> Option<String> {
        self.anonymous_id(USER_ID_KEY, "user")
    }

    /// Record a visit for `today`; at most one entry per day
    ///
    /// Returns whether a new entry was written.
    pub fn track_retention(&self, today: NaiveDate) -> bool {
        if !self.is_enabled() {
            return false;
        }

        let date = date_string_key(today);
        let mut retention: Vec<RetentionEntry> = self.read_list(RETENTION_DATA_KEY);
        if retention.iter().any(|entry| entry.date == date) {
            return false;
        }

        retention.push(RetentionEntry {
            date,
            timestamp: Utc::now().to_rfc3339(),
            user_id: self.user_id(),
            session_id: self.session_id(),
        });
        if retention.len() > RETENTION_WINDOW {
            let excess = retention.len() - RETENTION_WINDOW;
            retention.drain(..excess);
        }

        self.write_list(RETENTION_DATA_KEY, &retention);
        true
    }

    /// Record where a learner abandoned a lesson
    pub fn track_lesson_drop_off(&self, lesson_id: LessonId, step: &str, time_spent: u64) {
        if !self.is_enabled() {
            return;
        }

        let mut drop_offs: Vec<DropOff> = self.read_list(DROP_OFFS_KEY);
        drop_offs.push(DropOff {
            lesson_id,
            step: step.to_string(),
            time_spent,
            timestamp: Utc::now().to_rfc3339(),
            session_id: self.session_id(),
            user_id: self.user_id(),
        });
        self.write_list(DROP_OFFS_KEY, &drop_offs);
    }

    /// Record a learner's report about a question; returns whether it was kept
    pub fn track_flagged_question(&self, lesson_id: LessonId, question_index: u32, reason: &str) -> bool {
        if !self.is_enabled() {
            return false;
        }

        let mut flagged: Vec<FlaggedQuestion> = self.read_list(FLAGGED_QUESTIONS_KEY);
        flagged.push(FlaggedQuestion {
            lesson_id,
            question_index,
            reason: reason.to_string(),
            timestamp: Utc::now().to_rfc3339(),
            session_id: self.session_id(),
            user_id: self.user_id(),
        });
        self.write_list(FLAGGED_QUESTIONS_KEY, &flagged);
        true
    }

    /// Recorded data; empty without analytical consent
    pub fn analytics_data(&self) -> AnalyticsData {
        if !self.is_enabled() {
            return AnalyticsData::default();
        }
        AnalyticsData {
            flagged_questions: self.read_list(FLAGGED_QUESTIONS_KEY),
            drop_offs: self.read_list(DROP_OFFS_KEY),
            retention_data: self.read_list(RETENTION_DATA_KEY),
        }
    }
}
