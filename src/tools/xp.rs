/// Tools for awarding and revoking daily XP
///
/// This module implements the xp_award and xp_revoke MCP tools. The XP
/// counter is changed here, exactly once; the published event only tells
/// subscribers to re-derive.

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::analytics::AnalyticsTracker;
use crate::domain::{DomainError, EventBus, LessonId, ProgressEvent};
use crate::storage::{KeyValueStore, ProgressStore};

/// Largest XP change accepted in one call
const MAX_XP_DELTA: u32 = 10_000;

/// Parameters for awarding XP
#[derive(Debug, Deserialize, JsonSchema)]
pub struct XpParams {
    /// XP to add for today
    pub amount: u32,
}

/// Parameters for revoking provisional XP when a lesson is abandoned
#[derive(Debug, Deserialize, JsonSchema)]
pub struct XpRevokeParams {
    /// XP to take back from today (the total never goes below zero)
    pub amount: u32,
    /// Lesson that was abandoned, for drop-off analytics
    pub lesson_id: Option<LessonId>,
    /// Step the learner left from (content, task, follow-up, quiz)
    pub step: Option<String>,
    /// Seconds spent in the lesson
    pub time_spent: Option<u64>,
}

/// Response from an XP change
#[derive(Debug, Serialize)]
pub struct XpResponse {
    pub xp_today: u32,
    pub message: String,
}

fn validate_amount(amount: u32) -> Result<(), DomainError> {
    if amount > MAX_XP_DELTA {
        return Err(DomainError::Validation {
            message: format!("XP amount too large (max {})", MAX_XP_DELTA),
        });
    }
    Ok(())
}

/// Add XP to today's counter
pub fn award_xp<S: KeyValueStore + ?Sized>(
    store: &ProgressStore<'_, S>,
    bus: &EventBus,
    params: XpParams,
    today: NaiveDate,
) -> Result<XpResponse, DomainError> {
    validate_amount(params.amount)?;

    let xp_today = store.add_daily_xp(today, params.amount);
    if params.amount > 0 {
        bus.publish(ProgressEvent::XpGained {
            amount: i64::from(params.amount),
        });
    }

    Ok(XpResponse {
        xp_today,
        message: format!("⭐ +{} XP. Today's total: {} XP", params.amount, xp_today),
    })
}

/// Take provisional XP back, recording the drop-off when analytics is allowed
pub fn revoke_xp<S: KeyValueStore + ?Sized>(
    store: &ProgressStore<'_, S>,
    analytics: &AnalyticsTracker<'_, S>,
    bus: &EventBus,
    params: XpRevokeParams,
    today: NaiveDate,
) -> Result<XpResponse, DomainError> {
    validate_amount(params.amount)?;

    let before = store.daily_xp(today);
    let xp_today = store.subtract_daily_xp(today, params.amount);
    let revoked = before - xp_today;
    if revoked > 0 {
        bus.publish(ProgressEvent::XpGained {
            amount: -i64::from(revoked),
        });
    }

    if let Some(lesson_id) = params.lesson_id {
        analytics.track_lesson_drop_off(
            lesson_id,
            params.step.as_deref().unwrap_or("unknown"),
            params.time_spent.unwrap_or(0),
        );
    }

    Ok(XpResponse {
        xp_today,
        message: format!("Revoked {} XP. Today's total: {} XP", revoked, xp_today),
    })
}
