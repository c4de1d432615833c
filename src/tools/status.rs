/// Tool for checking streak and daily progress
///
/// This module implements the progress_status MCP tool.

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::analytics::AnalyticsTracker;
use crate::domain::{day_key, DomainError};
use crate::engine::ProgressEngine;
use crate::storage::{KeyValueStore, ProgressStore};

/// Parameters for checking progress status
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct StatusParams {
    /// Include the Monday–Friday completion row (optional, defaults to true)
    pub include_weekly: Option<bool>,
}

/// One weekday of the weekly row
#[derive(Debug, Serialize)]
pub struct WeekdayStatus {
    pub date: String,
    pub done: bool,
}

/// Response from checking progress status
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub session: String,
    pub current_streak: u32,
    pub active_today: bool,
    pub lessons_today: u32,
    pub xp_today: u32,
    pub completed_lessons: usize,
    pub total_lessons: usize,
    pub weekly: Vec<WeekdayStatus>,
    pub light_mode: bool,
    pub message: String,
}

/// Get today's progress for the active identity
pub fn get_progress_status<S: KeyValueStore + ?Sized>(
    store: &ProgressStore<'_, S>,
    engine: &ProgressEngine,
    analytics: &AnalyticsTracker<'_, S>,
    params: StatusParams,
    today: NaiveDate,
) -> Result<StatusResponse, DomainError> {
    analytics.track_retention(today);

    let day = engine.refresh_day(store, today);
    let completed_lessons = store.completed_lessons().len();
    let total_lessons = engine.curriculum().lesson_count();

    let weekly: Vec<WeekdayStatus> = if params.include_weekly.unwrap_or(true) {
        day.weekly
            .days
            .iter()
            .map(|(date, done)| WeekdayStatus {
                date: day_key(*date),
                done: *done,
            })
            .collect()
    } else {
        Vec::new()
    };

    let flame = if day.streak.active_today { "🔥" } else { "🕯️" };
    let mut message = format!(
        "{} Streak: {} day{} | Lessons today: {} | XP today: {}\n📚 Lessons completed: {} of {}\n{}",
        flame,
        day.streak.current_streak,
        if day.streak.current_streak == 1 { "" } else { "s" },
        day.lessons_today,
        day.xp_today,
        completed_lessons,
        total_lessons,
        day.message
    );
    if !weekly.is_empty() {
        let row = day
            .weekly
            .days
            .iter()
            .map(|(date, done)| format!("{} {}", date.format("%a"), if *done { "✅" } else { "⬜" }))
            .collect::<Vec<_>>()
            .join("  ");
        message.push_str(&format!("\n📅 This week: {}", row));
    }

    Ok(StatusResponse {
        session: store.session().to_string(),
        current_streak: day.streak.current_streak,
        active_today: day.streak.active_today,
        lessons_today: day.lessons_today,
        xp_today: day.xp_today,
        completed_lessons,
        total_lessons,
        weekly,
        light_mode: store.light_mode(),
        message,
    })
}
