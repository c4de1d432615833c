/// Streak calculation and weekly tracking
///
/// A streak counts unbroken consecutive days, ending today, that each had at
/// least one meaningful action (lesson, review, or skip-quiz completion). Days
/// are compared as local calendar dates, so the boundary is local midnight.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::domain::ProgressSnapshot;

/// How far back a streak is scanned
pub const MAX_STREAK_DAYS: u32 = 365;

/// Calculated streak information for the active identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Streak {
    /// Consecutive days ending today with a meaningful action
    pub current_streak: u32,
    /// Whether today already counts ("flame lit")
    pub active_today: bool,
    /// Days whose daily lesson flag should be normalised to "1"
    #[serde(skip)]
    pub days_to_flag: Vec<NaiveDate>,
}

impl Streak {
    /// Walk back from today and count consecutive meaningful days
    ///
    /// A day with no flag falls back to the completion stamps. The first empty
    /// day stops the walk; activity before it is never counted.
    pub fn calculate(snapshot: &ProgressSnapshot) -> Self {
        let mut current_streak = 0;
        let mut days_to_flag = Vec::new();
        let mut checking_date = snapshot.today;

        for _ in 0..MAX_STREAK_DAYS {
            if !snapshot.has_meaningful_action_on(checking_date) {
                break;
            }
            if !snapshot.is_flagged(checking_date) {
                days_to_flag.push(checking_date);
            }
            current_streak += 1;
            checking_date = checking_date - Duration::days(1);
        }

        Self {
            current_streak,
            active_today: has_meaningful_action_today(snapshot),
            days_to_flag,
        }
    }

    /// Get a motivational message based on current streak status
    pub fn motivational_message(&self) -> String {
        match self.current_streak {
            0 => "No streak yet. Finish a lesson today to light the flame.".to_string(),
            1 => "Flame lit! Come back tomorrow to keep it burning.".to_string(),
            2..=6 => format!("{} days in a row. Keep the momentum going!", self.current_streak),
            7..=29 => format!("{} day streak. Learning is becoming a habit!", self.current_streak),
            _ => format!("{} day streak. Outstanding dedication!", self.current_streak),
        }
    }
}

/// Whether today already holds a meaningful action
pub fn has_meaningful_action_today(snapshot: &ProgressSnapshot) -> bool {
    snapshot.has_meaningful_action_on(snapshot.today)
}

/// Monday of the week containing `date`
pub fn week_monday(date: NaiveDate) -> NaiveDate {
    let days_to_monday = match date.weekday() {
        Weekday::Sun => 6,
        other => other.num_days_from_monday() as i64,
    };
    date - Duration::days(days_to_monday)
}

/// Monday–Friday completion map for the current week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyProgress {
    pub days: BTreeMap<NaiveDate, bool>,
}

impl WeeklyProgress {
    /// Read-only projection of the daily lesson flags; always five entries
    pub fn calculate(snapshot: &ProgressSnapshot) -> Self {
        let monday = week_monday(snapshot.today);
        let days = (0..5)
            .map(|offset| {
                let date = monday + Duration::days(offset);
                (date, snapshot.is_flagged(date))
            })
            .collect();
        Self { days }
    }

    pub fn completed_days(&self) -> usize {
        self.days.values().filter(|done| **done).count()
    }
}
