/// Point-in-time view of a learner's progress
///
/// The streak calculator, quest tracker and unlock resolver are pure functions of
/// this snapshot plus the static curriculum. The storage layer builds it fresh on
/// every recomputation; nothing derived from it is trusted across recomputations.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{CompletedItem, LessonId};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSnapshot {
    /// Calendar day the snapshot was taken for (local time)
    pub today: NaiveDate,
    pub completed_lessons: Vec<LessonId>,
    pub completed_items: Vec<CompletedItem>,
    /// First-completion date of each completed lesson, where stamped
    pub lesson_dates: HashMap<LessonId, NaiveDate>,
    /// First-completion date of each completed item, where stamped
    pub item_dates: HashMap<CompletedItem, NaiveDate>,
    /// Days whose daily lesson flag is set
    pub flagged_days: BTreeSet<NaiveDate>,
    pub xp_today: u32,
}

impl ProgressSnapshot {
    /// Empty progress for `today`
    pub fn empty(today: NaiveDate) -> Self {
        Self {
            today,
            completed_lessons: Vec::new(),
            completed_items: Vec::new(),
            lesson_dates: HashMap::new(),
            item_dates: HashMap::new(),
            flagged_days: BTreeSet::new(),
            xp_today: 0,
        }
    }

    pub fn lesson_set(&self) -> HashSet<LessonId> {
        self.completed_lessons.iter().copied().collect()
    }

    pub fn item_set(&self) -> HashSet<CompletedItem> {
        self.completed_items.iter().cloned().collect()
    }

    pub fn is_flagged(&self, date: NaiveDate) -> bool {
        self.flagged_days.contains(&date)
    }

    /// Completed lessons whose completion stamp is `date`
    pub fn lessons_completed_on(&self, date: NaiveDate) -> u32 {
        self.completed_lessons
            .iter()
            .filter(|id| self.lesson_dates.get(id) == Some(&date))
            .count() as u32
    }

    /// Lesson, review or skip-quiz completion stamped on `date`
    ///
    /// Personalized practice stamps are ignored.
    pub fn has_stamped_action_on(&self, date: NaiveDate) -> bool {
        if self.lessons_completed_on(date) > 0 {
            return true;
        }
        self.completed_items
            .iter()
            .filter(|item| item.is_meaningful_action())
            .any(|item| self.item_dates.get(item) == Some(&date))
    }

    /// Flag set, or reconstructable from completion stamps
    pub fn has_meaningful_action_on(&self, date: NaiveDate) -> bool {
        self.is_flagged(date) || self.has_stamped_action_on(date)
    }

    /// Completed reviews across all units
    pub fn reviews_completed(&self) -> u32 {
        self.completed_items.iter().filter(|item| item.is_review()).count() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    #[test]
    fn test_practice_is_not_meaningful() {
        let mut snapshot = ProgressSnapshot::empty(date(18));
        snapshot.completed_items.push(CompletedItem::practice(2));
        snapshot.item_dates.insert(CompletedItem::practice(2), date(18));
        assert!(!snapshot.has_meaningful_action_on(date(18)));

        snapshot.completed_items.push(CompletedItem::review(1));
        snapshot.item_dates.insert(CompletedItem::review(1), date(18));
        assert!(snapshot.has_meaningful_action_on(date(18)));
    }

    #[test]
    fn test_lessons_completed_on_counts_stamps() {
        let mut snapshot = ProgressSnapshot::empty(date(18));
        snapshot.completed_lessons = vec![1, 2, 3];
        snapshot.lesson_dates.insert(1, date(17));
        snapshot.lesson_dates.insert(2, date(18));
        snapshot.lesson_dates.insert(3, date(18));
        assert_eq!(snapshot.lessons_completed_on(date(18)), 2);
        assert_eq!(snapshot.lessons_completed_on(date(17)), 1);
    }
}
