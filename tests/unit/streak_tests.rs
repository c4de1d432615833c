/// Streak and weekly progress over hand-built snapshots
use chrono::{Datelike, NaiveDate, Weekday};
use learning_progress_mcp::*;

fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
}

#[cfg(test)]
mod streak_unit_tests {
    use super::*;

    #[test]
    fn test_streak_ignores_activity_before_gap() {
        let mut snapshot = ProgressSnapshot::empty(date(18));
        snapshot.flagged_days.extend([date(18), date(17)]);
        for d in 1..=15 {
            snapshot.flagged_days.insert(date(d));
        }

        let streak = Streak::calculate(&snapshot);
        assert_eq!(streak.current_streak, 2);
        assert!(streak.active_today);
    }

    #[test]
    fn test_practice_alone_does_not_light_the_flame() {
        let mut snapshot = ProgressSnapshot::empty(date(18));
        let practice = CompletedItem::practice(2);
        snapshot.completed_items.push(practice.clone());
        snapshot.item_dates.insert(practice, date(18));

        let streak = Streak::calculate(&snapshot);
        assert_eq!(streak.current_streak, 0);
        assert!(!streak.active_today);
    }

    #[test]
    fn test_review_stamp_continues_streak() {
        let mut snapshot = ProgressSnapshot::empty(date(18));
        snapshot.flagged_days.insert(date(17));
        let review = CompletedItem::review(1);
        snapshot.completed_items.push(review.clone());
        snapshot.item_dates.insert(review, date(18));

        let streak = Streak::calculate(&snapshot);
        assert_eq!(streak.current_streak, 2);
        assert_eq!(streak.days_to_flag, vec![date(18)]);
    }

    #[test]
    fn test_weekly_map_is_monday_to_friday() {
        for d in 12..=25 {
            let snapshot = ProgressSnapshot::empty(date(d));
            let weekly = WeeklyProgress::calculate(&snapshot);
            assert_eq!(weekly.days.len(), 5);

            let days: Vec<&NaiveDate> = weekly.days.keys().collect();
            assert_eq!(days[0].weekday(), Weekday::Mon);
            assert_eq!(days[4].weekday(), Weekday::Fri);
            assert!(weekly.days.values().all(|done| !done));
        }
    }

    #[test]
    fn test_weekend_flags_are_not_in_weekly_map() {
        let mut snapshot = ProgressSnapshot::empty(date(18));
        snapshot.flagged_days.extend([date(17), date(18)]);
        let weekly = WeeklyProgress::calculate(&snapshot);
        assert_eq!(weekly.completed_days(), 0);
        assert_eq!(Streak::calculate(&snapshot).current_streak, 2);
    }
}
