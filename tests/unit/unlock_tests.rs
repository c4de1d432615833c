/// Roadmap unlocking over the built-in and custom curricula
use learning_progress_mcp::*;

fn resolver<'a>(
    curriculum: &'a Curriculum,
    lessons: &[LessonId],
    items: &[CompletedItem],
) -> UnlockResolver<'a> {
    UnlockResolver::new(
        curriculum,
        lessons.iter().copied().collect(),
        items.iter().cloned().collect(),
    )
}

#[cfg(test)]
mod unlock_unit_tests {
    use super::*;

    #[test]
    fn test_three_lesson_linearity() {
        let curriculum = Curriculum::new(
            vec!["One".to_string(), "Two".to_string(), "Three".to_string()],
            vec![Unit::new("Unit", 0, 2)],
        )
        .unwrap();
        let r = resolver(&curriculum, &[1], &[]);
        assert_eq!(r.status(1), EntryStatus::Available);
        assert_eq!(r.status(2), EntryStatus::Locked);
    }

    #[test]
    fn test_review_alone_reaches_next_unit() {
        let curriculum = Curriculum::default();
        // Only unit 1's review (index 3) is completed
        let r = resolver(&curriculum, &[], &[CompletedItem::review(1)]);
        assert!(r.is_unit_reached(1));
        assert!(!r.is_unit_reached(2));
        // Reaching the unit does not unlock past the first incomplete entry
        assert_eq!(r.status(0), EntryStatus::Available);
        assert_eq!(r.status(4), EntryStatus::Locked);
    }

    #[test]
    fn test_skip_quiz_passed_hides_shortcut() {
        let curriculum = Curriculum::default();
        let r = resolver(&curriculum, &[], &[CompletedItem::skip_quiz(3)]);
        assert!(r.is_skip_quiz_completed(2));
        assert!(!r.shows_skip_shortcut(13));
        assert!(r.shows_skip_shortcut(20));
    }

    #[test]
    fn test_practice_needs_two_earlier_lessons() {
        let curriculum = Curriculum::new(
            vec!["One".to_string(), "Personalized Practice".to_string(), "Two".to_string()],
            vec![Unit::new("Unit", 0, 2)],
        )
        .unwrap();
        let r = resolver(&curriculum, &[1], &[]);
        assert_eq!(r.status(1), EntryStatus::Locked);
    }

    #[test]
    fn test_invalid_unit_ranges_rejected() {
        let entries = vec!["One".to_string(), "Two".to_string()];
        assert!(Curriculum::new(entries.clone(), vec![Unit::new("Bad", 1, 5)]).is_err());
        assert!(Curriculum::new(
            entries,
            vec![Unit::new("A", 0, 1), Unit::new("B", 1, 1)]
        )
        .is_err());
        assert!(Curriculum::new(Vec::new(), Vec::new()).is_err());
    }
}
