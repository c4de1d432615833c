/// Persistence and identity scoping against on-disk databases
use std::collections::HashSet;

use chrono::NaiveDate;
use learning_progress_mcp::tools::{self, USER_RECORD_KEY};
use learning_progress_mcp::*;
use tempfile::NamedTempFile;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
}

fn user(id: &str) -> Session {
    Session::User(id.to_string())
}

#[cfg(test)]
mod persistence_integration_tests {
    use super::*;

    #[tokio::test]
    async fn test_progress_survives_restart() {
        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        let db_path = temp_file.path().to_path_buf();

        {
            let server = LearningProgressServer::new(db_path.clone(), ServerConfig::default())
                .await
                .expect("Failed to create first server");
            let progress = server.progress();
            progress.add_completed_lesson(Some(1), today());
            progress.add_daily_xp(today(), 15);
        }

        let server = LearningProgressServer::new(db_path, ServerConfig::default())
            .await
            .expect("Failed to create second server");
        let progress = server.progress();
        assert_eq!(progress.completed_lessons(), vec![1]);
        assert_eq!(progress.daily_xp(today()), 15);
        assert!(progress.daily_lesson_flag(today()));
        assert_eq!(progress.lesson_completion_date(1), Some(today()));
    }

    #[test]
    fn test_completing_twice_keeps_one_entry() {
        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        let kv = SqliteStore::new(temp_file.path().to_path_buf()).expect("Failed to create storage");
        let store = ProgressStore::new(&kv, Session::Guest);

        store.add_completed_lesson(Some(7), today());
        let later = today().succ_opt().unwrap();
        let lessons = store.add_completed_lesson(Some(7), later);
        assert_eq!(lessons, vec![7]);
        // The first completion date is kept
        assert_eq!(store.lesson_completion_date(7), Some(today()));
        assert!(!store.daily_lesson_flag(later));
    }

    #[test]
    fn test_namespaces_are_isolated() {
        let kv = SqliteStore::in_memory().unwrap();
        let a = ProgressStore::new(&kv, user("A"));
        a.add_completed_lesson(Some(1), today());
        a.complete_review(1, today());
        a.add_daily_xp(today(), 40);

        for session in [user("B"), Session::Guest] {
            let other = ProgressStore::new(&kv, session);
            assert!(other.completed_lessons().is_empty());
            assert!(other.completed_items().is_empty());
            assert_eq!(other.daily_xp(today()), 0);
            assert!(!other.daily_lesson_flag(today()));
        }
    }

    #[test]
    fn test_legacy_list_migrates_once() {
        let kv = SqliteStore::in_memory().unwrap();
        kv.set("tsv2Completed", r#"[1, "2", "x"]"#).unwrap();

        let store = ProgressStore::new(&kv, user("A"));
        assert_eq!(store.completed_lessons(), vec![1, 2]);
        assert_eq!(kv.get("tsv2Completed").unwrap(), None);

        // Another identity does not inherit the migrated list
        assert!(ProgressStore::new(&kv, user("B")).completed_lessons().is_empty());
        assert_eq!(store.completed_lessons(), vec![1, 2]);
    }

    #[test]
    fn test_xp_never_goes_negative() {
        let kv = SqliteStore::in_memory().unwrap();
        let store = ProgressStore::new(&kv, Session::Guest);
        store.add_daily_xp(today(), 30);
        assert_eq!(store.subtract_daily_xp(today(), 100), 0);
        assert_eq!(store.daily_xp(today()), 0);
    }

    #[test]
    fn test_skip_quiz_completes_previous_unit() {
        let kv = SqliteStore::in_memory().unwrap();
        let store = ProgressStore::new(&kv, Session::Guest);
        let curriculum = Curriculum::default();

        let items = store.complete_skip_quiz(3, &curriculum, today()).unwrap();
        assert!(items.contains(&CompletedItem::skip_quiz(3)));
        assert!(items.contains(&CompletedItem::review(2)));

        let lessons: HashSet<LessonId> = store.completed_lessons().into_iter().collect();
        let items: HashSet<CompletedItem> = store.completed_items().into_iter().collect();
        let unit = curriculum.unit(1).unwrap();
        assert!(unit
            .indices()
            .all(|i| curriculum.is_entry_completed(i, &lessons, &items)));
        // Unit 1 is untouched
        assert!(!curriculum.is_entry_completed(0, &lessons, &items));

        assert!(store.complete_skip_quiz(1, &curriculum, today()).is_err());
        assert!(store.complete_skip_quiz(7, &curriculum, today()).is_err());
    }

    #[test]
    fn test_logout_removes_only_user_namespace() {
        let kv = SqliteStore::in_memory().unwrap();
        let a = ProgressStore::new(&kv, user("A"));
        a.add_completed_lesson(Some(1), today());
        a.add_daily_xp(today(), 10);
        a.set_light_mode(true);
        ProgressStore::new(&kv, user("AB")).add_completed_lesson(Some(2), today());
        ProgressStore::new(&kv, Session::Guest).add_completed_lesson(Some(3), today());
        kv.set(USER_RECORD_KEY, r#"{"id":"A"}"#).unwrap();

        let (session, response) = tools::logout(&kv, &a);
        assert_eq!(session, Session::Guest);
        assert!(response.removed_keys >= 4);
        assert!(kv.keys_with_prefix("user_A_").unwrap().is_empty());
        assert_eq!(ProgressStore::new(&kv, user("AB")).completed_lessons(), vec![2]);
        assert_eq!(ProgressStore::new(&kv, Session::Guest).completed_lessons(), vec![3]);
        assert_eq!(kv.get(USER_RECORD_KEY).unwrap(), None);
        // Theme is a device preference
        assert!(ProgressStore::new(&kv, Session::Guest).light_mode());
    }
}
