/// End-to-end tool flows through the server's event loop
use chrono::NaiveDate;
use learning_progress_mcp::analytics::consent::ANALYTICAL_KEYS;
use learning_progress_mcp::tools::{self, *};
use learning_progress_mcp::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
}

fn server() -> LearningProgressServer {
    let store = SqliteStore::in_memory().expect("Failed to create storage");
    LearningProgressServer::with_store(store, ServerConfig::default()).expect("Failed to create server")
}

fn complete(server: &LearningProgressServer, lesson_id: serde_json::Value) -> Result<LessonCompleteResponse, DomainError> {
    tools::complete_lesson(
        &server.progress(),
        server.engine().curriculum(),
        server.bus(),
        LessonCompleteParams {
            lesson_id: Some(lesson_id),
        },
        today(),
    )
}

#[cfg(test)]
mod workflow_integration_tests {
    use super::*;

    #[test]
    fn test_lesson_completion_lights_streak() {
        let mut server = server();
        let response = complete(&server, json!("1")).unwrap();
        assert!(response.newly_completed);
        assert_eq!(server.process_events(today()), 1);

        let again = complete(&server, json!(1)).unwrap();
        assert!(!again.newly_completed);
        assert_eq!(again.completed_lessons, vec![1]);
        assert_eq!(server.process_events(today()), 0);

        let status = tools::get_progress_status(
            &server.progress(),
            server.engine(),
            &server.analytics(),
            StatusParams::default(),
            today(),
        )
        .unwrap();
        assert_eq!(status.current_streak, 1);
        assert!(status.active_today);
        assert_eq!(status.lessons_today, 1);
        assert_eq!(status.weekly.len(), 5);
        assert_eq!(status.total_lessons, 27);
    }

    #[test]
    fn test_invalid_lesson_ids_rejected() {
        let server = server();
        assert!(complete(&server, json!(null)).is_err());
        assert!(complete(&server, json!(0)).is_err());
        assert!(complete(&server, json!(999)).is_err());
        assert!(server.progress().completed_lessons().is_empty());
    }

    #[test]
    fn test_quests_stable_within_a_day() {
        let server = server();
        let fetch = |seed: u64, now: i64| {
            tools::get_daily_quests(
                &server.progress(),
                server.engine(),
                &mut StdRng::seed_from_u64(seed),
                QuestsParams {
                    include_completed: Some(true),
                },
                today(),
                now,
            )
            .unwrap()
        };

        let first = fetch(1, 1_000);
        let second = fetch(99, 2_000);
        let ids = |r: &QuestsResponse| r.quests.iter().map(|q| q.id.clone()).collect::<Vec<_>>();
        assert_eq!(first.quests.len(), 2);
        assert_eq!(ids(&first), ids(&second));
    }

    #[test]
    fn test_completed_quest_hidden_but_persisted() {
        let mut server = server();
        let quests = vec![
            Quest::new("quest_1_0".to_string(), QuestKind::DoOneLesson),
            Quest::new("quest_1_1".to_string(), QuestKind::GetTwentyXp),
        ];
        server.progress().save_daily_quests(today(), &quests);

        complete(&server, json!(1)).unwrap();
        server.process_events(today());

        let stored = server.progress().daily_quests(today()).unwrap();
        assert_eq!(stored.len(), 2);
        assert!(stored[0].completed);
        assert_eq!(stored[0].progress, 1);

        let response = tools::get_daily_quests(
            &server.progress(),
            server.engine(),
            &mut StdRng::seed_from_u64(0),
            QuestsParams::default(),
            today(),
            5_000,
        )
        .unwrap();
        assert_eq!(response.completed_today, 1);
        assert_eq!(response.quests.len(), 1);
        assert_eq!(response.quests[0].id, "quest_1_1");
    }

    #[test]
    fn test_xp_revoke_floors_at_zero() {
        let mut server = server();
        let awarded = tools::award_xp(&server.progress(), server.bus(), XpParams { amount: 30 }, today()).unwrap();
        assert_eq!(awarded.xp_today, 30);

        let revoked = tools::revoke_xp(
            &server.progress(),
            &server.analytics(),
            server.bus(),
            XpRevokeParams {
                amount: 100,
                lesson_id: Some(3),
                step: Some("quiz".to_string()),
                time_spent: Some(42),
            },
            today(),
        )
        .unwrap();
        assert_eq!(revoked.xp_today, 0);
        assert_eq!(server.process_events(today()), 2);

        // No consent was given, so the drop-off is not recorded
        assert!(server.analytics().analytics_data().drop_offs.is_empty());
    }

    #[test]
    fn test_roadmap_follows_completions() {
        let server = server();
        let roadmap = |unit: Option<usize>| {
            tools::get_roadmap(&server.progress(), server.engine(), RoadmapParams { unit }, today()).unwrap()
        };

        assert_eq!(roadmap(None).next_available, Some(0));
        complete(&server, json!(1)).unwrap();
        complete(&server, json!(2)).unwrap();

        let response = roadmap(Some(1));
        assert_eq!(response.next_available, Some(2));
        assert_eq!(response.entries.len(), 4);
        assert_eq!(response.entries[2].status, EntryStatus::Available);

        tools::complete_item(
            &server.progress(),
            server.engine().curriculum(),
            server.bus(),
            ItemCompleteParams {
                kind: ItemKind::Practice,
                index: Some(2),
                unit: None,
            },
            today(),
        )
        .unwrap();
        assert_eq!(roadmap(None).next_available, Some(3));
    }

    #[test]
    fn test_minor_cannot_enable_analytics() {
        let server = server();
        let response = tools::set_consent(
            &server.analytics(),
            ConsentSetParams {
                analytical: Some(true),
                marketing: Some(true),
                age: Some(12),
            },
        )
        .unwrap();
        assert!(response.is_minor);
        assert!(!response.preferences.analytical);
        assert!(!response.preferences.marketing);

        let analytics = server.analytics();
        assert!(!analytics.track_retention(today()));
        analytics.track_lesson_drop_off(1, "content", 10);
        assert!(!analytics.track_flagged_question(1, 0, "confusing"));
        for key in ANALYTICAL_KEYS {
            assert_eq!(server.store().get(key).unwrap(), None, "{} was written", key);
        }
    }

    #[test]
    fn test_adult_consent_enables_tracking() {
        let server = server();
        tools::set_consent(
            &server.analytics(),
            ConsentSetParams {
                analytical: Some(true),
                marketing: None,
                age: Some(30),
            },
        )
        .unwrap();

        let analytics = server.analytics();
        assert!(analytics.track_retention(today()));
        assert!(!analytics.track_retention(today()));
        assert_eq!(analytics.analytics_data().retention_data.len(), 1);

        // Withdrawing consent deletes the collected data
        tools::set_consent(
            &analytics,
            ConsentSetParams {
                analytical: Some(false),
                marketing: None,
                age: None,
            },
        )
        .unwrap();
        assert!(analytics.analytics_data().retention_data.is_empty());
    }

    #[test]
    fn test_session_switch_scopes_progress() {
        let mut server = server();
        complete(&server, json!(1)).unwrap();

        let (session, _) = tools::switch_session(SessionSwitchParams {
            user_id: Some("learner-1".to_string()),
        })
        .unwrap();
        server.set_session(session);
        assert!(server.progress().completed_lessons().is_empty());
        // Queued events of the guest are dropped with the switch
        assert_eq!(server.process_events(today()), 0);

        server.set_session(Session::Guest);
        assert_eq!(server.progress().completed_lessons(), vec![1]);
    }
}
