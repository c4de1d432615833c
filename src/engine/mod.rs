/// Progress recomputation
///
/// The engine ties the pure domain computations to a progress store: it takes a
/// fresh snapshot, derives streak, weekly map, quests and roadmap from it, and
/// writes back the few values derivation normalises (daily flags, quest list).
/// It holds no learner state of its own, so any event can be answered by
/// re-deriving from storage.

use chrono::NaiveDate;
use rand::Rng;
use serde::Serialize;

use crate::domain::{
    active_quests, evaluate_quests, generate_daily_quests, Curriculum, ProgressEvent,
    ProgressSnapshot, Quest, RoadmapEntry, Streak, UnlockResolver, WeeklyProgress,
};
use crate::storage::{KeyValueStore, ProgressStore};

/// Today's derived progress
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayProgress {
    pub streak: Streak,
    pub weekly: WeeklyProgress,
    pub lessons_today: u32,
    pub xp_today: u32,
    pub message: String,
}

/// Quests for the day: the persisted list and the part still shown
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestBoard {
    pub all: Vec<Quest>,
    pub active: Vec<Quest>,
}

/// Recomputation engine over a fixed curriculum
#[derive(Debug, Clone, Default)]
pub struct ProgressEngine {
    curriculum: Curriculum,
}

impl ProgressEngine {
    pub fn new(curriculum: Curriculum) -> Self {
        Self { curriculum }
    }

    pub fn curriculum(&self) -> &Curriculum {
        &self.curriculum
    }

    /// Recompute streak and weekly progress, normalising reconstructed flags
    ///
    /// Days counted from completion stamps get their flag set to "1". A flag that
    /// is already set is never cleared.
    pub fn refresh_day<S: KeyValueStore + ?Sized>(
        &self,
        store: &ProgressStore<'_, S>,
        today: NaiveDate,
    ) -> DayProgress {
        let mut snapshot = store.snapshot(today);
        let streak = Streak::calculate(&snapshot);

        for day in &streak.days_to_flag {
            store.set_daily_lesson_flag(*day, true);
            snapshot.flagged_days.insert(*day);
        }
        if !streak.days_to_flag.is_empty() {
            tracing::debug!("Normalised {} daily flags", streak.days_to_flag.len());
        }

        let weekly = WeeklyProgress::calculate(&snapshot);
        let message = streak.motivational_message();

        DayProgress {
            lessons_today: snapshot.lessons_completed_on(today),
            xp_today: snapshot.xp_today,
            streak,
            weekly,
            message,
        }
    }

    /// Today's quests, generated on the first call of the day
    ///
    /// Progress is re-derived from the current snapshot and the full list is
    /// written back; only incomplete quests are returned as active.
    pub fn daily_quests<S, R>(
        &self,
        store: &ProgressStore<'_, S>,
        rng: &mut R,
        today: NaiveDate,
        now_millis: i64,
    ) -> QuestBoard
    where
        S: KeyValueStore + ?Sized,
        R: Rng + ?Sized,
    {
        let quests = match store.daily_quests(today) {
            Some(quests) => quests,
            None => {
                let quests = generate_daily_quests(rng, now_millis);
                tracing::info!(
                    "Generated daily quests for {}: {:?}",
                    today,
                    quests.iter().map(|q| q.kind).collect::<Vec<_>>()
                );
                store.save_daily_quests(today, &quests);
                store.set_daily_quests_date(today);
                quests
            }
        };

        self.evaluate_and_store(store, &quests, &store.snapshot(today))
    }

    /// Re-evaluate already generated quests without drawing new ones
    pub fn refresh_quests<S: KeyValueStore + ?Sized>(
        &self,
        store: &ProgressStore<'_, S>,
        today: NaiveDate,
    ) -> Option<QuestBoard> {
        let quests = store.daily_quests(today)?;
        Some(self.evaluate_and_store(store, &quests, &store.snapshot(today)))
    }

    fn evaluate_and_store<S: KeyValueStore + ?Sized>(
        &self,
        store: &ProgressStore<'_, S>,
        quests: &[Quest],
        snapshot: &ProgressSnapshot,
    ) -> QuestBoard {
        let all = evaluate_quests(quests, snapshot, &self.curriculum);
        if all.as_slice() != quests {
            store.save_daily_quests(snapshot.today, &all);
        }
        for quest in all.iter().filter(|q| q.completed) {
            if !quests.iter().any(|old| old.id == quest.id && old.completed) {
                tracing::info!("Quest completed: {}", quest.label);
            }
        }
        let active = active_quests(&all);
        QuestBoard { all, active }
    }

    /// Every curriculum entry with its current status
    pub fn roadmap<S: KeyValueStore + ?Sized>(
        &self,
        store: &ProgressStore<'_, S>,
        today: NaiveDate,
    ) -> Vec<RoadmapEntry> {
        let snapshot = store.snapshot(today);
        UnlockResolver::from_snapshot(&self.curriculum, &snapshot).roadmap()
    }

    /// React to a progress event by re-deriving day progress and quests
    ///
    /// The event's own payload is only logged; the mutation it reports has
    /// already been applied by the publisher.
    pub fn on_event<S: KeyValueStore + ?Sized>(
        &self,
        store: &ProgressStore<'_, S>,
        event: &ProgressEvent,
        today: NaiveDate,
    ) -> DayProgress {
        tracing::debug!("Re-deriving progress after {:?}", event);
        let day = self.refresh_day(store, today);
        self.refresh_quests(store, today);
        day
    }
}
