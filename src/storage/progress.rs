/// Identity-scoped progress store
///
/// Typed operations over a `KeyValueStore`. Every key is prefixed with the
/// session namespace, so a store built for one identity never sees another
/// identity's data. Backend failures never reach the caller: reads fall back to
/// empty values and writes are verified by re-reading, with mismatches logged.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde_json::Value;

use crate::domain::{
    date_string_key, day_key, parse_day_key, parse_lesson_id, parse_stored_quests, CompletedItem,
    Curriculum, DomainError, ItemType, LessonId, ProgressSnapshot, Quest, Session,
};
use crate::storage::{keys, KeyValueStore};

/// Progress operations for one identity
pub struct ProgressStore<'a, S: KeyValueStore + ?Sized> {
    kv: &'a S,
    session: Session,
    namespace: String,
}

impl<'a, S: KeyValueStore + ?Sized> ProgressStore<'a, S> {
    pub fn new(kv: &'a S, session: Session) -> Self {
        let namespace = session.namespace();
        Self {
            kv,
            session,
            namespace,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn key(&self, relative: &str) -> String {
        format!("{}{}", self.namespace, relative)
    }

    fn read(&self, relative: &str) -> Option<String> {
        let key = self.key(relative);
        match self.kv.get(&key) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("Failed to read {}: {}", key, e);
                None
            }
        }
    }

    /// Write and verify by reading the value back
    fn write(&self, relative: &str, value: &str) {
        let key = self.key(relative);
        if let Err(e) = self.kv.set(&key, value) {
            tracing::error!("Failed to save {}: {}", key, e);
            return;
        }
        match self.kv.get(&key) {
            Ok(Some(saved)) if saved == value => {}
            Ok(saved) => {
                tracing::error!(
                    "Failed to save progress for {}! Expected: {}, got: {:?}",
                    key,
                    value,
                    saved
                );
            }
            Err(e) => tracing::error!("Failed to verify {}: {}", key, e),
        }
    }

    fn read_json_array(&self, relative: &str) -> Option<Vec<Value>> {
        let raw = self.read(relative).filter(|raw| !raw.trim().is_empty())?;
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(values)) => Some(values),
            Ok(_) => {
                tracing::warn!("Expected a list under {}, ignoring stored value", relative);
                Some(Vec::new())
            }
            Err(e) => {
                tracing::warn!("Unreadable list under {}: {}", relative, e);
                Some(Vec::new())
            }
        }
    }

    fn write_json<T: serde::Serialize + ?Sized>(&self, relative: &str, value: &T) {
        match serde_json::to_string(value) {
            Ok(raw) => self.write(relative, &raw),
            Err(e) => tracing::error!("Failed to encode {}: {}", relative, e),
        }
    }

    // ---- completed lessons ----

    /// Completed lesson ids, in completion order
    ///
    /// String entries are coerced to integers and unparseable ones dropped. When
    /// the namespaced list is empty the unprefixed legacy list is migrated into it.
    pub fn completed_lessons(&self) -> Vec<LessonId> {
        match self.read_json_array(keys::COMPLETED) {
            Some(values) => values.iter().filter_map(parse_lesson_id).collect(),
            None => self.migrate_legacy_lessons(),
        }
    }

    fn migrate_legacy_lessons(&self) -> Vec<LessonId> {
        let legacy = match self.kv.get(keys::LEGACY_COMPLETED) {
            Ok(Some(raw)) if !raw.trim().is_empty() => raw,
            Ok(_) => return Vec::new(),
            Err(e) => {
                tracing::error!("Failed to read legacy lesson list: {}", e);
                return Vec::new();
            }
        };

        let values = match serde_json::from_str::<Value>(&legacy) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("Error migrating old lesson data: {}", e);
                return Vec::new();
            }
        };

        self.write(keys::COMPLETED, &legacy);
        if let Err(e) = self.kv.remove(keys::LEGACY_COMPLETED) {
            tracing::error!("Failed to remove legacy lesson list: {}", e);
        }
        tracing::info!("Migrated legacy lesson list into {}", self.namespace);

        match values {
            Value::Array(values) => values.iter().filter_map(parse_lesson_id).collect(),
            _ => Vec::new(),
        }
    }

    /// Append a lesson if absent
    ///
    /// The first completion stamps today's date and sets today's daily flag. A
    /// missing id is logged and leaves the list unchanged.
    pub fn add_completed_lesson(&self, lesson_id: Option<LessonId>, today: NaiveDate) -> Vec<LessonId> {
        let mut completed = self.completed_lessons();
        let lesson_id = match lesson_id {
            Some(id) => id,
            None => {
                tracing::error!("Cannot complete a lesson without a lesson id");
                return completed;
            }
        };

        if !completed.contains(&lesson_id) {
            completed.push(lesson_id);
            self.write_json(keys::COMPLETED, &completed);
            self.set_lesson_completion_date(lesson_id, today);
            self.set_daily_lesson_flag(today, true);
            tracing::debug!("Completed lesson {} for {}", lesson_id, self.session);
        }

        completed
    }

    // ---- completed items ----

    pub fn completed_items(&self) -> Vec<CompletedItem> {
        self.read_json_array(keys::COMPLETED_ITEMS)
            .unwrap_or_default()
            .iter()
            .filter_map(CompletedItem::from_json)
            .collect()
    }

    /// Append an item if absent; returns the list and whether it was new
    fn append_item(&self, item: &CompletedItem) -> (Vec<CompletedItem>, bool) {
        let mut items = self.completed_items();
        if items.contains(item) {
            return (items, false);
        }
        items.push(item.clone());
        self.write_json(keys::COMPLETED_ITEMS, &items);
        (items, true)
    }

    pub fn add_completed_item(&self, item: CompletedItem) -> Vec<CompletedItem> {
        self.append_item(&item).0
    }

    /// Record a finished review of a 1-based unit
    pub fn complete_review(&self, unit_number: usize, today: NaiveDate) -> Vec<CompletedItem> {
        self.complete_meaningful_item(CompletedItem::review(unit_number), today)
    }

    /// Record a finished personalized practice at a roadmap position
    ///
    /// Practice is stamped but does not set the daily flag.
    pub fn complete_practice(&self, index: usize, today: NaiveDate) -> Vec<CompletedItem> {
        let item = CompletedItem::practice(index);
        let (items, added) = self.append_item(&item);
        if added {
            self.set_item_completion_date(&item, today);
        }
        items
    }

    fn complete_meaningful_item(&self, item: CompletedItem, today: NaiveDate) -> Vec<CompletedItem> {
        let (items, added) = self.append_item(&item);
        if added {
            self.set_item_completion_date(&item, today);
            self.set_daily_lesson_flag(today, true);
            tracing::debug!("Completed {} for {}", item, self.session);
        }
        items
    }

    /// Record a passed skip quiz for a 1-based unit number
    ///
    /// Every entry of the preceding unit is completed first (lessons stamped
    /// today), then the skip quiz itself is recorded.
    pub fn complete_skip_quiz(
        &self,
        unit_number: usize,
        curriculum: &Curriculum,
        today: NaiveDate,
    ) -> Result<Vec<CompletedItem>, DomainError> {
        if unit_number < 2 || unit_number > curriculum.units.len() {
            return Err(DomainError::UnknownUnit(unit_number));
        }
        let previous = curriculum
            .unit(unit_number - 2)
            .ok_or(DomainError::UnknownUnit(unit_number))?;

        for index in previous.indices() {
            match curriculum.item_type(index) {
                ItemType::Lesson => {
                    self.add_completed_lesson(Some(curriculum.actual_lesson_index(index)), today);
                }
                ItemType::PersonalizedPractice => {
                    self.complete_practice(index, today);
                }
                ItemType::Review => {
                    self.complete_review(unit_number - 1, today);
                }
            }
        }

        Ok(self.complete_meaningful_item(CompletedItem::skip_quiz(unit_number), today))
    }

    // ---- daily XP ----

    pub fn daily_xp(&self, date: NaiveDate) -> u32 {
        let raw = match self.read(&keys::daily_xp(date)) {
            Some(raw) => raw,
            None => return 0,
        };
        match raw.trim().parse::<i64>() {
            Ok(xp) => xp.clamp(0, u32::MAX as i64) as u32,
            Err(_) => {
                tracing::warn!("Unreadable daily XP '{}' for {}, treating as 0", raw, date);
                0
            }
        }
    }

    /// Add XP to a day; returns the new total
    pub fn add_daily_xp(&self, date: NaiveDate, xp: u32) -> u32 {
        let total = self.daily_xp(date).saturating_add(xp);
        self.write(&keys::daily_xp(date), &total.to_string());
        total
    }

    /// Revoke XP from a day, never going below zero; returns the new total
    pub fn subtract_daily_xp(&self, date: NaiveDate, xp: u32) -> u32 {
        let total = self.daily_xp(date).saturating_sub(xp);
        self.write(&keys::daily_xp(date), &total.to_string());
        total
    }

    // ---- daily lesson flags ----

    pub fn daily_lesson_flag(&self, date: NaiveDate) -> bool {
        self.read(&keys::daily_lessons(date)).as_deref() == Some("1")
    }

    pub fn set_daily_lesson_flag(&self, date: NaiveDate, done: bool) {
        self.write(&keys::daily_lessons(date), if done { "1" } else { "0" });
    }

    /// Every day whose flag is set
    pub fn flagged_days(&self) -> BTreeSet<NaiveDate> {
        let prefix = self.key(keys::DAILY_LESSONS_PREFIX);
        let flag_keys = match self.kv.keys_with_prefix(&prefix) {
            Ok(keys) => keys,
            Err(e) => {
                tracing::error!("Failed to list daily flags: {}", e);
                return BTreeSet::new();
            }
        };

        flag_keys
            .iter()
            .filter_map(|key| parse_day_key(&key[prefix.len()..]))
            .filter(|date| self.daily_lesson_flag(*date))
            .collect()
    }

    // ---- completion stamps ----

    pub fn lesson_completion_date(&self, lesson_id: LessonId) -> Option<NaiveDate> {
        self.read(&keys::lesson_completion(lesson_id))
            .and_then(|raw| parse_day_key(&raw))
    }

    pub fn set_lesson_completion_date(&self, lesson_id: LessonId, date: NaiveDate) {
        self.write(&keys::lesson_completion(lesson_id), &day_key(date));
    }

    pub fn item_completion_date(&self, item: &CompletedItem) -> Option<NaiveDate> {
        self.read(&keys::item_completion(item))
            .and_then(|raw| parse_day_key(&raw))
    }

    pub fn set_item_completion_date(&self, item: &CompletedItem, date: NaiveDate) {
        self.write(&keys::item_completion(item), &day_key(date));
    }

    // ---- snapshot ----

    /// Read everything the streak, quest and unlock computations need
    pub fn snapshot(&self, today: NaiveDate) -> ProgressSnapshot {
        let completed_lessons = self.completed_lessons();
        let completed_items = self.completed_items();

        let lesson_dates = completed_lessons
            .iter()
            .filter_map(|id| self.lesson_completion_date(*id).map(|date| (*id, date)))
            .collect();
        let item_dates = completed_items
            .iter()
            .filter_map(|item| self.item_completion_date(item).map(|date| (item.clone(), date)))
            .collect();

        ProgressSnapshot {
            today,
            completed_lessons,
            completed_items,
            lesson_dates,
            item_dates,
            flagged_days: self.flagged_days(),
            xp_today: self.daily_xp(today),
        }
    }

    // ---- daily quests ----

    /// Stored quests for `date`; `None` when absent or unreadable
    pub fn daily_quests(&self, date: NaiveDate) -> Option<Vec<Quest>> {
        let raw = self.read(&keys::daily_quests(date))?;
        parse_stored_quests(&raw)
    }

    pub fn save_daily_quests(&self, date: NaiveDate, quests: &[Quest]) {
        self.write_json(&keys::daily_quests(date), quests);
    }

    /// Date string of the last quest generation
    pub fn daily_quests_date(&self) -> Option<String> {
        self.read(keys::DAILY_QUESTS_DATE)
    }

    pub fn set_daily_quests_date(&self, date: NaiveDate) {
        self.write(keys::DAILY_QUESTS_DATE, &date_string_key(date));
    }

    // ---- preferences ----

    /// Light mode is a device preference and lives outside any namespace
    pub fn light_mode(&self) -> bool {
        match self.kv.get(keys::LIGHT_MODE) {
            Ok(value) => value.as_deref() == Some("true"),
            Err(e) => {
                tracing::error!("Failed to read light mode: {}", e);
                false
            }
        }
    }

    pub fn set_light_mode(&self, enabled: bool) {
        if let Err(e) = self.kv.set(keys::LIGHT_MODE, if enabled { "true" } else { "false" }) {
            tracing::error!("Failed to save light mode: {}", e);
        }
    }

    // ---- logout ----

    /// Delete every key of this namespace; returns how many were removed
    pub fn clear_namespace(&self) -> usize {
        let all_keys = match self.kv.keys_with_prefix(&self.namespace) {
            Ok(keys) => keys,
            Err(e) => {
                tracing::error!("Failed to list keys of {}: {}", self.namespace, e);
                return 0;
            }
        };

        let mut removed = 0;
        for key in &all_keys {
            match self.kv.remove(key) {
                Ok(()) => removed += 1,
                Err(e) => tracing::error!("Failed to remove {}: {}", key, e),
            }
        }
        tracing::info!("Cleared {} keys for {}", removed, self.session);
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteStore;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn guest(kv: &SqliteStore) -> ProgressStore<'_, SqliteStore> {
        ProgressStore::new(kv, Session::Guest)
    }

    #[test]
    fn test_add_completed_lesson_is_idempotent() {
        let kv = SqliteStore::in_memory().unwrap();
        let store = guest(&kv);

        store.add_completed_lesson(Some(3), today());
        let lessons = store.add_completed_lesson(Some(3), today());
        assert_eq!(lessons, vec![3]);
        assert_eq!(store.lesson_completion_date(3), Some(today()));
        assert!(store.daily_lesson_flag(today()));
    }

    #[test]
    fn test_missing_lesson_id_is_a_no_op() {
        let kv = SqliteStore::in_memory().unwrap();
        let store = guest(&kv);
        store.add_completed_lesson(Some(1), today());

        let lessons = store.add_completed_lesson(None, today());
        assert_eq!(lessons, vec![1]);
    }

    #[test]
    fn test_string_lesson_ids_are_coerced() {
        let kv = SqliteStore::in_memory().unwrap();
        kv.set("guest_tsv2Completed", r#"[1, "2", "x", null, 4]"#).unwrap();
        assert_eq!(guest(&kv).completed_lessons(), vec![1, 2, 4]);
    }

    #[test]
    fn test_corrupt_lists_read_as_empty() {
        let kv = SqliteStore::in_memory().unwrap();
        kv.set("guest_tsv2Completed", "{not json").unwrap();
        kv.set("guest_tsv2CompletedItems", r#"{"a": 1}"#).unwrap();
        let store = guest(&kv);
        assert!(store.completed_lessons().is_empty());
        assert!(store.completed_items().is_empty());
    }

    #[test]
    fn test_legacy_lessons_are_migrated_once() {
        let kv = SqliteStore::in_memory().unwrap();
        kv.set("tsv2Completed", "[1,2]").unwrap();

        let store = ProgressStore::new(&kv, Session::User("a".to_string()));
        assert_eq!(store.completed_lessons(), vec![1, 2]);
        assert_eq!(kv.get("tsv2Completed").unwrap(), None);
        assert_eq!(kv.get("user_a_tsv2Completed").unwrap(), Some("[1,2]".to_string()));

        // A second identity finds nothing left to migrate
        assert!(guest(&kv).completed_lessons().is_empty());
    }

    #[test]
    fn test_daily_xp_floor() {
        let kv = SqliteStore::in_memory().unwrap();
        let store = guest(&kv);
        assert_eq!(store.add_daily_xp(today(), 30), 30);
        assert_eq!(store.subtract_daily_xp(today(), 100), 0);
        assert_eq!(store.daily_xp(today()), 0);
        assert_eq!(
            kv.get("guest_tsv2DailyXP_Sun Oct 18 2026").unwrap(),
            Some("0".to_string())
        );
    }

    #[test]
    fn test_review_sets_flag_and_stamp() {
        let kv = SqliteStore::in_memory().unwrap();
        let store = guest(&kv);
        let items = store.complete_review(2, today());
        assert_eq!(items, vec![CompletedItem::review(2)]);
        assert_eq!(store.item_completion_date(&CompletedItem::review(2)), Some(today()));
        assert!(store.daily_lesson_flag(today()));
    }

    #[test]
    fn test_practice_does_not_set_flag() {
        let kv = SqliteStore::in_memory().unwrap();
        let store = guest(&kv);
        store.complete_practice(2, today());
        assert_eq!(store.completed_items(), vec![CompletedItem::practice(2)]);
        assert!(!store.daily_lesson_flag(today()));
    }

    #[test]
    fn test_skip_quiz_completes_previous_unit() {
        let kv = SqliteStore::in_memory().unwrap();
        let store = guest(&kv);
        let curriculum = Curriculum::default();

        store.complete_skip_quiz(2, &curriculum, today()).unwrap();

        assert_eq!(store.completed_lessons(), vec![1, 2]);
        let items = store.completed_items();
        assert!(items.contains(&CompletedItem::practice(2)));
        assert!(items.contains(&CompletedItem::review(1)));
        assert!(items.contains(&CompletedItem::skip_quiz(2)));
        assert_eq!(store.lesson_completion_date(2), Some(today()));
        assert!(store.daily_lesson_flag(today()));
    }

    #[test]
    fn test_skip_quiz_rejects_first_unit() {
        let kv = SqliteStore::in_memory().unwrap();
        let store = guest(&kv);
        assert!(store.complete_skip_quiz(1, &Curriculum::default(), today()).is_err());
        assert!(store.complete_skip_quiz(7, &Curriculum::default(), today()).is_err());
    }

    #[test]
    fn test_snapshot_collects_flags_and_stamps() {
        let kv = SqliteStore::in_memory().unwrap();
        let store = guest(&kv);
        let yesterday = today().pred_opt().unwrap();

        store.add_completed_lesson(Some(1), yesterday);
        store.set_daily_lesson_flag(today(), false);
        store.add_daily_xp(today(), 12);

        let snapshot = store.snapshot(today());
        assert_eq!(snapshot.completed_lessons, vec![1]);
        assert_eq!(snapshot.lesson_dates.get(&1), Some(&yesterday));
        assert_eq!(snapshot.flagged_days.iter().copied().collect::<Vec<_>>(), vec![yesterday]);
        assert_eq!(snapshot.xp_today, 12);
    }

    #[test]
    fn test_namespace_isolation() {
        let kv = SqliteStore::in_memory().unwrap();
        let alice = ProgressStore::new(&kv, Session::User("A".to_string()));
        alice.add_completed_lesson(Some(5), today());
        alice.add_daily_xp(today(), 10);

        let bob = ProgressStore::new(&kv, Session::User("B".to_string()));
        assert!(bob.completed_lessons().is_empty());
        assert_eq!(bob.daily_xp(today()), 0);
        assert!(guest(&kv).completed_lessons().is_empty());
    }

    #[test]
    fn test_clear_namespace_leaves_other_identities() {
        let kv = SqliteStore::in_memory().unwrap();
        let alice = ProgressStore::new(&kv, Session::User("A".to_string()));
        alice.add_completed_lesson(Some(1), today());
        guest(&kv).add_completed_lesson(Some(2), today());
        alice.set_light_mode(true);

        assert!(alice.clear_namespace() >= 3);
        assert!(alice.completed_lessons().is_empty());
        assert_eq!(guest(&kv).completed_lessons(), vec![2]);
        assert!(alice.light_mode());
    }

    #[test]
    fn test_quest_persistence_round_trip() {
        let kv = SqliteStore::in_memory().unwrap();
        let store = guest(&kv);
        assert!(store.daily_quests(today()).is_none());

        let quests = vec![
            Quest::new("quest_1_0".to_string(), crate::domain::QuestKind::DoOneLesson),
            Quest::new("quest_1_1".to_string(), crate::domain::QuestKind::GetTenXp),
        ];
        store.save_daily_quests(today(), &quests);
        store.set_daily_quests_date(today());

        assert_eq!(store.daily_quests(today()), Some(quests));
        assert_eq!(store.daily_quests_date().as_deref(), Some("Sun Oct 18 2026"));
    }
}
