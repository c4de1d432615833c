/// Persisted key layout
///
/// Keys below are relative to an identity namespace (`user_<id>_` or `guest_`);
/// the progress store adds the prefix. Changing any of these strings orphans
/// existing learner data.

use chrono::NaiveDate;

use crate::domain::{date_string_key, day_key, CompletedItem, LessonId};

pub const COMPLETED: &str = "tsv2Completed";
pub const COMPLETED_ITEMS: &str = "tsv2CompletedItems";
pub const DAILY_QUESTS_DATE: &str = "tsv2DailyQuestsDate";
pub const LIGHT_MODE: &str = "tsv2LightMode";

pub const DAILY_XP_PREFIX: &str = "tsv2DailyXP_";
pub const DAILY_LESSONS_PREFIX: &str = "tsv2DailyLessons_";
pub const DAILY_QUESTS_PREFIX: &str = "tsv2DailyQuests_";
pub const LESSON_COMPLETION_PREFIX: &str = "tsv2LessonCompletion_";
pub const ITEM_COMPLETION_PREFIX: &str = "tsv2ItemCompletion_";
pub const REVIEW_COMPLETION_PREFIX: &str = "tsv2ReviewCompletion_";
pub const SKIP_QUIZ_COMPLETION_PREFIX: &str = "tsv2SkipQuizCompletion_";

/// Unprefixed key written by builds that predate identity namespaces
pub const LEGACY_COMPLETED: &str = COMPLETED;

pub fn daily_xp(date: NaiveDate) -> String {
    format!("{}{}", DAILY_XP_PREFIX, date_string_key(date))
}

pub fn daily_lessons(date: NaiveDate) -> String {
    format!("{}{}", DAILY_LESSONS_PREFIX, day_key(date))
}

pub fn daily_quests(date: NaiveDate) -> String {
    format!("{}{}", DAILY_QUESTS_PREFIX, date_string_key(date))
}

pub fn lesson_completion(lesson_id: LessonId) -> String {
    format!("{}{}", LESSON_COMPLETION_PREFIX, lesson_id)
}

/// Stamp key of a completed item; reviews and skip quizzes have their own families
pub fn item_completion(item: &CompletedItem) -> String {
    let prefix = if item.is_review() {
        REVIEW_COMPLETION_PREFIX
    } else if item.is_skip_quiz() {
        SKIP_QUIZ_COMPLETION_PREFIX
    } else {
        ITEM_COMPLETION_PREFIX
    };
    format!("{}{}", prefix, item)
}
