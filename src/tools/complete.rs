/// Tools for recording completions
///
/// This module implements the lesson_complete and item_complete MCP tools.

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{
    parse_lesson_id, CompletedItem, Curriculum, DomainError, EventBus, ItemType, LessonId,
    ProgressEvent,
};
use crate::storage::{KeyValueStore, ProgressStore};

/// Parameters for completing a lesson
#[derive(Debug, Deserialize, JsonSchema)]
pub struct LessonCompleteParams {
    /// Lesson ordinal (1-based, plain lessons only); numbers or numeric strings
    pub lesson_id: Option<Value>,
}

/// Response from completing a lesson
#[derive(Debug, Serialize)]
pub struct LessonCompleteResponse {
    pub lesson_id: LessonId,
    pub newly_completed: bool,
    pub completed_lessons: Vec<LessonId>,
    pub message: String,
}

/// Mark a lesson completed and announce it
pub fn complete_lesson<S: KeyValueStore + ?Sized>(
    store: &ProgressStore<'_, S>,
    curriculum: &Curriculum,
    bus: &EventBus,
    params: LessonCompleteParams,
    today: NaiveDate,
) -> Result<LessonCompleteResponse, DomainError> {
    let raw = params.lesson_id.unwrap_or(Value::Null);
    let lesson_id = parse_lesson_id(&raw)
        .filter(|id| *id >= 1)
        .ok_or_else(|| DomainError::InvalidLessonId(raw.to_string()))?;

    let position = curriculum
        .position_of_lesson(lesson_id)
        .ok_or_else(|| DomainError::InvalidLessonId(lesson_id.to_string()))?;

    let before = store.completed_lessons().len();
    let completed_lessons = store.add_completed_lesson(Some(lesson_id), today);
    let newly_completed = completed_lessons.len() > before;

    if newly_completed {
        bus.publish(ProgressEvent::LessonCompleted { lesson_id });
    }

    let name = curriculum.name(position).unwrap_or("Lesson");
    let message = if newly_completed {
        format!("✅ Completed lesson {}: {}", lesson_id, name)
    } else {
        format!("Lesson {} ({}) was already completed", lesson_id, name)
    };

    Ok(LessonCompleteResponse {
        lesson_id,
        newly_completed,
        completed_lessons,
        message,
    })
}

/// Kind of non-lesson roadmap item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Practice,
    Review,
    SkipQuiz,
}

/// Parameters for completing a practice, review or skip quiz
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ItemCompleteParams {
    pub kind: ItemKind,
    /// Roadmap position of a personalized practice entry
    pub index: Option<usize>,
    /// 1-based unit number of a review or skip quiz
    pub unit: Option<usize>,
}

/// Response from completing an item
#[derive(Debug, Serialize)]
pub struct ItemCompleteResponse {
    pub item: CompletedItem,
    pub newly_completed: bool,
    pub completed_items: Vec<CompletedItem>,
    pub message: String,
}

/// Record a finished practice, review or skip quiz and announce new completions
pub fn complete_item<S: KeyValueStore + ?Sized>(
    store: &ProgressStore<'_, S>,
    curriculum: &Curriculum,
    bus: &EventBus,
    params: ItemCompleteParams,
    today: NaiveDate,
) -> Result<ItemCompleteResponse, DomainError> {
    let lessons_before = store.completed_lessons();
    let items_before = store.completed_items();

    let (item, completed_items) = match params.kind {
        ItemKind::Practice => {
            let index = params
                .index
                .ok_or_else(|| DomainError::InvalidItem("practice requires an index".to_string()))?;
            if index >= curriculum.len()
                || curriculum.item_type(index) != ItemType::PersonalizedPractice
            {
                return Err(DomainError::InvalidItem(format!(
                    "entry {} is not a personalized practice",
                    index
                )));
            }
            (CompletedItem::practice(index), store.complete_practice(index, today))
        }
        ItemKind::Review => {
            let unit = params
                .unit
                .ok_or_else(|| DomainError::InvalidItem("review requires a unit".to_string()))?;
            if unit == 0 || unit > curriculum.units.len() {
                return Err(DomainError::UnknownUnit(unit));
            }
            (CompletedItem::review(unit), store.complete_review(unit, today))
        }
        ItemKind::SkipQuiz => {
            let unit = params
                .unit
                .ok_or_else(|| DomainError::InvalidItem("skip quiz requires a unit".to_string()))?;
            let items = store.complete_skip_quiz(unit, curriculum, today)?;
            (CompletedItem::skip_quiz(unit), items)
        }
    };

    // A skip quiz can complete a whole unit of lessons at once
    for lesson_id in store.completed_lessons() {
        if !lessons_before.contains(&lesson_id) {
            bus.publish(ProgressEvent::LessonCompleted { lesson_id });
        }
    }
    for new_item in completed_items.iter().filter(|i| !items_before.contains(i)) {
        bus.publish(ProgressEvent::ItemCompleted {
            item: new_item.clone(),
        });
    }

    let newly_completed = !items_before.contains(&item);
    let message = if newly_completed {
        format!("✅ Completed {}", item)
    } else {
        format!("{} was already completed", item)
    };

    Ok(ItemCompleteResponse {
        item,
        newly_completed,
        completed_items,
        message,
    })
}
