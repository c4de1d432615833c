/// Lesson unlock and status resolution
///
/// Pure classification of every curriculum entry as locked, available or
/// completed. Progression is strictly linear: the first incomplete entry is the
/// only one that can be available.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::domain::{CompletedItem, Curriculum, ItemType, LessonId, ProgressSnapshot};

/// Roadmap status of a curriculum entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Locked,
    Available,
    Completed,
}

/// One row of the roadmap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadmapEntry {
    pub index: usize,
    pub name: String,
    pub item_type: ItemType,
    pub unit: usize,
    /// Lesson ordinal, for plain lessons only
    pub lesson_id: Option<LessonId>,
    pub status: EntryStatus,
    /// First lesson of a not-yet-reached unit offering the skip shortcut
    pub skip_shortcut: bool,
}

/// Status resolver over one progress snapshot
pub struct UnlockResolver<'a> {
    curriculum: &'a Curriculum,
    lessons: HashSet<LessonId>,
    items: HashSet<CompletedItem>,
}

impl<'a> UnlockResolver<'a> {
    pub fn new(curriculum: &'a Curriculum, lessons: HashSet<LessonId>, items: HashSet<CompletedItem>) -> Self {
        Self {
            curriculum,
            lessons,
            items,
        }
    }

    pub fn from_snapshot(curriculum: &'a Curriculum, snapshot: &ProgressSnapshot) -> Self {
        Self::new(curriculum, snapshot.lesson_set(), snapshot.item_set())
    }

    fn is_completed(&self, index: usize) -> bool {
        self.curriculum.is_entry_completed(index, &self.lessons, &self.items)
    }

    /// First entry not yet completed, if any
    pub fn first_incomplete_index(&self) -> Option<usize> {
        (0..self.curriculum.len()).find(|&i| !self.is_completed(i))
    }

    /// Classify the entry at `index`
    pub fn status(&self, index: usize) -> EntryStatus {
        if self.is_completed(index) {
            return EntryStatus::Completed;
        }

        let first_incomplete = match self.first_incomplete_index() {
            Some(i) => i,
            None => {
                let completed_lesson = self.curriculum.item_type(index) == ItemType::Lesson
                    && self.lessons.contains(&self.curriculum.actual_lesson_index(index));
                return if completed_lesson {
                    EntryStatus::Completed
                } else {
                    EntryStatus::Locked
                };
            }
        };

        if index != first_incomplete {
            return EntryStatus::Locked;
        }
        if index == 0 {
            return EntryStatus::Available;
        }
        if !self.is_completed(index - 1) {
            return EntryStatus::Locked;
        }
        // Practice needs two earlier lessons to draw questions from
        if self.curriculum.item_type(index) == ItemType::PersonalizedPractice {
            let earlier_lessons = (0..index)
                .filter(|&i| self.curriculum.item_type(i) == ItemType::Lesson)
                .count();
            if earlier_lessons < 2 {
                return EntryStatus::Locked;
            }
        }
        EntryStatus::Available
    }

    /// Weak unit gate: every earlier unit has at least one completed entry
    pub fn is_unit_reached(&self, unit_index: usize) -> bool {
        if unit_index == 0 {
            return true;
        }
        self.curriculum
            .units
            .iter()
            .take(unit_index)
            .all(|unit| unit.indices().any(|j| self.is_completed(j)))
    }

    /// Skip quiz of a 0-based unit index already passed
    pub fn is_skip_quiz_completed(&self, unit_index: usize) -> bool {
        self.items.contains(&CompletedItem::skip_quiz(unit_index + 1))
    }

    /// The skip shortcut sits on the first lesson of every unit after the first
    /// while that unit is unreached and its skip quiz not yet passed
    pub fn shows_skip_shortcut(&self, index: usize) -> bool {
        let unit_index = self.curriculum.unit_for_index(index);
        let unit = match self.curriculum.unit(unit_index) {
            Some(unit) => unit,
            None => return false,
        };
        unit_index >= 1
            && unit.start == index
            && self.curriculum.item_type(index) == ItemType::Lesson
            && !self.is_unit_reached(unit_index)
            && !self.is_skip_quiz_completed(unit_index)
    }

    /// Every entry with its status
    pub fn roadmap(&self) -> Vec<RoadmapEntry> {
        self.curriculum
            .entries
            .iter()
            .enumerate()
            .map(|(index, name)| {
                let item_type = self.curriculum.item_type(index);
                RoadmapEntry {
                    index,
                    name: name.clone(),
                    item_type,
                    unit: self.curriculum.unit_for_index(index),
                    lesson_id: (item_type == ItemType::Lesson)
                        .then(|| self.curriculum.actual_lesson_index(index)),
                    status: self.status(index),
                    skip_shortcut: self.shows_skip_shortcut(index),
                }
            })
            .collect()
    }
}
