/// Static curriculum table
///
/// The roadmap is an ordered list of entry names partitioned into named units.
/// Entry names decide the entry type: "Personalized Practice" and "Review" are
/// special, anything else is a plain lesson.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{CompletedItem, DomainError, LessonId};

pub const PERSONALIZED_PRACTICE: &str = "Personalized Practice";
pub const REVIEW: &str = "Review";

/// Kind of a curriculum entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemType {
    Lesson,
    PersonalizedPractice,
    Review,
}

impl ItemType {
    pub fn from_name(name: &str) -> Self {
        match name {
            PERSONALIZED_PRACTICE => ItemType::PersonalizedPractice,
            REVIEW => ItemType::Review,
            _ => ItemType::Lesson,
        }
    }
}

/// A contiguous, inclusive range of entry positions with a display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub name: String,
    pub start: usize,
    pub end: usize,
}

impl Unit {
    pub fn new(name: &str, start: usize, end: usize) -> Self {
        Self {
            name: name.to_string(),
            start,
            end,
        }
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index <= self.end
    }

    pub fn indices(&self) -> std::ops::RangeInclusive<usize> {
        self.start..=self.end
    }
}

/// Ordered lesson/practice/review table plus its unit partition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Curriculum {
    pub entries: Vec<String>,
    pub units: Vec<Unit>,
}

const DEFAULT_ENTRIES: [&str; 45] = [
    "Human Body Systems",
    "Cells",
    PERSONALIZED_PRACTICE,
    REVIEW,
    "Tissues and Organs",
    "Skeletal System",
    "Muscular System",
    PERSONALIZED_PRACTICE,
    "Nervous System",
    "Five Senses",
    PERSONALIZED_PRACTICE,
    "Endocrine System",
    REVIEW,
    "Circulatory System",
    "Respiratory System",
    PERSONALIZED_PRACTICE,
    "Digestive System",
    "Nutrition",
    PERSONALIZED_PRACTICE,
    REVIEW,
    "Skin",
    "Immune System",
    PERSONALIZED_PRACTICE,
    "Germs",
    "Vaccines and Antibiotics",
    PERSONALIZED_PRACTICE,
    "Hygiene",
    REVIEW,
    "Exercise and Fitness",
    "Sleep and Growth",
    PERSONALIZED_PRACTICE,
    "Oral Health",
    "Puberty and Reproduction",
    PERSONALIZED_PRACTICE,
    REVIEW,
    "DNA and Heredity",
    "Cancer",
    PERSONALIZED_PRACTICE,
    "Allergies",
    "Asthma",
    PERSONALIZED_PRACTICE,
    "Medical Imaging",
    "Organ Transplants",
    PERSONALIZED_PRACTICE,
    REVIEW,
];

impl Default for Curriculum {
    /// The human-biology roadmap: 45 entries in 6 units, each unit closing on its review
    fn default() -> Self {
        Self {
            entries: DEFAULT_ENTRIES.iter().map(|s| s.to_string()).collect(),
            units: vec![
                Unit::new("Unit 1: Foundations of Human Biology", 0, 3),
                Unit::new("Unit 2: Structure and Control of the Body", 4, 12),
                Unit::new("Unit 3: Transport and Energy in the Body", 13, 19),
                Unit::new("Unit 4: Protection and Immune Health", 20, 27),
                Unit::new("Unit 5: Growth and Everyday Health", 28, 34),
                Unit::new("Unit 6: Genetics and Modern Medicine", 35, 44),
            ],
        }
    }
}

impl Curriculum {
    /// Build and validate a curriculum
    pub fn new(entries: Vec<String>, units: Vec<Unit>) -> Result<Self, DomainError> {
        let curriculum = Self { entries, units };
        curriculum.validate()?;
        Ok(curriculum)
    }

    /// Load a curriculum from a JSON file (`{"entries": [...], "units": [...]}`)
    pub fn from_json_file(path: &Path) -> Result<Self, DomainError> {
        let raw = std::fs::read_to_string(path).map_err(|e| DomainError::Validation {
            message: format!("Cannot read curriculum {}: {}", path.display(), e),
        })?;
        let curriculum: Curriculum =
            serde_json::from_str(&raw).map_err(|e| DomainError::Validation {
                message: format!("Invalid curriculum {}: {}", path.display(), e),
            })?;
        curriculum.validate()?;
        Ok(curriculum)
    }

    /// Units must be ordered, non-overlapping, and within the entry table
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.entries.is_empty() {
            return Err(DomainError::Validation {
                message: "Curriculum must contain at least one entry".to_string(),
            });
        }
        let mut next_start = 0;
        for unit in &self.units {
            if unit.start > unit.end || unit.end >= self.entries.len() {
                return Err(DomainError::Validation {
                    message: format!("Unit '{}' has an invalid range {}..={}", unit.name, unit.start, unit.end),
                });
            }
            if unit.start < next_start {
                return Err(DomainError::Validation {
                    message: format!("Unit '{}' overlaps the previous unit", unit.name),
                });
            }
            next_start = unit.end + 1;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(String::as_str)
    }

    /// Type of the entry at `index`; out-of-range positions read as lessons
    pub fn item_type(&self, index: usize) -> ItemType {
        self.name(index).map(ItemType::from_name).unwrap_or(ItemType::Lesson)
    }

    /// 1-based lesson ordinal of a roadmap position, counting plain lessons only
    pub fn actual_lesson_index(&self, index: usize) -> LessonId {
        let mut lesson_id: LessonId = 1;
        for (i, name) in self.entries.iter().enumerate().take(index + 1) {
            if ItemType::from_name(name) == ItemType::Lesson {
                if i == index {
                    return lesson_id;
                }
                lesson_id += 1;
            }
        }
        lesson_id
    }

    /// Roadmap position of a lesson ordinal
    pub fn position_of_lesson(&self, lesson_id: LessonId) -> Option<usize> {
        (0..self.entries.len())
            .find(|&i| self.item_type(i) == ItemType::Lesson && self.actual_lesson_index(i) == lesson_id)
    }

    /// Number of plain lessons in the table
    pub fn lesson_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|name| ItemType::from_name(name) == ItemType::Lesson)
            .count()
    }

    /// Unit containing `index`; positions outside every unit fall back to unit 0
    pub fn unit_for_index(&self, index: usize) -> usize {
        self.units
            .iter()
            .position(|unit| unit.contains(index))
            .unwrap_or(0)
    }

    pub fn unit(&self, unit_index: usize) -> Option<&Unit> {
        self.units.get(unit_index)
    }

    /// Completed-items key of the review entry at `index`
    pub fn review_item(&self, index: usize) -> CompletedItem {
        CompletedItem::review(self.unit_for_index(index) + 1)
    }

    /// Whether the entry at `index` is in its type's completion source
    pub fn is_entry_completed(
        &self,
        index: usize,
        lessons: &HashSet<LessonId>,
        items: &HashSet<CompletedItem>,
    ) -> bool {
        match self.item_type(index) {
            ItemType::Lesson => lessons.contains(&self.actual_lesson_index(index)),
            ItemType::PersonalizedPractice => items.contains(&CompletedItem::practice(index)),
            ItemType::Review => items.contains(&self.review_item(index)),
        }
    }

    /// Units whose lessons and practice entries are all completed
    ///
    /// Review entries are not required for a unit to count.
    pub fn units_completed(&self, lessons: &HashSet<LessonId>, items: &HashSet<CompletedItem>) -> u32 {
        self.units
            .iter()
            .filter(|unit| {
                unit.indices().all(|j| match self.item_type(j) {
                    ItemType::Review => true,
                    _ => self.is_entry_completed(j, lessons, items),
                })
            })
            .count() as u32
    }
}
