/// Tool for the lesson roadmap
///
/// This module implements the roadmap MCP tool.

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, EntryStatus, ItemType, RoadmapEntry};
use crate::engine::ProgressEngine;
use crate::storage::{KeyValueStore, ProgressStore};

/// Parameters for viewing the roadmap
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct RoadmapParams {
    /// Only show one unit (1-based, optional)
    pub unit: Option<usize>,
}

/// Response with roadmap entries
#[derive(Debug, Serialize)]
pub struct RoadmapResponse {
    pub entries: Vec<RoadmapEntry>,
    pub next_available: Option<usize>,
    pub message: String,
}

/// Every entry with its status, optionally limited to one unit
pub fn get_roadmap<S: KeyValueStore + ?Sized>(
    store: &ProgressStore<'_, S>,
    engine: &ProgressEngine,
    params: RoadmapParams,
    today: NaiveDate,
) -> Result<RoadmapResponse, DomainError> {
    let curriculum = engine.curriculum();
    if let Some(unit) = params.unit {
        if unit == 0 || unit > curriculum.units.len() {
            return Err(DomainError::UnknownUnit(unit));
        }
    }

    let mut entries = engine.roadmap(store, today);
    let next_available = entries
        .iter()
        .find(|e| e.status == EntryStatus::Available)
        .map(|e| e.index);

    if let Some(unit) = params.unit {
        entries.retain(|e| e.unit == unit - 1);
    }

    let mut message = String::new();
    let mut current_unit = None;
    for entry in &entries {
        if current_unit != Some(entry.unit) {
            current_unit = Some(entry.unit);
            if let Some(unit) = curriculum.unit(entry.unit) {
                if !message.is_empty() {
                    message.push('\n');
                }
                message.push_str(&format!("📘 {}\n", unit.name));
            }
        }
        let icon = match entry.status {
            EntryStatus::Completed => "✅",
            EntryStatus::Available => "▶️",
            EntryStatus::Locked => "🔒",
        };
        let label = match (entry.item_type, entry.lesson_id) {
            (ItemType::Lesson, Some(id)) => format!("{}. {}", id, entry.name),
            _ => entry.name.clone(),
        };
        let skip = if entry.skip_shortcut { " ⏩ skip quiz available" } else { "" };
        message.push_str(&format!("  {} {}{}\n", icon, label, skip));
    }

    Ok(RoadmapResponse {
        entries,
        next_available,
        message,
    })
}
