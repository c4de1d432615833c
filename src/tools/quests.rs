/// Tool for today's daily quests
///
/// This module implements the quests_today MCP tool.

use chrono::NaiveDate;
use rand::Rng;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, Quest};
use crate::engine::ProgressEngine;
use crate::storage::{KeyValueStore, ProgressStore};

/// Parameters for listing quests
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct QuestsParams {
    /// Also return quests already completed today (optional, defaults to false)
    pub include_completed: Option<bool>,
}

/// Response listing quests
#[derive(Debug, Serialize)]
pub struct QuestsResponse {
    pub quests: Vec<Quest>,
    pub completed_today: usize,
    pub message: String,
}

/// Today's quests, drawing them if this is the first request of the day
pub fn get_daily_quests<S, R>(
    store: &ProgressStore<'_, S>,
    engine: &ProgressEngine,
    rng: &mut R,
    params: QuestsParams,
    today: NaiveDate,
    now_millis: i64,
) -> Result<QuestsResponse, DomainError>
where
    S: KeyValueStore + ?Sized,
    R: Rng + ?Sized,
{
    let board = engine.daily_quests(store, rng, today, now_millis);
    let completed_today = board.all.len() - board.active.len();

    let quests = if params.include_completed.unwrap_or(false) {
        board.all
    } else {
        board.active
    };

    let message = if quests.is_empty() {
        "🏆 All daily quests complete! New quests arrive tomorrow.".to_string()
    } else {
        let lines = quests
            .iter()
            .map(|q| {
                format!(
                    "{} {} ({}/{})",
                    if q.completed { "✅" } else { "🎯" },
                    q.label,
                    q.progress.min(q.target),
                    q.target
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        format!("📜 Daily quests\n{}", lines)
    };

    Ok(QuestsResponse {
        quests,
        completed_today,
        message,
    })
}
