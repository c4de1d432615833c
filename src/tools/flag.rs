/// Tool for reporting a problem with a lesson question
///
/// This module implements the question_flag MCP tool. Reports are kept only
/// when analytical consent is granted.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::analytics::AnalyticsTracker;
use crate::domain::{DomainError, LessonId};
use crate::storage::KeyValueStore;

const MAX_REASON_LEN: usize = 500;

/// Parameters for flagging a question
#[derive(Debug, Deserialize, JsonSchema)]
pub struct QuestionFlagParams {
    /// Lesson the question belongs to
    pub lesson_id: LessonId,
    /// 0-based position of the question within the lesson
    pub question_index: u32,
    /// What is wrong with the question
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct QuestionFlagResponse {
    pub recorded: bool,
    pub message: String,
}

pub fn flag_question<S: KeyValueStore + ?Sized>(
    analytics: &AnalyticsTracker<'_, S>,
    params: QuestionFlagParams,
) -> Result<QuestionFlagResponse, DomainError> {
    let reason = params.reason.trim();
    if reason.is_empty() || reason.chars().count() > MAX_REASON_LEN {
        return Err(DomainError::Validation {
            message: format!("Reason must be 1 to {} characters", MAX_REASON_LEN),
        });
    }

    let recorded = analytics.track_flagged_question(params.lesson_id, params.question_index, reason);
    let message = if recorded {
        format!(
            "🚩 Flagged question {} of lesson {}. Thanks for the report!",
            params.question_index + 1,
            params.lesson_id
        )
    } else {
        "Thanks! Reports are only kept when analytics is allowed.".to_string()
    };

    Ok(QuestionFlagResponse { recorded, message })
}
