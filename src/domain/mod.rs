/// Domain module containing the progress model
///
/// This module defines the curriculum table, the progress snapshot, and the pure
/// components computed from them: streaks, daily quests and lesson unlocking.

pub mod curriculum;
pub mod events;
pub mod quest;
pub mod snapshot;
pub mod streak;
pub mod types;
pub mod unlock;

// Re-export public types for easy access
pub use curriculum::*;
pub use events::*;
pub use quest::*;
pub use snapshot::*;
pub use streak::*;
pub use types::*;
pub use unlock::*;

use thiserror::Error;

/// Errors that can occur during domain operations
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Invalid lesson id: {0}")]
    InvalidLessonId(String),

    #[error("Invalid item: {0}")]
    InvalidItem(String),

    #[error("Unknown unit: {0}")]
    UnknownUnit(usize),
}
