/// Tool for display preferences
///
/// This module implements the preferences_set MCP tool.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;
use crate::storage::{KeyValueStore, ProgressStore};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct PreferencesParams {
    /// Use the light theme
    pub light_mode: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct PreferencesResponse {
    pub light_mode: bool,
    pub message: String,
}

pub fn set_preferences<S: KeyValueStore + ?Sized>(
    store: &ProgressStore<'_, S>,
    params: PreferencesParams,
) -> Result<PreferencesResponse, DomainError> {
    if let Some(light_mode) = params.light_mode {
        store.set_light_mode(light_mode);
    }
    let light_mode = store.light_mode();

    Ok(PreferencesResponse {
        light_mode,
        message: format!("🎨 Theme: {}", if light_mode { "light" } else { "dark" }),
    })
}
