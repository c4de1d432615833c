/// MCP tools for learning progress
///
/// This module contains all the MCP tools that external clients (like Claude)
/// can call to drive a learner's roadmap, streak and quests.

pub mod complete;
pub mod consent;
pub mod flag;
pub mod preferences;
pub mod quests;
pub mod roadmap;
pub mod session;
pub mod status;
pub mod xp;

// Re-export tool functions for easy access
pub use complete::*;
pub use consent::*;
pub use flag::*;
pub use preferences::*;
pub use quests::*;
pub use roadmap::*;
pub use session::*;
pub use status::*;
pub use xp::*;

use std::collections::HashMap;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

use crate::domain::DomainError;

/// JSON schema of a tool's parameter struct
pub fn input_schema<T: JsonSchema>() -> Value {
    let schema = schemars::schema_for!(T);
    serde_json::to_value(schema).unwrap_or_else(|e| {
        tracing::error!("Failed to encode tool schema: {}", e);
        json!({"type": "object"})
    })
}

/// Decode tool arguments into a parameter struct
pub fn parse_params<T: DeserializeOwned>(args: HashMap<String, Value>) -> Result<T, DomainError> {
    let object: Map<String, Value> = args.into_iter().collect();
    serde_json::from_value(Value::Object(object)).map_err(|e| DomainError::Validation {
        message: format!("Invalid arguments: {}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_params_reports_bad_types() {
        let mut args = HashMap::new();
        args.insert("amount".to_string(), json!("lots"));
        let result: Result<XpParams, _> = parse_params(args);
        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }

    #[test]
    fn test_input_schema_lists_properties() {
        let schema = input_schema::<XpParams>();
        assert_eq!(schema["type"], "object");
        assert!(schema["properties"]["amount"].is_object());
    }
}
