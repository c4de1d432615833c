/// Tools for switching identity
///
/// This module implements the session_switch and session_logout MCP tools.
/// Switching never merges data: guest and user namespaces stay separate.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::analytics::consent::USER_AGE_KEY;
use crate::domain::{DomainError, Session};
use crate::storage::{KeyValueStore, ProgressStore};

/// Device-wide key holding the signed-in user record
pub const USER_RECORD_KEY: &str = "user";

const MAX_USER_ID_LEN: usize = 128;

/// Parameters for switching identity
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SessionSwitchParams {
    /// Authenticated user id; omit to continue as guest
    pub user_id: Option<String>,
}

/// Parameters for signing out (none)
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct LogoutParams {}

/// Response after an identity change
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session: String,
    pub namespace: String,
    pub removed_keys: usize,
    pub message: String,
}

/// User ids become part of every key, so they are restricted to letters, digits and '-'
///
/// Underscores are refused: `user_a_` would otherwise be a prefix of `user_a_b_`.
fn validate_user_id(id: &str) -> Result<(), DomainError> {
    if id.len() > MAX_USER_ID_LEN
        || !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return Err(DomainError::Validation {
            message: format!("Invalid user id '{}'", id),
        });
    }
    Ok(())
}

/// Resolve the session to switch to
pub fn switch_session(params: SessionSwitchParams) -> Result<(Session, SessionResponse), DomainError> {
    let session = Session::from_user_id(params.user_id.as_deref());
    if let Session::User(id) = &session {
        validate_user_id(id)?;
    }

    tracing::info!("Switched to {}", session);
    let response = SessionResponse {
        session: session.to_string(),
        namespace: session.namespace(),
        removed_keys: 0,
        message: format!("👤 Now tracking progress for {}", session),
    };
    Ok((session, response))
}

/// Sign out: wipe the user's namespace and sign-in records, then continue as guest
///
/// Guest data is kept; signing out of the guest session changes nothing.
pub fn logout<S: KeyValueStore + ?Sized>(kv: &S, store: &ProgressStore<'_, S>) -> (Session, SessionResponse) {
    let removed_keys = if store.session().is_guest() {
        0
    } else {
        let removed = store.clear_namespace();
        for key in [USER_RECORD_KEY, USER_AGE_KEY] {
            if let Err(e) = kv.remove(key) {
                tracing::error!("Failed to remove {}: {}", key, e);
            }
        }
        removed
    };

    let session = Session::Guest;
    let response = SessionResponse {
        session: session.to_string(),
        namespace: session.namespace(),
        removed_keys,
        message: format!("👋 Signed out. Removed {} stored values.", removed_keys),
    };
    (session, response)
}
