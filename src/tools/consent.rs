/// Tools for consent and analytics settings
///
/// This module implements the consent_get and consent_set MCP tools.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::analytics::{AnalyticsTracker, ConsentPreferences};
use crate::domain::DomainError;
use crate::storage::KeyValueStore;

/// Oldest age accepted during onboarding
const MAX_AGE: u32 = 120;

/// Parameters for reading consent (none)
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct ConsentGetParams {}

/// Parameters for updating consent
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ConsentSetParams {
    /// Allow analytical tracking (ignored for users under 13)
    pub analytical: Option<bool>,
    /// Allow marketing (ignored for users under 13)
    pub marketing: Option<bool>,
    /// Learner age from onboarding (optional)
    pub age: Option<u32>,
}

/// Current consent state
#[derive(Debug, Serialize)]
pub struct ConsentResponse {
    pub preferences: ConsentPreferences,
    pub region: String,
    pub is_minor: bool,
    pub consented_at: Option<String>,
    pub retention_days: usize,
    pub drop_offs: usize,
    pub message: String,
}

fn describe<S: KeyValueStore + ?Sized>(
    analytics: &AnalyticsTracker<'_, S>,
    preferences: ConsentPreferences,
) -> ConsentResponse {
    let consent = analytics.consent();
    let data = analytics.analytics_data();
    let on_off = |allowed: bool| if allowed { "on" } else { "off" };
    let is_minor = consent.is_minor();
    let region = consent.detect_location().as_str().to_string();

    let message = format!(
        "🍪 Consent ({}{}): essential on | analytical {} | marketing {}",
        region,
        if is_minor { ", minor" } else { "" },
        on_off(preferences.analytical),
        on_off(preferences.marketing)
    );

    ConsentResponse {
        preferences,
        region,
        is_minor,
        consented_at: consent.consent_timestamp(),
        retention_days: data.retention_data.len(),
        drop_offs: data.drop_offs.len(),
        message,
    }
}

/// Read consent, recording essential-only defaults on first use
pub fn get_consent<S: KeyValueStore + ?Sized>(
    analytics: &AnalyticsTracker<'_, S>,
    _params: ConsentGetParams,
) -> Result<ConsentResponse, DomainError> {
    let preferences = analytics.consent().initialize_consent();
    Ok(describe(analytics, preferences))
}

/// Update consent; unspecified categories keep their current value
pub fn set_consent<S: KeyValueStore + ?Sized>(
    analytics: &AnalyticsTracker<'_, S>,
    params: ConsentSetParams,
) -> Result<ConsentResponse, DomainError> {
    let consent = analytics.consent();

    if let Some(age) = params.age {
        if age > MAX_AGE {
            return Err(DomainError::Validation {
                message: format!("Age must be at most {}", MAX_AGE),
            });
        }
        consent.set_user_age(age);
    }

    let current = consent.initialize_consent();
    let preferences = consent.set_consent(ConsentPreferences {
        essential: true,
        analytical: params.analytical.unwrap_or(current.analytical),
        marketing: params.marketing.unwrap_or(current.marketing),
    });

    Ok(describe(analytics, preferences))
}
