/// Cookie and analytics consent
///
/// Consent is global to the device, not to an identity, so these keys are
/// never namespaced. Minors (under 13) can never enable anything beyond the
/// essential category.

use chrono::Utc;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::storage::KeyValueStore;

pub const CONSENT_KEY: &str = "curare_cookie_consent";
pub const CONSENT_TIMESTAMP_KEY: &str = "curare_cookie_consent_timestamp";
pub const USER_AGE_KEY: &str = "curare_user_age";
pub const USER_LOCATION_KEY: &str = "curare_user_location";

/// Users younger than this are minors
pub const MINOR_AGE_THRESHOLD: u32 = 13;

/// Keys owned by the analytical category
pub const ANALYTICAL_KEYS: [&str; 7] = [
    "analytics_session_id",
    "analytics_user_id",
    "analytics_flagged_questions",
    "analytics_drop_offs",
    "analytics_session_data",
    "analytics_retention_data",
    "analytics_active_sessions",
];

/// Keys owned by the marketing category
pub const MARKETING_KEYS: [&str; 2] = ["marketing_campaign_id", "marketing_source"];

/// Timezones outside `Europe/` that still count as EU
const EU_ATLANTIC_ZONES: [&str; 3] = ["Atlantic/Azores", "Atlantic/Canary", "Atlantic/Madeira"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum CookieCategory {
    Essential,
    Analytical,
    Marketing,
}

/// Stored consent flags; essential is always true
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ConsentPreferences {
    pub essential: bool,
    pub analytical: bool,
    pub marketing: bool,
}

impl ConsentPreferences {
    pub fn essential_only() -> Self {
        Self {
            essential: true,
            analytical: false,
            marketing: false,
        }
    }
}

/// Coarse region used for consent defaults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Region {
    #[serde(rename = "EU/UK")]
    EuUk,
    #[serde(rename = "OTHER")]
    Other,
}

impl Region {
    pub fn as_str(self) -> &'static str {
        match self {
            Region::EuUk => "EU/UK",
            Region::Other => "OTHER",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "EU/UK" => Some(Region::EuUk),
            "OTHER" => Some(Region::Other),
            _ => None,
        }
    }

    /// Classify an IANA timezone name
    pub fn from_timezone(timezone: &str) -> Self {
        if timezone.starts_with("Europe/") || EU_ATLANTIC_ZONES.contains(&timezone) {
            Region::EuUk
        } else {
            Region::Other
        }
    }
}

/// Consent manager over the device-wide keys
pub struct ConsentManager<'a, S: KeyValueStore + ?Sized> {
    kv: &'a S,
    timezone: Option<String>,
}

impl<'a, S: KeyValueStore + ?Sized> ConsentManager<'a, S> {
    pub fn new(kv: &'a S, timezone: Option<String>) -> Self {
        Self { kv, timezone }
    }

    fn read(&self, key: &str) -> Option<String> {
        self.kv.get(key).unwrap_or_else(|e| {
            tracing::error!("Failed to read {}: {}", key, e);
            None
        })
    }

    fn write(&self, key: &str, value: &str) {
        if let Err(e) = self.kv.set(key, value) {
            tracing::error!("Failed to save {}: {}", key, e);
        }
    }

    fn remove(&self, key: &str) {
        if let Err(e) = self.kv.remove(key) {
            tracing::error!("Failed to remove {}: {}", key, e);
        }
    }

    pub fn user_age(&self) -> Option<u32> {
        self.read(USER_AGE_KEY)
            .and_then(|raw| raw.trim().parse::<u32>().ok())
    }

    pub fn set_user_age(&self, age: u32) {
        self.write(USER_AGE_KEY, &age.to_string());
    }

    pub fn is_minor(&self) -> bool {
        matches!(self.user_age(), Some(age) if age < MINOR_AGE_THRESHOLD)
    }

    /// Cached region, detected from the configured timezone on first use
    pub fn detect_location(&self) -> Region {
        if let Some(region) = self.read(USER_LOCATION_KEY).as_deref().and_then(Region::parse) {
            return region;
        }
        let region = self
            .timezone
            .as_deref()
            .map(Region::from_timezone)
            .unwrap_or(Region::Other);
        self.write(USER_LOCATION_KEY, region.as_str());
        tracing::debug!("Detected consent region {}", region.as_str());
        region
    }

    /// Stored preferences, if consent was ever recorded
    pub fn consent(&self) -> Option<ConsentPreferences> {
        let raw = self.read(CONSENT_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(preferences) => Some(preferences),
            Err(e) => {
                tracing::warn!("Unreadable consent record: {}", e);
                None
            }
        }
    }

    pub fn consent_timestamp(&self) -> Option<String> {
        self.read(CONSENT_TIMESTAMP_KEY)
    }

    /// Record consent; returns what was actually stored
    pub fn set_consent(&self, requested: ConsentPreferences) -> ConsentPreferences {
        let minor = self.is_minor();
        if minor && (requested.analytical || requested.marketing) {
            tracing::info!("Ignoring optional consent for a minor");
        }
        let preferences = ConsentPreferences {
            essential: true,
            analytical: requested.analytical && !minor,
            marketing: requested.marketing && !minor,
        };

        match serde_json::to_string(&preferences) {
            Ok(raw) => self.write(CONSENT_KEY, &raw),
            Err(e) => tracing::error!("Failed to encode consent: {}", e),
        }
        self.write(CONSENT_TIMESTAMP_KEY, &Utc::now().to_rfc3339());

        self.apply_settings(&preferences);
        preferences
    }

    /// Existing consent is re-applied; otherwise essential-only defaults are stored
    ///
    /// Every age and region currently defaults to essential only.
    pub fn initialize_consent(&self) -> ConsentPreferences {
        if let Some(existing) = self.consent() {
            self.apply_settings(&existing);
            return existing;
        }

        // Resolve and cache the region alongside the first consent record
        let region = self.detect_location();
        tracing::info!(
            "Initializing consent (region {}, minor: {})",
            region.as_str(),
            self.is_minor()
        );
        self.set_consent(ConsentPreferences::essential_only())
    }

    /// Drop stored data of every category that is switched off
    pub fn apply_settings(&self, preferences: &ConsentPreferences) {
        if !preferences.analytical {
            ANALYTICAL_KEYS.iter().for_each(|key| self.remove(key));
        }
        if !preferences.marketing {
            MARKETING_KEYS.iter().for_each(|key| self.remove(key));
        }
    }

    /// No consent allows nothing; with consent, essential is always allowed
    pub fn is_category_allowed(&self, category: CookieCategory) -> bool {
        let consent = match self.consent() {
            Some(consent) => consent,
            None => return false,
        };
        match category {
            CookieCategory::Essential => true,
            CookieCategory::Analytical => consent.analytical,
            CookieCategory::Marketing => consent.marketing,
        }
    }
}
