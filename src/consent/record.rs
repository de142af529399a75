use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The user's stored choices about optional data collection.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConsentRecord {
    #[serde(default)]
    pub accepted: bool,
    #[serde(default)]
    pub analytics: bool,
    #[serde(default)]
    pub preferences: bool,
    /// Time of the last decision; `None` until the user makes one.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl ConsentRecord {
    /// Record with no decision.
    pub fn unset() -> Self {
        Self::default()
    }

    pub fn is_decided(&self) -> bool {
        self.timestamp.is_some()
    }

    pub fn allows_analytics(&self) -> bool {
        self.accepted && self.analytics
    }

    pub fn allows_preferences(&self) -> bool {
        self.accepted && self.preferences
    }

    pub fn allows(&self, category: ConsentCategory) -> bool {
        match category {
            ConsentCategory::Analytics => self.allows_analytics(),
            ConsentCategory::Preferences => self.allows_preferences(),
        }
    }

    /// Merge `patch` into the record and stamp it as a decision made at `now`.
    pub fn apply(&mut self, patch: &ConsentPatch, now: DateTime<Utc>) {
        self.accepted = patch.accepted.unwrap_or(true);
        if let Some(analytics) = patch.analytics {
            self.analytics = analytics;
        }
        if let Some(preferences) = patch.preferences {
            self.preferences = preferences;
        }
        self.timestamp = Some(now);
    }

    /// A record without a timestamp carries no decision, whatever its flags
    /// say; collapse it to the unset record.
    pub fn normalized(self) -> Self {
        if self.timestamp.is_none() {
            Self::unset()
        } else {
            self
        }
    }
}

/// Partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConsentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analytics: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<bool>,
}

impl ConsentPatch {
    pub fn analytics(value: bool) -> Self {
        Self {
            analytics: Some(value),
            ..Self::default()
        }
    }

    pub fn preferences(value: bool) -> Self {
        Self {
            preferences: Some(value),
            ..Self::default()
        }
    }

    pub fn all(value: bool) -> Self {
        Self {
            accepted: Some(true),
            analytics: Some(value),
            preferences: Some(value),
        }
    }

    /// Apply a `key=value` assignment such as `analytics=true`.
    pub fn set(&mut self, key: &str, value: bool) -> anyhow::Result<()> {
        match key.trim().to_ascii_lowercase().as_str() {
            "accepted" => self.accepted = Some(value),
            "analytics" => self.analytics = Some(value),
            "preferences" => self.preferences = Some(value),
            other => anyhow::bail!("Unknown consent field: {other}"),
        }
        Ok(())
    }
}

/// Optional categories the user can grant independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsentCategory {
    Analytics,
    Preferences,
}

impl ConsentCategory {
    pub const ALL: [ConsentCategory; 2] = [ConsentCategory::Analytics, ConsentCategory::Preferences];

    pub fn as_str(self) -> &'static str {
        match self {
            ConsentCategory::Analytics => "analytics",
            ConsentCategory::Preferences => "preferences",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(year: i32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).single().expect("valid time")
    }

    #[test]
    fn patch_merges_instead_of_replacing() {
        let mut record = ConsentRecord::unset();
        record.apply(&ConsentPatch::analytics(true), at(2024));
        record.apply(&ConsentPatch::preferences(true), at(2025));

        assert!(record.analytics);
        assert!(record.preferences);
        assert_eq!(record.timestamp, Some(at(2025)));
    }

    #[test]
    fn applying_a_patch_marks_the_record_decided() {
        let mut record = ConsentRecord::unset();
        assert!(!record.is_decided());
        record.apply(&ConsentPatch::analytics(true), at(2024));
        assert!(record.accepted);
        assert!(record.allows(ConsentCategory::Analytics));
        assert!(!record.allows(ConsentCategory::Preferences));
    }

    #[test]
    fn flags_without_acceptance_grant_nothing() {
        let record = ConsentRecord {
            accepted: false,
            analytics: true,
            preferences: true,
            timestamp: Some(at(2024)),
        };
        assert!(!record.allows_analytics());
        assert!(!record.allows_preferences());
    }

    #[test]
    fn undated_record_normalizes_to_unset() {
        let record = ConsentRecord {
            accepted: true,
            analytics: true,
            preferences: false,
            timestamp: None,
        };
        assert_eq!(record.normalized(), ConsentRecord::unset());
    }

    #[test]
    fn timestamp_uses_iso_8601_on_the_wire() {
        let json = r#"{"accepted":true,"analytics":true,"preferences":false,"timestamp":"2024-01-01T00:00:00Z"}"#;
        let record: ConsentRecord = serde_json::from_str(json).expect("record parses");
        assert_eq!(record.timestamp, Some(at(2024)));

        let unset = serde_json::to_value(ConsentRecord::unset()).expect("serialize");
        assert!(unset["timestamp"].is_null());
    }

    #[test]
    fn patch_assignments_reject_unknown_fields() {
        let mut patch = ConsentPatch::default();
        patch.set("Analytics", true).expect("known field");
        assert_eq!(patch.analytics, Some(true));
        assert!(patch.set("marketing", true).is_err());
    }
}
