//! Consent-gated analytics.
//!
//! The tagging script is reached through [`AnalyticsBridge`], the
//! `(command, target, params)` function it exposes. Every tracking category
//! is denied by a `consent default` call before anything else is sent; only
//! then are categories the user allowed upgraded with `consent update`.

use crate::consent::ConsentRecord;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, info, trace};

pub const COMMAND_CONSENT: &str = "consent";
pub const COMMAND_CONFIG: &str = "config";
pub const COMMAND_EVENT: &str = "event";
pub const TARGET_DEFAULT: &str = "default";
pub const TARGET_UPDATE: &str = "update";

/// Milliseconds the tag waits for an update after the default call.
const WAIT_FOR_UPDATE_MS: u64 = 500;

/// Global tagging function of the analytics script.
pub trait AnalyticsBridge: Send + Sync {
    fn send(&self, command: &str, target: &str, params: &Value);
}

fn grant(allowed: bool) -> &'static str {
    if allowed { "granted" } else { "denied" }
}

/// Consent-mode payload for `record`; `None` denies everything.
pub fn consent_mode_params(record: Option<&ConsentRecord>) -> Value {
    let analytics = record.is_some_and(ConsentRecord::allows_analytics);
    let preferences = record.is_some_and(ConsentRecord::allows_preferences);
    json!({
        "ad_storage": "denied",
        "analytics_storage": grant(analytics),
        "functionality_storage": grant(preferences),
        "personalization_storage": grant(preferences),
    })
}

fn default_params() -> Value {
    let mut params = consent_mode_params(None);
    params["wait_for_update"] = json!(WAIT_FOR_UPDATE_MS);
    params
}

/// Tracks what the analytics script has been told so far.
pub struct AnalyticsGate {
    bridge: Option<Arc<dyn AnalyticsBridge>>,
    defaults_sent: bool,
    measurement_id: Option<String>,
    configured: bool,
}

impl AnalyticsGate {
    pub fn new(bridge: Option<Arc<dyn AnalyticsBridge>>) -> Self {
        Self {
            bridge,
            defaults_sent: false,
            measurement_id: None,
            configured: false,
        }
    }

    /// True once the deny-all default went out.
    pub fn is_initialized(&self) -> bool {
        self.defaults_sent
    }

    /// Deny by default, then upgrade from `record`, then configure the tag if
    /// analytics is allowed. Returns `false` when no bridge is present.
    pub fn initialize(&mut self, record: &ConsentRecord, measurement_id: Option<&str>) -> bool {
        let Some(bridge) = self.bridge.clone() else {
            debug!("Analytics bridge missing; skipping initialization");
            return false;
        };
        self.measurement_id = measurement_id.map(str::to_string);
        if !self.defaults_sent {
            bridge.send(COMMAND_CONSENT, TARGET_DEFAULT, &default_params());
            self.defaults_sent = true;
            info!("Analytics consent defaulted to denied");
        }
        if record.is_decided() {
            bridge.send(COMMAND_CONSENT, TARGET_UPDATE, &consent_mode_params(Some(record)));
        }
        self.configure_if_allowed(bridge.as_ref(), record);
        true
    }

    /// Forward a consent change; ignored until initialized.
    pub fn push_update(&mut self, record: &ConsentRecord) {
        let Some(bridge) = self.initialized_bridge() else {
            trace!("Analytics not initialized; consent update kept local");
            return;
        };
        bridge.send(COMMAND_CONSENT, TARGET_UPDATE, &consent_mode_params(Some(record)));
        self.configure_if_allowed(bridge.as_ref(), record);
    }

    /// Revoke every category; ignored until initialized.
    pub fn push_deny_all(&mut self) {
        let Some(bridge) = self.initialized_bridge() else {
            return;
        };
        bridge.send(COMMAND_CONSENT, TARGET_UPDATE, &consent_mode_params(None));
    }

    pub fn page_view(&self, record: &ConsentRecord, path: &str, title: Option<&str>) -> bool {
        let mut params = json!({ "page_path": path });
        if let Some(title) = title {
            params["page_title"] = json!(title);
        }
        self.event(record, "page_view", params)
    }

    /// Emit an `event` call when analytics is allowed. Returns whether it was sent.
    pub fn event(&self, record: &ConsentRecord, name: &str, params: Value) -> bool {
        if !record.allows_analytics() {
            debug!(event = name, "Dropping analytics event without consent");
            return false;
        }
        let Some(bridge) = self.initialized_bridge() else {
            debug!(event = name, "Dropping analytics event before initialization");
            return false;
        };
        bridge.send(COMMAND_EVENT, name, &params);
        true
    }

    fn initialized_bridge(&self) -> Option<Arc<dyn AnalyticsBridge>> {
        if !self.defaults_sent {
            return None;
        }
        self.bridge.clone()
    }

    fn configure_if_allowed(&mut self, bridge: &dyn AnalyticsBridge, record: &ConsentRecord) {
        if self.configured || !record.allows_analytics() {
            return;
        }
        let Some(id) = self.measurement_id.as_deref() else {
            return;
        };
        bridge.send(COMMAND_CONFIG, id, &json!({ "send_page_view": false }));
        self.configured = true;
        info!(measurement_id = id, "Analytics configured");
    }
}

/// Bridge that reports every call through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAnalyticsBridge;

impl AnalyticsBridge for TracingAnalyticsBridge {
    fn send(&self, command: &str, target: &str, params: &Value) {
        info!(command, target, params = %params, "analytics call");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingAnalytics;
    use chrono::Utc;

    fn record(analytics: bool, preferences: bool) -> ConsentRecord {
        ConsentRecord {
            accepted: true,
            analytics,
            preferences,
            timestamp: Some(Utc::now()),
        }
    }

    #[test]
    fn initialize_denies_before_upgrading() {
        let recorder = Arc::new(RecordingAnalytics::default());
        let mut gate = AnalyticsGate::new(Some(recorder.clone()));

        assert!(gate.initialize(&record(true, false), Some("G-1")));

        let calls = recorder.calls();
        assert_eq!(calls[0].target, TARGET_DEFAULT);
        assert_eq!(calls[0].params["analytics_storage"], "denied");
        assert_eq!(calls[0].params["wait_for_update"], 500);
        assert_eq!(calls[1].target, TARGET_UPDATE);
        assert_eq!(calls[1].params["analytics_storage"], "granted");
        assert_eq!(calls[1].params["functionality_storage"], "denied");
        assert_eq!(calls[2].command, COMMAND_CONFIG);
        assert_eq!(calls[2].target, "G-1");
    }

    #[test]
    fn undecided_record_only_sends_default() {
        let recorder = Arc::new(RecordingAnalytics::default());
        let mut gate = AnalyticsGate::new(Some(recorder.clone()));
        gate.initialize(&ConsentRecord::unset(), Some("G-1"));

        let calls = recorder.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].target, TARGET_DEFAULT);
    }

    #[test]
    fn updates_before_initialization_are_not_sent() {
        let recorder = Arc::new(RecordingAnalytics::default());
        let mut gate = AnalyticsGate::new(Some(recorder.clone()));
        gate.push_update(&record(true, true));
        gate.push_deny_all();
        assert!(recorder.calls().is_empty());
    }

    #[test]
    fn events_require_consent_and_initialization() {
        let recorder = Arc::new(RecordingAnalytics::default());
        let mut gate = AnalyticsGate::new(Some(recorder.clone()));
        let allowed = record(true, false);

        assert!(!gate.page_view(&allowed, "/", None));
        gate.initialize(&ConsentRecord::unset(), None);
        assert!(!gate.page_view(&ConsentRecord::unset(), "/", None));
        assert!(gate.page_view(&allowed, "/projects", Some("Projects")));

        let last = recorder.calls().pop().expect("event recorded");
        assert_eq!(last.command, COMMAND_EVENT);
        assert_eq!(last.target, "page_view");
        assert_eq!(last.params["page_title"], "Projects");
    }

    #[test]
    fn config_is_sent_once_when_analytics_becomes_allowed() {
        let recorder = Arc::new(RecordingAnalytics::default());
        let mut gate = AnalyticsGate::new(Some(recorder.clone()));
        gate.initialize(&ConsentRecord::unset(), Some("G-9"));
        gate.push_update(&record(true, false));
        gate.push_update(&record(true, true));

        let configs = recorder
            .calls()
            .into_iter()
            .filter(|call| call.command == COMMAND_CONFIG)
            .count();
        assert_eq!(configs, 1);
    }

    #[test]
    fn missing_bridge_is_a_no_op() {
        let mut gate = AnalyticsGate::new(None);
        assert!(!gate.initialize(&record(true, true), Some("G-1")));
        assert!(!gate.is_initialized());
        assert!(!gate.event(&record(true, true), "click", json!({})));
    }
}
