use super::cookie::{Cookie, CookieJar};
use super::record::{ConsentPatch, ConsentRecord};
use super::storage::ConsentStore;
use super::widget::{ConsentWidgetBridge, sync_widget};
use crate::analytics::{AnalyticsBridge, AnalyticsGate};
use crate::clock::{Clock, SystemClock};
use crate::config::AppConfig;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Cookie parameters for the consent mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsentSettings {
    pub cookie_name: String,
    pub cookie_max_age_days: u32,
}

impl Default for ConsentSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl ConsentSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            cookie_name: config.consent_cookie_name.clone(),
            cookie_max_age_days: config.consent_cookie_max_age_days,
        }
    }
}

/// Owner of the consent record for one browser profile.
///
/// Construct once at the application root with [`ConsentGate::hydrate`],
/// attach whatever third-party bridges are loaded, and let it drop (or call
/// [`ConsentGate::flush`]) on shutdown. Persistence is best-effort: failures
/// are logged and the in-memory record stays authoritative.
pub struct ConsentGate {
    record: ConsentRecord,
    settings: ConsentSettings,
    store: Box<dyn ConsentStore>,
    cookies: Box<dyn CookieJar>,
    analytics: AnalyticsGate,
    widget: Option<Arc<dyn ConsentWidgetBridge>>,
    clock: Arc<dyn Clock>,
    dirty: bool,
}

impl ConsentGate {
    /// Rebuild the record from durable storage, letting a parseable legacy
    /// cookie override it.
    pub fn hydrate(
        settings: ConsentSettings,
        store: Box<dyn ConsentStore>,
        cookies: Box<dyn CookieJar>,
    ) -> Self {
        let stored = match store.load() {
            Ok(record) => record.map(ConsentRecord::normalized),
            Err(err) => {
                warn!("Ignoring unreadable consent store: {err:#}");
                None
            }
        };
        let from_cookie = read_cookie_record(cookies.as_ref(), &settings.cookie_name);

        let record = from_cookie
            .clone()
            .filter(ConsentRecord::is_decided)
            .or_else(|| stored.clone())
            .unwrap_or_default();
        let in_sync = stored.as_ref() == Some(&record) && from_cookie.as_ref() == Some(&record);

        let mut gate = Self {
            record,
            settings,
            store,
            cookies,
            analytics: AnalyticsGate::new(None),
            widget: None,
            clock: Arc::new(SystemClock),
            dirty: false,
        };
        info!(
            decided = gate.record.is_decided(),
            analytics = gate.has_analytics_consent(),
            preferences = gate.has_preferences_consent(),
            "Hydrated consent record"
        );
        if gate.record.is_decided() && !in_sync {
            debug!("Re-syncing consent store and cookie after hydration");
            gate.persist();
        }
        gate
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_analytics(mut self, bridge: Arc<dyn AnalyticsBridge>) -> Self {
        self.analytics = AnalyticsGate::new(Some(bridge));
        self
    }

    /// Attach the widget, pushing an already decided record to it.
    pub fn with_widget(mut self, widget: Arc<dyn ConsentWidgetBridge>) -> Self {
        if self.record.is_decided() {
            sync_widget(widget.as_ref(), &self.record);
        }
        self.widget = Some(widget);
        self
    }

    pub fn record(&self) -> &ConsentRecord {
        &self.record
    }

    pub fn has_analytics_consent(&self) -> bool {
        self.record.allows_analytics()
    }

    pub fn has_preferences_consent(&self) -> bool {
        self.record.allows_preferences()
    }

    /// Merge `patch`, stamp the decision, persist it and tell the bridges.
    pub fn update_consent(&mut self, patch: ConsentPatch) {
        self.record.apply(&patch, self.clock.now());
        info!(
            analytics = self.record.analytics,
            preferences = self.record.preferences,
            "Consent updated"
        );
        self.persist();
        self.analytics.push_update(&self.record);
        if let Some(widget) = &self.widget {
            sync_widget(widget.as_ref(), &self.record);
        }
    }

    pub fn accept_all(&mut self) {
        self.update_consent(ConsentPatch::all(true));
    }

    pub fn reject_all(&mut self) {
        self.update_consent(ConsentPatch::all(false));
    }

    /// Forget the decision, delete the cookie and deny every category.
    pub fn reset_consent(&mut self) {
        self.record = ConsentRecord::unset();
        info!("Consent reset");
        self.persist();
        self.analytics.push_deny_all();
        if let Some(widget) = &self.widget {
            sync_widget(widget.as_ref(), &self.record);
        }
    }

    /// Reopen the third-party settings dialog. Returns `false` if none is loaded.
    pub fn open_settings(&self) -> bool {
        match &self.widget {
            Some(widget) => {
                widget.show_settings();
                true
            }
            None => {
                debug!("Consent widget missing; cannot open settings");
                false
            }
        }
    }

    /// Start analytics: deny everything, then upgrade from the record.
    pub fn initialize_analytics(&mut self, measurement_id: Option<&str>) -> bool {
        self.analytics.initialize(&self.record, measurement_id)
    }

    pub fn analytics_initialized(&self) -> bool {
        self.analytics.is_initialized()
    }

    pub fn track_page_view(&self, path: &str, title: Option<&str>) -> bool {
        self.analytics.page_view(&self.record, path, title)
    }

    pub fn track_event(&self, name: &str, params: Value) -> bool {
        self.analytics.event(&self.record, name, params)
    }

    /// True when the last write to storage or the cookie failed.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Retry persistence after an earlier failure.
    pub fn flush(&mut self) {
        if self.dirty {
            debug!("Flushing consent record");
            self.persist();
        }
    }

    pub fn settings(&self) -> &ConsentSettings {
        &self.settings
    }

    fn persist(&mut self) {
        let mut ok = true;
        if let Err(err) = self.store.save(&self.record) {
            warn!("Failed to persist consent record: {err:#}");
            ok = false;
        }
        if let Err(err) = self.write_cookie() {
            warn!(
                cookie = %self.settings.cookie_name,
                "Failed to mirror consent cookie: {err:#}"
            );
            ok = false;
        }
        self.dirty = !ok;
    }

    fn write_cookie(&mut self) -> anyhow::Result<()> {
        if !self.record.is_decided() {
            return self.cookies.remove(&self.settings.cookie_name);
        }
        let value = serde_json::to_string(&self.record)?;
        let cookie = Cookie::persistent(
            self.settings.cookie_name.as_str(),
            value,
            self.settings.cookie_max_age_days,
        );
        self.cookies.set(&cookie)
    }
}

impl Drop for ConsentGate {
    fn drop(&mut self) {
        self.flush();
    }
}

fn read_cookie_record(cookies: &dyn CookieJar, name: &str) -> Option<ConsentRecord> {
    let raw = match cookies.get(name) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(err) => {
            warn!(cookie = name, "Ignoring unreadable consent cookie: {err:#}");
            return None;
        }
    };
    match serde_json::from_str::<ConsentRecord>(&raw) {
        Ok(record) => Some(record.normalized()),
        Err(err) => {
            warn!(cookie = name, "Ignoring malformed consent cookie: {err}");
            None
        }
    }
}
