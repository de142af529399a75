//! Test doubles for the external capabilities.

use crate::analytics::AnalyticsBridge;
use crate::consent::{
    ConsentCategory, ConsentRecord, ConsentStore, ConsentWidgetBridge, Cookie, CookieJar,
};
use anyhow::{Result, bail};
use serde_json::Value;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsCall {
    pub command: String,
    pub target: String,
    pub params: Value,
}

#[derive(Debug, Default)]
pub struct RecordingAnalytics {
    calls: Mutex<Vec<AnalyticsCall>>,
}

impl RecordingAnalytics {
    pub fn calls(&self) -> Vec<AnalyticsCall> {
        self.calls.lock().expect("analytics calls").clone()
    }
}

impl AnalyticsBridge for RecordingAnalytics {
    fn send(&self, command: &str, target: &str, params: &Value) {
        self.calls.lock().expect("analytics calls").push(AnalyticsCall {
            command: command.to_string(),
            target: target.to_string(),
            params: params.clone(),
        });
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetCall {
    Accept(ConsentCategory),
    Reject(ConsentCategory),
    ShowSettings,
}

#[derive(Debug, Default)]
pub struct RecordingWidget {
    calls: Mutex<Vec<WidgetCall>>,
}

impl RecordingWidget {
    pub fn calls(&self) -> Vec<WidgetCall> {
        self.calls.lock().expect("widget calls").clone()
    }
}

impl ConsentWidgetBridge for RecordingWidget {
    fn accept_category(&self, category: ConsentCategory) {
        self.calls.lock().expect("widget calls").push(WidgetCall::Accept(category));
    }

    fn reject_category(&self, category: ConsentCategory) {
        self.calls.lock().expect("widget calls").push(WidgetCall::Reject(category));
    }

    fn show_settings(&self) {
        self.calls.lock().expect("widget calls").push(WidgetCall::ShowSettings);
    }
}

/// Store whose writes always fail, as with disabled storage.
#[derive(Debug, Default)]
pub struct FailingStore;

impl ConsentStore for FailingStore {
    fn load(&self) -> Result<Option<ConsentRecord>> {
        bail!("storage disabled")
    }

    fn save(&mut self, _record: &ConsentRecord) -> Result<()> {
        bail!("quota exceeded")
    }
}

/// Jar whose writes always fail.
#[derive(Debug, Default)]
pub struct FailingJar;

impl CookieJar for FailingJar {
    fn get(&self, _name: &str) -> Result<Option<String>> {
        Ok(None)
    }

    fn set(&mut self, _cookie: &Cookie) -> Result<()> {
        bail!("cookies blocked")
    }

    fn remove(&mut self, _name: &str) -> Result<()> {
        bail!("cookies blocked")
    }
}
