use serde::Deserialize;
use std::path::PathBuf;

/// High-level runtime configuration; deserializable from TOML.
#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub struct AppConfig {
    #[serde(default = "crate::config::defaults::default_log_level")]
    pub log_level: LogLevel,
    #[serde(default = "crate::config::defaults::default_cache_dir")]
    pub cache_dir: String,
    #[serde(default = "crate::config::defaults::default_consent_store_name")]
    pub consent_store_name: String,
    #[serde(default = "crate::config::defaults::default_consent_cookie_name")]
    pub consent_cookie_name: String,
    #[serde(default = "crate::config::defaults::default_consent_cookie_max_age_days")]
    pub consent_cookie_max_age_days: u32,
    #[serde(default)]
    pub analytics_measurement_id: Option<String>,
    #[serde(default = "crate::config::defaults::default_hero_threshold_px")]
    pub hero_threshold_px: f64,
    #[serde(default = "crate::config::defaults::default_scroll_hysteresis_px")]
    pub scroll_hysteresis_px: f64,
    #[serde(default = "crate::config::defaults::default_progress_hysteresis")]
    pub progress_hysteresis: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        use crate::config::defaults::*;
        AppConfig {
            log_level: default_log_level(),
            cache_dir: default_cache_dir(),
            consent_store_name: default_consent_store_name(),
            consent_cookie_name: default_consent_cookie_name(),
            consent_cookie_max_age_days: default_consent_cookie_max_age_days(),
            analytics_measurement_id: None,
            hero_threshold_px: default_hero_threshold_px(),
            scroll_hysteresis_px: default_scroll_hysteresis_px(),
            progress_hysteresis: default_progress_hysteresis(),
        }
    }
}

impl AppConfig {
    /// File holding the durable `{ "consent": ... }` blob.
    pub fn consent_store_path(&self) -> PathBuf {
        PathBuf::from(&self.cache_dir).join(format!("{}.json", self.consent_store_name))
    }

    /// File backing the cookie jar used outside a browser.
    pub fn cookie_jar_path(&self) -> PathBuf {
        PathBuf::from(&self.cache_dir).join("cookies.json")
    }
}

/// Supported logging verbosity levels.
#[derive(Debug, Clone, Copy, Deserialize, serde::Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_filter_str())
    }
}

impl LogLevel {
    pub fn as_filter_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
