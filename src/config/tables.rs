use super::defaults;
use super::models::{AppConfig, LogLevel};
use serde::Deserialize;

/// On-disk layout of `config.toml`, grouped into sections.
#[derive(Debug, Clone, Deserialize, serde::Serialize, Default)]
pub(super) struct ConfigTables {
    #[serde(default)]
    logging: LoggingConfig,
    #[serde(default)]
    storage: StorageConfig,
    #[serde(default)]
    consent: ConsentConfig,
    #[serde(default)]
    analytics: AnalyticsConfig,
    #[serde(default)]
    scroll: ScrollConfig,
}

impl From<ConfigTables> for AppConfig {
    fn from(tables: ConfigTables) -> Self {
        AppConfig {
            log_level: tables.logging.log_level,
            cache_dir: tables.storage.cache_dir,
            consent_store_name: tables.consent.store_name,
            consent_cookie_name: tables.consent.cookie_name,
            consent_cookie_max_age_days: tables.consent.cookie_max_age_days,
            analytics_measurement_id: tables.analytics.measurement_id,
            hero_threshold_px: tables.scroll.hero_threshold_px,
            scroll_hysteresis_px: tables.scroll.hysteresis_px,
            progress_hysteresis: tables.scroll.progress_hysteresis,
        }
    }
}

impl From<&AppConfig> for ConfigTables {
    fn from(config: &AppConfig) -> Self {
        ConfigTables {
            logging: LoggingConfig {
                log_level: config.log_level,
            },
            storage: StorageConfig {
                cache_dir: config.cache_dir.clone(),
            },
            consent: ConsentConfig {
                store_name: config.consent_store_name.clone(),
                cookie_name: config.consent_cookie_name.clone(),
                cookie_max_age_days: config.consent_cookie_max_age_days,
            },
            analytics: AnalyticsConfig {
                measurement_id: config.analytics_measurement_id.clone(),
            },
            scroll: ScrollConfig {
                hero_threshold_px: config.hero_threshold_px,
                hysteresis_px: config.scroll_hysteresis_px,
                progress_hysteresis: config.progress_hysteresis,
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct LoggingConfig {
    #[serde(default = "defaults::default_log_level")]
    log_level: LogLevel,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            log_level: defaults::default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct StorageConfig {
    #[serde(default = "defaults::default_cache_dir")]
    cache_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            cache_dir: defaults::default_cache_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct ConsentConfig {
    #[serde(default = "defaults::default_consent_store_name")]
    store_name: String,
    #[serde(default = "defaults::default_consent_cookie_name")]
    cookie_name: String,
    #[serde(default = "defaults::default_consent_cookie_max_age_days")]
    cookie_max_age_days: u32,
}

impl Default for ConsentConfig {
    fn default() -> Self {
        ConsentConfig {
            store_name: defaults::default_consent_store_name(),
            cookie_name: defaults::default_consent_cookie_name(),
            cookie_max_age_days: defaults::default_consent_cookie_max_age_days(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize, Default)]
struct AnalyticsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    measurement_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct ScrollConfig {
    #[serde(default = "defaults::default_hero_threshold_px")]
    hero_threshold_px: f64,
    #[serde(default = "defaults::default_scroll_hysteresis_px")]
    hysteresis_px: f64,
    #[serde(default = "defaults::default_progress_hysteresis")]
    progress_hysteresis: f64,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        ScrollConfig {
            hero_threshold_px: defaults::default_hero_threshold_px(),
            hysteresis_px: defaults::default_scroll_hysteresis_px(),
            progress_hysteresis: defaults::default_progress_hysteresis(),
        }
    }
}
