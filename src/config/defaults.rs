pub(crate) fn default_log_level() -> crate::config::LogLevel {
    crate::config::LogLevel::Info
}

pub(crate) fn default_cache_dir() -> String {
    ".cache".to_string()
}

pub(crate) fn default_consent_store_name() -> String {
    "portfolio-consent-storage".to_string()
}

pub(crate) fn default_consent_cookie_name() -> String {
    "portfolio-cookie-consent".to_string()
}

pub(crate) fn default_consent_cookie_max_age_days() -> u32 {
    365
}

pub(crate) fn default_hero_threshold_px() -> f64 {
    50.0
}

pub(crate) fn default_scroll_hysteresis_px() -> f64 {
    5.0
}

pub(crate) fn default_progress_hysteresis() -> f64 {
    0.01
}
