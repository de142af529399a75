use super::models::AppConfig;
use super::tables::ConfigTables;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Load configuration from the given path, falling back to defaults on error.
pub fn load_config(path: &Path) -> AppConfig {
    let contents = match fs::read_to_string(path) {
        Ok(data) => {
            info!(path = %path.display(), "Loaded base config");
            data
        }
        Err(err) => {
            warn!(
                path = %path.display(),
                "Falling back to default config: {err}"
            );
            return AppConfig::default();
        }
    };

    match parse_config(&contents) {
        Ok(cfg) => {
            debug!("Parsed configuration from disk");
            cfg
        }
        Err(err) => {
            warn!(path = %path.display(), "Invalid config TOML: {err:#}");
            AppConfig::default()
        }
    }
}

/// Parse a sectioned `config.toml` document.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let tables: ConfigTables = toml::from_str(contents).context("parsing config tables")?;
    let mut config = AppConfig::from(tables);
    sanitize(&mut config);
    Ok(config)
}

/// Render the configuration back into its sectioned TOML form.
pub fn serialize_config(config: &AppConfig) -> Result<String> {
    toml::to_string_pretty(&ConfigTables::from(config)).context("serializing config tables")
}

fn sanitize(config: &mut AppConfig) {
    let defaults = AppConfig::default();
    if !config.hero_threshold_px.is_finite() || config.hero_threshold_px < 0.0 {
        warn!(
            value = config.hero_threshold_px,
            "Ignoring invalid hero threshold"
        );
        config.hero_threshold_px = defaults.hero_threshold_px;
    }
    if !config.scroll_hysteresis_px.is_finite() || config.scroll_hysteresis_px < 0.0 {
        warn!(
            value = config.scroll_hysteresis_px,
            "Ignoring invalid scroll hysteresis"
        );
        config.scroll_hysteresis_px = defaults.scroll_hysteresis_px;
    }
    if !config.progress_hysteresis.is_finite() {
        config.progress_hysteresis = defaults.progress_hysteresis;
    }
    config.progress_hysteresis = config.progress_hysteresis.clamp(0.0, 1.0);
    if config.consent_cookie_max_age_days == 0 {
        warn!("Ignoring zero consent cookie lifetime");
        config.consent_cookie_max_age_days = defaults.consent_cookie_max_age_days;
    }
    if config.consent_cookie_name.trim().is_empty() {
        config.consent_cookie_name = defaults.consent_cookie_name;
    }
    if config.consent_store_name.trim().is_empty() {
        config.consent_store_name = defaults.consent_store_name;
    }
}
