//! Command-line driver for the site runtime.
//!
//! - Load configuration from `conf/config.toml`.
//! - Hydrate the consent gate from the cache directory and run a consent
//!   command against it.
//! - Replay a recorded scroll trace for a page and print what the header and
//!   hero would show.

use anyhow::{Context, Result, anyhow, bail};
use portfolio_site::analytics::TracingAnalyticsBridge;
use portfolio_site::config::{AppConfig, load_config};
use portfolio_site::consent::{
    ConsentGate, ConsentPatch, ConsentSettings, FileConsentStore, FileCookieJar,
};
use portfolio_site::layout::{LayoutVisuals, PageKind};
use portfolio_site::scroll::{ScrollCoordinator, ScrollTrace};
use serde_json::json;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

type ReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

const USAGE: &str = "Usage:
  portfolio-site consent <show|accept-all|reject-all|reset|settings>
  portfolio-site consent set <field=bool>...
  portfolio-site track <path> [title]
  portfolio-site scroll <page> <trace.json>";

enum Command {
    Consent(ConsentCommand),
    Track { path: String, title: Option<String> },
    Scroll { page: PageKind, trace: PathBuf },
}

enum ConsentCommand {
    Show,
    AcceptAll,
    RejectAll,
    Reset,
    Settings,
    Set(ConsentPatch),
}

fn main() {
    let reload_handle = init_tracing();
    if let Err(err) = run(&reload_handle) {
        error!("{err:?}");
        std::process::exit(1);
    }
}

fn run(reload_handle: &ReloadHandle) -> Result<()> {
    let command = parse_args(env::args().skip(1))?;
    let config = load_config(Path::new("conf/config.toml"));
    set_log_level(reload_handle, config.log_level.as_filter_str());
    info!(
        cache_dir = %config.cache_dir,
        level = %config.log_level,
        "Starting portfolio site runtime"
    );

    match command {
        Command::Consent(command) => run_consent(&config, command),
        Command::Track { path, title } => run_track(&config, &path, title.as_deref()),
        Command::Scroll { page, trace } => run_scroll(&config, page, &trace),
    }
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Command> {
    let verb = args.next().ok_or_else(|| anyhow!(USAGE))?;
    match verb.as_str() {
        "consent" => {
            let action = args.next().ok_or_else(|| anyhow!(USAGE))?;
            let command = match action.as_str() {
                "show" => ConsentCommand::Show,
                "accept-all" => ConsentCommand::AcceptAll,
                "reject-all" => ConsentCommand::RejectAll,
                "reset" => ConsentCommand::Reset,
                "settings" => ConsentCommand::Settings,
                "set" => ConsentCommand::Set(parse_patch(args)?),
                other => bail!("Unknown consent action: {other}\n{USAGE}"),
            };
            Ok(Command::Consent(command))
        }
        "track" => {
            let path = args.next().ok_or_else(|| anyhow!(USAGE))?;
            Ok(Command::Track {
                path,
                title: args.next(),
            })
        }
        "scroll" => {
            let page = args
                .next()
                .ok_or_else(|| anyhow!(USAGE))?
                .parse::<PageKind>()?;
            let trace = PathBuf::from(args.next().ok_or_else(|| anyhow!(USAGE))?);
            if !trace.exists() {
                bail!("File not found: {}", trace.display());
            }
            Ok(Command::Scroll { page, trace })
        }
        other => bail!("Unknown command: {other}\n{USAGE}"),
    }
}

fn parse_patch(args: impl Iterator<Item = String>) -> Result<ConsentPatch> {
    let mut patch = ConsentPatch::default();
    let mut any = false;
    for assignment in args {
        let (key, value) = assignment
            .split_once('=')
            .ok_or_else(|| anyhow!("Expected field=bool, got `{assignment}`"))?;
        let value: bool = value
            .trim()
            .parse()
            .with_context(|| format!("Invalid boolean for {key}"))?;
        patch.set(key, value)?;
        any = true;
    }
    if !any {
        bail!("consent set needs at least one field=bool\n{USAGE}");
    }
    Ok(patch)
}

fn open_gate(config: &AppConfig) -> ConsentGate {
    let mut gate = ConsentGate::hydrate(
        ConsentSettings::from_config(config),
        Box::new(FileConsentStore::new(config.consent_store_path())),
        Box::new(FileCookieJar::new(config.cookie_jar_path())),
    )
    .with_analytics(Arc::new(TracingAnalyticsBridge));
    gate.initialize_analytics(config.analytics_measurement_id.as_deref());
    gate
}

fn run_consent(config: &AppConfig, command: ConsentCommand) -> Result<()> {
    let mut gate = open_gate(config);
    match command {
        ConsentCommand::Show => {}
        ConsentCommand::AcceptAll => gate.accept_all(),
        ConsentCommand::RejectAll => gate.reject_all(),
        ConsentCommand::Reset => gate.reset_consent(),
        ConsentCommand::Settings => {
            if !gate.open_settings() {
                warn!("No consent widget is loaded outside the browser");
            }
        }
        ConsentCommand::Set(patch) => gate.update_consent(patch),
    }
    if gate.is_dirty() {
        warn!("Consent choice kept in memory only; storage is unavailable");
    }
    let report = json!({
        "record": gate.record(),
        "analytics": gate.has_analytics_consent(),
        "preferences": gate.has_preferences_consent(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_track(config: &AppConfig, path: &str, title: Option<&str>) -> Result<()> {
    let gate = open_gate(config);
    let sent = gate.track_page_view(path, title);
    println!("{}", json!({ "path": path, "sent": sent }));
    Ok(())
}

fn run_scroll(config: &AppConfig, page: PageKind, trace_path: &Path) -> Result<()> {
    let trace = ScrollTrace::load(trace_path)?;
    let settings = page.scroll_settings(config);
    let mut coordinator = ScrollCoordinator::new(settings, Some(Box::new(trace.viewport())));
    info!(%page, has_hero = page.has_hero(), "Replaying scroll trace");

    for state in trace.replay(&mut coordinator) {
        let visuals = LayoutVisuals::from_state(&state, coordinator.settings());
        println!("{}", json!({ "state": state, "visuals": visuals }));
    }
    Ok(())
}

fn init_tracing() -> ReloadHandle {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (filter_layer, handle) = reload::Layer::new(env_filter);
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_writer(std::io::stderr)
                .with_filter(filter_layer),
        )
        .init();
    handle
}

fn set_log_level(handle: &ReloadHandle, level: &str) {
    if env::var_os("RUST_LOG").is_some() {
        return;
    }
    let parsed = EnvFilter::builder()
        .parse(level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(err) = handle.modify(|filter| *filter = parsed) {
        warn!(%level, "Failed to update log level from config: {err}");
    } else {
        info!(%level, "Applied log level from config");
    }
}
