//! Page catalogue and the visual state derived from scrolling.

use crate::config::AppConfig;
use crate::scroll::{ScrollSettings, ScrollState};
use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Pages served by the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageKind {
    Home,
    About,
    Projects,
    Contact,
    Privacy,
    Terms,
    Cookies,
}

impl PageKind {
    pub const ALL: [PageKind; 7] = [
        PageKind::Home,
        PageKind::About,
        PageKind::Projects,
        PageKind::Contact,
        PageKind::Privacy,
        PageKind::Terms,
        PageKind::Cookies,
    ];

    /// Legal pages render plain content without the banner.
    pub fn has_hero(self) -> bool {
        matches!(
            self,
            PageKind::Home | PageKind::About | PageKind::Projects | PageKind::Contact
        )
    }

    pub fn slug(self) -> &'static str {
        match self {
            PageKind::Home => "home",
            PageKind::About => "about",
            PageKind::Projects => "projects",
            PageKind::Contact => "contact",
            PageKind::Privacy => "privacy",
            PageKind::Terms => "terms",
            PageKind::Cookies => "cookies",
        }
    }

    pub fn scroll_settings(self, config: &AppConfig) -> ScrollSettings {
        ScrollSettings::from_config(config, self.has_hero())
    }
}

impl FromStr for PageKind {
    type Err = anyhow::Error;

    /// Accepts a bare slug or a route path (`/`, `/about`, `/legal/privacy`).
    fn from_str(value: &str) -> Result<Self> {
        let trimmed = value.trim().trim_end_matches('/');
        let slug = trimmed.rsplit('/').next().unwrap_or_default();
        if slug.is_empty() {
            return Ok(PageKind::Home);
        }
        PageKind::ALL
            .into_iter()
            .find(|page| page.slug().eq_ignore_ascii_case(slug))
            .ok_or_else(|| anyhow!("Unknown page: {value}"))
    }
}

impl std::fmt::Display for PageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

/// Presentation flags for the header and hero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayoutVisuals {
    pub header_opaque: bool,
    pub hero_pinned: bool,
    pub hero_opacity: f64,
    pub show_back_to_top: bool,
}

impl LayoutVisuals {
    pub fn from_state(state: &ScrollState, settings: &ScrollSettings) -> Self {
        let hero_opacity = match settings.hero_threshold {
            Some(threshold) if threshold > 0.0 && !state.is_past_hero => {
                (1.0 - state.scroll_y / threshold).clamp(0.0, 1.0)
            }
            Some(_) if !state.is_past_hero => 1.0,
            _ => 0.0,
        };
        Self {
            header_opaque: state.is_past_hero,
            hero_pinned: settings.has_hero() && !state.is_past_hero,
            hero_opacity,
            show_back_to_top: state.scroll_progress > 0.5,
        }
    }
}
