//! Scroll-position tracking for the hero/content layering.
//!
//! The coordinator turns raw viewport samples into a small [`ScrollState`]
//! that the header and hero read to decide their visual state. Samples are
//! coalesced to one recompute per frame and only published when they differ
//! meaningfully from what consumers already saw.

mod coordinator;
mod frame;
mod trace;

pub use coordinator::{ListenerOptions, ScrollCoordinator, ScrollSettings, Viewport};
pub use frame::FrameSlot;
pub use trace::{ScrollTrace, TraceEvent, TraceFrame, TraceViewport};

use serde::{Deserialize, Serialize};

/// One measurement of the viewport, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ViewportMetrics {
    pub scroll_y: f64,
    pub viewport_height: f64,
    pub document_height: f64,
}

impl ViewportMetrics {
    pub fn new(scroll_y: f64, viewport_height: f64, document_height: f64) -> Self {
        Self {
            scroll_y,
            viewport_height,
            document_height,
        }
    }

    /// Replace non-finite or negative values with zero.
    pub fn sanitized(self) -> Self {
        let clean = |v: f64| if v.is_finite() { v.max(0.0) } else { 0.0 };
        Self {
            scroll_y: clean(self.scroll_y),
            viewport_height: clean(self.viewport_height),
            document_height: clean(self.document_height),
        }
    }

    /// Fraction of the scrollable range covered, clamped to `[0, 1]`.
    pub fn progress(&self) -> f64 {
        let metrics = self.sanitized();
        let scrollable = metrics.document_height - metrics.viewport_height;
        if scrollable <= 0.0 {
            return 0.0;
        }
        (metrics.scroll_y / scrollable).clamp(0.0, 1.0)
    }
}

/// Sign of the scroll delta since the last published state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollDirection {
    Up,
    #[default]
    Idle,
    Down,
}

impl ScrollDirection {
    pub fn from_delta(delta: f64) -> Self {
        if delta > 0.0 {
            ScrollDirection::Down
        } else if delta < 0.0 {
            ScrollDirection::Up
        } else {
            ScrollDirection::Idle
        }
    }

    pub fn signum(self) -> i8 {
        match self {
            ScrollDirection::Up => -1,
            ScrollDirection::Idle => 0,
            ScrollDirection::Down => 1,
        }
    }
}

/// Whether the page is still showing its hero section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeroPhase {
    AtOrAboveHero,
    PastHero,
}

impl HeroPhase {
    /// Pages without a hero are always treated as scrolled past it.
    pub fn classify(scroll_y: f64, hero: Option<f64>) -> Self {
        match hero {
            Some(threshold) if scroll_y <= threshold => HeroPhase::AtOrAboveHero,
            _ => HeroPhase::PastHero,
        }
    }
}

/// Derived scroll state published to layout consumers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollState {
    pub scroll_y: f64,
    pub scroll_direction: ScrollDirection,
    pub is_past_hero: bool,
    pub scroll_progress: f64,
}

impl ScrollState {
    /// State before any measurement has been taken.
    pub fn initial(has_hero: bool) -> Self {
        Self {
            scroll_y: 0.0,
            scroll_direction: ScrollDirection::Idle,
            is_past_hero: !has_hero,
            scroll_progress: 0.0,
        }
    }

    pub fn phase(&self) -> HeroPhase {
        if self.is_past_hero {
            HeroPhase::PastHero
        } else {
            HeroPhase::AtOrAboveHero
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_is_zero_when_document_fits_viewport() {
        let metrics = ViewportMetrics::new(40.0, 900.0, 600.0);
        assert_eq!(metrics.progress(), 0.0);
    }

    #[test]
    fn progress_clamps_overscroll() {
        assert_eq!(ViewportMetrics::new(-80.0, 800.0, 2000.0).progress(), 0.0);
        assert_eq!(ViewportMetrics::new(1500.0, 800.0, 2000.0).progress(), 1.0);
        assert_eq!(ViewportMetrics::new(f64::NAN, 800.0, 2000.0).progress(), 0.0);
    }

    #[test]
    fn phase_without_hero_is_always_past() {
        assert_eq!(HeroPhase::classify(0.0, None), HeroPhase::PastHero);
        assert_eq!(HeroPhase::classify(50.0, Some(50.0)), HeroPhase::AtOrAboveHero);
        assert_eq!(HeroPhase::classify(50.5, Some(50.0)), HeroPhase::PastHero);
    }

    #[test]
    fn direction_follows_delta_sign() {
        assert_eq!(ScrollDirection::from_delta(3.0).signum(), 1);
        assert_eq!(ScrollDirection::from_delta(-0.5).signum(), -1);
        assert_eq!(ScrollDirection::from_delta(0.0), ScrollDirection::Idle);
    }
}
