use super::frame::FrameSlot;
use super::{HeroPhase, ScrollDirection, ScrollState, ViewportMetrics};
use crate::config::AppConfig;
use tracing::{debug, trace};

/// Options passed when registering viewport listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerOptions {
    /// Listeners never block the scroll gesture.
    pub passive: bool,
}

/// Source of viewport measurements and scroll/resize notifications.
///
/// Absent on the server; the coordinator then serves static defaults.
pub trait Viewport {
    /// Current measurement, or `None` when the viewport cannot be measured.
    fn measure(&self) -> Option<ViewportMetrics>;
    /// Start delivering `scroll` and `resize` events to the coordinator.
    fn attach_listeners(&mut self, options: ListenerOptions);
    fn detach_listeners(&mut self);
}

/// Thresholds controlling hero detection and publication.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollSettings {
    /// Hero threshold in px; `None` when the page has no hero section.
    pub hero_threshold: Option<f64>,
    pub hysteresis_px: f64,
    pub progress_hysteresis: f64,
}

impl Default for ScrollSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default(), true)
    }
}

impl ScrollSettings {
    pub fn from_config(config: &AppConfig, has_hero: bool) -> Self {
        Self {
            hero_threshold: has_hero.then_some(config.hero_threshold_px),
            hysteresis_px: config.scroll_hysteresis_px,
            progress_hysteresis: config.progress_hysteresis,
        }
    }

    pub fn has_hero(&self) -> bool {
        self.hero_threshold.is_some()
    }
}

/// Keeps the published [`ScrollState`] fresh for one layout root.
pub struct ScrollCoordinator {
    settings: ScrollSettings,
    viewport: Option<Box<dyn Viewport>>,
    slot: FrameSlot<ViewportMetrics>,
    state: ScrollState,
    subscribers: usize,
    listening: bool,
    revision: u64,
    recomputes: u64,
}

impl ScrollCoordinator {
    pub fn new(settings: ScrollSettings, viewport: Option<Box<dyn Viewport>>) -> Self {
        Self {
            state: ScrollState::initial(settings.has_hero()),
            settings,
            viewport,
            slot: FrameSlot::new(),
            subscribers: 0,
            listening: false,
            revision: 0,
            recomputes: 0,
        }
    }

    /// Coordinator for a render pass with no viewport at all.
    pub fn detached(settings: ScrollSettings) -> Self {
        Self::new(settings, None)
    }

    /// Read the current state, attaching listeners on the first subscription.
    pub fn subscribe(&mut self) -> ScrollState {
        self.subscribers += 1;
        if self.subscribers == 1 {
            self.attach();
        }
        self.state
    }

    /// Release one subscription; the last one detaches the listeners.
    pub fn unsubscribe(&mut self) {
        self.subscribers = self.subscribers.saturating_sub(1);
        if self.subscribers == 0 {
            self.detach();
        }
    }

    /// Remove listeners and drop any undrained sample.
    pub fn unmount(&mut self) {
        self.subscribers = 0;
        self.detach();
    }

    /// Scroll listener entry point. Returns `true` when a frame must be
    /// scheduled to drain the sample.
    pub fn on_scroll(&mut self, metrics: ViewportMetrics) -> bool {
        self.offer(metrics, "scroll")
    }

    /// Resize listener entry point; same contract as [`Self::on_scroll`].
    pub fn on_resize(&mut self, metrics: ViewportMetrics) -> bool {
        self.offer(metrics, "resize")
    }

    /// Drain the pending sample, if any, and publish a new state when it
    /// differs enough from the current one.
    pub fn on_frame(&mut self) -> Option<ScrollState> {
        let metrics = self.slot.take()?;
        self.recompute(metrics)
    }

    pub fn state(&self) -> ScrollState {
        self.state
    }

    pub fn phase(&self) -> HeroPhase {
        self.state.phase()
    }

    /// Number of states published since construction.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Number of frame drains that ran a recompute.
    pub fn recomputes(&self) -> u64 {
        self.recomputes
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    pub fn has_pending_frame(&self) -> bool {
        self.slot.is_pending()
    }

    pub fn settings(&self) -> &ScrollSettings {
        &self.settings
    }

    fn attach(&mut self) {
        if self.listening {
            return;
        }
        let Some(viewport) = self.viewport.as_mut() else {
            debug!("No viewport available; serving static scroll defaults");
            return;
        };
        viewport.attach_listeners(ListenerOptions { passive: true });
        self.listening = true;
        if let Some(initial) = viewport.measure() {
            self.slot.offer(initial);
        }
        debug!(has_hero = self.settings.has_hero(), "Attached scroll listeners");
    }

    fn detach(&mut self) {
        self.slot.clear();
        if !self.listening {
            return;
        }
        if let Some(viewport) = self.viewport.as_mut() {
            viewport.detach_listeners();
        }
        self.listening = false;
        debug!(revision = self.revision, "Detached scroll listeners");
    }

    fn offer(&mut self, metrics: ViewportMetrics, source: &'static str) -> bool {
        if !self.listening {
            trace!(source, "Dropping viewport event without listeners");
            return false;
        }
        self.slot.offer(metrics)
    }

    fn recompute(&mut self, metrics: ViewportMetrics) -> Option<ScrollState> {
        self.recomputes += 1;
        let metrics = metrics.sanitized();
        let scroll_y = metrics.scroll_y;
        let progress = metrics.progress();
        let phase = HeroPhase::classify(scroll_y, self.settings.hero_threshold);

        let previous = self.state;
        let delta = scroll_y - previous.scroll_y;
        let moved = delta.abs() > self.settings.hysteresis_px;
        let progressed =
            (progress - previous.scroll_progress).abs() > self.settings.progress_hysteresis;
        let flipped = phase != previous.phase();

        if !(moved || progressed || flipped) {
            trace!(scroll_y, delta, "Scroll change within hysteresis; not publishing");
            return None;
        }

        self.state = ScrollState {
            scroll_y,
            scroll_direction: ScrollDirection::from_delta(delta),
            is_past_hero: phase == HeroPhase::PastHero,
            scroll_progress: progress,
        };
        self.revision += 1;
        if flipped {
            debug!(?phase, scroll_y, "Hero phase changed");
        }
        Some(self.state)
    }
}

impl Drop for ScrollCoordinator {
    fn drop(&mut self) {
        self.unmount();
    }
}
