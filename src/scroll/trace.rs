//! Recorded scroll sessions, replayed frame by frame.

use super::coordinator::{ListenerOptions, ScrollCoordinator, Viewport};
use super::{ScrollState, ViewportMetrics};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Events delivered between two frames.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TraceFrame {
    #[serde(default)]
    pub events: Vec<TraceEvent>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TraceEvent {
    Scroll(ViewportMetrics),
    Resize(ViewportMetrics),
}

/// A JSON-serializable capture of viewport activity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScrollTrace {
    /// Measurement taken when listeners were attached.
    #[serde(default)]
    pub initial: Option<ViewportMetrics>,
    #[serde(default)]
    pub frames: Vec<TraceFrame>,
}

impl ScrollTrace {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading scroll trace {}", path.display()))?;
        Self::parse(&data).with_context(|| format!("parsing scroll trace {}", path.display()))
    }

    pub fn parse(data: &str) -> Result<Self> {
        Ok(serde_json::from_str(data)?)
    }

    /// Viewport that reports the trace's initial measurement.
    pub fn viewport(&self) -> TraceViewport {
        TraceViewport {
            initial: self.initial,
        }
    }

    /// Feed every frame through `coordinator`, collecting published states.
    pub fn replay(&self, coordinator: &mut ScrollCoordinator) -> Vec<ScrollState> {
        let mut published = Vec::new();
        coordinator.subscribe();
        if let Some(state) = coordinator.on_frame() {
            published.push(state);
        }
        for frame in &self.frames {
            for event in &frame.events {
                match *event {
                    TraceEvent::Scroll(metrics) => coordinator.on_scroll(metrics),
                    TraceEvent::Resize(metrics) => coordinator.on_resize(metrics),
                };
            }
            if let Some(state) = coordinator.on_frame() {
                published.push(state);
            }
        }
        coordinator.unsubscribe();
        info!(
            frames = self.frames.len(),
            published = published.len(),
            recomputes = coordinator.recomputes(),
            "Replayed scroll trace"
        );
        published
    }
}

/// Viewport backed by a recorded trace.
#[derive(Debug, Clone)]
pub struct TraceViewport {
    initial: Option<ViewportMetrics>,
}

impl Viewport for TraceViewport {
    fn measure(&self) -> Option<ViewportMetrics> {
        self.initial
    }

    fn attach_listeners(&mut self, options: ListenerOptions) {
        debug!(passive = options.passive, "Trace listeners attached");
    }

    fn detach_listeners(&mut self) {
        debug!("Trace listeners detached");
    }
}
