use std::time::{Duration, Instant};

use super::buffers::{Rgba, ViewUniforms};

/// Screen-space rectangle as (min corner, max corner) in pixels.
pub type ScreenRect = ([f32; 2], [f32; 2]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistogramSide {
    /// Bars for axis 0 along the bottom edge.
    Bottom,
    /// Bars for axis 1 along the left edge.
    Left,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramBar {
    pub side: HistogramSide,
    pub rect: ScreenRect,
    /// Selected-only counts are drawn over the totals.
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AxisLabel {
    pub text: String,
    pub world_min: f32,
    pub world_max: f32,
}

/// Everything a toolkit needs to paint one plot for one frame.
#[derive(Debug, Clone)]
pub struct PlotFrame<'a> {
    /// Pixel position of every row, in row order.
    pub points: Vec<[f32; 2]>,
    /// Per-row colors, parallel to `points`.
    pub colors: &'a [Rgba],
    pub uniforms: ViewUniforms,
    pub histogram_bars: Vec<HistogramBar>,
    pub selection_rect: Option<ScreenRect>,
    pub axis_labels: Vec<AxisLabel>,
    /// Set when the plot's last extraction failed; nothing else is drawn.
    pub failure: Option<String>,
}

impl PlotFrame<'_> {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Limits how often the idle callback redraws. Skipped frames are always
/// superseded by the next one that passes.
#[derive(Debug, Clone)]
pub struct FrameThrottle {
    interval: Duration,
    last: Option<Instant>,
    skipped: u64,
}

impl FrameThrottle {
    pub fn new(max_fps: u32) -> Self {
        let fps = max_fps.max(1);
        Self {
            interval: Duration::from_secs_f64(1.0 / fps as f64),
            last: None,
            skipped: 0,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// True when at least one frame interval has passed since the last
    /// accepted frame.
    pub fn should_redraw(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.saturating_duration_since(last) < self.interval => {
                self.skipped += 1;
                false
            }
            _ => {
                self.last = Some(now);
                true
            }
        }
    }

    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}
