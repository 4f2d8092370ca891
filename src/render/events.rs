/// Size of a plot panel in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
        }
    }

    /// Pixel position (origin top-left, y down) to normalized device
    /// coordinates in [-1, 1] (y up).
    pub fn to_ndc(&self, pos: [f32; 2]) -> [f32; 2] {
        [
            2.0 * pos[0] / self.width - 1.0,
            1.0 - 2.0 * pos[1] / self.height,
        ]
    }

    pub fn from_ndc(&self, ndc: [f32; 2]) -> [f32; 2] {
        [
            (ndc[0] + 1.0) * 0.5 * self.width,
            (1.0 - ndc[1]) * 0.5 * self.height,
        ]
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(400.0, 400.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

/// Single-key plot commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlotKey {
    /// `i`
    Invert,
    /// `d`
    ToggleDeselected,
    /// `x` or Delete
    DeleteSelected,
    /// `c`
    Clear,
    /// `r`
    Reextract,
    /// `h`, held while dragging
    HistogramScale,
    /// `s`
    Spin,
    /// `0`
    ResetView,
}

/// Toolkit-neutral input event delivered to one plot. Positions are pixels
/// relative to the plot's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlotEvent {
    Press {
        pos: [f32; 2],
        button: PointerButton,
        modifiers: Modifiers,
    },
    Drag {
        pos: [f32; 2],
    },
    Release {
        pos: [f32; 2],
    },
    KeyDown(PlotKey),
    KeyUp(PlotKey),
}
