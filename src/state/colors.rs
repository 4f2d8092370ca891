use std::sync::Arc;

use crate::render::buffers::Rgba;

/// Selected-point colors handed out to plots in order.
pub const COLOR_PALETTE: [[u8; 4]; 12] = [
    [255, 0, 0, 255],     // Red
    [0, 255, 0, 255],     // Green
    [0, 0, 255, 255],     // Blue
    [255, 255, 0, 255],   // Yellow
    [255, 0, 255, 255],   // Magenta
    [0, 255, 255, 255],   // Cyan
    [255, 165, 0, 255],   // Orange
    [128, 0, 128, 255],   // Purple
    [0, 128, 0, 255],     // Dark Green
    [0, 0, 128, 255],     // Navy
    [255, 192, 203, 255], // Pink
    [165, 42, 42, 255],   // Brown
];

pub const DEFAULT_DESELECTED: [u8; 4] = [160, 160, 160, 200];

pub fn color_for_index(index: usize) -> [u8; 4] {
    COLOR_PALETTE[index % COLOR_PALETTE.len()]
}

/// Owner-tag -> RGBA lookup, one table for "deselected visible" and one
/// for "deselected hidden". Index 0 is the unselected entry, index `k` the
/// selected color of plot `k-1`.
///
/// Immutable once built; a color change builds a new snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorTables {
    show_deselected: Vec<Rgba>,
    hide_deselected: Vec<Rgba>,
}

impl ColorTables {
    pub fn new(deselected: Rgba, selected: &[Rgba]) -> Arc<Self> {
        let mut show_deselected = Vec::with_capacity(selected.len() + 1);
        show_deselected.push(deselected);
        show_deselected.extend_from_slice(selected);

        let mut hide_deselected = show_deselected.clone();
        hide_deselected[0] = [0.0; 4];

        Arc::new(Self {
            show_deselected,
            hide_deselected,
        })
    }

    pub fn table(&self, show_deselected: bool) -> &[Rgba] {
        if show_deselected {
            &self.show_deselected
        } else {
            &self.hide_deselected
        }
    }

    pub fn nplots(&self) -> usize {
        self.show_deselected.len() - 1
    }

    pub fn deselected(&self) -> Rgba {
        self.show_deselected[0]
    }

    pub fn selected(&self, plot: usize) -> Rgba {
        self.show_deselected[plot + 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::buffers::rgba_from_u8;

    #[test]
    fn test_tables_share_selected_entries() {
        let grey = rgba_from_u8(DEFAULT_DESELECTED);
        let red = rgba_from_u8(color_for_index(0));
        let tables = ColorTables::new(grey, &[red, red]);
        assert_eq!(tables.nplots(), 2);
        assert_eq!(tables.table(true)[0], grey);
        assert_eq!(tables.table(false)[0], [0.0; 4]);
        assert_eq!(tables.table(false)[2], red);
        assert_eq!(tables.selected(1), red);
    }

    #[test]
    fn test_palette_cycles() {
        assert_eq!(color_for_index(12), color_for_index(0));
    }
}
