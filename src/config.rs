//! Viewer configuration, stored as JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ViewsError};
use crate::processing::histogram::{DEFAULT_NBINS, MAX_NBINS, MIN_NBINS};
use crate::processing::normalize::NormalizationStyle;
use crate::render::buffers::rgba_from_u8;
use crate::render::view_transform::{DEFAULT_SPIN_RATE, INITIAL_PSCALE};
use crate::state::colors::{COLOR_PALETTE, DEFAULT_DESELECTED};
use crate::state::plot_set::{PlotSetOptions, MAX_PLOTS};
use crate::state::theme::Theme;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Plot grid rows.
    pub rows: usize,
    /// Plot grid columns.
    pub cols: usize,
    pub default_nbins: usize,
    pub point_size: f32,
    pub deselected_color: [u8; 4],
    pub selected_colors: Vec<[u8; 4]>,
    pub initial_pscale: f32,
    pub max_fps: u32,
    /// Degrees per frame.
    pub spin_rate: f32,
    pub show_histograms: bool,
    pub default_normalization: NormalizationStyle,
    pub link_axes: bool,
    pub add_to_selection: bool,
    pub show_deselected: bool,
    /// Loader row limit, 0 = unlimited.
    pub max_points: usize,
    pub theme: Theme,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            rows: 2,
            cols: 2,
            default_nbins: DEFAULT_NBINS,
            point_size: 2.0,
            deselected_color: DEFAULT_DESELECTED,
            selected_colors: COLOR_PALETTE.to_vec(),
            initial_pscale: INITIAL_PSCALE,
            max_fps: 60,
            spin_rate: DEFAULT_SPIN_RATE,
            show_histograms: false,
            default_normalization: NormalizationStyle::default(),
            link_axes: false,
            add_to_selection: false,
            show_deselected: true,
            max_points: 0,
            theme: Theme::default(),
        }
    }
}

impl ViewerConfig {
    pub fn nplots(&self) -> usize {
        self.rows * self.cols
    }

    pub fn validate(&self) -> Result<()> {
        if self.rows == 0 || self.cols == 0 {
            return Err(ViewsError::Config("rows and cols must be at least 1".into()));
        }
        if self.nplots() > MAX_PLOTS {
            return Err(ViewsError::Config(format!(
                "{}x{} grid has {} plots; at most {MAX_PLOTS} are supported",
                self.rows,
                self.cols,
                self.nplots()
            )));
        }
        if !(MIN_NBINS..=MAX_NBINS).contains(&self.default_nbins) {
            return Err(ViewsError::Config(format!(
                "default_nbins must be between {MIN_NBINS} and {MAX_NBINS}"
            )));
        }
        if !(self.point_size > 0.0) {
            return Err(ViewsError::Config("point_size must be positive".into()));
        }
        if !(self.initial_pscale > 0.0) || !self.initial_pscale.is_finite() {
            return Err(ViewsError::Config("initial_pscale must be positive".into()));
        }
        if self.max_fps == 0 {
            return Err(ViewsError::Config("max_fps must be at least 1".into()));
        }
        if !self.spin_rate.is_finite() {
            return Err(ViewsError::Config("spin_rate must be finite".into()));
        }
        if self.selected_colors.is_empty() {
            return Err(ViewsError::Config("selected_colors must not be empty".into()));
        }
        Ok(())
    }

    /// Read and validate a JSON config file. Missing fields take defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: ViewerConfig = serde_json::from_str(&text)?;
        config.validate()?;
        tracing::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        tracing::info!("Configuration saved to {:?}", path);
        Ok(())
    }

    pub fn plot_options(&self) -> PlotSetOptions {
        PlotSetOptions {
            initial_pscale: self.initial_pscale,
            spin_rate: self.spin_rate,
            nbins: self.default_nbins.clamp(MIN_NBINS, MAX_NBINS),
            point_size: self.point_size,
            default_style: self.default_normalization,
            show_histograms: self.show_histograms,
            link_axes: self.link_axes,
            add_to_selection: self.add_to_selection,
            show_deselected: self.show_deselected,
            deselected_color: rgba_from_u8(self.deselected_color),
            selected_colors: self.selected_colors.iter().map(|&c| rgba_from_u8(c)).collect(),
            max_fps: self.max_fps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ViewerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.nplots(), 4);
        assert_eq!(config.plot_options().nbins, DEFAULT_NBINS);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ViewerConfig =
            serde_json::from_str(r#"{"rows": 3, "default_normalization": "rank"}"#).unwrap();
        assert_eq!(config.rows, 3);
        assert_eq!(config.cols, 2);
        assert_eq!(config.default_normalization, NormalizationStyle::Rank);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = ViewerConfig {
            rows: 9,
            cols: 9,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ViewsError::Config(_))));
        config.rows = 1;
        config.default_nbins = 5000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("viewer.json");
        let config = ViewerConfig {
            link_axes: true,
            max_points: 1000,
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(ViewerConfig::load(&path).unwrap(), config);
    }
}
