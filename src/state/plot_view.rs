use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::data::column_store::{ColumnStore, NOTHING_LABEL};
use crate::error::{Result, ViewsError, Warnings};
use crate::processing::axis_transform::AxisTransform;
use crate::processing::histogram::{Histogram, DEFAULT_NBINS, MAX_NBINS, MIN_NBINS};
use crate::processing::normalize::{normalize, NormalizationStyle};
use crate::processing::rank_cache::RankCache;
use crate::render::buffers::{AxisView, AxisViewMut, Rgba, Vertex, ViewUniforms};
use crate::render::events::Viewport;
use crate::render::frame::{AxisLabel, HistogramBar, HistogramSide, PlotFrame};
use crate::render::view_transform::{rect_contains, ViewTransform};
use crate::state::colors::ColorTables;
use crate::state::selection::{OwnerTag, SelectionState};

/// Histogram bar length, as a fraction of the panel size, for a bin
/// holding every row at the default bin count.
const HISTOGRAM_GAIN: f32 = 8.0;

/// What one axis slot of a plot shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AxisChoice {
    Column(usize),
    Nothing,
}

impl AxisChoice {
    pub fn column(&self) -> Option<usize> {
        match self {
            AxisChoice::Column(c) => Some(*c),
            AxisChoice::Nothing => None,
        }
    }

    /// Map a label-list index back to a choice; the trailing `-nothing-`
    /// entry (index `nvars`) and anything past it mean no axis.
    pub fn from_label_index(index: usize, nvars: usize) -> Self {
        if index < nvars {
            AxisChoice::Column(index)
        } else {
            AxisChoice::Nothing
        }
    }

    pub fn label_index(&self, nvars: usize) -> usize {
        self.column().unwrap_or(nvars)
    }
}

/// One point cloud: axis configuration, derived vertex/color buffers,
/// histograms and the view transform.
#[derive(Debug, Clone)]
pub struct PlotView {
    /// Position in the plot set; the owner tag is `index + 1`.
    index: usize,
    axes: [AxisChoice; 3],
    styles: [NormalizationStyle; 3],
    transform: AxisTransform,
    pub view: ViewTransform,
    world: [(f32, f32); 3],
    vertices: Vec<Vertex>,
    colors: Vec<Rgba>,
    histograms: [Histogram; 2],
    nbins: usize,
    /// Per-plot half of the deselected-visibility toggle.
    pub show_deselected: bool,
    pub show_histograms: bool,
    pub point_size: f32,
    labels: [String; 3],
    failure: Option<String>,
}

impl PlotView {
    pub fn new(index: usize, axes: [AxisChoice; 3], style: NormalizationStyle, view: ViewTransform) -> Self {
        Self {
            index,
            axes,
            styles: [style; 3],
            transform: AxisTransform::Identity,
            view,
            world: [(-1.0, 1.0); 3],
            vertices: Vec::new(),
            colors: Vec::new(),
            histograms: [Histogram::default(), Histogram::default()],
            nbins: DEFAULT_NBINS,
            show_deselected: true,
            show_histograms: false,
            point_size: 2.0,
            labels: Default::default(),
            failure: None,
        }
    }

    /// Default axes for plot `index`: consecutive column pairs, wrapping
    /// around the table, no third axis.
    pub fn default_axes(index: usize, nvars: usize) -> [AxisChoice; 3] {
        let nvars = nvars.max(1);
        [
            AxisChoice::Column((2 * index) % nvars),
            AxisChoice::Column((2 * index + 1) % nvars),
            AxisChoice::Nothing,
        ]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn tag(&self) -> OwnerTag {
        (self.index + 1) as OwnerTag
    }

    pub fn axes(&self) -> &[AxisChoice; 3] {
        &self.axes
    }

    pub fn axis(&self, slot: usize) -> AxisChoice {
        self.axes[slot]
    }

    pub fn styles(&self) -> &[NormalizationStyle; 3] {
        &self.styles
    }

    pub fn style(&self, slot: usize) -> NormalizationStyle {
        self.styles[slot]
    }

    pub fn transform(&self) -> AxisTransform {
        self.transform
    }

    pub fn set_axis(&mut self, slot: usize, choice: AxisChoice) {
        self.axes[slot] = choice;
    }

    pub fn set_style(&mut self, slot: usize, style: NormalizationStyle) {
        self.styles[slot] = style;
    }

    pub fn set_transform(&mut self, transform: AxisTransform) {
        self.transform = transform;
    }

    pub fn nbins(&self) -> usize {
        self.nbins
    }

    pub fn set_nbins(&mut self, nbins: usize) {
        self.nbins = nbins.clamp(MIN_NBINS, MAX_NBINS);
    }

    /// World range of each axis after normalization and transform.
    pub fn world_ranges(&self) -> [(f32, f32); 3] {
        self.world
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn colors(&self) -> &[Rgba] {
        &self.colors
    }

    pub fn histogram(&self, axis: usize) -> &Histogram {
        &self.histograms[axis]
    }

    pub fn axis_label(&self, slot: usize) -> &str {
        &self.labels[slot]
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Whether the same (column, style) pair is shown on `slot`.
    pub fn shows(&self, slot: usize, column: usize, style: NormalizationStyle) -> bool {
        self.axes[slot] == AxisChoice::Column(column) && self.styles[slot] == style
    }

    /// Rebuild the vertex buffer from the store.
    ///
    /// Ranks each chosen column (through the shared cache), normalizes a
    /// working copy per axis, applies the 2D transform to axes 0/1, writes
    /// the vertex buffer, resets the view and recomputes both histograms.
    /// On error the plot keeps no stale geometry and reports the failure
    /// from [`PlotView::failure`].
    pub fn extract_data_points(
        &mut self,
        store: &ColumnStore,
        ranks: &mut RankCache,
        selection: &SelectionState,
    ) -> Result<Warnings> {
        match self.try_extract(store, ranks, selection) {
            Ok(warnings) => {
                self.failure = None;
                Ok(warnings)
            }
            Err(e) => {
                self.vertices.clear();
                self.colors.clear();
                self.histograms = [Histogram::default(), Histogram::default()];
                self.failure = Some(e.user_message());
                Err(e)
            }
        }
    }

    fn try_extract(
        &mut self,
        store: &ColumnStore,
        ranks: &mut RankCache,
        selection: &SelectionState,
    ) -> Result<Warnings> {
        let npoints = store.npoints();
        let mut warnings = Warnings::new();
        let mut buffers: [Vec<f32>; 3] = Default::default();
        let mut world = [(-1.0f32, 1.0f32); 3];

        for slot in 0..3 {
            let column = match self.axes[slot] {
                AxisChoice::Column(c) => c,
                AxisChoice::Nothing if slot < 2 => {
                    return Err(ViewsError::Config(format!(
                        "plot {} needs a column on axis {}",
                        self.index + 1,
                        slot
                    )));
                }
                AxisChoice::Nothing => {
                    self.labels[slot] = NOTHING_LABEL.to_string();
                    continue;
                }
            };
            let values = store.checked_column(column)?;
            let rank = ranks.rank_of(store, column);

            let mut working = values.to_vec();
            let result = normalize(&mut working, &rank, self.styles[slot]);
            world[slot] = result.world();
            if let Some(w) = result.warning {
                warnings.push(format!("{}: {}", store.label(column), w));
            }
            buffers[slot] = working;
            self.labels[slot] = store.label(column).to_string();
        }

        let [x, y, _] = &mut buffers;
        if let Some((wx, wy)) = self.transform.apply(x.as_mut_slice(), y.as_mut_slice()) {
            world[0] = wx;
            world[1] = wy;
        }

        self.vertices.clear();
        self.vertices.resize(npoints, [0.0; 3]);
        for (slot, values) in buffers.iter().enumerate() {
            let mut axis = AxisViewMut::new(&mut self.vertices, slot);
            // An empty buffer is the `-nothing-` axis.
            if values.is_empty() {
                axis.fill(0.0);
            } else {
                axis.copy_from(values);
            }
        }
        self.colors.resize(npoints, [0.0; 4]);
        self.world = world;

        self.reset_view();
        self.compute_histograms(selection);

        tracing::debug!(
            "Plot {} extracted {} points ({} / {} / {})",
            self.index + 1,
            npoints,
            self.labels[0],
            self.labels[1],
            self.labels[2]
        );
        Ok(warnings)
    }

    pub fn reset_view(&mut self) {
        self.view.reset(self.world);
    }

    /// Bin axis `axis` (0 or 1) of the vertex buffer over its world range.
    pub fn compute_histogram(&mut self, axis: usize, selection: &SelectionState) {
        let (lo, hi) = self.world[axis];
        let values = AxisView::new(&self.vertices, axis);
        self.histograms[axis] = if selection.npoints() == values.len() {
            Histogram::compute(values.iter(), lo, hi, self.nbins, |i| selection.is_selected(i))
        } else {
            Histogram::compute(values.iter(), lo, hi, self.nbins, |_| false)
        };
    }

    pub fn compute_histograms(&mut self, selection: &SelectionState) {
        self.compute_histogram(0, selection);
        self.compute_histogram(1, selection);
    }

    /// Gather one color per row from the owner tags.
    ///
    /// The "show" table is used only when both this plot and the global
    /// toggle want deselected rows visible.
    pub fn color_array_from_selection(&mut self, owner: &[OwnerTag], tables: &ColorTables, show_deselected: bool) {
        if self.failure.is_some() {
            return;
        }
        assert_eq!(owner.len(), self.vertices.len(), "owner/vertex length mismatch");
        let table = tables.table(self.show_deselected && show_deselected);
        self.colors.clear();
        self.colors.extend(owner.iter().map(|&o| table[o as usize]));
    }

    /// Gesture mask for the current selection rectangle: this plot's tag for
    /// rows inside it (in view-plane coordinates), 0 elsewhere.
    pub fn brushed_rows(&self) -> Vec<OwnerTag> {
        let rect = self.view.selection_rect();
        let tag = self.tag();
        self.vertices
            .iter()
            .map(|&v| {
                let p = self.view.view_plane(Vec3::from(v)).truncate();
                if rect_contains(rect, p) {
                    tag
                } else {
                    0
                }
            })
            .collect()
    }

    pub fn uniforms(&self, viewport: Viewport) -> ViewUniforms {
        ViewUniforms {
            center: self.view.center.extend(1.0).to_array(),
            scale: self.view.scale().extend(1.0).to_array(),
            angle: self.view.angle(),
            point_size: self.point_size,
            viewport: [viewport.width, viewport.height],
        }
    }

    /// Produce one frame for `viewport`.
    pub fn draw(&self, viewport: Viewport) -> PlotFrame<'_> {
        let uniforms = self.uniforms(viewport);
        if let Some(msg) = &self.failure {
            return PlotFrame {
                points: Vec::new(),
                colors: &[],
                uniforms,
                histogram_bars: Vec::new(),
                selection_rect: None,
                axis_labels: Vec::new(),
                failure: Some(msg.clone()),
            };
        }

        let points = self
            .vertices
            .iter()
            .map(|&v| self.view.world_to_screen(Vec3::from(v), viewport))
            .collect();

        let (lo, hi) = self.view.selection_rect();
        let selection_rect = (hi.x > lo.x && hi.y > lo.y).then(|| {
            let a = self.view.plane_to_screen(Vec2::new(lo.x, hi.y), viewport);
            let b = self.view.plane_to_screen(Vec2::new(hi.x, lo.y), viewport);
            (a, b)
        });

        let histogram_bars = if self.show_histograms {
            self.histogram_bars(viewport)
        } else {
            Vec::new()
        };

        let axis_labels = (0..3)
            .filter(|&slot| slot < 2 || self.axes[slot] != AxisChoice::Nothing)
            .map(|slot| AxisLabel {
                text: self.labels[slot].clone(),
                world_min: self.world[slot].0,
                world_max: self.world[slot].1,
            })
            .collect();

        PlotFrame {
            points,
            colors: &self.colors,
            uniforms,
            histogram_bars,
            selection_rect,
            axis_labels,
            failure: None,
        }
    }

    fn histogram_bars(&self, viewport: Viewport) -> Vec<HistogramBar> {
        let mut bars = Vec::new();
        let hscale = self.view.hscale();
        let center = self.view.center.truncate();

        let bottom = &self.histograms[0];
        let edges = bottom.edges();
        let gain = HISTOGRAM_GAIN * hscale.x * viewport.height;
        for (bin, pair) in edges.windows(2).enumerate() {
            let x0 = self.view.plane_to_screen(Vec2::new(pair[0], center.y), viewport)[0];
            let x1 = self.view.plane_to_screen(Vec2::new(pair[1], center.y), viewport)[0];
            for (count, selected) in [(bottom.counts[bin], false), (bottom.selected_counts[bin], true)] {
                if count > 0.0 {
                    bars.push(HistogramBar {
                        side: HistogramSide::Bottom,
                        rect: ([x0, viewport.height - count * gain], [x1, viewport.height]),
                        selected,
                    });
                }
            }
        }

        let left = &self.histograms[1];
        let edges = left.edges();
        let gain = HISTOGRAM_GAIN * hscale.y * viewport.width;
        for (bin, pair) in edges.windows(2).enumerate() {
            // Screen y grows downwards, so the upper edge maps to the min.
            let y0 = self.view.plane_to_screen(Vec2::new(center.x, pair[1]), viewport)[1];
            let y1 = self.view.plane_to_screen(Vec2::new(center.x, pair[0]), viewport)[1];
            for (count, selected) in [(left.counts[bin], false), (left.selected_counts[bin], true)] {
                if count > 0.0 {
                    bars.push(HistogramBar {
                        side: HistogramSide::Left,
                        rect: ([0.0, y0], [count * gain, y1]),
                        selected,
                    });
                }
            }
        }
        bars
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::LoadedTable;

    fn store() -> ColumnStore {
        let table = LoadedTable {
            labels: vec!["a".into(), "b".into(), "c".into()],
            columns: vec![
                (0..10).map(|i| i as f32).collect(),
                (0..10).map(|i| (i * i) as f32).collect(),
                (0..10).map(|i| -(i as f32)).collect(),
            ],
        };
        ColumnStore::from_table(table).unwrap().0
    }

    fn plot(store: &ColumnStore) -> PlotView {
        PlotView::new(
            0,
            PlotView::default_axes(0, store.nvars()),
            NormalizationStyle::MinMax,
            ViewTransform::default(),
        )
    }

    #[test]
    fn test_default_axes_wrap() {
        assert_eq!(
            PlotView::default_axes(1, 3),
            [AxisChoice::Column(2), AxisChoice::Column(0), AxisChoice::Nothing]
        );
        assert_eq!(AxisChoice::from_label_index(3, 3), AxisChoice::Nothing);
        assert_eq!(AxisChoice::Nothing.label_index(3), 3);
    }

    #[test]
    fn test_extract_fills_vertices() {
        let store = store();
        let mut ranks = RankCache::new();
        let sel = SelectionState::new(store.npoints());
        let mut p = plot(&store);
        let warnings = p.extract_data_points(&store, &mut ranks, &sel).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(p.vertices().len(), 10);
        assert_eq!(p.vertices()[0], [-1.0, -1.0, 0.0]);
        assert_eq!(p.vertices()[9], [1.0, 1.0, 0.0]);
        assert_eq!(p.world_ranges()[0], (-1.0, 1.0));
        assert_eq!(p.axis_label(2), NOTHING_LABEL);
        assert_eq!(ranks.sorts_performed(), 2);
        // Uniform counts over the default bins.
        assert_eq!(p.histogram(0).nbins(), DEFAULT_NBINS);
    }

    #[test]
    fn test_style_warning_keeps_world_range() {
        let store = store();
        let mut ranks = RankCache::new();
        let sel = SelectionState::new(store.npoints());
        let mut p = plot(&store);
        p.set_style(0, NormalizationStyle::Log10);

        let warnings = p.extract_data_points(&store, &mut ranks, &sel).unwrap();
        assert!(warnings.message().unwrap().starts_with("a: log10"));
        let (lo, hi) = p.world_ranges()[0];
        assert_eq!(lo, 0.0);
        assert!((hi - 9.0f32.log10()).abs() < 1e-6);
        assert!(p.failure().is_none());
    }

    #[test]
    fn test_missing_column_marks_failure() {
        let store = store();
        let mut ranks = RankCache::new();
        let sel = SelectionState::new(store.npoints());
        let mut p = plot(&store);
        p.set_axis(0, AxisChoice::Column(42));
        assert!(p.extract_data_points(&store, &mut ranks, &sel).is_err());
        assert!(p.failure().is_some());
        assert!(p.vertices().is_empty());
        let frame = p.draw(Viewport::default());
        assert!(frame.is_empty());
        assert!(frame.failure.is_some());
    }

    #[test]
    fn test_colors_follow_owner_tags() {
        let store = store();
        let mut ranks = RankCache::new();
        let mut sel = SelectionState::new(store.npoints());
        let mut p = plot(&store);
        p.extract_data_points(&store, &mut ranks, &sel).unwrap();

        let grey = [0.5, 0.5, 0.5, 1.0];
        let red = [1.0, 0.0, 0.0, 1.0];
        let tables = ColorTables::new(grey, &[red]);
        let mut mask = vec![0; 10];
        mask[3] = 1;
        sel.begin_gesture(1);
        sel.apply_gesture(&mask, false);

        p.color_array_from_selection(sel.owner(), &tables, true);
        assert_eq!(p.colors()[3], red);
        assert_eq!(p.colors()[0], grey);

        p.show_deselected = false;
        p.color_array_from_selection(sel.owner(), &tables, true);
        assert_eq!(p.colors()[0], [0.0; 4]);
    }

    #[test]
    fn test_draw_reports_rect_and_bars() {
        let store = store();
        let mut ranks = RankCache::new();
        let sel = SelectionState::new(store.npoints());
        let mut p = plot(&store);
        p.extract_data_points(&store, &mut ranks, &sel).unwrap();
        p.show_histograms = true;
        p.view.set_selection_rect(Vec2::new(-0.5, -0.5), Vec2::new(0.5, 0.5));

        let vp = Viewport::new(100.0, 100.0);
        let frame = p.draw(vp);
        assert_eq!(frame.points.len(), 10);
        // Center of the world maps to the panel center.
        let (a, b) = frame.selection_rect.unwrap();
        assert!((a[0] - 30.0).abs() < 1e-4 && (b[0] - 70.0).abs() < 1e-4);
        assert!(frame.histogram_bars.iter().any(|b| b.side == HistogramSide::Bottom));
        assert!(frame.histogram_bars.iter().any(|b| b.side == HistogramSide::Left));
        assert_eq!(frame.axis_labels.len(), 2);
    }
}
