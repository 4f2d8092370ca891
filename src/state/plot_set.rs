use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use glam::Vec2;

use crate::data::column_store::{ColumnStore, MIN_ROWS};
use crate::data::export;
use crate::data::loader::LoadedTable;
use crate::error::{Result, Warnings};
use crate::processing::axis_transform::AxisTransform;
use crate::processing::histogram::DEFAULT_NBINS;
use crate::processing::normalize::NormalizationStyle;
use crate::processing::rank_cache::RankCache;
use crate::processing::statistics::ColumnStats;
use crate::render::buffers::{rgba_from_u8, Rgba};
use crate::render::events::{PlotEvent, PlotKey, Viewport};
use crate::render::frame::{FrameThrottle, PlotFrame};
use crate::render::view_transform::{Gesture, ViewTransform, DEFAULT_SPIN_RATE, INITIAL_PSCALE};
use crate::state::colors::{color_for_index, ColorTables, DEFAULT_DESELECTED};
use crate::state::plot_view::{AxisChoice, PlotView};
use crate::state::selection::SelectionState;

/// Most plots one set may hold.
pub const MAX_PLOTS: usize = 64;

/// Tag complemented rows get on inversion when no gesture has run yet.
const DEFAULT_INVERT_TAG: u16 = 1;

/// Phases of a "delete selected rows" request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletionPhase {
    #[default]
    Stable,
    DeletionRequested,
    Compacting,
    /// Every cached rank permutation is stale.
    RanksInvalid,
    /// Plots are re-extracting against the compacted table.
    Rebuilding,
}

/// Settings a plot set is created with.
#[derive(Debug, Clone)]
pub struct PlotSetOptions {
    pub initial_pscale: f32,
    pub spin_rate: f32,
    pub nbins: usize,
    pub point_size: f32,
    pub default_style: NormalizationStyle,
    pub show_histograms: bool,
    pub link_axes: bool,
    pub add_to_selection: bool,
    pub show_deselected: bool,
    pub deselected_color: Rgba,
    /// Cycled when there are more plots than colors.
    pub selected_colors: Vec<Rgba>,
    pub max_fps: u32,
}

impl Default for PlotSetOptions {
    fn default() -> Self {
        Self {
            initial_pscale: INITIAL_PSCALE,
            spin_rate: DEFAULT_SPIN_RATE,
            nbins: DEFAULT_NBINS,
            point_size: 2.0,
            default_style: NormalizationStyle::default(),
            show_histograms: false,
            link_axes: false,
            add_to_selection: false,
            show_deselected: true,
            deselected_color: rgba_from_u8(DEFAULT_DESELECTED),
            selected_colors: (0..12).map(|i| rgba_from_u8(color_for_index(i))).collect(),
            max_fps: 60,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ActiveGesture {
    plot: usize,
    extend: bool,
}

/// All plots of one dataset together with the state they share: the
/// column store, the rank cache, the selection and the color tables.
///
/// Every mutation goes through `&mut self`, so there is exactly one writer
/// per event. After a selection update the initiating plot recolors first,
/// then the others in cyclic order.
#[derive(Debug)]
pub struct PlotSet {
    store: ColumnStore,
    ranks: RankCache,
    selection: SelectionState,
    plots: Vec<PlotView>,
    colors: Arc<ColorTables>,
    selected_colors: Vec<Rgba>,
    deselected_color: Rgba,
    pub link_axes: bool,
    pub add_to_selection: bool,
    show_deselected: bool,
    warnings: Warnings,
    phase: DeletionPhase,
    last_deletion: Vec<DeletionPhase>,
    /// Plots in the order the latest recolor pass visited them.
    last_recolor: Vec<usize>,
    throttle: FrameThrottle,
    active: Option<ActiveGesture>,
    histogram_key_held: bool,
}

impl PlotSet {
    /// Build `nplots` plots over `store` and extract all of them.
    pub fn new(store: ColumnStore, nplots: usize, options: PlotSetOptions) -> Self {
        let nplots = nplots.clamp(1, MAX_PLOTS);
        let npoints = store.npoints();
        let nvars = store.nvars();

        let plots = (0..nplots)
            .map(|k| {
                let mut plot = PlotView::new(
                    k,
                    PlotView::default_axes(k, nvars),
                    options.default_style,
                    ViewTransform::new(options.initial_pscale, options.spin_rate),
                );
                plot.set_nbins(options.nbins);
                plot.point_size = options.point_size;
                plot.show_histograms = options.show_histograms;
                plot
            })
            .collect();

        let selected_colors: Vec<Rgba> = if options.selected_colors.is_empty() {
            PlotSetOptions::default().selected_colors
        } else {
            options.selected_colors
        };

        let mut set = Self {
            store,
            ranks: RankCache::new(),
            selection: SelectionState::new(npoints),
            plots,
            colors: ColorTables::new(options.deselected_color, &[]),
            selected_colors,
            deselected_color: options.deselected_color,
            link_axes: options.link_axes,
            add_to_selection: options.add_to_selection,
            show_deselected: options.show_deselected,
            warnings: Warnings::new(),
            phase: DeletionPhase::Stable,
            last_deletion: Vec::new(),
            last_recolor: Vec::new(),
            throttle: FrameThrottle::new(options.max_fps),
            active: None,
            histogram_key_held: false,
        };
        set.rebuild_color_tables();
        set.extract_all();
        set.recolor_from(0);
        tracing::info!("Plot set ready: {} plots over {} rows", nplots, npoints);
        set
    }

    /// Validate a loaded table and build a plot set over it. Load-time
    /// warnings (pruned columns and so on) are kept for the status bar.
    pub fn from_table(table: LoadedTable, nplots: usize, options: PlotSetOptions) -> Result<Self> {
        let (store, warnings) = ColumnStore::from_table(table)?;
        let mut set = Self::new(store, nplots, options);
        set.warnings.extend(warnings);
        Ok(set)
    }

    pub fn store(&self) -> &ColumnStore {
        &self.store
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn rank_cache(&self) -> &RankCache {
        &self.ranks
    }

    pub fn color_tables(&self) -> &Arc<ColorTables> {
        &self.colors
    }

    pub fn plots(&self) -> &[PlotView] {
        &self.plots
    }

    pub fn plot(&self, index: usize) -> &PlotView {
        &self.plots[index]
    }

    pub fn nplots(&self) -> usize {
        self.plots.len()
    }

    pub fn npoints(&self) -> usize {
        self.store.npoints()
    }

    pub fn nselected(&self) -> usize {
        self.selection.nselected()
    }

    pub fn is_inverted(&self) -> bool {
        self.selection.is_inverted()
    }

    pub fn show_deselected(&self) -> bool {
        self.show_deselected
    }

    /// All collected warnings joined into one line, if any.
    pub fn warning_message(&self) -> Option<String> {
        self.warnings.message()
    }

    pub fn push_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning);
    }

    pub fn clear_warnings(&mut self) {
        self.warnings.clear();
    }

    pub fn deletion_phase(&self) -> DeletionPhase {
        self.phase
    }

    /// Phases the most recent deletion request went through, in order.
    pub fn last_deletion_phases(&self) -> &[DeletionPhase] {
        &self.last_deletion
    }

    pub fn column_stats(&mut self, column: usize) -> Option<ColumnStats> {
        let values = self.store.checked_column(column).ok()?;
        let rank = self.ranks.rank_of(&self.store, column);
        ColumnStats::compute(values, &rank)
    }

    pub fn draw(&self, plot: usize, viewport: Viewport) -> PlotFrame<'_> {
        self.plots[plot].draw(viewport)
    }

    // ---- extraction and recoloring ----

    /// Re-extract one plot. A failure is logged, surfaced as a warning and
    /// leaves the plot empty; other plots are unaffected.
    pub fn extract_plot(&mut self, index: usize) {
        let plot = &mut self.plots[index];
        match plot.extract_data_points(&self.store, &mut self.ranks, &self.selection) {
            Ok(warnings) => self.warnings.extend(warnings),
            Err(e) => {
                tracing::error!("Plot {} extraction failed: {}", index + 1, e);
                self.warnings.push(format!("Plot {}: {}", index + 1, e.user_message()));
            }
        }
    }

    pub fn extract_all(&mut self) {
        for index in 0..self.plots.len() {
            self.extract_plot(index);
        }
    }

    /// Order in which plots recolor after a change started by `initiator`.
    pub fn recolor_order(&self, initiator: usize) -> Vec<usize> {
        let n = self.plots.len();
        (0..n).map(|k| (initiator + k) % n).collect()
    }

    /// Rebuild color buffers and selected-count histograms, starting with
    /// `initiator` and continuing cyclically.
    pub fn recolor_from(&mut self, initiator: usize) {
        self.last_recolor.clear();
        for index in self.recolor_order(initiator) {
            self.recolor_plot(index);
            self.last_recolor.push(index);
        }
    }

    pub fn last_recolor_order(&self) -> &[usize] {
        &self.last_recolor
    }

    fn recolor_plot(&mut self, index: usize) {
        let plot = &mut self.plots[index];
        plot.color_array_from_selection(self.selection.owner(), &self.colors, self.show_deselected);
        plot.compute_histograms(&self.selection);
    }

    fn rebuild_color_tables(&mut self) {
        let selected: Vec<Rgba> = (0..self.plots.len())
            .map(|k| self.selected_colors[k % self.selected_colors.len()])
            .collect();
        self.colors = ColorTables::new(self.deselected_color, &selected);
    }

    pub fn set_selected_color(&mut self, plot: usize, color: Rgba) {
        if plot >= self.selected_colors.len() {
            let base = self.selected_colors.clone();
            while self.selected_colors.len() <= plot {
                let next = base[self.selected_colors.len() % base.len()];
                self.selected_colors.push(next);
            }
        }
        self.selected_colors[plot] = color;
        self.rebuild_color_tables();
        self.recolor_from(plot);
    }

    pub fn set_deselected_color(&mut self, color: Rgba) {
        self.deselected_color = color;
        self.rebuild_color_tables();
        self.recolor_from(0);
    }

    pub fn set_show_deselected(&mut self, show: bool) {
        self.show_deselected = show;
        self.recolor_from(0);
    }

    pub fn toggle_plot_deselected(&mut self, plot: usize) {
        self.plots[plot].show_deselected = !self.plots[plot].show_deselected;
        self.recolor_plot(plot);
    }

    // ---- per-plot configuration ----

    pub fn set_axis(&mut self, plot: usize, slot: usize, choice: AxisChoice) {
        self.plots[plot].set_axis(slot, choice);
        self.refresh_plot(plot);
    }

    pub fn set_style(&mut self, plot: usize, slot: usize, style: NormalizationStyle) {
        self.plots[plot].set_style(slot, style);
        self.refresh_plot(plot);
    }

    pub fn set_transform(&mut self, plot: usize, transform: AxisTransform) {
        self.plots[plot].set_transform(transform);
        self.refresh_plot(plot);
    }

    pub fn set_nbins(&mut self, plot: usize, nbins: usize) {
        self.plots[plot].set_nbins(nbins);
        self.plots[plot].compute_histograms(&self.selection);
    }

    pub fn set_angle(&mut self, plot: usize, degrees: f32) {
        self.plots[plot].view.set_angle(degrees);
    }

    pub fn set_spin(&mut self, plot: usize, spin: bool) {
        self.plots[plot].view.spin = spin;
    }

    pub fn set_show_histograms(&mut self, plot: usize, show: bool) {
        self.plots[plot].show_histograms = show;
    }

    pub fn reset_view(&mut self, plot: usize) {
        self.plots[plot].reset_view();
        self.propagate_links(plot);
    }

    fn refresh_plot(&mut self, plot: usize) {
        self.extract_plot(plot);
        self.recolor_plot(plot);
    }

    // ---- view transforms and linked axes ----

    /// Pan `plot` by an NDC delta, then propagate to linked plots.
    pub fn pan(&mut self, plot: usize, delta: Vec2) {
        self.plots[plot].view.pan(delta);
        self.propagate_links(plot);
    }

    /// Zoom `plot` by `1 + delta` per axis, then propagate to linked plots.
    pub fn zoom(&mut self, plot: usize, delta: Vec2) {
        self.plots[plot].view.zoom(delta);
        self.propagate_links(plot);
    }

    /// Copy `source`'s per-axis center and scale to every slot of every
    /// other plot that shows the same column with the same style. Slots 0
    /// and 1 only link between plots without a 2D transform.
    pub fn propagate_links(&mut self, source: usize) {
        if !self.link_axes {
            return;
        }
        let from = &self.plots[source];
        let from_axes = *from.axes();
        let from_styles = *from.styles();
        let from_transform = from.transform();
        let from_view = from.view.clone();

        for from_slot in 0..3 {
            let Some(column) = from_axes[from_slot].column() else {
                continue;
            };
            if from_slot < 2 && from_transform != AxisTransform::Identity {
                continue;
            }
            let style = from_styles[from_slot];
            for (index, plot) in self.plots.iter_mut().enumerate() {
                if index == source {
                    continue;
                }
                for to_slot in 0..3 {
                    if to_slot < 2 && plot.transform() != AxisTransform::Identity {
                        continue;
                    }
                    if plot.shows(to_slot, column, style) {
                        plot.view.copy_axis_from(&from_view, from_slot, to_slot);
                    }
                }
            }
        }
    }

    // ---- selection ----

    /// Brush the world-space rectangle spanned by `a` and `b` in `plot`, as
    /// a complete press/drag/release gesture.
    pub fn select_rect(&mut self, plot: usize, a: Vec2, b: Vec2, extend: bool) {
        if self.plots[plot].failure().is_some() {
            return;
        }
        self.selection.begin_gesture(self.plots[plot].tag());
        self.plots[plot].view.set_selection_rect(a, b);
        self.update_selection(plot, extend);
    }

    fn update_selection(&mut self, plot: usize, extend: bool) {
        let newly_selected = self.plots[plot].brushed_rows();
        self.selection.apply_gesture(&newly_selected, extend);
        self.recolor_from(plot);
    }

    pub fn invert(&mut self) {
        self.selection.invert(DEFAULT_INVERT_TAG);
        tracing::debug!(
            "Selection inverted={} ({} selected)",
            self.selection.is_inverted(),
            self.selection.nselected()
        );
        let initiator = self.active.map(|g| g.plot).unwrap_or(0);
        self.recolor_from(initiator);
    }

    pub fn clear(&mut self) {
        self.selection.clear();
        for plot in &mut self.plots {
            plot.view.clear_drag();
        }
        self.active = None;
        self.recolor_from(0);
    }

    fn enter_phase(&mut self, phase: DeletionPhase) {
        tracing::debug!("Deletion phase: {:?}", phase);
        self.phase = phase;
        self.last_deletion.push(phase);
    }

    /// Remove every selected row from the table and rebuild all plots.
    ///
    /// When fewer than two rows would survive, the table is cut to exactly
    /// two rows instead: the survivors, topped up from the leading rows, in
    /// table order. A warning is recorded. Returns the number of rows
    /// removed.
    pub fn delete_selected(&mut self) -> usize {
        self.last_deletion.clear();
        self.enter_phase(DeletionPhase::DeletionRequested);
        if self.selection.nselected() == 0 {
            self.enter_phase(DeletionPhase::Stable);
            return 0;
        }

        let mut keep = self.selection.unselected_mask();
        let survivors = keep.iter().filter(|&&k| k).count();
        if survivors < MIN_ROWS {
            let mut missing = MIN_ROWS - survivors;
            for k in keep.iter_mut() {
                if missing == 0 {
                    break;
                }
                if !*k {
                    *k = true;
                    missing -= 1;
                }
            }
            self.warnings.push(format!(
                "Deleting would leave {survivors} rows; {MIN_ROWS} rows were kept"
            ));
        }

        self.enter_phase(DeletionPhase::Compacting);
        let before = self.store.npoints();
        let after = self.store.retain_rows(&keep);

        self.enter_phase(DeletionPhase::RanksInvalid);
        self.ranks.invalidate();
        self.selection.resize(after);
        for plot in &mut self.plots {
            plot.view.clear_drag();
        }
        self.active = None;

        self.enter_phase(DeletionPhase::Rebuilding);
        self.extract_all();
        self.recolor_from(0);

        self.enter_phase(DeletionPhase::Stable);
        tracing::info!("Deleted {} rows, {} remain", before - after, after);
        before - after
    }

    /// Swap in a new table. Axis choices that no longer exist fall back to
    /// the defaults; selection and caches start over.
    pub fn replace_table(&mut self, table: LoadedTable) -> Result<()> {
        let (store, warnings) = ColumnStore::from_table(table)?;
        self.store.replace(store);
        self.warnings.clear();
        self.warnings.extend(warnings);
        self.ranks.invalidate();
        self.selection.resize(self.store.npoints());
        self.active = None;

        let nvars = self.store.nvars();
        for (k, plot) in self.plots.iter_mut().enumerate() {
            let defaults = PlotView::default_axes(k, nvars);
            for slot in 0..3 {
                if matches!(plot.axis(slot), AxisChoice::Column(c) if c >= nvars) {
                    plot.set_axis(slot, defaults[slot]);
                }
            }
        }
        self.extract_all();
        self.recolor_from(0);
        Ok(())
    }

    /// Write the table (or only its selected rows) as CSV.
    pub fn export_csv(&self, path: &Path, only_selected: bool) -> Result<usize> {
        export::write_csv(&self.store, &self.selection, path, only_selected)
    }

    // ---- input ----

    /// Dispatch one input event to `plot`. Returns whether it was consumed.
    pub fn handle(&mut self, plot: usize, event: PlotEvent, viewport: Viewport) -> bool {
        if plot >= self.plots.len() {
            return false;
        }
        match event {
            PlotEvent::Press {
                pos,
                button,
                modifiers,
            } => {
                let mut gesture = ViewTransform::gesture_for(button, modifiers, self.histogram_key_held);
                if gesture == Gesture::Selecting && self.plots[plot].failure().is_some() {
                    gesture = Gesture::Idle;
                }
                self.plots[plot].view.press(pos, gesture, viewport);
                if gesture == Gesture::Selecting {
                    let extend = modifiers.shift || self.add_to_selection;
                    self.selection.begin_gesture(self.plots[plot].tag());
                    self.active = Some(ActiveGesture { plot, extend });
                    // A press alone is a zero-area rectangle: selects
                    // nothing but still recolors.
                    self.update_selection(plot, extend);
                }
                gesture != Gesture::Idle
            }
            PlotEvent::Drag { pos } => {
                let gesture = self.plots[plot].view.drag_to(pos, viewport);
                self.after_drag(plot, gesture)
            }
            PlotEvent::Release { pos } => {
                let gesture = self.plots[plot].view.release(pos, viewport);
                self.after_drag(plot, gesture)
            }
            PlotEvent::KeyDown(key) => self.key_down(plot, key),
            PlotEvent::KeyUp(PlotKey::HistogramScale) => {
                self.histogram_key_held = false;
                true
            }
            PlotEvent::KeyUp(_) => false,
        }
    }

    fn after_drag(&mut self, plot: usize, gesture: Gesture) -> bool {
        match gesture {
            Gesture::Idle => false,
            Gesture::Selecting => {
                let extend = match self.active {
                    Some(active) if active.plot == plot => active.extend,
                    _ => self.add_to_selection,
                };
                self.update_selection(plot, extend);
                true
            }
            Gesture::Panning | Gesture::Zooming => {
                self.propagate_links(plot);
                true
            }
            Gesture::HistogramScaling => true,
        }
    }

    fn key_down(&mut self, plot: usize, key: PlotKey) -> bool {
        match key {
            PlotKey::Invert => self.invert(),
            PlotKey::ToggleDeselected => self.toggle_plot_deselected(plot),
            PlotKey::DeleteSelected => {
                self.delete_selected();
            }
            PlotKey::Clear => self.clear(),
            PlotKey::Reextract => self.refresh_plot(plot),
            PlotKey::HistogramScale => self.histogram_key_held = true,
            PlotKey::Spin => {
                let view = &mut self.plots[plot].view;
                view.spin = !view.spin;
            }
            PlotKey::ResetView => self.reset_view(plot),
        }
        true
    }

    /// Idle/frame callback. Returns true when a redraw should happen now;
    /// spinning plots advance only on such frames.
    pub fn tick(&mut self, now: Instant) -> bool {
        if !self.throttle.should_redraw(now) {
            return false;
        }
        for plot in &mut self.plots {
            plot.view.advance_spin();
        }
        true
    }

    pub fn is_spinning(&self) -> bool {
        self.plots.iter().any(|p| p.view.spin)
    }
}
