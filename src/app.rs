use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use eframe::egui;

use crate::config::ViewerConfig;
use crate::data::loader::{self, LoadedTable};
use crate::error::{ViewsError, Warnings};
use crate::state::plot_set::PlotSet;
use crate::ui::{control_panel, plot_panel};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// File extensions accepted from the open dialog and drag-and-drop.
const DATA_EXTENSIONS: [&str; 9] = ["csv", "txt", "dat", "asc", "tsv", "xls", "xlsx", "xlsm", "ods"];

type LoadResult = Result<(LoadedTable, Warnings), ViewsError>;

/// Pending background file load.
struct PendingLoad {
    name: String,
    result: Arc<Mutex<Option<LoadResult>>>,
}

/// The main OxideViews application.
pub struct OxideViewsApp {
    config: ViewerConfig,
    plots: Option<PlotSet>,
    /// Plot whose controls are shown in the side panel.
    active_tab: usize,
    source_name: Option<String>,
    /// Hard error from the last load/export/save.
    error_message: Option<String>,
    pending_load: Option<PendingLoad>,
}

impl OxideViewsApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: ViewerConfig, input: Option<PathBuf>) -> Self {
        let ctx = &cc.egui_ctx;
        let mut style = (*ctx.style()).clone();
        style.spacing.button_padding = egui::vec2(8.0, 4.0);
        style.spacing.item_spacing = egui::vec2(8.0, 6.0);
        style.visuals.window_corner_radius = egui::CornerRadius::same(8);
        ctx.set_style(style);
        ctx.set_visuals(config.theme.visuals());

        let mut app = Self {
            config,
            plots: None,
            active_tab: 0,
            source_name: None,
            error_message: None,
            pending_load: None,
        };
        if let Some(path) = input {
            app.load_file(&path);
        }
        app
    }

    fn open_file_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Data Files", &DATA_EXTENSIONS)
            .add_filter("All Files", &["*"])
            .pick_file()
        {
            self.load_file(&path);
        }
    }

    /// Parse a data file on a worker thread so the UI stays responsive.
    fn load_file(&mut self, path: &Path) {
        let path_buf = path.to_path_buf();
        let max_points = self.config.max_points;
        let result: Arc<Mutex<Option<LoadResult>>> = Arc::new(Mutex::new(None));
        let result_clone = Arc::clone(&result);

        std::thread::spawn(move || {
            let loaded = loader::load_file(&path_buf, max_points);
            if let Ok(mut slot) = result_clone.lock() {
                *slot = Some(loaded);
            }
        });

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        tracing::info!("Loading {:?}", path);
        self.pending_load = Some(PendingLoad { name, result });
    }

    fn poll_pending_load(&mut self) {
        let finished = match &self.pending_load {
            Some(pending) => match pending.result.lock() {
                Ok(mut slot) => slot.take(),
                Err(_) => Some(Err(ViewsError::Config("loader thread panicked".into()))),
            },
            None => None,
        };
        let Some(result) = finished else {
            return;
        };
        let name = self.pending_load.take().map(|p| p.name);

        match result.and_then(|(table, warnings)| self.install_table(table, warnings)) {
            Ok(()) => {
                self.source_name = name;
                self.error_message = None;
            }
            Err(e) => {
                tracing::error!("Failed to load file: {e}");
                self.error_message = Some(e.user_message());
            }
        }
    }

    /// Replace the current table, keeping plot settings, or build the plot
    /// grid for the first table.
    fn install_table(&mut self, table: LoadedTable, warnings: Warnings) -> Result<(), ViewsError> {
        match &mut self.plots {
            Some(set) => set.replace_table(table)?,
            None => {
                let set = PlotSet::from_table(table, self.config.nplots(), self.config.plot_options())?;
                self.plots = Some(set);
                self.active_tab = 0;
            }
        }
        if let Some(set) = &mut self.plots {
            for w in warnings.iter() {
                set.push_warning(w);
            }
        }
        Ok(())
    }

    fn export_csv(&mut self, only_selected: bool) {
        let Some(set) = &self.plots else {
            return;
        };
        let filename = if only_selected { "selected.csv" } else { "data.csv" };
        if let Some(path) = rfd::FileDialog::new()
            .set_file_name(filename)
            .add_filter("CSV Files", &["csv"])
            .save_file()
        {
            if let Err(e) = set.export_csv(&path, only_selected) {
                tracing::error!("Export failed: {e}");
                self.error_message = Some(e.user_message());
            }
        }
    }

    /// Save the live toggles back into the config and write it out.
    fn save_config(&mut self) {
        if let Some(set) = &self.plots {
            self.config.link_axes = set.link_axes;
            self.config.add_to_selection = set.add_to_selection;
            self.config.show_deselected = set.show_deselected();
        }
        if let Some(path) = rfd::FileDialog::new()
            .set_file_name("oxideviews.json")
            .add_filter("JSON", &["json"])
            .save_file()
        {
            if let Err(e) = self.config.save(&path) {
                self.error_message = Some(e.user_message());
            }
        }
    }

    fn dropped_paths(ctx: &egui::Context) -> Vec<PathBuf> {
        ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .filter_map(|f| f.path.clone())
                .filter(|p| {
                    let ext = p
                        .extension()
                        .and_then(|e| e.to_str())
                        .map(|e| e.to_lowercase())
                        .unwrap_or_default();
                    ext.is_empty() || DATA_EXTENSIONS.contains(&ext.as_str())
                })
                .collect()
        })
    }

    fn show_top_bar(&mut self, ctx: &egui::Context) {
        let mut open = false;
        let mut export: Option<bool> = None;
        let mut save_config = false;

        egui::TopBottomPanel::top("header")
            .frame(egui::Frame::side_top_panel(&ctx.style()).inner_margin(egui::Margin::symmetric(12, 6)))
            .show(ctx, |ui| {
                ui.horizontal_wrapped(|ui| {
                    ui.heading("OxideViews");
                    ui.separator();

                    if ui.button("Open").clicked() {
                        open = true;
                    }
                    let has_data = self.plots.is_some();
                    if ui.add_enabled(has_data, egui::Button::new("Export all")).clicked() {
                        export = Some(false);
                    }
                    if ui.add_enabled(has_data, egui::Button::new("Export selected")).clicked() {
                        export = Some(true);
                    }
                    if ui.button("Save config").clicked() {
                        save_config = true;
                    }

                    if let Some(set) = &mut self.plots {
                        ui.separator();
                        ui.checkbox(&mut set.link_axes, "Link axes");
                        ui.checkbox(&mut set.add_to_selection, "Add to selection");
                        let mut show = set.show_deselected();
                        if ui.checkbox(&mut show, "Show deselected").changed() {
                            set.set_show_deselected(show);
                        }
                        let mut color = set.color_tables().deselected();
                        if ui.color_edit_button_rgba_unmultiplied(&mut color).changed() {
                            set.set_deselected_color(color);
                        }

                        ui.separator();
                        if ui.button("Invert").clicked() {
                            set.invert();
                        }
                        if ui.button("Clear").clicked() {
                            set.clear();
                        }
                        if ui.button("Delete selected").clicked() {
                            set.delete_selected();
                        }
                    }

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        let theme_label = self.config.theme.toggle().label();
                        if ui.button(format!("{theme_label} Mode")).clicked() {
                            self.config.theme = self.config.theme.toggle();
                            ui.ctx().set_visuals(self.config.theme.visuals());
                        }
                        ui.small(format!("v{VERSION}"));
                    });
                });
            });

        if open {
            self.open_file_dialog();
        }
        if let Some(only_selected) = export {
            self.export_csv(only_selected);
        }
        if save_config {
            self.save_config();
        }
    }

    fn show_status_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status")
            .frame(egui::Frame::side_top_panel(&ctx.style()).inner_margin(egui::Margin::symmetric(12, 4)))
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    if let Some(name) = &self.source_name {
                        ui.label(egui::RichText::new(name).strong());
                        ui.separator();
                    }
                    if let Some(set) = &mut self.plots {
                        ui.label(format!("{} / {} selected", set.nselected(), set.npoints()));
                        if set.is_inverted() {
                            ui.label(egui::RichText::new("inverted").italics());
                        }
                        if let Some(msg) = set.warning_message() {
                            ui.separator();
                            ui.colored_label(egui::Color32::from_rgb(230, 170, 40), msg);
                            if ui.small_button("dismiss").clicked() {
                                set.clear_warnings();
                            }
                        }
                    }
                    if let Some(msg) = &self.error_message {
                        ui.separator();
                        ui.colored_label(egui::Color32::from_rgb(255, 80, 80), msg);
                        if ui.small_button("dismiss").clicked() {
                            self.error_message = None;
                        }
                    }
                });
            });
    }
}

impl eframe::App for OxideViewsApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        for path in Self::dropped_paths(ctx) {
            self.load_file(&path);
        }
        self.poll_pending_load();

        self.show_top_bar(ctx);
        self.show_status_bar(ctx);

        let theme = self.config.theme;
        let rows = self.config.rows.max(1);
        let cols = self.config.cols.max(1);

        let Some(set) = &mut self.plots else {
            egui::CentralPanel::default().show(ctx, |ui| {
                ui.add_space(80.0);
                ui.vertical_centered(|ui| {
                    ui.heading("Welcome to OxideViews");
                    ui.add_space(12.0);
                    ui.label(egui::RichText::new("Open or drag-and-drop a CSV / text / spreadsheet file.").weak());
                });
            });
            if self.pending_load.is_some() {
                ctx.request_repaint();
            }
            return;
        };

        egui::SidePanel::left("plot_controls")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| {
                self.active_tab = control_panel::show_plot_tabs(ui, set.nplots(), self.active_tab);
                ui.separator();
                egui::ScrollArea::vertical().show(ui, |ui| {
                    control_panel::show_plot_controls(ui, set, self.active_tab);
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            let spacing = 4.0;
            let avail = ui.available_size();
            let cell = egui::vec2(
                ((avail.x - spacing * (cols - 1) as f32) / cols as f32).max(80.0),
                ((avail.y - spacing * (rows - 1) as f32) / rows as f32).max(80.0),
            );
            ui.spacing_mut().item_spacing = egui::vec2(spacing, spacing);
            for r in 0..rows {
                ui.horizontal(|ui| {
                    for c in 0..cols {
                        let index = r * cols + c;
                        if index >= set.nplots() {
                            break;
                        }
                        ui.push_id(index, |ui| {
                            let active = index == self.active_tab;
                            let changed = plot_panel::show_plot_panel(ui, set, index, &theme, cell, active);
                            if changed {
                                self.active_tab = index;
                            }
                        });
                    }
                });
            }
        });

        if set.tick(Instant::now()) && set.is_spinning() {
            ctx.request_repaint();
        } else if set.is_spinning() || self.pending_load.is_some() {
            ctx.request_repaint_after(std::time::Duration::from_millis(5));
        }
    }
}
