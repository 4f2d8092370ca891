use eframe::egui;

use crate::processing::axis_transform::AxisTransform;
use crate::processing::histogram::{MAX_NBINS, MIN_NBINS};
use crate::processing::normalize::NormalizationStyle;
use crate::state::plot_set::PlotSet;
use crate::state::plot_view::AxisChoice;

const AXIS_NAMES: [&str; 3] = ["X axis", "Y axis", "Z axis"];

/// Tab strip with one button per plot. Returns the newly chosen tab.
pub fn show_plot_tabs(ui: &mut egui::Ui, nplots: usize, active: usize) -> usize {
    let mut chosen = active;
    ui.horizontal_wrapped(|ui| {
        for k in 0..nplots {
            if ui.selectable_label(k == active, format!("{}", k + 1)).clicked() {
                chosen = k;
            }
        }
    });
    chosen
}

/// Controls for plot `index`: axes, normalization, transform, colors,
/// histogram bins, rotation and view reset.
pub fn show_plot_controls(ui: &mut egui::Ui, set: &mut PlotSet, index: usize) {
    let nvars = set.store().nvars();
    let labels: Vec<String> = set.store().labels().to_vec();

    ui.label(egui::RichText::new(format!("Plot {}", index + 1)).strong().size(15.0));
    if let Some(msg) = set.plot(index).failure() {
        ui.colored_label(egui::Color32::from_rgb(255, 80, 80), msg);
    }
    ui.add_space(4.0);

    egui::Grid::new(("axes_grid", index))
        .num_columns(3)
        .spacing([8.0, 6.0])
        .show(ui, |ui| {
            for slot in 0..3 {
                ui.label(AXIS_NAMES[slot]);

                let current = set.plot(index).axis(slot);
                let mut selected = current.label_index(nvars);
                // Only the third axis may be empty.
                let choices = if slot < 2 { nvars } else { nvars + 1 };
                egui::ComboBox::from_id_salt(("axis", index, slot))
                    .width(140.0)
                    .selected_text(labels.get(selected).cloned().unwrap_or_default())
                    .show_ui(ui, |ui| {
                        for (i, label) in labels.iter().enumerate().take(choices) {
                            ui.selectable_value(&mut selected, i, label.as_str());
                        }
                    });
                let choice = AxisChoice::from_label_index(selected, nvars);
                if choice != current {
                    set.set_axis(index, slot, choice);
                }

                let current_style = set.plot(index).style(slot);
                let mut style = current_style;
                egui::ComboBox::from_id_salt(("style", index, slot))
                    .width(110.0)
                    .selected_text(style.label())
                    .show_ui(ui, |ui| {
                        for s in NormalizationStyle::ALL {
                            ui.selectable_value(&mut style, s, s.label());
                        }
                    });
                if style != current_style {
                    set.set_style(index, slot, style);
                }
                ui.end_row();
            }
        });

    ui.add_space(4.0);
    ui.horizontal(|ui| {
        ui.label("Transform");
        let current = set.plot(index).transform();
        let mut transform = current;
        egui::ComboBox::from_id_salt(("transform", index))
            .selected_text(transform.label())
            .show_ui(ui, |ui| {
                for t in AxisTransform::ALL {
                    ui.selectable_value(&mut transform, t, t.label());
                }
            });
        if transform != current {
            set.set_transform(index, transform);
        }
    });

    ui.separator();

    ui.horizontal(|ui| {
        ui.label("Selected color");
        let mut color = set.color_tables().selected(index);
        if ui.color_edit_button_rgba_unmultiplied(&mut color).changed() {
            set.set_selected_color(index, color);
        }
    });

    let mut show_deselected = set.plot(index).show_deselected;
    if ui.checkbox(&mut show_deselected, "Show deselected points").changed() {
        set.toggle_plot_deselected(index);
    }

    let mut show_histograms = set.plot(index).show_histograms;
    if ui.checkbox(&mut show_histograms, "Histograms").changed() {
        set.set_show_histograms(index, show_histograms);
    }

    let mut nbins = set.plot(index).nbins();
    if ui
        .add(egui::Slider::new(&mut nbins, MIN_NBINS..=MAX_NBINS).logarithmic(true).text("bins"))
        .changed()
    {
        set.set_nbins(index, nbins);
    }

    ui.separator();

    let mut angle = set.plot(index).view.angle();
    if ui
        .add(egui::Slider::new(&mut angle, 0.0..=359.9).text("rotation"))
        .changed()
    {
        set.set_angle(index, angle);
    }
    ui.horizontal(|ui| {
        let mut spin = set.plot(index).view.spin;
        if ui.checkbox(&mut spin, "Spin").changed() {
            set.set_spin(index, spin);
        }
        if ui.button("Reset view").clicked() {
            set.reset_view(index);
        }
    });

    ui.separator();

    egui::CollapsingHeader::new("Column statistics")
        .id_salt(("stats", index))
        .show(ui, |ui| {
            let columns: Vec<usize> = set
                .plot(index)
                .axes()
                .iter()
                .filter_map(|a| a.column())
                .collect();
            for column in columns {
                if let Some(stats) = set.column_stats(column) {
                    ui.monospace(stats.report(&labels[column]));
                }
            }
        });
}
