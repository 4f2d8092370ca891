use eframe::egui;

use crate::render::buffers::Rgba;
use crate::render::events::{Modifiers, PlotEvent, PlotKey, PointerButton, Viewport};
use crate::render::frame::{HistogramSide, PlotFrame};
use crate::state::plot_set::PlotSet;
use crate::state::theme::Theme;

/// Keys forwarded to the hovered plot.
const KEY_BINDINGS: [(egui::Key, PlotKey); 9] = [
    (egui::Key::I, PlotKey::Invert),
    (egui::Key::D, PlotKey::ToggleDeselected),
    (egui::Key::X, PlotKey::DeleteSelected),
    (egui::Key::Delete, PlotKey::DeleteSelected),
    (egui::Key::C, PlotKey::Clear),
    (egui::Key::R, PlotKey::Reextract),
    (egui::Key::H, PlotKey::HistogramScale),
    (egui::Key::S, PlotKey::Spin),
    (egui::Key::Num0, PlotKey::ResetView),
];

fn to_color32(c: Rgba) -> egui::Color32 {
    egui::Rgba::from_rgba_unmultiplied(c[0], c[1], c[2], c[3]).into()
}

fn local(pos: egui::Pos2, rect: egui::Rect) -> [f32; 2] {
    [pos.x - rect.left(), pos.y - rect.top()]
}

fn global(p: [f32; 2], rect: egui::Rect) -> egui::Pos2 {
    egui::pos2(rect.left() + p[0], rect.top() + p[1])
}

/// Draw one plot into a `size` area and route its pointer and keyboard
/// input to the plot set. Returns true when something changed.
pub fn show_plot_panel(
    ui: &mut egui::Ui,
    set: &mut PlotSet,
    index: usize,
    theme: &Theme,
    size: egui::Vec2,
    is_active: bool,
) -> bool {
    let (rect, response) = ui.allocate_exact_size(size, egui::Sense::click_and_drag());
    let viewport = Viewport::new(rect.width(), rect.height());
    let events = collect_events(ui, &response, rect);

    let mut changed = false;
    for event in events {
        changed |= set.handle(index, event, viewport);
    }

    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, 0.0, theme.plot_bg());
    paint_frame(&painter, &set.draw(index, viewport), rect, theme);

    let border = if is_active {
        egui::Stroke::new(2.0, ui.visuals().selection.stroke.color)
    } else {
        egui::Stroke::new(1.0, theme.axis_color().gamma_multiply(0.5))
    };
    painter.rect_stroke(rect, 0.0, border, egui::StrokeKind::Inside);
    painter.text(
        rect.right_top() + egui::vec2(-6.0, 4.0),
        egui::Align2::RIGHT_TOP,
        format!("{}", index + 1),
        egui::FontId::proportional(11.0),
        to_color32(set.color_tables().selected(index)),
    );

    changed
}

fn collect_events(ui: &egui::Ui, response: &egui::Response, rect: egui::Rect) -> Vec<PlotEvent> {
    let mut events = Vec::new();
    let modifiers = ui.input(|i| Modifiers {
        shift: i.modifiers.shift,
        ctrl: i.modifiers.command,
        alt: i.modifiers.alt,
    });
    let pointer = response.interact_pointer_pos().map(|p| local(p, rect));

    if let Some(pos) = pointer {
        let started = [
            (egui::PointerButton::Primary, PointerButton::Primary),
            (egui::PointerButton::Secondary, PointerButton::Secondary),
            (egui::PointerButton::Middle, PointerButton::Middle),
        ]
        .into_iter()
        .find(|(b, _)| response.drag_started_by(*b));

        if let Some((_, button)) = started {
            // The drag starts once the pointer has moved past a threshold;
            // anchor it where the button went down.
            let origin = ui
                .input(|i| i.pointer.press_origin())
                .map(|p| local(p, rect))
                .unwrap_or(pos);
            events.push(PlotEvent::Press {
                pos: origin,
                button,
                modifiers,
            });
        } else if response.dragged() && response.drag_delta() != egui::Vec2::ZERO {
            events.push(PlotEvent::Drag { pos });
        }
        if response.drag_stopped() {
            events.push(PlotEvent::Release { pos });
        }
        // A click never starts a drag; treat it as an empty brush.
        if response.clicked() {
            events.push(PlotEvent::Press {
                pos,
                button: PointerButton::Primary,
                modifiers,
            });
            events.push(PlotEvent::Release { pos });
        }
    }

    // Presses go to the hovered plot only; releases reach every plot so a
    // held key never outlives the pointer leaving the panel.
    let hovered = response.hovered();
    ui.input(|i| {
        for (key, plot_key) in KEY_BINDINGS {
            if hovered && i.key_pressed(key) {
                events.push(PlotEvent::KeyDown(plot_key));
            }
            if i.key_released(key) {
                events.push(PlotEvent::KeyUp(plot_key));
            }
        }
    });
    events
}

fn paint_frame(painter: &egui::Painter, frame: &PlotFrame<'_>, rect: egui::Rect, theme: &Theme) {
    if let Some(msg) = &frame.failure {
        painter.text(
            rect.center(),
            egui::Align2::CENTER_CENTER,
            msg,
            egui::FontId::proportional(13.0),
            egui::Color32::from_rgb(255, 80, 80),
        );
        return;
    }

    for bar in &frame.histogram_bars {
        let r = egui::Rect::from_two_pos(global(bar.rect.0, rect), global(bar.rect.1, rect));
        let color = if bar.selected {
            theme.selection_rect_color().gamma_multiply(0.35)
        } else {
            theme.histogram_color()
        };
        painter.rect_filled(r, 0.0, color);
    }

    let size = frame.uniforms.point_size.max(1.0);
    let mut mesh = egui::Mesh::default();
    for (&p, &c) in frame.points.iter().zip(frame.colors) {
        if c[3] <= 0.0 {
            continue;
        }
        let pos = global(p, rect);
        if !rect.contains(pos) {
            continue;
        }
        mesh.add_colored_rect(
            egui::Rect::from_center_size(pos, egui::vec2(size, size)),
            to_color32(c),
        );
    }
    painter.add(egui::Shape::mesh(mesh));

    if let Some((a, b)) = frame.selection_rect {
        painter.rect_stroke(
            egui::Rect::from_two_pos(global(a, rect), global(b, rect)),
            0.0,
            egui::Stroke::new(1.0, theme.selection_rect_color()),
            egui::StrokeKind::Middle,
        );
    }

    let font = egui::FontId::proportional(10.0);
    let color = theme.axis_color();
    for (slot, label) in frame.axis_labels.iter().enumerate() {
        let text = format!(
            "{}: {} [{:.3}, {:.3}]",
            ["x", "y", "z"][slot],
            label.text,
            label.world_min,
            label.world_max
        );
        let side = if frame.histogram_bars.iter().any(|b| b.side == HistogramSide::Left) {
            40.0
        } else {
            6.0
        };
        painter.text(
            rect.left_top() + egui::vec2(side, 4.0 + 13.0 * slot as f32),
            egui::Align2::LEFT_TOP,
            text,
            font.clone(),
            color,
        );
    }
}
