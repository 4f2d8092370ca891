use glam::{Mat3, Vec2, Vec3};

use super::events::{Modifiers, PointerButton, Viewport};

/// Fraction of the drawable area the data extent fills after a reset.
pub const INITIAL_PSCALE: f32 = 0.8;
/// Degrees added per frame while spinning.
pub const DEFAULT_SPIN_RATE: f32 = 0.5;
/// Axis the view rotates around.
pub const DEFAULT_TILT_AXIS: Vec3 = Vec3::Y;

/// Lower bound on a single zoom step so scale never reaches zero.
const MIN_ZOOM_FACTOR: f32 = 0.1;
const MIN_SCALE: f32 = 1e-6;
const MAX_SCALE: f32 = 1e6;

/// What the current pointer drag does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gesture {
    #[default]
    Idle,
    Selecting,
    Panning,
    Zooming,
    HistogramScaling,
}

/// Transient pointer state of one plot.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DragState {
    /// Press position in world coordinates (selection anchor).
    pub down: Vec2,
    /// Latest pointer position in world coordinates.
    pub tracked: Vec2,
    /// NDC delta of the latest drag step.
    pub dragged: Vec2,
    last_ndc: Vec2,
    pub gesture: Gesture,
}

/// Affine view of one plot: world -> normalized device coordinates is
/// `ndc = R(angle) * (p - center) * scale`, and the inverse used for
/// pointer input is `world = ndc / scale + center`.
#[derive(Debug, Clone)]
pub struct ViewTransform {
    pub center: Vec3,
    scale: Vec3,
    pub zoom_focus: Vec3,
    /// Degrees, always in [0, 360).
    angle: f32,
    pub spin: bool,
    pub spin_rate: f32,
    tilt_axis: Vec3,
    /// Histogram bar scaling (x = bottom histogram, y = side histogram).
    hscale: Vec2,
    pub initial_pscale: f32,
    pub drag: DragState,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::new(INITIAL_PSCALE, DEFAULT_SPIN_RATE)
    }
}

impl ViewTransform {
    pub fn new(initial_pscale: f32, spin_rate: f32) -> Self {
        Self {
            center: Vec3::ZERO,
            scale: Vec3::splat(initial_pscale),
            zoom_focus: Vec3::ZERO,
            angle: 0.0,
            spin: false,
            spin_rate,
            tilt_axis: DEFAULT_TILT_AXIS,
            hscale: Vec2::ONE,
            initial_pscale,
            drag: DragState::default(),
        }
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    /// Set the scale directly; components are clamped to stay positive.
    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale.clamp(Vec3::splat(MIN_SCALE), Vec3::splat(MAX_SCALE));
    }

    pub fn hscale(&self) -> Vec2 {
        self.hscale
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn set_angle(&mut self, degrees: f32) {
        self.angle = if degrees.is_finite() {
            degrees.rem_euclid(360.0)
        } else {
            0.0
        };
    }

    pub fn rotation(&self) -> Mat3 {
        Mat3::from_axis_angle(self.tilt_axis, self.angle.to_radians())
    }

    /// Restore the default framing for data spanning `ranges` (world min/max
    /// per axis): scale so the extent fills `initial_pscale` of the
    /// drawable area, center on the midpoints, no rotation, no spin.
    pub fn reset(&mut self, ranges: [(f32, f32); 3]) {
        let mut center = Vec3::ZERO;
        let mut scale = Vec3::splat(self.initial_pscale);
        for (axis, &(lo, hi)) in ranges.iter().enumerate() {
            let extent = hi - lo;
            if extent.is_finite() && extent > 0.0 {
                scale[axis] = self.initial_pscale * 2.0 / extent;
                center[axis] = 0.5 * (lo + hi);
            }
        }
        self.center = center;
        self.set_scale(scale);
        self.zoom_focus = center;
        self.angle = 0.0;
        self.spin = false;
        self.hscale = Vec2::ONE;
        self.drag = DragState::default();
    }

    /// Advance the spin by one frame. Returns true when the angle changed.
    pub fn advance_spin(&mut self) -> bool {
        if self.spin {
            self.set_angle(self.angle + self.spin_rate);
        }
        self.spin
    }

    pub fn ndc_to_world(&self, ndc: Vec2) -> Vec2 {
        ndc / self.scale.truncate() + self.center.truncate()
    }

    pub fn screen_to_world(&self, pos: [f32; 2], viewport: Viewport) -> Vec2 {
        self.ndc_to_world(Vec2::from(viewport.to_ndc(pos)))
    }

    /// Position of `p` in the rotated view plane, still in world units.
    /// Equal to `p` when the angle is zero.
    pub fn view_plane(&self, p: Vec3) -> Vec3 {
        if self.angle == 0.0 {
            return p;
        }
        self.rotation() * (p - self.center) + self.center
    }

    pub fn project(&self, p: Vec3) -> Vec2 {
        ((self.view_plane(p) - self.center) * self.scale).truncate()
    }

    pub fn world_to_screen(&self, p: Vec3, viewport: Viewport) -> [f32; 2] {
        viewport.from_ndc(self.project(p).to_array())
    }

    /// Screen position of a view-plane point (no rotation applied), used for
    /// the selection rectangle and histogram bars.
    pub fn plane_to_screen(&self, p: Vec2, viewport: Viewport) -> [f32; 2] {
        let ndc = (p - self.center.truncate()) * self.scale.truncate();
        viewport.from_ndc(ndc.to_array())
    }

    /// Move the view by an NDC delta: `center -= delta / scale`.
    pub fn pan(&mut self, delta: Vec2) {
        self.center.x -= delta.x / self.scale.x;
        self.center.y -= delta.y / self.scale.y;
    }

    /// Zoom x and y independently by `1 + delta` about `zoom_focus`; z
    /// follows x.
    pub fn zoom(&mut self, delta: Vec2) {
        let fx = (1.0 + delta.x).max(MIN_ZOOM_FACTOR);
        let fy = (1.0 + delta.y).max(MIN_ZOOM_FACTOR);
        let factor = Vec3::new(fx, fy, fx);
        let old = self.scale;
        self.set_scale(old * factor);
        // Keep the focus point fixed on screen.
        let applied = self.scale / old;
        self.center = self.zoom_focus - (self.zoom_focus - self.center) / applied;
    }

    pub fn scale_histograms(&mut self, delta: Vec2) {
        let f = Vec2::new(
            (1.0 + delta.x).max(MIN_ZOOM_FACTOR),
            (1.0 + delta.y).max(MIN_ZOOM_FACTOR),
        );
        self.hscale = (self.hscale * f).clamp(Vec2::splat(MIN_SCALE), Vec2::splat(MAX_SCALE));
    }

    /// Pick the gesture for a press. Primary selects, Ctrl+primary or
    /// middle pans, Alt+primary or secondary zooms; holding `h` turns any
    /// drag into histogram scaling.
    pub fn gesture_for(button: PointerButton, modifiers: Modifiers, histogram_key: bool) -> Gesture {
        if histogram_key {
            return Gesture::HistogramScaling;
        }
        match button {
            PointerButton::Primary if modifiers.ctrl => Gesture::Panning,
            PointerButton::Primary if modifiers.alt => Gesture::Zooming,
            PointerButton::Primary => Gesture::Selecting,
            PointerButton::Middle => Gesture::Panning,
            PointerButton::Secondary => Gesture::Zooming,
        }
    }

    /// Start a drag at pixel `pos`.
    pub fn press(&mut self, pos: [f32; 2], gesture: Gesture, viewport: Viewport) {
        let ndc = Vec2::from(viewport.to_ndc(pos));
        let world = self.ndc_to_world(ndc);
        self.drag.last_ndc = ndc;
        self.drag.dragged = Vec2::ZERO;
        self.drag.gesture = gesture;
        match gesture {
            Gesture::Selecting => {
                self.drag.down = world;
                self.drag.tracked = world;
            }
            Gesture::Zooming => {
                self.zoom_focus = world.extend(self.center.z);
            }
            _ => {}
        }
    }

    /// Continue the current drag. Returns the active gesture; for pan and
    /// zoom the transform has already been updated.
    pub fn drag_to(&mut self, pos: [f32; 2], viewport: Viewport) -> Gesture {
        let ndc = Vec2::from(viewport.to_ndc(pos));
        let delta = ndc - self.drag.last_ndc;
        self.drag.last_ndc = ndc;
        self.drag.dragged = delta;
        match self.drag.gesture {
            Gesture::Idle => {}
            Gesture::Selecting => self.drag.tracked = self.ndc_to_world(ndc),
            Gesture::Panning => self.pan(delta),
            Gesture::Zooming => self.zoom(delta),
            Gesture::HistogramScaling => self.scale_histograms(delta),
        }
        self.drag.gesture
    }

    /// Finish the drag at `pos`. Returns the gesture that just ended.
    pub fn release(&mut self, pos: [f32; 2], viewport: Viewport) -> Gesture {
        let gesture = self.drag_to(pos, viewport);
        self.drag.gesture = Gesture::Idle;
        gesture
    }

    /// World-space selection rectangle as (min corner, max corner).
    pub fn selection_rect(&self) -> (Vec2, Vec2) {
        (
            self.drag.down.min(self.drag.tracked),
            self.drag.down.max(self.drag.tracked),
        )
    }

    /// Set the selection rectangle directly, e.g. from a scripted brush.
    pub fn set_selection_rect(&mut self, a: Vec2, b: Vec2) {
        self.drag.down = a;
        self.drag.tracked = b;
    }

    /// Forget the selection rectangle so it is not drawn again.
    pub fn clear_drag(&mut self) {
        self.drag.down = Vec2::ZERO;
        self.drag.tracked = Vec2::ZERO;
        self.drag.dragged = Vec2::ZERO;
    }

    /// Copy the transform of one axis from another plot.
    pub fn copy_axis_from(&mut self, other: &ViewTransform, from_axis: usize, to_axis: usize) {
        self.center[to_axis] = other.center[from_axis];
        self.scale[to_axis] = other.scale[from_axis];
    }
}

/// Edge-inclusive rectangle test; a rectangle with zero width or height
/// contains nothing.
pub fn rect_contains(rect: (Vec2, Vec2), p: Vec2) -> bool {
    let (lo, hi) = rect;
    if !(hi.x > lo.x && hi.y > lo.y) {
        return false;
    }
    p.x >= lo.x && p.x <= hi.x && p.y >= lo.y && p.y <= hi.y
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_reset_frames_world_range() {
        let mut vt = ViewTransform::default();
        vt.set_angle(30.0);
        vt.spin = true;
        vt.reset([(0.0, 4.0), (-1.0, 1.0), (-1.0, 1.0)]);
        assert!(approx(vt.scale().x, 0.4));
        assert!(approx(vt.scale().y, 0.8));
        assert!(approx(vt.center.x, 2.0));
        assert_eq!(vt.angle(), 0.0);
        assert!(!vt.spin);
        // Data edge lands at 0.8 in NDC.
        assert!(approx(vt.project(Vec3::new(4.0, 0.0, 0.0)).x, 0.8));
    }

    #[test]
    fn test_screen_world_round_trip() {
        let mut vt = ViewTransform::default();
        vt.reset([(-1.0, 1.0); 3]);
        let vp = Viewport::new(200.0, 200.0);
        let w = vt.screen_to_world([150.0, 50.0], vp);
        assert!(approx(w.x, 0.5 / 0.8));
        assert!(approx(w.y, 0.5 / 0.8));
        let back = vt.world_to_screen(w.extend(0.0), vp);
        assert!(approx(back[0], 150.0) && approx(back[1], 50.0));
    }

    #[test]
    fn test_pan_moves_center() {
        let mut vt = ViewTransform::default();
        vt.reset([(-1.0, 1.0); 3]);
        vt.pan(Vec2::new(0.4, 0.0));
        assert!(approx(vt.center.x, -0.5));
        assert!(approx(vt.center.y, 0.0));
    }

    #[test]
    fn test_zoom_keeps_focus_and_positive_scale() {
        let mut vt = ViewTransform::default();
        vt.reset([(-1.0, 1.0); 3]);
        vt.zoom_focus = Vec3::new(0.5, 0.5, 0.0);
        let before = vt.project(vt.zoom_focus);
        vt.zoom(Vec2::new(1.0, 0.5));
        assert!(approx(vt.scale().x, 1.6));
        assert!(approx(vt.scale().y, 1.2));
        let after = vt.project(vt.zoom_focus);
        assert!(approx(before.x, after.x) && approx(before.y, after.y));

        for _ in 0..50 {
            vt.zoom(Vec2::new(-5.0, -5.0));
        }
        assert!(vt.scale().min_element() > 0.0);
    }

    #[test]
    fn test_angle_wraps() {
        let mut vt = ViewTransform::default();
        vt.set_angle(370.0);
        assert!(approx(vt.angle(), 10.0));
        vt.set_angle(-90.0);
        assert!(approx(vt.angle(), 270.0));
        vt.set_angle(0.0);
        vt.spin = true;
        vt.spin_rate = 100.0;
        for _ in 0..4 {
            vt.advance_spin();
        }
        assert!(approx(vt.angle(), 40.0));
    }

    #[test]
    fn test_mouse_mapping() {
        let none = Modifiers::default();
        let ctrl = Modifiers { ctrl: true, ..none };
        assert_eq!(ViewTransform::gesture_for(PointerButton::Primary, none, false), Gesture::Selecting);
        assert_eq!(ViewTransform::gesture_for(PointerButton::Primary, ctrl, false), Gesture::Panning);
        assert_eq!(ViewTransform::gesture_for(PointerButton::Secondary, none, false), Gesture::Zooming);
        assert_eq!(
            ViewTransform::gesture_for(PointerButton::Primary, none, true),
            Gesture::HistogramScaling
        );
    }

    #[test]
    fn test_selection_drag_tracks_rectangle() {
        let mut vt = ViewTransform::default();
        vt.reset([(-1.0, 1.0); 3]);
        let vp = Viewport::new(100.0, 100.0);
        vt.press([50.0, 50.0], Gesture::Selecting, vp);
        vt.drag_to([90.0, 10.0], vp);
        let ended = vt.release([90.0, 10.0], vp);
        assert_eq!(ended, Gesture::Selecting);
        assert_eq!(vt.drag.gesture, Gesture::Idle);
        let (lo, hi) = vt.selection_rect();
        assert!(approx(lo.x, 0.0) && approx(hi.x, 1.0));
        assert!(rect_contains((lo, hi), Vec2::new(0.99, 0.5)));
        assert!(!rect_contains((lo, hi), Vec2::new(-0.01, 0.5)));
        vt.clear_drag();
        assert!(!rect_contains(vt.selection_rect(), Vec2::ZERO));
    }

    #[test]
    fn test_rotated_view_plane() {
        let mut vt = ViewTransform::default();
        vt.set_angle(90.0);
        let p = vt.view_plane(Vec3::new(1.0, 0.0, 0.0));
        // Rotating about +Y turns +X into -Z.
        assert!(approx(p.x, 0.0) && approx(p.z, -1.0));
    }
}
