//! Virtual cursor driven by a stick.
//!
//! The cursor lives in viewport-local float pixels. Each active frame the
//! driving stick moves it with a deadzone and a linear acceleration curve,
//! and the position is clamped to the viewport. Near an edge the camera pans
//! and the cursor is moved back by the applied pan, so its world position
//! (`position + viewport origin`) stays put and panning stops once the stick
//! is released.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::controller::buttons::{JoystickType, StickVector};
use crate::host::{Point, PointerHost, Size};

/// Cursor tuning, read from the `[cursor]` config table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CursorSettings {
    /// Stick that drives the cursor.
    pub stick: JoystickType,
    /// Per-axis magnitude below which the stick is ignored.
    pub deadzone: f32,
    /// Pixels per tick right outside the deadzone.
    pub min_speed: f32,
    /// Pixels per tick at full deflection.
    pub max_speed: f32,
    /// Distance from a viewport edge that triggers panning.
    pub edge_margin: f32,
    /// Camera pan per tick while inside the edge margin.
    pub pan_step: i32,
}

impl Default for CursorSettings {
    fn default() -> Self {
        Self {
            stick: JoystickType::Left,
            deadzone: 0.2,
            min_speed: 2.0,
            max_speed: 14.0,
            edge_margin: 32.0,
            pan_step: 16,
        }
    }
}

impl CursorSettings {
    /// Signed pixel delta for one stick axis.
    pub fn axis_delta(&self, value: f32) -> f32 {
        let magnitude = value.abs();
        if magnitude <= self.deadzone || self.deadzone >= 1.0 {
            return 0.0;
        }
        let t = ((magnitude - self.deadzone) / (1.0 - self.deadzone)).min(1.0);
        let speed = self.min_speed + (self.max_speed - self.min_speed) * t;
        value.signum() * speed
    }

    /// Cursor delta for a stick vector. Positive stick `y` moves up.
    pub fn stick_delta(&self, stick: StickVector) -> (f32, f32) {
        (self.axis_delta(stick.x), -self.axis_delta(stick.y))
    }
}

/// Cursor data exposed for overlay rendering.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CursorState {
    pub position: Point,
    pub active: bool,
    pub centered: bool,
}

/// Result of one cursor frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CursorUpdate {
    /// The cursor moved in world space this frame.
    pub moved: bool,
    /// Camera pan applied by the host this frame.
    pub panned: (i32, i32),
}

#[derive(Debug, Clone)]
pub struct VirtualCursor {
    settings: CursorSettings,
    state: CursorState,
}

impl VirtualCursor {
    pub fn new(settings: CursorSettings) -> Self {
        Self {
            settings,
            state: CursorState::default(),
        }
    }

    pub fn settings(&self) -> &CursorSettings {
        &self.settings
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    pub fn position(&self) -> Point {
        self.state.position
    }

    pub fn is_active(&self) -> bool {
        self.state.active
    }

    pub fn activate(&mut self) {
        if !self.state.active {
            debug!("virtual cursor activated");
            self.state.active = true;
        }
    }

    pub fn deactivate(&mut self) {
        if self.state.active {
            debug!("virtual cursor deactivated");
            self.state.active = false;
        }
    }

    /// Advances one active frame. Inactive cursors ignore input.
    pub fn update(&mut self, stick: StickVector, host: &mut dyn PointerHost) -> CursorUpdate {
        if !self.state.active {
            return CursorUpdate::default();
        }

        let viewport = host.viewport_size();
        if !self.state.centered {
            self.state.position = Point::new(
                (viewport.width / 2.0).floor(),
                (viewport.height / 2.0).floor(),
            );
            self.state.centered = true;
            debug!(x = self.state.position.x, y = self.state.position.y, "cursor centered");
        }

        let before = self.state.position;
        let (dx, dy) = self.settings.stick_delta(stick);
        let moved_to = clamp_to(
            Point::new(before.x + dx, before.y + dy),
            viewport,
        );
        self.state.position = moved_to;

        let panned = self.edge_pan(viewport, host);
        if panned != (0, 0) {
            trace!(?panned, "edge pan");
        }

        CursorUpdate {
            moved: moved_to != before,
            panned,
        }
    }

    fn edge_pan(&mut self, viewport: Size, host: &mut dyn PointerHost) -> (i32, i32) {
        let margin = self.settings.edge_margin;
        let step = self.settings.pan_step;
        let pos = self.state.position;

        let want_x = if pos.x < margin {
            -step
        } else if pos.x > viewport.width - 1.0 - margin {
            step
        } else {
            0
        };
        let want_y = if pos.y < margin {
            -step
        } else if pos.y > viewport.height - 1.0 - margin {
            step
        } else {
            0
        };
        if want_x == 0 && want_y == 0 {
            return (0, 0);
        }

        let (applied_x, applied_y) = host.pan_viewport(want_x, want_y);
        self.state.position = clamp_to(
            Point::new(pos.x - applied_x as f32, pos.y - applied_y as f32),
            viewport,
        );
        (applied_x, applied_y)
    }

    /// Pointer position the host should see while the cursor is active.
    ///
    /// Host code anchors previews at "pointer minus half extent" in scaled
    /// units, so the half extent is subtracted before scaling.
    pub fn pointer_override(&self, extent: Option<Size>, display_scale: f32) -> Option<Point> {
        if !self.state.active {
            return None;
        }
        let half = extent.unwrap_or_default();
        Some(Point::new(
            (self.state.position.x - half.width / 2.0) * display_scale,
            (self.state.position.y - half.height / 2.0) * display_scale,
        ))
    }
}

fn clamp_to(point: Point, viewport: Size) -> Point {
    let max_x = (viewport.width - 1.0).max(0.0);
    let max_y = (viewport.height - 1.0).max(0.0);
    Point::new(point.x.clamp(0.0, max_x), point.y.clamp(0.0, max_y))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Camera-only host with optional world bounds for the origin.
    pub(crate) struct TestViewport {
        pub size: Size,
        pub origin: (i32, i32),
        pub origin_max: (i32, i32),
        pub scale: f32,
    }

    impl TestViewport {
        pub(crate) fn new(width: f32, height: f32) -> Self {
            Self {
                size: Size::new(width, height),
                origin: (0, 0),
                origin_max: (i32::MAX, i32::MAX),
                scale: 1.0,
            }
        }
    }

    impl PointerHost for TestViewport {
        fn hover_pointer(&mut self, _at: Point) {}

        fn pan_viewport(&mut self, dx: i32, dy: i32) -> (i32, i32) {
            let x = (self.origin.0.saturating_add(dx)).clamp(0, self.origin_max.0);
            let y = (self.origin.1.saturating_add(dy)).clamp(0, self.origin_max.1);
            let applied = (x - self.origin.0, y - self.origin.1);
            self.origin = (x, y);
            applied
        }

        fn viewport_origin(&self) -> (i32, i32) {
            self.origin
        }

        fn viewport_size(&self) -> Size {
            self.size
        }

        fn display_scale(&self) -> f32 {
            self.scale
        }

        fn preview_extent(&self) -> Option<Size> {
            None
        }
    }

    fn world(cursor: &VirtualCursor, host: &TestViewport) -> (f32, f32) {
        (
            cursor.position().x + host.origin.0 as f32,
            cursor.position().y + host.origin.1 as f32,
        )
    }

    /// World position the cursor reaches after the stick move alone.
    fn world_after_move(cursor: &VirtualCursor, host: &TestViewport, stick: StickVector) -> (f32, f32) {
        let (dx, dy) = cursor.settings().stick_delta(stick);
        let p = clamp_to(
            Point::new(cursor.position().x + dx, cursor.position().y + dy),
            host.size,
        );
        (p.x + host.origin.0 as f32, p.y + host.origin.1 as f32)
    }

    #[test]
    fn axis_delta_respects_deadzone_and_curve() {
        let settings = CursorSettings::default();
        assert_eq!(settings.axis_delta(0.1), 0.0);
        assert_eq!(settings.axis_delta(-0.2), 0.0);
        assert_eq!(settings.axis_delta(1.0), settings.max_speed);
        assert_eq!(settings.axis_delta(-1.0), -settings.max_speed);

        let mid = settings.axis_delta(0.6);
        let expected = settings.min_speed + (settings.max_speed - settings.min_speed) * 0.5;
        assert!((mid - expected).abs() < 1e-4);
    }

    #[test]
    fn positive_stick_y_moves_cursor_up() {
        let settings = CursorSettings::default();
        let (dx, dy) = settings.stick_delta(StickVector::new(0.0, 1.0));
        assert_eq!(dx, 0.0);
        assert!(dy < 0.0);
    }

    #[test]
    fn first_active_frame_centers() {
        let mut host = TestViewport::new(800.0, 600.0);
        let mut cursor = VirtualCursor::new(CursorSettings::default());

        assert_eq!(cursor.update(StickVector::new(1.0, 0.0), &mut host), CursorUpdate::default());
        assert!(!cursor.state().centered);

        cursor.activate();
        let update = cursor.update(StickVector::ZERO, &mut host);
        assert!(!update.moved);
        assert!(cursor.state().centered);
        assert_eq!(cursor.position(), Point::new(400.0, 300.0));
    }

    #[test]
    fn cursor_stays_clamped_under_any_input() {
        let mut host = TestViewport::new(320.0, 240.0);
        host.origin_max = (0, 0); // camera cannot pan: pure clamping
        let mut cursor = VirtualCursor::new(CursorSettings::default());
        cursor.activate();

        let inputs = [
            StickVector::new(1.0, 1.0),
            StickVector::new(-1.0, -1.0),
            StickVector::new(0.9, -0.7),
            StickVector::new(-0.3, 1.0),
        ];
        for step in 0..400 {
            let stick = inputs[(step / 37) % inputs.len()];
            cursor.update(stick, &mut host);
            let p = cursor.position();
            assert!((0.0..=319.0).contains(&p.x), "x out of range: {}", p.x);
            assert!((0.0..=239.0).contains(&p.y), "y out of range: {}", p.y);
        }
    }

    #[test]
    fn edge_pan_preserves_world_position() {
        let mut host = TestViewport::new(320.0, 240.0);
        let mut cursor = VirtualCursor::new(CursorSettings::default());
        cursor.activate();
        cursor.update(StickVector::ZERO, &mut host);

        let mut panned_any = false;
        for _ in 0..200 {
            let before_pan = world_after_move(&cursor, &host, StickVector::new(1.0, 0.0));
            let update = cursor.update(StickVector::new(1.0, 0.0), &mut host);
            if update.panned != (0, 0) {
                panned_any = true;
                let after = world(&cursor, &host);
                assert!((after.0 - before_pan.0).abs() <= 1.0);
                assert!((after.1 - before_pan.1).abs() <= 1.0);
            }
        }
        assert!(panned_any);
    }

    #[test]
    fn clamped_pan_is_compensated_by_the_applied_amount() {
        let mut host = TestViewport::new(320.0, 240.0);
        host.origin_max = (20, 0);
        let settings = CursorSettings::default();
        let mut cursor = VirtualCursor::new(settings);
        cursor.activate();
        cursor.update(StickVector::ZERO, &mut host);

        let right = StickVector::new(1.0, 0.0);
        let mut short_pans = 0;
        for _ in 0..60 {
            let expected = world_after_move(&cursor, &host, right);
            let update = cursor.update(right, &mut host);
            if update.panned.0 != 0 && update.panned.0 != settings.pan_step {
                short_pans += 1;
            }
            let after = world(&cursor, &host);
            assert!((after.0 - expected.0).abs() <= 1.0, "x {} vs {}", after.0, expected.0);
            assert!((after.1 - expected.1).abs() <= 1.0, "y {} vs {}", after.1, expected.1);
        }
        assert_eq!(short_pans, 1);
        assert_eq!(host.origin, (20, 0));
        assert_eq!(cursor.position().x, 319.0);
    }

    #[test]
    fn panning_stops_when_stick_is_released() {
        let mut host = TestViewport::new(320.0, 240.0);
        let mut cursor = VirtualCursor::new(CursorSettings::default());
        cursor.activate();
        for _ in 0..60 {
            cursor.update(StickVector::new(1.0, 0.0), &mut host);
        }
        let mut idle_pans = 0;
        for _ in 0..60 {
            if cursor.update(StickVector::ZERO, &mut host).panned != (0, 0) {
                idle_pans += 1;
            }
        }
        // Compensation walks the cursor out of the margin in a few frames.
        assert!(idle_pans <= 3, "kept panning for {idle_pans} idle frames");
    }

    #[test]
    fn pointer_override_subtracts_half_extent_then_scales() {
        let mut host = TestViewport::new(800.0, 600.0);
        let mut cursor = VirtualCursor::new(CursorSettings::default());
        assert_eq!(cursor.pointer_override(None, 1.0), None);

        cursor.activate();
        cursor.update(StickVector::ZERO, &mut host);
        let p = cursor.pointer_override(Some(Size::new(64.0, 32.0)), 2.0);
        assert_eq!(p, Some(Point::new((400.0 - 32.0) * 2.0, (300.0 - 16.0) * 2.0)));
    }
}
