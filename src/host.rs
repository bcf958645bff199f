//! Typed contracts with the host application.
//!
//! The host only accepts simulated pointer input. The facade implementation
//! (outside this crate) turns each placement call into the pointer
//! press/hold/release sequence the host understands and absorbs differences
//! between host builds. Everything here is consumed by the screen layer; no
//! host internals leak through.

use std::fmt;

use crate::error::HostError;

/// Position in viewport-local pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Width/height in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Opaque host entity handle (building, object, furniture).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A selected entity together with its footprint.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EntityRef {
    pub id: EntityId,
    pub extent: Size,
}

/// Pointer, camera and scale access.
pub trait PointerHost {
    /// Moves the host's pointer to `at` without pressing, so hover feedback
    /// follows the cursor.
    fn hover_pointer(&mut self, at: Point);

    /// Pans the camera by whole pixels and returns the pan actually applied
    /// (the host may clamp at map edges).
    fn pan_viewport(&mut self, dx: i32, dy: i32) -> (i32, i32);

    /// Current viewport origin in world pixels.
    fn viewport_origin(&self) -> (i32, i32);

    fn viewport_size(&self) -> Size;

    /// Current zoom/UI scale factor.
    fn display_scale(&self) -> f32;

    /// Footprint of whatever preview the host is currently drawing under the
    /// pointer, if any.
    fn preview_extent(&self) -> Option<Size>;
}

/// Discrete placement actions. Each call is one host-visible action.
pub trait PlacementHost {
    /// Tries to build the current blueprint at `at`.
    fn attempt_placement(&mut self, at: Point) -> Result<(), HostError>;

    /// Picks up the entity under `at` for moving.
    fn select_entity_at(&mut self, at: Point) -> Option<EntityRef>;

    /// Entity under `at`, without side effects.
    fn entity_at(&self, at: Point) -> Option<EntityRef>;

    fn entity_exists(&self, id: EntityId) -> bool;

    /// Moves the held preview to `at` without committing.
    fn reanchor_preview(&mut self, id: EntityId, at: Point) -> Result<(), HostError>;

    fn confirm_move(&mut self, id: EntityId, at: Point) -> Result<(), HostError>;

    fn confirm_demolish(&mut self, id: EntityId) -> Result<(), HostError>;

    /// Leaves the placement screen.
    fn exit_placement(&mut self);
}

/// Everything the screen layer needs from the host.
pub trait HostFacade: PointerHost + PlacementHost {}

impl<T: PointerHost + PlacementHost> HostFacade for T {}
