//! Controller subsystem: raw hardware input and the per-tick snapshot cache.
//!
//! 1. [`hardware`] - Source contract, inert and scripted sources
//! 2. [`gilrs_source`] - gilrs-backed source for real gamepads
//! 3. [`frame_cache`] - One processed snapshot per tick
//!
//! # Architecture
//!
//! ```text
//! Gamepad ──► GilrsSource ──► FrameCache ──► GamepadSnapshot
//!             (raw state)     (remap, arbitration, suppression)
//! ```

pub mod buttons;
pub mod frame_cache;
pub mod gilrs_source;
pub mod hardware;

pub use buttons::{Buttons, JoystickType, RawPadState, StickVector};
pub use frame_cache::{FrameCache, GamepadSnapshot, RawAxes};
pub use gilrs_source::GilrsSource;
pub use hardware::{HardwareSource, InertSource, ScriptedSource};
