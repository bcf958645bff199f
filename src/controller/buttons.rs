//! Digital button set and analog value types shared by every stage of the
//! input pipeline.
//!
//! Button bits are named after the host's native button codes, not after
//! physical positions. Where a code sits on the pad depends on the
//! [`ControllerLayout`](crate::mapping::remap::ControllerLayout).

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Set of digital buttons, one bit per host button code.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Buttons: u32 {
        /// Host confirm code.
        const A = 1 << 0;
        /// Host cancel code.
        const B = 1 << 1;
        const X = 1 << 2;
        const Y = 1 << 3;
        const START = 1 << 4;
        const SELECT = 1 << 5;
        const LEFT_BUMPER = 1 << 6;
        const RIGHT_BUMPER = 1 << 7;
        /// Digital flag the host derives from the left analog trigger.
        const LEFT_TRIGGER = 1 << 8;
        /// Digital flag the host derives from the right analog trigger.
        const RIGHT_TRIGGER = 1 << 9;
        const LEFT_STICK = 1 << 10;
        const RIGHT_STICK = 1 << 11;
        const DPAD_UP = 1 << 12;
        const DPAD_DOWN = 1 << 13;
        const DPAD_LEFT = 1 << 14;
        const DPAD_RIGHT = 1 << 15;

        const DPAD = Self::DPAD_UP.bits()
            | Self::DPAD_DOWN.bits()
            | Self::DPAD_LEFT.bits()
            | Self::DPAD_RIGHT.bits();
    }
}

impl Buttons {
    /// Logical confirm action.
    pub const CONFIRM: Buttons = Buttons::A;
    /// Logical cancel action.
    pub const CANCEL: Buttons = Buttons::B;

    /// Exchanges the bits of `a` and `b` (each a single button).
    pub fn swapped(self, a: Buttons, b: Buttons) -> Buttons {
        let has_a = self.contains(a);
        let has_b = self.contains(b);
        let mut out = self - a - b;
        out.set(b, has_a);
        out.set(a, has_b);
        out
    }
}

/// Stick deflection in `[-1.0, 1.0]` per axis. Positive `y` is up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StickVector {
    pub x: f32,
    pub y: f32,
}

impl StickVector {
    pub const ZERO: StickVector = StickVector { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Stick selector used by configuration and by the cursor engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum JoystickType {
    #[default]
    Left,
    Right,
}

/// Everything the hardware reports for one tick, before any processing.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RawPadState {
    pub buttons: Buttons,
    pub left_stick: StickVector,
    pub right_stick: StickVector,
    pub left_trigger: f32,
    pub right_trigger: f32,
}

impl RawPadState {
    pub fn stick(&self, stick: JoystickType) -> StickVector {
        match stick {
            JoystickType::Left => self.left_stick,
            JoystickType::Right => self.right_stick,
        }
    }
}
