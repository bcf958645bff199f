//! Hardware source backed by gilrs.
//!
//! Follows the first connected gamepad, re-selects on connect/disconnect and
//! folds the event stream into one [`RawPadState`] per poll.

use chrono::{DateTime, Local};
use gilrs::{Axis, Button, Event, EventType, GamepadId, Gilrs};
use tracing::{debug, error, info, warn};

use crate::controller::buttons::{Buttons, RawPadState};
use crate::controller::hardware::HardwareSource;
use crate::error::SourceError;
use crate::mapping::remap::{ControllerLayout, FacePosition};

/// Analog value above which a trigger also reports its digital flag.
const TRIGGER_DIGITAL_THRESHOLD: f32 = 0.5;

/// Hardware source backed by gilrs.
///
/// Drains the gilrs event queue on every poll and folds the events into a
/// held [`RawPadState`]. Face buttons are translated from gilrs' positional
/// names to host codes through the configured layout.
pub struct GilrsSource {
    gilrs: Gilrs,
    active_gamepad: Option<GamepadId>,
    layout: ControllerLayout,
    state: RawPadState,

    // Stats
    events_seen: u64,
    last_stats: DateTime<Local>,
}

impl GilrsSource {
    pub fn create(layout: ControllerLayout) -> Result<Self, SourceError> {
        info!("Initializing gilrs controller interface");
        let gilrs = match Gilrs::new() {
            Ok(g) => {
                info!("Successfully initialized gilrs");
                g
            }
            Err(e) => {
                error!("Failed to initialize gilrs: {}", e);
                return Err(SourceError::Initialization(e.to_string()));
            }
        };

        let mut source = Self {
            gilrs,
            active_gamepad: None,
            layout,
            state: RawPadState::default(),
            events_seen: 0,
            last_stats: Local::now(),
        };
        source.select_gamepad();
        Ok(source)
    }

    pub fn active_gamepad(&self) -> Option<GamepadId> {
        self.active_gamepad
    }

    fn select_gamepad(&mut self) {
        let gamepads: Vec<_> = self
            .gilrs
            .gamepads()
            .map(|(id, gamepad)| (id, gamepad.name().to_string()))
            .collect();

        if gamepads.is_empty() {
            warn!("No gamepad connected, continuing with inert input");
            self.active_gamepad = None;
            return;
        }

        info!("Found {} gamepads:", gamepads.len());
        for (idx, (id, name)) in gamepads.iter().enumerate() {
            info!("  [{}] ID: {}, Name: {}", idx, id, name);
        }
        let (id, name) = &gamepads[0];
        self.active_gamepad = Some(*id);
        info!("Selected gamepad: {} ({})", name, id);
    }

    fn map_button(&self, button: Button) -> Option<Buttons> {
        let code = match button {
            Button::South => self.layout.code_at(FacePosition::South),
            Button::East => self.layout.code_at(FacePosition::East),
            Button::West => self.layout.code_at(FacePosition::West),
            Button::North => self.layout.code_at(FacePosition::North),
            Button::Start => Buttons::START,
            Button::Select => Buttons::SELECT,
            Button::LeftTrigger => Buttons::LEFT_BUMPER,
            Button::RightTrigger => Buttons::RIGHT_BUMPER,
            Button::LeftTrigger2 => Buttons::LEFT_TRIGGER,
            Button::RightTrigger2 => Buttons::RIGHT_TRIGGER,
            Button::LeftThumb => Buttons::LEFT_STICK,
            Button::RightThumb => Buttons::RIGHT_STICK,
            Button::DPadUp => Buttons::DPAD_UP,
            Button::DPadDown => Buttons::DPAD_DOWN,
            Button::DPadLeft => Buttons::DPAD_LEFT,
            Button::DPadRight => Buttons::DPAD_RIGHT,
            _ => return None,
        };
        Some(code)
    }

    fn set_trigger(&mut self, flag: Buttons, value: f32) {
        let value = value.clamp(0.0, 1.0);
        if flag == Buttons::LEFT_TRIGGER {
            self.state.left_trigger = value;
        } else {
            self.state.right_trigger = value;
        }
        self.state
            .buttons
            .set(flag, value > TRIGGER_DIGITAL_THRESHOLD);
    }

    fn apply_event(&mut self, id: GamepadId, event: EventType) {
        match event {
            EventType::AxisChanged(axis, value, _) => match axis {
                Axis::LeftStickX => self.state.left_stick.x = value,
                Axis::LeftStickY => self.state.left_stick.y = value,
                Axis::RightStickX => self.state.right_stick.x = value,
                Axis::RightStickY => self.state.right_stick.y = value,
                Axis::LeftZ => self.set_trigger(Buttons::LEFT_TRIGGER, value),
                Axis::RightZ => self.set_trigger(Buttons::RIGHT_TRIGGER, value),
                _ => debug!("Ignoring unsupported axis: {:?}", axis),
            },
            EventType::ButtonChanged(button @ (Button::LeftTrigger2 | Button::RightTrigger2), value, _) => {
                let flag = if button == Button::LeftTrigger2 {
                    Buttons::LEFT_TRIGGER
                } else {
                    Buttons::RIGHT_TRIGGER
                };
                self.set_trigger(flag, value);
            }
            EventType::ButtonPressed(button, _) => {
                if let Some(code) = self.map_button(button) {
                    self.state.buttons.insert(code);
                }
            }
            EventType::ButtonReleased(button, _) => {
                if let Some(code) = self.map_button(button) {
                    self.state.buttons.remove(code);
                }
            }
            EventType::Connected => {
                info!("Controller connected event detected");
                if self.active_gamepad.is_none() {
                    self.select_gamepad();
                }
            }
            EventType::Disconnected => {
                warn!("Controller {} disconnected", id);
                if self.active_gamepad == Some(id) {
                    self.state = RawPadState::default();
                    self.select_gamepad();
                }
            }
            _ => {}
        }
    }

    fn log_stats(&mut self) {
        let now = Local::now();
        if now - self.last_stats > chrono::Duration::seconds(30) {
            debug!(
                "gilrs source stats: {} events since {}",
                self.events_seen,
                self.last_stats.format("%H:%M:%S")
            );
            self.events_seen = 0;
            self.last_stats = now;
        }
    }
}

impl HardwareSource for GilrsSource {
    fn poll(&mut self) -> Option<RawPadState> {
        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            self.events_seen += 1;
            let connection_change = matches!(event, EventType::Connected | EventType::Disconnected);
            if !connection_change && self.active_gamepad.is_some_and(|active| active != id) {
                continue;
            }
            self.apply_event(id, event);
        }
        self.log_stats();

        let id = self.active_gamepad?;
        if self.gilrs.connected_gamepad(id).is_none() {
            return None;
        }
        Some(self.state)
    }

    fn name(&self) -> &str {
        "gilrs"
    }

    fn set_layout(&mut self, layout: ControllerLayout) {
        if self.layout != layout {
            info!("Switching gilrs source layout to {}", layout);
            self.layout = layout;
            // Held face buttons were recorded with the old codes.
            self.state.buttons = Buttons::empty();
        }
    }
}
