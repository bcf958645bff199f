//! Second-press-within-a-window detection, counted in host ticks.

use tracing::trace;

/// Result of feeding a press into a [`DoublePressGate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateResult {
    /// First press; the window is now open.
    Armed,
    /// Second press inside the window.
    Confirmed,
}

/// Recognises two presses of the same button within a tick window.
///
/// Time is measured in ticks rather than wall-clock time so behaviour is
/// identical under test and at any frame rate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoublePressGate {
    window_ticks: u64,
    armed_at: Option<u64>,
}

impl DoublePressGate {
    pub fn new(window_ticks: u64) -> Self {
        Self {
            window_ticks,
            armed_at: None,
        }
    }

    pub fn window_ticks(&self) -> u64 {
        self.window_ticks
    }

    pub fn is_armed(&self) -> bool {
        self.armed_at.is_some()
    }

    pub fn press(&mut self, tick: u64) -> GateResult {
        self.expire(tick);
        match self.armed_at.take() {
            Some(first) => {
                trace!(first, tick, "double press confirmed");
                GateResult::Confirmed
            }
            None => {
                self.armed_at = Some(tick);
                GateResult::Armed
            }
        }
    }

    /// Closes the window once it has run out.
    pub fn expire(&mut self, tick: u64) {
        if let Some(first) = self.armed_at {
            if tick.saturating_sub(first) > self.window_ticks {
                self.armed_at = None;
            }
        }
    }

    pub fn reset(&mut self) {
        self.armed_at = None;
    }
}
