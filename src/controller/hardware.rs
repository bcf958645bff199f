//! Hardware input source contract.
//!
//! The frame cache polls its source exactly once per tick. A source that
//! returns `None` is treated as "no controller connected" and produces an
//! inert snapshot downstream.

use std::collections::VecDeque;

use tracing::trace;

use super::buttons::RawPadState;
use crate::mapping::remap::ControllerLayout;

/// Per-tick provider of raw controller state.
pub trait HardwareSource {
    /// Reads the current hardware state. `None` when no pad is connected.
    fn poll(&mut self) -> Option<RawPadState>;

    /// Short name used in log lines.
    fn name(&self) -> &str {
        "hardware"
    }

    /// Called when the configured layout changes. Sources that translate
    /// physical positions to host codes re-map from the next poll on.
    fn set_layout(&mut self, _layout: ControllerLayout) {}
}

/// Source used before a real one is attached. Always disconnected.
#[derive(Debug, Default, Clone, Copy)]
pub struct InertSource;

impl HardwareSource for InertSource {
    fn poll(&mut self) -> Option<RawPadState> {
        None
    }

    fn name(&self) -> &str {
        "inert"
    }
}

/// Replays a queue of states, one per poll, then holds the last one.
///
/// Used by the headless demo and by tests that need deterministic input.
#[derive(Debug, Default, Clone)]
pub struct ScriptedSource {
    frames: VecDeque<Option<RawPadState>>,
    last: Option<RawPadState>,
    polls: u64,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues one connected frame.
    pub fn push(&mut self, state: RawPadState) -> &mut Self {
        self.frames.push_back(Some(state));
        self
    }

    /// Queues `count` copies of the same frame.
    pub fn push_repeated(&mut self, state: RawPadState, count: usize) -> &mut Self {
        for _ in 0..count {
            self.frames.push_back(Some(state));
        }
        self
    }

    /// Queues a frame with no controller connected.
    pub fn push_disconnected(&mut self) -> &mut Self {
        self.frames.push_back(None);
        self
    }

    /// Number of times the source has been polled.
    pub fn polls(&self) -> u64 {
        self.polls
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl HardwareSource for ScriptedSource {
    fn poll(&mut self) -> Option<RawPadState> {
        self.polls += 1;
        if let Some(next) = self.frames.pop_front() {
            self.last = next;
        }
        trace!(polls = self.polls, connected = self.last.is_some(), "scripted poll");
        self.last
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
