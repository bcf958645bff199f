//! Signal arbitration between feature modules and the host's native input
//! handling.
//!
//! A feature module registers an [`ArbitrationRule`]. Once per tick each rule
//! is asked which channels and buttons it owns right now; the owned values
//! are zeroed in the logical snapshot so the host does not act on them
//! concurrently. The pre-arbitration values stay in the snapshot's raw
//! fields.
//!
//! A physical trigger reaches the host twice: as an analog scalar and as a
//! digital flag. Claiming the trigger channel clears both, otherwise the host
//! would still fire through the digital flag.

use bitflags::bitflags;
use tracing::trace;

use crate::controller::buttons::{Buttons, RawPadState, StickVector};
use crate::mapping::remap::RemapContext;

bitflags! {
    /// Analog channels a rule can claim, together with the digital flags the
    /// host derives from the same physical control.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Channels: u8 {
        const LEFT_STICK = 1 << 0;
        const RIGHT_STICK = 1 << 1;
        const LEFT_TRIGGER = 1 << 2;
        const RIGHT_TRIGGER = 1 << 3;
        const DPAD = 1 << 4;
    }
}

impl Channels {
    /// Digital flags tied to the claimed channels.
    pub fn derived_buttons(self) -> Buttons {
        let mut out = Buttons::empty();
        if self.contains(Channels::LEFT_STICK) {
            out |= Buttons::LEFT_STICK;
        }
        if self.contains(Channels::RIGHT_STICK) {
            out |= Buttons::RIGHT_STICK;
        }
        if self.contains(Channels::LEFT_TRIGGER) {
            out |= Buttons::LEFT_TRIGGER;
        }
        if self.contains(Channels::RIGHT_TRIGGER) {
            out |= Buttons::RIGHT_TRIGGER;
        }
        if self.contains(Channels::DPAD) {
            out |= Buttons::DPAD;
        }
        out
    }
}

/// What a rule owns for the current tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Claim {
    pub channels: Channels,
    /// Additional logical buttons, beyond the ones derived from `channels`.
    pub buttons: Buttons,
}

impl Claim {
    pub const NONE: Claim = Claim {
        channels: Channels::empty(),
        buttons: Buttons::empty(),
    };

    pub fn channels(channels: Channels) -> Self {
        Self {
            channels,
            buttons: Buttons::empty(),
        }
    }

    pub fn buttons(buttons: Buttons) -> Self {
        Self {
            channels: Channels::empty(),
            buttons,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty() && self.buttons.is_empty()
    }

    pub fn merge(self, other: Claim) -> Claim {
        Claim {
            channels: self.channels | other.channels,
            buttons: self.buttons | other.buttons,
        }
    }

    /// Every logical button cleared by this claim.
    pub fn cleared_buttons(&self) -> Buttons {
        self.buttons | self.channels.derived_buttons()
    }
}

/// Data a rule may inspect when deciding its claim.
#[derive(Debug, Clone, Copy)]
pub struct ArbitrationContext<'a> {
    pub tick: u64,
    pub context: RemapContext,
    pub raw: &'a RawPadState,
}

/// Per-tick ownership predicate registered by a feature module.
pub trait ArbitrationRule {
    fn name(&self) -> &str;

    fn claim(&self, ctx: &ArbitrationContext<'_>) -> Claim;
}

/// Adapts a closure into an [`ArbitrationRule`].
pub struct FnRule<F> {
    name: String,
    predicate: F,
}

impl<F> FnRule<F>
where
    F: Fn(&ArbitrationContext<'_>) -> Claim,
{
    pub fn new(name: impl Into<String>, predicate: F) -> Self {
        Self {
            name: name.into(),
            predicate,
        }
    }
}

impl<F> ArbitrationRule for FnRule<F>
where
    F: Fn(&ArbitrationContext<'_>) -> Claim,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn claim(&self, ctx: &ArbitrationContext<'_>) -> Claim {
        (self.predicate)(ctx)
    }
}

/// Logical values after arbitration.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ArbitratedSignals {
    pub buttons: Buttons,
    pub left_stick: StickVector,
    pub right_stick: StickVector,
    pub left_trigger: f32,
    pub right_trigger: f32,
}

/// Registry of rules plus the claim they produced for the current tick.
#[derive(Default)]
pub struct Arbiter {
    rules: Vec<Box<dyn ArbitrationRule>>,
    evaluated: Option<(u64, Claim)>,
}

impl Arbiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, rule: Box<dyn ArbitrationRule>) {
        trace!(rule = rule.name(), "registering arbitration rule");
        self.rules.push(rule);
        self.evaluated = None;
    }

    /// Removes every rule with the given name. Returns how many were removed.
    pub fn unregister(&mut self, name: &str) -> usize {
        let before = self.rules.len();
        self.rules.retain(|rule| rule.name() != name);
        self.evaluated = None;
        before - self.rules.len()
    }

    #[cfg(test)]
    fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    /// Combined claim for the tick. Rules run at most once per tick.
    pub fn claim_for(&mut self, ctx: &ArbitrationContext<'_>) -> Claim {
        if let Some((tick, claim)) = self.evaluated {
            if tick == ctx.tick {
                return claim;
            }
        }

        let mut combined = Claim::NONE;
        for rule in &self.rules {
            let claim = rule.claim(ctx);
            if !claim.is_empty() {
                trace!(rule = rule.name(), ?claim, "rule claimed signals");
            }
            combined = combined.merge(claim);
        }

        self.evaluated = Some((ctx.tick, combined));
        combined
    }

    /// Zeroes claimed values in a logical view of the tick.
    pub fn apply(claim: Claim, buttons: Buttons, raw: &RawPadState) -> ArbitratedSignals {
        let mut out = ArbitratedSignals {
            buttons: buttons - claim.cleared_buttons(),
            left_stick: raw.left_stick,
            right_stick: raw.right_stick,
            left_trigger: raw.left_trigger,
            right_trigger: raw.right_trigger,
        };

        if claim.channels.contains(Channels::LEFT_STICK) {
            out.left_stick = StickVector::ZERO;
        }
        if claim.channels.contains(Channels::RIGHT_STICK) {
            out.right_stick = StickVector::ZERO;
        }
        if claim.channels.contains(Channels::LEFT_TRIGGER) {
            out.left_trigger = 0.0;
        }
        if claim.channels.contains(Channels::RIGHT_TRIGGER) {
            out.right_trigger = 0.0;
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn raw() -> RawPadState {
        RawPadState {
            buttons: Buttons::LEFT_TRIGGER | Buttons::A | Buttons::DPAD_UP,
            left_stick: StickVector::new(0.5, -0.25),
            right_stick: StickVector::new(-1.0, 0.0),
            left_trigger: 0.9,
            right_trigger: 0.1,
        }
    }

    #[test]
    fn trigger_claim_clears_analog_and_digital() {
        let raw = raw();
        let claim = Claim::channels(Channels::LEFT_TRIGGER);
        let out = Arbiter::apply(claim, raw.buttons, &raw);

        assert_eq!(out.left_trigger, 0.0);
        assert!(!out.buttons.contains(Buttons::LEFT_TRIGGER));
        assert!(out.buttons.contains(Buttons::A));
        assert_eq!(out.right_trigger, 0.1);
        assert_eq!(out.left_stick, raw.left_stick);
    }

    #[test]
    fn stick_and_dpad_claims() {
        let raw = raw();
        let claim = Claim::channels(Channels::LEFT_STICK | Channels::DPAD).merge(Claim::buttons(Buttons::A));
        let out = Arbiter::apply(claim, raw.buttons, &raw);

        assert_eq!(out.left_stick, StickVector::ZERO);
        assert_eq!(out.right_stick, raw.right_stick);
        assert_eq!(out.buttons, Buttons::LEFT_TRIGGER);
    }

    #[test]
    fn rules_are_evaluated_once_per_tick() {
        let calls = Rc::new(Cell::new(0u32));
        let counter = Rc::clone(&calls);
        let mut arbiter = Arbiter::new();
        arbiter.register(Box::new(FnRule::new("counting", move |_ctx: &ArbitrationContext<'_>| {
            counter.set(counter.get() + 1);
            Claim::channels(Channels::RIGHT_STICK)
        })));

        let raw = raw();
        let ctx = ArbitrationContext {
            tick: 7,
            context: RemapContext::Gameplay,
            raw: &raw,
        };
        let first = arbiter.claim_for(&ctx);
        let second = arbiter.claim_for(&ctx);
        assert_eq!(first, second);
        assert_eq!(calls.get(), 1);

        let next = ArbitrationContext { tick: 8, ..ctx };
        arbiter.claim_for(&next);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn unregister_by_name() {
        let mut arbiter = Arbiter::new();
        arbiter.register(Box::new(FnRule::new("a", |_ctx: &ArbitrationContext<'_>| Claim::NONE)));
        arbiter.register(Box::new(FnRule::new("b", |_ctx: &ArbitrationContext<'_>| Claim::NONE)));
        assert_eq!(arbiter.unregister("a"), 1);
        assert_eq!(arbiter.rule_names(), vec!["b"]);
    }
}
