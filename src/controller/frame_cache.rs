//! Frame state cache: one authoritative processed snapshot per tick.
//!
//! Several independent call sites query controller state inside the same
//! tick (global remap consumer, screen-local cursor code, mode handlers).
//! They must all agree, so the first query of a tick does the work and every
//! later query returns the memoized result.
//!
//! # Pipeline
//!
//! ```text
//! HardwareSource ──► edge baseline ──► Remap ──► Arbitration ──► Suppression ──► memo
//!   (poll once)       raw axes kept    (pure)    (rules once)    (flags)
//! ```
//!
//! Edges are taken on the physical buttons against the previous polled tick,
//! then mapped through the current swap table and limited to the buttons
//! still pressed after arbitration and suppression. Neither a remap change
//! nor a dropped claim can fake a press.
//!
//! # Invalidation
//!
//! Anything that changes the outcome after the memo was filled (a new
//! suppression flag, a context or profile change) drops the memo, and the
//! next query recomputes from the same polled hardware state. The hardware
//! is never polled twice in one tick.

use std::cell::{Cell, RefCell};

use tracing::{debug, info, trace};

use crate::controller::buttons::{Buttons, JoystickType, RawPadState, StickVector};
use crate::controller::hardware::{HardwareSource, InertSource};
use crate::mapping::arbitration::{Arbiter, ArbitrationContext, ArbitrationRule, Claim};
use crate::mapping::remap::{RemapContext, RemapProfile, SwapTable};
use crate::mapping::suppression::SuppressionRegistry;

/// Stick and trigger values exactly as the hardware reported them.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RawAxes {
    pub left_stick: StickVector,
    pub right_stick: StickVector,
    pub left_trigger: f32,
    pub right_trigger: f32,
}

impl RawAxes {
    pub fn stick(&self, stick: JoystickType) -> StickVector {
        match stick {
            JoystickType::Left => self.left_stick,
            JoystickType::Right => self.right_stick,
        }
    }
}

impl From<&RawPadState> for RawAxes {
    fn from(raw: &RawPadState) -> Self {
        Self {
            left_stick: raw.left_stick,
            right_stick: raw.right_stick,
            left_trigger: raw.left_trigger,
            right_trigger: raw.right_trigger,
        }
    }
}

/// Processed controller state for one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GamepadSnapshot {
    pub tick: u64,
    pub connected: bool,
    /// Buttons as reported by the hardware, before remapping.
    pub physical: Buttons,
    /// Logical buttons after remap, arbitration and suppression.
    pub buttons: Buttons,
    /// Logical buttons whose physical button went down since the previous tick.
    pub newly_pressed: Buttons,
    pub left_stick: StickVector,
    pub right_stick: StickVector,
    pub left_trigger: f32,
    pub right_trigger: f32,
    /// Pre-arbitration analog values.
    pub raw: RawAxes,
}

impl GamepadSnapshot {
    /// All-released snapshot used when no controller is available.
    pub fn inert(tick: u64) -> Self {
        Self {
            tick,
            ..Default::default()
        }
    }

    pub fn is_pressed(&self, button: Buttons) -> bool {
        self.buttons.contains(button)
    }

    pub fn just_pressed(&self, button: Buttons) -> bool {
        self.newly_pressed.contains(button)
    }

    /// One-tick edge of the menu/start button.
    pub fn menu_just_pressed(&self) -> bool {
        self.just_pressed(Buttons::START)
    }
}

/// Per-tick memoizing front of the input pipeline.
///
/// All methods take `&self` so the cache can be shared as `Rc<FrameCache>`
/// by every consumer inside the host's single-threaded frame callbacks.
pub struct FrameCache {
    source: RefCell<Box<dyn HardwareSource>>,
    arbiter: RefCell<Arbiter>,
    suppression: RefCell<SuppressionRegistry>,
    profile: Cell<RemapProfile>,
    context: Cell<RemapContext>,

    tick: Cell<u64>,
    polled: Cell<Option<Option<RawPadState>>>,
    memo: Cell<Option<GamepadSnapshot>>,
    in_progress: Cell<Option<GamepadSnapshot>>,
    computing: Cell<bool>,
    tick_physical: Cell<Option<Buttons>>,
    previous_physical: Cell<Buttons>,
    computations: Cell<u64>,
}

impl Default for FrameCache {
    fn default() -> Self {
        Self::new(Box::new(InertSource), RemapProfile::default())
    }
}

impl FrameCache {
    pub fn new(mut source: Box<dyn HardwareSource>, profile: RemapProfile) -> Self {
        source.set_layout(profile.layout);
        info!(
            "Creating frame cache for source `{}` with profile {:?}",
            source.name(),
            profile
        );
        Self {
            source: RefCell::new(source),
            arbiter: RefCell::new(Arbiter::new()),
            suppression: RefCell::new(SuppressionRegistry::new()),
            profile: Cell::new(profile),
            context: Cell::new(RemapContext::default()),
            tick: Cell::new(0),
            polled: Cell::new(None),
            memo: Cell::new(None),
            in_progress: Cell::new(None),
            computing: Cell::new(false),
            tick_physical: Cell::new(None),
            previous_physical: Cell::new(Buttons::empty()),
            computations: Cell::new(0),
        }
    }

    /// Swaps the hardware source. The current tick is recomputed on next query.
    pub fn replace_source(&self, mut source: Box<dyn HardwareSource>) {
        match self.source.try_borrow_mut() {
            Ok(mut slot) => {
                info!("Attaching hardware source `{}`", source.name());
                source.set_layout(self.profile.get().layout);
                *slot = source;
                self.polled.set(None);
                self.invalidate();
            }
            Err(_) => debug!("Source replacement ignored while the source is being polled"),
        }
    }

    /// Starts a new tick. Calling it again with the current tick is a no-op.
    pub fn begin_tick(&self, tick: u64) {
        if tick == self.tick.get() && self.polled.get().is_some() {
            return;
        }
        if let Some(physical) = self.tick_physical.take() {
            self.previous_physical.set(physical);
        }
        self.tick.set(tick);
        self.polled.set(None);
        self.memo.set(None);
        trace!(tick, "frame cache tick started");
    }

    /// Returns the tick's snapshot, computing it on the first call.
    pub fn query(&self) -> GamepadSnapshot {
        if self.computing.get() {
            trace!("nested query during computation, returning in-progress snapshot");
            return self
                .in_progress
                .get()
                .unwrap_or_else(|| GamepadSnapshot::inert(self.tick.get()));
        }

        if let Some(snapshot) = self.memo.get() {
            return snapshot;
        }

        self.compute()
    }

    /// Forces recomputation on the next query within the current tick.
    pub fn invalidate(&self) {
        if self.memo.take().is_some() {
            trace!(tick = self.tick.get(), "frame cache invalidated");
        }
    }

    /// Marks `buttons` released until physically released, and invalidates an
    /// already populated snapshot so the host never sees the stale press.
    pub fn suppress(&self, buttons: Buttons) {
        self.suppression.borrow_mut().suppress(buttons, self.swap_table());
        self.invalidate();
    }

    pub fn release_suppression(&self, buttons: Buttons) {
        self.suppression.borrow_mut().release(buttons, self.swap_table());
        self.invalidate();
    }

    /// Whether the logical `button` is held released under the current remap.
    pub fn is_suppressed(&self, button: Buttons) -> bool {
        self.suppression.borrow().is_suppressed(button, self.swap_table())
    }

    pub fn set_context(&self, context: RemapContext) {
        if self.context.replace(context) != context {
            debug!(?context, "remap context changed");
            self.invalidate();
        }
    }

    pub fn context(&self) -> RemapContext {
        self.context.get()
    }

    pub fn set_profile(&self, profile: RemapProfile) {
        let previous = self.profile.replace(profile);
        if previous == profile {
            return;
        }
        info!("Remap profile changed to {:?}", profile);
        if previous.layout != profile.layout {
            match self.source.try_borrow_mut() {
                Ok(mut source) => source.set_layout(profile.layout),
                Err(_) => debug!("Layout change not forwarded while the source is being polled"),
            }
        }
        self.invalidate();
    }

    pub fn profile(&self) -> RemapProfile {
        self.profile.get()
    }

    fn swap_table(&self) -> SwapTable {
        self.profile.get().resolve(self.context.get())
    }

    /// Registers a feature module's rule. Returns `false` when called from
    /// inside a rule evaluation.
    pub fn register_rule(&self, rule: Box<dyn ArbitrationRule>) -> bool {
        match self.arbiter.try_borrow_mut() {
            Ok(mut arbiter) => {
                arbiter.register(rule);
                self.invalidate();
                true
            }
            Err(_) => {
                debug!("Rule registration ignored during arbitration");
                false
            }
        }
    }

    pub fn unregister_rule(&self, name: &str) -> usize {
        match self.arbiter.try_borrow_mut() {
            Ok(mut arbiter) => {
                let removed = arbiter.unregister(name);
                if removed > 0 {
                    self.invalidate();
                }
                removed
            }
            Err(_) => {
                debug!("Rule removal ignored during arbitration");
                0
            }
        }
    }

    /// Number of full pipeline runs so far.
    pub fn computations(&self) -> u64 {
        self.computations.get()
    }

    fn poll_once(&self) -> Option<RawPadState> {
        if let Some(polled) = self.polled.get() {
            return polled;
        }
        let state = match self.source.try_borrow_mut() {
            Ok(mut source) => source.poll(),
            Err(_) => {
                debug!("Hardware source busy, treating as disconnected");
                None
            }
        };
        self.polled.set(Some(state));
        self.tick_physical
            .set(Some(state.map_or(Buttons::empty(), |raw| raw.buttons)));
        state
    }

    fn compute(&self) -> GamepadSnapshot {
        self.computing.set(true);
        self.computations.set(self.computations.get() + 1);
        let tick = self.tick.get();

        let snapshot = match self.poll_once() {
            None => {
                trace!(tick, "no hardware connected, inert snapshot");
                GamepadSnapshot::inert(tick)
            }
            Some(raw) => self.process(tick, &raw),
        };

        self.memo.set(Some(snapshot));
        self.in_progress.set(None);
        self.computing.set(false);
        snapshot
    }

    fn process(&self, tick: u64, raw: &RawPadState) -> GamepadSnapshot {
        let context = self.context.get();
        let table = self.profile.get().resolve(context);
        let remapped = table.apply(raw.buttons);
        let went_down = table.apply(raw.buttons - self.previous_physical.get());

        // Visible to nested queries while arbitration rules run.
        let mut snapshot = GamepadSnapshot {
            tick,
            connected: true,
            physical: raw.buttons,
            buttons: remapped,
            newly_pressed: remapped & went_down,
            left_stick: raw.left_stick,
            right_stick: raw.right_stick,
            left_trigger: raw.left_trigger,
            right_trigger: raw.right_trigger,
            raw: RawAxes::from(raw),
        };
        self.in_progress.set(Some(snapshot));

        let claim = match self.arbiter.try_borrow_mut() {
            Ok(mut arbiter) => arbiter.claim_for(&ArbitrationContext { tick, context, raw }),
            Err(_) => Claim::NONE,
        };
        let signals = Arbiter::apply(claim, remapped, raw);

        let buttons = {
            let mut suppression = self.suppression.borrow_mut();
            suppression.observe(raw.buttons);
            suppression.mask(signals.buttons, table)
        };

        snapshot.buttons = buttons;
        snapshot.newly_pressed = buttons & went_down;
        snapshot.left_stick = signals.left_stick;
        snapshot.right_stick = signals.right_stick;
        snapshot.left_trigger = signals.left_trigger;
        snapshot.right_trigger = signals.right_trigger;

        trace!(
            tick,
            ?buttons,
            newly = ?snapshot.newly_pressed,
            "L:({:.2},{:.2}) R:({:.2},{:.2}) LT:{:.2} RT:{:.2}",
            snapshot.left_stick.x,
            snapshot.left_stick.y,
            snapshot.right_stick.x,
            snapshot.right_stick.y,
            snapshot.left_trigger,
            snapshot.right_trigger
        );
        snapshot
    }
}
