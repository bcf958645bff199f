//! Input bridge: bootstrap and per-tick driver with compile-time state safety.
//!
//! # State Machine
//!
//! ```text
//! Configuring ──attach(source)──► Running
//!   (inert source,                  (begin_tick / snapshot / update)
//!    rules registered)
//! ```
//!
//! # Per-tick flow
//!
//! ```text
//! begin_tick ──► snapshot() ◄── any number of host call sites (same result)
//!                   │
//!                update(host) ──► ScreenController ──► consumed buttons ──► suppress
//! ```
//!
//! The bridge owns the single [`FrameCache`] and hands out `Rc` clones of it
//! to feature modules that need to query or suppress outside the bridge.

use std::rc::Rc;

use statum::{machine, state};
use tracing::{debug, info};

use crate::config::BridgeConfig;
use crate::controller::buttons::Buttons;
use crate::controller::frame_cache::{FrameCache, GamepadSnapshot};
use crate::controller::hardware::{HardwareSource, InertSource};
use crate::host::{HostFacade, Point, PointerHost};
use crate::mapping::arbitration::ArbitrationRule;
use crate::mapping::remap::RemapContext;
use crate::screen::placement::PlacementMode;
use crate::screen::{OverlayState, ScreenController, ScreenId, ScreenKind, ScreenUpdate, SubState};

/// States for the bridge lifecycle using statum
#[state]
#[derive(Debug, Clone)]
pub enum BridgeState {
    Configuring, // Cache created, no hardware yet
    Running,     // Attached to a source, driven by host ticks
}

#[machine]
pub struct InputBridge<S: BridgeState> {
    config: BridgeConfig,
    cache: Rc<FrameCache>,
    screens: ScreenController,
    tick: u64,
}

impl<S: BridgeState> InputBridge<S> {
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Shared handle to the frame cache.
    pub fn cache(&self) -> Rc<FrameCache> {
        Rc::clone(&self.cache)
    }

    /// Registers a feature module's arbitration rule.
    pub fn register_rule(&self, rule: Box<dyn ArbitrationRule>) -> bool {
        debug!("Registering arbitration rule `{}`", rule.name());
        self.cache.register_rule(rule)
    }

    pub fn unregister_rule(&self, name: &str) -> usize {
        self.cache.unregister_rule(name)
    }
}

impl InputBridge<Configuring> {
    pub fn create(config: BridgeConfig) -> Self {
        info!("Creating input bridge with config: {:?}", config);

        let cache = Rc::new(FrameCache::new(Box::new(InertSource), config.profile()));
        let screens = ScreenController::new(config.features, config.cursor, config.placement);
        cache.register_rule(screens.cursor_rule());

        Self::new(
            config,
            cache,
            screens,
            0, // tick
        )
    }

    /// Binds the hardware source and transitions to Running.
    pub fn attach(self, source: Box<dyn HardwareSource>) -> InputBridge<Running> {
        info!("Attaching input bridge to source `{}`", source.name());
        self.cache.replace_source(source);
        self.transition()
    }
}

impl InputBridge<Running> {
    /// Starts the next host tick and returns its number.
    pub fn begin_tick(&mut self) -> u64 {
        self.tick += 1;
        self.cache.begin_tick(self.tick);
        self.tick
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// The tick's snapshot. Identical for every call within one tick unless
    /// something invalidated the cache in between.
    pub fn snapshot(&self) -> GamepadSnapshot {
        self.cache.query()
    }

    pub fn suppress(&self, buttons: Buttons) {
        self.cache.suppress(buttons);
    }

    pub fn set_context(&self, context: RemapContext) {
        self.cache.set_context(context);
    }

    /// Applies a new configuration between sessions.
    pub fn reload_config(&mut self, config: BridgeConfig) {
        info!("Reloading bridge config: {:?}", config);
        self.cache.set_profile(config.profile());
        self.screens
            .apply_settings(config.features, config.cursor, config.placement);
        self.config = config;
        self.cache.invalidate();
    }

    pub fn on_screen_opened(&mut self, id: ScreenId, kind: ScreenKind) {
        self.screens.on_screen_opened(id, kind);
    }

    pub fn on_screen_closed(&mut self, id: ScreenId) {
        self.screens.on_screen_closed(id);
    }

    pub fn on_sub_state_changed(&mut self, id: ScreenId, sub_state: SubState) {
        self.screens.on_sub_state_changed(id, sub_state);
    }

    pub fn on_mode_changed(&mut self, id: ScreenId, mode: PlacementMode) {
        self.screens.on_mode_changed(id, mode);
    }

    /// Runs the active screen against this tick's snapshot. Buttons the
    /// screen handled are suppressed so the host does not act on them too.
    pub fn update<H: HostFacade>(&mut self, host: &mut H) -> ScreenUpdate {
        let snapshot = self.cache.query();
        let update = self.screens.update(&snapshot, host);
        if !update.consumed.is_empty() {
            self.cache.suppress(update.consumed);
        }
        update
    }

    pub fn pointer_position<H: PointerHost + ?Sized>(&self, host: &H) -> Option<Point> {
        self.screens.pointer_override(host)
    }

    pub fn overlay(&self) -> OverlayState {
        self.screens.overlay()
    }

    pub fn screens(&self) -> &ScreenController {
        &self.screens
    }
}
