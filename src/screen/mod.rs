//! Screen layer: the single active screen and the cursor/placement state it
//! owns.
//!
//! The host tells the [`ScreenController`] when screens open, close, switch
//! sub-state and switch placement mode. Those notifications are the only
//! places where a [`VirtualCursor`] or [`PlacementSession`] is created or
//! destroyed, so at most one of each is ever live.
//!
//! ```text
//! on_screen_opened ──► Transition ──on_sub_state_changed(Spatial)──► cursor active
//!                                                                    session created
//!        Spatial ──on_sub_state_changed(other)──► cursor inactive (session kept)
//!        any     ──on_mode_changed──► session recreated for the new mode
//!        any     ──on_screen_closed──► everything dropped
//! ```

pub mod cursor;
pub mod double_press;
pub mod placement;

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, info, trace};

use crate::config::{FeatureFlags, PlacementSettings};
use crate::controller::buttons::{Buttons, JoystickType};
use crate::controller::frame_cache::GamepadSnapshot;
use crate::host::{EntityRef, HostFacade, Point, PointerHost};
use crate::mapping::arbitration::{ArbitrationContext, ArbitrationRule, Channels, Claim, FnRule};

use cursor::{CursorSettings, CursorState, CursorUpdate, VirtualCursor};
use double_press::{DoublePressGate, GateResult};
use placement::{PlacementInput, PlacementMode, PlacementOutcome, PlacementPhase, PlacementSession};

/// Name under which the cursor's stick claim is registered with the arbiter.
pub const CURSOR_RULE: &str = "virtual-cursor";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScreenId(pub u64);

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "screen#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenKind {
    /// Plain menu; never gets a cursor.
    Menu,
    /// Build/move/demolish capable screen.
    Placement(PlacementMode),
}

/// What the active screen is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubState {
    /// Opening/closing fade or camera transition.
    #[default]
    Transition,
    /// World view where the cursor is live.
    Spatial,
    /// Menu part of the screen.
    Menu,
}

/// Everything an overlay needs to draw the cursor and selection.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OverlayState {
    pub cursor: Option<CursorState>,
    pub phase: Option<PlacementPhase>,
    /// Highlighted entity, if any.
    pub selection: Option<EntityRef>,
}

/// Result of one [`ScreenController::update`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenUpdate {
    pub cursor: CursorUpdate,
    pub placement: Option<PlacementOutcome>,
    /// The double-press gate asked the host to leave placement.
    pub exited: bool,
    /// Logical buttons handled here that the host must not also act on.
    pub consumed: Buttons,
}

struct ActiveScreen {
    id: ScreenId,
    kind: ScreenKind,
    sub_state: SubState,
    cursor: Option<VirtualCursor>,
    session: Option<PlacementSession>,
    exit_gate: DoublePressGate,
    last_tick: Option<u64>,
}

impl ActiveScreen {
    fn is_spatial(&self) -> bool {
        self.sub_state == SubState::Spatial
    }

    fn enter_spatial(&mut self, features: &FeatureFlags, settings: &CursorSettings) {
        let ScreenKind::Placement(mode) = self.kind else {
            return;
        };
        if !features.virtual_cursor {
            return;
        }
        self.cursor
            .get_or_insert_with(|| VirtualCursor::new(*settings))
            .activate();
        if features.placement && self.session.is_none() {
            self.session = Some(PlacementSession::new(mode));
        }
    }

    fn leave_spatial(&mut self) {
        if let Some(cursor) = self.cursor.as_mut() {
            cursor.deactivate();
        }
    }

    fn claimed_stick(&self) -> Option<JoystickType> {
        self.cursor
            .as_ref()
            .filter(|c| c.is_active())
            .map(|c| c.settings().stick)
    }
}

pub struct ScreenController {
    features: FeatureFlags,
    cursor_settings: CursorSettings,
    placement_settings: PlacementSettings,
    active: Option<ActiveScreen>,
    cursor_claim: Rc<Cell<Option<JoystickType>>>,
}

impl ScreenController {
    pub fn new(
        features: FeatureFlags,
        cursor_settings: CursorSettings,
        placement_settings: PlacementSettings,
    ) -> Self {
        debug!(?features, "Creating screen controller");
        Self {
            features,
            cursor_settings,
            placement_settings,
            active: None,
            cursor_claim: Rc::new(Cell::new(None)),
        }
    }

    /// New settings apply to the next screen that opens.
    pub fn apply_settings(
        &mut self,
        features: FeatureFlags,
        cursor_settings: CursorSettings,
        placement_settings: PlacementSettings,
    ) {
        self.features = features;
        self.cursor_settings = cursor_settings;
        self.placement_settings = placement_settings;
    }

    /// Arbitration rule that takes the cursor's stick away from the host
    /// while the cursor is active.
    pub fn cursor_rule(&self) -> Box<dyn ArbitrationRule> {
        let claim = Rc::clone(&self.cursor_claim);
        Box::new(FnRule::new(CURSOR_RULE, move |_ctx: &ArbitrationContext<'_>| {
            match claim.get() {
                Some(JoystickType::Left) => Claim::channels(Channels::LEFT_STICK),
                Some(JoystickType::Right) => Claim::channels(Channels::RIGHT_STICK),
                None => Claim::NONE,
            }
        }))
    }

    pub fn active_screen(&self) -> Option<ScreenId> {
        self.active.as_ref().map(|s| s.id)
    }

    pub fn cursor_active(&self) -> bool {
        self.cursor_claim.get().is_some()
    }

    pub fn on_screen_opened(&mut self, id: ScreenId, kind: ScreenKind) {
        if let Some(previous) = self.active.take() {
            info!("Screen {} replaced by {} without a close notification", previous.id, id);
        }
        info!("Screen {} opened as {:?}", id, kind);
        self.active = Some(ActiveScreen {
            id,
            kind,
            sub_state: SubState::Transition,
            cursor: None,
            session: None,
            exit_gate: DoublePressGate::new(self.placement_settings.double_press_window_ticks),
            last_tick: None,
        });
        self.sync_claim();
    }

    pub fn on_screen_closed(&mut self, id: ScreenId) {
        if self.active_screen() == Some(id) {
            info!("Screen {} closed", id);
            self.active = None;
        } else {
            trace!(%id, "close for a screen that is not active");
        }
        self.sync_claim();
    }

    pub fn on_sub_state_changed(&mut self, id: ScreenId, sub_state: SubState) {
        let features = self.features;
        let settings = self.cursor_settings;
        let Some(screen) = self.active.as_mut().filter(|s| s.id == id) else {
            trace!(%id, ?sub_state, "sub-state change for a screen that is not active");
            return;
        };
        if screen.sub_state == sub_state {
            return;
        }
        debug!(%id, from = ?screen.sub_state, to = ?sub_state, "screen sub-state changed");
        screen.sub_state = sub_state;
        if sub_state == SubState::Spatial {
            screen.enter_spatial(&features, &settings);
        } else {
            screen.leave_spatial();
        }
        self.sync_claim();
    }

    pub fn on_mode_changed(&mut self, id: ScreenId, mode: PlacementMode) {
        let features = self.features;
        let settings = self.cursor_settings;
        let Some(screen) = self.active.as_mut().filter(|s| s.id == id) else {
            trace!(%id, ?mode, "mode change for a screen that is not active");
            return;
        };
        if !matches!(screen.kind, ScreenKind::Placement(_)) {
            trace!(%id, ?mode, "mode change on a screen without placement");
            return;
        }
        debug!(%id, ?mode, "placement mode changed");
        screen.kind = ScreenKind::Placement(mode);
        screen.session = None;
        screen.exit_gate.reset();
        if screen.is_spatial() {
            screen.enter_spatial(&features, &settings);
        }
    }

    /// Runs the active screen for one tick. A second call within the same
    /// tick does nothing.
    pub fn update<H: HostFacade>(&mut self, snapshot: &GamepadSnapshot, host: &mut H) -> ScreenUpdate {
        let mut out = ScreenUpdate::default();
        let double_press_exit = self.features.double_press_exit;
        let Some(screen) = self.active.as_mut() else {
            return out;
        };
        if !screen.is_spatial() || screen.last_tick == Some(snapshot.tick) {
            return out;
        }
        screen.last_tick = Some(snapshot.tick);
        screen.exit_gate.expire(snapshot.tick);

        let Some(cursor) = screen.cursor.as_mut() else {
            return out;
        };
        let stick = snapshot.raw.stick(cursor.settings().stick);
        out.cursor = cursor.update(stick, host);
        let at = cursor.position();

        let selection = screen.session.as_ref().and_then(|s| s.selected());
        if out.cursor.moved || out.cursor.panned != (0, 0) {
            let extent = selection.map(|e| e.extent).or_else(|| host.preview_extent());
            if let Some(pointer) = cursor.pointer_override(extent, host.display_scale()) {
                host.hover_pointer(pointer);
            }
        }

        let Some(session) = screen.session.as_mut() else {
            return out;
        };
        let input = PlacementInput::from_snapshot(snapshot);
        let exit_requested =
            double_press_exit && input == PlacementInput::Cancel && selection.is_none();
        let session_input = if exit_requested {
            PlacementInput::None
        } else {
            input
        };

        out.placement = session.update(snapshot.tick, session_input, out.cursor.moved, at, host);
        match (session_input, out.placement) {
            (PlacementInput::Confirm, _) => out.consumed |= Buttons::CONFIRM,
            (PlacementInput::Cancel, Some(PlacementOutcome::Deselected { .. })) => {
                out.consumed |= Buttons::CANCEL
            }
            _ => {}
        }

        if exit_requested {
            out.consumed |= Buttons::CANCEL;
            if screen.exit_gate.press(snapshot.tick) == GateResult::Confirmed {
                info!("Double cancel on {}, leaving placement", screen.id);
                host.exit_placement();
                out.exited = true;
            }
        }
        out
    }

    /// Pointer position the host should see, while a cursor is active.
    pub fn pointer_override<H: PointerHost + ?Sized>(&self, host: &H) -> Option<Point> {
        let screen = self.active.as_ref()?;
        let cursor = screen.cursor.as_ref()?;
        let extent = screen
            .session
            .as_ref()
            .and_then(|s| s.selected())
            .map(|e| e.extent)
            .or_else(|| host.preview_extent());
        cursor.pointer_override(extent, host.display_scale())
    }

    pub fn overlay(&self) -> OverlayState {
        let Some(screen) = self.active.as_ref() else {
            return OverlayState::default();
        };
        OverlayState {
            cursor: screen.cursor.as_ref().map(|c| c.state()),
            phase: screen.session.as_ref().map(|s| s.phase()),
            selection: screen.session.as_ref().and_then(|s| s.selected()),
        }
    }

    fn sync_claim(&self) {
        let claimed = self.active.as_ref().and_then(|s| s.claimed_stick());
        if self.cursor_claim.replace(claimed) != claimed {
            debug!(?claimed, "cursor stick claim changed");
        }
    }
}
