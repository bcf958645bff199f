//! Placement session: turns confirm/cancel presses into single discrete
//! build, move and demolish calls on the host.
//!
//! # Phases
//!
//! ```text
//! Build     Positioning ──confirm──► attempt_placement ──► Positioning
//!
//! Move      Positioning ──confirm──► select_entity_at
//!               │ (selected, cursor moved) ──confirm──► reanchor_preview
//!               │ (selected, still)        ──confirm──► confirm_move ──► Idle
//!
//! Demolish  Idle ──confirm──► select ──► PendingConfirm
//!               PendingConfirm ──confirm, same entity──► confirm_demolish ──► Idle
//!               PendingConfirm ──confirm, elsewhere────► deselect ──► Idle
//! ```
//!
//! At most one transition and one host action happen per tick.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::controller::buttons::Buttons;
use crate::controller::frame_cache::GamepadSnapshot;
use crate::host::{EntityId, EntityRef, PlacementHost, Point};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementMode {
    Build,
    Move,
    Demolish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlacementPhase {
    Idle,
    Positioning,
    PendingConfirm,
}

/// Edge-detected input relevant to placement for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlacementInput {
    #[default]
    None,
    Confirm,
    Cancel,
}

impl PlacementInput {
    /// Reads the snapshot's newly-pressed bits. Confirm wins over cancel.
    pub fn from_snapshot(snapshot: &GamepadSnapshot) -> Self {
        if snapshot.just_pressed(Buttons::CONFIRM) {
            PlacementInput::Confirm
        } else if snapshot.just_pressed(Buttons::CANCEL) {
            PlacementInput::Cancel
        } else {
            PlacementInput::None
        }
    }
}

/// What a tick did. Returned for logging, overlays and tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlacementOutcome {
    Placed { at: Point },
    PlacementRejected { at: Point },
    Selected { entity: EntityId },
    NothingToSelect { at: Point },
    Reanchored { entity: EntityId, at: Point },
    ReanchorFailed { entity: EntityId },
    MoveConfirmed { entity: EntityId, at: Point },
    MoveRejected { entity: EntityId },
    Demolished { entity: EntityId },
    DemolishRejected { entity: EntityId },
    Deselected { entity: EntityId },
    SelectionLost { entity: EntityId },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacementSession {
    mode: PlacementMode,
    phase: PlacementPhase,
    selected: Option<EntityRef>,
    reposition_needed: bool,
    last_action_tick: Option<u64>,
}

impl PlacementSession {
    pub fn new(mode: PlacementMode) -> Self {
        let phase = match mode {
            PlacementMode::Build | PlacementMode::Move => PlacementPhase::Positioning,
            PlacementMode::Demolish => PlacementPhase::Idle,
        };
        debug!(?mode, ?phase, "placement session created");
        Self {
            mode,
            phase,
            selected: None,
            reposition_needed: false,
            last_action_tick: None,
        }
    }

    pub fn mode(&self) -> PlacementMode {
        self.mode
    }

    pub fn phase(&self) -> PlacementPhase {
        self.phase
    }

    pub fn selected(&self) -> Option<EntityRef> {
        self.selected
    }

    pub fn reposition_needed(&self) -> bool {
        self.reposition_needed
    }

    /// Runs one tick of the protocol.
    ///
    /// `cursor_moved` marks the held preview as needing a re-anchor; `cursor`
    /// is the position used for every host call this tick.
    pub fn update(
        &mut self,
        tick: u64,
        input: PlacementInput,
        cursor_moved: bool,
        cursor: Point,
        host: &mut dyn PlacementHost,
    ) -> Option<PlacementOutcome> {
        if cursor_moved && self.selected.is_some() {
            self.reposition_needed = true;
        }

        if self.last_action_tick == Some(tick) {
            trace!(tick, "placement already acted this tick");
            return None;
        }

        let outcome = match self.drop_stale_selection(host) {
            Some(lost) => Some(lost),
            None => match input {
                PlacementInput::None => None,
                PlacementInput::Confirm => Some(self.on_confirm(cursor, host)),
                PlacementInput::Cancel => self.on_cancel(),
            },
        };

        if let Some(outcome) = outcome {
            self.last_action_tick = Some(tick);
            debug!(tick, mode = ?self.mode, phase = ?self.phase, ?outcome, "placement step");
        }
        outcome
    }

    fn drop_stale_selection(&mut self, host: &dyn PlacementHost) -> Option<PlacementOutcome> {
        let entity = self.selected?.id;
        if host.entity_exists(entity) {
            return None;
        }
        self.clear_selection();
        Some(PlacementOutcome::SelectionLost { entity })
    }

    fn clear_selection(&mut self) {
        self.selected = None;
        self.reposition_needed = false;
        self.phase = match self.mode {
            PlacementMode::Build | PlacementMode::Move => PlacementPhase::Positioning,
            PlacementMode::Demolish => PlacementPhase::Idle,
        };
    }

    fn on_confirm(&mut self, cursor: Point, host: &mut dyn PlacementHost) -> PlacementOutcome {
        match self.mode {
            PlacementMode::Build => self.confirm_build(cursor, host),
            PlacementMode::Move => self.confirm_move(cursor, host),
            PlacementMode::Demolish => self.confirm_demolish(cursor, host),
        }
    }

    fn on_cancel(&mut self) -> Option<PlacementOutcome> {
        let entity = self.selected?.id;
        self.clear_selection();
        Some(PlacementOutcome::Deselected { entity })
    }

    fn confirm_build(&mut self, cursor: Point, host: &mut dyn PlacementHost) -> PlacementOutcome {
        self.phase = PlacementPhase::Positioning;
        match host.attempt_placement(cursor) {
            Ok(()) => PlacementOutcome::Placed { at: cursor },
            Err(e) => {
                debug!("Placement at ({:.1}, {:.1}) rejected: {}", cursor.x, cursor.y, e);
                PlacementOutcome::PlacementRejected { at: cursor }
            }
        }
    }

    fn confirm_move(&mut self, cursor: Point, host: &mut dyn PlacementHost) -> PlacementOutcome {
        let Some(selected) = self.selected else {
            self.phase = PlacementPhase::Positioning;
            return match host.select_entity_at(cursor) {
                Some(entity) => {
                    self.selected = Some(entity);
                    self.reposition_needed = false;
                    PlacementOutcome::Selected { entity: entity.id }
                }
                None => PlacementOutcome::NothingToSelect { at: cursor },
            };
        };

        if self.reposition_needed {
            return match host.reanchor_preview(selected.id, cursor) {
                Ok(()) => {
                    self.reposition_needed = false;
                    PlacementOutcome::Reanchored {
                        entity: selected.id,
                        at: cursor,
                    }
                }
                Err(e) => {
                    debug!("Re-anchor of {} failed: {}", selected.id, e);
                    PlacementOutcome::ReanchorFailed { entity: selected.id }
                }
            };
        }

        match host.confirm_move(selected.id, cursor) {
            Ok(()) => {
                self.selected = None;
                self.phase = PlacementPhase::Idle;
                PlacementOutcome::MoveConfirmed {
                    entity: selected.id,
                    at: cursor,
                }
            }
            Err(e) => {
                debug!("Move of {} rejected: {}", selected.id, e);
                PlacementOutcome::MoveRejected { entity: selected.id }
            }
        }
    }

    fn confirm_demolish(&mut self, cursor: Point, host: &mut dyn PlacementHost) -> PlacementOutcome {
        let Some(selected) = self.selected else {
            return match host.select_entity_at(cursor) {
                Some(entity) => {
                    self.selected = Some(entity);
                    self.phase = PlacementPhase::PendingConfirm;
                    PlacementOutcome::Selected { entity: entity.id }
                }
                None => PlacementOutcome::NothingToSelect { at: cursor },
            };
        };

        let still_over = host.entity_at(cursor).map(|e| e.id) == Some(selected.id);
        self.clear_selection();
        if !still_over {
            return PlacementOutcome::Deselected { entity: selected.id };
        }

        match host.confirm_demolish(selected.id) {
            Ok(()) => PlacementOutcome::Demolished { entity: selected.id },
            Err(e) => {
                debug!("Demolish of {} rejected: {}", selected.id, e);
                PlacementOutcome::DemolishRejected { entity: selected.id }
            }
        }
    }
}
