//! "Hold pressed-off until physically released" flags.
//!
//! Once a press has been consumed by one action, suppressing the button keeps
//! the logical button released until the player lets go. A held press can
//! then never be re-read as a fresh press by a different code path bound to
//! the same button.
//!
//! Flags are stored against physical buttons. A remap change while the
//! button is held moves the suppressed logical code along with it instead of
//! dropping the flag.

use tracing::{debug, trace};

use crate::controller::buttons::Buttons;
use crate::mapping::remap::SwapTable;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SuppressionRegistry {
    /// Physical buttons held released.
    active: Buttons,
}

impl SuppressionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forces the logical `buttons` to read released until the physical
    /// buttons behind them under `table` are released.
    pub fn suppress(&mut self, buttons: Buttons, table: SwapTable) {
        let physical = table.apply(buttons);
        debug!(?buttons, ?physical, "suppressing until release");
        self.active |= physical;
    }

    /// Drops the flags behind the logical `buttons` without waiting for
    /// release. Unknown flags are ignored.
    pub fn release(&mut self, buttons: Buttons, table: SwapTable) {
        let physical = table.apply(buttons);
        if !self.active.intersects(physical) {
            trace!(?buttons, "release for a flag that was never suppressed");
            return;
        }
        self.active -= physical;
    }

    pub fn is_suppressed(&self, button: Buttons, table: SwapTable) -> bool {
        self.active.intersects(table.apply(button))
    }

    /// Suppressed physical buttons.
    pub fn active(&self) -> Buttons {
        self.active
    }

    /// Clears every flag whose physical button is not held.
    ///
    /// `held` is the hardware report, so neither a claim made by a feature
    /// module nor a remap change counts as a release.
    pub fn observe(&mut self, held: Buttons) {
        let released = self.active - held;
        if !released.is_empty() {
            trace!(?released, "suppression cleared on physical release");
            self.active -= released;
        }
    }

    /// Masks out the logical codes currently produced by suppressed buttons.
    pub fn mask(&self, logical: Buttons, table: SwapTable) -> Buttons {
        logical - table.apply(self.active)
    }
}
