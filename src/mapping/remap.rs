//! Remap engine: pure mapping from `(layout, style, context)` to the button
//! swaps applied to every snapshot.
//!
//! Two independent pairs are handled:
//!
//! * confirm/cancel (`A`/`B`), swapped uniformly in every context;
//! * the secondary pair (`X`/`Y`), swapped only in gameplay or menu context
//!   and with opposite polarity between the two.
//!
//! The polarity difference is intentional. The two pairs have independent
//! physical-position relationships across layouts.

use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::controller::buttons::Buttons;

/// Physical button layout of the connected pad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ControllerLayout {
    #[default]
    Primary,
    Secondary,
    Tertiary,
}

/// Which face button the player wants to confirm with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ControlStyle {
    /// Confirm on the east face button.
    #[default]
    StyleA,
    /// Confirm on the south face button.
    StyleB,
}

/// Where the host currently is. Selects which secondary-pair rule applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RemapContext {
    #[default]
    Title,
    Menu,
    Gameplay,
}

/// Physical face-button positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FacePosition {
    South,
    East,
    West,
    North,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown {kind} `{value}`")]
pub struct ParseProfileError {
    kind: &'static str,
    value: String,
}

impl ControllerLayout {
    /// True for the two layouts whose confirm/cancel positions are opposite
    /// to the primary layout.
    pub fn is_secondary(self) -> bool {
        matches!(self, ControllerLayout::Secondary | ControllerLayout::Tertiary)
    }

    /// Host button code the hardware reports for a physical face position.
    pub fn code_at(self, position: FacePosition) -> Buttons {
        match (self.is_secondary(), position) {
            (false, FacePosition::South) => Buttons::B,
            (false, FacePosition::East) => Buttons::A,
            (false, FacePosition::West) => Buttons::Y,
            (false, FacePosition::North) => Buttons::X,
            (true, FacePosition::South) => Buttons::A,
            (true, FacePosition::East) => Buttons::B,
            (true, FacePosition::West) => Buttons::X,
            (true, FacePosition::North) => Buttons::Y,
        }
    }
}

impl Display for ControllerLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerLayout::Primary => write!(f, "Primary"),
            ControllerLayout::Secondary => write!(f, "Secondary"),
            ControllerLayout::Tertiary => write!(f, "Tertiary"),
        }
    }
}

impl FromStr for ControllerLayout {
    type Err = ParseProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "primary" => Ok(ControllerLayout::Primary),
            "secondary" => Ok(ControllerLayout::Secondary),
            "tertiary" => Ok(ControllerLayout::Tertiary),
            _ => Err(ParseProfileError {
                kind: "layout",
                value: s.to_string(),
            }),
        }
    }
}

impl Display for ControlStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlStyle::StyleA => write!(f, "StyleA"),
            ControlStyle::StyleB => write!(f, "StyleB"),
        }
    }
}

impl FromStr for ControlStyle {
    type Err = ParseProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stylea" | "a" => Ok(ControlStyle::StyleA),
            "styleb" | "b" => Ok(ControlStyle::StyleB),
            _ => Err(ParseProfileError {
                kind: "style",
                value: s.to_string(),
            }),
        }
    }
}

/// Resolved swaps for one context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SwapTable {
    pub swap_confirm_cancel: bool,
    pub swap_secondary_pair: bool,
}

impl SwapTable {
    /// Applies the swaps. Each swap is its own inverse, so the same call maps
    /// physical codes to logical ones and back.
    pub fn apply(&self, buttons: Buttons) -> Buttons {
        let mut out = buttons;
        if self.swap_confirm_cancel {
            out = out.swapped(Buttons::A, Buttons::B);
        }
        if self.swap_secondary_pair {
            out = out.swapped(Buttons::X, Buttons::Y);
        }
        out
    }
}

/// Active layout/style selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RemapProfile {
    pub layout: ControllerLayout,
    pub style: ControlStyle,
    pub remapping_enabled: bool,
}

impl RemapProfile {
    pub fn new(layout: ControllerLayout, style: ControlStyle) -> Self {
        Self {
            layout,
            style,
            remapping_enabled: true,
        }
    }

    /// Profile that never swaps anything.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Gameplay-context rule for the secondary pair.
    pub fn gameplay_swaps_secondary(&self) -> bool {
        self.layout == ControllerLayout::Primary
    }

    /// Menu-context rule for the secondary pair (sort/stack buttons).
    pub fn menu_swaps_secondary(&self) -> bool {
        self.layout.is_secondary()
    }

    pub fn resolve(&self, context: RemapContext) -> SwapTable {
        if !self.remapping_enabled {
            return SwapTable::default();
        }

        let swap_confirm_cancel = self.layout.is_secondary() != (self.style == ControlStyle::StyleB);
        let swap_secondary_pair = match context {
            RemapContext::Gameplay => self.gameplay_swaps_secondary(),
            RemapContext::Menu => self.menu_swaps_secondary(),
            RemapContext::Title => false,
        };

        SwapTable {
            swap_confirm_cancel,
            swap_secondary_pair,
        }
    }

    /// Applies the resolved swaps to a physical button set.
    pub fn apply(&self, context: RemapContext, physical: Buttons) -> Buttons {
        self.resolve(context).apply(physical)
    }
}
