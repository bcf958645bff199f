//! Transformations applied to raw controller state inside the frame cache.
//!
//! * [`remap`] - Layout/style dependent button swaps (pure)
//! * [`arbitration`] - Feature modules claiming sticks, triggers and buttons
//! * [`suppression`] - Buttons held released until physically let go

pub mod arbitration;
pub mod remap;
pub mod suppression;

pub use arbitration::{Arbiter, ArbitrationContext, ArbitrationRule, Channels, Claim, FnRule};
pub use remap::{ControlStyle, ControllerLayout, RemapContext, RemapProfile, SwapTable};
pub use suppression::SuppressionRegistry;
