//! padbridge: controller input virtualization for pointer-first hosts.
//!
//! # Architecture
//!
//! ```text
//! HardwareSource ──► FrameCache ──► GamepadSnapshot ──► host / feature modules
//!  (gilrs, scripted)   │  remap                               │
//!                      │  arbitration ◄── rules               ▼
//!                      │  suppression              ScreenController
//!                      ▼                            ├─ VirtualCursor  ──► PointerHost
//!                 InputBridge<Running>              └─ PlacementSession ──► PlacementHost
//! ```
//!
//! Everything runs on the host's frame thread. The bridge is created in the
//! `Configuring` state, attached to a hardware source, and then driven once
//! per host tick.

pub mod bridge;
pub mod config;
pub mod controller;
pub mod error;
pub mod host;
pub mod mapping;
pub mod screen;

pub use bridge::{BridgeState, InputBridge};
pub use config::BridgeConfig;
pub use controller::{Buttons, GamepadSnapshot};
pub use error::{ConfigError, HostError, SourceError};
pub use host::{HostFacade, PlacementHost, PointerHost};
