//! Blight Sim - contagion and turned-population core for tick-driven colony simulations
//!
//! The host game owns agents, maps and the tick counter and exposes them
//! through the traits in [`host`]. [`simulation::BlightWorld`] owns every
//! blight-specific piece of state and advances it one tick at a time.

pub mod affliction;
pub mod core;
pub mod host;
pub mod population;
pub mod simulation;
pub mod threat;
pub mod trace;
pub mod turned;

pub use crate::core::{BlightConfig, BlightError, DefinitionRegistry, Result};
pub use crate::host::{BlightEvent, BlightObserver, Host};
pub use crate::simulation::{run_blight_tick, BlightWorld};
