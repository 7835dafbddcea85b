pub mod lifecycle;
pub mod tick;
pub mod world;

pub use tick::run_blight_tick;
pub use world::{BlightState, BlightWorld, RegionState};
