//! Behavior of agents that completed the infection

pub mod behavior;
pub mod directive;
pub mod hunt;

pub use behavior::{TurnedBehavior, TurnedState};
pub use directive::{think, Directive, ThinkContext};
pub use hunt::{alert_nearby, find_victim};
