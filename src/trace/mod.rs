//! Spatial scent traces and the behaviors that read and write them

pub mod emitter;
pub mod field;
pub mod follow;

pub use emitter::LivingEmitter;
pub use field::{TraceCell, TraceField};
pub use follow::{FollowStep, TraceFollower};
