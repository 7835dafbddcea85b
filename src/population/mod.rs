//! Spawning and eviction of turned agents per region

pub mod boundary;
pub mod scheduler;
pub mod value;

pub use scheduler::{eviction_candidates, resident_turned, PopulationScheduler};
pub use value::{agent_value, EvictionCandidate};
