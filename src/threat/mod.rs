//! Region threat signal driving population injection

pub mod environment;
pub mod noise;
pub mod trend;

pub use environment::ThreatEnvironment;
pub use trend::{ThreatTrend, TrendSample};
