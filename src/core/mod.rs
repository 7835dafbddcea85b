pub mod clock;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod registry;
pub mod types;

pub use clock::{IntervalTimer, SimClock, TICKS_PER_DAY, TICKS_PER_HOUR};
pub use config::BlightConfig;
pub use diagnostics::Diagnostics;
pub use error::{BlightError, Result};
pub use registry::{AfflictionDef, DefinitionKind, DefinitionRegistry};
pub use types::{AgentId, Cell, ComfortBand, FactionId, RegionBounds, RegionId, Tick};
