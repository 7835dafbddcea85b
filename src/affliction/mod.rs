//! Per-agent health conditions driven by the blight

pub mod additive;
pub mod contagion;
pub mod infection;
pub mod protection;
pub mod starvation;
pub mod terminal;

pub use additive::EffectPayload;
pub use contagion::{try_infect, Exposure, Susceptibility};
pub use infection::{temperature_multiplier, InfectionInput, InfectionTrack, ProtectionOutcome, TrackStatus};
pub use protection::{ApplyOutcome, ProtectionEffect, ProtectionKind, ProtectionProfile, ProtectionSet};
pub use starvation::{StarvationEffect, StarvationTrack};
pub use terminal::{Extraction, TerminalEffects};
