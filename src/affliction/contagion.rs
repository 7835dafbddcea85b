//! How agents catch the infection
//!
//! Exposures come from bites, spawned carriers and residue contact. Resistance
//! dampens new infections; immunity and non-flesh bodies block them.

use ahash::AHashMap;

use crate::affliction::infection::InfectionTrack;
use crate::affliction::protection::ProtectionSet;
use crate::core::config::ContagionConfig;
use crate::core::types::{AgentId, Tick};
use crate::host::AgentStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Susceptibility {
    Susceptible,
    NotFlesh,
    Immune,
    AlreadyTurned,
    /// No infection definition is loaded
    Undefined,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Exposure {
    Blocked(Susceptibility),
    /// An existing infection advanced to this severity
    Grew(f32),
    /// A new infection started at this severity
    Started(f32),
}

pub fn susceptibility(status: &AgentStatus, protections: Option<&ProtectionSet>, turned: bool) -> Susceptibility {
    if turned {
        Susceptibility::AlreadyTurned
    } else if !status.flesh {
        Susceptibility::NotFlesh
    } else if protections.map(|p| p.is_immune()).unwrap_or(false) {
        Susceptibility::Immune
    } else {
        Susceptibility::Susceptible
    }
}

/// `max(min_factor, 1 - resistance)`
pub fn resistance_factor(resistance: f32, config: &ContagionConfig) -> f32 {
    (1.0 - resistance).max(config.min_resistance_factor)
}

/// Starting severity of a new infection for a given resistance
pub fn dampened_severity(initial: f32, resistance: f32, config: &ContagionConfig) -> f32 {
    initial * resistance_factor(resistance, config)
}

/// Chance per contact check that standing on residue infects
pub fn residue_contact_chance(resistance: f32, config: &ContagionConfig) -> f32 {
    config.residue_infection_chance * resistance_factor(resistance, config)
}

/// Expose `agent`, growing an existing infection or starting a new one
pub fn try_infect(
    tracks: &mut AHashMap<AgentId, InfectionTrack>,
    agent: AgentId,
    susceptibility: Susceptibility,
    resistance: f32,
    initial: f32,
    now: Tick,
    config: &ContagionConfig,
) -> Exposure {
    if susceptibility != Susceptibility::Susceptible {
        return Exposure::Blocked(susceptibility);
    }

    match tracks.get_mut(&agent) {
        Some(track) => {
            track.grow(initial * config.existing_infection_growth);
            Exposure::Grew(track.severity())
        }
        None => {
            let track = InfectionTrack::new(dampened_severity(initial, resistance, config), now);
            let severity = track.severity();
            tracks.insert(agent, track);
            Exposure::Started(severity)
        }
    }
}
