//! Per-agent infection progression
//!
//! Severity climbs toward 1.0 every tick. On a corpse the climb is boosted and
//! scaled by how close the ambient temperature is to the owner's comfort band.
//! A corpse that reaches full severity transforms exactly once.

use serde::{Deserialize, Serialize};

use crate::core::clock::per_tick;
use crate::core::config::InfectionConfig;
use crate::core::types::{ComfortBand, Tick};

/// Environmental signals sampled by the world for one infection tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InfectionInput {
    pub ambient_temperature: f32,
    pub comfort: ComfortBand,
    pub deceased: bool,
    pub on_residue: bool,
}

/// Result of one infection tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackStatus {
    Progressing,
    /// The owner must now be turned; repeats every tick until the track is dropped
    Transform,
}

/// Result of applying a protection to the infection
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProtectionOutcome {
    Reduced(f32),
    Cured,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfectionTrack {
    severity: f32,
    created_at: Tick,
    /// `None` forces a recompute on the next corpse tick
    last_multiplier_calc: Option<Tick>,
    cached_multiplier: f32,
}

/// Progression scale for a temperature relative to a comfort band
///
/// 1.0 inside the band, falling linearly to 0.0 at `comfort_margin` degrees
/// outside either edge, and 0.0 beyond the absolute extremes.
pub fn temperature_multiplier(temperature: f32, band: ComfortBand, config: &InfectionConfig) -> f32 {
    if temperature < config.absolute_min_temperature || temperature > config.absolute_max_temperature {
        return 0.0;
    }
    if band.contains(temperature) {
        return 1.0;
    }
    let outside = if temperature < band.min {
        band.min - temperature
    } else {
        temperature - band.max
    };
    (1.0 - outside / config.comfort_margin).clamp(0.0, 1.0)
}

impl InfectionTrack {
    pub fn new(initial_severity: f32, now: Tick) -> Self {
        Self {
            severity: initial_severity.clamp(0.0, 1.0),
            created_at: now,
            last_multiplier_calc: None,
            cached_multiplier: 1.0,
        }
    }

    pub fn severity(&self) -> f32 {
        self.severity
    }

    pub fn created_at(&self) -> Tick {
        self.created_at
    }

    pub fn cached_multiplier(&self) -> f32 {
        self.cached_multiplier
    }

    /// Force a multiplier recompute on the next tick, used when the owner dies
    pub fn invalidate_multiplier(&mut self) {
        self.last_multiplier_calc = None;
    }

    /// Add severity from a fresh exposure
    pub fn grow(&mut self, amount: f32) {
        self.severity = (self.severity + amount).clamp(0.0, 1.0);
    }

    /// Host-driven severity change
    pub fn set_severity(&mut self, severity: f32) {
        self.severity = severity.clamp(0.0, 1.0);
    }

    /// Recompute the cached temperature multiplier if it is due
    fn refresh_multiplier(&mut self, now: Tick, input: &InfectionInput, config: &InfectionConfig) {
        let due = match self.last_multiplier_calc {
            None => true,
            Some(last) => now.saturating_sub(last) >= config.multiplier_refresh_interval,
        };
        if due {
            self.cached_multiplier = temperature_multiplier(input.ambient_temperature, input.comfort, config);
            self.last_multiplier_calc = Some(now);
        }
    }

    /// Per-tick severity delta for the current inputs
    pub fn delta(&self, input: &InfectionInput, rate_per_day: f32, config: &InfectionConfig) -> f32 {
        let mut delta = per_tick(rate_per_day);
        if input.deceased {
            delta *= config.deceased_boost * self.cached_multiplier;
        }
        if input.on_residue {
            delta *= config.residue_contact_multiplier;
        }
        delta
    }

    /// Advance one tick
    ///
    /// The multiplier is refreshed before severity moves, so a freshly dead
    /// owner progresses at the new rate on the same tick. A full corpse keeps
    /// reporting `Transform`; turning the owner removes the track.
    pub fn tick(&mut self, now: Tick, input: &InfectionInput, rate_per_day: f32, config: &InfectionConfig) -> TrackStatus {
        if input.deceased {
            self.refresh_multiplier(now, input, config);
        }

        let delta = self.delta(input, rate_per_day, config);
        self.severity = (self.severity + delta).clamp(0.0, 1.0);

        if input.deceased && self.severity >= config.transform_threshold {
            return TrackStatus::Transform;
        }
        TrackStatus::Progressing
    }

    /// Knock severity back by `severity × effectiveness × factor`
    pub fn apply_protection(&mut self, effectiveness: f32, config: &InfectionConfig) -> ProtectionOutcome {
        self.severity = reduced_severity(self.severity, effectiveness, config);
        if self.severity <= config.cure_threshold {
            ProtectionOutcome::Cured
        } else {
            ProtectionOutcome::Reduced(self.severity)
        }
    }
}

/// `max(floor, s - s × e × factor)`
pub fn reduced_severity(severity: f32, effectiveness: f32, config: &InfectionConfig) -> f32 {
    let reduction = severity * effectiveness * config.protection_reduction_factor;
    (severity - reduction).max(config.severity_floor)
}
