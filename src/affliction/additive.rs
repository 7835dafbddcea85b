//! Protective payloads carried by treated food
//!
//! A cook mixes the additive into a meal; whoever eats it gains resistance
//! scaled by the cook's skill.

use serde::{Deserialize, Serialize};

use crate::affliction::protection::ProtectionKind;
use crate::core::config::ProtectionConfig;
use crate::core::types::Tick;

/// Effect embedded in an ingestible item
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectPayload {
    pub kind: ProtectionKind,
    pub strength: f32,
    pub duration: Tick,
}

impl EffectPayload {
    /// Resistance payload of a meal cooked at `cooking_skill`
    pub fn treated_meal(cooking_skill: u32, config: &ProtectionConfig) -> Self {
        let strength = config.additive_base_strength + cooking_skill as f32 / config.additive_skill_divisor;
        Self {
            kind: ProtectionKind::Resistance,
            strength,
            duration: (strength * config.additive_ticks_per_strength).round() as Tick,
        }
    }

    /// Serum-style payload granting immunity for `duration`
    pub fn serum(duration: Tick) -> Self {
        Self {
            kind: ProtectionKind::Immunity,
            strength: 1.0,
            duration,
        }
    }
}
