//! Resistance and immunity effects
//!
//! One parametrized effect type; the kind selects its coefficients. Immunity
//! dominates: applying it removes any resistance, and while it is active no
//! resistance can be added.

use serde::{Deserialize, Serialize};

use crate::core::config::ProtectionConfig;
use crate::core::types::Tick;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProtectionKind {
    Resistance,
    Immunity,
}

/// Coefficients that distinguish the protection kinds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProtectionProfile {
    /// Whether applying the effect knocks back an infection already in progress
    pub applies_to_existing: bool,
    pub effectiveness: f32,
}

impl ProtectionKind {
    pub fn profile(&self, config: &ProtectionConfig) -> ProtectionProfile {
        match self {
            Self::Resistance => ProtectionProfile {
                applies_to_existing: config.resistance_applies_to_existing,
                effectiveness: config.resistance_effectiveness,
            },
            Self::Immunity => ProtectionProfile {
                applies_to_existing: true,
                effectiveness: config.immunity_effectiveness,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProtectionEffect {
    pub kind: ProtectionKind,
    pub strength: f32,
    pub remaining_ticks: Tick,
}

impl ProtectionEffect {
    /// Effectiveness against an existing infection, scaled by strength
    pub fn effectiveness(&self, config: &ProtectionConfig) -> f32 {
        (self.kind.profile(config).effectiveness * self.strength).clamp(0.0, 1.0)
    }
}

/// What `ProtectionSet::apply` did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ApplyOutcome {
    /// Effect is active; carry `effectiveness` against an existing infection if set
    Applied { knockback: Option<f32> },
    /// Blocked by a stronger active effect
    Ignored,
}

/// Active protections on one agent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProtectionSet {
    resistance: Option<ProtectionEffect>,
    immunity: Option<ProtectionEffect>,
}

impl ProtectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.resistance.is_none() && self.immunity.is_none()
    }

    pub fn is_immune(&self) -> bool {
        self.immunity.is_some()
    }

    /// Active resistance strength, 0.0 without resistance
    pub fn resistance_strength(&self) -> f32 {
        self.resistance.map(|r| r.strength).unwrap_or(0.0)
    }

    pub fn get(&self, kind: ProtectionKind) -> Option<&ProtectionEffect> {
        match kind {
            ProtectionKind::Resistance => self.resistance.as_ref(),
            ProtectionKind::Immunity => self.immunity.as_ref(),
        }
    }

    /// Add or reinforce an effect
    ///
    /// Re-application raises strength (capped at 1.0) and never shortens the
    /// remaining duration.
    pub fn apply(&mut self, kind: ProtectionKind, strength: f32, duration: Tick, config: &ProtectionConfig) -> ApplyOutcome {
        let strength = strength.clamp(0.0, 1.0);
        let slot = match kind {
            ProtectionKind::Resistance => {
                if self.immunity.is_some() {
                    return ApplyOutcome::Ignored;
                }
                &mut self.resistance
            }
            ProtectionKind::Immunity => {
                self.resistance = None;
                &mut self.immunity
            }
        };

        let effect = match slot {
            Some(existing) => {
                existing.strength = (existing.strength + strength).min(1.0);
                existing.remaining_ticks = existing.remaining_ticks.max(duration);
                *existing
            }
            None => {
                let effect = ProtectionEffect {
                    kind,
                    strength,
                    remaining_ticks: duration,
                };
                *slot = Some(effect);
                effect
            }
        };

        let profile = kind.profile(config);
        let knockback = profile.applies_to_existing.then(|| match kind {
            // Immunity wipes with its full effectiveness regardless of dose
            ProtectionKind::Immunity => profile.effectiveness.clamp(0.0, 1.0),
            ProtectionKind::Resistance => effect.effectiveness(config),
        });
        ApplyOutcome::Applied { knockback }
    }

    /// Count down remaining durations; returns kinds that expired
    pub fn tick(&mut self, elapsed: Tick) -> Vec<ProtectionKind> {
        let mut expired = Vec::new();
        for slot in [&mut self.resistance, &mut self.immunity] {
            if let Some(effect) = slot {
                effect.remaining_ticks = effect.remaining_ticks.saturating_sub(elapsed);
                if effect.remaining_ticks == 0 {
                    expired.push(effect.kind);
                    *slot = None;
                }
            }
        }
        expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reapply_resistance_accumulates() {
        let config = ProtectionConfig::default();
        let mut set = ProtectionSet::new();
        set.apply(ProtectionKind::Resistance, 0.6, 1_000, &config);
        set.apply(ProtectionKind::Resistance, 0.6, 400, &config);

        let r = set.get(ProtectionKind::Resistance).unwrap();
        assert_eq!(r.strength, 1.0);
        assert_eq!(r.remaining_ticks, 1_000);
    }

    #[test]
    fn test_immunity_removes_resistance() {
        let config = ProtectionConfig::default();
        let mut set = ProtectionSet::new();
        set.apply(ProtectionKind::Resistance, 0.5, 1_000, &config);
        let outcome = set.apply(ProtectionKind::Immunity, 1.0, 5_000, &config);

        assert!(set.is_immune());
        assert_eq!(set.resistance_strength(), 0.0);
        assert_eq!(outcome, ApplyOutcome::Applied { knockback: Some(1.0) });
        assert_eq!(set.apply(ProtectionKind::Resistance, 0.5, 1_000, &config), ApplyOutcome::Ignored);
    }

    #[test]
    fn test_resistance_knockback_scaled_by_strength() {
        let config = ProtectionConfig::default();
        let mut set = ProtectionSet::new();
        match set.apply(ProtectionKind::Resistance, 0.5, 100, &config) {
            ApplyOutcome::Applied { knockback: Some(e) } => assert!((e - 0.35).abs() < 1e-6),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_effects_expire() {
        let config = ProtectionConfig::default();
        let mut set = ProtectionSet::new();
        set.apply(ProtectionKind::Resistance, 0.5, 10, &config);
        assert!(set.tick(9).is_empty());
        assert_eq!(set.tick(1), vec![ProtectionKind::Resistance]);
        assert!(set.is_empty());
    }
}
