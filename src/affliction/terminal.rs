//! Conditions left on a turned body after its final death

use serde::{Deserialize, Serialize};

use crate::core::clock::per_tick;
use crate::core::config::TerminalConfig;
use crate::core::registry::AfflictionDef;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Extraction {
    /// Taint left after the harvest
    Harvested(f32),
    /// Last harvest; the taint is gone
    Depleted,
    /// Nothing to harvest
    Empty,
}

/// Decaying harvestable taint plus transient weakness
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TerminalEffects {
    taint: Option<f32>,
    taint_rate: f32,
    weakness: Option<f32>,
    weakness_rate: f32,
}

impl TerminalEffects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn taint(&self) -> Option<f32> {
        self.taint
    }

    pub fn weakness(&self) -> Option<f32> {
        self.weakness
    }

    pub fn is_empty(&self) -> bool {
        self.taint.is_none() && self.weakness.is_none()
    }

    pub fn attach_taint(&mut self, def: &AfflictionDef) {
        self.taint = Some(def.initial_severity.clamp(0.0, 1.0));
        self.taint_rate = def.severity_per_day;
    }

    /// Weakness is not refreshed while a previous one is still wearing off
    pub fn attach_weakness(&mut self, def: &AfflictionDef) {
        if matches!(self.weakness, Some(w) if w > 0.0) {
            return;
        }
        self.weakness = Some(def.initial_severity.clamp(0.0, 1.0));
        self.weakness_rate = def.severity_per_day;
    }

    pub fn tick(&mut self) {
        for (slot, rate) in [(&mut self.taint, self.taint_rate), (&mut self.weakness, self.weakness_rate)] {
            if let Some(value) = slot {
                *value = (*value + per_tick(rate)).clamp(0.0, 1.0);
                if *value <= 0.0 {
                    *slot = None;
                }
            }
        }
    }

    /// Harvest residue from the corpse
    pub fn extract(&mut self, config: &TerminalConfig) -> Extraction {
        let Some(taint) = self.taint else {
            return Extraction::Empty;
        };
        let left = taint - config.extraction_amount;
        if left <= config.extraction_floor {
            self.taint = None;
            Extraction::Depleted
        } else {
            self.taint = Some(left);
            Extraction::Harvested(left)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::TICKS_PER_DAY;

    fn effects() -> TerminalEffects {
        let mut effects = TerminalEffects::new();
        effects.attach_taint(&AfflictionDef::new("taint", 1.0, -0.05));
        effects.attach_weakness(&AfflictionDef::new("weakness", 0.6, -0.1));
        effects
    }

    #[test]
    fn test_extraction_depletes_after_four_harvests() {
        let config = TerminalConfig::default();
        let mut effects = effects();
        assert_eq!(effects.extract(&config), Extraction::Harvested(0.75));
        assert_eq!(effects.extract(&config), Extraction::Harvested(0.5));
        assert_eq!(effects.extract(&config), Extraction::Harvested(0.25));
        assert_eq!(effects.extract(&config), Extraction::Depleted);
        assert_eq!(effects.extract(&config), Extraction::Empty);
    }

    #[test]
    fn test_weakness_recovers_over_six_days() {
        let mut effects = effects();
        for _ in 0..(5 * TICKS_PER_DAY) {
            effects.tick();
        }
        assert!(effects.weakness().is_some());
        for _ in 0..(2 * TICKS_PER_DAY) {
            effects.tick();
        }
        assert!(effects.weakness().is_none());
        assert!(effects.taint().unwrap() < 0.7);
    }

    #[test]
    fn test_weakness_not_reapplied_while_present() {
        let mut effects = effects();
        for _ in 0..1_000 {
            effects.tick();
        }
        let before = effects.weakness();
        effects.attach_weakness(&AfflictionDef::new("weakness", 0.6, -0.1));
        assert_eq!(effects.weakness(), before);
    }
}
