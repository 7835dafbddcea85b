//! Typed registry of content definitions
//!
//! Built once at load time and passed by reference. Lookups return `Option`;
//! callers decide whether a missing entry degrades to a no-op.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::diagnostics::Diagnostics;
use crate::core::types::FactionId;

/// Stable identifiers for everything the core resolves from host content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DefinitionKind {
    Infection,
    Resistance,
    Immunity,
    TurnedState,
    Starvation,
    CorpseTaint,
    PostTransformWeakness,
    Residue,
    HostileFaction,
}

impl DefinitionKind {
    pub const AFFLICTIONS: [DefinitionKind; 7] = [
        DefinitionKind::Infection,
        DefinitionKind::Resistance,
        DefinitionKind::Immunity,
        DefinitionKind::TurnedState,
        DefinitionKind::Starvation,
        DefinitionKind::CorpseTaint,
        DefinitionKind::PostTransformWeakness,
    ];
}

/// Resolved affliction definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AfflictionDef {
    pub label: String,
    /// Severity the affliction starts at when attached
    pub initial_severity: f32,
    /// Natural severity change per day (negative = recovers)
    pub severity_per_day: f32,
}

impl AfflictionDef {
    pub fn new(label: impl Into<String>, initial_severity: f32, severity_per_day: f32) -> Self {
        Self {
            label: label.into(),
            initial_severity,
            severity_per_day,
        }
    }
}

/// Registry mapping definition kinds to resolved definitions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefinitionRegistry {
    afflictions: AHashMap<DefinitionKind, AfflictionDef>,
    hostile_faction: Option<FactionId>,
    residue_defined: bool,
}

impl DefinitionRegistry {
    /// Empty registry: every lookup misses
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the standard content set, using `hostile_faction` for turned agents
    pub fn standard(hostile_faction: FactionId) -> Self {
        let mut registry = Self::new();
        registry.define(DefinitionKind::Infection, AfflictionDef::new("blight infection", 0.1, 0.25));
        registry.define(DefinitionKind::Resistance, AfflictionDef::new("blight resistance", 0.5, 0.0));
        registry.define(DefinitionKind::Immunity, AfflictionDef::new("blight immunity", 1.0, 0.0));
        registry.define(DefinitionKind::TurnedState, AfflictionDef::new("blight turned", 1.0, 0.0));
        registry.define(DefinitionKind::Starvation, AfflictionDef::new("blight starvation", 0.01, 0.1));
        registry.define(DefinitionKind::CorpseTaint, AfflictionDef::new("blight corpse taint", 1.0, -0.05));
        registry.define(
            DefinitionKind::PostTransformWeakness,
            AfflictionDef::new("post-blight weakness", 0.6, -0.1),
        );
        registry.residue_defined = true;
        registry.hostile_faction = Some(hostile_faction);
        registry
    }

    pub fn define(&mut self, kind: DefinitionKind, def: AfflictionDef) {
        self.afflictions.insert(kind, def);
    }

    /// Drop a definition, as if the host content never loaded it
    pub fn undefine(&mut self, kind: DefinitionKind) {
        match kind {
            DefinitionKind::HostileFaction => self.hostile_faction = None,
            DefinitionKind::Residue => self.residue_defined = false,
            _ => {
                self.afflictions.remove(&kind);
            }
        }
    }

    pub fn affliction(&self, kind: DefinitionKind) -> Option<&AfflictionDef> {
        self.afflictions.get(&kind)
    }

    pub fn hostile_faction(&self) -> Option<FactionId> {
        self.hostile_faction
    }

    pub fn has_residue(&self) -> bool {
        self.residue_defined
    }

    /// Lookup that logs a single warning per missing kind
    pub fn require(&self, kind: DefinitionKind, diagnostics: &mut Diagnostics) -> Option<&AfflictionDef> {
        let def = self.afflictions.get(&kind);
        if def.is_none() {
            diagnostics.missing_definition(kind);
        }
        def
    }

    pub fn require_hostile_faction(&self, diagnostics: &mut Diagnostics) -> Option<FactionId> {
        if self.hostile_faction.is_none() {
            diagnostics.missing_definition(DefinitionKind::HostileFaction);
        }
        self.hostile_faction
    }

    pub fn require_residue(&self, diagnostics: &mut Diagnostics) -> bool {
        if !self.residue_defined {
            diagnostics.missing_definition(DefinitionKind::Residue);
        }
        self.residue_defined
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_registry_defines_all_afflictions() {
        let registry = DefinitionRegistry::standard(FactionId(9));
        for kind in DefinitionKind::AFFLICTIONS {
            assert!(registry.affliction(kind).is_some(), "{:?} missing", kind);
        }
        assert_eq!(registry.hostile_faction(), Some(FactionId(9)));
        assert!(registry.has_residue());
    }

    #[test]
    fn test_require_missing_warns_once() {
        let mut registry = DefinitionRegistry::standard(FactionId(1));
        registry.undefine(DefinitionKind::CorpseTaint);
        let mut diagnostics = Diagnostics::new();

        assert!(registry.require(DefinitionKind::CorpseTaint, &mut diagnostics).is_none());
        assert!(registry.require(DefinitionKind::CorpseTaint, &mut diagnostics).is_none());
        assert_eq!(diagnostics.missing_count(DefinitionKind::CorpseTaint), 2);
        assert_eq!(diagnostics.warnings_emitted(), 1);
    }

    #[test]
    fn test_undefine_hostile_faction() {
        let mut registry = DefinitionRegistry::standard(FactionId(1));
        registry.undefine(DefinitionKind::HostileFaction);
        let mut diagnostics = Diagnostics::new();
        assert_eq!(registry.require_hostile_faction(&mut diagnostics), None);
        assert_eq!(diagnostics.warnings_emitted(), 1);
    }
}
