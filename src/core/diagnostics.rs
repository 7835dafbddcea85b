//! Developer-visible failure log
//!
//! Missing definitions warn once per kind; missing context is counted and
//! logged at debug level because it retries on the next tick.

use ahash::AHashMap;

use crate::core::registry::DefinitionKind;

#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    missing: AHashMap<DefinitionKind, u32>,
    missing_context: u64,
    warnings: u32,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn missing_definition(&mut self, kind: DefinitionKind) {
        let count = self.missing.entry(kind).or_insert(0);
        *count += 1;
        if *count == 1 {
            self.warnings += 1;
            tracing::warn!("definition {:?} is not loaded; dependent behavior disabled", kind);
        }
    }

    pub fn missing_context(&mut self, what: &str) {
        self.missing_context += 1;
        tracing::debug!("skipping {}: context unavailable this tick", what);
    }

    pub fn missing_count(&self, kind: DefinitionKind) -> u32 {
        self.missing.get(&kind).copied().unwrap_or(0)
    }

    pub fn missing_context_count(&self) -> u64 {
        self.missing_context
    }

    pub fn warnings_emitted(&self) -> u32 {
        self.warnings
    }

    /// Forget everything, so a fresh run warns again
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warns_once_per_kind() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.missing_definition(DefinitionKind::Residue);
        diagnostics.missing_definition(DefinitionKind::Residue);
        diagnostics.missing_definition(DefinitionKind::Starvation);
        assert_eq!(diagnostics.warnings_emitted(), 2);
        assert_eq!(diagnostics.missing_count(DefinitionKind::Residue), 2);
    }

    #[test]
    fn test_reset_clears_counts() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.missing_definition(DefinitionKind::Residue);
        diagnostics.missing_context("hunt");
        diagnostics.reset();
        assert_eq!(diagnostics.warnings_emitted(), 0);
        assert_eq!(diagnostics.missing_context_count(), 0);
    }
}
