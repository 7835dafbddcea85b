//! Simulation configuration with documented constants
//!
//! All tuning numbers are collected here, grouped by the component that reads
//! them. The config is resolved once (defaults, optionally overridden by a TOML
//! file) and passed by reference; there is no global instance.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::error::{BlightError, Result};
use crate::core::types::Tick;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlightConfig {
    pub infection: InfectionConfig,
    pub contagion: ContagionConfig,
    pub protection: ProtectionConfig,
    pub turned: TurnedConfig,
    pub starvation: StarvationConfig,
    pub trend: TrendConfig,
    pub population: PopulationConfig,
    pub trace: TraceConfig,
    pub terminal: TerminalConfig,
    /// Seed for the world's random stream
    pub seed: u64,
}

// === INFECTION ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InfectionConfig {
    /// Progression multiplier once the owner is deceased
    pub deceased_boost: f32,
    /// Progression multiplier while the owner lies on residue
    pub residue_contact_multiplier: f32,
    /// Ticks between temperature multiplier recomputes
    pub multiplier_refresh_interval: Tick,
    /// Degrees outside the comfort band at which progression reaches zero
    pub comfort_margin: f32,
    /// Below this absolute temperature progression stops entirely
    pub absolute_min_temperature: f32,
    /// Above this absolute temperature progression stops entirely
    pub absolute_max_temperature: f32,
    /// Severity at which a deceased owner transforms
    pub transform_threshold: f32,
    /// Fraction of `severity × effectiveness` removed by a protection
    pub protection_reduction_factor: f32,
    /// Protections never push severity below this
    pub severity_floor: f32,
    /// At or below this severity the infection is cured
    pub cure_threshold: f32,
}

impl Default for InfectionConfig {
    fn default() -> Self {
        Self {
            deceased_boost: 1.5,
            residue_contact_multiplier: 1.3,
            multiplier_refresh_interval: 2_000,
            comfort_margin: 10.0,
            absolute_min_temperature: -5.0,
            absolute_max_temperature: 70.0,
            transform_threshold: 1.0,
            protection_reduction_factor: 0.5,
            severity_floor: 0.01,
            cure_threshold: 0.05,
        }
    }
}

// === CONTAGION ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContagionConfig {
    /// Severity of a fresh infection when none is specified
    pub default_initial_severity: f32,
    /// Share of the incoming severity added to an existing infection
    pub existing_infection_growth: f32,
    /// Lower bound of the resistance dampening factor `1 - resistance`
    pub min_resistance_factor: f32,
    /// Base chance per contact check to catch the infection from residue
    pub residue_infection_chance: f32,
    /// Severity of an infection caught from residue
    pub residue_infection_severity: f32,
    /// Ticks between residue contact checks for living agents
    pub contact_check_interval: Tick,
}

impl Default for ContagionConfig {
    fn default() -> Self {
        Self {
            default_initial_severity: 0.1,
            existing_infection_growth: 0.5,
            min_resistance_factor: 0.1,
            residue_infection_chance: 0.05,
            residue_infection_severity: 0.05,
            contact_check_interval: 60,
        }
    }
}

// === PROTECTION ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtectionConfig {
    /// Effectiveness multiplier of a resistance effect
    pub resistance_effectiveness: f32,
    /// Whether a fresh resistance dose also knocks back a running infection
    pub resistance_applies_to_existing: bool,
    /// Effectiveness multiplier of an immunity effect
    pub immunity_effectiveness: f32,
    /// Strength of an additive-treated meal before cook skill
    pub additive_base_strength: f32,
    /// Cook skill levels per +1.0 additive strength
    pub additive_skill_divisor: f32,
    /// Effect duration per 1.0 of additive strength
    pub additive_ticks_per_strength: f32,
}

impl Default for ProtectionConfig {
    fn default() -> Self {
        Self {
            resistance_effectiveness: 0.7,
            resistance_applies_to_existing: true,
            immunity_effectiveness: 1.0,
            additive_base_strength: 0.5,
            additive_skill_divisor: 20.0,
            additive_ticks_per_strength: 60_000.0,
        }
    }
}

// === TURNED BEHAVIOR ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnedConfig {
    /// Ticks between auto-heal pulses
    pub healing_interval: Tick,
    /// Severity removed from one injury per pulse before starvation penalty
    pub heal_amount: f32,
    /// Lower bound of the jittered environment check interval
    pub check_interval_min: Tick,
    /// Upper bound (inclusive) of the jittered environment check interval
    pub check_interval_max: Tick,
    /// Hibernation threshold sits this many degrees below the comfort minimum
    pub hibernation_offset: f32,
    /// Degrees above the threshold required before waking
    pub hibernation_margin: f32,
    /// Chance per check that a moving turned agent drops residue
    pub residue_chance: f32,
    /// Trace strength written alongside dropped residue
    pub residue_trace_strength: f32,
    /// Radius of the victim search
    pub victim_search_radius: f32,
    /// Radius within which idle turned agents are alerted to a target
    pub alert_radius: f32,
    /// Neighbouring cells that receive residue when a turned agent dies
    pub death_burst_cells: usize,
    /// Radius for the trace follower's queries
    pub trace_search_radius: f32,
    /// Weakest trace that starts a follow job
    pub min_follow_strength: f32,
    /// Follow jobs fail after this many steps
    pub max_follow_ticks: u32,
    /// Radius for idle wandering
    pub wander_radius: i32,
}

impl Default for TurnedConfig {
    fn default() -> Self {
        Self {
            healing_interval: 60,
            heal_amount: 0.01,
            check_interval_min: 300,
            check_interval_max: 600,
            hibernation_offset: 10.0,
            hibernation_margin: 2.0,
            residue_chance: 0.2,
            residue_trace_strength: 10.0,
            victim_search_radius: 20.0,
            alert_radius: 10.0,
            death_burst_cells: 3,
            trace_search_radius: 5.0,
            min_follow_strength: 5.0,
            max_follow_ticks: 300,
            wander_radius: 15,
        }
    }
}

// === STARVATION ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StarvationConfig {
    /// Above this temperature starvation accelerates
    pub hot_threshold: f32,
    /// Degrees above `hot_threshold` that double the rate
    pub hot_span: f32,
    /// Below this temperature starvation slows down
    pub cold_threshold: f32,
    /// Degrees below `cold_threshold` that stop the rate (before the floor)
    pub cold_span: f32,
    /// Cold never slows starvation below this factor
    pub min_cold_factor: f32,
    /// Severity at which critical effects can fire
    pub critical_threshold: f32,
    /// Ticks between critical effect rolls
    pub critical_check_interval: Tick,
    /// Chance multiplier applied to `severity - critical_threshold`
    pub critical_chance_factor: f32,
    /// Share of critical effects that stun
    pub stun_weight: f32,
    /// Share of critical effects that cause a frenzy
    pub frenzy_weight: f32,
}

impl Default for StarvationConfig {
    fn default() -> Self {
        Self {
            hot_threshold: 30.0,
            hot_span: 30.0,
            cold_threshold: 0.0,
            cold_span: 30.0,
            min_cold_factor: 0.2,
            critical_threshold: 0.85,
            critical_check_interval: 1_000,
            critical_chance_factor: 0.6,
            stun_weight: 0.5,
            frenzy_weight: 0.3,
        }
    }
}

// === THREAT TREND ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    /// Resting level of the trend
    pub baseline: f32,
    /// Half-width of the noise swing around the baseline
    pub amplitude: f32,
    /// Minimum ticks between recomputes
    pub update_interval: Tick,
    /// Samples kept in history
    pub history_length: usize,
    /// Default number of hourly forecast steps
    pub forecast_steps: usize,
    /// Days of simulated time per unit of noise input
    pub noise_period_days: f32,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            baseline: 0.5,
            amplitude: 0.4,
            update_interval: 900,
            history_length: 96,
            forecast_steps: 8,
            noise_period_days: 2.0,
        }
    }
}

// === POPULATION ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    /// Minimum ticks between spawn injections
    pub min_spawn_interval: Tick,
    /// Soft ceiling of turned agents per region
    pub max_population: usize,
    /// Ticks between boundary spawn point refreshes
    pub spawn_point_refresh_interval: Tick,
    /// Spawn chance per eligible pass is `trend × spawn_chance_scale`
    pub spawn_chance_scale: f32,
    /// Trend above which larger groups spawn
    pub high_trend_threshold: f32,
    /// Inclusive group size range when the trend is high
    pub high_group_size: (u32, u32),
    /// Inclusive group size range otherwise
    pub low_group_size: (u32, u32),
    /// Radius around the spawn point in which the host places new agents
    pub spawn_scatter_radius: i32,
    /// Flat value every turned agent is worth
    pub base_value: f32,
    /// Value multiplier per level
    pub level_multiplier: f32,
    /// Inclusive range of ticks an evicted agent waits before departing
    pub exit_delay: (Tick, Tick),
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            min_spawn_interval: 2_500,
            max_population: 300,
            spawn_point_refresh_interval: 500,
            spawn_chance_scale: 0.04,
            high_trend_threshold: 0.7,
            high_group_size: (2, 5),
            low_group_size: (1, 3),
            spawn_scatter_radius: 4,
            base_value: 500.0,
            level_multiplier: 0.15,
            exit_delay: (100, 250),
        }
    }
}

// === TRACE FIELD ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    /// Ticks between decay passes
    pub decay_interval: Tick,
    /// Strength lost per elapsed tick
    pub decay_per_tick: f32,
    /// Entries at or below this strength are removed
    pub floor: f32,
    /// Ticks between deposits by one living agent
    pub living_deposit_interval: Tick,
    /// Hard minimum spacing between deposits by one agent
    pub min_deposit_spacing: Tick,
    /// Strength written by a living agent
    pub living_strength: f32,
    /// Multiplier applied while the agent is bleeding
    pub bleeding_multiplier: f32,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            decay_interval: 250,
            decay_per_tick: 0.00166,
            floor: 0.1,
            living_deposit_interval: 60,
            min_deposit_spacing: 2,
            living_strength: 20.0,
            bleeding_multiplier: 2.0,
        }
    }
}

// === TERMINAL EFFECTS ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    /// Taint removed by one residue extraction
    pub extraction_amount: f32,
    /// Taint at or below this is removed after an extraction
    pub extraction_floor: f32,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            extraction_amount: 0.25,
            extraction_floor: 0.1,
        }
    }
}

impl BlightConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a (possibly partial) TOML document over the defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: BlightConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(BlightError::InvalidConfig(msg));

        if self.turned.check_interval_min == 0 || self.turned.check_interval_min > self.turned.check_interval_max {
            return invalid(format!(
                "turned.check_interval_min ({}) must be > 0 and <= check_interval_max ({})",
                self.turned.check_interval_min, self.turned.check_interval_max
            ));
        }

        if self.turned.hibernation_margin < 0.0 {
            return invalid("turned.hibernation_margin must be >= 0".into());
        }

        for (name, p) in [
            ("turned.residue_chance", self.turned.residue_chance),
            ("contagion.residue_infection_chance", self.contagion.residue_infection_chance),
            ("trend.baseline", self.trend.baseline),
            ("trend.amplitude", self.trend.amplitude),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return invalid(format!("{} ({}) must be within [0, 1]", name, p));
            }
        }

        if self.starvation.stun_weight + self.starvation.frenzy_weight > 1.0 {
            return invalid("starvation stun_weight + frenzy_weight must be <= 1".into());
        }

        if self.infection.cure_threshold < self.infection.severity_floor {
            return invalid(format!(
                "infection.cure_threshold ({}) must be >= severity_floor ({})",
                self.infection.cure_threshold, self.infection.severity_floor
            ));
        }

        if self.infection.comfort_margin <= 0.0 {
            return invalid("infection.comfort_margin must be positive".into());
        }

        if self.trend.update_interval == 0 || self.trend.history_length == 0 {
            return invalid("trend.update_interval and trend.history_length must be positive".into());
        }

        let ordered = |(lo, hi): (u32, u32)| lo >= 1 && lo <= hi;
        if !ordered(self.population.high_group_size) || !ordered(self.population.low_group_size) {
            return invalid("population group size ranges must be ordered and start at >= 1".into());
        }

        if self.population.exit_delay.0 > self.population.exit_delay.1 {
            return invalid("population.exit_delay must be an ordered range".into());
        }

        if self.trace.decay_interval == 0 || self.trace.decay_per_tick < 0.0 {
            return invalid("trace.decay_interval must be > 0 and decay_per_tick >= 0".into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(BlightConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_overrides_defaults() {
        let config = BlightConfig::from_toml_str(
            r#"
            seed = 7

            [population]
            max_population = 12

            [turned]
            hibernation_margin = 3.0
            "#,
        )
        .unwrap();

        assert_eq!(config.seed, 7);
        assert_eq!(config.population.max_population, 12);
        assert_eq!(config.population.min_spawn_interval, 2_500);
        assert_eq!(config.turned.hibernation_margin, 3.0);
        assert_eq!(config.turned.healing_interval, 60);
    }

    #[test]
    fn test_invalid_check_interval_rejected() {
        let mut config = BlightConfig::default();
        config.turned.check_interval_min = 700;
        assert!(matches!(config.validate(), Err(BlightError::InvalidConfig(_))));
    }

    #[test]
    fn test_bad_toml_is_parse_error() {
        let result = BlightConfig::from_toml_str("[population\nmax_population = 1");
        assert!(matches!(result, Err(BlightError::TomlError(_))));
    }

    #[test]
    fn test_out_of_range_probability_rejected() {
        let mut config = BlightConfig::default();
        config.turned.residue_chance = 1.5;
        assert!(config.validate().is_err());
    }
}
