//! Environmental scaling of the threat trend

use serde::{Deserialize, Serialize};

use crate::core::types::RegionId;
use crate::host::{SpatialQuery, WeatherKind};

/// Outdoor conditions sampled once per trend update
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThreatEnvironment {
    pub temperature: f32,
    pub weather: WeatherKind,
    pub toxic_fallout: bool,
}

impl Default for ThreatEnvironment {
    fn default() -> Self {
        Self {
            temperature: 20.0,
            weather: WeatherKind::Clear,
            toxic_fallout: false,
        }
    }
}

impl ThreatEnvironment {
    /// Read the region's current conditions; `None` if the host has no temperature for it
    pub fn sample<S: SpatialQuery + ?Sized>(host: &S, region: RegionId) -> Option<Self> {
        Some(Self {
            temperature: host.outdoor_temperature(region)?,
            weather: host.weather(region),
            toxic_fallout: host.toxic_fallout(region),
        })
    }

    /// Heat makes the blight restless, deep cold quiets it
    pub fn temperature_multiplier(&self) -> f32 {
        match self.temperature {
            t if t < -40.0 => 0.5,
            t if t < -20.0 => 0.7,
            t if t < 0.0 => 0.95,
            t if t < 35.0 => 1.0,
            t if t < 45.0 => 1.15,
            _ => 1.3,
        }
    }

    /// Fallout overrides whatever the sky is doing
    pub fn weather_multiplier(&self) -> f32 {
        if self.toxic_fallout {
            return 0.9;
        }
        match self.weather {
            WeatherKind::Thunderstorm => 1.1,
            WeatherKind::Rain => 0.95,
            WeatherKind::Clear | WeatherKind::Fog | WeatherKind::Snow => 1.0,
        }
    }

    pub fn multiplier(&self) -> f32 {
        self.temperature_multiplier() * self.weather_multiplier()
    }
}
