use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::managers::weather::{default_weather_registry, WeatherEffect};

/// Engine-wide tunables, loaded from defaults and optionally overlaid from a
/// JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub trace_extended: bool,
    pub max_rounds: u32,
    pub periodic_can_crit: bool,
    /// Whether a heal's crit roll (always drawn, to keep the crit stream in
    /// lockstep with damage-only rounds) is allowed to boost the final heal.
    pub heal_can_crit: bool,
    /// Crit chance used by both the damage and heal pipelines.
    pub crit_chance: f64,
    /// Event-type integer (from a loaded ability pack) -> phase string.
    /// Default maps `6 -> TURN_START`, `7 -> TURN_END`.
    pub event_phase_map: HashMap<i64, String>,
    #[serde(skip)]
    pub weather_registry: HashMap<i64, WeatherEffect>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let mut event_phase_map = HashMap::new();
        event_phase_map.insert(6, "TURN_START".to_string());
        event_phase_map.insert(7, "TURN_END".to_string());
        Self {
            trace_extended: false,
            max_rounds: 100,
            periodic_can_crit: false,
            heal_can_crit: false,
            crit_chance: 0.05,
            event_phase_map,
            weather_registry: default_weather_registry(),
        }
    }
}

impl EngineConfig {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let mut cfg: EngineConfig = serde_json::from_str(text)?;
        if cfg.weather_registry.is_empty() {
            cfg.weather_registry = default_weather_registry();
        }
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_event_phase_map_has_turn_boundaries() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.event_phase_map.get(&6).unwrap(), "TURN_START");
        assert_eq!(cfg.event_phase_map.get(&7).unwrap(), "TURN_END");
    }

    #[test]
    fn from_json_overlays_partial_fields() {
        let cfg = EngineConfig::from_json(r#"{"max_rounds": 30}"#).unwrap();
        assert_eq!(cfg.max_rounds, 30);
        assert!(!cfg.weather_registry.is_empty());
    }
}
