//! Tunable simulation parameters.
//!
//! Every section deserializes with `#[serde(default)]`, so a config file only
//! needs the values it wants to override:
//!
//! ```json
//! { "water_cycle": { "evaporation_coefficient": 2e-4 } }
//! ```

use crate::constants::*;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub phase: PhaseThresholds,
    pub ledger: LedgerConfig,
    pub atmosphere: AtmosphereConfig,
    pub water_cycle: WaterCycleConfig,
    pub geology: GeologyConfig,
}

impl SimulationConfig {
    pub fn from_json_str(json_str: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json_str)?)
    }

    pub fn load<P: AsRef<Path>>(file_path: P) -> Result<Self, ConfigError> {
        let json_str = fs::read_to_string(file_path)?;
        Self::from_json_str(&json_str)
    }
}

/// Thresholds for the exotic physical states.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseThresholds {
    pub plasma_min_temperature_k: f64,
    pub metallic_hydrogen_min_pressure_atm: f64,
    pub superfluid_max_temperature_k: f64,
    pub superfluid_min_pressure_atm: f64,
}

impl Default for PhaseThresholds {
    fn default() -> Self {
        Self {
            plasma_min_temperature_k: PLASMA_MIN_TEMP_K,
            metallic_hydrogen_min_pressure_atm: METALLIC_HYDROGEN_MIN_PRESSURE_ATM,
            superfluid_max_temperature_k: SUPERFLUID_MAX_TEMP_K,
            superfluid_min_pressure_atm: SUPERFLUID_MIN_PRESSURE_ATM,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Keep records that reach exactly zero instead of pruning them.
    /// Applies to every sphere kind alike.
    pub retain_zero_records: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtmosphereConfig {
    pub composition_tolerance_pct: f64,
}

impl Default for AtmosphereConfig {
    fn default() -> Self {
        Self {
            composition_tolerance_pct: COMPOSITION_TOLERANCE_PCT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterCycleConfig {
    /// Catalog id of the primary volatile moved by the water cycle.
    pub primary_liquid: String,
    /// Fraction of the stored liquid that evaporates per tick at the boiling point.
    pub evaporation_coefficient: f64,
    /// Fraction of the stored vapor that precipitates per tick at the melting point.
    pub precipitation_coefficient: f64,
    pub transition_width_k: f64,
    pub latent_heat_j_per_mol: f64,
    pub min_pressure_atm: f64,
}

impl Default for WaterCycleConfig {
    fn default() -> Self {
        Self {
            primary_liquid: "water".to_string(),
            evaporation_coefficient: EVAPORATION_COEFFICIENT,
            precipitation_coefficient: PRECIPITATION_COEFFICIENT,
            transition_width_k: PHASE_TRANSITION_WIDTH_K,
            latent_heat_j_per_mol: WATER_LATENT_HEAT_J_PER_MOL,
            min_pressure_atm: WATER_TRIPLE_POINT_PRESSURE_ATM,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeologyConfig {
    pub volatile_release_per_k: f64,
    pub core_heat_min_k: f64,
    pub core_heat_max_k: f64,
    pub radioactive_reference_fraction: f64,
    pub mantle_reference_fraction: f64,
    pub core_heat_weight: f64,
    pub radioactive_weight: f64,
    pub mantle_weight: f64,
    pub crust_pressure_atm: f64,
    pub mantle_pressure_atm: f64,
    pub core_pressure_atm: f64,
}

impl Default for GeologyConfig {
    fn default() -> Self {
        Self {
            volatile_release_per_k: VOLATILE_RELEASE_PER_K,
            core_heat_min_k: CORE_HEAT_MIN_K,
            core_heat_max_k: CORE_HEAT_MAX_K,
            radioactive_reference_fraction: RADIOACTIVE_REFERENCE_FRACTION,
            mantle_reference_fraction: MANTLE_REFERENCE_FRACTION,
            core_heat_weight: 0.5,
            radioactive_weight: 0.3,
            mantle_weight: 0.2,
            crust_pressure_atm: CRUST_PRESSURE_ATM,
            mantle_pressure_atm: MANTLE_PRESSURE_ATM,
            core_pressure_atm: CORE_PRESSURE_ATM,
        }
    }
}
