use crate::config::PhaseThresholds;
use crate::constants::{DEFAULT_BOILING_POINT_K, DEFAULT_MELTING_POINT_K, STANDARD_PRESSURE_ATM};
use crate::material_catalog::MaterialProperties;
use serde::{Deserialize, Serialize};
use std::fmt;

/// States reached only under extreme conditions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExoticState {
    MetallicHydrogen,
    Plasma,
    Superfluid,
}

/// Physical state of a stored material.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialState {
    Solid,
    Liquid,
    Gas,
    Exotic(ExoticState),
}

impl MaterialState {
    /// Position in the solid < liquid < gas ordering; exotic states are unordered.
    pub fn rank(self) -> Option<u8> {
        match self {
            MaterialState::Solid => Some(0),
            MaterialState::Liquid => Some(1),
            MaterialState::Gas => Some(2),
            MaterialState::Exotic(_) => None,
        }
    }
}

impl fmt::Display for MaterialState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaterialState::Solid => write!(f, "solid"),
            MaterialState::Liquid => write!(f, "liquid"),
            MaterialState::Gas => write!(f, "gas"),
            MaterialState::Exotic(ExoticState::MetallicHydrogen) => write!(f, "metallic_hydrogen"),
            MaterialState::Exotic(ExoticState::Plasma) => write!(f, "plasma"),
            MaterialState::Exotic(ExoticState::Superfluid) => write!(f, "superfluid"),
        }
    }
}

/// Maps (material, temperature, pressure) to a physical state.
///
/// Temperatures are Kelvin, pressures are atm. Unknown materials and
/// catalog entries without phase data resolve against water-like melting and
/// boiling points instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StateResolver {
    thresholds: PhaseThresholds,
}

impl StateResolver {
    pub fn new(thresholds: PhaseThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &PhaseThresholds {
        &self.thresholds
    }

    /// Melting and boiling points used for `material`. If either value is
    /// missing both fall back to the default pair.
    pub fn phase_points(material: Option<&MaterialProperties>) -> (f64, f64) {
        match material.map(|m| (m.melting_point, m.boiling_point)) {
            Some((Some(melting), Some(boiling))) => (melting, boiling),
            _ => (DEFAULT_MELTING_POINT_K, DEFAULT_BOILING_POINT_K),
        }
    }

    pub fn state_at(
        &self,
        material: Option<&MaterialProperties>,
        temperature_k: f64,
        pressure_atm: f64,
    ) -> MaterialState {
        if let Some(exotic) = self.exotic_state(material, temperature_k, pressure_atm) {
            return MaterialState::Exotic(exotic);
        }

        let (melting, boiling) = Self::phase_points(material);
        if temperature_k < melting {
            MaterialState::Solid
        } else if temperature_k < boiling {
            MaterialState::Liquid
        } else {
            MaterialState::Gas
        }
    }

    pub fn state_at_standard(&self, material: Option<&MaterialProperties>, temperature_k: f64) -> MaterialState {
        self.state_at(material, temperature_k, STANDARD_PRESSURE_ATM)
    }

    fn exotic_state(
        &self,
        material: Option<&MaterialProperties>,
        temperature_k: f64,
        pressure_atm: f64,
    ) -> Option<ExoticState> {
        if temperature_k > self.thresholds.plasma_min_temperature_k {
            return Some(ExoticState::Plasma);
        }

        let formula = material.map(|m| m.chemical_formula.as_str());
        match formula {
            Some("H2") if pressure_atm > self.thresholds.metallic_hydrogen_min_pressure_atm => {
                Some(ExoticState::MetallicHydrogen)
            }
            Some("He")
                if temperature_k < self.thresholds.superfluid_max_temperature_k
                    && pressure_atm >= self.thresholds.superfluid_min_pressure_atm =>
            {
                Some(ExoticState::Superfluid)
            }
            _ => None,
        }
    }
}
