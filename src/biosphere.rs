//! Thin biosphere: a biomass ledger plus a habitability score read off the
//! other spheres.

use crate::atmosphere::Atmosphere;
use crate::config::SimulationConfig;
use crate::error::SphereError;
use crate::host::MaterialHost;
use crate::hydrosphere::Hydrosphere;
use crate::material_catalog::SharedCatalog;
use crate::material_ledger::{Layer, MaterialRecord};
use crate::phase_state::StateResolver;
use crate::sphere::{Conditions, MaterialEndpoint, Sphere, SphereKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const HABITABLE_MIN_TEMP_K: f64 = 273.15;
const HABITABLE_MAX_TEMP_K: f64 = 323.15;
/// Kelvin outside the window over which habitability falls to zero.
const HABITABLE_TEMP_FALLOFF_K: f64 = 40.0;
const HABITABLE_MIN_PRESSURE_ATM: f64 = 0.5;
const REFERENCE_OXYGEN_PCT: f64 = 21.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BiosphereBaseValues {
    pub composition: Option<BTreeMap<String, f64>>,
    pub total_biomass: Option<f64>,
    pub habitable_ratio: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct Biosphere {
    sphere: Sphere,
    composition_tolerance_pct: f64,
    habitable_ratio: f64,
    base_values: BiosphereBaseValues,
}

impl Biosphere {
    pub fn new(
        host: &dyn MaterialHost,
        catalog: SharedCatalog,
        config: &SimulationConfig,
        temperature: Option<f64>,
    ) -> Self {
        let host = host.properties();
        Self {
            sphere: Sphere::new(
                SphereKind::Biosphere,
                catalog,
                StateResolver::new(config.phase),
                config.ledger,
                Conditions {
                    temperature: temperature.unwrap_or(host.ambient_temperature),
                    pressure: host.ambient_pressure,
                },
            ),
            composition_tolerance_pct: config.atmosphere.composition_tolerance_pct,
            habitable_ratio: 0.0,
            base_values: BiosphereBaseValues::default(),
        }
    }

    pub fn temperature(&self) -> f64 {
        self.sphere.temperature()
    }

    pub fn set_temperature(&mut self, temperature: f64) {
        self.sphere.set_temperature(temperature);
    }

    pub fn total_biomass(&self) -> f64 {
        self.sphere.total_mass()
    }

    pub fn composition(&self) -> &BTreeMap<String, f64> {
        self.sphere.composition()
    }

    pub fn biomass(&self, name: &str) -> Option<&MaterialRecord> {
        self.sphere.find(name, Layer::Bulk)
    }

    /// 0 = barren, 1 = fully habitable.
    pub fn habitable_ratio(&self) -> f64 {
        self.habitable_ratio
    }

    pub fn base_values(&self) -> &BiosphereBaseValues {
        &self.base_values
    }

    pub fn set_base_values(&mut self, base_values: BiosphereBaseValues) {
        self.base_values = base_values;
    }

    pub fn add_biomass(&mut self, name: &str, amount: f64) -> Result<f64, SphereError> {
        self.sphere.add_material(name, amount, None)
    }

    pub fn remove_biomass(&mut self, name: &str, amount: f64) -> Result<f64, SphereError> {
        self.sphere.remove_material(name, amount, None)
    }

    fn temperature_factor(temperature: f64) -> f64 {
        let outside = if temperature < HABITABLE_MIN_TEMP_K {
            HABITABLE_MIN_TEMP_K - temperature
        } else if temperature > HABITABLE_MAX_TEMP_K {
            temperature - HABITABLE_MAX_TEMP_K
        } else {
            0.0
        };
        (1.0 - outside / HABITABLE_TEMP_FALLOFF_K).clamp(0.0, 1.0)
    }

    /// Recompute the habitability score from the current state of the other
    /// spheres. A missing atmosphere or hydrosphere scores zero.
    pub fn update_habitable_ratio(&mut self, atmosphere: Option<&Atmosphere>, hydrosphere: Option<&Hydrosphere>) -> f64 {
        let ratio = match (atmosphere, hydrosphere) {
            (Some(atmosphere), Some(hydrosphere)) if hydrosphere.total_hydrosphere_mass() > 0.0 => {
                let pressure = (atmosphere.pressure() / HABITABLE_MIN_PRESSURE_ATM).clamp(0.0, 1.0);
                let oxygen = (atmosphere.gas_percentage("O2") / REFERENCE_OXYGEN_PCT).clamp(0.0, 1.0);
                let water = hydrosphere.state_distribution().liquid / 100.0;
                let warmth = Self::temperature_factor(self.temperature());
                // anaerobic life still counts for half
                warmth * pressure * water * (0.5 + 0.5 * oxygen)
            }
            _ => 0.0,
        };
        self.habitable_ratio = ratio.clamp(0.0, 1.0);
        self.habitable_ratio
    }

    pub fn capture_base_values(&mut self) {
        self.base_values = BiosphereBaseValues {
            composition: Some(self.composition().clone()),
            total_biomass: Some(self.total_biomass()),
            habitable_ratio: Some(self.habitable_ratio),
        };
    }

    pub fn reset(&mut self) -> bool {
        let (composition, total_biomass, habitable_ratio) = match &self.base_values {
            BiosphereBaseValues {
                composition: Some(composition),
                total_biomass: Some(total_biomass),
                habitable_ratio: Some(habitable_ratio),
            } => (composition.clone(), *total_biomass, *habitable_ratio),
            _ => {
                log::warn!("biosphere reset skipped: base values incomplete");
                return false;
            }
        };

        if let Err(err) =
            self.sphere
                .write_composition(Layer::Bulk, total_biomass, &composition, self.composition_tolerance_pct)
        {
            log::warn!("biosphere reset skipped: {err}");
            return false;
        }
        self.habitable_ratio = habitable_ratio;
        true
    }
}

impl MaterialEndpoint for Biosphere {
    fn sphere(&self) -> &Sphere {
        &self.sphere
    }

    fn sphere_mut(&mut self) -> &mut Sphere {
        &mut self.sphere
    }
}
