//! Hydrosphere engine: liquid inventory, phase split of the primary volatile,
//! and the evaporation/precipitation exchange with the atmosphere.

use crate::atmosphere::Atmosphere;
use crate::config::{SimulationConfig, WaterCycleConfig};
use crate::constants::{GAS_CONSTANT_J_PER_MOL_K, STANDARD_PRESSURE_ATM};
use crate::error::SphereError;
use crate::host::MaterialHost;
use crate::material_catalog::SharedCatalog;
use crate::material_ledger::{Layer, MaterialRecord};
use crate::phase_state::StateResolver;
use crate::sphere::{Conditions, MaterialEndpoint, Sphere, SphereKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Percent split of the primary volatile across phases; sums to ~100.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StateDistribution {
    pub solid: f64,
    pub liquid: f64,
    pub vapor: f64,
}

/// Masses moved by one water-cycle tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WaterCycleOutcome {
    pub evaporated: f64,
    pub precipitated: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HydrosphereBaseValues {
    pub composition: Option<BTreeMap<String, f64>>,
    pub total_hydrosphere_mass: Option<f64>,
    pub temperature: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct Hydrosphere {
    sphere: Sphere,
    config: WaterCycleConfig,
    composition_tolerance_pct: f64,
    state_distribution: StateDistribution,
    base_values: HydrosphereBaseValues,
}

fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

impl Hydrosphere {
    pub fn new(
        host: &dyn MaterialHost,
        catalog: SharedCatalog,
        config: &SimulationConfig,
        temperature: Option<f64>,
    ) -> Self {
        let host = host.properties();
        let sphere = Sphere::new(
            SphereKind::Hydrosphere,
            catalog,
            StateResolver::new(config.phase),
            config.ledger,
            Conditions {
                temperature: temperature.unwrap_or(host.ambient_temperature),
                pressure: host.ambient_pressure,
            },
        );
        let mut hydrosphere = Self {
            sphere,
            config: config.water_cycle.clone(),
            composition_tolerance_pct: config.atmosphere.composition_tolerance_pct,
            state_distribution: StateDistribution::default(),
            base_values: HydrosphereBaseValues::default(),
        };
        hydrosphere.state_distribution = hydrosphere.calculate_state_distributions(None, None);
        hydrosphere
    }

    pub fn temperature(&self) -> f64 {
        self.sphere.temperature()
    }

    pub fn pressure(&self) -> f64 {
        self.sphere.pressure()
    }

    pub fn set_temperature(&mut self, temperature: f64) {
        self.sphere.set_temperature(temperature);
        self.state_distribution = self.calculate_state_distributions(None, None);
    }

    pub fn set_pressure(&mut self, pressure: f64) {
        self.sphere.set_pressure(pressure);
        self.state_distribution = self.calculate_state_distributions(None, None);
    }

    pub fn primary_liquid(&self) -> &str {
        &self.config.primary_liquid
    }

    pub fn total_hydrosphere_mass(&self) -> f64 {
        self.sphere.total_mass()
    }

    pub fn composition(&self) -> &BTreeMap<String, f64> {
        self.sphere.composition()
    }

    pub fn liquid(&self, name: &str) -> Option<&MaterialRecord> {
        self.sphere.find(name, Layer::Bulk)
    }

    pub fn state_distribution(&self) -> StateDistribution {
        self.state_distribution
    }

    pub fn base_values(&self) -> &HydrosphereBaseValues {
        &self.base_values
    }

    pub fn set_base_values(&mut self, base_values: HydrosphereBaseValues) {
        self.base_values = base_values;
    }

    pub fn add_liquid(&mut self, name: &str, amount: f64) -> Result<f64, SphereError> {
        self.sphere.add_material(name, amount, None)
    }

    pub fn remove_liquid(&mut self, name: &str, amount: f64) -> Result<f64, SphereError> {
        self.sphere.remove_material(name, amount, None)
    }

    /// Standard-pressure melting and boiling points of the primary volatile.
    fn primary_phase_points(&self) -> (f64, f64) {
        let props = self.sphere.catalog().resolve(&self.config.primary_liquid);
        StateResolver::phase_points(props.as_ref())
    }

    /// Boiling point shifted by Clausius-Clapeyron for `pressure` (atm).
    pub fn boiling_point_at(&self, pressure: f64) -> f64 {
        let (melting, boiling) = self.primary_phase_points();
        let pressure = pressure.max(self.config.min_pressure_atm);
        let inverse = 1.0 / boiling
            - GAS_CONSTANT_J_PER_MOL_K * (pressure / STANDARD_PRESSURE_ATM).ln() / self.config.latent_heat_j_per_mol;
        let shifted = if inverse > 0.0 { 1.0 / inverse } else { f64::INFINITY };
        shifted.max(melting + self.config.transition_width_k)
    }

    /// Smoothed solid/liquid/vapor split of the primary volatile. Omitted
    /// arguments default to the sphere's current conditions.
    pub fn calculate_state_distributions(&self, temperature: Option<f64>, pressure: Option<f64>) -> StateDistribution {
        let temperature = temperature.unwrap_or(self.temperature());
        let pressure = pressure.unwrap_or(self.pressure());
        let (melting, _) = self.primary_phase_points();
        let boiling = self.boiling_point_at(pressure);
        let width = self.config.transition_width_k.max(1e-6);

        let mut solid = logistic((melting - temperature) / width);
        // centred one width below boiling so vapor dominates at the boiling point
        let mut vapor = if boiling.is_finite() {
            logistic((temperature - (boiling - width)) / width)
        } else {
            0.0
        };
        let overlap = solid + vapor;
        if overlap > 1.0 {
            solid /= overlap;
            vapor /= overlap;
        }
        let liquid = (1.0 - solid - vapor).max(0.0);

        StateDistribution {
            solid: solid * 100.0,
            liquid: liquid * 100.0,
            vapor: vapor * 100.0,
        }
    }

    /// Mass of the primary liquid that evaporates this tick. Zero without an
    /// atmosphere to receive it.
    pub fn calculate_evaporation_rate(&self, atmosphere: Option<&Atmosphere>) -> f64 {
        if atmosphere.is_none() {
            return 0.0;
        }
        let available = self.sphere.amount_of(&self.config.primary_liquid, Layer::Bulk);
        if available <= 0.0 {
            return 0.0;
        }
        let (melting, boiling) = self.primary_phase_points();
        let span = (boiling - melting).max(1e-6);
        let warmth = ((self.temperature() - melting) / span).clamp(0.0, 1.0);
        (self.config.evaporation_coefficient * available * warmth).min(available)
    }

    /// Mass of vapor that condenses back this tick, driven by how cold the
    /// atmosphere is.
    pub fn calculate_precipitation_rate(&self, atmosphere: &Atmosphere) -> f64 {
        let vapor = match atmosphere.gas(&self.config.primary_liquid) {
            Some(record) => record.amount,
            None => return 0.0,
        };
        let (melting, boiling) = self.primary_phase_points();
        let span = (boiling - melting).max(1e-6);
        let chill = ((boiling - atmosphere.temperature()) / span).clamp(0.0, 1.0);
        (self.config.precipitation_coefficient * vapor * chill).min(vapor)
    }

    pub fn handle_evaporation(&mut self, atmosphere: &mut Atmosphere) -> Result<f64, SphereError> {
        let rate = self.calculate_evaporation_rate(Some(&*atmosphere));
        if rate <= 0.0 {
            return Ok(0.0);
        }
        let primary = self.config.primary_liquid.clone();
        let coordinator = *self.sphere.transfers();
        let transfer = coordinator.transfer_material(self, &primary, rate, atmosphere)?;
        Ok(transfer.amount)
    }

    pub fn handle_precipitation(&mut self, atmosphere: &mut Atmosphere) -> Result<f64, SphereError> {
        if atmosphere.gas(&self.config.primary_liquid).is_none() {
            return Ok(0.0);
        }
        let rate = self.calculate_precipitation_rate(atmosphere);
        if rate <= 0.0 {
            return Ok(0.0);
        }
        let primary = self.config.primary_liquid.clone();
        let coordinator = *self.sphere.transfers();
        let transfer = coordinator.transfer_material(atmosphere, &primary, rate, self)?;
        Ok(transfer.amount)
    }

    /// Evaporate, then precipitate. Does nothing at all when the host has no
    /// atmosphere; on error both spheres are left as they were.
    pub fn water_cycle_tick(&mut self, atmosphere: Option<&mut Atmosphere>) -> Result<WaterCycleOutcome, SphereError> {
        let Some(atmosphere) = atmosphere else {
            return Ok(WaterCycleOutcome::default());
        };

        let hydrosphere_before = self.clone();
        let atmosphere_before = atmosphere.clone();
        let outcome = self
            .handle_evaporation(atmosphere)
            .and_then(|evaporated| {
                self.handle_precipitation(atmosphere).map(|precipitated| WaterCycleOutcome {
                    evaporated,
                    precipitated,
                })
            });

        match outcome {
            Ok(outcome) => {
                self.state_distribution = self.calculate_state_distributions(None, None);
                Ok(outcome)
            }
            Err(err) => {
                *self = hydrosphere_before;
                *atmosphere = atmosphere_before;
                Err(err)
            }
        }
    }

    pub fn capture_base_values(&mut self) {
        self.base_values = HydrosphereBaseValues {
            composition: Some(self.composition().clone()),
            total_hydrosphere_mass: Some(self.total_hydrosphere_mass()),
            temperature: Some(self.temperature()),
        };
    }

    /// Restore the base-values snapshot; all-or-nothing.
    pub fn reset(&mut self) -> bool {
        let (composition, total_mass, temperature) = match &self.base_values {
            HydrosphereBaseValues {
                composition: Some(composition),
                total_hydrosphere_mass: Some(total_mass),
                temperature: Some(temperature),
            } => (composition.clone(), *total_mass, *temperature),
            _ => {
                log::warn!("hydrosphere reset skipped: base values incomplete");
                return false;
            }
        };

        if let Err(err) =
            self.sphere
                .write_composition(Layer::Bulk, total_mass, &composition, self.composition_tolerance_pct)
        {
            log::warn!("hydrosphere reset skipped: {err}");
            return false;
        }
        self.set_temperature(temperature);
        log::info!("hydrosphere reset to {total_mass:.3e} kg at {temperature:.1}K");
        true
    }
}

impl MaterialEndpoint for Hydrosphere {
    fn sphere(&self) -> &Sphere {
        &self.sphere
    }

    fn sphere_mut(&mut self) -> &mut Sphere {
        &mut self.sphere
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::CelestialBody;
    use crate::sphere::tests::test_catalog;
    use approx::assert_abs_diff_eq;
    use more_asserts::{assert_ge, assert_gt, assert_lt};

    fn earth_pair() -> (Hydrosphere, Atmosphere) {
        let earth = CelestialBody::earth();
        let config = SimulationConfig::default();
        let mut hydrosphere = Hydrosphere::new(&earth, test_catalog(), &config, None);
        hydrosphere.add_liquid("water", 1.0e6).unwrap();
        let mut atmosphere = Atmosphere::new(&earth, test_catalog(), &config, None);
        atmosphere.add_gas("N2", 1.0e5).unwrap();
        (hydrosphere, atmosphere)
    }

    #[test]
    fn test_distribution_sums_to_100() {
        let (hydrosphere, _) = earth_pair();
        for t in [100.0, 250.0, 273.15, 290.0, 350.0, 373.15, 400.0, 800.0] {
            let d = hydrosphere.calculate_state_distributions(Some(t), Some(1.0));
            assert_abs_diff_eq!(d.solid + d.liquid + d.vapor, 100.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_distribution_at_boiling_point() {
        let (hydrosphere, _) = earth_pair();
        let d = hydrosphere.calculate_state_distributions(Some(373.15), Some(1.0));
        assert_gt!(d.vapor, d.liquid);
        assert_gt!(d.liquid, 0.0);

        let temperate = hydrosphere.calculate_state_distributions(Some(288.15), Some(1.0));
        assert_gt!(temperate.liquid, 99.0);

        let frozen = hydrosphere.calculate_state_distributions(Some(200.0), Some(1.0));
        assert_gt!(frozen.solid, 99.0);
    }

    #[test]
    fn test_low_pressure_lowers_boiling_point() {
        let (hydrosphere, _) = earth_pair();
        assert_abs_diff_eq!(hydrosphere.boiling_point_at(1.0), 373.15, epsilon = 1e-9);
        assert_lt!(hydrosphere.boiling_point_at(0.1), 373.15);
        assert_gt!(hydrosphere.boiling_point_at(10.0), 373.15);
    }

    #[test]
    fn test_evaporation_rate_monotonic() {
        let (mut hydrosphere, atmosphere) = earth_pair();
        let mut last = 0.0;
        for t in (200..420).step_by(5) {
            hydrosphere.set_temperature(t as f64);
            let rate = hydrosphere.calculate_evaporation_rate(Some(&atmosphere));
            assert_ge!(rate, last);
            last = rate;
        }
        assert_eq!(hydrosphere.calculate_evaporation_rate(None), 0.0);
    }

    #[test]
    fn test_evaporation_moves_water_to_atmosphere() {
        let (mut hydrosphere, mut atmosphere) = earth_pair();
        let total_before = hydrosphere.total_hydrosphere_mass() + atmosphere.total_atmospheric_mass();

        let evaporated = hydrosphere.handle_evaporation(&mut atmosphere).unwrap();
        assert_gt!(evaporated, 0.0);
        assert_abs_diff_eq!(atmosphere.gas("H2O").unwrap().amount, evaporated, epsilon = 1e-9);

        let total_after = hydrosphere.total_hydrosphere_mass() + atmosphere.total_atmospheric_mass();
        assert_abs_diff_eq!(total_before, total_after, epsilon = 1e-6);
    }

    #[test]
    fn test_frozen_evaporation_is_noop() {
        let (mut hydrosphere, mut atmosphere) = earth_pair();
        hydrosphere.set_temperature(200.0);
        let before = atmosphere.total_atmospheric_mass();

        assert_eq!(hydrosphere.handle_evaporation(&mut atmosphere).unwrap(), 0.0);
        assert_eq!(atmosphere.total_atmospheric_mass(), before);
    }

    #[test]
    fn test_precipitation_without_vapor_is_noop() {
        let (mut hydrosphere, mut atmosphere) = earth_pair();
        assert_eq!(hydrosphere.handle_precipitation(&mut atmosphere).unwrap(), 0.0);
        assert_eq!(hydrosphere.total_hydrosphere_mass(), 1.0e6);
    }

    #[test]
    fn test_water_cycle_tick_skips_without_atmosphere() {
        let (mut hydrosphere, _) = earth_pair();
        let before = hydrosphere.total_hydrosphere_mass();

        let outcome = hydrosphere.water_cycle_tick(None).unwrap();
        assert_eq!(outcome, WaterCycleOutcome::default());
        assert_eq!(hydrosphere.total_hydrosphere_mass(), before);
    }

    #[test]
    fn test_water_cycle_tick_round_trip() {
        let (mut hydrosphere, mut atmosphere) = earth_pair();
        let total_before = hydrosphere.total_hydrosphere_mass() + atmosphere.total_atmospheric_mass();

        let outcome = hydrosphere.water_cycle_tick(Some(&mut atmosphere)).unwrap();
        assert_gt!(outcome.evaporated, 0.0);
        assert_gt!(outcome.precipitated, 0.0);
        assert_lt!(outcome.precipitated, outcome.evaporated);

        let total_after = hydrosphere.total_hydrosphere_mass() + atmosphere.total_atmospheric_mass();
        assert_abs_diff_eq!(total_before, total_after, epsilon = 1e-6);
    }

    #[test]
    fn test_remove_liquid_not_found() {
        let (mut hydrosphere, _) = earth_pair();
        let err = hydrosphere.remove_liquid("ammonia", 1.0).unwrap_err();
        assert_eq!(err.to_string(), "ammonia not found in hydrosphere");
        assert!(err.is_insufficient_material());
    }

    #[test]
    fn test_reset_all_or_nothing() {
        let (mut hydrosphere, _) = earth_pair();
        assert!(!hydrosphere.reset());

        hydrosphere.capture_base_values();
        hydrosphere.add_liquid("ammonia", 5.0e5).unwrap();
        hydrosphere.set_temperature(300.0);

        assert!(hydrosphere.reset());
        assert!(hydrosphere.liquid("ammonia").is_none());
        assert_abs_diff_eq!(hydrosphere.total_hydrosphere_mass(), 1.0e6, epsilon = 1e-6);
        assert_eq!(hydrosphere.temperature(), 288.15);
    }
}
