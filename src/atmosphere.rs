//! Atmosphere engine: gas inventory, total mass, and the pressure derived
//! from it.

use crate::config::{AtmosphereConfig, SimulationConfig};
use crate::constants::PASCALS_PER_ATM;
use crate::error::SphereError;
use crate::host::{HostProperties, MaterialHost};
use crate::material_catalog::{MaterialProperties, SharedCatalog};
use crate::material_ledger::{Layer, MaterialRecord};
use crate::phase_state::StateResolver;
use crate::sphere::{Conditions, MaterialEndpoint, Sphere, SphereKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Snapshot `reset` restores. Any missing field makes the snapshot unusable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtmosphereBaseValues {
    /// chemical formula -> percent
    pub composition: Option<BTreeMap<String, f64>>,
    pub total_atmospheric_mass: Option<f64>,
    pub dust: Option<BTreeMap<String, f64>>,
}

#[derive(Debug, Clone)]
pub struct Atmosphere {
    sphere: Sphere,
    host: HostProperties,
    config: AtmosphereConfig,
    dust: BTreeMap<String, f64>,
    pollution: f64,
    base_values: AtmosphereBaseValues,
}

impl Atmosphere {
    /// Create an empty atmosphere for `host`. Temperature defaults to the
    /// host's ambient surface temperature.
    pub fn new(
        host: &dyn MaterialHost,
        catalog: SharedCatalog,
        config: &SimulationConfig,
        temperature: Option<f64>,
    ) -> Self {
        let host = host.properties();
        let sphere = Sphere::new(
            SphereKind::Atmosphere,
            catalog,
            StateResolver::new(config.phase),
            config.ledger,
            Conditions {
                temperature: host.ambient_temperature,
                pressure: host.ambient_pressure,
            },
        );
        let mut atmosphere = Self {
            sphere,
            host,
            config: config.atmosphere,
            dust: BTreeMap::new(),
            pollution: 0.0,
            base_values: AtmosphereBaseValues::default(),
        };
        atmosphere.set_default_values(temperature);
        atmosphere
    }

    fn set_default_values(&mut self, temperature: Option<f64>) {
        let temperature = temperature.unwrap_or(self.host.ambient_temperature);
        self.sphere.set_conditions(
            Layer::Bulk,
            Conditions {
                temperature,
                pressure: self.host.ambient_pressure,
            },
        );
        self.dust.clear();
        self.pollution = 0.0;
    }

    pub fn host(&self) -> &HostProperties {
        &self.host
    }

    pub fn temperature(&self) -> f64 {
        self.sphere.temperature()
    }

    pub fn set_temperature(&mut self, temperature: f64) {
        self.sphere.set_temperature(temperature);
    }

    /// atm
    pub fn pressure(&self) -> f64 {
        self.sphere.pressure()
    }

    pub fn total_atmospheric_mass(&self) -> f64 {
        self.sphere.total_mass()
    }

    /// chemical formula -> percent of total atmospheric mass
    pub fn composition(&self) -> &BTreeMap<String, f64> {
        self.sphere.composition()
    }

    pub fn gas_percentage(&self, formula: &str) -> f64 {
        self.composition().get(formula).copied().unwrap_or(0.0)
    }

    pub fn gas(&self, name: &str) -> Option<&MaterialRecord> {
        self.sphere.find(name, Layer::Bulk)
    }

    pub fn gases(&self) -> impl Iterator<Item = &MaterialRecord> {
        self.sphere.records()
    }

    pub fn dust(&self) -> &BTreeMap<String, f64> {
        &self.dust
    }

    pub fn pollution(&self) -> f64 {
        self.pollution
    }

    pub fn base_values(&self) -> &AtmosphereBaseValues {
        &self.base_values
    }

    pub fn set_base_values(&mut self, base_values: AtmosphereBaseValues) {
        self.base_values = base_values;
    }

    /// Column pressure `M·g / A` in atm. Zero whenever there is no gas.
    pub fn calculate_pressure(&self) -> f64 {
        let mass = self.total_atmospheric_mass();
        if mass <= 0.0 || self.host.surface_area <= 0.0 {
            return 0.0;
        }
        mass * self.host.gravity / self.host.surface_area / PASCALS_PER_ATM
    }

    pub fn update_pressure(&mut self) -> f64 {
        let pressure = self.calculate_pressure();
        self.sphere.set_pressure(pressure);
        pressure
    }

    /// Keep derived state in line after the gas keyed by `formula` changed by `delta`.
    fn update_composition(&mut self, formula: &str, delta: f64) {
        let pressure = self.update_pressure();
        log::debug!(
            "atmosphere {formula} {delta:+.3e} kg -> {:.3}% of {:.3e} kg, {pressure:.4} atm",
            self.gas_percentage(formula),
            self.total_atmospheric_mass()
        );
    }

    pub fn add_gas(&mut self, name: &str, mass: f64) -> Result<f64, SphereError> {
        let props = self
            .sphere
            .validate_addition(name, mass, Layer::Bulk)
            .map_err(SphereError::into_gas_error)?;
        let total = self.sphere.deposit_validated(&props, mass, Layer::Bulk);
        self.update_composition(&props.chemical_formula, mass);
        Ok(total)
    }

    /// Remove gas; taking the full stored amount removes the gas entirely.
    pub fn remove_gas(&mut self, name: &str, mass: f64) -> Result<f64, SphereError> {
        let canonical = self
            .sphere
            .validate_removal(name, mass, Layer::Bulk)
            .map_err(SphereError::into_gas_error)?;
        let remaining = self
            .sphere
            .withdraw_validated(&canonical, mass, Layer::Bulk)
            .map_err(SphereError::into_gas_error)?;
        let formula = self
            .sphere
            .catalog()
            .resolve(&canonical)
            .map_or(canonical, |p| p.chemical_formula);
        self.update_composition(&formula, -mass);
        Ok(remaining)
    }

    /// Generic material entry point. Gases join the gas inventory; anything
    /// else is held as suspended dust.
    pub fn add_material(&mut self, name: &str, amount: f64) -> Result<f64, SphereError> {
        let props = self.sphere.validate_addition(name, amount, Layer::Bulk)?;
        if props.is_gas {
            let total = self.sphere.deposit_validated(&props, amount, Layer::Bulk);
            self.update_composition(&props.chemical_formula, amount);
            Ok(total)
        } else {
            Ok(self.deposit_dust(&props, amount))
        }
    }

    pub fn remove_material(&mut self, name: &str, amount: f64) -> Result<f64, SphereError> {
        let canonical = self.sphere.canonical_name(name);
        if self.dust.contains_key(&canonical) && self.gas(&canonical).is_none() {
            return self.remove_dust(name, amount);
        }
        let canonical = self.sphere.validate_removal(name, amount, Layer::Bulk)?;
        let remaining = self.sphere.withdraw_validated(&canonical, amount, Layer::Bulk)?;
        let formula = self
            .sphere
            .catalog()
            .resolve(&canonical)
            .map_or(canonical, |p| p.chemical_formula);
        self.update_composition(&formula, -amount);
        Ok(remaining)
    }

    pub fn add_dust(&mut self, name: &str, amount: f64) -> Result<f64, SphereError> {
        let props = self.sphere.validate_addition(name, amount, Layer::Bulk)?;
        Ok(self.deposit_dust(&props, amount))
    }

    fn deposit_dust(&mut self, props: &MaterialProperties, amount: f64) -> f64 {
        let total = self.dust.entry(props.id.clone()).or_insert(0.0);
        *total += amount;
        *total
    }

    pub fn remove_dust(&mut self, name: &str, amount: f64) -> Result<f64, SphereError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(SphereError::invalid_material(
                name,
                format!("amount must be positive, got {amount}"),
            ));
        }
        let canonical = self.sphere.canonical_name(name);
        let available = match self.dust.get(&canonical) {
            Some(available) => *available,
            None => {
                return Err(SphereError::MaterialNotFound {
                    name: name.to_string(),
                    sphere: SphereKind::Atmosphere,
                });
            }
        };
        if available < amount {
            return Err(SphereError::InsufficientMaterial {
                name: name.to_string(),
                sphere: SphereKind::Atmosphere,
                requested: amount,
                available,
            });
        }
        let remaining = (available - amount).max(0.0);
        if remaining == 0.0 && !self.sphere.ledger().retains_zero() {
            self.dust.remove(&canonical);
        } else {
            self.dust.insert(canonical, remaining);
        }
        Ok(remaining)
    }

    pub fn add_pollution(&mut self, amount: f64) -> Result<f64, SphereError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(SphereError::invalid_material(
                "pollution",
                format!("amount must be positive, got {amount}"),
            ));
        }
        self.pollution += amount;
        Ok(self.pollution)
    }

    pub fn capture_base_values(&mut self) {
        self.base_values = AtmosphereBaseValues {
            composition: Some(self.composition().clone()),
            total_atmospheric_mass: Some(self.total_atmospheric_mass()),
            dust: Some(self.dust.clone()),
        };
    }

    /// Restore the base-values snapshot. Returns `false` and changes nothing
    /// when the snapshot is missing a field or does not validate.
    pub fn reset(&mut self) -> bool {
        let (composition, total_mass, dust) = match &self.base_values {
            AtmosphereBaseValues {
                composition: Some(composition),
                total_atmospheric_mass: Some(total_mass),
                dust: Some(dust),
            } => (composition.clone(), *total_mass, dust.clone()),
            _ => {
                log::warn!("atmosphere reset skipped: base values incomplete");
                return false;
            }
        };

        if let Err(err) =
            self.sphere
                .write_composition(Layer::Bulk, total_mass, &composition, self.config.composition_tolerance_pct)
        {
            log::warn!("atmosphere reset skipped: {err}");
            return false;
        }
        self.dust = dust;
        let pressure = self.update_pressure();
        log::info!("atmosphere reset to {total_mass:.3e} kg, {pressure:.4} atm");
        true
    }
}

impl MaterialEndpoint for Atmosphere {
    fn sphere(&self) -> &Sphere {
        &self.sphere
    }

    fn sphere_mut(&mut self) -> &mut Sphere {
        &mut self.sphere
    }

    fn ledger_changed(&mut self, material: &MaterialProperties, delta: f64) {
        self.update_composition(&material.chemical_formula, delta);
    }

    fn map_error(&self, err: SphereError) -> SphereError {
        err.into_gas_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::EARTH_ATMOSPHERE_KG;
    use crate::host::{CelestialBody, Craft};
    use crate::sphere::tests::test_catalog;
    use approx::assert_abs_diff_eq;

    fn earth_atmosphere() -> Atmosphere {
        Atmosphere::new(&CelestialBody::earth(), test_catalog(), &SimulationConfig::default(), None)
    }

    #[test]
    fn test_seeding_from_host() {
        let atmosphere = earth_atmosphere();
        assert_eq!(atmosphere.temperature(), 288.15);
        assert_eq!(atmosphere.pressure(), 1.0);
        assert!(atmosphere.composition().is_empty());
        assert!(atmosphere.dust().is_empty());
        assert_eq!(atmosphere.pollution(), 0.0);

        let explicit = Atmosphere::new(
            &CelestialBody::earth(),
            test_catalog(),
            &SimulationConfig::default(),
            Some(300.0),
        );
        assert_eq!(explicit.temperature(), 300.0);
    }

    #[test]
    fn test_add_material_oxygen_on_empty_ledger() {
        let mut atmosphere = earth_atmosphere();
        atmosphere.add_material("oxygen", 100.0).unwrap();

        let records: Vec<_> = atmosphere.gases().collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "oxygen");
        assert_eq!(records[0].amount, 100.0);
        assert_abs_diff_eq!(atmosphere.gas_percentage("O2"), 100.0, epsilon = 1e-9);
        assert_eq!(atmosphere.total_atmospheric_mass(), 100.0);
    }

    #[test]
    fn test_non_gas_material_becomes_dust() {
        let mut atmosphere = earth_atmosphere();
        atmosphere.add_material("silicon_dioxide", 5.0).unwrap();

        assert_eq!(atmosphere.dust()["silicon_dioxide"], 5.0);
        assert_eq!(atmosphere.total_atmospheric_mass(), 0.0);

        atmosphere.remove_material("silicon_dioxide", 5.0).unwrap();
        assert!(atmosphere.dust().is_empty());
    }

    #[test]
    fn test_pressure_zero_without_mass() {
        let atmosphere = earth_atmosphere();
        assert_eq!(atmosphere.calculate_pressure(), 0.0);

        let craft = Craft {
            id: "tug".into(),
            interior_area_m2: 1.0,
            artificial_gravity: 1000.0,
            cabin_temperature_k: 290.0,
            cabin_pressure_atm: 1.0,
        };
        let empty = Atmosphere::new(&craft, test_catalog(), &SimulationConfig::default(), None);
        assert_eq!(empty.calculate_pressure(), 0.0);
    }

    #[test]
    fn test_earth_pressure_from_mass() {
        let mut atmosphere = earth_atmosphere();
        atmosphere.add_gas("N2", EARTH_ATMOSPHERE_KG * 0.78).unwrap();
        atmosphere.add_gas("O2", EARTH_ATMOSPHERE_KG * 0.22).unwrap();
        assert_abs_diff_eq!(atmosphere.pressure(), 0.97, epsilon = 0.03);
    }

    #[test]
    fn test_gas_validation() {
        let mut atmosphere = earth_atmosphere();
        assert!(matches!(atmosphere.add_gas("", 1.0), Err(SphereError::InvalidGas { .. })));
        assert!(matches!(atmosphere.add_gas("CO2", 0.0), Err(SphereError::InvalidGas { .. })));
        assert!(matches!(atmosphere.add_gas("CO2", -1.0), Err(SphereError::InvalidGas { .. })));
        assert!(matches!(atmosphere.remove_gas("CO2", 1.0), Err(SphereError::InvalidGas { .. })));

        atmosphere.add_gas("CO2", 10.0).unwrap();
        assert!(matches!(atmosphere.remove_gas("CO2", 10.5), Err(SphereError::InvalidGas { .. })));
        assert_eq!(atmosphere.total_atmospheric_mass(), 10.0);
    }

    #[test]
    fn test_remove_exact_amount_deletes_gas() {
        let mut atmosphere = earth_atmosphere();
        atmosphere.add_gas("CO2", 10.0).unwrap();
        atmosphere.add_gas("N2", 30.0).unwrap();

        assert_eq!(atmosphere.remove_gas("carbon_dioxide", 10.0).unwrap(), 0.0);
        assert!(atmosphere.gas("CO2").is_none());
        assert_eq!(atmosphere.total_atmospheric_mass(), 30.0);
        assert_abs_diff_eq!(atmosphere.gas_percentage("N2"), 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_reset_restores_snapshot() {
        let mut atmosphere = earth_atmosphere();
        atmosphere.add_gas("N2", 780.0).unwrap();
        atmosphere.add_gas("O2", 220.0).unwrap();
        atmosphere.add_dust("silicon_dioxide", 3.0).unwrap();
        atmosphere.capture_base_values();

        atmosphere.add_gas("CO2", 500.0).unwrap();
        atmosphere.remove_gas("O2", 200.0).unwrap();

        assert!(atmosphere.reset());
        assert!(atmosphere.gas("CO2").is_none());
        assert_abs_diff_eq!(atmosphere.total_atmospheric_mass(), 1000.0, epsilon = 1e-6);
        assert_abs_diff_eq!(atmosphere.gas("O2").unwrap().amount, 220.0, epsilon = 1e-6);
        assert_eq!(atmosphere.dust()["silicon_dioxide"], 3.0);

        let once: Vec<MaterialRecord> = atmosphere.gases().cloned().collect();
        assert!(atmosphere.reset());
        let twice: Vec<MaterialRecord> = atmosphere.gases().cloned().collect();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_reset_with_partial_snapshot_is_noop() {
        let mut atmosphere = earth_atmosphere();
        atmosphere.add_gas("N2", 100.0).unwrap();
        assert!(!atmosphere.reset());

        atmosphere.set_base_values(AtmosphereBaseValues {
            composition: Some(BTreeMap::from([("CO2".to_string(), 100.0)])),
            total_atmospheric_mass: Some(50.0),
            dust: None,
        });
        assert!(!atmosphere.reset());
        assert_eq!(atmosphere.total_atmospheric_mass(), 100.0);
        assert!(atmosphere.gas("CO2").is_none());
    }

    #[test]
    fn test_reset_rejects_empty_composition_with_mass() {
        let mut atmosphere = earth_atmosphere();
        atmosphere.add_gas("N2", 100.0).unwrap();
        atmosphere.set_base_values(AtmosphereBaseValues {
            composition: Some(BTreeMap::new()),
            total_atmospheric_mass: Some(5.0e18),
            dust: Some(BTreeMap::new()),
        });

        assert!(!atmosphere.reset());
        assert_eq!(atmosphere.total_atmospheric_mass(), 100.0);
        assert!(atmosphere.gas("N2").is_some());
    }

    #[test]
    fn test_partial_snapshot_from_json() {
        let partial: AtmosphereBaseValues =
            serde_json::from_str(r#"{"composition": {"N2": 100.0}, "total_atmospheric_mass": 5.0}"#).unwrap();
        assert!(partial.dust.is_none());
    }
}
