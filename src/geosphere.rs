//! Geosphere engine: layered crust/mantle/core inventory, geological
//! activity, and volatile outgassing into the atmosphere.

use crate::atmosphere::Atmosphere;
use crate::config::{GeologyConfig, SimulationConfig};
use crate::constants::TECTONIC_ACTIVITY_THRESHOLD;
use crate::error::SphereError;
use crate::host::MaterialHost;
use crate::material_catalog::SharedCatalog;
use crate::material_ledger::{Layer, MaterialRecord};
use crate::phase_state::{MaterialState, StateResolver};
use crate::sphere::{Conditions, MaterialEndpoint, Sphere, SphereKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeosphereBaseValues {
    pub crust_composition: Option<BTreeMap<String, f64>>,
    pub mantle_composition: Option<BTreeMap<String, f64>>,
    pub core_composition: Option<BTreeMap<String, f64>>,
    pub total_crust_mass: Option<f64>,
    pub total_mantle_mass: Option<f64>,
    pub total_core_mass: Option<f64>,
    pub geological_activity: Option<f64>,
    pub tectonic_activity: Option<bool>,
}

struct LayerSnapshot {
    layer: Layer,
    mass: f64,
    composition: BTreeMap<String, f64>,
}

#[derive(Debug, Clone)]
pub struct Geosphere {
    sphere: Sphere,
    config: GeologyConfig,
    composition_tolerance_pct: f64,
    core_temperature: f64,
    geological_activity: f64,
    tectonic_activity: bool,
    base_values: GeosphereBaseValues,
}

impl Geosphere {
    /// Empty geosphere. The surface temperature defaults to the host's
    /// ambient temperature and the core starts equally cold until
    /// `set_core_temperature` is called.
    pub fn new(
        host: &dyn MaterialHost,
        catalog: SharedCatalog,
        config: &SimulationConfig,
        temperature: Option<f64>,
    ) -> Self {
        let host = host.properties();
        let temperature = temperature.unwrap_or(host.ambient_temperature);
        let sphere = Sphere::new(
            SphereKind::Geosphere,
            catalog,
            StateResolver::new(config.phase),
            config.ledger,
            Conditions {
                temperature,
                pressure: config.geology.crust_pressure_atm,
            },
        );
        let mut geosphere = Self {
            sphere,
            config: config.geology,
            composition_tolerance_pct: config.atmosphere.composition_tolerance_pct,
            core_temperature: temperature,
            geological_activity: 0.0,
            tectonic_activity: false,
            base_values: GeosphereBaseValues::default(),
        };
        geosphere.apply_layer_conditions();
        geosphere
    }

    /// Push crust/mantle/core conditions into the sphere, re-resolving every
    /// stored record.
    fn apply_layer_conditions(&mut self) {
        let surface = self.sphere.temperature();
        let core = self.core_temperature;
        self.sphere.set_conditions(
            Layer::Crust,
            Conditions {
                temperature: surface,
                pressure: self.config.crust_pressure_atm,
            },
        );
        self.sphere.set_conditions(
            Layer::Mantle,
            Conditions {
                temperature: (surface + core) / 2.0,
                pressure: self.config.mantle_pressure_atm,
            },
        );
        self.sphere.set_conditions(
            Layer::Core,
            Conditions {
                temperature: core,
                pressure: self.config.core_pressure_atm,
            },
        );
    }

    /// Resolve a layer name, rejecting anything outside crust/mantle/core.
    pub fn layer_named(&self, name: &str) -> Result<Layer, SphereError> {
        match Layer::from_str(name) {
            Some(layer) if Layer::GEOSPHERE.contains(&layer) => Ok(layer),
            _ => Err(SphereError::InvalidLayer {
                layer: name.to_string(),
                sphere: SphereKind::Geosphere,
            }),
        }
    }

    pub fn temperature(&self) -> f64 {
        self.sphere.temperature()
    }

    pub fn set_temperature(&mut self, temperature: f64) {
        self.sphere.set_temperature(temperature);
        self.apply_layer_conditions();
    }

    pub fn core_temperature(&self) -> f64 {
        self.core_temperature
    }

    pub fn set_core_temperature(&mut self, temperature: f64) {
        self.core_temperature = temperature;
        self.apply_layer_conditions();
    }

    pub fn layer_conditions(&self, layer: Layer) -> Option<Conditions> {
        self.sphere.conditions(layer)
    }

    pub fn geological_activity(&self) -> f64 {
        self.geological_activity
    }

    pub fn tectonic_activity(&self) -> bool {
        self.tectonic_activity
    }

    /// Store an externally computed activity score, clamped to [0, 100].
    pub fn set_geological_activity(&mut self, activity: f64) {
        self.geological_activity = activity.clamp(0.0, 100.0);
        self.tectonic_activity = self.calculate_tectonic_activity();
    }

    pub fn total_crust_mass(&self) -> f64 {
        self.sphere.layer_mass(Layer::Crust)
    }

    pub fn total_mantle_mass(&self) -> f64 {
        self.sphere.layer_mass(Layer::Mantle)
    }

    pub fn total_core_mass(&self) -> f64 {
        self.sphere.layer_mass(Layer::Core)
    }

    pub fn total_geosphere_mass(&self) -> f64 {
        self.sphere.total_mass()
    }

    pub fn layer_composition(&self, layer: Layer) -> &BTreeMap<String, f64> {
        self.sphere.layer_composition(layer)
    }

    pub fn find(&self, name: &str, layer: Layer) -> Option<&MaterialRecord> {
        self.sphere.find(name, layer)
    }

    pub fn amount_of(&self, name: &str, layer: Layer) -> f64 {
        self.sphere.amount_of(name, layer)
    }

    pub fn base_values(&self) -> &GeosphereBaseValues {
        &self.base_values
    }

    pub fn set_base_values(&mut self, base_values: GeosphereBaseValues) {
        self.base_values = base_values;
    }

    pub fn add_material(&mut self, name: &str, amount: f64, layer: Layer) -> Result<f64, SphereError> {
        self.sphere.add_material(name, amount, Some(layer))
    }

    pub fn remove_material(&mut self, name: &str, amount: f64, layer: Layer) -> Result<f64, SphereError> {
        self.sphere.remove_material(name, amount, Some(layer))
    }

    /// Replace a layer with `mass` kg split by `composition` (material -> percent).
    pub fn set_layer(&mut self, layer: Layer, mass: f64, composition: &BTreeMap<String, f64>) -> Result<(), SphereError> {
        self.sphere
            .write_composition(layer, mass, composition, self.composition_tolerance_pct)
    }

    /// Re-split a layer's current mass by a new composition.
    pub fn set_layer_composition(&mut self, layer: Layer, composition: &BTreeMap<String, f64>) -> Result<(), SphereError> {
        let mass = self.sphere.layer_mass(layer);
        self.set_layer(layer, mass, composition)
    }

    /// State of `material` at `temperature` under crust pressure.
    pub fn physical_state(&self, material: &str, temperature: f64) -> MaterialState {
        let props = self.sphere.catalog().resolve(material);
        self.sphere
            .resolver()
            .state_at(props.as_ref(), temperature, self.config.crust_pressure_atm)
    }

    pub fn calculate_tectonic_activity(&self) -> bool {
        self.geological_activity > TECTONIC_ACTIVITY_THRESHOLD
    }

    fn core_heat_factor(&self) -> f64 {
        let span = self.config.core_heat_max_k - self.config.core_heat_min_k;
        if span <= 0.0 {
            return 0.0;
        }
        ((self.core_temperature - self.config.core_heat_min_k) / span).clamp(0.0, 1.0)
    }

    fn radioactive_factor(&self) -> f64 {
        let deep_mass = self.total_mantle_mass() + self.total_core_mass();
        if deep_mass <= 0.0 || self.config.radioactive_reference_fraction <= 0.0 {
            return 0.0;
        }
        let catalog = self.sphere.catalog();
        let radioactive: f64 = self
            .sphere
            .records()
            .filter(|r| matches!(r.layer, Layer::Mantle | Layer::Core))
            .filter(|r| catalog.resolve(&r.name).is_some_and(|p| p.is_radioactive))
            .map(|r| r.amount)
            .sum();
        (radioactive / deep_mass / self.config.radioactive_reference_fraction).clamp(0.0, 1.0)
    }

    fn mantle_factor(&self) -> f64 {
        let total = self.total_geosphere_mass();
        if total <= 0.0 || self.config.mantle_reference_fraction <= 0.0 {
            return 0.0;
        }
        (self.total_mantle_mass() / total / self.config.mantle_reference_fraction).clamp(0.0, 1.0)
    }

    /// Recompute the composite activity score and the tectonic flag with it.
    pub fn update_geological_activity(&mut self) -> f64 {
        let score = 100.0
            * (self.config.core_heat_weight * self.core_heat_factor()
                + self.config.radioactive_weight * self.radioactive_factor()
                + self.config.mantle_weight * self.mantle_factor());
        self.set_geological_activity(score);
        log::debug!(
            "geological activity {:.1} (tectonic: {})",
            self.geological_activity,
            self.tectonic_activity
        );
        self.geological_activity
    }

    /// Outgas a share of every volatile crust material into `atmosphere`.
    ///
    /// The share is `min(volatile_release_per_k × ΔT, 1)`. Returns formula ->
    /// mass released. Nothing is released when `ΔT <= 0` or there is no
    /// atmosphere to receive it; if any transfer fails both spheres are left
    /// untouched.
    pub fn extract_volatiles(
        &mut self,
        temperature_increase: f64,
        atmosphere: Option<&mut Atmosphere>,
    ) -> Result<BTreeMap<String, f64>, SphereError> {
        let mut released = BTreeMap::new();
        let Some(atmosphere) = atmosphere else {
            return Ok(released);
        };
        if !temperature_increase.is_finite() || temperature_increase <= 0.0 {
            return Ok(released);
        }

        let fraction = (self.config.volatile_release_per_k * temperature_increase).min(1.0);
        let catalog = self.sphere.catalog().clone();
        let volatiles: Vec<(String, String, f64)> = self
            .sphere
            .ledger()
            .iter_layer(Layer::Crust)
            .filter(|r| r.amount > 0.0)
            .filter_map(|r| {
                let props = catalog.resolve(&r.name)?;
                props
                    .is_volatile
                    .then(|| (r.name.clone(), props.chemical_formula, r.amount * fraction))
            })
            .filter(|(_, _, amount)| *amount > 0.0)
            .collect();
        if volatiles.is_empty() {
            return Ok(released);
        }

        let geosphere_before = self.clone();
        let atmosphere_before = atmosphere.clone();
        let coordinator = *self.sphere.transfers();
        for (name, formula, amount) in volatiles {
            if let Err(err) = coordinator.transfer_between(self, Some(Layer::Crust), atmosphere, None, &name, amount) {
                *self = geosphere_before;
                *atmosphere = atmosphere_before;
                return Err(err);
            }
            *released.entry(formula).or_insert(0.0) += amount;
        }

        log::info!("outgassed {} volatile species for ΔT={temperature_increase:.1}K", released.len());
        Ok(released)
    }

    pub fn capture_base_values(&mut self) {
        self.base_values = GeosphereBaseValues {
            crust_composition: Some(self.layer_composition(Layer::Crust).clone()),
            mantle_composition: Some(self.layer_composition(Layer::Mantle).clone()),
            core_composition: Some(self.layer_composition(Layer::Core).clone()),
            total_crust_mass: Some(self.total_crust_mass()),
            total_mantle_mass: Some(self.total_mantle_mass()),
            total_core_mass: Some(self.total_core_mass()),
            geological_activity: Some(self.geological_activity),
            tectonic_activity: Some(self.tectonic_activity),
        };
    }

    /// Restore every layer and the activity values from the snapshot.
    /// All-or-nothing: returns `false` and changes nothing on any gap or
    /// validation failure.
    pub fn reset(&mut self) -> bool {
        let (layers, activity, tectonic) = match &self.base_values {
            GeosphereBaseValues {
                crust_composition: Some(crust),
                mantle_composition: Some(mantle),
                core_composition: Some(core),
                total_crust_mass: Some(crust_mass),
                total_mantle_mass: Some(mantle_mass),
                total_core_mass: Some(core_mass),
                geological_activity: Some(activity),
                tectonic_activity: Some(tectonic),
            } => (
                [
                    LayerSnapshot {
                        layer: Layer::Crust,
                        mass: *crust_mass,
                        composition: crust.clone(),
                    },
                    LayerSnapshot {
                        layer: Layer::Mantle,
                        mass: *mantle_mass,
                        composition: mantle.clone(),
                    },
                    LayerSnapshot {
                        layer: Layer::Core,
                        mass: *core_mass,
                        composition: core.clone(),
                    },
                ],
                *activity,
                *tectonic,
            ),
            _ => {
                log::warn!("geosphere reset skipped: base values incomplete");
                return false;
            }
        };

        let mut staged = self.sphere.clone();
        for snapshot in &layers {
            if let Err(err) = staged.write_composition(
                snapshot.layer,
                snapshot.mass,
                &snapshot.composition,
                self.composition_tolerance_pct,
            ) {
                log::warn!("geosphere reset skipped: {err}");
                return false;
            }
        }

        self.sphere = staged;
        self.geological_activity = activity;
        self.tectonic_activity = tectonic;
        log::info!("geosphere reset (activity {activity:.1})");
        true
    }
}

impl MaterialEndpoint for Geosphere {
    fn sphere(&self) -> &Sphere {
        &self.sphere
    }

    fn sphere_mut(&mut self) -> &mut Sphere {
        &mut self.sphere
    }
}
