//! Ready-made sphere sets for common bodies, seeded and with base values
//! captured so `reset` works out of the box.

use crate::atmosphere::Atmosphere;
use crate::biosphere::Biosphere;
use crate::config::SimulationConfig;
use crate::constants::*;
use crate::error::SphereError;
use crate::geosphere::Geosphere;
use crate::host::{CelestialBody, MaterialHost};
use crate::hydrosphere::Hydrosphere;
use crate::material_catalog::SharedCatalog;
use crate::material_ledger::Layer;
use crate::sim::SphereSet;
use std::collections::BTreeMap;

const EARTH_BIOMASS_KG: f64 = 5.5e14;
const MARS_CRUST_KG: f64 = 4.6e22;
const MARS_MANTLE_KG: f64 = 4.2e23;
const MARS_CORE_KG: f64 = 1.5e23;
const MARS_POLAR_ICE_KG: f64 = 2.0e19;
const LUNA_CRUST_KG: f64 = 2.5e21;
const LUNA_MANTLE_KG: f64 = 6.8e22;
const LUNA_CORE_KG: f64 = 1.6e21;

fn percentages(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
    entries.iter().map(|(name, pct)| (name.to_string(), *pct)).collect()
}

fn seed_atmosphere(atmosphere: &mut Atmosphere, total_mass: f64, mix: &[(&str, f64)]) -> Result<(), SphereError> {
    for (gas, pct) in mix {
        atmosphere.add_gas(gas, total_mass * pct / 100.0)?;
    }
    Ok(())
}

fn finish(mut spheres: SphereSet) -> SphereSet {
    if let Some(geosphere) = spheres.geosphere.as_mut() {
        geosphere.update_geological_activity();
    }
    if let (Some(hydrosphere), Some(atmosphere)) = (spheres.hydrosphere.as_mut(), spheres.atmosphere.as_ref()) {
        hydrosphere.set_pressure(atmosphere.pressure());
    }
    spheres.capture_base_values();
    spheres
}

/// Earth: nitrogen/oxygen air, ocean-scale hydrosphere, hot core, biosphere.
pub fn earth_like(catalog: SharedCatalog, config: &SimulationConfig) -> Result<SphereSet, SphereError> {
    let earth = CelestialBody::earth();
    let mut spheres = SphereSet::new(earth.host_id());

    let mut geosphere = Geosphere::new(&earth, catalog.clone(), config, None);
    geosphere.set_core_temperature(EARTH_CORE_TEMP_K);
    geosphere.set_layer(
        Layer::Crust,
        EARTH_CRUST_KG,
        &percentages(&[
            ("silicon_dioxide", 59.0),
            ("aluminum_oxide", 16.0),
            ("calcium_carbonate", 10.0),
            ("iron", 7.0),
            ("water", 5.0),
            ("carbon_dioxide", 3.0),
        ]),
    )?;
    geosphere.set_layer(
        Layer::Mantle,
        EARTH_MANTLE_KG,
        &percentages(&[
            ("olivine", 90.0),
            ("iron", 9.9),
            ("potassium", 0.0999),
            ("thorium", 0.00005),
            ("uranium", 0.00005),
        ]),
    )?;
    geosphere.set_layer(
        Layer::Core,
        EARTH_CORE_KG,
        &percentages(&[("iron", 88.0), ("nickel", 10.0), ("sulfur", 2.0)]),
    )?;
    spheres.geosphere = Some(geosphere);

    let mut atmosphere = Atmosphere::new(&earth, catalog.clone(), config, None);
    seed_atmosphere(
        &mut atmosphere,
        EARTH_ATMOSPHERE_KG,
        &[("N2", 78.08), ("O2", 20.95), ("Ar", 0.93), ("CO2", 0.04)],
    )?;
    spheres.atmosphere = Some(atmosphere);

    let mut hydrosphere = Hydrosphere::new(&earth, catalog.clone(), config, None);
    hydrosphere.add_liquid("water", EARTH_HYDROSPHERE_KG)?;
    spheres.hydrosphere = Some(hydrosphere);

    let mut biosphere = Biosphere::new(&earth, catalog, config, None);
    biosphere.add_biomass("biomass", EARTH_BIOMASS_KG)?;
    spheres.biosphere = Some(biosphere);

    Ok(finish(spheres))
}

/// Mars: thin CO2 air, frozen water, cooling core, no biosphere.
pub fn mars_like(catalog: SharedCatalog, config: &SimulationConfig) -> Result<SphereSet, SphereError> {
    let mars = CelestialBody::mars();
    let mut spheres = SphereSet::new(mars.host_id());

    let mut geosphere = Geosphere::new(&mars, catalog.clone(), config, None);
    geosphere.set_core_temperature(MARS_CORE_TEMP_K);
    geosphere.set_layer(
        Layer::Crust,
        MARS_CRUST_KG,
        &percentages(&[
            ("silicon_dioxide", 45.0),
            ("iron", 18.0),
            ("aluminum_oxide", 10.0),
            ("water", 10.0),
            ("sulfur", 7.0),
            ("calcium_carbonate", 5.0),
            ("carbon_dioxide", 5.0),
        ]),
    )?;
    geosphere.set_layer(
        Layer::Mantle,
        MARS_MANTLE_KG,
        &percentages(&[("olivine", 85.0), ("iron", 15.0)]),
    )?;
    geosphere.set_layer(
        Layer::Core,
        MARS_CORE_KG,
        &percentages(&[("iron", 80.0), ("sulfur", 15.0), ("nickel", 5.0)]),
    )?;
    spheres.geosphere = Some(geosphere);

    let mut atmosphere = Atmosphere::new(&mars, catalog.clone(), config, None);
    seed_atmosphere(
        &mut atmosphere,
        MARS_ATMOSPHERE_KG,
        &[("CO2", 95.3), ("N2", 2.7), ("Ar", 1.6), ("O2", 0.4)],
    )?;
    spheres.atmosphere = Some(atmosphere);

    let mut hydrosphere = Hydrosphere::new(&mars, catalog, config, None);
    hydrosphere.add_liquid("water", MARS_POLAR_ICE_KG)?;
    spheres.hydrosphere = Some(hydrosphere);

    Ok(finish(spheres))
}

/// Luna: rock only. No atmosphere or hydrosphere, so nothing outgasses and
/// the water cycle never runs.
pub fn airless(catalog: SharedCatalog, config: &SimulationConfig) -> Result<SphereSet, SphereError> {
    let luna = CelestialBody::luna();
    let mut spheres = SphereSet::new(luna.host_id());

    let mut geosphere = Geosphere::new(&luna, catalog, config, None);
    geosphere.set_core_temperature(1600.0);
    geosphere.set_layer(
        Layer::Crust,
        LUNA_CRUST_KG,
        &percentages(&[("silicon_dioxide", 45.0), ("aluminum_oxide", 25.0), ("iron", 20.0), ("water", 10.0)]),
    )?;
    geosphere.set_layer(Layer::Mantle, LUNA_MANTLE_KG, &percentages(&[("olivine", 100.0)]))?;
    geosphere.set_layer(Layer::Core, LUNA_CORE_KG, &percentages(&[("iron", 100.0)]))?;
    spheres.geosphere = Some(geosphere);

    Ok(finish(spheres))
}
