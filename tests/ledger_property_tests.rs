// Property checks on the ledger, transfers, phase resolution and reset
// Randomised inputs use a fixed seed so failures are reproducible

use approx::assert_abs_diff_eq;
use more_asserts::{assert_ge, assert_le};
use planet_spheres_rust::material_catalog::{CatalogLookup, MaterialCatalog};
use planet_spheres_rust::presets::earth_like;
use planet_spheres_rust::{
    Atmosphere, CelestialBody, Hydrosphere, MaterialEndpoint, SimulationConfig, SphereError, StateResolver,
    TransferCoordinator,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[test]
fn test_random_transfers_conserve_mass() {
    println!("⚖️ Testing conservation over 200 random hydrosphere ↔ atmosphere transfers");
    let catalog = MaterialCatalog::embedded().unwrap().shared();
    let config = SimulationConfig::default();
    let earth = CelestialBody::earth();
    let mut hydrosphere = Hydrosphere::new(&earth, catalog.clone(), &config, None);
    let mut atmosphere = Atmosphere::new(&earth, catalog, &config, None);
    hydrosphere.add_liquid("water", 1.0e4).unwrap();
    atmosphere.add_gas("water", 1.0e4).unwrap();

    let mut rng = StdRng::seed_from_u64(42);
    let total = hydrosphere.total_hydrosphere_mass() + atmosphere.total_atmospheric_mass();
    let mut rejected = 0;

    for _ in 0..200 {
        let amount = rng.random_range(1.0..5_000.0);
        let upward = rng.random_bool(0.5);
        let source_before = if upward {
            hydrosphere.total_hydrosphere_mass()
        } else {
            atmosphere.total_atmospheric_mass()
        };

        let result = if upward {
            TransferCoordinator.transfer_material(&mut hydrosphere, "water", amount, &mut atmosphere)
        } else {
            TransferCoordinator.transfer_material(&mut atmosphere, "water", amount, &mut hydrosphere)
        };

        match result {
            Ok(transfer) => assert_eq!(transfer.amount, amount),
            Err(_) => {
                rejected += 1;
                let source_after = if upward {
                    hydrosphere.total_hydrosphere_mass()
                } else {
                    atmosphere.total_atmospheric_mass()
                };
                assert_eq!(source_after, source_before, "failed transfer must not mutate");
            }
        }

        assert_ge!(hydrosphere.total_hydrosphere_mass(), 0.0);
        assert_ge!(atmosphere.total_atmospheric_mass(), 0.0);
        assert_abs_diff_eq!(
            hydrosphere.total_hydrosphere_mass() + atmosphere.total_atmospheric_mass(),
            total,
            epsilon = 1e-6
        );
    }
    println!("   {} transfers rejected for insufficient material", rejected);
}

#[test]
fn test_over_withdrawal_is_rejected() {
    println!("🚫 Testing over-withdrawal leaves both ledgers unchanged");
    let catalog = MaterialCatalog::embedded().unwrap().shared();
    let config = SimulationConfig::default();
    let earth = CelestialBody::earth();
    let mut hydrosphere = Hydrosphere::new(&earth, catalog.clone(), &config, None);
    let mut atmosphere = Atmosphere::new(&earth, catalog, &config, None);
    hydrosphere.add_liquid("water", 10.0).unwrap();

    let err = TransferCoordinator
        .transfer_material(&mut hydrosphere, "water", 10.5, &mut atmosphere)
        .unwrap_err();
    assert!(matches!(err, SphereError::InsufficientMaterial { .. }));
    assert_eq!(hydrosphere.total_hydrosphere_mass(), 10.0);
    assert!(atmosphere.sphere().ledger().is_empty());
}

#[test]
fn test_state_is_monotonic_in_temperature() {
    println!("🌡️ Testing solid < liquid < gas ordering for every catalog material");
    let catalog = MaterialCatalog::embedded().unwrap();
    let resolver = StateResolver::default();

    for id in catalog.ids() {
        let props = catalog.resolve(id);
        let mut last_rank = 0;
        for step in 0..1000 {
            let temperature = 1.0 + step as f64 * 9.0;
            if let Some(rank) = resolver.state_at_standard(props.as_ref(), temperature).rank() {
                assert_ge!(rank, last_rank, "{} went backwards at {}K", id, temperature);
                last_rank = rank;
            }
        }
        assert_le!(last_rank, 2);
    }
}

#[test]
fn test_reset_is_idempotent() {
    println!("🔁 Testing reset twice equals reset once");
    let catalog = MaterialCatalog::embedded().unwrap().shared();
    let mut spheres = earth_like(catalog, &SimulationConfig::default()).unwrap();

    let atmosphere = spheres.atmosphere.as_mut().unwrap();
    atmosphere.add_gas("CH4", 1.0e15).unwrap();
    atmosphere.remove_gas("O2", 1.0e17).unwrap();

    assert!(spheres.reset());
    let once: Vec<_> = spheres.atmosphere.as_ref().unwrap().gases().cloned().collect();
    assert!(spheres.reset());
    let twice: Vec<_> = spheres.atmosphere.as_ref().unwrap().gases().cloned().collect();

    assert_eq!(once, twice);
    assert!(spheres.atmosphere.as_ref().unwrap().gas("CH4").is_none());
}
