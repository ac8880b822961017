// Terraforming a Mars-like world
// Warms the crust, imports volatiles at random and prints how the spheres respond each tick.
// Run with RUST_LOG=debug to see every ledger movement.

use colored::Colorize;
use planet_spheres_rust::material_catalog::MaterialCatalog;
use planet_spheres_rust::presets::mars_like;
use planet_spheres_rust::sim::{SimProps, Simulation, TickReport};
use planet_spheres_rust::sim_op::{AtmosphereOp, BiosphereOp, GeosphereOp, WaterCycleOp};
use planet_spheres_rust::{Biosphere, CelestialBody, SimulationConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const TICKS: u64 = 20;
const IMPORTS: [&str; 3] = ["CO2", "water", "N2"];

fn print_report(report: &TickReport, temperature: f64) {
    let pressure = report.pressure.unwrap_or(0.0);
    let pressure_text = format!("{:>9.4} atm", pressure);
    let pressure_text = if pressure > 0.5 {
        pressure_text.green()
    } else if pressure > 0.05 {
        pressure_text.yellow()
    } else {
        pressure_text.red()
    };
    let water = report.water_cycle.unwrap_or_default();
    println!(
        "{:>4} {:>8.1}K {} {:>10.3e} kg ↑ {:>10.3e} kg ↓  habitable {:.3}",
        report.step,
        temperature,
        pressure_text,
        water.evaporated,
        water.precipitated,
        report.habitable_ratio.unwrap_or(0.0)
    );
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = SimulationConfig::default();
    let catalog = MaterialCatalog::embedded()?.shared();
    let mut spheres = mars_like(catalog.clone(), &config)?;
    spheres.biosphere = Some(Biosphere::new(&CelestialBody::mars(), catalog, &config, None));

    let mut sim = Simulation::new(SimProps {
        spheres,
        start_ops: vec![],
        step_ops: vec![
            GeosphereOp::handle(0.5),
            AtmosphereOp::handle(),
            WaterCycleOp::handle(),
            BiosphereOp::handle(),
        ],
        end_ops: vec![],
        sim_steps: TICKS,
    });

    println!("{}", "🔴 Terraforming Mars".bold());
    println!("{:>4} {:>9} {:>13} {:>24} {:>16}", "tick", "temp", "pressure", "evap / precip", "");

    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..TICKS {
        // warm the surface a little each tick
        let spheres = sim.spheres_mut();
        let temperature = spheres.atmosphere.as_ref().map_or(0.0, |a| a.temperature()) + 4.0;
        if let Some(atmosphere) = spheres.atmosphere.as_mut() {
            atmosphere.set_temperature(temperature);
            let gas = IMPORTS[rng.random_range(0..IMPORTS.len())];
            let mass = rng.random_range(1.0e16..5.0e17);
            atmosphere.add_gas(gas, mass)?;
        }
        if let Some(hydrosphere) = spheres.hydrosphere.as_mut() {
            hydrosphere.set_temperature(temperature);
        }
        if let Some(geosphere) = spheres.geosphere.as_mut() {
            geosphere.set_temperature(temperature);
        }
        if let Some(biosphere) = spheres.biosphere.as_mut() {
            biosphere.set_temperature(temperature);
        }

        match sim.step() {
            Ok(report) => print_report(&report, temperature),
            Err(err) => println!("{} {}", "tick rolled back:".red(), err),
        }
    }

    let spheres = sim.spheres();
    if let Some(atmosphere) = spheres.atmosphere.as_ref() {
        println!("\n{}", "Final atmosphere".bold());
        for (formula, pct) in atmosphere.composition() {
            println!("   {:<6} {:>7.3}%", formula, pct);
        }
    }
    Ok(())
}
