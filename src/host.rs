use crate::constants::*;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// The entity that owns a set of spheres: a celestial body, a craft, or a
/// structure. Spheres only ever read from it.
pub trait MaterialHost {
    fn host_id(&self) -> &str;

    /// m/s²
    fn gravity(&self) -> f64;

    /// m²
    fn surface_area(&self) -> f64;

    /// K, used only when a sphere is first seeded
    fn ambient_temperature(&self) -> f64;

    /// atm, used only when a sphere is first seeded
    fn ambient_pressure(&self) -> f64;

    fn properties(&self) -> HostProperties {
        HostProperties {
            gravity: self.gravity(),
            surface_area: self.surface_area(),
            ambient_temperature: self.ambient_temperature(),
            ambient_pressure: self.ambient_pressure(),
        }
    }
}

/// Copy of the host values a sphere needs, captured at construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HostProperties {
    pub gravity: f64,
    pub surface_area: f64,
    pub ambient_temperature: f64,
    pub ambient_pressure: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CelestialBody {
    pub id: String,
    pub radius_m: f64,
    pub mass_kg: f64,
    pub surface_temperature_k: f64,
    pub known_pressure_atm: f64,
}

impl CelestialBody {
    pub fn new(id: &str, radius_m: f64, mass_kg: f64, surface_temperature_k: f64, known_pressure_atm: f64) -> Self {
        Self {
            id: id.to_string(),
            radius_m,
            mass_kg,
            surface_temperature_k,
            known_pressure_atm,
        }
    }

    pub fn earth() -> Self {
        Self::new("earth", EARTH_RADIUS_M, EARTH_MASS_KG, EARTH_SURFACE_TEMP_K, STANDARD_PRESSURE_ATM)
    }

    pub fn mars() -> Self {
        Self::new(
            "mars",
            MARS_RADIUS_M,
            MARS_MASS_KG,
            MARS_SURFACE_TEMP_K,
            MARS_SURFACE_PRESSURE_ATM,
        )
    }

    /// Airless rock, Luna-like.
    pub fn luna() -> Self {
        Self::new("luna", 1.7374e6, 7.342e22, 250.0, 0.0)
    }
}

impl MaterialHost for CelestialBody {
    fn host_id(&self) -> &str {
        &self.id
    }

    fn gravity(&self) -> f64 {
        if self.radius_m <= 0.0 {
            return 0.0;
        }
        GRAVITATIONAL_CONSTANT * self.mass_kg / self.radius_m.powi(2)
    }

    fn surface_area(&self) -> f64 {
        4.0 * PI * self.radius_m.powi(2)
    }

    fn ambient_temperature(&self) -> f64 {
        self.surface_temperature_k
    }

    fn ambient_pressure(&self) -> f64 {
        self.known_pressure_atm
    }
}

/// Enclosed environment (ship, habitat module).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Craft {
    pub id: String,
    /// interior floor area, m²
    pub interior_area_m2: f64,
    /// spin or thrust gravity, m/s²
    pub artificial_gravity: f64,
    pub cabin_temperature_k: f64,
    pub cabin_pressure_atm: f64,
}

impl MaterialHost for Craft {
    fn host_id(&self) -> &str {
        &self.id
    }

    fn gravity(&self) -> f64 {
        self.artificial_gravity
    }

    fn surface_area(&self) -> f64 {
        self.interior_area_m2
    }

    fn ambient_temperature(&self) -> f64 {
        self.cabin_temperature_k
    }

    fn ambient_pressure(&self) -> f64 {
        self.cabin_pressure_atm
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_earth_properties() {
        let earth = CelestialBody::earth();
        assert_abs_diff_eq!(earth.gravity(), 9.82, epsilon = 0.02);
        assert_abs_diff_eq!(earth.surface_area(), 5.1e14, epsilon = 0.01e14);
        assert_eq!(earth.properties().ambient_pressure, 1.0);
    }

    #[test]
    fn test_mars_gravity() {
        assert_abs_diff_eq!(CelestialBody::mars().gravity(), 3.73, epsilon = 0.02);
    }

    #[test]
    fn test_craft_host() {
        let craft = Craft {
            id: "ark-7".into(),
            interior_area_m2: 12_000.0,
            artificial_gravity: 9.0,
            cabin_temperature_k: 293.0,
            cabin_pressure_atm: 0.9,
        };
        let props = craft.properties();
        assert_eq!(props.gravity, 9.0);
        assert_eq!(props.surface_area, 12_000.0);
        assert_eq!(craft.host_id(), "ark-7");
    }
}
