pub const PASCALS_PER_ATM: f64 = 101_325.0;
pub const GRAVITATIONAL_CONSTANT: f64 = 6.674e-11;
pub const GAS_CONSTANT_J_PER_MOL_K: f64 = 8.314;

// Earth reference values
pub const EARTH_RADIUS_M: f64 = 6.371e6;
pub const EARTH_MASS_KG: f64 = 5.972e24;
pub const EARTH_SURFACE_TEMP_K: f64 = 288.15;
pub const EARTH_ATMOSPHERE_KG: f64 = 5.15e18;
pub const EARTH_HYDROSPHERE_KG: f64 = 1.4e21;
pub const EARTH_CRUST_KG: f64 = 2.6e22;
pub const EARTH_MANTLE_KG: f64 = 4.0e24;
pub const EARTH_CORE_KG: f64 = 1.9e24;
pub const EARTH_CORE_TEMP_K: f64 = 5400.0;

// Mars reference values
pub const MARS_RADIUS_M: f64 = 3.3895e6;
pub const MARS_MASS_KG: f64 = 6.417e23;
pub const MARS_SURFACE_TEMP_K: f64 = 210.0;
pub const MARS_SURFACE_PRESSURE_ATM: f64 = 0.006;
pub const MARS_ATMOSPHERE_KG: f64 = 2.5e16;
pub const MARS_CORE_TEMP_K: f64 = 2000.0;

// Physical state fallback, used whenever a catalog entry lacks phase data
pub const DEFAULT_MELTING_POINT_K: f64 = 273.15;
pub const DEFAULT_BOILING_POINT_K: f64 = 373.15;
pub const STANDARD_PRESSURE_ATM: f64 = 1.0;

// Exotic state thresholds
pub const PLASMA_MIN_TEMP_K: f64 = 10_000.0;
pub const METALLIC_HYDROGEN_MIN_PRESSURE_ATM: f64 = 2.0e6; // ~200 GPa
pub const SUPERFLUID_MAX_TEMP_K: f64 = 2.17; // helium lambda point
pub const SUPERFLUID_MIN_PRESSURE_ATM: f64 = 0.05;

// Geosphere layer pressures (atm)
pub const CRUST_PRESSURE_ATM: f64 = 1.0e3;
pub const MANTLE_PRESSURE_ATM: f64 = 1.3e6;
pub const CORE_PRESSURE_ATM: f64 = 3.3e6;

// Geology
pub const TECTONIC_ACTIVITY_THRESHOLD: f64 = 50.0; // strictly greater-than
pub const CORE_HEAT_MIN_K: f64 = 1000.0;
pub const CORE_HEAT_MAX_K: f64 = 6000.0;
pub const RADIOACTIVE_REFERENCE_FRACTION: f64 = 1.0e-6;
pub const MANTLE_REFERENCE_FRACTION: f64 = 0.67;
pub const VOLATILE_RELEASE_PER_K: f64 = 0.01;

// Water cycle
pub const EVAPORATION_COEFFICIENT: f64 = 1.0e-4;
pub const PRECIPITATION_COEFFICIENT: f64 = 0.05;
pub const PHASE_TRANSITION_WIDTH_K: f64 = 2.0;
pub const WATER_LATENT_HEAT_J_PER_MOL: f64 = 40_650.0;
pub const WATER_TRIPLE_POINT_PRESSURE_ATM: f64 = 0.006;

// Composition percentages must sum to 100 within this tolerance
pub const COMPOSITION_TOLERANCE_PCT: f64 = 0.5;
