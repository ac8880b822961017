pub mod constants;
pub mod config;
pub mod error;
pub mod material_catalog;
pub mod phase_state;
pub mod material_ledger;
pub mod sphere;
pub mod transfer;
pub mod host;
pub mod atmosphere;
pub mod hydrosphere;
pub mod geosphere;
pub mod biosphere;
pub mod sim;
pub mod sim_op;
pub mod persistence;
pub mod presets;

pub use atmosphere::Atmosphere;
pub use biosphere::Biosphere;
pub use config::SimulationConfig;
pub use error::{CatalogError, ConfigError, SphereError, StoreError};
pub use geosphere::Geosphere;
pub use host::{CelestialBody, Craft, MaterialHost};
pub use hydrosphere::Hydrosphere;
pub use material_catalog::{CatalogLookup, MaterialCatalog, MaterialProperties, SharedCatalog};
pub use material_ledger::{Layer, MaterialRecord};
pub use phase_state::{ExoticState, MaterialState, StateResolver};
pub use sim::{SimProps, Simulation, SphereSet, TickReport};
pub use sphere::{MaterialEndpoint, Sphere, SphereKind};
pub use transfer::{Transfer, TransferCoordinator};
