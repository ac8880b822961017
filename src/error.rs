//! Error types for the sphere simulation core.

use crate::material_ledger::Layer;
use crate::persistence::SphereId;
use crate::sphere::SphereKind;

/// Errors raised by ledger-mutating operations. Every operation validates
/// before it mutates, so an `Err` always means nothing changed.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SphereError {
    #[error("invalid material `{name}`: {reason}")]
    InvalidMaterial { name: String, reason: String },

    #[error("insufficient {name} in {sphere}: requested {requested}, available {available}")]
    InsufficientMaterial {
        name: String,
        sphere: SphereKind,
        requested: f64,
        available: f64,
    },

    /// The "not found" flavour of an insufficient-material failure.
    #[error("{name} not found in {sphere}")]
    MaterialNotFound { name: String, sphere: SphereKind },

    #[error("invalid gas `{name}`: {reason}")]
    InvalidGas { name: String, reason: String },

    #[error("invalid layer `{layer}` for {sphere}")]
    InvalidLayer { layer: String, sphere: SphereKind },

    #[error("invalid composition: {0}")]
    InvalidComposition(String),
}

impl SphereError {
    pub(crate) fn invalid_material(name: &str, reason: impl Into<String>) -> Self {
        SphereError::InvalidMaterial {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    /// True for both the over-withdrawal and the absent-material variants.
    pub fn is_insufficient_material(&self) -> bool {
        matches!(
            self,
            SphereError::InsufficientMaterial { .. } | SphereError::MaterialNotFound { .. }
        )
    }

    /// Re-labels material validation failures as gas failures, which is how
    /// the atmosphere reports them.
    pub fn into_gas_error(self) -> Self {
        match self {
            SphereError::InvalidMaterial { name, reason } => SphereError::InvalidGas { name, reason },
            SphereError::InsufficientMaterial {
                name,
                requested,
                available,
                ..
            } => SphereError::InvalidGas {
                reason: format!("cannot remove {requested}, only {available} present"),
                name,
            },
            SphereError::MaterialNotFound { name, .. } => SphereError::InvalidGas {
                reason: "not present in atmosphere".to_string(),
                name,
            },
            other => other,
        }
    }
}

/// Failures while loading material catalog data.
#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate material id `{0}`")]
    DuplicateId(String),
}

/// Failures while loading a simulation config file.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Failures at the persistence boundary.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("sphere {0} not found")]
    SphereNotFound(SphereId),
    #[error("sphere {0} already exists")]
    DuplicateSphere(SphereId),
    #[error("material {name} ({layer}) not found in {sphere}")]
    MaterialNotFound { sphere: SphereId, name: String, layer: Layer },
    #[error("material {name} ({layer}) already stored in {sphere}")]
    DuplicateMaterial { sphere: SphereId, name: String, layer: Layer },
    #[error("stored rows do not restore: {0}")]
    Restore(#[from] SphereError),
}
