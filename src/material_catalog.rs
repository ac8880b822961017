//! Read-only material reference data.
//!
//! The catalog is built once per process and handed to every sphere as a
//! `SharedCatalog`; nothing in the simulation core writes to it.

use crate::error::CatalogError;
use crate::phase_state::MaterialState;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Default material data shipped with the crate.
const EMBEDDED_MATERIALS: &str = include_str!("materials.json");

/// Physical properties of one catalog material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialProperties {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub chemical_formula: String,
    /// g/mol
    pub molar_mass: f64,
    /// K; `None` when the reference data has no value
    #[serde(default)]
    pub melting_point: Option<f64>,
    /// K; `None` when the reference data has no value
    #[serde(default)]
    pub boiling_point: Option<f64>,
    /// kg/m³
    #[serde(default)]
    pub density: f64,
    pub default_state: MaterialState,
    #[serde(default)]
    pub is_gas: bool,
    #[serde(default)]
    pub is_volatile: bool,
    #[serde(default)]
    pub is_radioactive: bool,
}

/// Lookup contract consumed by the spheres.
pub trait CatalogLookup {
    /// Resolve a material id (or chemical formula) to its properties.
    fn resolve(&self, material_id: &str) -> Option<MaterialProperties>;
}

pub type SharedCatalog = Arc<dyn CatalogLookup + Send + Sync>;

/// JSON-backed catalog keyed by material id, also addressable by formula.
#[derive(Debug, Default)]
pub struct MaterialCatalog {
    materials: BTreeMap<String, MaterialProperties>,
    formula_index: OnceCell<HashMap<String, String>>,
}

impl MaterialCatalog {
    /// Catalog from the embedded default data.
    pub fn embedded() -> Result<Self, CatalogError> {
        Self::from_json_str(EMBEDDED_MATERIALS)
    }

    pub fn load<P: AsRef<Path>>(file_path: P) -> Result<Self, CatalogError> {
        let json_str = fs::read_to_string(file_path)?;
        Self::from_json_str(&json_str)
    }

    /// Parse `{ "<id>": { ...properties } }`.
    pub fn from_json_str(json_str: &str) -> Result<Self, CatalogError> {
        let parsed: BTreeMap<String, MaterialProperties> = serde_json::from_str(json_str)?;
        let materials = parsed
            .into_iter()
            .map(|(id, mut props)| {
                props.id = id.clone();
                (id, props)
            })
            .collect();
        Ok(Self {
            materials,
            formula_index: OnceCell::new(),
        })
    }

    pub fn from_materials<I>(materials: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = MaterialProperties>,
    {
        let mut map = BTreeMap::new();
        for props in materials {
            if map.contains_key(&props.id) {
                return Err(CatalogError::DuplicateId(props.id));
            }
            map.insert(props.id.clone(), props);
        }
        Ok(Self {
            materials: map,
            formula_index: OnceCell::new(),
        })
    }

    pub fn shared(self) -> SharedCatalog {
        Arc::new(self)
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.materials.keys().map(String::as_str)
    }

    fn formula_index(&self) -> &HashMap<String, String> {
        self.formula_index.get_or_init(|| {
            self.materials
                .values()
                .map(|m| (m.chemical_formula.clone(), m.id.clone()))
                .collect()
        })
    }
}

impl CatalogLookup for MaterialCatalog {
    fn resolve(&self, material_id: &str) -> Option<MaterialProperties> {
        if let Some(props) = self.materials.get(material_id) {
            return Some(props.clone());
        }
        self.formula_index()
            .get(material_id)
            .and_then(|id| self.materials.get(id))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_catalog() {
        let catalog = MaterialCatalog::embedded().unwrap();
        assert!(!catalog.is_empty());

        let oxygen = catalog.resolve("oxygen").unwrap();
        assert_eq!(oxygen.id, "oxygen");
        assert_eq!(oxygen.chemical_formula, "O2");
        assert!(oxygen.is_gas);
        assert_eq!(oxygen.default_state, MaterialState::Gas);

        let water = catalog.resolve("water").unwrap();
        assert!(!water.is_gas);
        assert!(water.is_volatile);

        assert!(catalog.resolve("uranium").unwrap().is_radioactive);
        assert!(catalog.resolve("unobtainium").is_none());
    }

    #[test]
    fn test_resolve_by_formula() {
        let catalog = MaterialCatalog::embedded().unwrap();
        assert_eq!(catalog.resolve("CO2").unwrap().id, "carbon_dioxide");
        assert_eq!(catalog.resolve("H2O").unwrap().id, "water");
    }

    #[test]
    fn test_missing_phase_points_deserialize_as_none() {
        let catalog = MaterialCatalog::from_json_str(
            r#"{
                "regolith": {
                    "name": "Regolith",
                    "chemical_formula": "Reg",
                    "molar_mass": 60.0,
                    "default_state": "solid"
                }
            }"#,
        )
        .unwrap();

        let regolith = catalog.resolve("regolith").unwrap();
        assert_eq!(regolith.melting_point, None);
        assert_eq!(regolith.boiling_point, None);
        assert!(!regolith.is_gas);
    }

    #[test]
    fn test_error_handling() {
        assert!(matches!(
            MaterialCatalog::from_json_str(r#"{"broken": "#),
            Err(CatalogError::Parse(_))
        ));
        assert!(matches!(
            MaterialCatalog::load("/path/that/does/not/exist.json"),
            Err(CatalogError::Io(_))
        ));

        let iron = MaterialCatalog::embedded().unwrap().resolve("iron").unwrap();
        assert!(matches!(
            MaterialCatalog::from_materials(vec![iron.clone(), iron]),
            Err(CatalogError::DuplicateId(id)) if id == "iron"
        ));
    }
}
