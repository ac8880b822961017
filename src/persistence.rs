//! Row shapes for durable storage of spheres and their material records,
//! plus an in-memory store.
//!
//! A sphere row is keyed by `(host_id, kind)`; a material row by
//! `(sphere, name, layer)`. Storage technology is up to the caller: anything
//! implementing [`SphereStore`] will do.

use crate::error::StoreError;
use crate::material_ledger::{Layer, MaterialRecord};
use crate::phase_state::MaterialState;
use crate::sphere::{Conditions, Sphere, SphereKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SphereId {
    pub host_id: String,
    pub kind: SphereKind,
}

impl SphereId {
    pub fn new(host_id: &str, kind: SphereKind) -> Self {
        Self {
            host_id: host_id.to_string(),
            kind,
        }
    }
}

impl fmt::Display for SphereId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.host_id, self.kind)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SphereRow {
    pub id: SphereId,
    pub temperature: f64,
    pub pressure: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaterialRow {
    pub sphere: SphereId,
    pub name: String,
    pub layer: Layer,
    pub amount: f64,
    pub state: MaterialState,
}

impl MaterialRow {
    pub fn into_record(self) -> MaterialRecord {
        MaterialRecord {
            name: self.name,
            amount: self.amount,
            state: self.state,
            layer: self.layer,
        }
    }
}

/// Plain create/read/update/delete over sphere and material rows.
pub trait SphereStore {
    fn create_sphere(&mut self, row: SphereRow) -> Result<(), StoreError>;

    fn read_sphere(&self, id: &SphereId) -> Option<SphereRow>;

    fn update_sphere(&mut self, row: SphereRow) -> Result<(), StoreError>;

    /// Removes the sphere together with all of its material rows.
    fn delete_sphere(&mut self, id: &SphereId) -> Result<SphereRow, StoreError>;

    fn create_material(&mut self, row: MaterialRow) -> Result<(), StoreError>;

    fn read_material(&self, sphere: &SphereId, name: &str, layer: Layer) -> Option<MaterialRow>;

    fn update_material(&mut self, row: MaterialRow) -> Result<(), StoreError>;

    fn delete_material(&mut self, sphere: &SphereId, name: &str, layer: Layer) -> Result<MaterialRow, StoreError>;

    fn materials_of(&self, sphere: &SphereId) -> Vec<MaterialRow>;

    fn spheres_of(&self, host_id: &str) -> Vec<SphereRow>;
}

type MaterialKey = (SphereId, Layer, String);

#[derive(Debug, Clone, Default)]
pub struct InMemorySphereStore {
    spheres: BTreeMap<SphereId, SphereRow>,
    materials: BTreeMap<MaterialKey, MaterialRow>,
}

impl InMemorySphereStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sphere_count(&self) -> usize {
        self.spheres.len()
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    fn key(sphere: &SphereId, name: &str, layer: Layer) -> MaterialKey {
        (sphere.clone(), layer, name.to_string())
    }
}

impl SphereStore for InMemorySphereStore {
    fn create_sphere(&mut self, row: SphereRow) -> Result<(), StoreError> {
        if self.spheres.contains_key(&row.id) {
            return Err(StoreError::DuplicateSphere(row.id));
        }
        self.spheres.insert(row.id.clone(), row);
        Ok(())
    }

    fn read_sphere(&self, id: &SphereId) -> Option<SphereRow> {
        self.spheres.get(id).cloned()
    }

    fn update_sphere(&mut self, row: SphereRow) -> Result<(), StoreError> {
        match self.spheres.get_mut(&row.id) {
            Some(existing) => {
                *existing = row;
                Ok(())
            }
            None => Err(StoreError::SphereNotFound(row.id)),
        }
    }

    fn delete_sphere(&mut self, id: &SphereId) -> Result<SphereRow, StoreError> {
        let row = self
            .spheres
            .remove(id)
            .ok_or_else(|| StoreError::SphereNotFound(id.clone()))?;
        self.materials.retain(|(sphere, _, _), _| sphere != id);
        Ok(row)
    }

    fn create_material(&mut self, row: MaterialRow) -> Result<(), StoreError> {
        if !self.spheres.contains_key(&row.sphere) {
            return Err(StoreError::SphereNotFound(row.sphere));
        }
        let key = Self::key(&row.sphere, &row.name, row.layer);
        if self.materials.contains_key(&key) {
            return Err(StoreError::DuplicateMaterial {
                sphere: row.sphere,
                name: row.name,
                layer: row.layer,
            });
        }
        self.materials.insert(key, row);
        Ok(())
    }

    fn read_material(&self, sphere: &SphereId, name: &str, layer: Layer) -> Option<MaterialRow> {
        self.materials.get(&Self::key(sphere, name, layer)).cloned()
    }

    fn update_material(&mut self, row: MaterialRow) -> Result<(), StoreError> {
        match self.materials.get_mut(&Self::key(&row.sphere, &row.name, row.layer)) {
            Some(existing) => {
                *existing = row;
                Ok(())
            }
            None => Err(StoreError::MaterialNotFound {
                sphere: row.sphere,
                name: row.name,
                layer: row.layer,
            }),
        }
    }

    fn delete_material(&mut self, sphere: &SphereId, name: &str, layer: Layer) -> Result<MaterialRow, StoreError> {
        self.materials
            .remove(&Self::key(sphere, name, layer))
            .ok_or_else(|| StoreError::MaterialNotFound {
                sphere: sphere.clone(),
                name: name.to_string(),
                layer,
            })
    }

    fn materials_of(&self, sphere: &SphereId) -> Vec<MaterialRow> {
        self.materials
            .iter()
            .filter(|((id, _, _), _)| id == sphere)
            .map(|(_, row)| row.clone())
            .collect()
    }

    fn spheres_of(&self, host_id: &str) -> Vec<SphereRow> {
        self.spheres
            .values()
            .filter(|row| row.id.host_id == host_id)
            .cloned()
            .collect()
    }
}

impl Sphere {
    pub fn sphere_row(&self, host_id: &str) -> SphereRow {
        SphereRow {
            id: SphereId::new(host_id, self.kind()),
            temperature: self.temperature(),
            pressure: self.pressure(),
        }
    }

    pub fn material_rows(&self, host_id: &str) -> Vec<MaterialRow> {
        let id = SphereId::new(host_id, self.kind());
        self.records()
            .map(|record| MaterialRow {
                sphere: id.clone(),
                name: record.name.clone(),
                layer: record.layer,
                amount: record.amount,
                state: record.state,
            })
            .collect()
    }

    /// Rebuild this sphere from stored rows. Conditions come from `row`;
    /// states are re-resolved rather than trusted.
    pub fn restore_rows(&mut self, row: &SphereRow, materials: &[MaterialRow]) -> Result<(), StoreError> {
        let mut staged = self.clone();
        staged.set_conditions(
            self.kind().default_layer(),
            Conditions {
                temperature: row.temperature,
                pressure: row.pressure,
            },
        );
        staged.restore_records(materials.iter().cloned().map(MaterialRow::into_record).collect())?;
        *self = staged;
        Ok(())
    }
}

/// Write `sphere` and all of its records, replacing whatever was stored.
pub fn save_sphere<S: SphereStore + ?Sized>(store: &mut S, host_id: &str, sphere: &Sphere) -> Result<SphereId, StoreError> {
    let row = sphere.sphere_row(host_id);
    let id = row.id.clone();
    if store.read_sphere(&id).is_some() {
        store.delete_sphere(&id)?;
    }
    store.create_sphere(row)?;
    for material in sphere.material_rows(host_id) {
        store.create_material(material)?;
    }
    log::debug!("saved {id}");
    Ok(id)
}

pub fn load_sphere<S: SphereStore + ?Sized>(store: &S, id: &SphereId, sphere: &mut Sphere) -> Result<(), StoreError> {
    let row = store
        .read_sphere(id)
        .ok_or_else(|| StoreError::SphereNotFound(id.clone()))?;
    sphere.restore_rows(&row, &store.materials_of(id))
}
