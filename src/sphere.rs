//! The shared building block of every planetary sphere.
//!
//! A `Sphere` is a material ledger plus the per-layer conditions and
//! composition derived from it. The engines (atmosphere, hydrosphere,
//! geosphere, biosphere) wrap one and add their own aggregates.

use crate::config::LedgerConfig;
use crate::error::SphereError;
use crate::material_catalog::{MaterialProperties, SharedCatalog};
use crate::material_ledger::{Layer, MaterialLedger, MaterialRecord, Shortfall};
use crate::phase_state::{MaterialState, StateResolver};
use crate::transfer::TransferCoordinator;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

static EMPTY_COMPOSITION: BTreeMap<String, f64> = BTreeMap::new();

/// The four sphere kinds, declared in tick order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SphereKind {
    Geosphere,
    Atmosphere,
    Hydrosphere,
    Biosphere,
}

impl SphereKind {
    pub const TICK_ORDER: [SphereKind; 4] = [
        SphereKind::Geosphere,
        SphereKind::Atmosphere,
        SphereKind::Hydrosphere,
        SphereKind::Biosphere,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SphereKind::Geosphere => "geosphere",
            SphereKind::Atmosphere => "atmosphere",
            SphereKind::Hydrosphere => "hydrosphere",
            SphereKind::Biosphere => "biosphere",
        }
    }

    pub fn default_layer(&self) -> Layer {
        match self {
            SphereKind::Geosphere => Layer::Crust,
            _ => Layer::Bulk,
        }
    }

    pub fn layers(&self) -> &'static [Layer] {
        match self {
            SphereKind::Geosphere => &Layer::GEOSPHERE,
            _ => &[Layer::Bulk],
        }
    }

    /// The atmosphere reports composition by chemical formula.
    fn keys_by_formula(&self) -> bool {
        matches!(self, SphereKind::Atmosphere)
    }
}

impl fmt::Display for SphereKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Temperature (K) and pressure (atm) a layer's materials are resolved at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Conditions {
    pub temperature: f64,
    pub pressure: f64,
}

/// Something the `TransferCoordinator` can move material into or out of.
pub trait MaterialEndpoint {
    fn sphere(&self) -> &Sphere;

    fn sphere_mut(&mut self) -> &mut Sphere;

    /// Called after the coordinator changed this endpoint's ledger by `delta`.
    fn ledger_changed(&mut self, _material: &MaterialProperties, _delta: f64) {}

    /// Lets an endpoint report validation failures in its own terms.
    fn map_error(&self, err: SphereError) -> SphereError {
        err
    }
}

#[derive(Clone)]
pub struct Sphere {
    kind: SphereKind,
    ledger: MaterialLedger,
    conditions: BTreeMap<Layer, Conditions>,
    composition: BTreeMap<Layer, BTreeMap<String, f64>>,
    catalog: SharedCatalog,
    resolver: StateResolver,
    transfers: TransferCoordinator,
}

impl fmt::Debug for Sphere {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sphere")
            .field("kind", &self.kind)
            .field("ledger", &self.ledger)
            .field("conditions", &self.conditions)
            .field("composition", &self.composition)
            .finish_non_exhaustive()
    }
}

impl Sphere {
    pub fn new(
        kind: SphereKind,
        catalog: SharedCatalog,
        resolver: StateResolver,
        ledger_config: LedgerConfig,
        conditions: Conditions,
    ) -> Self {
        Self {
            kind,
            ledger: MaterialLedger::new(ledger_config.retain_zero_records),
            conditions: kind.layers().iter().map(|l| (*l, conditions)).collect(),
            composition: kind.layers().iter().map(|l| (*l, BTreeMap::new())).collect(),
            catalog,
            resolver,
            transfers: TransferCoordinator,
        }
    }

    pub fn kind(&self) -> SphereKind {
        self.kind
    }

    pub fn catalog(&self) -> &SharedCatalog {
        &self.catalog
    }

    pub fn resolver(&self) -> &StateResolver {
        &self.resolver
    }

    pub fn transfers(&self) -> &TransferCoordinator {
        &self.transfers
    }

    pub fn ledger(&self) -> &MaterialLedger {
        &self.ledger
    }

    pub fn records(&self) -> impl Iterator<Item = &MaterialRecord> {
        self.ledger.iter()
    }

    // --- conditions ---

    pub fn conditions(&self, layer: Layer) -> Option<Conditions> {
        self.conditions.get(&layer).copied()
    }

    pub fn temperature(&self) -> f64 {
        self.default_conditions().temperature
    }

    pub fn pressure(&self) -> f64 {
        self.default_conditions().pressure
    }

    fn default_conditions(&self) -> Conditions {
        self.conditions
            .get(&self.kind.default_layer())
            .copied()
            .unwrap_or(Conditions {
                temperature: 0.0,
                pressure: 0.0,
            })
    }

    pub fn set_temperature(&mut self, temperature: f64) {
        let pressure = self.pressure();
        self.set_conditions(self.kind.default_layer(), Conditions { temperature, pressure });
    }

    pub fn set_pressure(&mut self, pressure: f64) {
        let temperature = self.temperature();
        self.set_conditions(self.kind.default_layer(), Conditions { temperature, pressure });
    }

    /// Store new layer conditions and re-resolve the state of every record in
    /// that layer. Layers this sphere does not have are ignored.
    pub fn set_conditions(&mut self, layer: Layer, conditions: Conditions) {
        if !self.conditions.contains_key(&layer) {
            return;
        }
        self.conditions.insert(layer, conditions);
        self.reresolve_layer(layer);
    }

    fn reresolve_layer(&mut self, layer: Layer) {
        let updates: Vec<(String, MaterialState)> = self
            .ledger
            .iter_layer(layer)
            .map(|r| {
                let props = self.catalog.resolve(&r.name);
                (r.name.clone(), self.state_for(props.as_ref(), layer))
            })
            .collect();
        for (name, state) in updates {
            self.ledger.set_state(&name, layer, state);
        }
    }

    /// State of `material` under this sphere's conditions for `layer`.
    pub fn state_for(&self, material: Option<&MaterialProperties>, layer: Layer) -> MaterialState {
        let conditions = self.conditions(layer).unwrap_or(self.default_conditions());
        let state = self
            .resolver
            .state_at(material, conditions.temperature, conditions.pressure);
        match (self.kind, state) {
            (SphereKind::Atmosphere, MaterialState::Exotic(_)) => state,
            (SphereKind::Atmosphere, _) => MaterialState::Gas,
            _ => state,
        }
    }

    // --- lookups ---

    pub fn validate_layer(&self, layer: Layer) -> Result<(), SphereError> {
        if self.kind.layers().contains(&layer) {
            Ok(())
        } else {
            Err(SphereError::InvalidLayer {
                layer: layer.to_string(),
                sphere: self.kind,
            })
        }
    }

    /// Catalog id for `name`, or `name` itself when the catalog does not know it.
    pub fn canonical_name(&self, name: &str) -> String {
        self.catalog
            .resolve(name)
            .map(|p| p.id)
            .unwrap_or_else(|| name.to_string())
    }

    pub fn find(&self, name: &str, layer: Layer) -> Option<&MaterialRecord> {
        self.ledger.get(&self.canonical_name(name), layer)
    }

    pub fn amount_of(&self, name: &str, layer: Layer) -> f64 {
        self.ledger.amount_of(&self.canonical_name(name), layer)
    }

    pub fn layer_mass(&self, layer: Layer) -> f64 {
        self.ledger.layer_mass(layer)
    }

    pub fn total_mass(&self) -> f64 {
        self.ledger.total_mass()
    }

    /// Percent of layer mass per material, summing to ~100 when non-empty.
    pub fn composition(&self) -> &BTreeMap<String, f64> {
        self.layer_composition(self.kind.default_layer())
    }

    pub fn layer_composition(&self, layer: Layer) -> &BTreeMap<String, f64> {
        self.composition.get(&layer).unwrap_or(&EMPTY_COMPOSITION)
    }

    fn composition_key(&self, record_name: &str) -> String {
        if self.kind.keys_by_formula() {
            if let Some(props) = self.catalog.resolve(record_name) {
                return props.chemical_formula;
            }
        }
        record_name.to_string()
    }

    fn refresh_composition(&mut self, layer: Layer) {
        let total = self.ledger.layer_mass(layer);
        let mut composition = BTreeMap::new();
        if total > 0.0 {
            for record in self.ledger.iter_layer(layer) {
                if record.amount > 0.0 {
                    let key = self.composition_key(&record.name);
                    *composition.entry(key).or_insert(0.0) += record.amount / total * 100.0;
                }
            }
        }
        self.composition.insert(layer, composition);
    }

    // --- validation ---

    fn validate_name_and_amount(name: &str, amount: f64) -> Result<(), SphereError> {
        if name.trim().is_empty() {
            return Err(SphereError::invalid_material(name, "name must not be blank"));
        }
        if !amount.is_finite() || amount <= 0.0 {
            return Err(SphereError::invalid_material(
                name,
                format!("amount must be positive, got {amount}"),
            ));
        }
        Ok(())
    }

    pub fn resolve_material(&self, name: &str) -> Result<MaterialProperties, SphereError> {
        if name.trim().is_empty() {
            return Err(SphereError::invalid_material(name, "name must not be blank"));
        }
        self.catalog
            .resolve(name)
            .ok_or_else(|| SphereError::invalid_material(name, "not found in material catalog"))
    }

    /// Check every precondition of an addition without mutating anything.
    pub fn validate_addition(
        &self,
        name: &str,
        amount: f64,
        layer: Layer,
    ) -> Result<MaterialProperties, SphereError> {
        Self::validate_name_and_amount(name, amount)?;
        self.validate_layer(layer)?;
        self.resolve_material(name)
    }

    /// Check every precondition of a removal without mutating anything.
    /// Returns the canonical record name.
    pub fn validate_removal(&self, name: &str, amount: f64, layer: Layer) -> Result<String, SphereError> {
        Self::validate_name_and_amount(name, amount)?;
        self.validate_layer(layer)?;

        let canonical = self.canonical_name(name);
        self.ledger
            .check_withdrawal(&canonical, amount, layer)
            .map_err(|shortfall| self.shortfall_error(name, amount, shortfall))?;
        Ok(canonical)
    }

    fn shortfall_error(&self, name: &str, amount: f64, shortfall: Shortfall) -> SphereError {
        match shortfall {
            Shortfall::Missing => SphereError::MaterialNotFound {
                name: name.to_string(),
                sphere: self.kind,
            },
            Shortfall::Insufficient { available } => SphereError::InsufficientMaterial {
                name: name.to_string(),
                sphere: self.kind,
                requested: amount,
                available,
            },
        }
    }

    // --- mutation ---

    /// Add `amount` of `name` to `layer` (the sphere's default layer when
    /// `None`). Returns the record's new amount.
    pub fn add_material(&mut self, name: &str, amount: f64, layer: Option<Layer>) -> Result<f64, SphereError> {
        let layer = layer.unwrap_or(self.kind.default_layer());
        let props = self.validate_addition(name, amount, layer)?;
        Ok(self.deposit_validated(&props, amount, layer))
    }

    /// Remove `amount` of `name` from `layer`. Returns the remaining amount.
    pub fn remove_material(&mut self, name: &str, amount: f64, layer: Option<Layer>) -> Result<f64, SphereError> {
        let layer = layer.unwrap_or(self.kind.default_layer());
        let canonical = self.validate_removal(name, amount, layer)?;
        self.withdraw_validated(&canonical, amount, layer)
    }

    pub(crate) fn deposit_validated(&mut self, props: &MaterialProperties, amount: f64, layer: Layer) -> f64 {
        let state = self.state_for(Some(props), layer);
        let total = self.ledger.deposit(&props.id, amount, state, layer);
        self.refresh_composition(layer);
        log::debug!("{} +{:.3e} {} ({}) -> {:.3e}", self.kind, amount, props.id, layer, total);
        total
    }

    pub(crate) fn withdraw_validated(&mut self, canonical: &str, amount: f64, layer: Layer) -> Result<f64, SphereError> {
        let remaining = self
            .ledger
            .withdraw(canonical, amount, layer)
            .map_err(|shortfall| self.shortfall_error(canonical, amount, shortfall))?;
        self.refresh_composition(layer);
        log::debug!("{} -{:.3e} {} ({}) -> {:.3e}", self.kind, amount, canonical, layer, remaining);
        Ok(remaining)
    }

    /// Overwrite `layer` so it holds `total_mass` split by `composition`
    /// (material -> percent). Validates everything first; on error nothing
    /// changes.
    pub fn write_composition(
        &mut self,
        layer: Layer,
        total_mass: f64,
        composition: &BTreeMap<String, f64>,
        tolerance_pct: f64,
    ) -> Result<(), SphereError> {
        self.validate_layer(layer)?;
        if !total_mass.is_finite() || total_mass < 0.0 {
            return Err(SphereError::InvalidComposition(format!(
                "layer mass must be non-negative, got {total_mass}"
            )));
        }

        if composition.is_empty() && total_mass > 0.0 {
            return Err(SphereError::InvalidComposition(format!(
                "empty composition cannot hold {total_mass} kg"
            )));
        }

        // an id and its formula name the same record
        let mut resolved: BTreeMap<String, (MaterialProperties, f64)> = BTreeMap::new();
        let mut sum = 0.0;
        for (name, pct) in composition {
            if !pct.is_finite() || *pct < 0.0 {
                return Err(SphereError::InvalidComposition(format!("{name} has percentage {pct}")));
            }
            let props = self.resolve_material(name)?;
            resolved
                .entry(props.id.clone())
                .and_modify(|(_, total)| *total += *pct)
                .or_insert((props, *pct));
            sum += pct;
        }
        if !composition.is_empty() && (sum - 100.0).abs() > tolerance_pct {
            return Err(SphereError::InvalidComposition(format!(
                "percentages sum to {sum:.3}, expected 100"
            )));
        }

        let records = resolved
            .into_values()
            .map(|(props, pct)| MaterialRecord {
                amount: total_mass * pct / 100.0,
                state: self.state_for(Some(&props), layer),
                name: props.id,
                layer,
            })
            .collect();
        self.ledger.replace_layer(layer, records);
        self.refresh_composition(layer);
        Ok(())
    }

    /// Replace the whole ledger with `records`, re-resolving each state
    /// against current conditions. Validates every record first; on error
    /// nothing changes.
    pub fn restore_records(&mut self, records: Vec<MaterialRecord>) -> Result<(), SphereError> {
        let mut by_layer: BTreeMap<Layer, BTreeMap<String, MaterialRecord>> =
            self.kind.layers().iter().map(|l| (*l, BTreeMap::new())).collect();
        for record in records {
            self.validate_layer(record.layer)?;
            if !record.amount.is_finite() || record.amount < 0.0 {
                return Err(SphereError::invalid_material(
                    &record.name,
                    format!("stored amount must be non-negative, got {}", record.amount),
                ));
            }
            let props = self.resolve_material(&record.name)?;
            let state = self.state_for(Some(&props), record.layer);
            by_layer
                .entry(record.layer)
                .or_default()
                .entry(props.id.clone())
                .and_modify(|merged| merged.amount += record.amount)
                .or_insert(MaterialRecord {
                    name: props.id,
                    amount: record.amount,
                    state,
                    layer: record.layer,
                });
        }

        for (layer, records) in by_layer {
            self.ledger.replace_layer(layer, records.into_values().collect());
            self.refresh_composition(layer);
        }
        Ok(())
    }

    /// Prune zero-amount records kept by a retaining ledger.
    pub fn compact(&mut self) -> usize {
        self.ledger.compact()
    }
}

impl MaterialEndpoint for Sphere {
    fn sphere(&self) -> &Sphere {
        self
    }

    fn sphere_mut(&mut self) -> &mut Sphere {
        self
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::material_catalog::MaterialCatalog;
    use approx::assert_abs_diff_eq;

    pub(crate) fn test_catalog() -> SharedCatalog {
        MaterialCatalog::embedded().unwrap().shared()
    }

    pub(crate) fn make_sphere(kind: SphereKind, temperature: f64) -> Sphere {
        Sphere::new(
            kind,
            test_catalog(),
            StateResolver::default(),
            LedgerConfig::default(),
            Conditions {
                temperature,
                pressure: 1.0,
            },
        )
    }

    #[test]
    fn test_add_material_validation() {
        let mut sphere = make_sphere(SphereKind::Hydrosphere, 288.0);

        assert!(matches!(
            sphere.add_material("", 10.0, None),
            Err(SphereError::InvalidMaterial { .. })
        ));
        assert!(matches!(
            sphere.add_material("water", 0.0, None),
            Err(SphereError::InvalidMaterial { .. })
        ));
        assert!(matches!(
            sphere.add_material("water", -5.0, None),
            Err(SphereError::InvalidMaterial { .. })
        ));
        assert!(matches!(
            sphere.add_material("unobtainium", 5.0, None),
            Err(SphereError::InvalidMaterial { .. })
        ));
        assert!(matches!(
            sphere.add_material("water", 5.0, Some(Layer::Core)),
            Err(SphereError::InvalidLayer { .. })
        ));
        assert!(sphere.ledger().is_empty());
    }

    #[test]
    fn test_records_keyed_by_catalog_id() {
        let mut sphere = make_sphere(SphereKind::Hydrosphere, 288.0);
        sphere.add_material("water", 10.0, None).unwrap();
        sphere.add_material("H2O", 5.0, None).unwrap();

        assert_eq!(sphere.ledger().len(), 1);
        assert_eq!(sphere.amount_of("water", Layer::Bulk), 15.0);
        assert_eq!(sphere.find("H2O", Layer::Bulk).unwrap().state, MaterialState::Liquid);
    }

    #[test]
    fn test_remove_material_errors() {
        let mut sphere = make_sphere(SphereKind::Geosphere, 288.0);
        sphere.add_material("iron", 10.0, None).unwrap();

        let err = sphere.remove_material("iron", 11.0, None).unwrap_err();
        assert!(matches!(err, SphereError::InsufficientMaterial { available, .. } if available == 10.0));

        let err = sphere.remove_material("nickel", 1.0, None).unwrap_err();
        assert!(matches!(err, SphereError::MaterialNotFound { .. }));
        assert!(err.is_insufficient_material());

        assert_eq!(sphere.amount_of("iron", Layer::Crust), 10.0);
    }

    #[test]
    fn test_composition_tracks_ledger() {
        let mut sphere = make_sphere(SphereKind::Atmosphere, 288.0);
        sphere.add_material("nitrogen", 78.0, None).unwrap();
        sphere.add_material("oxygen", 22.0, None).unwrap();

        let composition = sphere.composition();
        assert_abs_diff_eq!(composition["N2"], 78.0, epsilon = 1e-9);
        assert_abs_diff_eq!(composition["O2"], 22.0, epsilon = 1e-9);

        sphere.remove_material("oxygen", 22.0, None).unwrap();
        assert_abs_diff_eq!(sphere.composition()["N2"], 100.0, epsilon = 1e-9);
        assert!(!sphere.composition().contains_key("O2"));
    }

    #[test]
    fn test_temperature_write_reresolves_states() {
        let mut sphere = make_sphere(SphereKind::Hydrosphere, 288.0);
        sphere.add_material("water", 100.0, None).unwrap();

        sphere.set_temperature(250.0);
        assert_eq!(sphere.find("water", Layer::Bulk).unwrap().state, MaterialState::Solid);

        sphere.set_temperature(400.0);
        assert_eq!(sphere.find("water", Layer::Bulk).unwrap().state, MaterialState::Gas);
    }

    #[test]
    fn test_atmosphere_records_report_gas() {
        let mut sphere = make_sphere(SphereKind::Atmosphere, 250.0);
        sphere.add_material("water", 1.0, None).unwrap();
        assert_eq!(sphere.find("water", Layer::Bulk).unwrap().state, MaterialState::Gas);
    }

    #[test]
    fn test_write_composition() {
        let mut sphere = make_sphere(SphereKind::Geosphere, 288.0);
        let composition = BTreeMap::from([("iron".to_string(), 60.0), ("SiO2".to_string(), 40.0)]);
        sphere.write_composition(Layer::Mantle, 1000.0, &composition, 0.5).unwrap();

        assert_abs_diff_eq!(sphere.amount_of("iron", Layer::Mantle), 600.0, epsilon = 1e-9);
        assert_abs_diff_eq!(sphere.amount_of("silicon_dioxide", Layer::Mantle), 400.0, epsilon = 1e-9);

        let bad = BTreeMap::from([("iron".to_string(), 60.0)]);
        assert!(matches!(
            sphere.write_composition(Layer::Mantle, 1000.0, &bad, 0.5),
            Err(SphereError::InvalidComposition(_))
        ));
        assert_abs_diff_eq!(sphere.layer_mass(Layer::Mantle), 1000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_write_composition_merges_id_and_formula() {
        let mut sphere = make_sphere(SphereKind::Geosphere, 288.0);
        let composition = BTreeMap::from([("Fe".to_string(), 50.0), ("iron".to_string(), 50.0)]);
        sphere.write_composition(Layer::Crust, 1000.0, &composition, 0.5).unwrap();

        assert_eq!(sphere.ledger().len(), 1);
        assert_abs_diff_eq!(sphere.amount_of("iron", Layer::Crust), 1000.0, epsilon = 1e-9);
        assert_abs_diff_eq!(sphere.layer_mass(Layer::Crust), 1000.0, epsilon = 1e-9);
        assert_abs_diff_eq!(sphere.layer_composition(Layer::Crust)["iron"], 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_write_composition_rejects_empty_mix_with_mass() {
        let mut sphere = make_sphere(SphereKind::Geosphere, 288.0);
        sphere.add_material("iron", 10.0, Some(Layer::Core)).unwrap();

        assert!(matches!(
            sphere.write_composition(Layer::Core, 500.0, &BTreeMap::new(), 0.5),
            Err(SphereError::InvalidComposition(_))
        ));
        assert_eq!(sphere.amount_of("iron", Layer::Core), 10.0);

        sphere.write_composition(Layer::Core, 0.0, &BTreeMap::new(), 0.5).unwrap();
        assert_eq!(sphere.layer_mass(Layer::Core), 0.0);
    }

    #[test]
    fn test_unchecked_withdrawal_reports_shortfall() {
        let mut sphere = make_sphere(SphereKind::Hydrosphere, 288.0);
        sphere.add_material("water", 10.0, None).unwrap();

        let err = sphere.withdraw_validated("water", 12.0, Layer::Bulk).unwrap_err();
        assert!(matches!(err, SphereError::InsufficientMaterial { available, .. } if available == 10.0));
        assert!(matches!(
            sphere.withdraw_validated("salt", 1.0, Layer::Bulk),
            Err(SphereError::MaterialNotFound { .. })
        ));
        assert_eq!(sphere.amount_of("water", Layer::Bulk), 10.0);
    }

    #[test]
    fn test_restore_records_merges_duplicates() {
        let mut sphere = make_sphere(SphereKind::Hydrosphere, 288.0);
        let record = |name: &str, amount: f64| MaterialRecord {
            name: name.to_string(),
            amount,
            state: MaterialState::Liquid,
            layer: Layer::Bulk,
        };
        sphere.restore_records(vec![record("water", 30.0), record("H2O", 20.0)]).unwrap();

        assert_eq!(sphere.ledger().len(), 1);
        assert_eq!(sphere.total_mass(), 50.0);
    }
}
