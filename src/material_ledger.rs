use crate::phase_state::MaterialState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Storage layer within a sphere. Only the geosphere is layered; every other
/// sphere stores its materials in `Bulk`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    Bulk,
    Crust,
    Mantle,
    Core,
}

impl Layer {
    pub const GEOSPHERE: [Layer; 3] = [Layer::Crust, Layer::Mantle, Layer::Core];

    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::Bulk => "bulk",
            Layer::Crust => "crust",
            Layer::Mantle => "mantle",
            Layer::Core => "core",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "bulk" => Some(Layer::Bulk),
            "crust" => Some(Layer::Crust),
            "mantle" => Some(Layer::Mantle),
            "core" => Some(Layer::Core),
            _ => None,
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named quantity of one material in one layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialRecord {
    pub name: String,
    pub amount: f64,
    pub state: MaterialState,
    pub layer: Layer,
}

/// Why a withdrawal cannot be honoured.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shortfall {
    Missing,
    Insufficient { available: f64 },
}

/// Inventory of material records, unique per (layer, name).
///
/// Amounts never go negative. A record whose amount reaches exactly zero is
/// pruned unless the ledger was created with `retain_zero`, in which case it
/// stays until `compact` is called.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialLedger {
    records: BTreeMap<(Layer, String), MaterialRecord>,
    retain_zero: bool,
}

impl MaterialLedger {
    pub fn new(retain_zero: bool) -> Self {
        Self {
            records: BTreeMap::new(),
            retain_zero,
        }
    }

    pub fn retains_zero(&self) -> bool {
        self.retain_zero
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, name: &str, layer: Layer) -> Option<&MaterialRecord> {
        self.records.get(&(layer, name.to_string()))
    }

    pub fn amount_of(&self, name: &str, layer: Layer) -> f64 {
        self.get(name, layer).map_or(0.0, |r| r.amount)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MaterialRecord> {
        self.records.values()
    }

    pub fn iter_layer(&self, layer: Layer) -> impl Iterator<Item = &MaterialRecord> {
        self.records.values().filter(move |r| r.layer == layer)
    }

    pub fn layer_mass(&self, layer: Layer) -> f64 {
        self.iter_layer(layer).fold(0.0, |acc, r| acc + r.amount)
    }

    pub fn total_mass(&self) -> f64 {
        self.records.values().fold(0.0, |acc, r| acc + r.amount)
    }

    /// Find-or-create the record and increase its amount. Returns the new amount.
    pub fn deposit(&mut self, name: &str, amount: f64, state: MaterialState, layer: Layer) -> f64 {
        let record = self
            .records
            .entry((layer, name.to_string()))
            .or_insert_with(|| MaterialRecord {
                name: name.to_string(),
                amount: 0.0,
                state,
                layer,
            });
        record.amount += amount;
        record.state = state;
        record.amount
    }

    pub fn check_withdrawal(&self, name: &str, amount: f64, layer: Layer) -> Result<(), Shortfall> {
        match self.get(name, layer) {
            None => Err(Shortfall::Missing),
            Some(record) if record.amount < amount => Err(Shortfall::Insufficient {
                available: record.amount,
            }),
            Some(_) => Ok(()),
        }
    }

    /// Decrease a record's amount. Returns the remaining amount.
    pub fn withdraw(&mut self, name: &str, amount: f64, layer: Layer) -> Result<f64, Shortfall> {
        self.check_withdrawal(name, amount, layer)?;

        let key = (layer, name.to_string());
        let remaining = match self.records.get_mut(&key) {
            Some(record) => {
                record.amount = (record.amount - amount).max(0.0);
                record.amount
            }
            None => return Err(Shortfall::Missing),
        };
        if remaining == 0.0 && !self.retain_zero {
            self.records.remove(&key);
        }
        Ok(remaining)
    }

    pub fn set_state(&mut self, name: &str, layer: Layer, state: MaterialState) {
        if let Some(record) = self.records.get_mut(&(layer, name.to_string())) {
            record.state = state;
        }
    }

    /// Replace every record of `layer` with `records`.
    pub fn replace_layer(&mut self, layer: Layer, records: Vec<MaterialRecord>) {
        self.records.retain(|(l, _), _| *l != layer);
        for record in records {
            if record.amount > 0.0 || self.retain_zero {
                self.records.insert((layer, record.name.clone()), MaterialRecord { layer, ..record });
            }
        }
    }

    /// Prune zero-amount records. Returns how many were removed.
    pub fn compact(&mut self) -> usize {
        let before = self.records.len();
        self.records.retain(|_, r| r.amount > 0.0);
        before - self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deposit_find_or_create() {
        let mut ledger = MaterialLedger::default();
        assert_eq!(ledger.deposit("iron", 100.0, MaterialState::Solid, Layer::Crust), 100.0);
        assert_eq!(ledger.deposit("iron", 50.0, MaterialState::Solid, Layer::Crust), 150.0);
        assert_eq!(ledger.deposit("iron", 10.0, MaterialState::Solid, Layer::Core), 10.0);

        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.layer_mass(Layer::Crust), 150.0);
        assert_eq!(ledger.total_mass(), 160.0);
    }

    #[test]
    fn test_withdraw_partial_keeps_record() {
        let mut ledger = MaterialLedger::default();
        ledger.deposit("iron", 150.0, MaterialState::Solid, Layer::Crust);

        assert_eq!(ledger.withdraw("iron", 100.0, Layer::Crust), Ok(50.0));
        assert_eq!(ledger.get("iron", Layer::Crust).unwrap().amount, 50.0);
    }

    #[test]
    fn test_withdraw_to_zero_prunes_by_default() {
        let mut ledger = MaterialLedger::default();
        ledger.deposit("iron", 100.0, MaterialState::Solid, Layer::Crust);

        assert_eq!(ledger.withdraw("iron", 100.0, Layer::Crust), Ok(0.0));
        assert!(ledger.get("iron", Layer::Crust).is_none());
    }

    #[test]
    fn test_withdraw_to_zero_retained_then_compacted() {
        let mut ledger = MaterialLedger::new(true);
        ledger.deposit("iron", 100.0, MaterialState::Solid, Layer::Crust);
        ledger.withdraw("iron", 100.0, Layer::Crust).unwrap();

        assert_eq!(ledger.get("iron", Layer::Crust).unwrap().amount, 0.0);
        assert_eq!(ledger.compact(), 1);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_over_withdrawal_leaves_ledger_unchanged() {
        let mut ledger = MaterialLedger::default();
        ledger.deposit("water", 10.0, MaterialState::Liquid, Layer::Bulk);
        let before = ledger.clone();

        assert_eq!(
            ledger.withdraw("water", 10.5, Layer::Bulk),
            Err(Shortfall::Insufficient { available: 10.0 })
        );
        assert_eq!(ledger.withdraw("salt", 1.0, Layer::Bulk), Err(Shortfall::Missing));
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_empty_ledger_mass_is_positive_zero() {
        let mut ledger = MaterialLedger::default();
        assert!(ledger.total_mass().is_sign_positive());
        assert!(ledger.layer_mass(Layer::Crust).is_sign_positive());

        ledger.deposit("iron", 5.0, MaterialState::Solid, Layer::Crust);
        ledger.withdraw("iron", 5.0, Layer::Crust).unwrap();
        assert_eq!(ledger.total_mass().to_string(), "0");
    }

    #[test]
    fn test_layer_parsing() {
        assert_eq!(Layer::from_str("mantle"), Some(Layer::Mantle));
        assert_eq!(Layer::from_str("ocean"), None);
        assert_eq!(Layer::Core.to_string(), "core");
    }
}
