use crate::error::SphereError;
use crate::material_ledger::Layer;
use crate::sphere::{MaterialEndpoint, SphereKind};
use serde::{Deserialize, Serialize};

/// A completed movement of material between two spheres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub material: String,
    pub amount: f64,
    pub from: SphereKind,
    pub from_layer: Layer,
    pub to: SphereKind,
    pub to_layer: Layer,
}

/// Moves material between two endpoints as one unit: both sides are
/// validated before either ledger is touched, and the amount withdrawn is
/// exactly the amount deposited.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TransferCoordinator;

impl TransferCoordinator {
    pub fn transfer_material<S, T>(
        &self,
        source: &mut S,
        name: &str,
        amount: f64,
        target: &mut T,
    ) -> Result<Transfer, SphereError>
    where
        S: MaterialEndpoint + ?Sized,
        T: MaterialEndpoint + ?Sized,
    {
        self.transfer_between(source, None, target, None, name, amount)
    }

    /// Layer-aware transfer; `None` selects each sphere's default layer.
    pub fn transfer_between<S, T>(
        &self,
        source: &mut S,
        source_layer: Option<Layer>,
        target: &mut T,
        target_layer: Option<Layer>,
        name: &str,
        amount: f64,
    ) -> Result<Transfer, SphereError>
    where
        S: MaterialEndpoint + ?Sized,
        T: MaterialEndpoint + ?Sized,
    {
        let from = source.sphere().kind();
        let to = target.sphere().kind();
        let from_layer = source_layer.unwrap_or(from.default_layer());
        let to_layer = target_layer.unwrap_or(to.default_layer());

        let canonical = source
            .sphere()
            .validate_removal(name, amount, from_layer)
            .map_err(|e| source.map_error(e))?;
        let props = target
            .sphere()
            .validate_addition(&canonical, amount, to_layer)
            .map_err(|e| target.map_error(e))?;

        source
            .sphere_mut()
            .withdraw_validated(&canonical, amount, from_layer)
            .map_err(|e| source.map_error(e))?;
        source.ledger_changed(&props, -amount);
        target.sphere_mut().deposit_validated(&props, amount, to_layer);
        target.ledger_changed(&props, amount);

        log::debug!("transferred {amount:.3e} {canonical} {from}/{from_layer} -> {to}/{to_layer}");
        Ok(Transfer {
            material: props.id,
            amount,
            from,
            from_layer,
            to,
            to_layer,
        })
    }
}
