//! Geosphere stage: refresh geological activity, then outgas crust
//! volatiles into the atmosphere.
use crate::error::SphereError;
use crate::sim::{SphereSet, TickReport};
use crate::sim_op::{SphereOp, SphereOpHandle};
use crate::sphere::SphereKind;

pub struct GeosphereOp {
    /// Crust heating per tick, K. Zero disables outgassing.
    pub heating_per_step_k: f64,
}

impl GeosphereOp {
    pub fn new(heating_per_step_k: f64) -> Self {
        Self { heating_per_step_k }
    }

    pub fn handle(heating_per_step_k: f64) -> SphereOpHandle {
        SphereOpHandle::new(Box::new(Self::new(heating_per_step_k)))
    }
}

impl SphereOp for GeosphereOp {
    fn name(&self) -> &str {
        "geosphere"
    }

    fn stage(&self) -> SphereKind {
        SphereKind::Geosphere
    }

    fn update_sim(&mut self, spheres: &mut SphereSet, report: &mut TickReport) -> Result<(), SphereError> {
        let SphereSet {
            geosphere, atmosphere, ..
        } = spheres;
        let Some(geosphere) = geosphere.as_mut() else {
            return Ok(());
        };

        report.geological_activity = Some(geosphere.update_geological_activity());
        report.tectonic_activity = Some(geosphere.tectonic_activity());

        let released = geosphere.extract_volatiles(self.heating_per_step_k, atmosphere.as_mut())?;
        for (formula, amount) in released {
            *report.outgassed.entry(formula).or_insert(0.0) += amount;
        }
        Ok(())
    }
}
