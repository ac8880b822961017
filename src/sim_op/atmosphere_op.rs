//! Atmosphere stage: re-derive surface pressure from the gas mass after
//! the geosphere has outgassed into it.
use crate::error::SphereError;
use crate::sim::{SphereSet, TickReport};
use crate::sim_op::{SphereOp, SphereOpHandle};
use crate::sphere::SphereKind;

pub struct AtmosphereOp;

impl AtmosphereOp {
    pub fn handle() -> SphereOpHandle {
        SphereOpHandle::new(Box::new(AtmosphereOp))
    }
}

impl SphereOp for AtmosphereOp {
    fn name(&self) -> &str {
        "atmosphere"
    }

    fn stage(&self) -> SphereKind {
        SphereKind::Atmosphere
    }

    fn update_sim(&mut self, spheres: &mut SphereSet, report: &mut TickReport) -> Result<(), SphereError> {
        if let Some(atmosphere) = spheres.atmosphere.as_mut() {
            report.pressure = Some(atmosphere.update_pressure());
        }
        Ok(())
    }
}
