use crate::error::SphereError;
use crate::sim::{SphereSet, TickReport};
use crate::sim_op::{SphereOp, SphereOpHandle};
use crate::sphere::SphereKind;

/// Biosphere stage: score habitability from this tick's atmosphere and
/// hydrosphere.
pub struct BiosphereOp;

impl BiosphereOp {
    pub fn handle() -> SphereOpHandle {
        SphereOpHandle::new(Box::new(BiosphereOp))
    }
}

impl SphereOp for BiosphereOp {
    fn name(&self) -> &str {
        "biosphere"
    }

    fn stage(&self) -> SphereKind {
        SphereKind::Biosphere
    }

    fn update_sim(&mut self, spheres: &mut SphereSet, report: &mut TickReport) -> Result<(), SphereError> {
        let SphereSet {
            biosphere,
            atmosphere,
            hydrosphere,
            ..
        } = spheres;
        if let Some(biosphere) = biosphere.as_mut() {
            report.habitable_ratio = Some(biosphere.update_habitable_ratio(atmosphere.as_ref(), hydrosphere.as_ref()));
        }
        Ok(())
    }
}
