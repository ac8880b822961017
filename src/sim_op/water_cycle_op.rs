use crate::error::SphereError;
use crate::sim::{SphereSet, TickReport};
use crate::sim_op::{SphereOp, SphereOpHandle};
use crate::sphere::SphereKind;

/// Hydrosphere stage: one evaporation/precipitation exchange.
pub struct WaterCycleOp;

impl WaterCycleOp {
    pub fn handle() -> SphereOpHandle {
        SphereOpHandle::new(Box::new(WaterCycleOp))
    }
}

impl SphereOp for WaterCycleOp {
    fn name(&self) -> &str {
        "water_cycle"
    }

    fn stage(&self) -> SphereKind {
        SphereKind::Hydrosphere
    }

    fn update_sim(&mut self, spheres: &mut SphereSet, report: &mut TickReport) -> Result<(), SphereError> {
        let SphereSet {
            hydrosphere, atmosphere, ..
        } = spheres;
        if let Some(hydrosphere) = hydrosphere.as_mut() {
            report.water_cycle = Some(hydrosphere.water_cycle_tick(atmosphere.as_mut())?);
        }
        Ok(())
    }
}
