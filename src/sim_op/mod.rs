// Per-sphere operations run by the simulation each tick
pub mod atmosphere_op;
pub mod biosphere_op;
pub mod geosphere_op;
pub mod water_cycle_op;

pub use atmosphere_op::AtmosphereOp;
pub use biosphere_op::BiosphereOp;
pub use geosphere_op::GeosphereOp;
pub use water_cycle_op::WaterCycleOp;

use crate::error::SphereError;
use crate::sim::{SphereSet, TickReport};
use crate::sphere::SphereKind;

pub trait SphereOp {
    /// The name of this operator (for identification and reporting)
    fn name(&self) -> &str;

    /// The sphere this op belongs to; ops execute in sphere tick order.
    fn stage(&self) -> SphereKind;

    /// Called every simulation step. An `Err` aborts and rolls back the tick.
    fn update_sim(&mut self, spheres: &mut SphereSet, report: &mut TickReport) -> Result<(), SphereError>;
}

pub struct SphereOpHandle {
    pub op: Box<dyn SphereOp>,
}

impl SphereOpHandle {
    pub fn new(op: Box<dyn SphereOp>) -> Self {
        SphereOpHandle { op }
    }
}
