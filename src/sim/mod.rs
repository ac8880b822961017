use crate::atmosphere::Atmosphere;
use crate::biosphere::Biosphere;
use crate::error::SphereError;
use crate::geosphere::Geosphere;
use crate::hydrosphere::{Hydrosphere, WaterCycleOutcome};
use crate::sim_op::{SphereOp, SphereOpHandle};
use crate::sphere::SphereKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The spheres belonging to one host. Any of them may be absent: an airless
/// moon has no atmosphere, a craft may have no geosphere.
#[derive(Debug, Clone)]
pub struct SphereSet {
    pub host_id: String,
    pub geosphere: Option<Geosphere>,
    pub atmosphere: Option<Atmosphere>,
    pub hydrosphere: Option<Hydrosphere>,
    pub biosphere: Option<Biosphere>,
}

impl SphereSet {
    pub fn new(host_id: &str) -> Self {
        Self {
            host_id: host_id.to_string(),
            geosphere: None,
            atmosphere: None,
            hydrosphere: None,
            biosphere: None,
        }
    }

    pub fn kinds(&self) -> Vec<SphereKind> {
        SphereKind::TICK_ORDER
            .into_iter()
            .filter(|kind| match kind {
                SphereKind::Geosphere => self.geosphere.is_some(),
                SphereKind::Atmosphere => self.atmosphere.is_some(),
                SphereKind::Hydrosphere => self.hydrosphere.is_some(),
                SphereKind::Biosphere => self.biosphere.is_some(),
            })
            .collect()
    }

    /// Mass held across every sphere, kg.
    pub fn total_mass(&self) -> f64 {
        self.geosphere.as_ref().map_or(0.0, |g| g.total_geosphere_mass())
            + self.atmosphere.as_ref().map_or(0.0, |a| a.total_atmospheric_mass())
            + self.hydrosphere.as_ref().map_or(0.0, |h| h.total_hydrosphere_mass())
            + self.biosphere.as_ref().map_or(0.0, |b| b.total_biomass())
    }

    pub fn capture_base_values(&mut self) {
        if let Some(geosphere) = self.geosphere.as_mut() {
            geosphere.capture_base_values();
        }
        if let Some(atmosphere) = self.atmosphere.as_mut() {
            atmosphere.capture_base_values();
        }
        if let Some(hydrosphere) = self.hydrosphere.as_mut() {
            hydrosphere.capture_base_values();
        }
        if let Some(biosphere) = self.biosphere.as_mut() {
            biosphere.capture_base_values();
        }
    }

    /// Reset every present sphere. Either all of them restore or none do.
    pub fn reset(&mut self) -> bool {
        let mut staged = self.clone();
        let restored = staged.geosphere.as_mut().is_none_or(|g| g.reset())
            && staged.atmosphere.as_mut().is_none_or(|a| a.reset())
            && staged.hydrosphere.as_mut().is_none_or(|h| h.reset())
            && staged.biosphere.as_mut().is_none_or(|b| b.reset());
        if restored {
            *self = staged;
        }
        restored
    }
}

/// What one tick did.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    pub step: u64,
    pub ops_run: Vec<String>,
    /// formula -> kg released from the crust
    pub outgassed: BTreeMap<String, f64>,
    pub geological_activity: Option<f64>,
    pub tectonic_activity: Option<bool>,
    pub pressure: Option<f64>,
    pub water_cycle: Option<WaterCycleOutcome>,
    pub habitable_ratio: Option<f64>,
}

pub struct SimProps {
    pub spheres: SphereSet,
    pub start_ops: Vec<SphereOpHandle>,
    pub step_ops: Vec<SphereOpHandle>,
    pub end_ops: Vec<SphereOpHandle>,
    pub sim_steps: u64,
}

/// Runs sphere operations over one host's spheres, tick by tick.
///
/// Step ops always execute in sphere dependency order (geosphere,
/// atmosphere, hydrosphere, biosphere) whatever order they were supplied in.
/// A tick is atomic: if any op fails the spheres are restored to their
/// state before the tick.
pub struct Simulation {
    spheres: SphereSet,
    start_ops: Vec<Box<dyn SphereOp>>,
    step_ops: Vec<Box<dyn SphereOp>>,
    end_ops: Vec<Box<dyn SphereOp>>,
    step: u64,
    sim_steps: u64,
}

fn unwrap_handles(handles: Vec<SphereOpHandle>) -> Vec<Box<dyn SphereOp>> {
    let mut ops: Vec<Box<dyn SphereOp>> = handles.into_iter().map(|handle| handle.op).collect();
    ops.sort_by_key(|op| op.stage());
    ops
}

impl Simulation {
    pub fn new(props: SimProps) -> Simulation {
        Simulation {
            spheres: props.spheres,
            start_ops: unwrap_handles(props.start_ops),
            step_ops: unwrap_handles(props.step_ops),
            end_ops: unwrap_handles(props.end_ops),
            step: 0,
            sim_steps: props.sim_steps,
        }
    }

    pub fn spheres(&self) -> &SphereSet {
        &self.spheres
    }

    pub fn spheres_mut(&mut self) -> &mut SphereSet {
        &mut self.spheres
    }

    pub fn into_spheres(self) -> SphereSet {
        self.spheres
    }

    pub fn step_count(&self) -> u64 {
        self.step
    }

    pub fn sim_steps(&self) -> u64 {
        self.sim_steps
    }

    /// Names of the step ops in execution order.
    pub fn op_names(&self) -> Vec<&str> {
        self.step_ops.iter().map(|op| op.name()).collect()
    }

    pub fn add_step_op(&mut self, handle: SphereOpHandle) {
        self.step_ops.push(handle.op);
        self.step_ops.sort_by_key(|op| op.stage());
    }

    /// Run the start ops, `sim_steps` ticks, then the end ops.
    pub fn simulate(&mut self) -> Result<Vec<TickReport>, SphereError> {
        self.simulate_init()?;

        let mut reports = Vec::with_capacity(self.sim_steps as usize);
        for _ in 0..self.sim_steps {
            reports.push(self.step()?);
        }

        self.simulate_end()?;
        Ok(reports)
    }

    fn simulate_init(&mut self) -> Result<(), SphereError> {
        let mut ops = std::mem::take(&mut self.start_ops);
        let mut report = TickReport::default();
        let result = ops
            .iter_mut()
            .try_for_each(|op| op.update_sim(&mut self.spheres, &mut report));
        self.start_ops = ops;
        result
    }

    fn simulate_end(&mut self) -> Result<(), SphereError> {
        let mut ops = std::mem::take(&mut self.end_ops);
        let mut report = TickReport {
            step: self.step,
            ..TickReport::default()
        };
        let result = ops
            .iter_mut()
            .try_for_each(|op| op.update_sim(&mut self.spheres, &mut report));
        self.end_ops = ops;
        result
    }

    /// Advance one tick.
    pub fn step(&mut self) -> Result<TickReport, SphereError> {
        let snapshot = self.spheres.clone();
        let mut ops = std::mem::take(&mut self.step_ops);
        let mut report = TickReport {
            step: self.step + 1,
            ..TickReport::default()
        };

        let mut result = Ok(());
        for op in &mut ops {
            if let Err(err) = op.update_sim(&mut self.spheres, &mut report) {
                log::warn!("tick {} aborted in {}: {err}", report.step, op.name());
                result = Err(err);
                break;
            }
            report.ops_run.push(op.name().to_string());
        }
        self.step_ops = ops;

        match result {
            Ok(()) => {
                self.step += 1;
                log::debug!("tick {} complete: {:?}", self.step, report.ops_run);
                Ok(report)
            }
            Err(err) => {
                self.spheres = snapshot;
                Err(err)
            }
        }
    }
}
