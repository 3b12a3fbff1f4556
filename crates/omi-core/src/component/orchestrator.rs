//! The update loop: how far must the engine advance to satisfy every active
//! consumer, and the single-step pipeline that feeds it.
//!
//! Per update cycle the orchestrator gathers all consumers of the required
//! outputs (walking adapted-output chains), classifies them, and either steps
//! the engine once or iterates single steps until the engine clock reaches
//! the latest requested end. Each single step harvests every active input in
//! parallel, pushes the harvested values into the engine, advances the
//! engine, verifies the clock moved strictly forward and caches fresh values
//! for every active output — not only the required ones, since interpolation
//! quality benefits from full state. A failed step leaves the component
//! poisoned; there is no mid-step resume.

use super::{ComponentStatus, LinkableComponent};
use crate::errors::{wrap_call, OmiError, OmiResult};
use crate::time::Time;
use log::debug;
use rayon::prelude::*;

/// Fixed lookahead, in days, added to the engine clock when setting each
/// input's query time during harvesting.
///
/// Inherited behaviour: the lookahead is one day regardless of the engine's
/// actual step and is not configurable.
pub const INPUT_QUERY_LOOKAHEAD_DAYS: f64 = 1.0;

/// What an update cycle decided about engine advancement.
#[derive(Debug, PartialEq)]
struct UpdatePlan {
    /// Step exactly once instead of advancing to a target time.
    once: bool,
    /// Earliest time any consumer still needs; caches trim up to here.
    earliest_start: Option<Time>,
    /// Latest requested end across time-aware consumers.
    latest_end: Option<Time>,
}

impl LinkableComponent {
    /// Run one update cycle for the given required outputs.
    pub fn update(&mut self, required: &[&str]) -> OmiResult<()> {
        self.expect_status(
            &[
                ComponentStatus::Prepared,
                ComponentStatus::Updating,
                ComponentStatus::Done,
            ],
            "update",
        )?;
        if self.status() == ComponentStatus::Done {
            return Ok(());
        }

        self.status = ComponentStatus::Updating;
        let result = self.run_update(required);
        match &result {
            Ok(()) => {
                if self.extent.completed() {
                    self.status = ComponentStatus::Done;
                }
            }
            Err(_) => self.status = ComponentStatus::Failed,
        }
        result
    }

    fn run_update(&mut self, required: &[&str]) -> OmiResult<()> {
        let plan = self.plan_update(required)?;
        debug!("{}: update plan {plan:?}", self.id);

        if plan.once {
            self.single_step()?;
        } else {
            let target = plan
                .latest_end
                .expect("iterative advance always has a target");
            let mut now = wrap_call(self.engine.current_time(), "current_time")?;
            while now < target && !self.extent.completed() {
                now = self.single_step()?;
            }
        }

        // Values before the earliest outstanding request are dead weight.
        if let Some(start) = plan.earliest_start {
            if start.is_finite() {
                for output in self.outputs.iter_mut().filter(|o| o.is_active()) {
                    output.converter_mut().empty_caches(start);
                }
            }
        }
        Ok(())
    }

    /// Classify the consumers of the required outputs and decide between a
    /// single step and an iterative advance.
    fn plan_update(&self, required: &[&str]) -> OmiResult<UpdatePlan> {
        let mut earliest_start: Option<Time> = None;
        let mut latest_end: Option<Time> = None;
        let mut any_non_temporal = false;
        let mut time_aware = 0usize;

        for &item in required {
            if self.output(item).is_none() {
                return Err(OmiError::Configuration(format!(
                    "update requires unknown output `{item}`"
                )));
            }
            for consumer in self.links.collect_consumers(item) {
                let consumer = consumer.lock().expect("consumer lock poisoned");
                match &consumer.request {
                    Some(request) => {
                        time_aware += 1;
                        if let Some(start) = request.earliest_start() {
                            earliest_start =
                                Some(earliest_start.map_or(start, |s: Time| s.min(start)));
                        }
                        if let Some(end) = request.latest_end() {
                            latest_end = Some(latest_end.map_or(end, |e: Time| e.max(end)));
                        }
                    }
                    None => any_non_temporal = true,
                }
            }
        }

        let unbounded_end = matches!(latest_end, Some(end) if end == f64::INFINITY);
        let once = any_non_temporal || time_aware == 0 || latest_end.is_none() || unbounded_end;

        Ok(UpdatePlan {
            once,
            earliest_start,
            latest_end,
        })
    }

    /// Advance the engine by exactly one step.
    ///
    /// Input harvesting runs one task per active input; every task writes
    /// only its own input's pending slot, and all tasks join before anything
    /// is pushed into the engine. The engine advance itself and the output
    /// caching that follows are strictly serial.
    fn single_step(&mut self) -> OmiResult<Time> {
        let before = wrap_call(self.engine.current_time(), "current_time")?;
        let query = before + INPUT_QUERY_LOOKAHEAD_DAYS;
        debug!("{}: stepping from t={before}, harvesting inputs at t={query}", self.id);

        self.inputs
            .par_iter_mut()
            .try_for_each(|input| input.harvest(query))?;

        {
            let engine = self.engine.as_mut();
            for input in &mut self.inputs {
                input.push_pending(engine, query)?;
            }
        }

        wrap_call(self.engine.update(), "update")?;

        let after = wrap_call(self.engine.current_time(), "current_time")?;
        if after <= before {
            return Err(OmiError::EngineStalled { before, after });
        }

        {
            let engine = self.engine.as_mut();
            for output in self.outputs.iter_mut().filter(|o| o.is_active()) {
                output.converter_mut().cache_engine_values(engine)?;
            }
        }

        self.extent.record(after);
        debug!("{}: engine advanced to t={after}", self.id);
        Ok(after)
    }
}
