#![allow(dead_code)]

//! Scripted engines and providers used by the crate's own tests.

use crate::engine::Engine;
use crate::errors::{OmiError, OmiResult};
use crate::exchange::Provider;
use crate::time::{Time, TimeSet, TimeStamp};
use crate::values::{ElementLayout, ValueSet, Values};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

type OutputFn = Box<dyn Fn(Time) -> Vec<f64> + Send + Sync>;

/// A deterministic time-stepping engine whose outputs are functions of the
/// engine clock.
pub(crate) struct ScriptedEngine {
    time: Time,
    start: Time,
    end: Time,
    step: f64,
    outputs: HashMap<String, OutputFn>,
    pushed: HashMap<String, Vec<f64>>,
    declared_inputs: HashMap<String, ElementLayout>,
    declared_outputs: HashMap<String, ElementLayout>,
    update_count: usize,
    fail_next_update: bool,
}

impl ScriptedEngine {
    pub fn with_horizon(start: Time, end: Time, step: f64) -> Self {
        Self {
            time: start,
            start,
            end,
            step,
            outputs: HashMap::new(),
            pushed: HashMap::new(),
            declared_inputs: HashMap::new(),
            declared_outputs: HashMap::new(),
            update_count: 0,
            fail_next_update: false,
        }
    }

    /// Script an output item as a function of engine time.
    pub fn with_output_fn(
        mut self,
        item: impl Into<String>,
        f: impl Fn(Time) -> Vec<f64> + Send + Sync + 'static,
    ) -> Self {
        self.outputs.insert(item.into(), Box::new(f));
        self
    }

    /// Last buffer pushed for an input item.
    pub fn pushed(&self, item: &str) -> Option<&Vec<f64>> {
        self.pushed.get(item)
    }

    pub fn update_count(&self) -> usize {
        self.update_count
    }

    /// Force the clock backwards, simulating a misbehaving engine.
    pub fn rewind_to(&mut self, time: Time) {
        self.time = time;
    }

    /// Make the next `update` call fail.
    pub fn fail_next_update(&mut self) {
        self.fail_next_update = true;
    }
}

impl Engine for ScriptedEngine {
    fn ping(&mut self) -> OmiResult<String> {
        Ok(format!("scripted engine at t={}", self.time))
    }

    fn initialise(&mut self, _config: &str) -> OmiResult<()> {
        self.time = self.start;
        Ok(())
    }

    fn prepare(&mut self) -> OmiResult<()> {
        Ok(())
    }

    fn update(&mut self) -> OmiResult<()> {
        if self.fail_next_update {
            self.fail_next_update = false;
            return Err(OmiError::Engine("scripted update failure".to_string()));
        }
        self.update_count += 1;
        self.time = (self.time + self.step).min(self.end);
        Ok(())
    }

    fn finish(&mut self) -> OmiResult<()> {
        Ok(())
    }

    fn dispose(&mut self) -> OmiResult<()> {
        Ok(())
    }

    fn current_time(&mut self) -> OmiResult<Time> {
        Ok(self.time)
    }

    fn set_input(&mut self, item: &str, layout: &ElementLayout) -> OmiResult<()> {
        self.declared_inputs.insert(item.to_string(), layout.clone());
        Ok(())
    }

    fn set_output(&mut self, item: &str, layout: &ElementLayout) -> OmiResult<()> {
        self.declared_outputs
            .insert(item.to_string(), layout.clone());
        Ok(())
    }

    fn set_doubles(&mut self, item: &str, _missing: f64, values: &[f64]) -> OmiResult<()> {
        self.pushed.insert(item.to_string(), values.to_vec());
        Ok(())
    }

    fn get_doubles(&mut self, item: &str, _missing: f64) -> OmiResult<Vec<f64>> {
        let f = self
            .outputs
            .get(item)
            .ok_or_else(|| OmiError::Engine(format!("scripted engine has no output `{item}`")))?;
        Ok(f(self.time))
    }
}

/// An engine whose clock never moves, for stall detection tests.
pub(crate) struct StallingEngine {
    time: Time,
}

impl StallingEngine {
    pub fn at(time: Time) -> Self {
        Self { time }
    }
}

impl Engine for StallingEngine {
    fn ping(&mut self) -> OmiResult<String> {
        Ok("stalled".to_string())
    }

    fn initialise(&mut self, _config: &str) -> OmiResult<()> {
        Ok(())
    }

    fn prepare(&mut self) -> OmiResult<()> {
        Ok(())
    }

    fn update(&mut self) -> OmiResult<()> {
        // The clock stays put.
        Ok(())
    }

    fn finish(&mut self) -> OmiResult<()> {
        Ok(())
    }

    fn dispose(&mut self) -> OmiResult<()> {
        Ok(())
    }

    fn current_time(&mut self) -> OmiResult<Time> {
        Ok(self.time)
    }

    fn set_input(&mut self, _item: &str, _layout: &ElementLayout) -> OmiResult<()> {
        Ok(())
    }

    fn set_output(&mut self, _item: &str, _layout: &ElementLayout) -> OmiResult<()> {
        Ok(())
    }

    fn get_doubles(&mut self, _item: &str, _missing: f64) -> OmiResult<Vec<f64>> {
        Ok(vec![0.0])
    }
}

/// A provider that returns a constant value and records every requested
/// time, for harvest assertions.
pub(crate) struct RecordedProvider {
    value: f64,
    seen: Arc<Mutex<Vec<Time>>>,
}

impl RecordedProvider {
    pub fn new(value: f64) -> (Self, Arc<Mutex<Vec<Time>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                value,
                seen: Arc::clone(&seen),
            },
            seen,
        )
    }
}

impl Provider for RecordedProvider {
    fn values_at(&mut self, request: &TimeSet) -> OmiResult<ValueSet> {
        let mut seen = self.seen.lock().expect("request log lock poisoned");
        let records = request
            .stamps()
            .iter()
            .map(|stamp| {
                seen.push(stamp.time);
                (*stamp, Values::Doubles(vec![self.value].into()))
            })
            .collect();
        Ok(ValueSet::new(records))
    }
}

/// A provider whose value is a linear function of the requested time.
pub(crate) struct LinearProvider {
    pub rate: f64,
}

impl Provider for LinearProvider {
    fn values_at(&mut self, request: &TimeSet) -> OmiResult<ValueSet> {
        let records = request
            .stamps()
            .iter()
            .map(|stamp| {
                (
                    *stamp,
                    Values::Doubles(vec![self.rate * stamp.time].into()),
                )
            })
            .collect();
        Ok(ValueSet::new(records))
    }
}

/// One requested stamp per call, stamped slightly off, to trigger input time
/// mismatches.
pub(crate) struct MisstampedProvider {
    pub offset: f64,
    pub value: f64,
}

impl Provider for MisstampedProvider {
    fn values_at(&mut self, request: &TimeSet) -> OmiResult<ValueSet> {
        let records = request
            .stamps()
            .iter()
            .map(|stamp| {
                (
                    TimeStamp::instant(stamp.time + self.offset),
                    Values::Doubles(vec![self.value].into()),
                )
            })
            .collect();
        Ok(ValueSet::new(records))
    }
}
