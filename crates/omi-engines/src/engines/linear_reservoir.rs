//! Linear reservoir cascade engine
//!
//! A small hydrological routing engine: an inflow is passed through a
//! cascade of linear reservoirs, each draining in proportion to its storage.
//!
//! The governing equations per reservoir are:
//!
//! $$ \frac{dS_i}{dt} = q_{i-1} - k S_i, \qquad q_i = k S_i $$
//!
//! Where:
//! - $S_i$ is the storage of reservoir $i$ (m³)
//! - $q_{i-1}$ is the upstream flow, with $q_0$ the external inflow (m³/day)
//! - $k$ is the outflow coefficient (1/day)
//!
//! Storages are integrated with explicit Euler at the engine step. The
//! engine exposes one input (`inflow`, one value) and two outputs
//! (`outflow`, one value; `storage`, one value per reservoir).

use log::debug;
use omi_core::errors::{OmiError, OmiResult};
use omi_core::time::Time;
use omi_core::values::ElementLayout;
use omi_core::{Arguments, Engine};
use serde::{Deserialize, Serialize};

/// Identifier this engine registers under.
pub const ENGINE_ID: &str = "linear_reservoir";

pub const ITEM_INFLOW: &str = "inflow";
pub const ITEM_OUTFLOW: &str = "outflow";
pub const ITEM_STORAGE: &str = "storage";

/// Parameters for the cascade, loaded from the engine configuration text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearReservoirParameters {
    /// Number of reservoirs in the cascade
    pub reservoirs: usize,
    /// Outflow coefficient
    /// unit: 1 / day
    pub k: f64,
    /// Engine step
    /// unit: day
    pub step: f64,
    /// Simulation start
    /// unit: Modified Julian Day
    pub start: Time,
    /// Simulation end
    /// unit: Modified Julian Day
    pub end: Time,
    /// Initial storage per reservoir
    /// unit: m³
    pub initial_storage: f64,
}

impl Default for LinearReservoirParameters {
    fn default() -> Self {
        Self {
            reservoirs: 1,
            k: 0.5,
            step: 1.0,
            start: 0.0,
            end: f64::INFINITY,
            initial_storage: 0.0,
        }
    }
}

impl LinearReservoirParameters {
    /// Parse parameters from flat TOML configuration text; absent keys keep
    /// their defaults.
    pub fn from_config(config: &str) -> OmiResult<Self> {
        let args = Arguments::from_toml(config)?;
        let defaults = Self::default();
        let reservoirs = match args.get_f64("reservoirs")? {
            Some(n) if n >= 1.0 => n as usize,
            Some(n) => {
                return Err(OmiError::Configuration(format!(
                    "reservoirs={n} must be at least 1"
                )))
            }
            None => defaults.reservoirs,
        };
        Ok(Self {
            reservoirs,
            k: args.get_f64("k")?.unwrap_or(defaults.k),
            step: args.get_f64("step")?.unwrap_or(defaults.step),
            start: args.get_f64("start")?.unwrap_or(defaults.start),
            end: args.get_f64("end")?.unwrap_or(defaults.end),
            initial_storage: args
                .get_f64("initial_storage")?
                .unwrap_or(defaults.initial_storage),
        })
    }
}

/// A linear reservoir cascade implementing the engine boundary contract.
pub struct LinearReservoirEngine {
    parameters: LinearReservoirParameters,
    storages: Vec<f64>,
    inflow: f64,
    time: Time,
    prepared: bool,
}

impl LinearReservoirEngine {
    pub fn new() -> Self {
        Self::from_parameters(LinearReservoirParameters::default())
    }

    pub fn from_parameters(parameters: LinearReservoirParameters) -> Self {
        let storages = vec![parameters.initial_storage; parameters.reservoirs];
        let time = parameters.start;
        Self {
            parameters,
            storages,
            inflow: 0.0,
            time,
            prepared: false,
        }
    }

    pub fn parameters(&self) -> &LinearReservoirParameters {
        &self.parameters
    }

    fn outflow(&self) -> f64 {
        self.parameters.k * self.storages.last().copied().unwrap_or(0.0)
    }
}

impl Default for LinearReservoirEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for LinearReservoirEngine {
    fn ping(&mut self) -> OmiResult<String> {
        Ok(format!(
            "linear reservoir cascade ({} reservoirs) at t={}",
            self.parameters.reservoirs, self.time
        ))
    }

    fn initialise(&mut self, config: &str) -> OmiResult<()> {
        let parameters = if config.trim().is_empty() {
            LinearReservoirParameters::default()
        } else {
            LinearReservoirParameters::from_config(config)?
        };
        *self = Self::from_parameters(parameters);
        debug!("initialised cascade: {:?}", self.parameters);
        Ok(())
    }

    fn prepare(&mut self) -> OmiResult<()> {
        if self.parameters.step <= 0.0 {
            return Err(OmiError::Configuration(format!(
                "step={} must be positive",
                self.parameters.step
            )));
        }
        self.prepared = true;
        Ok(())
    }

    fn update(&mut self) -> OmiResult<()> {
        if !self.prepared {
            return Err(OmiError::Engine(
                "update called before prepare".to_string(),
            ));
        }
        let dt = self.parameters.step;
        let k = self.parameters.k;
        let mut upstream = self.inflow;
        for storage in &mut self.storages {
            let drained = k * *storage;
            *storage += (upstream - drained) * dt;
            upstream = drained;
        }
        self.time += dt;
        Ok(())
    }

    fn finish(&mut self) -> OmiResult<()> {
        self.prepared = false;
        Ok(())
    }

    fn dispose(&mut self) -> OmiResult<()> {
        Ok(())
    }

    fn current_time(&mut self) -> OmiResult<Time> {
        Ok(self.time)
    }

    fn set_input(&mut self, item: &str, layout: &ElementLayout) -> OmiResult<()> {
        match item {
            ITEM_INFLOW => layout.validate(item, 1),
            _ => Err(OmiError::Engine(format!("unknown input item `{item}`"))),
        }
    }

    fn set_output(&mut self, item: &str, layout: &ElementLayout) -> OmiResult<()> {
        match item {
            ITEM_OUTFLOW => layout.validate(item, 1),
            ITEM_STORAGE => layout.validate(item, self.storages.len()),
            _ => Err(OmiError::Engine(format!("unknown output item `{item}`"))),
        }
    }

    fn set_doubles(&mut self, item: &str, _missing: f64, values: &[f64]) -> OmiResult<()> {
        match item {
            ITEM_INFLOW => {
                if values.len() != 1 {
                    return Err(OmiError::ShapeMismatch {
                        item: item.to_string(),
                        expected: 1,
                        actual: values.len(),
                    });
                }
                self.inflow = values[0];
                Ok(())
            }
            _ => Err(OmiError::Engine(format!("unknown input item `{item}`"))),
        }
    }

    fn get_doubles(&mut self, item: &str, _missing: f64) -> OmiResult<Vec<f64>> {
        match item {
            ITEM_OUTFLOW => Ok(vec![self.outflow()]),
            ITEM_STORAGE => Ok(self.storages.clone()),
            _ => Err(OmiError::Engine(format!("unknown output item `{item}`"))),
        }
    }
}
