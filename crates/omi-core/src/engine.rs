//! The boundary contract every wrapped simulation engine implements, and the
//! registry that resolves configuration-supplied engine identifiers to
//! constructors.
//!
//! The orchestrator drives engines exclusively through [`Engine`]; whether a
//! binding is in-process, a native library wrapper or a remoting proxy is
//! invisible here. Remote bindings surface channel faults as
//! [`OmiError::Engine`] values and the orchestrator treats them identically
//! to in-process failures.

use crate::args::Arguments;
use crate::errors::{OmiError, OmiResult};
use crate::time::Time;
use crate::values::ElementLayout;
use std::collections::HashMap;

/// The minimal interface the orchestrator needs from a wrapped engine.
///
/// Lifecycle calls (`initialise` through `dispose`) are made in order by the
/// owning component. Shape declarations (`set_input`/`set_output`) happen
/// before any data flows. The typed data-plane methods default to failing
/// fast with [`OmiError::NotOverridden`]; a binding overrides exactly the
/// kinds it supports.
pub trait Engine: Send {
    /// Liveness probe returning a short status text.
    fn ping(&mut self) -> OmiResult<String>;

    fn initialise(&mut self, config: &str) -> OmiResult<()>;

    fn prepare(&mut self) -> OmiResult<()>;

    /// Advance the engine by a single step.
    fn update(&mut self) -> OmiResult<()>;

    fn finish(&mut self) -> OmiResult<()>;

    fn dispose(&mut self) -> OmiResult<()>;

    /// Current engine time, for time-aware engines only.
    fn current_time(&mut self) -> OmiResult<Time> {
        Err(OmiError::NotOverridden("current_time"))
    }

    /// Declare an input item's packing before any data flows.
    fn set_input(&mut self, item: &str, layout: &ElementLayout) -> OmiResult<()>;

    /// Declare an output item's packing before any data flows.
    fn set_output(&mut self, item: &str, layout: &ElementLayout) -> OmiResult<()>;

    fn set_doubles(&mut self, item: &str, missing: f64, values: &[f64]) -> OmiResult<()> {
        let _ = (item, missing, values);
        Err(OmiError::NotOverridden("set_doubles"))
    }

    fn get_doubles(&mut self, item: &str, missing: f64) -> OmiResult<Vec<f64>> {
        let _ = (item, missing);
        Err(OmiError::NotOverridden("get_doubles"))
    }

    fn set_int32s(&mut self, item: &str, missing: i32, values: &[i32]) -> OmiResult<()> {
        let _ = (item, missing, values);
        Err(OmiError::NotOverridden("set_int32s"))
    }

    fn get_int32s(&mut self, item: &str, missing: i32) -> OmiResult<Vec<i32>> {
        let _ = (item, missing);
        Err(OmiError::NotOverridden("get_int32s"))
    }

    fn set_booleans(&mut self, item: &str, missing: bool, values: &[bool]) -> OmiResult<()> {
        let _ = (item, missing, values);
        Err(OmiError::NotOverridden("set_booleans"))
    }

    fn get_booleans(&mut self, item: &str, missing: bool) -> OmiResult<Vec<bool>> {
        let _ = (item, missing);
        Err(OmiError::NotOverridden("get_booleans"))
    }

    fn set_strings(&mut self, item: &str, missing: &str, values: &[String]) -> OmiResult<()> {
        let _ = (item, missing, values);
        Err(OmiError::NotOverridden("set_strings"))
    }

    fn get_strings(&mut self, item: &str, missing: &str) -> OmiResult<Vec<String>> {
        let _ = (item, missing);
        Err(OmiError::NotOverridden("get_strings"))
    }
}

impl std::fmt::Debug for dyn Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn Engine")
    }
}

/// Constructor closure an engine binding registers under its identifier.
pub type EngineCtor = Box<dyn Fn(&Arguments) -> OmiResult<Box<dyn Engine>> + Send + Sync>;

/// A mapping from configuration-supplied engine identifiers to constructors,
/// resolved once when a component prepares.
///
/// Unknown identifiers are configuration errors; there is no dynamic type
/// lookup. Bindings register themselves at startup.
#[derive(Default)]
pub struct EngineRegistry {
    factories: HashMap<String, EngineCtor>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a constructor under `id`, replacing any previous entry.
    pub fn register<F>(&mut self, id: impl Into<String>, ctor: F)
    where
        F: Fn(&Arguments) -> OmiResult<Box<dyn Engine>> + Send + Sync + 'static,
    {
        self.factories.insert(id.into(), Box::new(ctor));
    }

    /// Construct the engine registered under `id`.
    pub fn create(&self, id: &str, args: &Arguments) -> OmiResult<Box<dyn Engine>> {
        let ctor = self.factories.get(id).ok_or_else(|| {
            OmiError::Configuration(format!(
                "no engine registered under `{id}` (known: {})",
                self.ids().join(", ")
            ))
        })?;
        ctor(args)
    }

    /// Registered identifiers, sorted for stable diagnostics.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.factories.keys().cloned().collect();
        ids.sort();
        ids
    }
}
