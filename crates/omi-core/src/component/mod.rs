//! The linkable component: a wrapped engine, its exchange items and the
//! update orchestrator that reconciles consumer time requests against engine
//! time advancement.

mod builder;
mod orchestrator;
#[cfg(test)]
mod tests;

pub use builder::ComponentBuilder;
pub use orchestrator::INPUT_QUERY_LOOKAHEAD_DAYS;

use crate::args::{Arguments, ARG_ENGINE_CONFIG};
use crate::engine::Engine;
use crate::errors::{wrap_call, OmiError, OmiResult};
use crate::exchange::{Input, LinkSet, Output};
use crate::persist::ComponentSnapshot;
use crate::time::{TimeExtent, TimeSet};
use crate::values::ValueSet;
use log::debug;

/// Lifecycle state of a component.
///
/// Lifecycle calls made out of order are configuration errors; a failed
/// update poisons the component and only a fresh prepare cycle can revive a
/// run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentStatus {
    Created,
    Initialised,
    Prepared,
    Updating,
    Done,
    Finished,
    Failed,
}

/// A simulation engine wrapped as a linkable component.
///
/// Built through [`ComponentBuilder`]. The component owns the engine, every
/// exchange item and the time extent; the update entry point takes
/// `&mut self`, so concurrent updates of one instance are ruled out by the
/// borrow checker rather than by caller discipline.
pub struct LinkableComponent {
    id: String,
    arguments: Arguments,
    engine: Box<dyn Engine>,
    inputs: Vec<Input>,
    outputs: Vec<Output>,
    links: LinkSet,
    extent: TimeExtent,
    status: ComponentStatus,
}

impl std::fmt::Debug for LinkableComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkableComponent")
            .field("id", &self.id)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl LinkableComponent {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> ComponentStatus {
        self.status
    }

    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    pub fn extent(&self) -> &TimeExtent {
        &self.extent
    }

    pub fn links(&self) -> &LinkSet {
        &self.links
    }

    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    pub fn input_mut(&mut self, item: &str) -> Option<&mut Input> {
        self.inputs.iter_mut().find(|i| i.item() == item)
    }

    pub fn output(&self, item: &str) -> Option<&Output> {
        self.outputs.iter().find(|o| o.item() == item)
    }

    /// Resolve an output's cached values at the requested times.
    pub fn output_values_at(&self, item: &str, when: &TimeSet) -> OmiResult<ValueSet> {
        let output = self
            .output(item)
            .ok_or_else(|| OmiError::Configuration(format!("unknown output `{item}`")))?;
        output.values_at(when)
    }

    /// Probe the wrapped engine.
    pub fn ping(&mut self) -> OmiResult<String> {
        wrap_call(self.engine.ping(), "ping")
    }

    /// Pass the configured engine configuration text to the engine.
    pub fn initialise(&mut self) -> OmiResult<()> {
        self.expect_status(&[ComponentStatus::Created], "initialise")?;
        let config = self
            .arguments
            .get(ARG_ENGINE_CONFIG)
            .unwrap_or_default()
            .to_string();
        wrap_call(self.engine.initialise(&config), "initialise")?;
        self.status = ComponentStatus::Initialised;
        Ok(())
    }

    /// Declare every exchange item's packing to the engine and prepare it.
    ///
    /// Caches start empty here; they fill as the engine steps.
    pub fn prepare(&mut self) -> OmiResult<()> {
        self.expect_status(&[ComponentStatus::Initialised], "prepare")?;
        for input in &self.inputs {
            input.converter().declare_input(self.engine.as_mut())?;
        }
        for output in &self.outputs {
            output.converter().declare_output(self.engine.as_mut())?;
        }
        wrap_call(self.engine.prepare(), "prepare")?;
        self.status = ComponentStatus::Prepared;
        debug!("{}: prepared with {} inputs, {} outputs", self.id, self.inputs.len(), self.outputs.len());
        Ok(())
    }

    /// Finish the engine and discard all cached values.
    pub fn finish(&mut self) -> OmiResult<()> {
        self.expect_status(
            &[
                ComponentStatus::Prepared,
                ComponentStatus::Updating,
                ComponentStatus::Done,
            ],
            "finish",
        )?;
        wrap_call(self.engine.finish(), "finish")?;
        self.discard_caches();
        self.status = ComponentStatus::Finished;
        Ok(())
    }

    /// Dispose of the engine. Valid in any state.
    pub fn dispose(&mut self) -> OmiResult<()> {
        wrap_call(self.engine.dispose(), "dispose")?;
        self.discard_caches();
        self.status = ComponentStatus::Finished;
        Ok(())
    }

    /// Capture everything needed to resume interpolation after a restore.
    pub fn snapshot(&self) -> ComponentSnapshot {
        ComponentSnapshot {
            extent: self.extent.clone(),
            inputs: self.inputs.iter().map(|i| i.converter().snapshot()).collect(),
            outputs: self
                .outputs
                .iter()
                .map(|o| o.converter().snapshot())
                .collect(),
        }
    }

    /// Restore cache contents and the time extent from a snapshot.
    ///
    /// Items are matched by name; a snapshot mentioning an unknown item is a
    /// configuration error.
    pub fn restore(&mut self, snapshot: &ComponentSnapshot) -> OmiResult<()> {
        for item in &snapshot.inputs {
            let input = self
                .inputs
                .iter_mut()
                .find(|i| i.item() == item.item)
                .ok_or_else(|| {
                    OmiError::Configuration(format!("snapshot names unknown input `{}`", item.item))
                })?;
            input.converter_mut().restore(item)?;
        }
        for item in &snapshot.outputs {
            let output = self
                .outputs
                .iter_mut()
                .find(|o| o.item() == item.item)
                .ok_or_else(|| {
                    OmiError::Configuration(format!(
                        "snapshot names unknown output `{}`",
                        item.item
                    ))
                })?;
            output.converter_mut().restore(item)?;
        }
        self.extent = snapshot.extent.clone();
        Ok(())
    }

    fn discard_caches(&mut self) {
        for input in &mut self.inputs {
            input.converter_mut().clear();
        }
        for output in &mut self.outputs {
            output.converter_mut().clear();
        }
    }

    pub(crate) fn expect_status(
        &self,
        allowed: &[ComponentStatus],
        operation: &str,
    ) -> OmiResult<()> {
        if allowed.contains(&self.status) {
            Ok(())
        } else {
            Err(OmiError::Configuration(format!(
                "`{operation}` is not valid while the component is {:?}",
                self.status
            )))
        }
    }
}
