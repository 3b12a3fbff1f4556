//! Builder for assembling a linkable component from an engine, arguments and
//! exchange items.

use super::{ComponentStatus, LinkableComponent};
use crate::args::{Arguments, ARG_ENGINE};
use crate::engine::{Engine, EngineRegistry};
use crate::errors::{OmiError, OmiResult};
use crate::exchange::{ConsumerRef, Input, LinkSet, Output};
use crate::time::{TimeExtent, TimeHorizon};

enum LinkDecl {
    Adapted { parent: String, id: String },
    Consumer { port: String, consumer: ConsumerRef },
}

/// Build a new component from an engine and its exchange items.
///
/// Validation happens at [`build()`](Self::build): an engine must be
/// present, item names must be unique, and links must reference ports
/// declared before them (parents before their adapted outputs).
pub struct ComponentBuilder {
    id: String,
    engine: Option<Box<dyn Engine>>,
    arguments: Arguments,
    horizon: TimeHorizon,
    inputs: Vec<Input>,
    outputs: Vec<Output>,
    links: Vec<LinkDecl>,
}

impl ComponentBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            engine: None,
            arguments: Arguments::new(),
            horizon: TimeHorizon::unbounded(),
            inputs: vec![],
            outputs: vec![],
            links: vec![],
        }
    }

    /// Start a builder whose engine is resolved through the registry from
    /// the `engine` argument.
    pub fn from_registry(
        id: impl Into<String>,
        registry: &EngineRegistry,
        arguments: Arguments,
    ) -> OmiResult<Self> {
        let engine_id = arguments.require(ARG_ENGINE)?.to_string();
        let engine = registry.create(&engine_id, &arguments)?;
        let mut builder = Self::new(id);
        builder.arguments = arguments;
        builder.engine = Some(engine);
        Ok(builder)
    }

    pub fn with_engine(&mut self, engine: Box<dyn Engine>) -> &mut Self {
        self.engine = Some(engine);
        self
    }

    pub fn with_argument(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> &mut Self {
        self.arguments.set(key, value);
        self
    }

    pub fn with_arguments(&mut self, arguments: Arguments) -> &mut Self {
        for argument in arguments.iter() {
            self.arguments.push(argument.clone());
        }
        self
    }

    pub fn with_horizon(&mut self, horizon: TimeHorizon) -> &mut Self {
        self.horizon = horizon;
        self
    }

    pub fn with_input(&mut self, input: Input) -> &mut Self {
        self.inputs.push(input);
        self
    }

    pub fn with_output(&mut self, output: Output) -> &mut Self {
        self.outputs.push(output);
        self
    }

    /// Chain an adapted output below `parent` (a raw output or an earlier
    /// adapted output).
    pub fn with_adapted_output(
        &mut self,
        parent: impl Into<String>,
        id: impl Into<String>,
    ) -> &mut Self {
        self.links.push(LinkDecl::Adapted {
            parent: parent.into(),
            id: id.into(),
        });
        self
    }

    /// Register a consumer against an output or adapted output.
    pub fn with_consumer(&mut self, port: impl Into<String>, consumer: ConsumerRef) -> &mut Self {
        self.links.push(LinkDecl::Consumer {
            port: port.into(),
            consumer,
        });
        self
    }

    pub fn build(&mut self) -> OmiResult<LinkableComponent> {
        let engine = self.engine.take().ok_or_else(|| {
            OmiError::Configuration(format!("component `{}` has no engine", self.id))
        })?;

        let inputs = std::mem::take(&mut self.inputs);
        let outputs = std::mem::take(&mut self.outputs);

        let mut names: Vec<&str> = inputs
            .iter()
            .map(|i| i.item())
            .chain(outputs.iter().map(|o| o.item()))
            .collect();
        names.sort_unstable();
        if let Some(dup) = names.windows(2).find(|w| w[0] == w[1]) {
            return Err(OmiError::Configuration(format!(
                "duplicate exchange item `{}`",
                dup[0]
            )));
        }

        let mut links = LinkSet::new();
        for output in &outputs {
            links.add_output(output.item())?;
        }
        for decl in self.links.drain(..) {
            match decl {
                LinkDecl::Adapted { parent, id } => links.add_adapted(&parent, id)?,
                LinkDecl::Consumer { port, consumer } => links.add_consumer(&port, consumer)?,
            }
        }

        Ok(LinkableComponent {
            id: std::mem::take(&mut self.id),
            arguments: std::mem::take(&mut self.arguments),
            engine,
            inputs,
            outputs,
            links,
            extent: TimeExtent::new(self.horizon),
            status: ComponentStatus::Created,
        })
    }
}
