//! Exchange items: the typed data ports of a component, and the link
//! topology connecting outputs to their consumers.
//!
//! An [`Input`] harvests values from a linked [`Provider`] and pushes them
//! into the engine; an [`Output`] caches engine values and serves them to
//! consumers through interpolation. Outputs reach their consumers either
//! directly or through a chain of adapted outputs (unit or geometry adapters
//! wrapped around the raw output); the [`LinkSet`] records that many-to-many
//! topology and walks it when the orchestrator gathers the consumers of a
//! required output.

use crate::converter::{AnyConverter, ValueSetConverter};
use crate::engine::Engine;
use crate::errors::{OmiError, OmiResult};
use crate::time::{Time, TimeSet};
use crate::values::{EngineValue, ValueSet};
use petgraph::graph::NodeIndex;
use petgraph::visit::Bfs;
use petgraph::Graph;
use std::sync::{Arc, Mutex};

/// The source an input pulls values from while the engine steps.
pub trait Provider: Send {
    /// Resolve this provider's values at the requested times.
    fn values_at(&mut self, request: &TimeSet) -> OmiResult<ValueSet>;
}

/// A consumer registered against an output or adapted output.
///
/// A consumer with a `request` is time-aware; `None` marks a non-temporal
/// consumer, which forces the orchestrator into update-once-only mode.
#[derive(Debug, Clone)]
pub struct Consumer {
    pub id: String,
    pub request: Option<TimeSet>,
}

impl Consumer {
    pub fn time_aware(id: impl Into<String>, request: TimeSet) -> Self {
        Self {
            id: id.into(),
            request: Some(request),
        }
    }

    pub fn non_temporal(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            request: None,
        }
    }

    pub fn into_ref(self) -> ConsumerRef {
        Arc::new(Mutex::new(self))
    }
}

/// Shared handle to a consumer; the consumer side updates its requested
/// times between update cycles.
pub type ConsumerRef = Arc<Mutex<Consumer>>;

/// An input exchange item.
///
/// The `pending` slot is this input's private landing zone during the
/// parallel harvest phase; each input owns its slot, so concurrent harvests
/// never share state.
pub struct Input {
    converter: Box<dyn AnyConverter>,
    provider: Option<Box<dyn Provider>>,
    pending: Option<ValueSet>,
    active: bool,
}

impl Input {
    pub fn new<T: EngineValue>(converter: ValueSetConverter<T>) -> Self {
        Self::from_boxed(Box::new(converter))
    }

    pub fn from_boxed(converter: Box<dyn AnyConverter>) -> Self {
        Self {
            converter,
            provider: None,
            pending: None,
            active: true,
        }
    }

    pub fn with_provider(mut self, provider: Box<dyn Provider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn set_provider(&mut self, provider: Box<dyn Provider>) {
        self.provider = Some(provider);
    }

    pub fn item(&self) -> &str {
        self.converter.item()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn converter(&self) -> &dyn AnyConverter {
        self.converter.as_ref()
    }

    pub fn converter_mut(&mut self) -> &mut dyn AnyConverter {
        self.converter.as_mut()
    }

    /// Pull this input's values for time `at` into the pending slot.
    ///
    /// Inactive or unlinked inputs are a no-op.
    pub fn harvest(&mut self, at: Time) -> OmiResult<()> {
        if !self.active {
            return Ok(());
        }
        if let Some(provider) = self.provider.as_mut() {
            self.pending = Some(provider.values_at(&TimeSet::at(at))?);
        }
        Ok(())
    }

    /// Push the harvested values into the engine, draining the pending slot.
    pub fn push_pending(&mut self, engine: &mut dyn Engine, expected: Time) -> OmiResult<()> {
        match self.pending.take() {
            Some(set) => self.converter.to_engine(engine, expected, &set),
            None => Ok(()),
        }
    }

    #[cfg(test)]
    pub(crate) fn pending(&self) -> Option<&ValueSet> {
        self.pending.as_ref()
    }
}

/// An output exchange item.
pub struct Output {
    converter: Box<dyn AnyConverter>,
    active: bool,
}

impl Output {
    pub fn new<T: EngineValue>(converter: ValueSetConverter<T>) -> Self {
        Self::from_boxed(Box::new(converter))
    }

    pub fn from_boxed(converter: Box<dyn AnyConverter>) -> Self {
        Self {
            converter,
            active: true,
        }
    }

    pub fn item(&self) -> &str {
        self.converter.item()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn converter(&self) -> &dyn AnyConverter {
        self.converter.as_ref()
    }

    pub fn converter_mut(&mut self) -> &mut dyn AnyConverter {
        self.converter.as_mut()
    }

    /// Resolve this output's cached values at the requested times.
    pub fn values_at(&self, when: &TimeSet) -> OmiResult<ValueSet> {
        self.converter.values_at(when)
    }
}

#[derive(Debug)]
enum LinkNode {
    /// An output or adapted output, by item id.
    Port(String),
    Consumer(ConsumerRef),
}

/// The output → adapted-output → consumer topology of one component.
///
/// Ports form a DAG rooted at raw outputs; consumers hang off any port.
/// Collecting the consumers of an output walks everything reachable from it.
#[derive(Debug, Default)]
pub struct LinkSet {
    node_indexes: Vec<NodeIndex>,
    graph: Graph<LinkNode, ()>,
}

impl LinkSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn port_index(&self, id: &str) -> Option<NodeIndex> {
        self.node_indexes
            .iter()
            .find(|x| matches!(&self.graph[**x], LinkNode::Port(name) if name == id))
            .copied()
    }

    pub fn has_port(&self, id: &str) -> bool {
        self.port_index(id).is_some()
    }

    /// Register a raw output port.
    pub fn add_output(&mut self, id: impl Into<String>) -> OmiResult<()> {
        let id = id.into();
        if self.has_port(&id) {
            return Err(OmiError::Configuration(format!(
                "output `{id}` is already linked"
            )));
        }
        let index = self.graph.add_node(LinkNode::Port(id));
        self.node_indexes.push(index);
        Ok(())
    }

    /// Register an adapted output chained below `parent` (a raw output or
    /// another adapted output).
    pub fn add_adapted(&mut self, parent: &str, id: impl Into<String>) -> OmiResult<()> {
        let id = id.into();
        if self.has_port(&id) {
            return Err(OmiError::Configuration(format!(
                "adapted output `{id}` is already linked"
            )));
        }
        let parent_index = self.port_index(parent).ok_or_else(|| {
            OmiError::Configuration(format!("unknown parent port `{parent}` for `{id}`"))
        })?;
        let index = self.graph.add_node(LinkNode::Port(id));
        self.node_indexes.push(index);
        self.graph.add_edge(parent_index, index, ());
        Ok(())
    }

    /// Register a consumer against a port.
    pub fn add_consumer(&mut self, port: &str, consumer: ConsumerRef) -> OmiResult<()> {
        let port_index = self
            .port_index(port)
            .ok_or_else(|| OmiError::Configuration(format!("unknown port `{port}`")))?;
        let index = self.graph.add_node(LinkNode::Consumer(consumer));
        self.graph.add_edge(port_index, index, ());
        Ok(())
    }

    /// All consumers reachable from `output`, including those hanging off
    /// its chained adapted outputs.
    pub fn collect_consumers(&self, output: &str) -> Vec<ConsumerRef> {
        let Some(start) = self.port_index(output) else {
            return Vec::new();
        };
        let mut consumers = Vec::new();
        let mut bfs = Bfs::new(&self.graph, start);
        while let Some(node) = bfs.next(&self.graph) {
            if let LinkNode::Consumer(consumer) = &self.graph[node] {
                consumers.push(Arc::clone(consumer));
            }
        }
        consumers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::example_engines::RecordedProvider;
    use crate::interpolate::InterpolationPolicy;
    use crate::values::ElementLayout;

    fn input() -> Input {
        Input::new(ValueSetConverter::<f64>::new(
            "inflow",
            ElementLayout::scalar(1),
            InterpolationPolicy::Linear,
            -999.0,
        ))
    }

    #[test]
    fn harvest_pulls_at_the_requested_time() {
        let (provider, seen) = RecordedProvider::new(3.5);
        let mut input = input().with_provider(Box::new(provider));

        input.harvest(42.0).unwrap();
        assert!(input.pending().is_some());
        assert_eq!(*seen.lock().unwrap(), vec![42.0]);
    }

    #[test]
    fn inactive_inputs_do_not_harvest() {
        let (provider, seen) = RecordedProvider::new(3.5);
        let mut input = input().with_provider(Box::new(provider));
        input.set_active(false);

        input.harvest(42.0).unwrap();
        assert!(input.pending().is_none());
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn consumers_are_collected_across_adapted_chains() {
        let mut links = LinkSet::new();
        links.add_output("flow").unwrap();
        links.add_adapted("flow", "flow_m3s").unwrap();
        links.add_adapted("flow_m3s", "flow_regridded").unwrap();

        links
            .add_consumer("flow", Consumer::non_temporal("direct").into_ref())
            .unwrap();
        links
            .add_consumer(
                "flow_regridded",
                Consumer::time_aware("nested", TimeSet::at(7.0)).into_ref(),
            )
            .unwrap();

        let consumers = links.collect_consumers("flow");
        let mut ids: Vec<String> = consumers
            .iter()
            .map(|c| c.lock().unwrap().id.clone())
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["direct", "nested"]);

        // The adapted output's consumers are invisible from a sibling chain.
        assert!(links.collect_consumers("flow_m3s").len() == 1);
    }

    #[test]
    fn duplicate_ports_are_rejected() {
        let mut links = LinkSet::new();
        links.add_output("flow").unwrap();
        assert!(matches!(
            links.add_output("flow"),
            Err(OmiError::Configuration(_))
        ));
    }

    #[test]
    fn consumers_need_a_known_port() {
        let mut links = LinkSet::new();
        assert!(matches!(
            links.add_consumer("flow", Consumer::non_temporal("c").into_ref()),
            Err(OmiError::Configuration(_))
        ));
    }
}
