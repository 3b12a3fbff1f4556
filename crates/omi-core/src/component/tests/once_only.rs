//! The update-once-only triggers: non-temporal consumers, zero time-aware
//! consumers, and unbounded end requests each force exactly one engine step.

use crate::component::ComponentBuilder;
use crate::converter::ValueSetConverter;
use crate::example_engines::ScriptedEngine;
use crate::exchange::{Consumer, Output};
use crate::interpolate::InterpolationPolicy;
use crate::time::{TimeHorizon, TimeSet};
use crate::values::ElementLayout;

fn component_with_consumers(
    consumers: Vec<crate::exchange::ConsumerRef>,
) -> crate::component::LinkableComponent {
    let engine =
        ScriptedEngine::with_horizon(0.0, 100.0, 10.0).with_output_fn("flow", |t| vec![t]);
    let mut builder = ComponentBuilder::new("catchment");
    builder
        .with_engine(Box::new(engine))
        .with_horizon(TimeHorizon::bounded(0.0, 100.0))
        .with_output(Output::new(ValueSetConverter::<f64>::new(
            "flow",
            ElementLayout::scalar(1),
            InterpolationPolicy::Linear,
            -999.0,
        )));
    for consumer in consumers {
        builder.with_consumer("flow", consumer);
    }
    let mut component = builder.build().unwrap();
    component.initialise().unwrap();
    component.prepare().unwrap();
    component
}

#[test]
fn non_temporal_consumer_forces_a_single_step() {
    // The time-aware consumer alone would demand five steps; the
    // non-temporal one overrides that.
    let mut component = component_with_consumers(vec![
        Consumer::time_aware("gauge", TimeSet::at(50.0)).into_ref(),
        Consumer::non_temporal("plotter").into_ref(),
    ]);
    component.update(&["flow"]).unwrap();
    assert_eq!(component.extent().reached(), &[10.0]);
}

#[test]
fn zero_consumers_force_a_single_step() {
    let mut component = component_with_consumers(vec![]);
    component.update(&["flow"]).unwrap();
    assert_eq!(component.extent().reached(), &[10.0]);
}

#[test]
fn unbounded_end_request_forces_a_single_step() {
    let mut component =
        component_with_consumers(vec![
            Consumer::time_aware("gauge", TimeSet::at(f64::INFINITY)).into_ref()
        ]);
    component.update(&["flow"]).unwrap();
    assert_eq!(component.extent().reached(), &[10.0]);
}

#[test]
fn bounded_time_aware_consumers_step_iteratively() {
    let mut component =
        component_with_consumers(vec![Consumer::time_aware("gauge", TimeSet::at(30.0)).into_ref()]);
    component.update(&["flow"]).unwrap();
    assert_eq!(component.extent().reached(), &[10.0, 20.0, 30.0]);
}
