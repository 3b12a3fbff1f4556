//! Builder validation, lifecycle guards and registry-based construction.

use crate::args::{Arguments, ARG_ENGINE};
use crate::component::{ComponentBuilder, ComponentStatus};
use crate::converter::ValueSetConverter;
use crate::engine::{Engine, EngineRegistry};
use crate::errors::OmiError;
use crate::example_engines::ScriptedEngine;
use crate::exchange::{Consumer, Output};
use crate::interpolate::InterpolationPolicy;
use crate::time::{TimeHorizon, TimeSet};
use crate::values::ElementLayout;

fn flow_output() -> Output {
    Output::new(ValueSetConverter::<f64>::new(
        "flow",
        ElementLayout::scalar(1),
        InterpolationPolicy::Linear,
        -999.0,
    ))
}

fn scripted() -> Box<dyn Engine> {
    Box::new(ScriptedEngine::with_horizon(0.0, 100.0, 10.0).with_output_fn("flow", |t| vec![t]))
}

#[test]
fn a_component_needs_an_engine() {
    let err = ComponentBuilder::new("empty").build().unwrap_err();
    assert!(matches!(err, OmiError::Configuration(_)));
}

#[test]
fn duplicate_item_names_are_rejected() {
    let err = ComponentBuilder::new("dup")
        .with_engine(scripted())
        .with_output(flow_output())
        .with_output(flow_output())
        .build()
        .unwrap_err();
    assert!(matches!(err, OmiError::Configuration(_)));
}

#[test]
fn consumers_must_reference_declared_ports() {
    let err = ComponentBuilder::new("dangling")
        .with_engine(scripted())
        .with_output(flow_output())
        .with_consumer("stage", Consumer::non_temporal("c").into_ref())
        .build()
        .unwrap_err();
    assert!(matches!(err, OmiError::Configuration(_)));
}

#[test]
fn lifecycle_calls_out_of_order_are_configuration_errors() {
    let mut component = ComponentBuilder::new("strict")
        .with_engine(scripted())
        .with_output(flow_output())
        .build()
        .unwrap();

    // Created: neither prepare nor update is valid yet.
    assert!(matches!(
        component.prepare(),
        Err(OmiError::Configuration(_))
    ));
    assert!(matches!(
        component.update(&["flow"]),
        Err(OmiError::Configuration(_))
    ));

    component.initialise().unwrap();
    assert_eq!(component.status(), ComponentStatus::Initialised);
    assert!(matches!(
        component.initialise(),
        Err(OmiError::Configuration(_))
    ));

    component.prepare().unwrap();
    assert_eq!(component.status(), ComponentStatus::Prepared);
}

#[test]
fn finish_discards_caches() {
    let consumer = Consumer::time_aware("gauge", TimeSet::at(20.0)).into_ref();
    let mut component = ComponentBuilder::new("catchment")
        .with_engine(scripted())
        .with_horizon(TimeHorizon::bounded(0.0, 100.0))
        .with_output(flow_output())
        .with_consumer("flow", consumer)
        .build()
        .unwrap();
    component.initialise().unwrap();
    component.prepare().unwrap();
    component.update(&["flow"]).unwrap();
    assert!(component.output("flow").unwrap().converter().cached_len() > 0);

    component.finish().unwrap();
    assert_eq!(component.status(), ComponentStatus::Finished);
    assert_eq!(component.output("flow").unwrap().converter().cached_len(), 0);
    assert!(matches!(
        component.update(&["flow"]),
        Err(OmiError::Configuration(_))
    ));
}

#[test]
fn engines_resolve_through_the_registry() {
    let mut registry = EngineRegistry::new();
    registry.register("scripted", |args| {
        let step = args.get_f64("step")?.unwrap_or(10.0);
        Ok(Box::new(
            ScriptedEngine::with_horizon(0.0, 100.0, step).with_output_fn("flow", |t| vec![t]),
        ) as Box<dyn Engine>)
    });

    let mut args = Arguments::new();
    args.set(ARG_ENGINE, "scripted").set("step", "5.0");

    let mut component = ComponentBuilder::from_registry("registered", &registry, args)
        .unwrap()
        .with_output(flow_output())
        .with_consumer(
            "flow",
            Consumer::time_aware("gauge", TimeSet::at(10.0)).into_ref(),
        )
        .build()
        .unwrap();
    component.initialise().unwrap();
    component.prepare().unwrap();
    component.update(&["flow"]).unwrap();

    // The registered step size drives the run.
    assert_eq!(component.extent().reached(), &[5.0, 10.0]);
}

#[test]
fn unknown_required_outputs_are_rejected() {
    let mut component = ComponentBuilder::new("catchment")
        .with_engine(scripted())
        .with_output(flow_output())
        .build()
        .unwrap();
    component.initialise().unwrap();
    component.prepare().unwrap();

    assert!(matches!(
        component.update(&["stage"]),
        Err(OmiError::Configuration(_))
    ));
}
