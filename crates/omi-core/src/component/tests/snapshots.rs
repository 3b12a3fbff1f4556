//! Snapshot round-trips: cache contents and the time extent must be fully
//! recoverable after a restore.

use crate::component::{ComponentBuilder, LinkableComponent};
use crate::converter::ValueSetConverter;
use crate::errors::OmiError;
use crate::example_engines::ScriptedEngine;
use crate::exchange::{Consumer, Output};
use crate::interpolate::InterpolationPolicy;
use crate::persist::{ComponentSnapshot, ItemSnapshot};
use crate::time::{TimeHorizon, TimeSet};
use crate::values::{ElementLayout, Values};

fn build_component() -> LinkableComponent {
    let engine =
        ScriptedEngine::with_horizon(0.0, 100.0, 10.0).with_output_fn("flow", |t| vec![t, t / 2.0]);
    ComponentBuilder::new("catchment")
        .with_engine(Box::new(engine))
        .with_horizon(TimeHorizon::bounded(0.0, 100.0))
        .with_output(Output::new(ValueSetConverter::<f64>::new(
            "flow",
            ElementLayout::scalar(2),
            InterpolationPolicy::Linear,
            -999.0,
        )))
        .with_consumer(
            "flow",
            Consumer::time_aware("gauge", TimeSet::at(50.0)).into_ref(),
        )
        .build()
        .unwrap()
}

#[test]
fn snapshot_round_trips_through_json() {
    let mut component = build_component();
    component.initialise().unwrap();
    component.prepare().unwrap();
    component.update(&["flow"]).unwrap();

    let snapshot = component.snapshot();
    let json = serde_json::to_string(&snapshot).unwrap();
    let recovered: ComponentSnapshot = serde_json::from_str(&json).unwrap();

    let mut restored = build_component();
    restored.restore(&recovered).unwrap();

    assert_eq!(restored.extent(), component.extent());
    let original = component
        .output_values_at("flow", &TimeSet::at(35.0))
        .unwrap();
    let recovered = restored
        .output_values_at("flow", &TimeSet::at(35.0))
        .unwrap();
    assert_eq!(original, recovered);
}

#[test]
fn restore_rejects_unknown_items() {
    let mut component = build_component();
    let snapshot = ComponentSnapshot {
        extent: component.extent().clone(),
        inputs: vec![],
        outputs: vec![ItemSnapshot {
            item: "stage".to_string(),
            records: vec![],
        }],
    };
    assert!(matches!(
        component.restore(&snapshot),
        Err(OmiError::Configuration(_))
    ));
}

#[test]
fn restore_validates_record_shapes() {
    let mut component = build_component();
    let snapshot = ComponentSnapshot {
        extent: component.extent().clone(),
        inputs: vec![],
        outputs: vec![ItemSnapshot {
            item: "flow".to_string(),
            records: vec![(
                crate::time::TimeStamp::instant(0.0),
                Values::Doubles(vec![1.0].into()),
            )],
        }],
    };
    assert!(matches!(
        component.restore(&snapshot),
        Err(OmiError::ShapeMismatch { .. })
    ));
}
