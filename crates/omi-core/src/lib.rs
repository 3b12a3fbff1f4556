//! Core traits and orchestration for wrapping time-stepped simulation
//! engines as linkable components.
//!
//! A [`component::LinkableComponent`] owns a wrapped [`engine::Engine`] and
//! a set of typed exchange items. Consumers request values at times of their
//! choosing; the update orchestrator decides how far the engine must advance
//! to satisfy them, harvests input values in parallel while it steps, and
//! the per-item caches with temporal interpolation decouple producer and
//! consumer timesteps.

pub mod args;
pub mod cache;
pub mod component;
pub mod converter;
pub mod engine;
pub mod exchange;
pub mod interpolate;
pub mod persist;
pub mod time;
pub mod values;

pub mod errors;

mod example_engines;

pub use args::{Argument, Arguments};
pub use cache::{RecordCache, TimeRecord};
pub use component::{ComponentBuilder, ComponentStatus, LinkableComponent};
pub use converter::{AnyConverter, ValueSetConverter};
pub use engine::{Engine, EngineRegistry};
pub use errors::{OmiError, OmiResult};
pub use exchange::{Consumer, ConsumerRef, Input, Output, Provider};
pub use interpolate::InterpolationPolicy;
pub use time::{Time, TimeExtent, TimeHorizon, TimeSet, TimeStamp};
pub use values::{ElementLayout, FloatValue, ValueSet, Values, ValuesPerElement};
