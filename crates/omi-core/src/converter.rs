//! The value-set converter: bridges an exchange item's generic value sets
//! to and from the engine's flat buffers, and owns the item's cache and
//! interpolation policy.
//!
//! One converter serves one exchange item. Pushes into the engine accept
//! exactly one time record and require its time to match the time the engine
//! is being fed for, with exact equality. Pulls from the engine append to the
//! cache after checking the engine clock has not regressed. All buffer
//! lengths are validated against the item's [`ElementLayout`] in both
//! directions.

use crate::cache::{RecordCache, TimeRecord};
use crate::engine::Engine;
use crate::errors::{wrap_call, OmiError, OmiResult};
use crate::interpolate::InterpolationPolicy;
use crate::persist::ItemSnapshot;
use crate::time::{Time, TimeSet, TimeStamp};
use crate::values::{ElementLayout, EngineValue, ValueSet};
use log::debug;
use ndarray::Array1;

/// Converter for one exchange item holding values of type `T`.
#[derive(Debug, Clone)]
pub struct ValueSetConverter<T: EngineValue> {
    item: String,
    layout: ElementLayout,
    policy: InterpolationPolicy,
    missing: T,
    cache: RecordCache<T>,
}

impl<T: EngineValue> ValueSetConverter<T> {
    pub fn new(
        item: impl Into<String>,
        layout: ElementLayout,
        policy: InterpolationPolicy,
        missing: T,
    ) -> Self {
        Self {
            item: item.into(),
            layout,
            policy,
            missing,
            cache: RecordCache::new(),
        }
    }

    pub fn item(&self) -> &str {
        &self.item
    }

    pub fn layout(&self) -> &ElementLayout {
        &self.layout
    }

    pub fn policy(&self) -> InterpolationPolicy {
        self.policy
    }

    pub fn cache(&self) -> &RecordCache<T> {
        &self.cache
    }

    /// Push one record into the engine for the time it is being fed for.
    ///
    /// The engine does not accept multi-period pushes and the record's time
    /// must equal `expected` exactly; tolerance-based matching would hide
    /// misaligned pipelines.
    pub fn to_engine(
        &self,
        engine: &mut dyn Engine,
        expected: Time,
        set: &ValueSet,
    ) -> OmiResult<()> {
        if set.len() != 1 {
            return Err(OmiError::Configuration(format!(
                "input `{}`: the engine accepts exactly one time record per push, got {}",
                self.item,
                set.len()
            )));
        }
        let (stamp, values) = &set.records[0];
        if stamp.time != expected {
            return Err(OmiError::InputTimeMismatch {
                item: self.item.clone(),
                expected,
                record: stamp.time,
            });
        }

        let buffer = T::from_values(&self.item, values)?;
        self.layout.validate(&self.item, buffer.len())?;
        wrap_call(
            T::set_on_engine(engine, &self.item, &self.missing, &buffer),
            T::SET_OP,
        )
    }

    /// Pull the engine's current time and this item's buffer into the cache.
    ///
    /// An engine clock behind the cache tail is fatal; an equal clock
    /// replaces the tail record; a later clock appends.
    pub fn cache_engine_values(&mut self, engine: &mut dyn Engine) -> OmiResult<()> {
        let reported = wrap_call(engine.current_time(), "current_time")?;
        if let Some(last) = self.cache.latest() {
            let cached = last.time().time;
            if reported < cached {
                return Err(OmiError::EngineTimeRegression {
                    item: self.item.clone(),
                    cached,
                    reported,
                });
            }
        }

        let buffer = wrap_call(
            T::get_from_engine(engine, &self.item, &self.missing),
            T::GET_OP,
        )?;
        self.layout.validate(&self.item, buffer.len())?;
        self.cache.append(TimeRecord::new(
            TimeStamp::instant(reported),
            Array1::from_vec(buffer),
        ))?;
        debug!(
            "{}: cached engine values at t={reported} ({} records held)",
            self.item,
            self.cache.len()
        );
        Ok(())
    }

    /// Resolve one record per requested stamp from the cache.
    pub fn values_at(&self, when: &TimeSet) -> OmiResult<ValueSet> {
        let mut records = Vec::with_capacity(when.len());
        for stamp in when.stamps() {
            let record = T::resolve(&self.item, &self.cache, stamp.time, self.policy)?;
            records.push((record.time(), T::into_values(record.into_values())));
        }
        Ok(ValueSet::new(records))
    }

    /// Drop cached records no consumer needs any more.
    pub fn empty_caches(&mut self, upto: Time) {
        self.cache.trim(upto);
    }
}

/// Object-safe facade over [`ValueSetConverter`] so items of different value
/// kinds live side by side in one component.
pub trait AnyConverter: Send {
    fn item(&self) -> &str;

    fn layout(&self) -> &ElementLayout;

    /// Declare this item to the engine as an input.
    fn declare_input(&self, engine: &mut dyn Engine) -> OmiResult<()>;

    /// Declare this item to the engine as an output.
    fn declare_output(&self, engine: &mut dyn Engine) -> OmiResult<()>;

    fn to_engine(&mut self, engine: &mut dyn Engine, expected: Time, set: &ValueSet)
        -> OmiResult<()>;

    fn cache_engine_values(&mut self, engine: &mut dyn Engine) -> OmiResult<()>;

    fn values_at(&self, when: &TimeSet) -> OmiResult<ValueSet>;

    fn empty_caches(&mut self, upto: Time);

    /// Discard every cached record, used at component finish and dispose.
    fn clear(&mut self);

    fn cached_len(&self) -> usize;

    fn last_cached_time(&self) -> Option<Time>;

    fn snapshot(&self) -> ItemSnapshot;

    fn restore(&mut self, snapshot: &ItemSnapshot) -> OmiResult<()>;
}

impl<T: EngineValue> AnyConverter for ValueSetConverter<T> {
    fn item(&self) -> &str {
        &self.item
    }

    fn layout(&self) -> &ElementLayout {
        &self.layout
    }

    fn declare_input(&self, engine: &mut dyn Engine) -> OmiResult<()> {
        wrap_call(engine.set_input(&self.item, &self.layout), "set_input")
    }

    fn declare_output(&self, engine: &mut dyn Engine) -> OmiResult<()> {
        wrap_call(engine.set_output(&self.item, &self.layout), "set_output")
    }

    fn to_engine(
        &mut self,
        engine: &mut dyn Engine,
        expected: Time,
        set: &ValueSet,
    ) -> OmiResult<()> {
        ValueSetConverter::to_engine(self, engine, expected, set)
    }

    fn cache_engine_values(&mut self, engine: &mut dyn Engine) -> OmiResult<()> {
        ValueSetConverter::cache_engine_values(self, engine)
    }

    fn values_at(&self, when: &TimeSet) -> OmiResult<ValueSet> {
        ValueSetConverter::values_at(self, when)
    }

    fn empty_caches(&mut self, upto: Time) {
        ValueSetConverter::empty_caches(self, upto)
    }

    fn clear(&mut self) {
        self.cache.clear();
    }

    fn cached_len(&self) -> usize {
        self.cache.len()
    }

    fn last_cached_time(&self) -> Option<Time> {
        self.cache.latest().map(|r| r.time().time)
    }

    fn snapshot(&self) -> ItemSnapshot {
        ItemSnapshot {
            item: self.item.clone(),
            records: self
                .cache
                .records()
                .iter()
                .map(|r| (r.time(), T::into_values(r.values().clone())))
                .collect(),
        }
    }

    fn restore(&mut self, snapshot: &ItemSnapshot) -> OmiResult<()> {
        let mut cache = RecordCache::new();
        for (stamp, values) in &snapshot.records {
            let buffer = T::from_values(&self.item, values)?;
            self.layout.validate(&self.item, buffer.len())?;
            cache.append(TimeRecord::new(*stamp, buffer))?;
        }
        self.cache = cache;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::example_engines::ScriptedEngine;
    use crate::values::Values;
    use ndarray::array;

    fn converter() -> ValueSetConverter<f64> {
        ValueSetConverter::new(
            "flow",
            ElementLayout::scalar(2),
            InterpolationPolicy::Linear,
            -999.0,
        )
    }

    fn engine() -> ScriptedEngine {
        ScriptedEngine::with_horizon(0.0, 100.0, 10.0).with_output_fn("flow", |t| vec![t, t * 2.0])
    }

    fn push_set(time: Time, values: Vec<f64>) -> ValueSet {
        ValueSet::single(TimeStamp::instant(time), Values::Doubles(values.into()))
    }

    #[test]
    fn to_engine_requires_exact_time_match() {
        let conv = converter();
        let mut engine = engine();
        let err = conv
            .to_engine(&mut engine, 5.0, &push_set(5.000001, vec![1.0, 2.0]))
            .unwrap_err();
        assert!(matches!(err, OmiError::InputTimeMismatch { .. }));

        conv.to_engine(&mut engine, 5.0, &push_set(5.0, vec![1.0, 2.0]))
            .unwrap();
        assert_eq!(engine.pushed("flow"), Some(&vec![1.0, 2.0]));
    }

    #[test]
    fn to_engine_rejects_multi_period_pushes() {
        let conv = converter();
        let mut engine = engine();
        let set = ValueSet::new(vec![
            (TimeStamp::instant(1.0), Values::Doubles(array![1.0, 2.0])),
            (TimeStamp::instant(2.0), Values::Doubles(array![3.0, 4.0])),
        ]);
        assert!(matches!(
            conv.to_engine(&mut engine, 1.0, &set),
            Err(OmiError::Configuration(_))
        ));
    }

    #[test]
    fn to_engine_validates_shape() {
        let conv = converter();
        let mut engine = engine();
        let err = conv
            .to_engine(&mut engine, 5.0, &push_set(5.0, vec![1.0]))
            .unwrap_err();
        assert!(matches!(
            err,
            OmiError::ShapeMismatch {
                expected: 2,
                actual: 1,
                ..
            }
        ));
    }

    #[test]
    fn caching_appends_as_the_engine_advances() {
        let mut conv = converter();
        let mut engine = engine();

        conv.cache_engine_values(&mut engine).unwrap();
        engine.update().unwrap();
        conv.cache_engine_values(&mut engine).unwrap();

        assert_eq!(conv.cached_len(), 2);
        assert_eq!(conv.last_cached_time(), Some(10.0));
        assert_eq!(conv.cache().records()[1].values()[0], 10.0);
    }

    #[test]
    fn caching_replaces_on_equal_time() {
        let mut conv = converter();
        let mut engine = engine();
        conv.cache_engine_values(&mut engine).unwrap();
        conv.cache_engine_values(&mut engine).unwrap();
        assert_eq!(conv.cached_len(), 1);
    }

    #[test]
    fn caching_detects_engine_time_regression() {
        let mut conv = converter();
        let mut engine = engine();
        engine.update().unwrap();
        conv.cache_engine_values(&mut engine).unwrap();

        engine.rewind_to(0.0);
        let err = conv.cache_engine_values(&mut engine).unwrap_err();
        assert!(matches!(
            err,
            OmiError::EngineTimeRegression {
                cached,
                reported,
                ..
            } if cached == 10.0 && reported == 0.0
        ));
        assert_eq!(conv.cached_len(), 1);
    }

    #[test]
    fn values_at_batches_requests() {
        let mut conv = converter();
        let mut engine = engine();
        conv.cache_engine_values(&mut engine).unwrap();
        engine.update().unwrap();
        conv.cache_engine_values(&mut engine).unwrap();

        let set = conv
            .values_at(&TimeSet::new(vec![
                TimeStamp::instant(2.5),
                TimeStamp::instant(7.5),
            ]))
            .unwrap();
        assert_eq!(set.len(), 2);
        match &set.records[0].1 {
            Values::Doubles(v) => assert_eq!(v[0], 2.5),
            other => panic!("unexpected kind {}", other.kind()),
        }
    }

    #[test]
    fn snapshot_round_trips_through_restore() {
        let mut conv = converter();
        let mut engine = engine();
        conv.cache_engine_values(&mut engine).unwrap();
        engine.update().unwrap();
        conv.cache_engine_values(&mut engine).unwrap();

        let snapshot = AnyConverter::snapshot(&conv);

        let mut restored = converter();
        restored.restore(&snapshot).unwrap();
        assert_eq!(restored.cache(), conv.cache());
    }
}
