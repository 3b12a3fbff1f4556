//! Value buffers, packing metadata and the closed set of engine value kinds.
//!
//! Engines exchange flat buffers of exactly four kinds: doubles, 32-bit
//! integers, booleans and strings. [`Values`] is the tagged outward
//! representation, [`ElementLayout`] the packing metadata every buffer is
//! validated against, and [`EngineValue`] the trait tying a Rust scalar type
//! to its engine data-plane calls and interpolation behaviour.

use crate::cache::{RecordCache, TimeRecord};
use crate::engine::Engine;
use crate::errors::{OmiError, OmiResult};
use crate::interpolate::{interpolate, resolve_discrete, InterpolationPolicy};
use crate::time::{Time, TimeStamp};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Canonical floating point value type.
pub type FloatValue = f64;

/// Values per spatial element: either one constant count for every element or
/// an explicit per-element count array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValuesPerElement {
    Constant(usize),
    PerElement(Vec<usize>),
}

/// Packing metadata describing how an exchange item's values map onto the
/// engine's flat buffer.
///
/// Validated against actual buffer lengths on every engine get and set;
/// a mismatch is fatal, not recoverable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementLayout {
    pub element_count: usize,
    pub values_per_element: ValuesPerElement,
    pub vector_length: usize,
}

impl ElementLayout {
    /// One scalar value per element.
    pub fn scalar(element_count: usize) -> Self {
        Self {
            element_count,
            values_per_element: ValuesPerElement::Constant(1),
            vector_length: 1,
        }
    }

    pub fn new(
        element_count: usize,
        values_per_element: ValuesPerElement,
        vector_length: usize,
    ) -> Self {
        Self {
            element_count,
            values_per_element,
            vector_length,
        }
    }

    /// Total number of scalar values a conforming buffer holds.
    pub fn total_len(&self) -> usize {
        let per_element = match &self.values_per_element {
            ValuesPerElement::Constant(n) => n * self.element_count,
            ValuesPerElement::PerElement(counts) => counts.iter().sum(),
        };
        per_element * self.vector_length
    }

    /// Check a buffer length against this layout.
    pub fn validate(&self, item: &str, actual: usize) -> OmiResult<()> {
        let expected = self.total_len();
        if actual != expected {
            return Err(OmiError::ShapeMismatch {
                item: item.to_string(),
                expected,
                actual,
            });
        }
        Ok(())
    }
}

/// A flat buffer of one of the four supported engine value kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Values {
    Doubles(Array1<f64>),
    Int32s(Array1<i32>),
    Booleans(Array1<bool>),
    Strings(Array1<String>),
}

impl Values {
    pub fn len(&self) -> usize {
        match self {
            Values::Doubles(v) => v.len(),
            Values::Int32s(v) => v.len(),
            Values::Booleans(v) => v.len(),
            Values::Strings(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Values::Doubles(_) => "doubles",
            Values::Int32s(_) => "int32s",
            Values::Booleans(_) => "booleans",
            Values::Strings(_) => "strings",
        }
    }
}

/// A batch of timestamped value buffers, the generic outward value-set
/// representation converters bridge to the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValueSet {
    pub records: Vec<(TimeStamp, Values)>,
}

impl ValueSet {
    pub fn new(records: Vec<(TimeStamp, Values)>) -> Self {
        Self { records }
    }

    pub fn single(time: TimeStamp, values: Values) -> Self {
        Self {
            records: vec![(time, values)],
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// A scalar type the engine data plane supports.
///
/// Each implementation routes to its `set_*`/`get_*` engine call family and
/// states how interpolation behaves: only `f64` carries numeric
/// interpolation, every other kind resolves all policies to the record at or
/// above the query time.
pub trait EngineValue: Clone + Send + Sync + Sized + 'static {
    /// Value-kind label used in diagnostics and mismatch errors.
    const KIND: &'static str;
    /// Engine call name of the setter, for failure wrapping.
    const SET_OP: &'static str;
    /// Engine call name of the getter, for failure wrapping.
    const GET_OP: &'static str;

    /// Resolve a record from the cache at `at` under `policy`.
    fn resolve(
        item: &str,
        cache: &RecordCache<Self>,
        at: Time,
        policy: InterpolationPolicy,
    ) -> OmiResult<TimeRecord<Self>>;

    /// Pull this item's current buffer from the engine.
    fn get_from_engine(
        engine: &mut dyn Engine,
        item: &str,
        missing: &Self,
    ) -> OmiResult<Vec<Self>>;

    /// Push a buffer for this item into the engine.
    fn set_on_engine(
        engine: &mut dyn Engine,
        item: &str,
        missing: &Self,
        values: &Array1<Self>,
    ) -> OmiResult<()>;

    /// Wrap a typed buffer into the tagged [`Values`] representation.
    fn into_values(values: Array1<Self>) -> Values;

    /// Extract a typed buffer, failing on a kind mismatch.
    fn from_values(item: &str, values: &Values) -> OmiResult<Array1<Self>>;
}

impl EngineValue for f64 {
    const KIND: &'static str = "doubles";
    const SET_OP: &'static str = "set_doubles";
    const GET_OP: &'static str = "get_doubles";

    fn resolve(
        item: &str,
        cache: &RecordCache<Self>,
        at: Time,
        policy: InterpolationPolicy,
    ) -> OmiResult<TimeRecord<Self>> {
        interpolate(item, cache, at, policy)
    }

    fn get_from_engine(
        engine: &mut dyn Engine,
        item: &str,
        missing: &Self,
    ) -> OmiResult<Vec<Self>> {
        engine.get_doubles(item, *missing)
    }

    fn set_on_engine(
        engine: &mut dyn Engine,
        item: &str,
        missing: &Self,
        values: &Array1<Self>,
    ) -> OmiResult<()> {
        engine.set_doubles(item, *missing, &values.to_vec())
    }

    fn into_values(values: Array1<Self>) -> Values {
        Values::Doubles(values)
    }

    fn from_values(item: &str, values: &Values) -> OmiResult<Array1<Self>> {
        match values {
            Values::Doubles(v) => Ok(v.clone()),
            other => Err(OmiError::ValueTypeMismatch {
                item: item.to_string(),
                expected: Self::KIND,
                actual: other.kind(),
            }),
        }
    }
}

impl EngineValue for i32 {
    const KIND: &'static str = "int32s";
    const SET_OP: &'static str = "set_int32s";
    const GET_OP: &'static str = "get_int32s";

    fn resolve(
        item: &str,
        cache: &RecordCache<Self>,
        at: Time,
        policy: InterpolationPolicy,
    ) -> OmiResult<TimeRecord<Self>> {
        resolve_discrete(item, cache, at, policy)
    }

    fn get_from_engine(
        engine: &mut dyn Engine,
        item: &str,
        missing: &Self,
    ) -> OmiResult<Vec<Self>> {
        engine.get_int32s(item, *missing)
    }

    fn set_on_engine(
        engine: &mut dyn Engine,
        item: &str,
        missing: &Self,
        values: &Array1<Self>,
    ) -> OmiResult<()> {
        engine.set_int32s(item, *missing, &values.to_vec())
    }

    fn into_values(values: Array1<Self>) -> Values {
        Values::Int32s(values)
    }

    fn from_values(item: &str, values: &Values) -> OmiResult<Array1<Self>> {
        match values {
            Values::Int32s(v) => Ok(v.clone()),
            other => Err(OmiError::ValueTypeMismatch {
                item: item.to_string(),
                expected: Self::KIND,
                actual: other.kind(),
            }),
        }
    }
}

impl EngineValue for bool {
    const KIND: &'static str = "booleans";
    const SET_OP: &'static str = "set_booleans";
    const GET_OP: &'static str = "get_booleans";

    fn resolve(
        item: &str,
        cache: &RecordCache<Self>,
        at: Time,
        policy: InterpolationPolicy,
    ) -> OmiResult<TimeRecord<Self>> {
        resolve_discrete(item, cache, at, policy)
    }

    fn get_from_engine(
        engine: &mut dyn Engine,
        item: &str,
        missing: &Self,
    ) -> OmiResult<Vec<Self>> {
        engine.get_booleans(item, *missing)
    }

    fn set_on_engine(
        engine: &mut dyn Engine,
        item: &str,
        missing: &Self,
        values: &Array1<Self>,
    ) -> OmiResult<()> {
        engine.set_booleans(item, *missing, &values.to_vec())
    }

    fn into_values(values: Array1<Self>) -> Values {
        Values::Booleans(values)
    }

    fn from_values(item: &str, values: &Values) -> OmiResult<Array1<Self>> {
        match values {
            Values::Booleans(v) => Ok(v.clone()),
            other => Err(OmiError::ValueTypeMismatch {
                item: item.to_string(),
                expected: Self::KIND,
                actual: other.kind(),
            }),
        }
    }
}

impl EngineValue for String {
    const KIND: &'static str = "strings";
    const SET_OP: &'static str = "set_strings";
    const GET_OP: &'static str = "get_strings";

    fn resolve(
        item: &str,
        cache: &RecordCache<Self>,
        at: Time,
        policy: InterpolationPolicy,
    ) -> OmiResult<TimeRecord<Self>> {
        resolve_discrete(item, cache, at, policy)
    }

    fn get_from_engine(
        engine: &mut dyn Engine,
        item: &str,
        missing: &Self,
    ) -> OmiResult<Vec<Self>> {
        engine.get_strings(item, missing)
    }

    fn set_on_engine(
        engine: &mut dyn Engine,
        item: &str,
        missing: &Self,
        values: &Array1<Self>,
    ) -> OmiResult<()> {
        engine.set_strings(item, missing, &values.to_vec())
    }

    fn into_values(values: Array1<Self>) -> Values {
        Values::Strings(values)
    }

    fn from_values(item: &str, values: &Values) -> OmiResult<Array1<Self>> {
        match values {
            Values::Strings(v) => Ok(v.clone()),
            other => Err(OmiError::ValueTypeMismatch {
                item: item.to_string(),
                expected: Self::KIND,
                actual: other.kind(),
            }),
        }
    }
}
