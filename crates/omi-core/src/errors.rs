//! Error types for the SDK.
//!
//! The taxonomy distinguishes configuration problems (detected while a
//! component is being set up), temporal consistency failures (an engine that
//! moves backwards or refuses to advance), interpolation failures (a cache
//! queried before any data exists) and packing mismatches between declared
//! layouts and actual buffers. None of these are retried; every failure
//! propagates to the caller with enough context to diagnose it.

use crate::time::Time;
use thiserror::Error;

/// Error type for invalid operations.
#[derive(Error, Debug)]
pub enum OmiError {
    /// A missing or invalid argument, an unresolvable engine identifier, or a
    /// lifecycle call made out of order. Detected at preparation time.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A record was appended behind the cache tail.
    #[error("record at t={attempted} is earlier than the cached tail at t={last}")]
    OutOfOrderTime { last: Time, attempted: Time },

    /// The engine reported a current time earlier than the latest cached one.
    #[error("engine time for `{item}` moved backwards: cached t={cached}, engine reported t={reported}")]
    EngineTimeRegression {
        item: String,
        cached: Time,
        reported: Time,
    },

    /// The engine failed to advance its clock across an update call.
    #[error("engine failed to advance: t={before} before update, t={after} after")]
    EngineStalled { before: Time, after: Time },

    /// An input pushed a record whose time does not exactly match the time the
    /// engine is being fed for.
    #[error("input `{item}` pushed values for t={record} but the engine expects t={expected}")]
    InputTimeMismatch {
        item: String,
        expected: Time,
        record: Time,
    },

    /// A cache was queried before any values were recorded into it.
    #[error("no cached data to interpolate for `{item}` at t={at}")]
    NoDataToInterpolate { item: String, at: Time },

    /// A value buffer does not match the declared element layout.
    #[error("shape mismatch for `{item}`: layout expects {expected} values, got {actual}")]
    ShapeMismatch {
        item: String,
        expected: usize,
        actual: usize,
    },

    /// A value set carried a different value kind than the converter handles.
    #[error("value type mismatch for `{item}`: expected {expected}, got {actual}")]
    ValueTypeMismatch {
        item: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// A data-plane call the engine binding does not support.
    #[error("engine does not override `{0}`")]
    NotOverridden(&'static str),

    /// A failure raised inside an engine binding.
    #[error("{0}")]
    Engine(String),

    /// Wrapper recording which engine call failed.
    #[error("engine call `{operation}` failed")]
    EngineCall {
        operation: &'static str,
        #[source]
        source: Box<OmiError>,
    },
}

impl OmiError {
    /// Wrap this error with the name of the engine call that raised it.
    pub fn in_call(self, operation: &'static str) -> Self {
        OmiError::EngineCall {
            operation,
            source: Box::new(self),
        }
    }
}

/// Convenience type for `Result<T, OmiError>`.
pub type OmiResult<T> = Result<T, OmiError>;

/// Attach the engine operation name to a failed call.
pub(crate) fn wrap_call<T>(result: OmiResult<T>, operation: &'static str) -> OmiResult<T> {
    result.map_err(|e| e.in_call(operation))
}
