//! Temporal interpolation over a record cache.
//!
//! Given a query time, a policy and a cache, the interpolator resolves one
//! record. Relative to the query time a cache is in one of five states:
//! empty, single record, before all cached times, bracketed, or after all
//! cached times. The behaviour per state is:
//!
//! - empty: [`OmiError::NoDataToInterpolate`];
//! - single record: that record's values, whatever the policy;
//! - before all: the first record's values (clamped, no low-end
//!   extrapolation);
//! - bracketed: per policy, see [`InterpolationPolicy`];
//! - after all: `Linear` extrapolates past the final bracket, every other
//!   policy clamps to the last record.
//!
//! Every decision emits a `log::debug!` diagnostic carrying the bracket
//! indices and the factor used. That hook is the subsystem's only built-in
//! tracing and is relied on for observability.

use crate::cache::{RecordCache, TimeRecord};
use crate::errors::{OmiError, OmiResult};
use crate::time::Time;
use log::debug;
use ndarray::{Array1, Zip};
use num::Float;
use serde::{Deserialize, Serialize};

/// How a converter resolves values at times between cached records.
///
/// Fixed at converter construction; not mutable per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterpolationPolicy {
    /// Return the last cached record's values, re-stamped to the query time.
    ///
    /// The query time is ignored entirely. This mirrors long-standing
    /// behaviour of existing components and is preserved as-is even though
    /// silently returning stale values is questionable.
    NoneUseLast,
    /// The record immediately below the query time.
    Lower,
    /// The record immediately above the query time.
    Upper,
    /// Elementwise average of the bracketing records, factor fixed at 0.5.
    Mean,
    /// Elementwise linear blend; queries past the last record extrapolate
    /// using the final bracket (factor above 1).
    Linear,
    /// As `Linear`, but queries past the last record clamp to the last
    /// record's values instead of extrapolating.
    LinearNoExtrapolation,
}

/// Resolve one record at `at` from a cache of continuous numeric values.
///
/// Results are always stamped at the query time. `item` only labels
/// diagnostics and errors.
pub fn interpolate<T: Float>(
    item: &str,
    cache: &RecordCache<T>,
    at: Time,
    policy: InterpolationPolicy,
) -> OmiResult<TimeRecord<T>> {
    let records = cache.records();
    if records.is_empty() {
        return Err(OmiError::NoDataToInterpolate {
            item: item.to_string(),
            at,
        });
    }

    if policy == InterpolationPolicy::NoneUseLast {
        let last = records.len() - 1;
        debug!("{item}: policy NoneUseLast returns record {last} ignoring t={at}");
        return Ok(records[last].restamped(at));
    }

    if records.len() == 1 {
        debug!("{item}: single cached record, returned verbatim at t={at}");
        return Ok(records[0].restamped(at));
    }

    match cache.index_at_or_above(at) {
        Some(i) if records[i].time().time == at => {
            debug!("{item}: exact hit on record {i} at t={at}");
            Ok(records[i].restamped(at))
        }
        Some(0) => {
            debug!("{item}: t={at} is before record 0, clamped to oldest values");
            Ok(records[0].restamped(at))
        }
        Some(i) => {
            let (lower, upper) = (&records[i - 1], &records[i]);
            let t_lo = lower.time().time;
            let t_hi = upper.time().time;
            match policy {
                InterpolationPolicy::Lower => {
                    debug!("{item}: bracket [{},{}] at t={at}, took lower", i - 1, i);
                    Ok(lower.restamped(at))
                }
                InterpolationPolicy::Upper => {
                    debug!("{item}: bracket [{},{}] at t={at}, took upper", i - 1, i);
                    Ok(upper.restamped(at))
                }
                InterpolationPolicy::Mean => {
                    debug!("{item}: bracket [{},{}] at t={at}, factor 0.5", i - 1, i);
                    Ok(TimeRecord::new(
                        crate::time::TimeStamp::instant(at),
                        blend(lower.values(), upper.values(), 0.5),
                    ))
                }
                InterpolationPolicy::Linear | InterpolationPolicy::LinearNoExtrapolation => {
                    let factor = (at - t_lo) / (t_hi - t_lo);
                    debug!(
                        "{item}: bracket [{},{}] at t={at}, factor {factor}",
                        i - 1,
                        i
                    );
                    Ok(TimeRecord::new(
                        crate::time::TimeStamp::instant(at),
                        blend(lower.values(), upper.values(), factor),
                    ))
                }
                InterpolationPolicy::NoneUseLast => unreachable!("handled above"),
            }
        }
        None => {
            // After every cached time: the final pair is the only bracket
            // available.
            let n = records.len();
            let (lower, upper) = (&records[n - 2], &records[n - 1]);
            match policy {
                InterpolationPolicy::Linear => {
                    let t_lo = lower.time().time;
                    let t_hi = upper.time().time;
                    let factor = (at - t_lo) / (t_hi - t_lo);
                    debug!(
                        "{item}: t={at} beyond record {}, extrapolating with factor {factor}",
                        n - 1
                    );
                    Ok(TimeRecord::new(
                        crate::time::TimeStamp::instant(at),
                        blend(lower.values(), upper.values(), factor),
                    ))
                }
                _ => {
                    debug!(
                        "{item}: t={at} beyond record {}, clamped to latest values",
                        n - 1
                    );
                    Ok(upper.restamped(at))
                }
            }
        }
    }
}

/// Resolve one record at `at` for value types without numeric interpolation.
///
/// Non-numeric values always take the `Upper` path: the record at or
/// immediately above the query time, clamping at either end of the cache.
/// `NoneUseLast` keeps its usual meaning.
pub fn resolve_discrete<T: Clone>(
    item: &str,
    cache: &RecordCache<T>,
    at: Time,
    policy: InterpolationPolicy,
) -> OmiResult<TimeRecord<T>> {
    let records = cache.records();
    if records.is_empty() {
        return Err(OmiError::NoDataToInterpolate {
            item: item.to_string(),
            at,
        });
    }

    if policy == InterpolationPolicy::NoneUseLast {
        let last = records.len() - 1;
        debug!("{item}: policy NoneUseLast returns record {last} ignoring t={at}");
        return Ok(records[last].restamped(at));
    }

    match cache.index_at_or_above(at) {
        Some(i) => {
            debug!("{item}: discrete values at t={at} resolved to record {i}");
            Ok(records[i].restamped(at))
        }
        None => {
            let last = records.len() - 1;
            debug!("{item}: t={at} beyond record {last}, clamped to latest values");
            Ok(records[last].restamped(at))
        }
    }
}

fn blend<T: Float>(lower: &Array1<T>, upper: &Array1<T>, factor: f64) -> Array1<T> {
    let f = T::from(factor).expect("interpolation factor must be representable");
    Zip::from(lower)
        .and(upper)
        .map_collect(|&lo, &hi| lo + (hi - lo) * f)
}
