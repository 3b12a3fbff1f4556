//! Timestamped value records and the per-item cache that stores them.
//!
//! Each exchange item's converter owns one [`RecordCache`]. Records enter the
//! cache as the engine advances and leave it when the orchestrator trims
//! values no consumer needs any more. The cache keeps its records strictly
//! ordered in time and never trims itself below two records while more
//! remain, so a bracketing pair is always available for interpolation.

use crate::errors::{OmiError, OmiResult};
use crate::time::{Time, TimeStamp};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// One timestamped set of values for a single element set.
///
/// Records are owned exclusively by the cache that holds them and are cloned,
/// never aliased, when exposed outward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeRecord<T> {
    time: TimeStamp,
    values: Array1<T>,
}

impl<T: Clone> TimeRecord<T> {
    pub fn new(time: TimeStamp, values: Array1<T>) -> Self {
        Self { time, values }
    }

    pub fn time(&self) -> TimeStamp {
        self.time
    }

    pub fn values(&self) -> &Array1<T> {
        &self.values
    }

    pub fn into_values(self) -> Array1<T> {
        self.values
    }

    /// A clone of this record stamped at `at`.
    pub fn restamped(&self, at: Time) -> TimeRecord<T> {
        TimeRecord {
            time: TimeStamp::instant(at),
            values: self.values.clone(),
        }
    }
}

/// Number of records [`RecordCache::trim`] always leaves in place, so that a
/// bracketing pair survives every trim.
pub const TRIM_FLOOR: usize = 2;

/// An ordered sequence of [`TimeRecord`]s, non-decreasing in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordCache<T> {
    records: Vec<TimeRecord<T>>,
}

impl<T: Clone> RecordCache<T> {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[TimeRecord<T>] {
        &self.records
    }

    /// The most recent record, if any.
    pub fn latest(&self) -> Option<&TimeRecord<T>> {
        self.records.last()
    }

    /// Append a record at the tail of the cache.
    ///
    /// A record at exactly the tail's time replaces the tail; a record
    /// strictly earlier than the tail fails with
    /// [`OmiError::OutOfOrderTime`] (the engine moved backwards).
    pub fn append(&mut self, record: TimeRecord<T>) -> OmiResult<()> {
        if let Some(last) = self.records.last() {
            let tail = last.time.time;
            let incoming = record.time.time;
            if incoming == tail {
                *self.records.last_mut().expect("tail checked above") = record;
                return Ok(());
            }
            if incoming < tail {
                return Err(OmiError::OutOfOrderTime {
                    last: tail,
                    attempted: incoming,
                });
            }
        }
        self.records.push(record);
        Ok(())
    }

    /// Drop leading records with time strictly before `upto`.
    ///
    /// The cache never shrinks below [`TRIM_FLOOR`] records while more than
    /// that remain; a cache that already holds two or fewer is untouched.
    pub fn trim(&mut self, upto: Time) {
        let first_kept = self
            .records
            .iter()
            .position(|r| r.time.time >= upto)
            .unwrap_or(self.records.len());
        let max_droppable = self.records.len().saturating_sub(TRIM_FLOOR);
        self.records.drain(..first_kept.min(max_droppable));
    }

    /// Index of the first record with time at or above `at`.
    ///
    /// Returns `None` when `at` lies beyond every cached time, the edge the
    /// interpolator must resolve as extrapolation past the final bracket.
    pub fn index_at_or_above(&self, at: Time) -> Option<usize> {
        self.records.iter().position(|r| r.time.time >= at)
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn record(t: Time, v: f64) -> TimeRecord<f64> {
        TimeRecord::new(TimeStamp::instant(t), array![v])
    }

    fn cache_with(times: &[Time]) -> RecordCache<f64> {
        let mut cache = RecordCache::new();
        for &t in times {
            cache.append(record(t, t * 10.0)).unwrap();
        }
        cache
    }

    #[test]
    fn append_keeps_times_non_decreasing() {
        let cache = cache_with(&[0.0, 1.0, 2.5, 7.0]);
        let times: Vec<Time> = cache.records().iter().map(|r| r.time().time).collect();
        assert_eq!(times, vec![0.0, 1.0, 2.5, 7.0]);
    }

    #[test]
    fn append_equal_time_replaces_tail() {
        let mut cache = cache_with(&[0.0, 1.0]);
        cache.append(record(1.0, 99.0)).unwrap();
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.latest().unwrap().values()[0], 99.0);
    }

    #[test]
    fn append_earlier_time_fails() {
        let mut cache = cache_with(&[0.0, 5.0]);
        let err = cache.append(record(3.0, 0.0)).unwrap_err();
        assert!(matches!(
            err,
            OmiError::OutOfOrderTime {
                last,
                attempted,
            } if last == 5.0 && attempted == 3.0
        ));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn trim_drops_leading_records() {
        let mut cache = cache_with(&[0.0, 1.0, 2.0, 3.0, 4.0]);
        cache.trim(2.0);
        let times: Vec<Time> = cache.records().iter().map(|r| r.time().time).collect();
        assert_eq!(times, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn trim_never_shrinks_below_floor() {
        let mut cache = cache_with(&[0.0, 1.0, 2.0, 3.0]);
        // Everything is below the cutoff, but two records must survive.
        cache.trim(100.0);
        assert_eq!(cache.len(), TRIM_FLOOR);
        let times: Vec<Time> = cache.records().iter().map(|r| r.time().time).collect();
        assert_eq!(times, vec![2.0, 3.0]);
    }

    #[test]
    fn trim_leaves_small_caches_alone() {
        let mut cache = cache_with(&[0.0, 1.0]);
        cache.trim(100.0);
        assert_eq!(cache.len(), 2);

        let mut single = cache_with(&[0.0]);
        single.trim(100.0);
        assert_eq!(single.len(), 1);
    }

    #[test]
    fn bracket_search_positions() {
        let cache = cache_with(&[1.0, 3.0, 5.0]);
        assert_eq!(cache.index_at_or_above(0.0), Some(0));
        assert_eq!(cache.index_at_or_above(1.0), Some(0));
        assert_eq!(cache.index_at_or_above(3.0), Some(1));
        assert_eq!(cache.index_at_or_above(4.0), Some(2));
        // Beyond all cached times.
        assert_eq!(cache.index_at_or_above(6.0), None);
    }
}
