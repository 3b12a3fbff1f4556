//! Time representation for linkable components.
//!
//! All times are fractional day counts on the Modified Julian Day scale.
//! A [`TimeStamp`] is either an instant (zero duration) or a span; consumers
//! request values through [`TimeSet`]s and the orchestrator records engine
//! progress in a [`TimeExtent`].

use serde::{Deserialize, Serialize};

/// A point in time expressed as a Modified Julian Day fractional day count.
pub type Time = f64;

/// An instant or span on the Modified Julian Day scale.
///
/// A zero `duration` marks an instant; a positive duration marks a span
/// starting at `time` and ending at [`end()`](Self::end).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct TimeStamp {
    pub time: Time,
    pub duration: f64,
}

impl TimeStamp {
    /// An instant with zero duration.
    pub fn instant(time: Time) -> Self {
        Self {
            time,
            duration: 0.0,
        }
    }

    /// A span covering `[time, time + duration]`.
    pub fn span(time: Time, duration: f64) -> Self {
        Self { time, duration }
    }

    /// End of the stamp, equal to `time` for instants.
    pub fn end(&self) -> Time {
        self.time + self.duration
    }
}

/// The ordered set of times a consumer requests values for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSet {
    stamps: Vec<TimeStamp>,
}

impl TimeSet {
    pub fn new(stamps: Vec<TimeStamp>) -> Self {
        Self { stamps }
    }

    /// A set holding a single stamp.
    pub fn single(stamp: TimeStamp) -> Self {
        Self {
            stamps: vec![stamp],
        }
    }

    /// A set holding a single instant.
    pub fn at(time: Time) -> Self {
        Self::single(TimeStamp::instant(time))
    }

    pub fn stamps(&self) -> &[TimeStamp] {
        &self.stamps
    }

    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    /// Earliest requested start across all stamps.
    pub fn earliest_start(&self) -> Option<Time> {
        self.stamps
            .iter()
            .map(|s| s.time)
            .fold(None, |acc, t| Some(acc.map_or(t, |a: Time| a.min(t))))
    }

    /// Latest requested end across all stamps, using end-of-interval
    /// semantics for spans.
    pub fn latest_end(&self) -> Option<Time> {
        self.stamps
            .iter()
            .map(|s| s.end())
            .fold(None, |acc, t| Some(acc.map_or(t, |a: Time| a.max(t))))
    }
}

/// The overall span a component is permitted to simulate.
///
/// Unbounded ends are expressed as `-INFINITY` / `INFINITY`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeHorizon {
    pub start: Time,
    pub end: Time,
}

impl TimeHorizon {
    pub fn bounded(start: Time, end: Time) -> Self {
        Self { start, end }
    }

    pub fn unbounded() -> Self {
        Self {
            start: f64::NEG_INFINITY,
            end: f64::INFINITY,
        }
    }

    /// A horizon with a fixed start and no upper bound.
    pub fn from(start: Time) -> Self {
        Self {
            start,
            end: f64::INFINITY,
        }
    }
}

impl Default for TimeHorizon {
    fn default() -> Self {
        Self::unbounded()
    }
}

/// The horizon plus the times a component has actually reached.
///
/// Mutated only by the update orchestrator as the engine advances.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeExtent {
    horizon: TimeHorizon,
    reached: Vec<Time>,
}

impl TimeExtent {
    pub fn new(horizon: TimeHorizon) -> Self {
        Self {
            horizon,
            reached: Vec::new(),
        }
    }

    pub fn horizon(&self) -> TimeHorizon {
        self.horizon
    }

    pub fn reached(&self) -> &[Time] {
        &self.reached
    }

    /// Record a time the engine has advanced to.
    pub fn record(&mut self, time: Time) {
        self.reached.push(time);
    }

    /// Latest time the engine has reached, if any.
    pub fn last_reached(&self) -> Option<Time> {
        self.reached.last().copied()
    }

    /// Whether the engine has reached or passed the horizon end.
    pub fn completed(&self) -> bool {
        self.last_reached()
            .map(|t| t >= self.horizon.end)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamp_end_uses_duration() {
        assert_eq!(TimeStamp::instant(5.0).end(), 5.0);
        assert_eq!(TimeStamp::span(5.0, 2.5).end(), 7.5);
    }

    #[test]
    fn time_set_bounds() {
        let set = TimeSet::new(vec![
            TimeStamp::instant(10.0),
            TimeStamp::span(4.0, 3.0),
            TimeStamp::instant(8.0),
        ]);
        assert_eq!(set.earliest_start(), Some(4.0));
        // 10.0 beats the span end of 7.0
        assert_eq!(set.latest_end(), Some(10.0));
    }

    #[test]
    fn empty_time_set_has_no_bounds() {
        let set = TimeSet::default();
        assert_eq!(set.earliest_start(), None);
        assert_eq!(set.latest_end(), None);
    }

    #[test]
    fn extent_completion_against_horizon() {
        let mut extent = TimeExtent::new(TimeHorizon::bounded(0.0, 100.0));
        assert!(!extent.completed());
        extent.record(50.0);
        assert!(!extent.completed());
        extent.record(100.0);
        assert!(extent.completed());
        assert_eq!(extent.reached(), &[50.0, 100.0]);
    }

    #[test]
    fn unbounded_horizon_never_completes() {
        let mut extent = TimeExtent::new(TimeHorizon::unbounded());
        extent.record(1e9);
        assert!(!extent.completed());
    }
}
