//! Integration tests for the component module.
//!
//! These drive full update cycles against scripted engines: stepping and
//! trimming, the update-once-only triggers, lifecycle guards and snapshot
//! round-trips.

#[cfg(test)]
mod lifecycle;
#[cfg(test)]
mod once_only;
#[cfg(test)]
mod snapshots;
