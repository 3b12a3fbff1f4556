//! State snapshots for save/restore.
//!
//! The orchestrator and caches must be fully recoverable after a restore:
//! a snapshot carries the component's time extent plus every item's cached
//! records in the tagged [`Values`] representation. The concrete wire format
//! is the caller's concern; everything here just derives serde.

use crate::time::{TimeExtent, TimeStamp};
use crate::values::Values;
use serde::{Deserialize, Serialize};

/// Cached records of one exchange item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    pub item: String,
    pub records: Vec<(TimeStamp, Values)>,
}

/// Everything a component needs to resume interpolation after a restore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentSnapshot {
    pub extent: TimeExtent,
    pub inputs: Vec<ItemSnapshot>,
    pub outputs: Vec<ItemSnapshot>,
}
