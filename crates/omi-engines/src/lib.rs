//! Reference engine bindings for the `omi-core` linkable-component SDK.
//!
//! The bindings here are pure-Rust engines implementing
//! [`omi_core::Engine`]; they double as worked examples of how a native or
//! remoted engine wrapper is expected to behave.

pub mod engines;

pub use engines::{register_engines, LinearReservoirEngine, LinearReservoirParameters};
