//! Component arguments.
//!
//! An [`Arguments`] collection carries the configuration a component is built
//! from: the engine identifier, the engine's own configuration text and any
//! free-form key/values a binding wants. Arguments can be assembled in code
//! or parsed from TOML text. Missing or unparsable arguments surface as
//! configuration errors at preparation time.

use crate::errors::{OmiError, OmiResult};
use serde::{Deserialize, Serialize};

/// Argument key naming the registered engine to construct.
pub const ARG_ENGINE: &str = "engine";
/// Argument key holding the configuration text passed to the engine's
/// `initialise` call.
pub const ARG_ENGINE_CONFIG: &str = "engine_config";

/// One named configuration value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argument {
    pub key: String,
    pub value: String,
    pub description: String,
}

impl Argument {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            description: String::new(),
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// An ordered collection of arguments with typed accessors.
///
/// Later entries shadow earlier ones with the same key, so defaults can be
/// loaded first and overridden afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Arguments {
    items: Vec<Argument>,
}

impl Arguments {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Parse a flat TOML table into arguments; non-string values keep their
    /// TOML text form.
    pub fn from_toml(text: &str) -> OmiResult<Self> {
        let table: toml::Table = text
            .parse()
            .map_err(|e| OmiError::Configuration(format!("invalid argument TOML: {e}")))?;

        let mut args = Self::new();
        for (key, value) in table {
            let value = match value {
                toml::Value::String(s) => s,
                other => other.to_string(),
            };
            args.set(key, value);
        }
        Ok(args)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.items.push(Argument::new(key, value));
        self
    }

    pub fn push(&mut self, argument: Argument) -> &mut Self {
        self.items.push(argument);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &Argument> {
        self.items.iter()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.items
            .iter()
            .rev()
            .find(|a| a.key == key)
            .map(|a| a.value.as_str())
    }

    /// Fetch a required argument, failing with a configuration error when it
    /// is absent.
    pub fn require(&self, key: &str) -> OmiResult<&str> {
        self.get(key)
            .ok_or_else(|| OmiError::Configuration(format!("missing required argument `{key}`")))
    }

    pub fn get_f64(&self, key: &str) -> OmiResult<Option<f64>> {
        self.get(key)
            .map(|raw| {
                raw.parse().map_err(|_| {
                    OmiError::Configuration(format!("argument `{key}`={raw} is not a number"))
                })
            })
            .transpose()
    }

    pub fn require_f64(&self, key: &str) -> OmiResult<f64> {
        self.get_f64(key)?
            .ok_or_else(|| OmiError::Configuration(format!("missing required argument `{key}`")))
    }

    pub fn get_bool(&self, key: &str) -> OmiResult<Option<bool>> {
        self.get(key)
            .map(|raw| {
                raw.parse().map_err(|_| {
                    OmiError::Configuration(format!("argument `{key}`={raw} is not a boolean"))
                })
            })
            .transpose()
    }
}
