//! Loosely typed operation parameters.
//!
//! Plans come from a language model, so numbers may arrive as strings and booleans as
//! `"true"`. Getters accept those spellings and reject everything else with an
//! `InvalidParameter` error naming the key.

use geoproc_core::config::parse_bool;
use geoproc_core::error::{GeoprocError, Result};
use geoproc_core::models::ProjectionProperty;
use geoproc_geo::CrsOptions;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params(Map<String, Value>);

impl Params {
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Build from a JSON value; `null` means no parameters
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self::default()),
            other => Err(GeoprocError::invalid_parameter(
                "params",
                format!("expected a JSON object, got {}", other),
            )),
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.get(key).is_some_and(|v| !v.is_null())
    }

    pub fn get_f64(&self, key: &str) -> Result<Option<f64>> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n
                .as_f64()
                .map(Some)
                .ok_or_else(|| GeoprocError::invalid_parameter(key, "number out of range")),
            Some(Value::String(s)) => s.trim().parse::<f64>().map(Some).map_err(|_| {
                GeoprocError::invalid_parameter(key, format!("'{}' is not a number", s))
            }),
            Some(other) => Err(GeoprocError::invalid_parameter(
                key,
                format!("expected a number, got {}", other),
            )),
        }
    }

    pub fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(Value::Number(n)) => Ok(Some(n.as_f64().is_some_and(|v| v != 0.0))),
            Some(Value::String(s)) => parse_bool(s).map(Some).ok_or_else(|| {
                GeoprocError::invalid_parameter(key, format!("'{}' is not a boolean", s))
            }),
            Some(other) => Err(GeoprocError::invalid_parameter(
                key,
                format!("expected a boolean, got {}", other),
            )),
        }
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str).map(str::trim).filter(|s| !s.is_empty())
    }

    /// A string or an array of strings
    pub fn get_str_list(&self, key: &str) -> Vec<String> {
        match self.0.get(key) {
            Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s.trim().to_string()),
                    Value::Null => None,
                    other => Some(other.to_string()),
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// First present key among aliases
    pub fn first_str(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|k| self.get_str(k))
    }
}

impl From<Map<String, Value>> for Params {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Parameters every operation understands
#[derive(Debug, Clone, PartialEq)]
pub struct CommonOptions {
    pub crs: CrsOptions,
    pub projection_metadata: bool,
}

impl CommonOptions {
    pub fn from_params(
        params: &Params,
        default_auto_optimize: bool,
        default_metadata: bool,
    ) -> Result<Self> {
        let projection_priority = match params.get_str("projection_priority") {
            Some(s) => Some(ProjectionProperty::parse(s).ok_or_else(|| {
                GeoprocError::invalid_parameter(
                    "projection_priority",
                    format!("'{}' is neither conformal nor equal_area", s),
                )
            })?),
            None => None,
        };

        Ok(Self {
            crs: CrsOptions {
                auto_optimize_crs: params
                    .get_bool("auto_optimize_crs")?
                    .unwrap_or(default_auto_optimize),
                override_crs: params.get_str("override_crs").map(str::to_string),
                projection_priority,
            },
            projection_metadata: params
                .get_bool("projection_metadata")?
                .unwrap_or(default_metadata),
        })
    }
}
