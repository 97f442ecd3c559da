//! Layered job settings.
//!
//! Every job is configured by a flat JSON object. Values are merged from
//! three layers, later layers replacing earlier ones per top-level key:
//!
//! 1. environment variables named after the settings fields
//! 2. the `--job-settings` JSON document
//! 3. trailing `--key value` flags
//!
//! Field defaults are applied by serde after merging, then
//! [`JobSettings::finalize`] derives remaining defaults and validates.

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{Error, Result};

pub trait JobSettings: DeserializeOwned + Serialize {
    /// Top-level keys that may also be supplied through environment variables.
    const FIELDS: &'static [&'static str];

    /// String and path fields. Env and flag values for these are taken verbatim.
    const TEXT_FIELDS: &'static [&'static str] = &[];

    /// `LOG_LEVEL` used when the environment does not set one.
    const DEFAULT_LOG_LEVEL: &'static str = "WARNING";

    /// Derive defaults that depend on other fields and reject invalid combinations.
    fn finalize(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Parse a string value into appropriate JSON type.
/// Order: JSON literal → bool → number → string
pub fn parse_value(s: &str) -> Value {
    // Try JSON first (handles arrays, objects, quoted strings)
    if let Ok(v) = serde_json::from_str(s) {
        return v;
    }
    if s == "true" {
        return json!(true);
    }
    if s == "false" {
        return json!(false);
    }
    if let Ok(n) = s.parse::<i64>() {
        return json!(n);
    }
    if let Ok(n) = s.parse::<f64>() {
        return json!(n);
    }
    json!(s)
}

/// Parse a raw env or flag value for `key` of `T`.
pub fn parse_field<T: JobSettings>(key: &str, raw: &str) -> Value {
    if T::TEXT_FIELDS.contains(&key) {
        json!(raw)
    } else {
        parse_value(raw)
    }
}

/// Collect settings fields present in the environment.
///
/// Names are matched upper-cased first, then verbatim.
pub fn env_layer<T: JobSettings>(lookup: impl Fn(&str) -> Option<String>) -> Map<String, Value> {
    let mut layer = Map::new();
    for field in T::FIELDS {
        let value = lookup(&field.to_ascii_uppercase()).or_else(|| lookup(field));
        if let Some(raw) = value {
            layer.insert((*field).to_string(), parse_field::<T>(field, &raw));
        }
    }
    layer
}

/// Same as [`env_layer`] against the process environment.
pub fn process_env_layer<T: JobSettings>() -> Map<String, Value> {
    env_layer::<T>(|name| std::env::var(name).ok())
}

/// Merge the layers and build validated settings.
pub fn resolve<T: JobSettings>(
    env: Map<String, Value>,
    document: Option<Value>,
    flags: Map<String, Value>,
) -> Result<T> {
    let mut merged = env;

    match document {
        Some(Value::Object(obj)) => merged.extend(obj),
        Some(Value::Null) | None => {}
        Some(other) => {
            return Err(Error::validation_invalid_argument(
                "job_settings",
                format!("Job settings must be a JSON object, got {}", json_kind(&other)),
                None,
                None,
            ))
        }
    }

    merged.extend(flags);

    let mut settings: T = serde_json::from_value(Value::Object(merged))
        .map_err(|e| Error::config_invalid_value("job_settings", None, e.to_string()))?;
    settings.finalize()?;
    Ok(settings)
}

/// Shorthand for building settings from a JSON value alone.
pub fn from_value<T: JobSettings>(document: Value) -> Result<T> {
    resolve(Map::new(), Some(document), Map::new())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Accept a string field that arrived as a bare number through env or flags.
pub fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
        Raw::Float(n) => n.to_string(),
    }))
}

pub(crate) fn default_n_partitions() -> usize {
    20
}

pub(crate) fn default_num_of_dir_levels() -> usize {
    4
}
