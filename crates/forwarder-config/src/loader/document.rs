//! Reading and decoding of single YAML documents.

use crate::ConfigError;
use log::debug;
use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::Path;

/// Read a whole config file into memory.
pub(super) fn read(path: &Path) -> Result<String, ConfigError> {
    debug!("reading config file: {}", path.display());
    fs::read_to_string(path).map_err(|err| ConfigError::read(path, err))
}

/// Decode a document into `T`. Blank and `null` documents decode as an empty
/// mapping.
///
/// Other documents decode straight from text so errors keep their line/column.
pub(super) fn decode<T: DeserializeOwned>(contents: &str, path: &Path) -> Result<T, ConfigError> {
    if is_blank(contents) || parse_raw(contents, path)?.is_null() {
        debug!("empty config document: {}", path.display());
        return serde_yaml::from_value(Value::Mapping(Mapping::new()))
            .map_err(|err| ConfigError::decode(path, err));
    }
    serde_yaml::from_str(contents).map_err(|err| ConfigError::decode(path, err))
}

/// Parse a document into an untyped value. Blank and `null` documents become
/// an empty mapping.
pub(super) fn parse_value(contents: &str, path: &Path) -> Result<Value, ConfigError> {
    if is_blank(contents) {
        return Ok(Value::Mapping(Mapping::new()));
    }
    match parse_raw(contents, path)? {
        Value::Null => Ok(Value::Mapping(Mapping::new())),
        value => Ok(value),
    }
}

fn parse_raw(contents: &str, path: &Path) -> Result<Value, ConfigError> {
    serde_yaml::from_str(contents).map_err(|err| ConfigError::decode(path, err))
}

/// True when a document holds nothing but whitespace, comments, and markers.
fn is_blank(contents: &str) -> bool {
    contents.lines().map(str::trim).all(|line| {
        line.is_empty() || line.starts_with('#') || line == "---" || line == "..."
    })
}
