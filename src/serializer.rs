//! Serialization of generated artifacts to JSON or YAML text.
//!
//! Collections are always written as pretty JSON. OpenAPI documents follow the output
//! file's extension: `.yaml` / `.yml` give YAML, anything else JSON.

use crate::error::Result;
use crate::source::{extension, write_output};
use log::debug;
use serde::Serialize;
use std::path::Path;

/// Text format of a written artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFormat {
    Json,
    Yaml,
}

impl TextFormat {
    /// Format implied by an output path.
    pub fn for_path(path: &Path) -> Self {
        match extension(path).as_deref() {
            Some("yaml") | Some("yml") => TextFormat::Yaml,
            _ => TextFormat::Json,
        }
    }
}

/// Serializes a value to YAML.
///
/// # Errors
///
/// Returns `Serialization` if the value cannot be represented as YAML.
pub fn serialize_yaml<T: Serialize>(value: &T) -> Result<String> {
    debug!("Serializing to YAML");
    Ok(serde_yaml::to_string(value)?)
}

/// Serializes a value to JSON with pretty printing.
///
/// # Errors
///
/// Returns `Serialization` if the value cannot be represented as JSON.
pub fn serialize_json<T: Serialize>(value: &T) -> Result<String> {
    debug!("Serializing to JSON");
    Ok(serde_json::to_string_pretty(value)?)
}

/// Serializes a value in the given format.
pub fn serialize<T: Serialize>(value: &T, format: TextFormat) -> Result<String> {
    match format {
        TextFormat::Json => serialize_json(value),
        TextFormat::Yaml => serialize_yaml(value),
    }
}

/// Serializes a value in the format implied by `path` and writes it there.
///
/// Returns the number of bytes written.
pub fn write_artifact<T: Serialize>(value: &T, path: &Path) -> Result<usize> {
    write_as(value, path, TextFormat::for_path(path))
}

/// Serializes a value in an explicit format and writes it to `path`.
pub fn write_as<T: Serialize>(value: &T, path: &Path, format: TextFormat) -> Result<usize> {
    let content = serialize(value, format)?;
    write_output(path, &content)?;
    Ok(content.len())
}
