//! Serialization of AsyncAPI documents to YAML or JSON.
//!
//! Empty fields never reach the output: unset options, empty lists and maps, and empty
//! nested schemas are all omitted.

use crate::document::Document;
use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::path::Path;

/// Output format of a serialized document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Yaml,
    Json,
}

impl OutputFormat {
    /// Pick the format from a file extension: `.json` is JSON, anything else YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => OutputFormat::Json,
            _ => OutputFormat::Yaml,
        }
    }
}

/// Serializes a document to YAML.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn serialize_yaml(doc: &Document) -> Result<String> {
    debug!("Serializing AsyncAPI document to YAML");
    serde_yaml::to_string(doc).context("Failed to serialize AsyncAPI document to YAML")
}

/// Serializes a document to pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn serialize_json(doc: &Document) -> Result<String> {
    debug!("Serializing AsyncAPI document to JSON");
    serde_json::to_string_pretty(doc).context("Failed to serialize AsyncAPI document to JSON")
}

/// Serializes a document in the given format.
pub fn serialize(doc: &Document, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Yaml => serialize_yaml(doc),
        OutputFormat::Json => serialize_json(doc),
    }
}

/// Writes string content to a file, creating parent directories as needed.
///
/// An existing file is overwritten.
///
/// # Errors
///
/// Returns an error if a directory or the file cannot be created or written to.
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    debug!("Writing content to file: {}", path.display());

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(path, content)
        .with_context(|| format!("Failed to write to file: {}", path.display()))?;

    debug!("Successfully wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}
