//! Plugin manifest parsing.
//!
//! Manifests are decoded leniently: the schema check owns strictness, and the
//! downstream checks must still run over documents that violate it. A JSON
//! syntax error, by contrast, is an operational fault for the caller.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// File name of the plugin manifest inside its folder.
pub const MANIFEST_FILE: &str = "manifest.json";

/// One release entry in the manifest's version list, optionally referencing a
/// readme and/or image file relative to the plugin folder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionEntry {
    #[serde(default)]
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readme: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

/// The manifest document declaring a plugin's maintainer and version history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestDocument {
    #[serde(default)]
    pub maintainer: String,

    #[serde(default)]
    pub versions: Vec<VersionEntry>,
}

/// A manifest parsed from raw bytes: the raw JSON value the schema check
/// validates, plus the lenient typed view the other checks consume.
#[derive(Debug, Clone)]
pub struct ParsedManifest {
    pub raw: Value,
    pub doc: ManifestDocument,
}

/// Parse manifest bytes into both views.
///
/// Version entries that do not decode (wrong field types, non-object items)
/// are dropped from the typed view rather than failing the parse; the schema
/// check reports them against the raw value.
pub fn parse(bytes: &[u8]) -> Result<ParsedManifest, serde_json::Error> {
    let raw: Value = serde_json::from_slice(bytes)?;
    let doc = lenient_document(&raw);
    Ok(ParsedManifest { raw, doc })
}

fn lenient_document(raw: &Value) -> ManifestDocument {
    let maintainer = raw
        .get("maintainer")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let versions = raw
        .get("versions")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| serde_json::from_value(entry.clone()).ok())
                .collect()
        })
        .unwrap_or_default();

    ManifestDocument {
        maintainer,
        versions,
    }
}
