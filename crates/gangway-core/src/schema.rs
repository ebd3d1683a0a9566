//! Fixed manifest schema validation.
//!
//! The schema document is embedded at compile time and compiled once at
//! process start; the resulting validator is injected into the pipeline
//! constructor rather than living in module-level state. Validation collects
//! every violation instead of stopping at the first.

use jsonschema::{Draft, Validator};
use serde::Serialize;
use serde_json::Value;

use crate::error::SchemaCompileError;

/// The embedded manifest schema document (JSON Schema draft-07).
pub const MANIFEST_SCHEMA: &str = include_str!("../schema/manifest.schema.json");

/// One violated schema rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaIssue {
    /// JSON pointer to the offending value ("" for the document root).
    pub path: String,

    /// Human-readable rule description.
    pub message: String,
}

/// Compiled manifest schema, shared per process.
pub struct ManifestSchema {
    validator: Validator,
}

impl ManifestSchema {
    /// Compile the embedded schema document.
    pub fn compile() -> Result<Self, SchemaCompileError> {
        let schema: Value = serde_json::from_str(MANIFEST_SCHEMA)
            .map_err(|err| SchemaCompileError(err.to_string()))?;
        Self::from_document(&schema)
    }

    /// Compile an explicit schema document.
    pub fn from_document(schema: &Value) -> Result<Self, SchemaCompileError> {
        let validator = jsonschema::options()
            .with_draft(Draft::Draft7)
            .build(schema)
            .map_err(|err| SchemaCompileError(err.to_string()))?;
        Ok(Self { validator })
    }

    /// Validate a manifest document, collecting every violation.
    pub fn validate(&self, manifest: &Value) -> Vec<SchemaIssue> {
        self.validator
            .iter_errors(manifest)
            .map(|err| SchemaIssue {
                path: err.instance_path.to_string(),
                message: err.to_string(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> ManifestSchema {
        ManifestSchema::compile().expect("embedded schema must compile")
    }

    #[test]
    fn test_valid_manifest_has_no_issues() {
        let manifest = json!({
            "maintainer": "acme-dev",
            "versions": [
                { "version": "1.0.0", "readme": "README.md", "image": "logo.png" },
                { "version": "1.1.0", "hash": "deadbeef" }
            ]
        });
        assert!(schema().validate(&manifest).is_empty());
    }

    #[test]
    fn test_missing_required_fields_reported() {
        let issues = schema().validate(&json!({}));
        assert!(!issues.is_empty());
    }

    #[test]
    fn test_all_violations_collected() {
        // Three independent rule violations: maintainer type, version entry
        // missing its version, and an unknown top-level property.
        let manifest = json!({
            "maintainer": 42,
            "versions": [{ "readme": "README.md" }],
            "homepage": "https://example.com"
        });
        let issues = schema().validate(&manifest);
        assert!(
            issues.len() >= 3,
            "expected at least 3 issues, got {}: {:?}",
            issues.len(),
            issues
        );
    }

    #[test]
    fn test_issue_paths_point_into_document() {
        let manifest = json!({
            "maintainer": "acme-dev",
            "versions": [{ "version": 1 }]
        });
        let issues = schema().validate(&manifest);
        assert!(issues
            .iter()
            .any(|issue| issue.path.contains("/versions/0")));
    }

    #[test]
    fn test_rejects_invalid_schema_document() {
        let bogus = json!({ "type": "not-a-type" });
        assert!(ManifestSchema::from_document(&bogus).is_err());
    }
}
