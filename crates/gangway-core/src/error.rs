//! Error taxonomy for the gangway core.
//!
//! Expected validation outcomes travel as `ValidationFailure` values and never
//! appear here. These types cover operational faults only: collaborator
//! failures and unparseable data that must propagate out of the pipeline.

use thiserror::Error;

/// Operational faults raised by hosting-platform collaborators.
#[derive(Debug, Error)]
pub enum HostError {
    /// Transport-level failure (connection, timeout, TLS).
    #[error("platform request failed: {0}")]
    Request(String),

    /// The platform answered with an unexpected status code.
    #[error("unexpected platform response ({status}): {message}")]
    Response { status: u16, message: String },

    /// The platform answered 2xx but the payload did not decode.
    #[error("malformed platform payload: {0}")]
    Malformed(String),
}

/// Faults that abort a pipeline run without producing a check result.
///
/// These are the caller's responsibility to log and alert on; they are never
/// converted into published check runs.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("host error: {0}")]
    Host(#[from] HostError),

    #[error("manifest at {path} is not valid JSON: {source}")]
    ManifestParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure to compile the embedded manifest schema at process start.
#[derive(Debug, Error)]
#[error("manifest schema failed to compile: {0}")]
pub struct SchemaCompileError(pub String);

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_error_display() {
        let err = HostError::Response {
            status: 503,
            message: "upstream unavailable".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("503"));
        assert!(msg.contains("upstream unavailable"));
    }

    #[test]
    fn test_pipeline_error_from_host() {
        let err: PipelineError = HostError::Request("connection refused".to_string()).into();
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_manifest_parse_error_names_path() {
        let source = serde_json::from_slice::<serde_json::Value>(b"{").unwrap_err();
        let err = PipelineError::ManifestParse {
            path: "acme/widget/manifest.json".to_string(),
            source,
        };
        assert!(err.to_string().contains("acme/widget/manifest.json"));
    }
}
