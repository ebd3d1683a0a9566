//! Gangway core - pull-request compliance pipeline for the plugin marketplace.
//!
//! Provides the ordered check pipeline that:
//! - Scopes a pull request to exactly one plugin folder
//! - Enforces maintainer authorization against the pre-existing manifest
//! - Validates the proposed manifest against the fixed schema
//! - Reconciles declared readme/image assets with the folder contents
//!
//! The hosting platform is consumed exclusively through the traits in
//! `hosting`; in-memory fakes for them live in `fakes`.

pub mod checks;
pub mod error;
pub mod fakes;
pub mod hosting;
pub mod manifest;
pub mod pipeline;
pub mod schema;
pub mod types;

// Re-export key types
pub use error::{HostError, PipelineError, Result, SchemaCompileError};
pub use hosting::{CheckReporter, HostResult, PlatformActions, RepoHost};
pub use manifest::{ManifestDocument, ParsedManifest, VersionEntry, MANIFEST_FILE};
pub use pipeline::CheckPipeline;
pub use schema::{ManifestSchema, SchemaIssue, MANIFEST_SCHEMA};
pub use types::{
    ChangedFile, CheckConclusion, CheckOutcome, CheckResult, FailureKind, PipelineRun,
    PullRequestEvent, PullRequestState, RepoRef, ValidationFailure,
};
