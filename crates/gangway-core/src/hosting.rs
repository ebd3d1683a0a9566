//! Hosting-platform collaborator traits.
//!
//! The pipeline consumes the platform exclusively through these traits:
//! - `RepoHost`: change-set listing and repository content reads
//! - `CheckReporter`: persisted check-run creation
//! - `PlatformActions`: caller-side mutations (comments, closing)
//!
//! All traits are async and platform-agnostic. In-memory fakes are provided
//! for testing via the `fakes` module.

use async_trait::async_trait;

use crate::error::HostError;
use crate::types::{ChangedFile, CheckResult, RepoRef};

/// Result type for host operations.
pub type HostResult<T> = std::result::Result<T, HostError>;

/// Read access to pull-request change-sets and repository content.
///
/// Contract:
/// - `revision: None` addresses the repository's default branch.
/// - `file_content` returns `Ok(None)` when the path does not exist at the
///   given revision; absence is data, never an error.
/// - `list_folder` returns an empty listing for a missing folder.
#[async_trait]
pub trait RepoHost: Send + Sync {
    /// List the files touched by a pull request.
    async fn list_changed_files(
        &self,
        repo: &RepoRef,
        pull_number: u64,
    ) -> HostResult<Vec<ChangedFile>>;

    /// Fetch the raw content of a file at a revision.
    async fn file_content(
        &self,
        repo: &RepoRef,
        path: &str,
        revision: Option<&str>,
    ) -> HostResult<Option<Vec<u8>>>;

    /// List the file names directly inside a folder at a revision.
    async fn list_folder(
        &self,
        repo: &RepoRef,
        path: &str,
        revision: Option<&str>,
    ) -> HostResult<Vec<String>>;
}

/// Publishes one persisted check run per produced `CheckResult`.
///
/// The pipeline calls this once per result, in step order, as results are
/// produced; implementations must not reorder them.
#[async_trait]
pub trait CheckReporter: Send + Sync {
    async fn report(
        &self,
        repo: &RepoRef,
        revision: &str,
        result: &CheckResult,
    ) -> HostResult<()>;
}

/// Platform mutations a *caller* may take in response to a fatal failure,
/// e.g. commenting on and closing a mis-scoped pull request.
///
/// The pipeline itself never invokes these; check reporting is its only
/// platform mutation.
#[async_trait]
pub trait PlatformActions: Send + Sync {
    /// Post a comment on a pull request.
    async fn post_comment(&self, repo: &RepoRef, pull_number: u64, body: &str) -> HostResult<()>;

    /// Close a pull request without merging.
    async fn close_pull_request(&self, repo: &RepoRef, pull_number: u64) -> HostResult<()>;
}
