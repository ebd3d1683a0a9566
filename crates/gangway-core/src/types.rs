//! Domain records shared across the validation pipeline.

use serde::{Deserialize, Serialize};

/// Repository coordinates on the hosting platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoRef {
    /// Owner (user or organization) login.
    pub owner: String,

    /// Repository name.
    pub name: String,
}

impl RepoRef {
    /// Create a new repository reference.
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// One file touched by a pull request. The path is repository-relative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFile {
    pub path: String,
}

impl ChangedFile {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// Pull request lifecycle state as reported by the hosting platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PullRequestState {
    Open,
    Closed,
}

/// Immutable description of one pull-request delivery.
///
/// Created once per webhook delivery and owned by the pipeline for the
/// duration of a single run; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestEvent {
    /// Pull request number.
    pub number: u64,

    /// Lifecycle state; only open pull requests are validated.
    pub state: PullRequestState,

    /// Head commit SHA under review.
    pub revision: String,

    /// Login of the pull request author.
    pub author_login: String,

    /// Target repository.
    pub repo: RepoRef,
}

impl PullRequestEvent {
    /// Whether this delivery should be validated at all.
    pub fn is_open(&self) -> bool {
        self.state == PullRequestState::Open
    }
}

/// Conclusion of one check as published to the hosting platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckConclusion {
    Success,
    ActionRequired,
}

/// The externally reported outcome of one check, immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Check name, stable across runs (e.g. "Folder", "Manifest").
    pub name: String,

    /// Published conclusion.
    pub conclusion: CheckConclusion,

    /// Human-readable headline.
    pub title: String,

    /// Failure specifics; empty for successful checks.
    pub summary: String,
}

impl CheckResult {
    /// A successful result with an empty summary.
    pub fn success(name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            conclusion: CheckConclusion::Success,
            title: title.into(),
            summary: String::new(),
        }
    }

    /// Whether this check concluded successfully.
    pub fn passed(&self) -> bool {
        self.conclusion == CheckConclusion::Success
    }
}

/// Category of an expected, user-facing validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Changed files span multiple folders or the repository root.
    FolderViolation,

    /// Author is not the plugin's declared maintainer.
    MaintainerViolation,

    /// No manifest file at the revision under review.
    ManifestMissing,

    /// Manifest violates the fixed schema.
    SchemaViolation,

    /// Manifest declares assets that are not present in the folder.
    AssetMissing,
}

/// Internal control-flow value produced by a failing check.
///
/// `cancel` marks failures severe enough that the remaining checks in the
/// same run are meaningless and must be skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    pub kind: FailureKind,
    pub title: String,
    pub summary: String,
    pub cancel: bool,
}

impl ValidationFailure {
    /// A failure that aborts the rest of the run.
    pub fn fatal(kind: FailureKind, title: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            summary: summary.into(),
            cancel: true,
        }
    }

    /// A failure reported alongside the remaining checks.
    pub fn advisory(
        kind: FailureKind,
        title: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            title: title.into(),
            summary: summary.into(),
            cancel: false,
        }
    }
}

/// Tagged result of one check: a reportable pass or a validation failure.
pub type CheckOutcome = Result<CheckResult, ValidationFailure>;

/// Aggregate outcome of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRun {
    /// Published check results, in step order.
    pub results: Vec<CheckResult>,

    /// Kind of the cancel-flagged failure that aborted the run, if any.
    pub fatal: Option<FailureKind>,

    /// Plugin folder the pull request was scoped to, once derived.
    pub folder: Option<String>,

    /// Whether the delivery was ignored (pull request not open).
    pub skipped: bool,
}

impl PipelineRun {
    /// Whether the run was aborted by a cancel-flagged failure.
    pub fn aborted(&self) -> bool {
        self.fatal.is_some()
    }

    /// Number of checks that passed.
    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.passed()).count()
    }

    /// Number of checks that required action.
    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.passed()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_ref_display() {
        let repo = RepoRef::new("acme", "marketplace");
        assert_eq!(repo.to_string(), "acme/marketplace");
    }

    #[test]
    fn test_check_result_success() {
        let result = CheckResult::success("Folder", "Plugin folder is correct");
        assert!(result.passed());
        assert!(result.summary.is_empty());
    }

    #[test]
    fn test_validation_failure_constructors() {
        let fatal = ValidationFailure::fatal(FailureKind::FolderViolation, "t", "s");
        assert!(fatal.cancel);

        let advisory = ValidationFailure::advisory(FailureKind::AssetMissing, "t", "s");
        assert!(!advisory.cancel);
    }

    #[test]
    fn test_pipeline_run_counts() {
        let run = PipelineRun {
            results: vec![
                CheckResult::success("Folder", "ok"),
                CheckResult {
                    name: "Files".to_string(),
                    conclusion: CheckConclusion::ActionRequired,
                    title: "Undefined files found".to_string(),
                    summary: "logo.png".to_string(),
                },
            ],
            fatal: None,
            folder: Some("acme/widget".to_string()),
            skipped: false,
        };

        assert_eq!(run.passed_count(), 1);
        assert_eq!(run.failed_count(), 1);
        assert!(!run.aborted());
    }

    #[test]
    fn test_conclusion_serializes_snake_case() {
        let json = serde_json::to_string(&CheckConclusion::ActionRequired).unwrap();
        assert_eq!(json, "\"action_required\"");
    }

    #[test]
    fn test_event_open_gate() {
        let event = PullRequestEvent {
            number: 7,
            state: PullRequestState::Closed,
            revision: "abc123".to_string(),
            author_login: "acme-dev".to_string(),
            repo: RepoRef::new("acme", "marketplace"),
        };
        assert!(!event.is_open());
    }
}
