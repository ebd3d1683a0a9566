//! Check pipeline orchestration.
//!
//! Runs the compliance checks for one pull request in a fixed order,
//! publishing a check run per step. A cancel-flagged failure aborts the
//! remaining steps; advisory failures are reported and the run continues.

use std::sync::Arc;

use tracing::{info, warn};

use crate::checks;
use crate::error::{PipelineError, Result};
use crate::hosting::{CheckReporter, RepoHost};
use crate::manifest::{self, ParsedManifest, MANIFEST_FILE};
use crate::schema::ManifestSchema;
use crate::types::{
    CheckConclusion, CheckOutcome, CheckResult, FailureKind, PipelineRun, PullRequestEvent,
    ValidationFailure,
};

/// The ordered compliance pipeline for one pull request.
///
/// Collaborators and the compiled schema are injected once at construction;
/// each `run` is an isolated pass over a single delivery, so one pipeline can
/// serve concurrent deliveries for distinct pull requests.
pub struct CheckPipeline {
    host: Arc<dyn RepoHost>,
    reporter: Arc<dyn CheckReporter>,
    schema: Arc<ManifestSchema>,
}

impl CheckPipeline {
    pub fn new(
        host: Arc<dyn RepoHost>,
        reporter: Arc<dyn CheckReporter>,
        schema: Arc<ManifestSchema>,
    ) -> Self {
        Self {
            host,
            reporter,
            schema,
        }
    }

    /// Validate one pull request and publish a check run per step.
    ///
    /// Deliveries for pull requests that are not open are a no-op. Expected
    /// validation failures become `action_required` results; collaborator
    /// faults and unparseable manifests propagate as `PipelineError` without
    /// producing a result.
    pub async fn run(&self, event: &PullRequestEvent) -> Result<PipelineRun> {
        if !event.is_open() {
            info!(pr = event.number, "ignoring delivery for non-open pull request");
            return Ok(PipelineRun {
                results: Vec::new(),
                fatal: None,
                folder: None,
                skipped: true,
            });
        }

        info!(
            pr = event.number,
            repo = %event.repo,
            revision = %event.revision,
            "starting validation run"
        );

        let mut results = Vec::new();
        let mut fatal = None;

        // Folder singularity. A violation here always cancels: without a
        // single plugin folder the remaining checks have nothing to operate on.
        let files = self
            .host
            .list_changed_files(&event.repo, event.number)
            .await?;
        let folder = match checks::check_folder(&files) {
            Ok((folder, result)) => {
                self.publish(event, result, &mut results).await?;
                folder
            }
            Err(failure) => {
                self.settle(event, checks::FOLDER_CHECK, Err(failure), &mut results, &mut fatal)
                    .await?;
                return Ok(PipelineRun {
                    results,
                    fatal,
                    folder: None,
                    skipped: false,
                });
            }
        };

        let manifest_path = format!("{folder}/{MANIFEST_FILE}");

        // Maintainer authorization runs against the pre-existing manifest on
        // the default branch; a brand new plugin has none to enforce.
        let existing = self.load_manifest(event, &manifest_path, None).await?;
        let outcome =
            checks::check_maintainer(existing.as_ref().map(|m| &m.doc), &event.author_login);
        if self
            .settle(event, checks::MAINTAINER_CHECK, outcome, &mut results, &mut fatal)
            .await?
        {
            return Ok(PipelineRun {
                results,
                fatal,
                folder: Some(folder),
                skipped: false,
            });
        }

        // Schema validation runs against the proposed manifest at the head
        // revision. Absence at this revision is itself a fatal outcome.
        let proposed = match self
            .load_manifest(event, &manifest_path, Some(&event.revision))
            .await?
        {
            Some(parsed) => parsed,
            None => {
                let failure = ValidationFailure::fatal(
                    FailureKind::ManifestMissing,
                    format!("{MANIFEST_FILE} not found"),
                    format!("The plugin folder does not contain a {MANIFEST_FILE} at this revision."),
                );
                self.settle(event, checks::MANIFEST_CHECK, Err(failure), &mut results, &mut fatal)
                    .await?;
                return Ok(PipelineRun {
                    results,
                    fatal,
                    folder: Some(folder),
                    skipped: false,
                });
            }
        };

        let outcome = checks::check_manifest_schema(&self.schema, &proposed.raw);
        if self
            .settle(event, checks::MANIFEST_CHECK, outcome, &mut results, &mut fatal)
            .await?
        {
            return Ok(PipelineRun {
                results,
                fatal,
                folder: Some(folder),
                skipped: false,
            });
        }

        // Asset reconciliation over the folder contents at the head revision.
        let folder_files = self
            .host
            .list_folder(&event.repo, &folder, Some(&event.revision))
            .await?;
        let outcome = checks::check_folder_files(&proposed.doc.versions, &folder_files);
        self.settle(event, checks::FILES_CHECK, outcome, &mut results, &mut fatal)
            .await?;

        let run = PipelineRun {
            results,
            fatal,
            folder: Some(folder),
            skipped: false,
        };
        info!(
            pr = event.number,
            passed = run.passed_count(),
            failed = run.failed_count(),
            "validation run finished"
        );
        Ok(run)
    }

    /// Publish a check outcome and record it. Returns `true` when a
    /// cancel-flagged failure must abort the run.
    async fn settle(
        &self,
        event: &PullRequestEvent,
        name: &str,
        outcome: CheckOutcome,
        results: &mut Vec<CheckResult>,
        fatal: &mut Option<FailureKind>,
    ) -> Result<bool> {
        match outcome {
            Ok(result) => {
                self.publish(event, result, results).await?;
                Ok(false)
            }
            Err(failure) => {
                if failure.cancel {
                    *fatal = Some(failure.kind);
                    warn!(
                        pr = event.number,
                        check = name,
                        kind = ?failure.kind,
                        "fatal validation failure"
                    );
                }
                let cancel = failure.cancel;
                let result = CheckResult {
                    name: name.to_string(),
                    conclusion: CheckConclusion::ActionRequired,
                    title: failure.title,
                    summary: failure.summary,
                };
                self.publish(event, result, results).await?;
                Ok(cancel)
            }
        }
    }

    /// Report a result to the platform, then append it to the run record.
    async fn publish(
        &self,
        event: &PullRequestEvent,
        result: CheckResult,
        results: &mut Vec<CheckResult>,
    ) -> Result<()> {
        self.reporter
            .report(&event.repo, &event.revision, &result)
            .await?;
        results.push(result);
        Ok(())
    }

    /// Fetch and parse a manifest, treating absence as data.
    async fn load_manifest(
        &self,
        event: &PullRequestEvent,
        path: &str,
        revision: Option<&str>,
    ) -> Result<Option<ParsedManifest>> {
        let bytes = match self.host.file_content(&event.repo, path, revision).await? {
            Some(bytes) => bytes,
            None => return Ok(None),
        };

        let parsed = manifest::parse(&bytes).map_err(|source| PipelineError::ManifestParse {
            path: path.to_string(),
            source,
        })?;
        Ok(Some(parsed))
    }
}
