//! In-memory fakes for the hosting traits (testing only).
//!
//! Provides `MemoryRepoHost`, `RecordingReporter` and `RecordingActions` that
//! satisfy the trait contracts without any network access.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::hosting::{CheckReporter, HostResult, PlatformActions, RepoHost};
use crate::types::{ChangedFile, CheckResult, RepoRef};

// ---------------------------------------------------------------------------
// MemoryRepoHost
// ---------------------------------------------------------------------------

/// In-memory repository snapshot serving both the head revision and the
/// default branch.
#[derive(Debug, Default)]
pub struct MemoryRepoHost {
    changed_files: Vec<ChangedFile>,
    head: BTreeMap<String, Vec<u8>>,
    default_branch: BTreeMap<String, Vec<u8>>,
}

impl MemoryRepoHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a path to the pull request's change-set.
    pub fn with_changed_file(mut self, path: &str) -> Self {
        self.changed_files.push(ChangedFile::new(path));
        self
    }

    /// Place a file at the head revision.
    pub fn with_head_file(mut self, path: &str, content: &[u8]) -> Self {
        self.head.insert(path.to_string(), content.to_vec());
        self
    }

    /// Place a file on the default branch (the pre-existing state).
    pub fn with_default_branch_file(mut self, path: &str, content: &[u8]) -> Self {
        self.default_branch.insert(path.to_string(), content.to_vec());
        self
    }

    fn tree(&self, revision: Option<&str>) -> &BTreeMap<String, Vec<u8>> {
        match revision {
            Some(_) => &self.head,
            None => &self.default_branch,
        }
    }
}

#[async_trait]
impl RepoHost for MemoryRepoHost {
    async fn list_changed_files(
        &self,
        _repo: &RepoRef,
        _pull_number: u64,
    ) -> HostResult<Vec<ChangedFile>> {
        Ok(self.changed_files.clone())
    }

    async fn file_content(
        &self,
        _repo: &RepoRef,
        path: &str,
        revision: Option<&str>,
    ) -> HostResult<Option<Vec<u8>>> {
        Ok(self.tree(revision).get(path).cloned())
    }

    async fn list_folder(
        &self,
        _repo: &RepoRef,
        path: &str,
        revision: Option<&str>,
    ) -> HostResult<Vec<String>> {
        let prefix = format!("{}/", path.trim_end_matches('/'));
        Ok(self
            .tree(revision)
            .keys()
            .filter_map(|stored| stored.strip_prefix(&prefix))
            .filter(|rest| !rest.contains('/'))
            .map(str::to_string)
            .collect())
    }
}

// ---------------------------------------------------------------------------
// RecordingReporter
// ---------------------------------------------------------------------------

/// Reporter that records every published check run in publication order.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    reported: Mutex<Vec<CheckResult>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything reported so far, in publication order.
    pub fn reported(&self) -> Vec<CheckResult> {
        self.reported.lock().unwrap().clone()
    }
}

#[async_trait]
impl CheckReporter for RecordingReporter {
    async fn report(
        &self,
        _repo: &RepoRef,
        _revision: &str,
        result: &CheckResult,
    ) -> HostResult<()> {
        self.reported.lock().unwrap().push(result.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RecordingActions
// ---------------------------------------------------------------------------

/// Records caller-side platform actions.
#[derive(Debug, Default)]
pub struct RecordingActions {
    comments: Mutex<Vec<(u64, String)>>,
    closed: Mutex<Vec<u64>>,
}

impl RecordingActions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Comments posted so far as `(pull_number, body)` pairs.
    pub fn comments(&self) -> Vec<(u64, String)> {
        self.comments.lock().unwrap().clone()
    }

    /// Pull request numbers closed so far.
    pub fn closed(&self) -> Vec<u64> {
        self.closed.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlatformActions for RecordingActions {
    async fn post_comment(
        &self,
        _repo: &RepoRef,
        pull_number: u64,
        body: &str,
    ) -> HostResult<()> {
        self.comments
            .lock()
            .unwrap()
            .push((pull_number, body.to_string()));
        Ok(())
    }

    async fn close_pull_request(&self, _repo: &RepoRef, pull_number: u64) -> HostResult<()> {
        self.closed.lock().unwrap().push(pull_number);
        Ok(())
    }
}
