//! GitHub REST adapter for Gangway.
//!
//! Implements the `gangway-core` hosting traits against the GitHub REST API:
//! change-set listing, content reads, check-run creation and the caller-side
//! pull-request actions.

pub mod client;

pub use client::{GitHubClient, GitHubConfig};
