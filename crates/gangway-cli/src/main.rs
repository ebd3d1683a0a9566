//! Gangway CLI.
//!
//! ## Commands
//!
//! - `validate`: Run the compliance pipeline against an open pull request
//! - `schema`: Validate a local manifest file against the embedded schema

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use gangway_core::{CheckPipeline, ManifestSchema, RepoRef, SchemaIssue};
use gangway_github::GitHubClient;

#[derive(Parser)]
#[command(name = "gangway")]
#[command(author = "Gangway Maintainers")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Pull-request compliance gate for the plugin marketplace", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON instead of human-readable output
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate an open pull request against the marketplace rules
    Validate {
        /// Repository owner
        #[arg(long)]
        owner: String,

        /// Repository name
        #[arg(long)]
        repo: String,

        /// Pull request number
        #[arg(long)]
        pr: u64,
    },

    /// Validate a local manifest file against the embedded schema
    Schema {
        /// Path to the manifest file
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    match cli.command {
        Commands::Validate { owner, repo, pr } => cmd_validate(&owner, &repo, pr, cli.json).await,
        Commands::Schema { file } => cmd_schema(&file, cli.json),
    }
}

fn init_tracing(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

async fn cmd_validate(owner: &str, repo: &str, pr: u64, json: bool) -> Result<()> {
    let github = Arc::new(GitHubClient::from_env()?);
    let schema = Arc::new(ManifestSchema::compile()?);
    let pipeline = CheckPipeline::new(github.clone(), github.clone(), schema);

    let repo_ref = RepoRef::new(owner, repo);
    let event = github
        .pull_request_event(&repo_ref, pr)
        .await
        .with_context(|| format!("failed to fetch pull request {repo_ref}#{pr}"))?;
    let run = pipeline.run(&event).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&run)?);
    } else if run.skipped {
        println!("pull request {repo_ref}#{pr} is not open, nothing to validate");
    } else {
        for result in &run.results {
            let mark = if result.passed() { "ok" } else { "action required" };
            println!("{}: {} [{mark}]", result.name, result.title);
            for line in result.summary.lines() {
                println!("    {line}");
            }
        }
        if run.aborted() {
            println!("run aborted, remaining checks were skipped");
        }
    }

    if run.failed_count() > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_schema(file: &Path, json: bool) -> Result<()> {
    let issues = schema_issues(file)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&issues)?);
    } else if issues.is_empty() {
        println!("{}: manifest is valid", file.display());
    } else {
        println!("{}: {} issue(s) found", file.display(), issues.len());
        for issue in &issues {
            let path = if issue.path.is_empty() {
                "/"
            } else {
                issue.path.as_str()
            };
            println!("    {}: {}", path, issue.message);
        }
    }

    if !issues.is_empty() {
        std::process::exit(1);
    }
    Ok(())
}

fn schema_issues(file: &Path) -> Result<Vec<SchemaIssue>> {
    let bytes =
        std::fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    let manifest: serde_json::Value = serde_json::from_slice(&bytes)
        .with_context(|| format!("{} is not valid JSON", file.display()))?;
    let schema = ManifestSchema::compile()?;
    Ok(schema.validate(&manifest))
}
