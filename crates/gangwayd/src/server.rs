//! Webhook HTTP server.
//!
//! Receives `pull_request` deliveries, verifies their signature, and spawns
//! one pipeline run per accepted delivery. The delivery is acknowledged with
//! 202 before validation finishes; results land on the pull request as check
//! runs, not in the HTTP response.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use gangway_core::{
    CheckPipeline, FailureKind, PlatformActions, PullRequestEvent, PullRequestState, RepoRef,
};

use crate::signature::verify_signature;

/// Comment posted before closing a mis-scoped pull request.
const FOLDER_VIOLATION_COMMENT: &str = "This pull request changes files outside a single plugin \
     folder and was closed automatically. Please open one pull request per plugin.";

/// Shared state for the webhook routes.
pub struct AppState {
    pub pipeline: CheckPipeline,
    pub actions: Arc<dyn PlatformActions>,
    pub webhook_secret: Option<String>,
}

/// Build the daemon router (shared between production startup and tests).
pub fn build_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz_handler))
        .route("/webhook", post(webhook_handler))
        .with_state(state)
}

async fn healthz_handler() -> StatusCode {
    StatusCode::OK
}

async fn webhook_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    if let Some(secret) = &state.webhook_secret {
        let signature = headers
            .get("x-hub-signature-256")
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        if !verify_signature(&body, signature, secret) {
            warn!("webhook signature verification failed");
            return StatusCode::UNAUTHORIZED;
        }
    }

    let event_kind = headers
        .get("x-github-event")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if event_kind != "pull_request" {
        debug!(event = event_kind, "ignoring non-pull_request event");
        return StatusCode::NO_CONTENT;
    }

    let payload: WebhookPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(error = %err, "undecodable webhook payload");
            return StatusCode::BAD_REQUEST;
        }
    };

    if !is_handled_action(&payload.action) {
        debug!(action = %payload.action, "ignoring pull_request action");
        return StatusCode::NO_CONTENT;
    }

    let delivery = headers
        .get("x-github-delivery")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let event = payload.into_event();
    tokio::spawn(run_delivery(state, event, delivery));

    StatusCode::ACCEPTED
}

/// Pull_request actions that warrant a validation run.
fn is_handled_action(action: &str) -> bool {
    matches!(action, "opened" | "synchronize" | "reopened")
}

async fn run_delivery(state: Arc<AppState>, event: PullRequestEvent, delivery: String) {
    info!(delivery = %delivery, pr = event.number, repo = %event.repo, "processing delivery");

    let run = match state.pipeline.run(&event).await {
        Ok(run) => run,
        Err(err) => {
            error!(delivery = %delivery, pr = event.number, error = %err, "validation run failed");
            return;
        }
    };

    // A mis-scoped pull request is commented on and closed outright. This
    // lives here rather than in the pipeline so that check reporting remains
    // the pipeline's only platform mutation.
    if run.fatal == Some(FailureKind::FolderViolation) {
        if let Err(err) = state
            .actions
            .post_comment(&event.repo, event.number, FOLDER_VIOLATION_COMMENT)
            .await
        {
            error!(delivery = %delivery, error = %err, "failed to comment on pull request");
        }
        if let Err(err) = state
            .actions
            .close_pull_request(&event.repo, event.number)
            .await
        {
            error!(delivery = %delivery, error = %err, "failed to close pull request");
        }
    }
}

#[derive(Debug, Deserialize)]
struct WebhookPayload {
    action: String,
    pull_request: PullRequestPayload,
}

#[derive(Debug, Deserialize)]
struct PullRequestPayload {
    number: u64,
    state: String,
    head: HeadPayload,
    user: UserPayload,
    base: BasePayload,
}

#[derive(Debug, Deserialize)]
struct HeadPayload {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct UserPayload {
    login: String,
}

#[derive(Debug, Deserialize)]
struct BasePayload {
    repo: RepoPayload,
}

#[derive(Debug, Deserialize)]
struct RepoPayload {
    name: String,
    owner: OwnerPayload,
}

#[derive(Debug, Deserialize)]
struct OwnerPayload {
    login: String,
}

impl WebhookPayload {
    fn into_event(self) -> PullRequestEvent {
        let pr = self.pull_request;
        let state = if pr.state == "open" {
            PullRequestState::Open
        } else {
            PullRequestState::Closed
        };
        PullRequestEvent {
            number: pr.number,
            state,
            revision: pr.head.sha,
            author_login: pr.user.login,
            repo: RepoRef::new(pr.base.repo.owner.login, pr.base.repo.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gangway_core::fakes::{MemoryRepoHost, RecordingActions, RecordingReporter};
    use gangway_core::ManifestSchema;

    fn state_with_host(host: MemoryRepoHost) -> (Arc<AppState>, Arc<RecordingActions>) {
        let actions = Arc::new(RecordingActions::new());
        let schema = Arc::new(ManifestSchema::compile().expect("schema must compile"));
        let pipeline = CheckPipeline::new(
            Arc::new(host),
            Arc::new(RecordingReporter::new()),
            schema,
        );
        let state = Arc::new(AppState {
            pipeline,
            actions: actions.clone(),
            webhook_secret: None,
        });
        (state, actions)
    }

    fn open_event() -> PullRequestEvent {
        PullRequestEvent {
            number: 42,
            state: PullRequestState::Open,
            revision: "abc123".to_string(),
            author_login: "acme-dev".to_string(),
            repo: RepoRef::new("acme", "marketplace"),
        }
    }

    #[tokio::test]
    async fn test_folder_violation_comments_and_closes() {
        let host = MemoryRepoHost::new()
            .with_changed_file("acme/widget/manifest.json")
            .with_changed_file("acme/gadget/manifest.json");
        let (state, actions) = state_with_host(host);

        run_delivery(state, open_event(), "delivery-1".to_string()).await;

        let comments = actions.comments();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].0, 42);
        assert_eq!(actions.closed(), vec![42]);
    }

    #[tokio::test]
    async fn test_compliant_run_leaves_pull_request_open() {
        let manifest = serde_json::to_vec(&serde_json::json!({
            "maintainer": "acme-dev",
            "versions": [{ "version": "1.0.0" }]
        }))
        .unwrap();
        let host = MemoryRepoHost::new()
            .with_changed_file("acme/widget/manifest.json")
            .with_head_file("acme/widget/manifest.json", &manifest);
        let (state, actions) = state_with_host(host);

        run_delivery(state, open_event(), "delivery-2".to_string()).await;

        assert!(actions.comments().is_empty());
        assert!(actions.closed().is_empty());
    }

    #[test]
    fn test_handled_actions() {
        assert!(is_handled_action("opened"));
        assert!(is_handled_action("synchronize"));
        assert!(is_handled_action("reopened"));
        assert!(!is_handled_action("closed"));
        assert!(!is_handled_action("labeled"));
    }

    #[test]
    fn test_payload_maps_to_event() {
        let payload: WebhookPayload = serde_json::from_value(serde_json::json!({
            "action": "opened",
            "pull_request": {
                "number": 42,
                "state": "open",
                "head": { "sha": "abc123" },
                "user": { "login": "acme-dev" },
                "base": {
                    "repo": {
                        "name": "marketplace",
                        "owner": { "login": "acme" }
                    }
                }
            }
        }))
        .expect("payload should decode");

        let event = payload.into_event();
        assert_eq!(event.number, 42);
        assert_eq!(event.state, PullRequestState::Open);
        assert_eq!(event.revision, "abc123");
        assert_eq!(event.author_login, "acme-dev");
        assert_eq!(event.repo, RepoRef::new("acme", "marketplace"));
    }

    #[test]
    fn test_unknown_state_maps_to_closed() {
        let payload: WebhookPayload = serde_json::from_value(serde_json::json!({
            "action": "opened",
            "pull_request": {
                "number": 1,
                "state": "merged",
                "head": { "sha": "abc" },
                "user": { "login": "dev" },
                "base": { "repo": { "name": "r", "owner": { "login": "o" } } }
            }
        }))
        .expect("payload should decode");
        assert_eq!(payload.into_event().state, PullRequestState::Closed);
    }
}
