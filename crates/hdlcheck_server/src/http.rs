//! HTTP/JSON transport, the alternative to LSP for thin editor plugins.

use crate::context::ServerContext;
use axum::extract::{Form, State};
use axum::routing::post;
use axum::{Json, Router};
use hdlcheck_diagnostics::{Diagnostic, UiMessage};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Notify;

/// State shared by every endpoint handler.
pub struct HttpState {
    context: Arc<ServerContext>,
    shutdown: Notify,
}

#[derive(Deserialize)]
struct ProjectForm {
    project_file: Option<String>,
}

#[derive(Deserialize)]
struct MessagesForm {
    project_file: Option<String>,
    path: String,
}

#[derive(Serialize, Default)]
struct Reply {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    messages: Vec<Diagnostic>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    ui_messages: Vec<UiMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    info: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn error_reply(err: impl std::fmt::Display) -> Json<Reply> {
    Json(Reply {
        error: Some(err.to_string()),
        ..Reply::default()
    })
}

/// Fetches (or creates) a project without blocking the executor: first-time
/// creation probes the configured compiler.
async fn project_for(
    state: &Arc<HttpState>,
    project_file: Option<String>,
) -> std::io::Result<hdlcheck_project::Project> {
    let context = state.context.clone();
    let key = project_file.map(PathBuf::from);
    tokio::task::spawn_blocking(move || context.get_or_create(key))
        .await
        .map_err(|err| std::io::Error::other(err.to_string()))?
}

/// Builds the endpoint router.
pub fn router(state: Arc<HttpState>) -> Router {
    Router::new()
        .route("/get_diagnose_info", post(get_diagnose_info))
        .route("/get_messages_by_path", post(get_messages_by_path))
        .route("/get_ui_messages", post(get_ui_messages))
        .route("/rebuild_project", post(rebuild_project))
        .route("/shutdown", post(shutdown))
        .with_state(state)
}

async fn get_diagnose_info(
    State(state): State<Arc<HttpState>>,
    Form(form): Form<ProjectForm>,
) -> Json<Reply> {
    let mut info = vec![
        format!("hdlcheck version: {}", env!("CARGO_PKG_VERSION")),
        format!("Server PID: {}", std::process::id()),
    ];
    match project_for(&state, form.project_file).await {
        Ok(project) => info.extend(project.diagnose_info()),
        Err(err) => return error_reply(err),
    }
    Json(Reply {
        info,
        ..Reply::default()
    })
}

async fn get_messages_by_path(
    State(state): State<Arc<HttpState>>,
    Form(form): Form<MessagesForm>,
) -> Json<Reply> {
    let project = match project_for(&state, form.project_file).await {
        Ok(project) => project,
        Err(err) => return error_reply(err),
    };
    let path = PathBuf::from(form.path);
    let messages =
        tokio::task::spawn_blocking(move || project.messages_for(&path, false))
            .await
            .unwrap_or_default();
    Json(Reply {
        messages,
        ..Reply::default()
    })
}

async fn get_ui_messages(
    State(state): State<Arc<HttpState>>,
    Form(form): Form<ProjectForm>,
) -> Json<Reply> {
    let project = match project_for(&state, form.project_file).await {
        Ok(project) => project,
        Err(err) => return error_reply(err),
    };
    Json(Reply {
        ui_messages: project.ui_messages(),
        ..Reply::default()
    })
}

async fn rebuild_project(
    State(state): State<Arc<HttpState>>,
    Form(form): Form<ProjectForm>,
) -> Json<Reply> {
    let project = match project_for(&state, form.project_file).await {
        Ok(project) => project,
        Err(err) => return error_reply(err),
    };
    let started = project.build_by_dependency();
    Json(Reply {
        info: vec![if started {
            "rebuild started".to_string()
        } else {
            "project is already building".to_string()
        }],
        ..Reply::default()
    })
}

async fn shutdown(State(state): State<Arc<HttpState>>) -> Json<Reply> {
    info!("shutdown requested over http");
    state.context.shutdown();
    state.shutdown.notify_one();
    Json(Reply {
        info: vec!["shutting down".to_string()],
        ..Reply::default()
    })
}

/// Serves the HTTP endpoints until `/shutdown` is hit.
pub async fn run(context: Arc<ServerContext>, addr: &str) -> std::io::Result<()> {
    let state = Arc::new(HttpState {
        context,
        shutdown: Notify::new(),
    });
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("http transport listening on {addr}");

    let wait_state = state.clone();
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { wait_state.shutdown.notified().await })
        .await
}
