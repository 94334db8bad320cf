//! Language Server Protocol transport on top of tower-lsp.

use crate::context::ServerContext;
use hdlcheck_diagnostics::Severity;
use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService, Server};

/// Quiet window before an editor-initiated lint actually runs. Only the
/// last request for a URI within the window is served.
const LINT_DEBOUNCE: Duration = Duration::from_millis(500);

/// State shared between the backend and its spawned lint tasks.
struct Shared {
    context: Arc<ServerContext>,
    project_file: RwLock<Option<PathBuf>>,
    /// Per-URI generation counters implementing the debounce.
    lint_generations: Mutex<HashMap<Url, Arc<AtomicU64>>>,
}

/// The LSP backend: one per editor connection.
pub struct Backend {
    client: Client,
    shared: Arc<Shared>,
    open_documents: Mutex<HashSet<Url>>,
}

impl Backend {
    /// Creates a backend over a shared server context.
    pub fn new(client: Client, context: Arc<ServerContext>) -> Self {
        Self {
            client,
            shared: Arc::new(Shared {
                context,
                project_file: RwLock::new(None),
                lint_generations: Mutex::new(HashMap::new()),
            }),
            open_documents: Mutex::new(HashSet::new()),
        }
    }

    fn extract_project_file(&self, options: Option<&serde_json::Value>) {
        let configured = options
            .and_then(|value| value.get("project_file"))
            .and_then(|value| value.as_str())
            .map(PathBuf::from);
        if let Some(path) = configured {
            info!("using project file '{}'", path.display());
            *self.shared.project_file.write().unwrap() = Some(path);
        }
    }

    /// Schedules a debounced lint of one document without blocking the
    /// notification loop.
    fn schedule_lint(&self, uri: Url) {
        let generation = {
            let mut generations = self.shared.lint_generations.lock().unwrap();
            let counter = generations
                .entry(uri.clone())
                .or_insert_with(|| Arc::new(AtomicU64::new(0)))
                .clone();
            counter.fetch_add(1, Ordering::SeqCst) + 1
        };

        let shared = self.shared.clone();
        let client = self.client.clone();
        tokio::spawn(async move {
            tokio::time::sleep(LINT_DEBOUNCE).await;

            let still_current = {
                let generations = shared.lint_generations.lock().unwrap();
                generations
                    .get(&uri)
                    .map(|counter| counter.load(Ordering::SeqCst) == generation)
                    .unwrap_or(false)
            };
            if still_current {
                lint_now(shared, client, uri).await;
            } else {
                debug!("debounced lint of '{uri}' superseded");
            }
        });
    }
}

/// Runs the analyzer for one document and publishes the result.
async fn lint_now(shared: Arc<Shared>, client: Client, uri: Url) {
    let path = match uri.to_file_path() {
        Ok(path) => path,
        Err(()) => {
            warn!("ignoring non-file uri '{uri}'");
            return;
        }
    };

    let project_file = shared.project_file.read().unwrap().clone();
    let check_path = path.clone();
    let worker = shared.clone();
    // Project creation may probe a compiler; keep it off the executor
    // together with the analysis itself.
    let result = tokio::task::spawn_blocking(move || {
        worker
            .context
            .get_or_create(project_file)
            .map(|project| project.messages_for(&check_path, false))
    })
    .await;
    let diagnostics = match result {
        Ok(Ok(diagnostics)) => diagnostics,
        Ok(Err(err)) => {
            client
                .show_message(MessageType::ERROR, format!("hdlcheck: {err}"))
                .await;
            return;
        }
        Err(_) => return,
    };

    let published: Vec<Diagnostic> = diagnostics
        .iter()
        .filter(|diag| match &diag.path {
            Some(diag_path) => hdlcheck_common::path::same_file(diag_path, &path),
            None => true,
        })
        .map(to_lsp_diagnostic)
        .collect();

    debug!("publishing {} diagnostics for '{uri}'", published.len());
    client.publish_diagnostics(uri, published, None).await;
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        self.extract_project_file(params.initialization_options.as_ref());
        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                ..ServerCapabilities::default()
            },
            server_info: Some(ServerInfo {
                name: "hdlcheck".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        info!("language client initialized");
    }

    async fn shutdown(&self) -> Result<()> {
        self.shared.context.shutdown();
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        self.open_documents.lock().unwrap().insert(uri.clone());
        self.schedule_lint(uri);
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        self.schedule_lint(params.text_document.uri);
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        self.schedule_lint(params.text_document.uri);
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        self.open_documents.lock().unwrap().remove(&uri);
        self.shared.lint_generations.lock().unwrap().remove(&uri);
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        let previous = self.shared.project_file.read().unwrap().clone();
        self.extract_project_file(Some(&params.settings));
        let current = self.shared.project_file.read().unwrap().clone();
        if previous != current {
            info!("project file changed, resetting diagnostics");
            self.shared.context.remove(&previous);
            let open: Vec<Url> = self.open_documents.lock().unwrap().iter().cloned().collect();
            for uri in open {
                self.client
                    .publish_diagnostics(uri.clone(), Vec::new(), None)
                    .await;
                self.schedule_lint(uri);
            }
        }
    }

    async fn did_change_watched_files(&self, params: DidChangeWatchedFilesParams) {
        // Files changed on disk invalidate anything depending on them:
        // re-lint every open document that was not itself in the change
        // set (those arrive through didChange).
        let changed: HashSet<Url> = params.changes.into_iter().map(|c| c.uri).collect();
        let open: Vec<Url> = self.open_documents.lock().unwrap().iter().cloned().collect();
        for uri in open {
            if !changed.contains(&uri) {
                self.schedule_lint(uri);
            }
        }
    }
}

/// Translates an analyzer diagnostic to the LSP shape.
fn to_lsp_diagnostic(diag: &hdlcheck_diagnostics::Diagnostic) -> Diagnostic {
    let line = diag.line.unwrap_or(1).saturating_sub(1);
    let column = diag.column.unwrap_or(1).saturating_sub(1);
    Diagnostic {
        range: Range {
            start: Position::new(line, column),
            end: Position::new(line, u32::MAX),
        },
        severity: Some(to_lsp_severity(diag.severity)),
        code: diag.code.clone().map(NumberOrString::String),
        source: Some(diag.checker.clone()),
        message: diag.text.clone(),
        ..Diagnostic::default()
    }
}

fn to_lsp_severity(severity: Severity) -> DiagnosticSeverity {
    match severity {
        Severity::Info | Severity::StyleInfo => DiagnosticSeverity::HINT,
        Severity::StyleWarning | Severity::StyleError => DiagnosticSeverity::INFORMATION,
        Severity::Warning => DiagnosticSeverity::WARNING,
        Severity::Error | Severity::None => DiagnosticSeverity::ERROR,
    }
}

/// Serves the LSP protocol over stdio until the client disconnects.
pub async fn run_stdio(context: Arc<ServerContext>) {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();
    let (service, socket) = LspService::new(move |client| Backend::new(client, context.clone()));
    Server::new(stdin, stdout, socket).serve(service).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use hdlcheck_diagnostics::Diagnostic as CheckerDiagnostic;

    #[test]
    fn severity_mapping() {
        assert_eq!(to_lsp_severity(Severity::Info), DiagnosticSeverity::HINT);
        assert_eq!(
            to_lsp_severity(Severity::StyleInfo),
            DiagnosticSeverity::HINT
        );
        assert_eq!(
            to_lsp_severity(Severity::StyleWarning),
            DiagnosticSeverity::INFORMATION
        );
        assert_eq!(
            to_lsp_severity(Severity::StyleError),
            DiagnosticSeverity::INFORMATION
        );
        assert_eq!(
            to_lsp_severity(Severity::Warning),
            DiagnosticSeverity::WARNING
        );
        assert_eq!(to_lsp_severity(Severity::Error), DiagnosticSeverity::ERROR);
        assert_eq!(to_lsp_severity(Severity::None), DiagnosticSeverity::ERROR);
    }

    #[test]
    fn diagnostic_translation_is_zero_based() {
        let diag = CheckerDiagnostic::error("expecting ';'")
            .with_checker("msim")
            .with_line(12)
            .with_column(4)
            .with_code("vcom-1576");
        let lsp = to_lsp_diagnostic(&diag);
        assert_eq!(lsp.range.start.line, 11);
        assert_eq!(lsp.range.start.character, 3);
        assert_eq!(lsp.source.as_deref(), Some("msim"));
        assert_eq!(
            lsp.code,
            Some(NumberOrString::String("vcom-1576".to_string()))
        );
    }

    #[test]
    fn positionless_diagnostics_land_on_line_one() {
        let diag = CheckerDiagnostic::warning("no position");
        let lsp = to_lsp_diagnostic(&diag);
        assert_eq!(lsp.range.start.line, 0);
        assert_eq!(lsp.range.start.character, 0);
    }
}
