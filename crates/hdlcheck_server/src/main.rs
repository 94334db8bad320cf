//! hdlcheck — background analysis daemon for VHDL and (System)Verilog
//! projects.
//!
//! Serves editors over LSP (`hdlcheck lsp`) or HTTP (`hdlcheck serve`),
//! runs one-shot batch builds (`hdlcheck build`), and exposes the static
//! linter standalone (`hdlcheck lint`).

mod context;
mod http;
mod lsp;

use clap::{Parser, Subcommand};
use context::ServerContext;
use hdlcheck_project::{has_errors, Project};
use log::error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

/// hdlcheck — HDL project checker daemon.
#[derive(Parser, Debug)]
#[command(name = "hdlcheck", version, about = "HDL code checker daemon")]
struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// The subcommand to run.
    #[command(subcommand)]
    command: Command,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the Language Server Protocol over stdio.
    Lsp,
    /// Serve the HTTP/JSON endpoints.
    Serve {
        /// Address to bind.
        #[arg(long, default_value = "127.0.0.1:50000")]
        addr: String,
    },
    /// Run a full dependency-ordered build and print its diagnostics.
    Build {
        /// Path to the project file.
        #[arg(short, long)]
        project: PathBuf,
    },
    /// Run only the static style checks on the given files.
    Lint {
        /// Files to check.
        files: Vec<PathBuf>,
    },
}

fn init_logging(cli: &Cli, to_stderr: bool) -> Option<flexi_logger::LoggerHandle> {
    let level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    let logger = flexi_logger::Logger::try_with_str(level);
    let result = match logger {
        Ok(logger) if to_stderr => logger.log_to_stderr().start(),
        Ok(logger) => logger.start(),
        Err(err) => {
            eprintln!("failed to configure logging: {err}");
            return None;
        }
    };
    match result {
        Ok(handle) => Some(handle),
        Err(err) => {
            eprintln!("failed to start logging: {err}");
            None
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    // Stdout belongs to the protocol in LSP mode. The handle must stay
    // alive for the whole run or logging stops.
    let _logger = init_logging(&cli, matches!(cli.command, Command::Lsp));

    match cli.command {
        Command::Lsp => match tokio::runtime::Runtime::new() {
            Ok(runtime) => {
                runtime.block_on(lsp::run_stdio(Arc::new(ServerContext::new())));
                ExitCode::SUCCESS
            }
            Err(err) => {
                error!("failed to start async runtime: {err}");
                ExitCode::FAILURE
            }
        },
        Command::Serve { addr } => match tokio::runtime::Runtime::new() {
            Ok(runtime) => {
                match runtime.block_on(http::run(Arc::new(ServerContext::new()), &addr)) {
                    Ok(()) => ExitCode::SUCCESS,
                    Err(err) => {
                        error!("http transport failed: {err}");
                        ExitCode::FAILURE
                    }
                }
            }
            Err(err) => {
                error!("failed to start async runtime: {err}");
                ExitCode::FAILURE
            }
        },
        Command::Build { project } => run_build(project),
        Command::Lint { files } => run_lint(&files),
    }
}

/// One-shot batch build. Exit code 0 on success, 1 when any diagnostic has
/// error severity, 2 on configuration failure.
fn run_build(project_file: PathBuf) -> ExitCode {
    let project = match Project::new(Some(project_file)) {
        Ok(project) => project,
        Err(err) => {
            error!("failed to create project: {err}");
            return ExitCode::from(2);
        }
    };
    if let Err(err) = project.setup() {
        error!("configuration error: {err}");
        return ExitCode::from(2);
    }

    let diagnostics = project.run_full_build();
    for diag in &diagnostics {
        let location = match (&diag.path, diag.line) {
            (Some(path), Some(line)) => format!("{}:{line}", path.display()),
            (Some(path), None) => path.display().to_string(),
            _ => "<unknown>".to_string(),
        };
        println!("{}: {location}: {}", diag.severity, diag.text);
    }
    for message in project.ui_messages() {
        eprintln!("[{}] {}", message.level, message.text);
    }

    if has_errors(&diagnostics) {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}

/// Standalone static checks, no project or compiler required.
fn run_lint(files: &[PathBuf]) -> ExitCode {
    let mut failed = false;
    for file in files {
        let text = match std::fs::read(file) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(err) => {
                error!("could not read '{}': {err}", file.display());
                failed = true;
                continue;
            }
        };
        for diag in hdlcheck_lint::static_messages(&text) {
            let line = diag.line.unwrap_or(0);
            println!("{}:{line}: {}: {}", file.display(), diag.severity, diag.text);
        }
    }
    if failed {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    }
}
