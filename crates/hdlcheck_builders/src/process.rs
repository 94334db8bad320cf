//! Subprocess invocation with combined output capture.

use log::debug;
use std::io;
use std::path::Path;
use std::process::Command;

/// Runs a command and returns its combined stdout+stderr as lines.
///
/// A non-zero exit status is not an error here: compilers exit non-zero on
/// diagnostics, and the diagnostics are exactly what the caller wants.
pub fn run_command(program: &str, args: &[String], cwd: Option<&Path>) -> io::Result<Vec<String>> {
    debug!("running: {} {}", program, args.join(" "));

    let mut command = Command::new(program);
    command.args(args);
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    let output = command.output()?;
    let mut lines: Vec<String> = Vec::new();
    for stream in [&output.stdout, &output.stderr] {
        lines.extend(
            String::from_utf8_lossy(stream)
                .lines()
                .map(str::to_string),
        );
    }

    for line in lines.iter().filter(|l| !l.trim().is_empty()) {
        debug!("> {line}");
    }

    Ok(lines)
}
