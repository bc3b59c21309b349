//! backup - Command-line interface for the backup engine.
//!
//! Copies a directory tree into a destination directory, keeping or
//! flattening its structure. Existing destination files are never
//! overwritten: the incoming copy gets a UTC timestamp suffix instead.
//!
//! Exit status: 0 on success (even if some files failed), 1 on a fatal
//! error, 130 when interrupted.

mod logging;

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use engine::{
    run_backup, BackupRequest, CopyReport, CopyStatus, DirectoryAction, EngineError,
    ProgressCallback, RunOutcome, TraversalNode, EXIT_FATAL, EXIT_INTERRUPTED,
};
use signal_hook::consts::SIGINT;

/// Back up files from source to destination with unique naming
#[derive(Parser, Debug)]
#[command(name = "backup")]
#[command(version)]
#[command(about = "Back up files from source to destination with unique naming")]
struct Args {
    /// Source directory to back up
    #[arg(value_name = "SOURCE")]
    source: PathBuf,

    /// Destination directory for backups
    #[arg(value_name = "DESTINATION")]
    destination: PathBuf,

    /// Do not preserve subdirectory structure; copy all files into the destination root
    #[arg(long)]
    flat: bool,

    /// Show what would happen without copying files
    #[arg(long)]
    dry_run: bool,

    /// Print detailed progress messages
    #[arg(short, long)]
    verbose: bool,

    /// Print the run summary as a JSON object when done
    #[arg(long)]
    json: bool,
}

impl Args {
    fn to_request(&self) -> BackupRequest {
        BackupRequest::new(&self.source, &self.destination)
            .flatten(self.flat)
            .simulate(self.dry_run)
            .verbose(self.verbose)
    }
}

/// One rendered output line and the stream it belongs on.
#[derive(Debug, PartialEq, Eq)]
enum Line {
    Out(String),
    Err(String),
}

impl Line {
    fn emit(&self) {
        match self {
            Line::Out(text) => println!("{}", text),
            Line::Err(text) => eprintln!("{}", text),
        }
    }
}

fn arrow(src: &Path, dst: &Path) -> String {
    format!("{} -> {}", src.display(), dst.display())
}

fn render_file(report: &CopyReport, verbose: bool) -> Vec<Line> {
    let mut lines = Vec::new();
    let pair = arrow(&report.source, &report.destination);

    if report.status.is_planned() {
        lines.push(Line::Out(format!("[DRY] {}: {}", report.status, pair)));
    } else if report.status == CopyStatus::Failed {
        lines.push(Line::Err(format!(
            "[ERROR] Failed to copy {}: {}",
            pair,
            report.error_message.as_deref().unwrap_or("unknown error")
        )));
    } else if verbose {
        let tag = if report.status.is_rename() {
            "RENAMED"
        } else {
            "COPIED"
        };
        lines.push(Line::Out(format!("[{}] {}", tag, pair)));
    }

    for warning in &report.metadata_warnings {
        lines.push(Line::Err(format!("[WARN] {}", warning)));
    }
    lines
}

/// In a dry run every destination level gets an ensure line, present or not.
fn render_directory(
    target: &Path,
    action: DirectoryAction,
    dry_run: bool,
    verbose: bool,
) -> Option<Line> {
    if !verbose {
        return None;
    }
    match action {
        DirectoryAction::Planned | DirectoryAction::Existing if dry_run => Some(Line::Out(
            format!("[DRY] Ensure directory exists: {}", target.display()),
        )),
        DirectoryAction::Created => Some(Line::Out(format!("[MKDIR] {}", target.display()))),
        DirectoryAction::Planned | DirectoryAction::Existing => None,
    }
}

/// CLI implementation of ProgressCallback printing line-oriented actions
struct CliProgress {
    dry_run: bool,
    verbose: bool,
}

impl ProgressCallback for CliProgress {
    fn on_destination_ready(&self, request: &BackupRequest, action: DirectoryAction) {
        if self.verbose {
            println!("Destination ready: {}", request.dest_root.display());
        }
        if let Some(line) = render_directory(&request.dest_root, action, self.dry_run, self.verbose) {
            line.emit();
        }
    }

    fn on_directory(&self, _node: &TraversalNode, target: &Path, action: DirectoryAction) {
        if let Some(line) = render_directory(target, action, self.dry_run, self.verbose) {
            line.emit();
        }
    }

    fn on_directory_failed(&self, path: &Path, message: &str) {
        eprintln!("[ERROR] Failed to read directory {}: {}", path.display(), message);
    }

    fn on_file(&self, report: &CopyReport) {
        for line in render_file(report, self.verbose) {
            line.emit();
        }
    }

    fn on_run_completed(&self, outcome: &RunOutcome) {
        if !self.verbose {
            return;
        }
        if outcome.dry_run {
            println!(
                "Summary: {} files, {} to copy, {} to rename, {} failed",
                outcome.files_visited(),
                outcome.planned_copies,
                outcome.planned_renames,
                outcome.files_failed
            );
        } else {
            println!(
                "Summary: {} files, {} copied, {} renamed, {} failed",
                outcome.files_visited(),
                outcome.files_copied,
                outcome.files_renamed,
                outcome.files_failed
            );
        }
        println!("Backup completed.");
    }
}

/// Route SIGINT into a cancellation flag; a second SIGINT exits at once.
fn install_interrupt_handler() -> anyhow::Result<Arc<AtomicBool>> {
    let interrupted = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register_conditional_shutdown(
        SIGINT,
        EXIT_INTERRUPTED,
        Arc::clone(&interrupted),
    )
    .context("failed to register interrupt handler")?;
    signal_hook::flag::register(SIGINT, Arc::clone(&interrupted))
        .context("failed to register interrupt handler")?;
    Ok(interrupted)
}

/// Main CLI logic - separated for testability
fn run_cli(args: &Args, cancel: &AtomicBool) -> anyhow::Result<RunOutcome> {
    let request = args.to_request();
    let progress = CliProgress {
        dry_run: args.dry_run,
        verbose: args.verbose,
    };

    let outcome = run_backup(&request, Some(&progress), cancel)?;

    if args.json {
        let summary =
            serde_json::to_string(&outcome).context("failed to serialize run summary")?;
        println!("{}", summary);
    }
    Ok(outcome)
}

/// Report a run-ending error and pick the exit status.
fn report_failure(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<EngineError>() {
        Some(EngineError::Interrupted) => {
            println!("\n[INFO] Backup interrupted by user.");
        }
        Some(engine_err) if engine_err.is_precondition() => {
            eprintln!("[ERROR] {}", engine_err);
        }
        Some(engine_err) => {
            eprintln!("[ERROR] Unexpected error during backup: {}", engine_err);
        }
        None => {
            eprintln!("[ERROR] {:#}", err);
        }
    }
    exit_code(err)
}

fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<EngineError>()
        .map(EngineError::exit_code)
        .unwrap_or(EXIT_FATAL)
}

fn main() {
    let args = Args::parse();

    if let Err(e) = logging::init_logging(args.verbose) {
        eprintln!("[WARN] {:#}", e);
    }

    let exit_code = match install_interrupt_handler().and_then(|cancel| run_cli(&args, &cancel)) {
        Ok(outcome) => {
            tracing::debug!(run_id = %outcome.run_id, "exiting");
            0
        }
        Err(err) => report_failure(&err),
    };

    std::process::exit(exit_code);
}
