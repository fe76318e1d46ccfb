//! CLI entry point for the site file downloader.

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use site_downloader_core::{Downloader, HttpClient, RunError, RunReport, RunRequest, spawn_run};
use tracing::{debug, info};

mod cli;
mod config;
mod terminal;

use cli::Args;
use config::Settings;
use terminal::EventRenderer;

/// Process outcome mapped to the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProcessExit {
    /// Every item downloaded, or nothing matched.
    Success,
    /// Some items downloaded, some failed.
    Partial,
    /// Fatal error, or every item failed.
    Failure,
}

impl From<ProcessExit> for ExitCode {
    fn from(exit: ProcessExit) -> Self {
        match exit {
            ProcessExit::Success => ExitCode::SUCCESS,
            ProcessExit::Partial => ExitCode::from(1),
            ProcessExit::Failure => ExitCode::from(2),
        }
    }
}

/// Maps completed and failed item counts to the process exit outcome.
fn determine_exit_outcome(completed: usize, failed: usize) -> ProcessExit {
    if failed == 0 {
        ProcessExit::Success
    } else if completed > 0 {
        ProcessExit::Partial
    } else {
        ProcessExit::Failure
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    match run_cli().await {
        Ok(exit) => exit.into(),
        Err(error) => {
            eprintln!("Error: {error:#}");
            ProcessExit::Failure.into()
        }
    }
}

async fn run_cli() -> Result<ProcessExit> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();
    let file_config = config::load_default_file_config()?;
    let settings = Settings::resolve(args, file_config.as_ref());

    terminal::init_tracing(settings.log_level);
    debug!(?settings, "settings resolved");

    let client = HttpClient::with_timeouts(settings.connect_timeout, settings.read_timeout);
    let request = RunRequest::new(
        settings.url.clone(),
        settings.output_dir.clone(),
        settings.suffixes.clone(),
    );

    let mut renderer = EventRenderer::for_terminal(settings.json, settings.quiet);
    let mut handle = spawn_run(request, Downloader::new(client));
    while let Some(event) = handle.events.recv().await {
        renderer.render(&event)?;
    }
    renderer.finish();

    let report = match handle.finish().await {
        Ok(report) => report,
        Err(RunError::Worker(error)) => return Err(error.into()),
        // Already shown through the event stream.
        Err(_) => return Ok(ProcessExit::Failure),
    };

    match report {
        RunReport::NoMatches => Ok(ProcessExit::Success),
        RunReport::Completed(summary) => {
            info!(
                succeeded = summary.succeeded(),
                failed = summary.failed(),
                total = summary.total(),
                "run finished"
            );
            if !settings.json && !settings.quiet {
                println!(
                    "Downloaded {}/{} files to {}",
                    summary.succeeded(),
                    summary.total(),
                    settings.output_dir.display()
                );
            }
            Ok(determine_exit_outcome(summary.succeeded(), summary.failed()))
        }
    }
}
