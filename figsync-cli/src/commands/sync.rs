//! `figsync sync`: upload artifacts and write locators back.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use figsync_core::{FileTypeFilter, SyncMode};
use figsync_sync::{FileAction, SyncRequest, TaskReport};

use super::{client, load_catalog, select_models, select_tasks};

/// Arguments for `figsync sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Models to sync (default: every model in the catalog).
    #[arg(long, num_args = 1..)]
    pub models: Vec<String>,

    /// Tasks to sync (default: every task in the catalog).
    #[arg(long, num_args = 1..)]
    pub tasks: Vec<String>,

    /// Report what would be uploaded without uploading or writing anything.
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Which file references to process: all, analysis or pred.
    #[arg(long, default_value = "all")]
    pub file_type: FileTypeFilter,

    /// Upload even when the remote file already has the same content.
    #[arg(long)]
    pub force_reupload: bool,
}

impl SyncArgs {
    pub fn run(self, catalog_path: &Path) -> Result<()> {
        let mut catalog = load_catalog(catalog_path)?;
        let request = SyncRequest {
            tasks: select_tasks(&catalog, &self.tasks)?,
            models: select_models(&catalog, &self.models)?,
            mode: if self.dry_run {
                SyncMode::Simulate
            } else {
                SyncMode::Execute
            },
            file_type: self.file_type,
            force: self.force_reupload,
        };
        let repo = client(&catalog)?;

        let reports = figsync_sync::run(&mut catalog, catalog_path, &repo, &request)
            .context("sync aborted")?;
        for report in &reports {
            print_report(report);
        }
        Ok(())
    }
}

fn print_report(report: &TaskReport) {
    let prefix = if report.mode.is_simulate() { "[dry-run] " } else { "" };
    let heading = format!("{prefix}Task '{}'", report.task);
    match &report.collection_url {
        Some(url) if report.created_collection => {
            println!("{} (new collection {url})", heading.bold());
        }
        Some(url) => println!("{} ({url})", heading.bold()),
        None => println!("{} (collection not created yet)", heading.bold()),
    }

    if !report.inventory.is_empty() {
        println!("  {} existing remote files", report.inventory.len());
        for file in report.inventory.iter() {
            println!("    {}", file.name.bright_black());
        }
    }

    if report.outcomes().is_empty() {
        println!("  {prefix}nothing to do");
        return;
    }

    for action in FileAction::ALL {
        let count = report.count(action);
        if count == 0 {
            continue;
        }
        println!("  {} {count} {} file(s):", marker(action), action.label());
        for outcome in report.by_action(action) {
            match &outcome.url {
                Some(url) => println!("    {}  {}", outcome.rel_path, url.bright_black()),
                None => println!("    {} ({})", outcome.rel_path, outcome.model),
            }
        }
    }

    if let Some(elapsed) = report.elapsed() {
        let secs = elapsed.num_milliseconds() as f64 / 1000.0;
        println!("  {prefix}done in {secs:.1}s");
    }
}

fn marker(action: FileAction) -> String {
    match action {
        FileAction::Created => "+".green().bold().to_string(),
        FileAction::Updated => "✎".yellow().bold().to_string(),
        FileAction::Skipped => "·".bright_black().to_string(),
        FileAction::WouldUpload => "~".cyan().to_string(),
        FileAction::MissingLocal => "!".red().bold().to_string(),
        FileAction::Unreadable => "!".magenta().bold().to_string(),
    }
}
