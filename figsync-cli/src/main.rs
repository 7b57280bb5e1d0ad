//! figsync: publish model prediction artifacts to Figshare.
//!
//! # Usage
//!
//! ```text
//! figsync [--catalog figsync.yaml] sync [--models M..] [--tasks T..] [-n] [--file-type all|analysis|pred] [--force-reupload]
//! figsync [--catalog figsync.yaml] list <task>
//! figsync [--catalog figsync.yaml] refs [--models M..] [--tasks T..] [--file-type ..] [--json]
//! ```

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{list::ListArgs, refs::RefsArgs, sync::SyncArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "figsync",
    version,
    about = "Upload model prediction files to Figshare and record their download URLs",
    long_about = None,
)]
struct Cli {
    /// Catalog listing tasks, models and remote settings.
    #[arg(long, global = true, default_value = "figsync.yaml")]
    catalog: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Upload referenced files and write `_url` keys back into model metadata.
    ///
    /// Model metadata files that gain or change a URL are rewritten as plain
    /// YAML: key order is kept, but comments are not preserved. Run with
    /// `--dry-run` first to see which files would change.
    Sync(SyncArgs),

    /// List the files in a task's remote collection.
    List(ListArgs),

    /// Show file references found in model metadata, without touching the network.
    Refs(RefsArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Sync(args) => args.run(&cli.catalog),
        Commands::List(args) => args.run(&cli.catalog),
        Commands::Refs(args) => args.run(&cli.catalog),
    }
}

/// Log to stderr so stdout stays clean for summaries and `--json`.
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
