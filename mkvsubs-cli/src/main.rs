//! # mkvsubs
//!
//! Extract subtitle tracks (as `.srt` / `.ass`) and attachments from a
//! Matroska or WebM file.
//!
//! ## Usage
//! ```bash
//! mkvsubs movie.mkv -o subs/
//!
//! # List what would be extracted, as JSON
//! mkvsubs movie.mkv --dry-run --json
//!
//! # With debug logging
//! RUST_LOG=debug mkvsubs movie.mkv
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use mkvsubs_core::{extract_async, OutputSummary};
use tracing_subscriber::EnvFilter;

mod writer;

#[derive(Parser, Debug)]
#[command(name = "mkvsubs")]
#[command(version)]
#[command(about = "Extract subtitle tracks and attachments from Matroska files")]
struct Cli {
    /// Matroska/WebM file to read
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Directory the extracted files are written to
    #[arg(short, long, env = "MKVSUBS_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Extract and list the results without writing anything
    #[arg(long)]
    dry_run: bool,

    /// Print the list of extracted files as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Replace files that already exist in the output directory
    #[arg(long)]
    overwrite: bool,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "mkvsubs=debug,mkvsubs_core=debug"
    } else {
        "mkvsubs=info,mkvsubs_core=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    tracing::info!("mkvsubs v{}: reading {}", mkvsubs_core::VERSION, cli.input.display());

    let file = tokio::fs::File::open(&cli.input)
        .await
        .with_context(|| format!("Failed to open {}", cli.input.display()))?;
    let files = extract_async(file)
        .await
        .with_context(|| format!("Failed to extract from {}", cli.input.display()))?;

    let summaries: Vec<OutputSummary> = files.iter().map(|f| f.summary()).collect();
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else {
        for summary in &summaries {
            println!("{}\t{:?}\t{} bytes", summary.name, summary.kind, summary.size);
        }
    }

    if cli.dry_run {
        tracing::info!("Dry run, {} file(s) not written", files.len());
        return Ok(());
    }

    let written = writer::write_outputs(&cli.output_dir, &files, cli.overwrite).await?;
    tracing::info!("Wrote {} file(s) to {}", written.len(), cli.output_dir.display());

    Ok(())
}
