// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Filewerk — local file transformation engine
//
// Entry point. Initialises logging, loads settings, and dispatches to the
// CSV, PDF and image processors.

mod disk;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use filewerk_core::human_errors::humanize_error;
use filewerk_core::types::{ColumnRole, FileKind, ImageTarget, TagRule};
use filewerk_core::{FilewerkError, TransformConfig};
use filewerk_transform::tabular::sniff_roles;
use filewerk_transform::{PdfMerger, TabularProcessor, recompress_batch};

/// Clean and tag CSV exports, merge PDFs, and shrink images to a size budget.
#[derive(Debug, Parser)]
#[command(name = "filewerk", version)]
struct Cli {
    /// JSON settings file (byte budget, search bounds, output names).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show the headers of the first CSV and which roles they resolve to.
    Columns {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Normalise and tag CSV files into one combined export.
    Tabular {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// JSON array of tag rules.
        #[arg(long)]
        rules: Option<PathBuf>,
        /// Also tag every row with today's date.
        #[arg(long)]
        date_tag: bool,
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },

    /// Concatenate the pages of PDFs in the order given.
    Merge {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },

    /// Recompress images to fit under a byte budget.
    Images {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Target codec: jpeg, webp or png.
        #[arg(long)]
        format: ImageTarget,
        /// Byte budget per image; overrides the settings file.
        #[arg(long)]
        budget: Option<u64>,
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

/// Print an error for a person, falling back to the raw chain when the
/// failure did not come from the engine.
fn report(err: &anyhow::Error) {
    match err.downcast_ref::<FilewerkError>() {
        Some(engine_err) => {
            let human = humanize_error(engine_err);
            eprintln!("{}", human.message);
            eprintln!("{}", human.suggestion);
            tracing::debug!(error = %engine_err, severity = ?human.severity, "Command failed");
        }
        None => eprintln!("error: {err:#}"),
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => TransformConfig::from_json_file(path)?,
        None => TransformConfig::default(),
    };

    match cli.command {
        Command::Columns { files } => {
            let inputs = disk::read_inputs(&files, FileKind::Tabular)?;
            let (headers, resolved) = sniff_roles(&inputs)?;
            println!("headers: {}", headers.join(", "));
            for role in ColumnRole::ALL {
                println!("{:>10}: {}", role.label(), resolved.get(role).unwrap_or("-"));
            }
        }

        Command::Tabular {
            files,
            rules,
            date_tag,
            out,
        } => {
            let inputs = disk::read_inputs(&files, FileKind::Tabular)?;
            let mut rules = match rules {
                Some(path) => disk::read_rules(&path)?,
                None => Vec::new(),
            };
            if date_tag {
                rules.push(TagRule::dated(chrono::Local::now().date_naive()));
            }

            let output = TabularProcessor::new(&config).process(inputs, &rules).await?;
            let path = disk::write_output(&out, &output)?;
            println!("{}", path.display());
        }

        Command::Merge { files, out } => {
            let inputs = disk::read_inputs(&files, FileKind::Document)?;
            let output = PdfMerger::new(&config).merge_async(inputs).await?;
            let path = disk::write_output(&out, &output)?;
            println!("{}", path.display());
        }

        Command::Images {
            files,
            format,
            budget,
            out,
        } => {
            let config = match budget {
                Some(bytes) => {
                    let config = config.with_byte_budget(bytes);
                    config.validate()?;
                    config
                }
                None => config,
            };
            let inputs = disk::read_inputs(&files, FileKind::Image)?;
            let delivered = recompress_batch(inputs, format, &config, |output| {
                let path = disk::write_output(&out, &output)?;
                println!("{}", path.display());
                Ok(())
            })
            .await
            .with_context(|| format!("recompressing to {}", format.name()))?;
            tracing::info!(delivered, "Image batch finished");
        }
    }

    Ok(())
}
