mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gradebook-cli")]
#[command(about = "Gradebook CLI - Inspect, hash and prepare graded notebooks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the test cases declared in a notebook
    Manifest {
        /// Notebook to inspect
        notebook: PathBuf,

        /// Print the manifest as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Print the SHA-256 of the notebook's test suite
    Hash {
        /// Notebook to hash
        notebook: PathBuf,
    },

    /// Print the learner code between the submission markers
    Extract {
        /// Notebook to read
        notebook: PathBuf,

        /// Write the submissions to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write a learner copy without grader-only test cells
    Release {
        /// Instructor notebook
        notebook: PathBuf,

        /// Output path (defaults to <stem>-release.ipynb next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render the summary of a saved result record
    Report {
        /// Result record written by gradebook-worker
        result: PathBuf,

        /// Also print the Markdown report tables
        #[arg(long, default_value = "false")]
        tables: bool,
    },

    /// Write the notebook with setup and teardown cells injected
    Assemble {
        /// Notebook to assemble
        notebook: PathBuf,

        /// Output path (defaults to <stem>-assembled.ipynb next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Manifest { notebook, json } => {
            commands::manifest(&notebook, json)?;
        }
        Commands::Hash { notebook } => {
            commands::hash(&notebook)?;
        }
        Commands::Extract { notebook, output } => {
            commands::extract(&notebook, output.as_deref())?;
        }
        Commands::Release { notebook, output } => {
            commands::release(&notebook, output.as_deref())?;
        }
        Commands::Report { result, tables } => {
            commands::report(&result, tables)?;
        }
        Commands::Assemble { notebook, output } => {
            commands::assemble(&notebook, output.as_deref())?;
        }
    }

    Ok(())
}
