mod config;
mod engine;
mod evaluator;
mod executor;

use anyhow::Context;
use clap::Parser;
use config::KernelConfigManager;
use engine::{AnyKernel, Kernel};
use executor::GradingOutcome;
use gradebook_common::config::Config;
use gradebook_common::notebook::Notebook;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

#[derive(Parser)]
#[command(name = "gradebook-worker")]
#[command(about = "Gradebook Worker - grade a Jupyter notebook against its embedded test cases", long_about = None)]
struct Args {
    /// Notebook to grade
    notebook: PathBuf,

    /// Kernel name from the kernel config
    #[arg(short, long, env = "GRADEBOOK_KERNEL", default_value = config::DEFAULT_KERNEL)]
    kernel: String,

    /// Kernel config file (defaults to config/kernels.json)
    #[arg(short, long, env = "GRADEBOOK_CONFIG")]
    config: Option<PathBuf>,

    /// Directory for the result record, graded notebook and summary
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, env = "GRADEBOOK_LOG_JSON")]
    log_json: bool,
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // Logs go to stderr; stdout carries progress lines and the summary
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_line_number(true);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_json);

    info!("Gradebook Worker booting...");

    // Load kernel configurations
    let kernels = match &args.config {
        Some(path) => KernelConfigManager::load(path),
        None => KernelConfigManager::load_default(),
    }
    .map_err(|e| {
        error!("Failed to load kernel configurations: {:#}", e);
        e
    })?;

    info!("Loaded kernel configurations for: {:?}", kernels.list_kernels());

    let kernel_config = kernels.get_config(&args.kernel).map_err(|e| {
        error!("Kernel '{}' is not configured", args.kernel);
        error!("Available kernels: {:?}", kernels.list_kernels());
        e
    })?;

    debug!(
        kernel = %kernel_config.name,
        backend = ?kernel_config.backend,
        cell_timeout_secs = kernel_config.cell_timeout_secs,
        "Kernel configuration"
    );

    let mut settings = Config::from_env();
    if let Some(dir) = args.output_dir.clone() {
        settings.output_dir = Some(dir);
    }

    let notebook = Notebook::load(&args.notebook)
        .with_context(|| format!("Failed to load notebook {}", args.notebook.display()))?;
    let filename = args
        .notebook
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| args.notebook.display().to_string());
    let working_dir = args
        .notebook
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    let mut kernel = AnyKernel::start(kernel_config, working_dir)
        .await
        .with_context(|| format!("Failed to start kernel '{}'", kernel_config.name))?;

    let graded = executor::grade_notebook(&mut kernel, notebook, &filename).await;

    if let Err(e) = kernel.shutdown().await {
        warn!(error = %e, "Kernel shutdown failed");
    }

    let outcome = match graded {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(filename = %filename, error = %e, "Grading failed");
            eprintln!("✗ Grading failed: {}", e);
            std::process::exit(1);
        }
    };

    write_outputs(&settings, &args.notebook, &outcome)?;
    println!();
    println!("{}", outcome.summary);

    info!("Worker shutdown complete");
    Ok(())
}

/// Persist the result record, graded notebook and summary
fn write_outputs(settings: &Config, notebook_path: &Path, outcome: &GradingOutcome) -> anyhow::Result<()> {
    let output_dir = settings.output_dir_for(notebook_path);
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let result_path = settings.result_path(notebook_path);
    let record = serde_json::to_string_pretty(&outcome.result)?;
    fs::write(&result_path, record)
        .with_context(|| format!("Failed to write {}", result_path.display()))?;
    info!(path = %result_path.display(), "Result record written");

    let graded_path = settings.graded_notebook_path(notebook_path);
    outcome
        .graded_notebook
        .save(&graded_path)
        .with_context(|| format!("Failed to write {}", graded_path.display()))?;
    info!(path = %graded_path.display(), "Graded notebook written");

    let summary_path = settings.summary_path(notebook_path);
    fs::write(&summary_path, &outcome.summary)
        .with_context(|| format!("Failed to write {}", summary_path.display()))?;
    info!(path = %summary_path.display(), "Summary written");

    Ok(())
}
