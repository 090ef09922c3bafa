// CLI commands for preparing and inspecting graded notebooks
use anyhow::{Context, Result};
use gradebook_common::assembler;
use gradebook_common::hasher::hash_test_suite;
use gradebook_common::metadata::{collect_test_cases, duplicate_test_names, test_case_of};
use gradebook_common::notebook::Notebook;
use gradebook_common::report;
use gradebook_common::transform::extract_submissions;
use gradebook_common::types::GradedResult;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Serialize)]
pub struct ManifestEntry {
    pub cell_index: usize,
    pub test_case: String,
    pub points: f64,
    pub grader_only: bool,
}

#[derive(Debug, Serialize)]
pub struct Manifest {
    pub test_cases: Vec<ManifestEntry>,
    pub total_available: f64,
    pub duplicates: Vec<String>,
    pub test_cases_hash: String,
}

fn load_notebook(path: &Path) -> Result<Notebook> {
    Notebook::load(path).with_context(|| format!("Failed to load notebook {}", path.display()))
}

/// `lab.ipynb` + `-release` -> `lab-release.ipynb` in the same directory
fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "notebook".to_string());
    path.with_file_name(format!("{}{}.ipynb", stem, suffix))
}

pub fn build_manifest(notebook: &Notebook) -> Manifest {
    let cases = collect_test_cases(notebook);
    let duplicates = duplicate_test_names(&cases);
    let total_available = cases.iter().map(|(_, meta)| meta.points).sum();

    Manifest {
        test_cases: cases
            .into_iter()
            .map(|(cell_index, meta)| ManifestEntry {
                cell_index,
                test_case: meta.test_case,
                points: meta.points,
                grader_only: meta.grader_only,
            })
            .collect(),
        total_available,
        duplicates,
        test_cases_hash: hash_test_suite(notebook),
    }
}

/// List test cases with their points
pub fn manifest(path: &Path, json: bool) -> Result<()> {
    let notebook = load_notebook(path)?;
    let manifest = build_manifest(&notebook);

    if json {
        println!("{}", serde_json::to_string_pretty(&manifest)?);
        return Ok(());
    }

    if manifest.test_cases.is_empty() {
        println!("No test cases found in {}.", path.display());
        println!("\n💡 Mark a code cell as a test with: _test_case = 'name'");
        return Ok(());
    }

    println!("📋 Test cases in {}:\n", path.display());
    println!("{:<6} {:<32} {:>8}  {:<11}", "CELL", "TEST CASE", "POINTS", "GRADER ONLY");
    println!("{}", "─".repeat(62));

    for entry in &manifest.test_cases {
        println!(
            "{:<6} {:<32} {:>8}  {:<11}",
            entry.cell_index,
            entry.test_case,
            entry.points,
            if entry.grader_only { "yes" } else { "" }
        );
    }

    println!(
        "\n✅ Total: {} test case(s), {} point(s)",
        manifest.test_cases.len(),
        manifest.total_available
    );
    for name in &manifest.duplicates {
        println!("⚠️  Duplicate test case name: {}", name);
    }
    println!("🔒 Test suite hash: {}", manifest.test_cases_hash);

    Ok(())
}

pub fn hash(path: &Path) -> Result<()> {
    let notebook = load_notebook(path)?;
    println!("{}", hash_test_suite(&notebook));
    Ok(())
}

pub fn render_submissions(notebook: &Notebook) -> String {
    extract_submissions(notebook)
        .into_iter()
        .map(|(idx, code)| format!("# Cell {}\n{}\n", idx, code))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Dump learner submissions
pub fn extract(path: &Path, output: Option<&Path>) -> Result<()> {
    let notebook = load_notebook(path)?;
    let rendered = render_submissions(&notebook);

    if rendered.is_empty() {
        eprintln!("⚠️  No submission markers found in {}", path.display());
        return Ok(());
    }

    match output {
        Some(out) => {
            fs::write(out, &rendered)
                .with_context(|| format!("Failed to write {}", out.display()))?;
            println!("✅ Submissions written to {}", out.display());
        }
        None => print!("{}", rendered),
    }
    Ok(())
}

/// Copy of the notebook without grader-only test cells, and how many were dropped
pub fn release_notebook(notebook: &Notebook) -> (Notebook, usize) {
    let mut released = notebook.clone();
    let before = released.cells.len();
    released
        .cells
        .retain(|cell| !test_case_of(cell).is_some_and(|meta| meta.grader_only));
    let removed = before - released.cells.len();
    (released, removed)
}

pub fn release(path: &Path, output: Option<&Path>) -> Result<()> {
    println!("🚀 Preparing learner release of {}", path.display());

    let notebook = load_notebook(path)?;
    let (released, removed) = release_notebook(&notebook);
    debug!(removed, remaining = released.cells.len(), "Release filtered");

    let out = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| sibling_path(path, "-release"));
    released
        .save(&out)
        .with_context(|| format!("Failed to write {}", out.display()))?;

    println!("  Removed {} grader-only test cell(s)", removed);
    println!("✅ Release written to {}", out.display());
    Ok(())
}

/// Re-render a saved result record
pub fn report(path: &Path, tables: bool) -> Result<()> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let result: GradedResult = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse result record {}", path.display()))?;

    print!("{}", report::summary(&result)?);

    if tables {
        println!();
        println!("{}", report::metadata_table(&result));
        println!("{}", report::results_table(&result));
    }
    Ok(())
}

pub fn assemble(path: &Path, output: Option<&Path>) -> Result<()> {
    let mut notebook = load_notebook(path)?;
    assembler::inject(&mut notebook);

    let out = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| sibling_path(path, "-assembled"));
    notebook
        .save(&out)
        .with_context(|| format!("Failed to write {}", out.display()))?;

    println!("✅ Assembled notebook written to {}", out.display());
    println!("  {} cells, setup first and teardown last", notebook.cells.len());
    Ok(())
}
