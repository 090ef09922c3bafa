//! Grading Executor - High-Level Orchestration
//!
//! **Responsibility:**
//! Drive one notebook through a kernel and produce the graded artifacts.
//!
//! **Architecture:**
//! 1. Hash the test suite and ask the kernel who it is (engine.rs)
//! 2. Inject the setup/teardown boundary cells (assembler)
//! 3. Execute every code cell once, in document order; test cells run as
//!    `TestUnit`s feeding the `ResultAccumulator` (evaluator.rs)
//! 4. Strip the boundary cells and prepend the report tables
//!
//! Any failure outside a test cell aborts the run. Nothing is returned for a
//! partially graded notebook.

use crate::engine::{CellOutcome, Kernel, KernelError};
use crate::evaluator::{ResultAccumulator, TestUnit};
use chrono::Utc;
use gradebook_common::assembler::{self, AssemblyError, CellRole};
use gradebook_common::hasher::hash_test_suite;
use gradebook_common::notebook::Notebook;
use gradebook_common::report::{self, ReportError};
use gradebook_common::types::GradedResult;
use thiserror::Error;
use tracing::{debug, error, info, instrument};

#[derive(Debug, Error)]
pub enum GradingError {
    #[error(transparent)]
    Assembly(#[from] AssemblyError),
    #[error("cell {index} raised {ename}: {evalue}\n{traceback}")]
    CellFailed {
        index: usize,
        ename: String,
        evalue: String,
        traceback: String,
    },
    #[error("{role} cell raised {ename}: {evalue}\n{traceback}")]
    BoundaryFailed {
        role: &'static str,
        ename: String,
        evalue: String,
        traceback: String,
    },
    #[error(
        "notebook already has a grading boundary cell at index {index}; \
         grade the unassembled notebook instead"
    )]
    AlreadyAssembled { index: usize },
    #[error("boundary cells out of order: {0}")]
    OutOfOrder(&'static str),
    #[error(transparent)]
    Kernel(#[from] KernelError),
    #[error(transparent)]
    Report(#[from] ReportError),
}

/// Everything a successful run produces
#[derive(Debug)]
pub struct GradingOutcome {
    pub result: GradedResult,
    pub graded_notebook: Notebook,
    pub summary: String,
}

fn boundary_check(role: &'static str, outcome: &CellOutcome) -> Result<(), GradingError> {
    match &outcome.failure {
        None => Ok(()),
        Some(failure) => Err(GradingError::BoundaryFailed {
            role,
            ename: failure.ename.clone(),
            evalue: failure.evalue.clone(),
            traceback: failure.traceback.clone(),
        }),
    }
}

/// Grade a notebook on the given kernel
///
/// The kernel is left running; the caller owns its shutdown.
#[instrument(skip(kernel, notebook, filename), fields(filename = %filename, cells = notebook.cells.len()))]
pub async fn grade_notebook<K: Kernel>(
    kernel: &mut K,
    mut notebook: Notebook,
    filename: &str,
) -> Result<GradingOutcome, GradingError> {
    println!("→ Grading notebook: {}", filename);

    if let Some(index) = assembler::first_boundary_cell(&notebook) {
        error!(cell_index = index, "Notebook already contains boundary cells");
        return Err(GradingError::AlreadyAssembled { index });
    }

    let test_cases_hash = hash_test_suite(&notebook);
    let kernel_info = kernel.info().await?;
    info!(
        python_version = %kernel_info.python_version,
        platform = %kernel_info.platform,
        hash = %test_cases_hash,
        "Kernel ready"
    );

    assembler::inject(&mut notebook);

    let mut acc: Option<ResultAccumulator> = None;
    let mut graded: Option<GradedResult> = None;
    let mut execution_count = 0u32;

    for (idx, cell) in notebook.cells.iter_mut().enumerate() {
        if !cell.is_code() {
            continue;
        }
        // Position in the notebook as the author sees it
        let cell_index = idx.saturating_sub(1);

        match assembler::cell_role(cell) {
            CellRole::Setup => {
                let outcome = kernel.execute(&cell.source).await?;
                boundary_check("setup", &outcome)?;
                if acc.is_some() || graded.is_some() {
                    return Err(GradingError::OutOfOrder("setup cell after grading started"));
                }
                debug!("Setup cell executed");
                acc = Some(ResultAccumulator::start(filename, Utc::now()));
            }
            CellRole::Teardown => {
                let outcome = kernel.execute(&cell.source).await?;
                boundary_check("teardown", &outcome)?;
                let finished = acc
                    .take()
                    .ok_or(GradingError::OutOfOrder("teardown cell before setup"))?;
                debug!("Teardown cell executed");
                graded = Some(finished.finish(Utc::now()));
            }
            CellRole::Test(metadata) => {
                let acc = acc
                    .as_mut()
                    .ok_or(GradingError::OutOfOrder("test cell outside the grading window"))?;
                let unit = TestUnit::new(metadata, cell);
                println!("  Test case: {}", unit.metadata.test_case);
                let outcome = unit.run(kernel, acc).await?;

                execution_count += 1;
                cell.set_outputs(outcome.outputs());
                cell.set_execution_count(execution_count);
            }
            CellRole::Plain => {
                let outcome = kernel.execute(&cell.source).await?;
                if let Some(failure) = &outcome.failure {
                    error!(
                        cell_index = cell_index,
                        ename = %failure.ename,
                        evalue = %failure.evalue,
                        "Notebook cell raised outside a test case"
                    );
                    return Err(GradingError::CellFailed {
                        index: cell_index,
                        ename: failure.ename.clone(),
                        evalue: failure.evalue.clone(),
                        traceback: failure.traceback.clone(),
                    });
                }

                execution_count += 1;
                cell.set_outputs(outcome.outputs());
                cell.set_execution_count(execution_count);
            }
        }
    }

    let mut result = graded.ok_or(GradingError::OutOfOrder("grading never finished"))?;
    result.python_version = kernel_info.python_version;
    result.platform = kernel_info.platform;
    result.test_cases_hash = test_cases_hash;

    assembler::strip(&mut notebook)?;
    report::prepend_tables(&mut notebook, &result);
    let summary = report::summary(&result)?;

    println!(
        "✓ Graded {}: {} / {} points",
        filename, result.learner_score, result.total_available
    );

    Ok(GradingOutcome {
        result,
        graded_notebook: notebook,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::duplicate_warning;
    use gradebook_common::notebook::Cell;
    use gradebook_common::types::KernelInfo;

    /// In-memory kernel: the first rule whose key occurs in the source decides
    /// the outcome, anything else succeeds silently
    #[derive(Default)]
    struct ScriptedKernel {
        rules: Vec<(&'static str, CellOutcome)>,
        die_on: Option<&'static str>,
        executed: Vec<String>,
    }

    impl ScriptedKernel {
        fn rule(mut self, key: &'static str, outcome: CellOutcome) -> Self {
            self.rules.push((key, outcome));
            self
        }
    }

    impl Kernel for ScriptedKernel {
        async fn info(&mut self) -> Result<KernelInfo, KernelError> {
            Ok(KernelInfo {
                python_version: "3.12.1".to_string(),
                platform: "Linux-test".to_string(),
            })
        }

        async fn execute(&mut self, source: &str) -> Result<CellOutcome, KernelError> {
            self.executed.push(source.to_string());
            if self.die_on.is_some_and(|key| source.contains(key)) {
                return Err(KernelError::Closed);
            }
            Ok(self
                .rules
                .iter()
                .find(|(key, _)| source.contains(key))
                .map(|(_, outcome)| outcome.clone())
                .unwrap_or_default())
        }

        async fn shutdown(&mut self) -> Result<(), KernelError> {
            Ok(())
        }
    }

    fn assertion_error() -> CellOutcome {
        CellOutcome::raised(
            "AssertionError",
            "",
            "Traceback (most recent call last):\n  File \"<cell>\", line 3, in <module>\nAssertionError\n",
        )
    }

    fn lab() -> Notebook {
        Notebook::new(vec![
            Cell::markdown("# Lab 1"),
            Cell::code("def double(x):\n    return x * 2\n"),
            Cell::code("_test_case = 'double'\n_points = 10\nassert double(2) == 4\n"),
        ])
    }

    #[tokio::test]
    async fn test_passing_notebook() {
        let mut kernel = ScriptedKernel::default().rule("def double", CellOutcome::success(""));
        let outcome = grade_notebook(&mut kernel, lab(), "lab1.ipynb").await.unwrap();

        let result = &outcome.result;
        assert_eq!(result.learner_score, 10.0);
        assert_eq!(result.total_available, 10.0);
        assert_eq!(result.num_passed_cases, 1);
        assert_eq!(result.num_failed_cases, 0);
        assert_eq!(result.python_version, "3.12.1");
        assert_eq!(result.test_cases_hash, hash_test_suite(&lab()));
        assert!(result.grading_finished_at.is_some());

        // setup, two code cells, teardown; narrative skipped
        assert_eq!(kernel.executed.len(), 4);
        assert!(kernel.executed[0].contains("is_gradebook_env"));
        assert_eq!(kernel.executed[3], assembler::TEARDOWN_SOURCE);

        assert!(outcome.summary.contains("Score: 10 / 10"));
    }

    #[tokio::test]
    async fn test_graded_notebook_layout() {
        let mut kernel =
            ScriptedKernel::default().rule("def double", CellOutcome::success("defined\n"));
        let outcome = grade_notebook(&mut kernel, lab(), "lab1.ipynb").await.unwrap();

        let cells = &outcome.graded_notebook.cells;
        assert_eq!(cells.len(), 5);
        assert!(cells[0].source.starts_with("## Grading Summary"));
        assert!(cells[1].source.starts_with("## Test Case Results"));
        assert_eq!(cells[2].source, "# Lab 1");
        assert_eq!(cells[3].outputs()[0]["text"], serde_json::json!(["defined\n"]));
        assert_eq!(cells[3].extra["execution_count"], 1);
        assert_eq!(cells[4].extra["execution_count"], 2);
        assert!(!assembler::is_assembled(&outcome.graded_notebook));
    }

    #[tokio::test]
    async fn test_failing_assertion_scores_zero() {
        let mut kernel = ScriptedKernel::default().rule("assert double", assertion_error());
        let outcome = grade_notebook(&mut kernel, lab(), "lab1.ipynb").await.unwrap();

        let case = &outcome.result.results[0];
        assert!(!case.pass);
        assert_eq!(case.points, 0.0);
        assert_eq!(case.available_points, 10.0);
        assert!(case.message.contains("AssertionError"));
        assert_eq!(outcome.result.learner_score, 0.0);
        assert_eq!(outcome.result.num_failed_cases, 1);

        let test_cell = &outcome.graded_notebook.cells[4];
        assert_eq!(test_cell.outputs()[0]["output_type"], "error");
    }

    #[tokio::test]
    async fn test_duplicate_names_graded_independently() {
        let notebook = Notebook::new(vec![
            Cell::code("_test_case = 'same'\n_points = 1\nassert True\n"),
            Cell::code("_test_case = 'same'\n_points = 2\nassert fails\n"),
        ]);
        let mut kernel = ScriptedKernel::default().rule("assert fails", assertion_error());
        let outcome = grade_notebook(&mut kernel, notebook, "dup.ipynb").await.unwrap();

        let results = &outcome.result.results;
        assert_eq!(results.len(), 2);
        let warning = duplicate_warning("same");
        assert!(results.iter().all(|r| r.message.starts_with(&warning)));
        assert!(results[0].pass);
        assert!(!results[1].pass);
        assert_eq!(outcome.result.learner_score, 1.0);
        assert_eq!(outcome.result.total_available, 3.0);
    }

    #[tokio::test]
    async fn test_learner_error_is_fatal() {
        let notebook = Notebook::new(vec![
            Cell::markdown("intro"),
            Cell::code("raise ValueError('boom')"),
            Cell::code("_test_case = 'never'\n_points = 5\nassert True\n"),
        ]);
        let mut kernel = ScriptedKernel::default().rule(
            "raise ValueError",
            CellOutcome::raised("ValueError", "boom", "Traceback ...\nValueError: boom\n"),
        );

        match grade_notebook(&mut kernel, notebook, "bad.ipynb").await {
            Err(GradingError::CellFailed {
                index,
                ename,
                evalue,
                traceback,
            }) => {
                assert_eq!(index, 1);
                assert_eq!(ename, "ValueError");
                assert_eq!(evalue, "boom");
                assert!(traceback.contains("ValueError: boom"));
            }
            other => panic!("expected CellFailed, got {:?}", other),
        }
        // setup and the failing cell only
        assert_eq!(kernel.executed.len(), 2);
    }

    #[tokio::test]
    async fn test_setup_failure_is_fatal() {
        let mut kernel = ScriptedKernel::default().rule(
            "is_gradebook_env",
            CellOutcome::raised("ImportError", "no module", ""),
        );
        let err = grade_notebook(&mut kernel, lab(), "lab1.ipynb").await.unwrap_err();
        assert!(matches!(err, GradingError::BoundaryFailed { role: "setup", .. }));
    }

    #[tokio::test]
    async fn test_kernel_death_is_fatal() {
        let mut kernel = ScriptedKernel {
            die_on: Some("assert double"),
            ..Default::default()
        };
        let err = grade_notebook(&mut kernel, lab(), "lab1.ipynb").await.unwrap_err();
        assert!(matches!(err, GradingError::Kernel(KernelError::Closed)));
    }

    #[tokio::test]
    async fn test_assembled_input_is_rejected_before_execution() {
        let mut notebook = lab();
        assembler::inject(&mut notebook);
        let mut kernel = ScriptedKernel::default();

        let err = grade_notebook(&mut kernel, notebook, "lab1-assembled.ipynb")
            .await
            .unwrap_err();
        assert!(matches!(err, GradingError::AlreadyAssembled { index: 0 }));
        assert!(err.to_string().contains("grade the unassembled notebook"));
        assert!(kernel.executed.is_empty());
    }

    #[tokio::test]
    async fn test_stray_teardown_cell_is_rejected() {
        let mut notebook = lab();
        notebook.cells.insert(2, assembler::teardown_cell());
        let mut kernel = ScriptedKernel::default();

        let err = grade_notebook(&mut kernel, notebook, "lab1.ipynb").await.unwrap_err();
        assert!(matches!(err, GradingError::AlreadyAssembled { index: 2 }));
        assert!(kernel.executed.is_empty());
    }

    #[tokio::test]
    async fn test_notebook_without_tests() {
        let notebook = Notebook::new(vec![Cell::code("x = 1")]);
        let mut kernel = ScriptedKernel::default();
        let outcome = grade_notebook(&mut kernel, notebook, "plain.ipynb").await.unwrap();
        assert_eq!(outcome.result.num_test_cases, 0);
        assert_eq!(outcome.result.total_available, 0.0);
        assert_eq!(outcome.graded_notebook.cells.len(), 3);
    }
}
