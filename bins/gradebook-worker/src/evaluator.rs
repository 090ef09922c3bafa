//! Test Evaluator - Result Accumulation and Test Units
//!
//! **Core Responsibility:**
//! Turn executed test cells into `TestCaseResult`s and fold them into the
//! run's `GradedResult`.
//!
//! **Critical Properties:**
//! - Knows nothing about Docker or processes (only the `Kernel` trait)
//! - The accumulator is owned by the driver for exactly one run
//! - A test body that raises is a failed result, never a fatal error
//!
//! **Scoring Rules:**
//! - A passing test earns all of its available points, a failing one earns 0
//! - learner_score = sum of earned points
//! - total_available = sum of available points
//! - Duplicate test names are graded independently, and every result sharing
//!   the name carries a warning

use crate::engine::{CellOutcome, Kernel, KernelError};
use chrono::{DateTime, Utc};
use gradebook_common::notebook::Cell;
use gradebook_common::types::{GradedResult, TestCaseMetadata, TestCaseResult};
use tracing::{info, warn};

/// Prefix added to every result whose test case name is not unique
pub fn duplicate_warning(name: &str) -> String {
    format!(
        "[Warning] Gradebook: An identical test case name \"{}\" already exists. \
         Test cases with identical test case names will be graded independently.\n\n",
        name
    )
}

/// Grading context for a single notebook run
#[derive(Debug)]
pub struct ResultAccumulator {
    result: GradedResult,
}

impl ResultAccumulator {
    pub fn start(filename: &str, started_at: DateTime<Utc>) -> Self {
        Self {
            result: GradedResult::new(filename, started_at),
        }
    }

    #[cfg(test)]
    pub fn results(&self) -> &[TestCaseResult] {
        &self.result.results
    }

    /// Append a result, flagging name collisions on both sides
    pub fn record(&mut self, mut case: TestCaseResult) {
        let warning = duplicate_warning(&case.test_case_name);
        let mut duplicate = false;

        for existing in self
            .result
            .results
            .iter_mut()
            .filter(|r| r.test_case_name == case.test_case_name)
        {
            duplicate = true;
            if !existing.message.starts_with(&warning) {
                existing.message.insert_str(0, &warning);
            }
        }

        if duplicate {
            warn!(test_case = %case.test_case_name, "Duplicate test case name");
            case.message.insert_str(0, &warning);
        }

        self.result.results.push(case);
    }

    /// Close the run and compute the aggregate fields
    pub fn finish(mut self, finished_at: DateTime<Utc>) -> GradedResult {
        let result = &mut self.result;

        let elapsed = finished_at - result.grading_started_at;
        let seconds = elapsed.num_milliseconds().max(0) as f64 / 1000.0;
        result.grading_finished_at = Some(finished_at);
        result.grading_duration_in_seconds = (seconds * 100.0).round() / 100.0;

        result.learner_score = result.results.iter().map(|r| r.points).sum();
        result.total_available = result.results.iter().map(|r| r.available_points).sum();
        result.num_test_cases = result.results.len();
        result.num_passed_cases = result.results.iter().filter(|r| r.pass).count();
        result.num_failed_cases = result.num_test_cases - result.num_passed_cases;

        info!(
            filename = %result.filename,
            score = result.learner_score,
            total = result.total_available,
            passed = result.num_passed_cases,
            failed = result.num_failed_cases,
            "Grading finished"
        );

        self.result
    }
}

/// A test cell ready to run against the kernel
#[derive(Debug, Clone)]
pub struct TestUnit {
    pub metadata: TestCaseMetadata,
    pub body: String,
}

impl TestUnit {
    pub fn new(metadata: TestCaseMetadata, cell: &Cell) -> Self {
        Self {
            metadata,
            body: cell.source.clone(),
        }
    }

    /// Execute the body and record its result
    ///
    /// Returns the raw outcome so the caller can attach cell outputs. Only
    /// kernel infrastructure failures are returned as errors.
    pub async fn run<K: Kernel>(
        &self,
        kernel: &mut K,
        acc: &mut ResultAccumulator,
    ) -> Result<CellOutcome, KernelError> {
        let outcome = kernel.execute(&self.body).await?;
        let name = &self.metadata.test_case;
        let available = self.metadata.points;

        let case = match &outcome.failure {
            None => {
                info!(test_case = %name, points = available, "Test case passed");
                TestCaseResult::passed(name, available)
            }
            Some(failure) => {
                info!(
                    test_case = %name,
                    points = available,
                    ename = %failure.ename,
                    "Test case failed"
                );
                TestCaseResult::failed(name, available, failure.detail())
            }
        };
        acc.record(case);

        Ok(outcome)
    }
}
