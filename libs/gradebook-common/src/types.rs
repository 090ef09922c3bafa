use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Test case declaration parsed from a test cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCaseMetadata {
    pub test_case: String,
    pub points: f64,
    pub grader_only: bool,
}

/// Outcome of one executed test cell
///
/// `points` equals `available_points` when `pass` is true, 0 otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCaseResult {
    pub test_case_name: String,
    pub points: f64,
    pub available_points: f64,
    pub pass: bool,
    pub message: String,
}

impl TestCaseResult {
    pub fn passed(name: &str, available_points: f64) -> Self {
        Self {
            test_case_name: name.to_string(),
            points: available_points,
            available_points,
            pass: true,
            message: String::new(),
        }
    }

    pub fn failed(name: &str, available_points: f64, message: impl Into<String>) -> Self {
        Self {
            test_case_name: name.to_string(),
            points: 0.0,
            available_points,
            pass: false,
            message: message.into(),
        }
    }
}

/// Interpreter descriptors reported by the kernel that ran the notebook
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KernelInfo {
    pub python_version: String,
    pub platform: String,
}

/// Aggregate record of one grading run
///
/// Serialized as the result record written next to the graded notebook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradedResult {
    pub filename: String,
    pub grading_started_at: DateTime<Utc>,
    pub grading_finished_at: Option<DateTime<Utc>>,
    pub grading_duration_in_seconds: f64,
    pub learner_score: f64,
    pub total_available: f64,
    pub num_test_cases: usize,
    pub num_passed_cases: usize,
    pub num_failed_cases: usize,
    pub results: Vec<TestCaseResult>,
    #[serde(default)]
    pub python_version: String,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub test_cases_hash: String,
}

impl GradedResult {
    pub fn new(filename: &str, started_at: DateTime<Utc>) -> Self {
        Self {
            filename: filename.to_string(),
            grading_started_at: started_at,
            grading_finished_at: None,
            grading_duration_in_seconds: 0.0,
            learner_score: 0.0,
            total_available: 0.0,
            num_test_cases: 0,
            num_passed_cases: 0,
            num_failed_cases: 0,
            results: Vec::new(),
            python_version: String::new(),
            platform: String::new(),
            test_cases_hash: String::new(),
        }
    }
}
