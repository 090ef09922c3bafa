use crate::assembler::METADATA_KEY;
use crate::notebook::{Cell, Notebook};
use crate::types::GradedResult;
use handlebars::Handlebars;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

const SUMMARY_TEMPLATE: &str = include_str!("../assets/summary.hbs");

pub const PASS_GLYPH: &str = "✔️";
pub const FAIL_GLYPH: &str = "❌";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to render summary: {0}")]
    Render(#[from] handlebars::RenderError),
}

#[derive(Serialize)]
struct CaseView {
    name: String,
    pass: bool,
    points: String,
    available: String,
    message: String,
}

#[derive(Serialize)]
struct SummaryView {
    filename: String,
    score: String,
    total: String,
    passed: usize,
    cases: usize,
    duration: String,
    results: Vec<CaseView>,
}

fn fmt_points(value: f64) -> String {
    value.to_string()
}

/// Plain-text summary: header lines, then one block per test case
pub fn summary(result: &GradedResult) -> Result<String, ReportError> {
    let view = SummaryView {
        filename: result.filename.clone(),
        score: fmt_points(result.learner_score),
        total: fmt_points(result.total_available),
        passed: result.num_passed_cases,
        cases: result.num_test_cases,
        duration: format!("{:.2}", result.grading_duration_in_seconds),
        results: result
            .results
            .iter()
            .map(|r| CaseView {
                name: r.test_case_name.clone(),
                pass: r.pass,
                points: fmt_points(r.points),
                available: fmt_points(r.available_points),
                message: r.message.trim_end().to_string(),
            })
            .collect(),
    };

    let mut handlebars = Handlebars::new();
    handlebars.set_strict_mode(true);
    handlebars.register_escape_fn(handlebars::no_escape);
    Ok(handlebars.render_template(SUMMARY_TEMPLATE, &view)?)
}

fn escape_cell(text: &str) -> String {
    text.trim()
        .replace('|', "\\|")
        .replace("\r\n", "<br>")
        .replace('\n', "<br>")
}

fn markdown_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut out = String::new();
    out.push_str(&format!("| {} |\n", headers.join(" | ")));
    out.push_str(&format!("|{}\n", " --- |".repeat(headers.len())));
    for row in rows {
        let cells: Vec<String> = row.iter().map(|c| escape_cell(c)).collect();
        out.push_str(&format!("| {} |\n", cells.join(" | ")));
    }
    out
}

fn report_cell(source: String) -> Cell {
    Cell::markdown(source).with_metadata(METADATA_KEY, json!({ "role": "report" }))
}

pub fn metadata_table(result: &GradedResult) -> String {
    let finished = result
        .grading_finished_at
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "-".to_string());
    let rows: Vec<Vec<String>> = [
        ("Filename", result.filename.clone()),
        ("Grading started at", result.grading_started_at.to_rfc3339()),
        ("Grading finished at", finished),
        (
            "Grading duration (seconds)",
            format!("{:.2}", result.grading_duration_in_seconds),
        ),
        ("Learner score", fmt_points(result.learner_score)),
        ("Total available", fmt_points(result.total_available)),
        ("Test cases", result.num_test_cases.to_string()),
        ("Passed", result.num_passed_cases.to_string()),
        ("Failed", result.num_failed_cases.to_string()),
        ("Python version", result.python_version.clone()),
        ("Platform", result.platform.clone()),
        ("Test suite hash (SHA-256)", result.test_cases_hash.clone()),
    ]
    .into_iter()
    .map(|(k, v)| vec![k.to_string(), v])
    .collect();

    format!("## Grading Summary\n\n{}", markdown_table(&["Key", "Value"], &rows))
}

pub fn results_table(result: &GradedResult) -> String {
    let rows: Vec<Vec<String>> = result
        .results
        .iter()
        .map(|r| {
            vec![
                r.test_case_name.clone(),
                if r.pass { PASS_GLYPH } else { FAIL_GLYPH }.to_string(),
                fmt_points(r.points),
                fmt_points(r.available_points),
                r.message.clone(),
            ]
        })
        .collect();

    format!(
        "## Test Case Results\n\n{}",
        markdown_table(&["Test Case", "Passed", "Points", "Available", "Message"], &rows)
    )
}

/// Report cells: the metadata table, then the results table
pub fn tables(result: &GradedResult) -> Vec<Cell> {
    vec![
        report_cell(metadata_table(result)),
        report_cell(results_table(result)),
    ]
}

/// Put the report tables ahead of all original content
pub fn prepend_tables(notebook: &mut Notebook, result: &GradedResult) {
    for (idx, cell) in tables(result).into_iter().enumerate() {
        notebook.insert_cell(idx, cell);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TestCaseResult;
    use chrono::{TimeZone, Utc};

    fn sample_result() -> GradedResult {
        let started = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let mut result = GradedResult::new("hw1.ipynb", started);
        result.grading_finished_at = Some(started + chrono::Duration::milliseconds(1500));
        result.grading_duration_in_seconds = 1.5;
        result.results = vec![
            TestCaseResult::passed("case1", 10.0),
            TestCaseResult::failed("case2", 5.0, "AssertionError: | bad\nvalue"),
        ];
        result.learner_score = 10.0;
        result.total_available = 15.0;
        result.num_test_cases = 2;
        result.num_passed_cases = 1;
        result.num_failed_cases = 1;
        result.python_version = "3.12.1".to_string();
        result.platform = "Linux-6.1-x86_64".to_string();
        result.test_cases_hash = "ab".repeat(32);
        result
    }

    #[test]
    fn test_summary_header_and_cases() {
        let text = summary(&sample_result()).unwrap();
        assert!(text.contains("Notebook: hw1.ipynb"));
        assert!(text.contains("Score: 10 / 15"));
        assert!(text.contains("Passed: 1 / 2 test cases"));
        assert!(text.contains("Duration: 1.50s"));
        assert!(text.contains("[case1] PASS (10 / 10 points)"));
        assert!(text.contains("[case2] FAIL (0 / 5 points)"));
        assert!(text.contains("AssertionError: | bad\nvalue"));
    }

    #[test]
    fn test_summary_is_deterministic() {
        let result = sample_result();
        assert_eq!(summary(&result).unwrap(), summary(&result).unwrap());
    }

    #[test]
    fn test_summary_does_not_html_escape() {
        let mut result = sample_result();
        result.results[1].message = "expected <3> & got 'x'".to_string();
        assert!(summary(&result).unwrap().contains("expected <3> & got 'x'"));
    }

    #[test]
    fn test_results_table_rows() {
        let table = results_table(&sample_result());
        assert!(table.contains("| Test Case | Passed | Points | Available | Message |"));
        assert!(table.contains(&format!("| case1 | {} | 10 | 10 |  |", PASS_GLYPH)));
        assert!(table.contains(&format!(
            "| case2 | {} | 0 | 5 | AssertionError: \\| bad<br>value |",
            FAIL_GLYPH
        )));
    }

    #[test]
    fn test_metadata_table_carries_provenance() {
        let table = metadata_table(&sample_result());
        assert!(table.contains(&format!("| Test suite hash (SHA-256) | {} |", "ab".repeat(32))));
        assert!(table.contains("| Python version | 3.12.1 |"));
        assert!(table.contains("| Platform | Linux-6.1-x86_64 |"));
    }

    #[test]
    fn test_prepend_tables_goes_first() {
        let mut notebook = Notebook::new(vec![Cell::markdown("# Lab"), Cell::code("x = 1")]);
        prepend_tables(&mut notebook, &sample_result());
        assert_eq!(notebook.cells.len(), 4);
        assert!(notebook.cells[0].source.starts_with("## Grading Summary"));
        assert!(notebook.cells[1].source.starts_with("## Test Case Results"));
        assert_eq!(notebook.cells[2].source, "# Lab");
        assert!(notebook.cells[0].is_narrative());
    }

    #[test]
    fn test_prepend_tables_on_nbformat_4_4_adds_no_ids() {
        let text = r#"{
 "cells": [{"cell_type": "code", "execution_count": null, "metadata": {}, "outputs": [], "source": "x = 1"}],
 "metadata": {},
 "nbformat": 4,
 "nbformat_minor": 4
}"#;
        let mut notebook = Notebook::from_json(text).unwrap();
        prepend_tables(&mut notebook, &sample_result());

        assert_eq!(notebook.cells.len(), 3);
        assert!(notebook.cells.iter().all(|cell| cell.id.is_none()));
        let written: serde_json::Value = serde_json::from_str(&notebook.to_json().unwrap()).unwrap();
        for cell in written["cells"].as_array().unwrap() {
            assert!(cell.get("id").is_none());
        }
    }
}
