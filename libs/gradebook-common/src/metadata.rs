use crate::notebook::{Cell, Notebook};
use crate::types::TestCaseMetadata;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// `_test_case = 'name'` marks a cell as a graded test case
static TEST_CASE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^\s*_test_case\s*=\s*['"](.*)['"]"#)
        .expect("Invalid regex pattern for test case name")
});

static POINTS_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*_points\s*=\s*(\d+(?:\.\d*)?|\.\d+)")
        .expect("Invalid regex pattern for test case points")
});

static GRADER_ONLY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*_grader_only\s*=\s*(True|False)")
        .expect("Invalid regex pattern for grader-only flag")
});

/// Parse the test case declarations out of a code cell's source
///
/// Returns `None` when the source declares no `_test_case`. Missing `_points`
/// defaults to 0 and missing `_grader_only` defaults to false.
pub fn extract_test_case_metadata(source: &str) -> Option<TestCaseMetadata> {
    let test_case = TEST_CASE_REGEX.captures(source)?.get(1)?.as_str().to_string();

    let points = POINTS_REGEX
        .captures(source)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(0.0);

    let grader_only = GRADER_ONLY_REGEX
        .captures(source)
        .and_then(|caps| caps.get(1))
        .is_some_and(|m| m.as_str() == "True");

    Some(TestCaseMetadata {
        test_case,
        points,
        grader_only,
    })
}

/// Test cell detection predicate shared by grading and hashing
pub fn test_case_of(cell: &Cell) -> Option<TestCaseMetadata> {
    if !cell.is_code() {
        return None;
    }
    extract_test_case_metadata(&cell.source)
}

pub fn is_test_cell(cell: &Cell) -> bool {
    test_case_of(cell).is_some()
}

/// All test cells as `(cell index, metadata)`, in document order
pub fn collect_test_cases(notebook: &Notebook) -> Vec<(usize, TestCaseMetadata)> {
    notebook
        .cells
        .iter()
        .enumerate()
        .filter_map(|(idx, cell)| test_case_of(cell).map(|meta| (idx, meta)))
        .collect()
}

/// Test case names declared by more than one cell, sorted
pub fn duplicate_test_names(test_cases: &[(usize, TestCaseMetadata)]) -> Vec<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for (_, meta) in test_cases {
        *counts.entry(meta.test_case.as_str()).or_default() += 1;
    }
    counts
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(name, _)| name.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_declaration() {
        let source = "_test_case = 'sum-of-list'\n_points = 7.5\n_grader_only = True\nassert total([1, 2]) == 3\n";
        let meta = extract_test_case_metadata(source).unwrap();
        assert_eq!(meta.test_case, "sum-of-list");
        assert_eq!(meta.points, 7.5);
        assert!(meta.grader_only);
    }

    #[test]
    fn test_not_a_test_cell() {
        assert!(extract_test_case_metadata("x = 1\n_points = 3\n").is_none());
        assert!(extract_test_case_metadata("").is_none());
    }

    #[test]
    fn test_points_default_to_zero() {
        let meta = extract_test_case_metadata("_test_case = \"case1\"\nassert True\n").unwrap();
        assert_eq!(meta.points, 0.0);
        assert!(!meta.grader_only);
    }

    #[test]
    fn test_points_with_trailing_comment() {
        let meta = extract_test_case_metadata("_test_case = 'a'\n_points = 10  # worth ten\n").unwrap();
        assert_eq!(meta.points, 10.0);
    }

    #[test]
    fn test_unparsable_points_default_to_zero() {
        let meta = extract_test_case_metadata("_test_case = 'a'\n_points = TOTAL / 2\n").unwrap();
        assert_eq!(meta.points, 0.0);
    }

    #[test]
    fn test_grader_only_false_literal() {
        let meta = extract_test_case_metadata("_test_case = 'a'\n_grader_only = False\n").unwrap();
        assert!(!meta.grader_only);
    }

    #[test]
    fn test_indented_declarations() {
        let source = "if True:\n    _test_case = 'nested'\n    _points = 2\n";
        let meta = extract_test_case_metadata(source).unwrap();
        assert_eq!(meta.test_case, "nested");
        assert_eq!(meta.points, 2.0);
    }

    #[test]
    fn test_markdown_is_never_a_test() {
        let cell = Cell::markdown("_test_case = 'doc'");
        assert!(!is_test_cell(&cell));
        assert!(is_test_cell(&Cell::code("_test_case = 'doc'")));
    }

    #[test]
    fn test_collect_and_duplicates() {
        let notebook = Notebook::new(vec![
            Cell::code("_test_case = 'a'\n_points = 1\n"),
            Cell::markdown("text"),
            Cell::code("_test_case = 'b'\n"),
            Cell::code("_test_case = 'a'\n_points = 2\n"),
        ]);
        let cases = collect_test_cases(&notebook);
        assert_eq!(cases.iter().map(|(i, _)| *i).collect::<Vec<_>>(), vec![0, 2, 3]);
        assert_eq!(duplicate_test_names(&cases), vec!["a".to_string()]);
    }
}
