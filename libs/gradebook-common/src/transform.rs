use crate::notebook::Notebook;

pub const BEGIN_SENTINEL: &str = "# YOUR CODE BEGINS";
pub const END_SENTINEL: &str = "# YOUR CODE ENDS";

/// Learner code between the begin and end sentinels, trailing whitespace trimmed
///
/// `None` when either sentinel is missing. Text that moves or edits a sentinel
/// defeats the extraction; that is a limit of the sentinel convention.
pub fn extract_submission(source: &str) -> Option<String> {
    if !source.contains(END_SENTINEL) {
        return None;
    }
    let start = source.find(BEGIN_SENTINEL)? + BEGIN_SENTINEL.len();
    let rest = &source[start..];
    let code = match rest.find(END_SENTINEL) {
        Some(end) => &rest[..end],
        None => rest,
    };
    Some(code.trim_end().to_string())
}

/// Extracted learner code per code cell, as `(cell index, code)`
pub fn extract_submissions(notebook: &Notebook) -> Vec<(usize, String)> {
    notebook
        .code_cells()
        .filter_map(|(idx, cell)| extract_submission(&cell.source).map(|code| (idx, code)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notebook::Cell;

    #[test]
    fn test_extracts_between_sentinels() {
        let source = "def f(x):\n    # YOUR CODE BEGINS\n    return x * 2\n    # YOUR CODE ENDS\n";
        assert_eq!(
            extract_submission(source).as_deref(),
            Some("\n    return x * 2")
        );
    }

    #[test]
    fn test_missing_sentinels() {
        assert_eq!(extract_submission("x = 1\n# YOUR CODE ENDS"), None);
        assert_eq!(extract_submission("# YOUR CODE BEGINS\nx = 1"), None);
        assert_eq!(extract_submission("x = 1"), None);
    }

    #[test]
    fn test_empty_region() {
        assert_eq!(
            extract_submission("# YOUR CODE BEGINS\n\n   \n# YOUR CODE ENDS").as_deref(),
            Some("")
        );
    }

    #[test]
    fn test_end_before_begin_takes_remainder() {
        let source = "# YOUR CODE ENDS\n# YOUR CODE BEGINS\nanswer = 42\n";
        assert_eq!(extract_submission(source).as_deref(), Some("\nanswer = 42"));
    }

    #[test]
    fn test_extract_submissions_skips_plain_cells() {
        let notebook = Notebook::new(vec![
            Cell::code("import math"),
            Cell::markdown("# YOUR CODE BEGINS\nprose\n# YOUR CODE ENDS"),
            Cell::code("# YOUR CODE BEGINS\ny = 3\n# YOUR CODE ENDS"),
        ]);
        assert_eq!(
            extract_submissions(&notebook),
            vec![(2, "\ny = 3".to_string())]
        );
    }
}
