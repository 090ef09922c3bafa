//! Content digest over the normalized text of a notebook's test cells.
//!
//! Normalization removes comments and canonicalizes layout so that a digest
//! only moves when test logic moves. String literal contents are never
//! touched, including `#` characters inside them.

use crate::metadata::test_case_of;
use crate::notebook::Notebook;
use sha2::{Digest, Sha256};

/// Copy the string literal opening at `chars[start]` into `out`
///
/// Returns the index just past the literal. An unterminated single-quoted
/// literal ends at the newline, which is left for the caller.
fn copy_string_literal(chars: &[char], start: usize, out: &mut String) -> usize {
    let quote = chars[start];
    let triple = chars.get(start + 1) == Some(&quote) && chars.get(start + 2) == Some(&quote);
    let open = if triple { 3 } else { 1 };
    out.extend(&chars[start..start + open]);

    let mut i = start + open;
    while i < chars.len() {
        let c = chars[i];
        if c == '\\' {
            out.push(c);
            if let Some(&escaped) = chars.get(i + 1) {
                out.push(escaped);
            }
            i += 2;
            continue;
        }
        if c == quote {
            if !triple {
                out.push(c);
                return i + 1;
            }
            if chars.get(i + 1) == Some(&quote) && chars.get(i + 2) == Some(&quote) {
                out.extend([quote; 3]);
                return i + 3;
            }
        }
        if c == '\n' && !triple {
            return i;
        }
        out.push(c);
        i += 1;
    }
    chars.len()
}

/// Remove `#` comments, tracking quote state so string contents survive
pub fn strip_comments(source: &str) -> String {
    let chars: Vec<char> = source.chars().collect();
    let mut out = String::with_capacity(source.len());
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '#' => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            '"' | '\'' => i = copy_string_literal(&chars, i, &mut out),
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn needs_space(prev: Option<char>, next: char) -> bool {
    prev.is_some_and(is_word) && is_word(next)
}

/// Canonical layout of comment-free source
///
/// - blank lines dropped
/// - indentation rewritten as one tab per nesting level
/// - whitespace between tokens kept only where two word characters meet
/// - bracketed and backslash-continued lines joined into one logical line
pub fn canonicalize(source: &str) -> String {
    let chars: Vec<char> = source.chars().collect();
    let mut lines: Vec<(usize, String)> = Vec::new();
    let mut current = String::new();
    let mut indent: Option<usize> = None;
    let mut col = 0usize;
    let mut depth = 0usize;
    let mut pending_space = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\n' if depth > 0 => {
                pending_space = true;
                i += 1;
            }
            '\n' => {
                if !current.is_empty() {
                    lines.push((indent.unwrap_or(0), std::mem::take(&mut current)));
                }
                indent = None;
                col = 0;
                pending_space = false;
                i += 1;
            }
            ' ' | '\t' | '\r' | '\x0c' => {
                if indent.is_none() {
                    match c {
                        ' ' => col += 1,
                        '\t' => col = (col / 8 + 1) * 8,
                        _ => {}
                    }
                } else {
                    pending_space = true;
                }
                i += 1;
            }
            '\\' if chars.get(i + 1) == Some(&'\n') => {
                pending_space = true;
                i += 2;
            }
            _ => {
                if indent.is_none() {
                    indent = Some(col);
                }
                if pending_space && needs_space(current.chars().last(), c) {
                    current.push(' ');
                }
                pending_space = false;

                if c == '"' || c == '\'' {
                    i = copy_string_literal(&chars, i, &mut current);
                    continue;
                }
                match c {
                    '(' | '[' | '{' => depth += 1,
                    ')' | ']' | '}' => depth = depth.saturating_sub(1),
                    _ => {}
                }
                current.push(c);
                i += 1;
            }
        }
    }
    if !current.is_empty() {
        lines.push((indent.unwrap_or(0), current));
    }

    let mut stack = vec![0usize];
    let mut out = Vec::with_capacity(lines.len());
    for (col, text) in lines {
        while stack.len() > 1 && col < stack.last().copied().unwrap_or(0) {
            stack.pop();
        }
        if col > stack.last().copied().unwrap_or(0) {
            stack.push(col);
        }
        out.push(format!("{}{}", "\t".repeat(stack.len() - 1), text));
    }
    out.join("\n")
}

pub fn normalize_test_source(source: &str) -> String {
    canonicalize(&strip_comments(source))
}

/// Normalized text of every test cell, in document order
pub fn test_suite_text(notebook: &Notebook) -> String {
    notebook
        .cells
        .iter()
        .filter(|cell| test_case_of(cell).is_some())
        .map(|cell| normalize_test_source(&cell.source))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Hex SHA-256 of the normalized test suite
pub fn hash_test_suite(notebook: &Notebook) -> String {
    let mut hasher = Sha256::new();
    hasher.update(test_suite_text(notebook).as_bytes());
    hex::encode(hasher.finalize())
}
