use crate::metadata::test_case_of;
use crate::notebook::{Cell, Notebook};
use crate::types::TestCaseMetadata;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::warn;

pub const SETUP_SOURCE: &str = include_str!("../assets/setup.py");
pub const TEARDOWN_SOURCE: &str = include_str!("../assets/teardown.py");

/// Cell metadata key carrying the grader's own annotations
pub const METADATA_KEY: &str = "gradebook";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssemblyError {
    #[error("notebook is not assembled for grading: missing {0} cell")]
    NotAssembled(&'static str),
}

/// What the execution driver does with a cell
#[derive(Debug, Clone, PartialEq)]
pub enum CellRole {
    Setup,
    Teardown,
    Test(TestCaseMetadata),
    Plain,
}

fn boundary_cell(source: &str, role: &str) -> Cell {
    Cell::code(source).with_metadata(METADATA_KEY, json!({ "role": role }))
}

pub fn setup_cell() -> Cell {
    boundary_cell(SETUP_SOURCE, "setup")
}

pub fn teardown_cell() -> Cell {
    boundary_cell(TEARDOWN_SOURCE, "teardown")
}

fn role_tag(cell: &Cell) -> Option<&str> {
    cell.metadata
        .get(METADATA_KEY)
        .and_then(|v| v.get("role"))
        .and_then(Value::as_str)
}

pub fn cell_role(cell: &Cell) -> CellRole {
    if cell.is_code() {
        match role_tag(cell) {
            Some("setup") => return CellRole::Setup,
            Some("teardown") => return CellRole::Teardown,
            _ => {}
        }
    }
    match test_case_of(cell) {
        Some(meta) => CellRole::Test(meta),
        None => CellRole::Plain,
    }
}

/// True when a setup cell leads and a distinct teardown cell trails
pub fn is_assembled(notebook: &Notebook) -> bool {
    notebook.cells.len() >= 2
        && matches!(notebook.cells.first().map(cell_role), Some(CellRole::Setup))
        && matches!(notebook.cells.last().map(cell_role), Some(CellRole::Teardown))
}

/// Index of the first code cell tagged as a setup or teardown boundary
pub fn first_boundary_cell(notebook: &Notebook) -> Option<usize> {
    notebook
        .cells
        .iter()
        .position(|cell| matches!(cell_role(cell), CellRole::Setup | CellRole::Teardown))
}

/// Insert the setup cell at the start and the teardown cell at the end
pub fn inject(notebook: &mut Notebook) {
    notebook.insert_cell(0, setup_cell());
    let end = notebook.cells.len();
    notebook.insert_cell(end, teardown_cell());
}

/// Remove the cells added by [`inject`]
///
/// Refuses, leaving the notebook untouched, unless the first cell is the
/// setup cell and the last is the teardown cell.
pub fn strip(notebook: &mut Notebook) -> Result<(), AssemblyError> {
    if !matches!(notebook.cells.first().map(cell_role), Some(CellRole::Setup)) {
        warn!("Refusing to strip a notebook without a leading setup cell");
        return Err(AssemblyError::NotAssembled("setup"));
    }
    if notebook.cells.len() < 2
        || !matches!(notebook.cells.last().map(cell_role), Some(CellRole::Teardown))
    {
        warn!("Refusing to strip a notebook without a trailing teardown cell");
        return Err(AssemblyError::NotAssembled("teardown"));
    }
    notebook.cells.remove(0);
    notebook.cells.pop();
    Ok(())
}
