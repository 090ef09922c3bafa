//! Jupyter notebook (nbformat v4) document model.
//!
//! Only the fields the grader touches are typed; everything else is kept in
//! `extra` so a notebook survives a load/save round trip unchanged.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Map, Value};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum NotebookError {
    #[error("failed to read notebook {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to write notebook {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid notebook JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unsupported nbformat version {0} (expected 4)")]
    UnsupportedVersion(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
    Code,
    Markdown,
    Raw,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub cell_type: CellType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(deserialize_with = "de_multiline", serialize_with = "ser_multiline")]
    pub source: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Cell {
    pub fn code(source: impl Into<String>) -> Self {
        let mut extra = Map::new();
        extra.insert("execution_count".to_string(), Value::Null);
        extra.insert("outputs".to_string(), Value::Array(Vec::new()));
        Self {
            cell_type: CellType::Code,
            id: Some(new_cell_id()),
            metadata: Map::new(),
            source: source.into(),
            extra,
        }
    }

    pub fn markdown(source: impl Into<String>) -> Self {
        Self {
            cell_type: CellType::Markdown,
            id: Some(new_cell_id()),
            metadata: Map::new(),
            source: source.into(),
            extra: Map::new(),
        }
    }

    pub fn is_code(&self) -> bool {
        self.cell_type == CellType::Code
    }

    /// Markdown and raw cells carry prose, never executable code
    pub fn is_narrative(&self) -> bool {
        !self.is_code()
    }

    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    pub fn outputs(&self) -> &[Value] {
        self.extra
            .get("outputs")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn set_outputs(&mut self, outputs: Vec<Value>) {
        self.extra.insert("outputs".to_string(), Value::Array(outputs));
    }

    pub fn set_execution_count(&mut self, count: u32) {
        self.extra.insert("execution_count".to_string(), json!(count));
    }
}

/// Stream output in nbformat shape
pub fn stream_output(name: &str, text: &str) -> Value {
    json!({
        "output_type": "stream",
        "name": name,
        "text": split_lines(text),
    })
}

/// Error output in nbformat shape
pub fn error_output(ename: &str, evalue: &str, traceback: &str) -> Value {
    json!({
        "output_type": "error",
        "ename": ename,
        "evalue": evalue,
        "traceback": traceback.lines().collect::<Vec<_>>(),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notebook {
    pub cells: Vec<Cell>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub nbformat: u32,
    pub nbformat_minor: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Notebook {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self {
            cells,
            metadata: Map::new(),
            nbformat: 4,
            nbformat_minor: 5,
            extra: Map::new(),
        }
    }

    pub fn from_json(text: &str) -> Result<Self, NotebookError> {
        let notebook: Notebook = serde_json::from_str(text)?;
        if notebook.nbformat != 4 {
            return Err(NotebookError::UnsupportedVersion(notebook.nbformat));
        }
        Ok(notebook)
    }

    pub fn to_json(&self) -> Result<String, NotebookError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<Self, NotebookError> {
        let text = fs::read_to_string(path).map_err(|source| NotebookError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let notebook = Self::from_json(&text)?;
        debug!(path = %path.display(), cells = notebook.cells.len(), "Notebook loaded");
        Ok(notebook)
    }

    pub fn save(&self, path: &Path) -> Result<(), NotebookError> {
        let text = self.to_json()?;
        fs::write(path, text).map_err(|source| NotebookError::Write {
            path: path.display().to_string(),
            source,
        })
    }

    /// Cell ids exist from nbformat 4.5 on
    pub fn supports_cell_ids(&self) -> bool {
        self.nbformat > 4 || (self.nbformat == 4 && self.nbformat_minor >= 5)
    }

    /// Insert a cell, dropping its id when the notebook's format has none
    pub fn insert_cell(&mut self, index: usize, mut cell: Cell) {
        if !self.supports_cell_ids() {
            cell.id = None;
        }
        self.cells.insert(index, cell);
    }

    pub fn code_cells(&self) -> impl Iterator<Item = (usize, &Cell)> {
        self.cells.iter().enumerate().filter(|(_, c)| c.is_code())
    }
}

fn new_cell_id() -> String {
    // nbformat 4.5 ids are 1-64 chars of [a-zA-Z0-9-_]
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// Split text into nbformat source lines, each keeping its trailing newline
fn split_lines(text: &str) -> Vec<String> {
    text.split_inclusive('\n').map(str::to_string).collect()
}

fn de_multiline<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Multiline {
        Text(String),
        Lines(Vec<String>),
    }

    Ok(match Multiline::deserialize(deserializer)? {
        Multiline::Text(text) => text,
        Multiline::Lines(lines) => lines.concat(),
    })
}

fn ser_multiline<S>(source: &str, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    split_lines(source).serialize(serializer)
}
