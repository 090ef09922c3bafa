// Output configuration shared by the worker and the CLI

use std::path::{Path, PathBuf};

pub const DEFAULT_RESULT_FILE: &str = "gradebook-result.json";
pub const DEFAULT_GRADED_SUFFIX: &str = "-graded";

#[derive(Debug, Clone)]
pub struct Config {
    pub result_file_name: String,
    pub graded_suffix: String,
    /// Falls back to the notebook's own directory when unset
    pub output_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            result_file_name: DEFAULT_RESULT_FILE.to_string(),
            graded_suffix: DEFAULT_GRADED_SUFFIX.to_string(),
            output_dir: None,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by GRADEBOOK_RESULT_FILE and GRADEBOOK_OUTPUT_DIR
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(name) = std::env::var("GRADEBOOK_RESULT_FILE") {
            if !name.trim().is_empty() {
                config.result_file_name = name;
            }
        }
        if let Ok(dir) = std::env::var("GRADEBOOK_OUTPUT_DIR") {
            if !dir.trim().is_empty() {
                config.output_dir = Some(PathBuf::from(dir));
            }
        }
        config
    }

    pub fn output_dir_for(&self, notebook_path: &Path) -> PathBuf {
        match &self.output_dir {
            Some(dir) => dir.clone(),
            None => notebook_path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        }
    }

    pub fn result_path(&self, notebook_path: &Path) -> PathBuf {
        self.output_dir_for(notebook_path).join(&self.result_file_name)
    }

    /// `hw1.ipynb` -> `<output_dir>/hw1-graded.ipynb`
    pub fn graded_notebook_path(&self, notebook_path: &Path) -> PathBuf {
        let stem = file_stem(notebook_path);
        self.output_dir_for(notebook_path)
            .join(format!("{}{}.ipynb", stem, self.graded_suffix))
    }

    pub fn summary_path(&self, notebook_path: &Path) -> PathBuf {
        let stem = file_stem(notebook_path);
        self.output_dir_for(notebook_path)
            .join(format!("{}-summary.txt", stem))
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "notebook".to_string())
}
