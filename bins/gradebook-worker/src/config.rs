// Kernel configuration management for the Gradebook worker
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::warn;

pub const DEFAULT_KERNEL: &str = "python3";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KernelBackend {
    Local,
    Docker,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KernelConfig {
    pub name: String,
    pub backend: KernelBackend,
    /// Interpreter command, on the host for local kernels or in the image for Docker
    #[serde(default = "default_python")]
    pub python: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default = "default_memory_limit_mb")]
    pub memory_limit_mb: u32,
    #[serde(default = "default_cpu_limit")]
    pub cpu_limit: f32,
    #[serde(default = "default_cell_timeout_secs")]
    pub cell_timeout_secs: u64,
}

fn default_python() -> String {
    "python3".to_string()
}

fn default_memory_limit_mb() -> u32 {
    512
}

fn default_cpu_limit() -> f32 {
    1.0
}

fn default_cell_timeout_secs() -> u64 {
    120
}

impl KernelConfig {
    pub fn local_default() -> Self {
        Self {
            name: DEFAULT_KERNEL.to_string(),
            backend: KernelBackend::Local,
            python: default_python(),
            image: None,
            memory_limit_mb: default_memory_limit_mb(),
            cpu_limit: default_cpu_limit(),
            cell_timeout_secs: default_cell_timeout_secs(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct KernelsJson {
    kernels: Vec<KernelConfig>,
}

/// Kernel configuration manager
#[derive(Clone)]
pub struct KernelConfigManager {
    configs: HashMap<String, KernelConfig>,
}

impl KernelConfigManager {
    /// Load kernel configurations from kernels.json
    pub fn load(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            bail!("Kernel config file not found: {}", config_path.display());
        }

        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        Self::from_json(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let kernels_json: KernelsJson = serde_json::from_str(content)?;

        let mut configs = HashMap::new();
        for kernel in kernels_json.kernels {
            if kernel.backend == KernelBackend::Docker && kernel.image.is_none() {
                bail!("Docker kernel '{}' has no image", kernel.name);
            }
            configs.insert(kernel.name.clone(), kernel);
        }

        Ok(Self { configs })
    }

    /// Load from config/kernels.json, falling back to the built-in local python3 kernel
    pub fn load_default() -> Result<Self> {
        let default_path = Path::new("config/kernels.json");
        if default_path.exists() {
            return Self::load(default_path);
        }
        warn!(
            path = %default_path.display(),
            "Kernel config not found, using built-in local python3 kernel"
        );
        Ok(Self::builtin())
    }

    pub fn builtin() -> Self {
        let kernel = KernelConfig::local_default();
        let mut configs = HashMap::new();
        configs.insert(kernel.name.clone(), kernel);
        Self { configs }
    }

    /// Get configuration for a named kernel
    pub fn get_config(&self, name: &str) -> Result<&KernelConfig> {
        self.configs
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("No configuration found for kernel: {}", name))
    }

    /// List all configured kernels, sorted
    pub fn list_kernels(&self) -> Vec<String> {
        let mut names: Vec<String> = self.configs.keys().cloned().collect();
        names.sort();
        names
    }
}
