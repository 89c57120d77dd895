// =============================================================================
// Runtime Configuration — Service settings loaded at startup
// =============================================================================
//
// Settings come from an optional JSON file, then individual fields may be
// overridden from the environment (a `.env` file is honoured by `main`).
// All fields carry `#[serde(default)]` so a partial file or an empty `{}`
// still deserialises.
//
// =============================================================================

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const ENV_BIND_ADDR: &str = "SIGNAL_WHEEL_BIND_ADDR";
pub const ENV_DATA_DIR: &str = "SIGNAL_WHEEL_DATA_DIR";
pub const ENV_SAMPLE_SIZE: &str = "SIGNAL_WHEEL_SAMPLE_SIZE";

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_bind_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_signals_file() -> String {
    "signals.json".to_string()
}

fn default_scenarios_file() -> String {
    "scenarios.json".to_string()
}

fn default_signal_sample_size() -> usize {
    5
}

// =============================================================================
// ServiceConfig
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Socket address the HTTP server binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Directory holding the dataset files, relative to the working
    /// directory unless absolute.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_signals_file")]
    pub signals_file: String,

    #[serde(default = "default_scenarios_file")]
    pub scenarios_file: String,

    /// Upper bound on the number of signals returned by `/api/signals`.
    #[serde(default = "default_signal_sample_size")]
    pub signal_sample_size: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            data_dir: default_data_dir(),
            signals_file: default_signals_file(),
            scenarios_file: default_scenarios_file(),
            signal_sample_size: default_signal_sample_size(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read service config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse service config from {}", path.display()))?;

        info!(
            path = %path.display(),
            data_dir = %config.data_dir.display(),
            bind_addr = %config.bind_addr,
            "service config loaded"
        );

        Ok(config)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup. Blank values are
    /// skipped; an unparsable sample size is ignored with a warning.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(addr) = get(ENV_BIND_ADDR) {
            self.bind_addr = addr;
        }
        if let Some(dir) = get(ENV_DATA_DIR) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(raw) = get(ENV_SAMPLE_SIZE) {
            match raw.parse() {
                Ok(n) => self.signal_sample_size = n,
                Err(e) => warn!(value = %raw, error = %e, "ignoring invalid {ENV_SAMPLE_SIZE}"),
            }
        }
    }

    pub fn signals_path(&self) -> PathBuf {
        self.data_dir.join(&self.signals_file)
    }

    pub fn scenarios_path(&self) -> PathBuf {
        self.data_dir.join(&self.scenarios_file)
    }
}
