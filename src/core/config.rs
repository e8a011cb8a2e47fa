use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::core::errors::{Error, Result};

pub const DEFAULT_TAIL_LINES: usize = 100;

pub const ENV_PATH: &str = "LOGVIEW_PATH";
pub const ENV_LOGGING_PATH: &str = "LOGGING_PATH";
pub const ENV_LOGGING_FILE: &str = "LOGGING_FILE";

/// Where the viewer finds its logs and how it behaves by default.
///
/// The root directory is taken from `path`, then `logging_path`, then the
/// directory containing `logging_file`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "snake_case")]
pub struct LogViewConfig {
    pub path: Option<PathBuf>,
    pub logging_path: Option<PathBuf>,
    pub logging_file: Option<PathBuf>,
    pub tail_lines: usize,
}

impl Default for LogViewConfig {
    fn default() -> Self {
        Self {
            path: None,
            logging_path: None,
            logging_file: None,
            tail_lines: DEFAULT_TAIL_LINES,
        }
    }
}

impl LogViewConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        serde_json::from_str(&raw)
            .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))
    }

    /// Applies `LOGVIEW_PATH`, `LOGGING_PATH` and `LOGGING_FILE` on top of the
    /// current values.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var_os(key).map(PathBuf::from))
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<PathBuf>) -> Self {
        if let Some(path) = lookup(ENV_PATH) {
            self.path = Some(path);
        }
        if let Some(path) = lookup(ENV_LOGGING_PATH) {
            self.logging_path = Some(path);
        }
        if let Some(file) = lookup(ENV_LOGGING_FILE) {
            self.logging_file = Some(file);
        }
        self
    }

    pub fn resolve_root(&self) -> Result<PathBuf> {
        if let Some(path) = &self.path {
            return Ok(path.clone());
        }
        if let Some(path) = &self.logging_path {
            return Ok(path.clone());
        }
        if let Some(file) = &self.logging_file {
            return match file.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => Ok(parent.to_path_buf()),
                _ => Ok(PathBuf::from(".")),
            };
        }
        Err(Error::Config(
            "no log location configured (set path, logging_path or logging_file)".to_string(),
        ))
    }
}
