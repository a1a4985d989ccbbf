//! Runtime configuration and application paths.
//!
//! Priority for [`BusConfig`]:
//! 1. `--config FILE` CLI argument
//! 2. `MEDIABUS_CONFIG` environment variable (path to a JSON file)
//! 3. Defaults
//!
//! Individual fields can then be overridden with `MEDIABUS_MAX_DEPTH` and
//! `MEDIABUS_TRACE`.

use anyhow::{Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::emitter::{DEFAULT_MAX_DISPATCH_DEPTH, EmitterConfig};

pub const ENV_CONFIG: &str = "MEDIABUS_CONFIG";
pub const ENV_MAX_DEPTH: &str = "MEDIABUS_MAX_DEPTH";
pub const ENV_TRACE: &str = "MEDIABUS_TRACE";

/// Dispatch settings shared by every emitter a session creates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Nested trigger limit per emitter
    pub max_dispatch_depth: usize,
    /// Log each listener invocation at trace level
    pub trace_triggers: bool,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            max_dispatch_depth: DEFAULT_MAX_DISPATCH_DEPTH,
            trace_triggers: false,
        }
    }
}

impl BusConfig {
    /// Load from a JSON file. Missing fields take defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: BusConfig = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        debug!("Loaded config from {}: {:?}", path.display(), config);
        Ok(config.sanitized())
    }

    /// Resolve config from CLI argument, environment, then defaults.
    pub fn from_env_and_cli(cli_path: Option<&Path>) -> Result<Self> {
        let path = cli_path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var(ENV_CONFIG).ok().map(PathBuf::from));

        let base = match path {
            Some(path) => Self::load(&path)?,
            None => Self::default(),
        };
        Ok(base.with_overrides(|key| std::env::var(key).ok()))
    }

    /// Apply `MEDIABUS_*` overrides looked up through `lookup`.
    /// Unparseable values are ignored with a warning.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(raw) = lookup(ENV_MAX_DEPTH) {
            match raw.trim().parse::<usize>() {
                Ok(depth) => self.max_dispatch_depth = depth,
                Err(_) => warn!("Ignoring {}={:?}: not a number", ENV_MAX_DEPTH, raw),
            }
        }
        if let Some(raw) = lookup(ENV_TRACE) {
            match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.trace_triggers = true,
                "0" | "false" | "no" | "off" | "" => self.trace_triggers = false,
                _ => warn!("Ignoring {}={:?}: expected a boolean", ENV_TRACE, raw),
            }
        }
        self.sanitized()
    }

    fn sanitized(mut self) -> Self {
        if self.max_dispatch_depth == 0 {
            warn!("max_dispatch_depth 0 would drop every event, using 1");
            self.max_dispatch_depth = 1;
        }
        self
    }

    pub fn emitter_config(&self) -> EmitterConfig {
        EmitterConfig {
            max_dispatch_depth: self.max_dispatch_depth,
            trace_triggers: self.trace_triggers,
        }
    }
}

/// Get path to a data file (logs, etc.)
///
/// Platform paths:
/// - Linux: ~/.local/share/mediabus/{name}
/// - macOS: ~/Library/Application Support/mediabus/{name}
/// - Windows: %APPDATA%\mediabus\{name}
pub fn data_file(name: &str) -> PathBuf {
    dirs_next::data_dir()
        .map(|dir| dir.join("mediabus"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(name)
}

/// Create the parent directory of `path` if needed.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }
    Ok(())
}
