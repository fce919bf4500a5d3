//! Configuration for page extraction.

use std::path::{Path, PathBuf};
use std::time::Duration;

use docraster_process::RunnerConfig;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use tracing::debug;

use crate::error::{ExtractError, ExtractResult};

/// Seconds a single rasterizer run may take before it is killed.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 120;

/// Rendering resolution in DPI.
pub const DEFAULT_DENSITY: u32 = 150;

/// Extraction configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Per-invocation timeout in seconds
    pub timeout_seconds: u64,
    /// Rendering resolution in DPI
    pub density: u32,
    /// Executable settings
    pub tools: ToolsConfig,
    /// Subprocess runner settings
    pub runner: RunnerSection,
}

/// External tool locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Poppler's `pdftocairo`
    pub pdftocairo: String,
    /// GraphicsMagick's `gm`
    pub gm: String,
    /// `OMP_NUM_THREADS` for GraphicsMagick
    pub gm_threads: u32,
}

/// Runner settings as they appear in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerSection {
    /// Shell that interprets command lines
    pub shell: PathBuf,
    /// Milliseconds to keep draining output after exit or kill
    pub drain_grace_ms: u64,
    /// Milliseconds to wait for a killed process to be reaped
    pub reap_grace_ms: u64,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            density: DEFAULT_DENSITY,
            tools: ToolsConfig::default(),
            runner: RunnerSection::default(),
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            pdftocairo: "pdftocairo".to_string(),
            gm: "gm".to_string(),
            gm_threads: 2,
        }
    }
}

impl Default for RunnerSection {
    fn default() -> Self {
        let runner = RunnerConfig::default();
        Self {
            shell: runner.shell,
            drain_grace_ms: runner.drain_grace.as_millis() as u64,
            reap_grace_ms: runner.reap_grace.as_millis() as u64,
        }
    }
}

impl ExtractConfig {
    /// Load configuration from a YAML file.
    ///
    /// Missing keys take their defaults; a missing file yields the defaults.
    pub fn from_file(path: &Path) -> ExtractResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with hierarchy support.
    ///
    /// Configuration hierarchy (highest to lowest priority):
    /// 1. Project-level config (`config/docraster.yaml`)
    /// 2. User-level config (`~/.docraster/config.yaml`)
    /// 3. Built-in defaults
    ///
    /// Files are merged key by key, so a project file only needs the keys it
    /// changes.
    pub fn load_with_hierarchy() -> ExtractResult<Self> {
        let mut paths = Vec::new();
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".docraster").join("config.yaml"));
        }
        paths.push(PathBuf::from("config").join("docraster.yaml"));
        Self::load_layers(&paths)
    }

    /// Merge the given files in order, later files winning.
    pub fn load_layers(paths: &[PathBuf]) -> ExtractResult<Self> {
        let mut merged = serde_yaml::to_value(Self::default())?;

        for path in paths.iter().filter(|p| p.exists()) {
            debug!(path = %path.display(), "Loading config layer");
            let content = std::fs::read_to_string(path)?;
            let layer: Value = serde_yaml::from_str(&content)?;
            merge_values(&mut merged, layer);
        }

        let config: Self = serde_yaml::from_value(merged)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no extraction can run with.
    pub fn validate(&self) -> ExtractResult<()> {
        if self.timeout_seconds == 0 {
            return Err(ExtractError::Config(
                "timeout_seconds must be greater than 0".to_string(),
            ));
        }
        if self.density == 0 {
            return Err(ExtractError::Config(
                "density must be greater than 0".to_string(),
            ));
        }
        if self.tools.gm_threads == 0 {
            return Err(ExtractError::Config(
                "tools.gm_threads must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Per-invocation timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Runner configuration derived from the `runner` section.
    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig::new()
            .shell(&self.runner.shell)
            .drain_grace(Duration::from_millis(self.runner.drain_grace_ms))
            .reap_grace(Duration::from_millis(self.runner.reap_grace_ms))
    }
}

fn merge_values(base: &mut Value, layer: Value) {
    match (base, layer) {
        (Value::Mapping(base), Value::Mapping(layer)) => {
            for (key, value) in layer {
                match base.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, layer) => *base = layer,
    }
}
