//! Configuration types.

use crate::buckets::WeekStart;
use crate::format::OutputFormat;
use crate::ingest::IngestMode;
use crate::types::TaskKind;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub ingest: IngestConfig,

    #[serde(default)]
    pub tracking: TrackingConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// Load a single YAML file, without tier merging.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tracking.debounce_ms == 0 {
            bail!("tracking.debounce_ms must be greater than zero");
        }
        if self.tracking.min_phone_digits == 0 {
            bail!("tracking.min_phone_digits must be greater than zero");
        }
        Ok(())
    }
}

/// Filter engine defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// First day of the week for this_week/next_week (sunday or monday).
    #[serde(default)]
    pub week_start: WeekStart,

    /// Vocabulary assumed for task listings (followup or crm).
    #[serde(default)]
    pub default_kind: TaskKind,

    /// Output format for CLI results (json or markdown).
    #[serde(default)]
    pub default_format: OutputFormat,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            week_start: WeekStart::default(),
            default_kind: TaskKind::default(),
            default_format: OutputFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct IngestConfig {
    /// lenient (default) keeps unknown labels; strict rejects them.
    #[serde(default)]
    pub mode: IngestMode,
}

/// Incomplete-order tracking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Inactivity before a draft is forwarded (default: 1000).
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Digits a phone number needs before a draft is tracked (default: 11).
    #[serde(default = "default_min_phone_digits")]
    pub min_phone_digits: usize,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            min_phone_digits: default_min_phone_digits(),
        }
    }
}

fn default_debounce_ms() -> u64 {
    1_000
}

fn default_min_phone_digits() -> usize {
    11
}

/// Where client-side state (cart, wishlist) is kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("followup-engine"))
        .unwrap_or_else(|| PathBuf::from("followup/data"))
}
