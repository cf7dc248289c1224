//! Harness configuration
//!
//! The seed range and the pool size are fixed. What can be configured is
//! where runs are stored and which labels get attached to every new run:
//!
//! ```toml
//! store_dir = "runs"
//!
//! [labels]
//! solver = "beam-search"
//! machine = "ci-4core"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

/// Seeds every batch runs
pub const SEED_RANGE: Range<u64> = 100..200;

/// Number of trials running at once
pub const POOL_SIZE: usize = 5;

/// Seeds of a batch as identifiers, in submission order
pub fn batch_seeds() -> Vec<String> {
    SEED_RANGE.map(|seed| seed.to_string()).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    /// Directory holding one JSON document per run
    pub store_dir: PathBuf,

    /// Extra attributes recorded with every run
    pub labels: BTreeMap<String, String>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from("runs"),
            labels: BTreeMap::new(),
        }
    }
}

impl HarnessConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid configuration in {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.store_dir.as_os_str().is_empty() {
            anyhow::bail!("store_dir must not be empty");
        }
        if let Some(key) = self.labels.keys().find(|k| k.trim().is_empty()) {
            anyhow::bail!("label names must not be blank, got {:?}", key);
        }
        Ok(())
    }
}
