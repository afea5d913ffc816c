use serde::{Deserialize, Serialize};

use crate::algo::flatten::FlattenDepth;
use crate::error::{DatasetError, Result};

/// Dataset assembly settings, parsed from TOML.
///
/// Every key is optional; a missing key takes the default shown on the field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatasetConfig {
    /// Flatten policy for nested objects (default: shallow).
    #[serde(default)]
    pub flatten: FlattenDepth,

    /// Lower bound of the sample-row window (default: 5).
    #[serde(default = "default_sample_min")]
    pub sample_min: usize,

    /// Upper bound of the sample-row window (default: 10).
    #[serde(default = "default_sample_max")]
    pub sample_max: usize,

    /// Distinct-value cutoff for categorical string fields (default: 50).
    #[serde(default = "default_cardinality_threshold")]
    pub cardinality_threshold: usize,

    /// Rows shown by `preview` when no limit is given (default: 20).
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,

    /// Datasets kept by the MCP server's cache (default: 16).
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

fn default_sample_min() -> usize {
    crate::algo::dataset::SAMPLE_MIN
}

fn default_sample_max() -> usize {
    crate::algo::dataset::SAMPLE_MAX
}

fn default_cardinality_threshold() -> usize {
    crate::algo::infer::CARDINALITY_THRESHOLD
}

fn default_preview_rows() -> usize {
    20
}

fn default_cache_capacity() -> usize {
    16
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            flatten: FlattenDepth::default(),
            sample_min: default_sample_min(),
            sample_max: default_sample_max(),
            cardinality_threshold: default_cardinality_threshold(),
            preview_rows: default_preview_rows(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

impl DatasetConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DatasetError::Config(format!("{path}: {e}")))?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| DatasetError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.sample_min > self.sample_max {
            return Err(DatasetError::Config(format!(
                "sample_min ({}) exceeds sample_max ({})",
                self.sample_min, self.sample_max
            )));
        }
        if self.cache_capacity == 0 {
            return Err(DatasetError::Config("cache_capacity must be at least 1".into()));
        }
        Ok(())
    }
}
