//! Settings for one resolution pass.
//!
//! Every field has a default, so a JSON config file only needs to name what it
//! changes:
//!
//! ```json
//! { "failure_policy": "best_effort", "fallback_timeout_secs": 10 }
//! ```

use crate::error::{DiscoveryError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_FALLBACK_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Abort the pass on the first error.
    #[default]
    FailFast,
    /// Record failures in the report and keep going.
    BestEffort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptorMode {
    /// Every line is a candidate, blank and `#` lines included.
    #[default]
    Verbatim,
    /// `java.util.ServiceLoader` rules: strip comments, trim, skip empty lines.
    Lenient,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub failure_policy: FailurePolicy,
    pub descriptor_mode: DescriptorMode,
    pub dynamic_fallback: bool,
    pub parallel: bool,
    pub java_executable: Option<PathBuf>,
    /// Zero disables the timeout.
    pub fallback_timeout_secs: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::FailFast,
            descriptor_mode: DescriptorMode::Verbatim,
            dynamic_fallback: true,
            parallel: false,
            java_executable: None,
            fallback_timeout_secs: DEFAULT_FALLBACK_TIMEOUT_SECS,
        }
    }
}

impl ScanConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            DiscoveryError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn fallback_timeout(&self) -> Option<Duration> {
        (self.fallback_timeout_secs > 0).then(|| Duration::from_secs(self.fallback_timeout_secs))
    }
}
