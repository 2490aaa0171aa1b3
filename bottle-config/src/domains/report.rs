//! Report output configuration

use crate::error::ConfigResult;
use crate::validation::{validate_required_string, Validatable};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Report output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Directory receiving the CSV files; the working directory is used when it is missing
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            results_dir: default_results_dir(),
        }
    }
}

impl Validatable for ReportConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(
            &self.results_dir.to_string_lossy(),
            "results_dir",
            self.domain_name(),
        )
    }

    fn domain_name(&self) -> &'static str {
        "report"
    }
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("../results")
}
