//! Seed corpus configuration

use crate::error::ConfigResult;
use crate::validation::{validate_required_string, Validatable};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where the newline-delimited payload corpus lives
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    #[serde(default = "default_path")]
    pub path: PathBuf,

    /// Drop blank lines while loading
    #[serde(default)]
    pub skip_blank_lines: bool,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            skip_blank_lines: false,
        }
    }
}

impl Validatable for CorpusConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(&self.path.to_string_lossy(), "path", self.domain_name())
    }

    fn domain_name(&self) -> &'static str {
        "corpus"
    }
}

fn default_path() -> PathBuf {
    PathBuf::from("sonnets.txt")
}
