//! Loader configuration

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// What to do when a file's columns differ from the first loaded file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnConsistency {
    /// Abort the load
    #[default]
    Error,
    /// Report the difference and keep the file
    Warning,
    /// Never compare columns
    Ignore,
}

impl FromStr for ColumnConsistency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(ColumnConsistency::Error),
            "warning" => Ok(ColumnConsistency::Warning),
            "ignore" => Ok(ColumnConsistency::Ignore),
            _ => Err(Error::InvalidConsistency(s.to_string())),
        }
    }
}

impl fmt::Display for ColumnConsistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnConsistency::Error => "error",
            ColumnConsistency::Warning => "warning",
            ColumnConsistency::Ignore => "ignore",
        };
        f.write_str(name)
    }
}

/// Settings for one load
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// File or directory to load
    pub root_path: PathBuf,
    /// Descend into subdirectories
    #[serde(default)]
    pub include_subfolders: bool,
    /// Report per-file outcomes and a summary
    #[serde(default = "default_verbose")]
    pub verbose: bool,
    /// Column consistency policy
    #[serde(default)]
    pub column_consistency: ColumnConsistency,
}

fn default_verbose() -> bool {
    true
}

impl LoaderConfig {
    /// Configuration with defaults: no subfolders, verbose, `Error` policy
    pub fn new(root_path: impl Into<PathBuf>) -> Self {
        Self {
            root_path: root_path.into(),
            include_subfolders: false,
            verbose: true,
            column_consistency: ColumnConsistency::Error,
        }
    }

    pub fn include_subfolders(mut self, include: bool) -> Self {
        self.include_subfolders = include;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn column_consistency(mut self, policy: ColumnConsistency) -> Self {
        self.column_consistency = policy;
        self
    }

    /// Load a configuration from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| Error::FileRead {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(Error::Json)
    }

    /// Save the configuration to a JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
