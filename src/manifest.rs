//! Module Manifest - Units, Rules and Build Sources
//!
//! One JSON file per module. Paths inside it are relative to the manifest's
//! directory.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::generator::{GeneratorOptions, DEFAULT_IMPL_MARKER};
use crate::rules::{Blacklist, ParamOverrideTable};
use crate::sources::SourceEntry;
use crate::transform::Canonicalizer;
use crate::MIN_MANIFEST_VERSION;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Failed to read manifest {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid manifest: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Build-capability gate the host orchestrator consults per module.
pub trait ModuleCapability {
    fn can_build(&self, platform: &str) -> bool;
    fn doc_classes(&self) -> Vec<String>;
}

/// One interface file and the rules applied to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSpec {
    pub header: PathBuf,
    #[serde(default)]
    pub blacklist: Blacklist,
    #[serde(default)]
    pub function_params: ParamOverrideTable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub name: String,
    #[serde(default = "default_min_version")]
    pub generator_min_version: String,
    /// Empty means every platform.
    #[serde(default)]
    pub platforms: Vec<String>,
    #[serde(default)]
    pub doc_classes: Vec<String>,
    #[serde(default = "default_impl_marker")]
    pub impl_marker: String,
    /// Extra `(extension type, public type)` renames, after the built-in ones.
    #[serde(default)]
    pub type_renames: Vec<(String, String)>,
    #[serde(default)]
    pub units: Vec<UnitSpec>,
    #[serde(default)]
    pub sources: Vec<SourceEntry>,
}

fn default_min_version() -> String { MIN_MANIFEST_VERSION.to_string() }
fn default_impl_marker() -> String { DEFAULT_IMPL_MARKER.to_string() }

impl Manifest {
    pub fn from_json(content: &str) -> Result<Self, ManifestError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn generator_options(&self) -> GeneratorOptions {
        GeneratorOptions {
            impl_marker: self.impl_marker.clone(),
            canonicalizer: Canonicalizer::with_type_renames(self.type_renames.iter().cloned()),
        }
    }
}

impl ModuleCapability for Manifest {
    fn can_build(&self, platform: &str) -> bool {
        self.platforms.is_empty() || self.platforms.iter().any(|p| p == platform)
    }

    fn doc_classes(&self) -> Vec<String> {
        self.doc_classes.clone()
    }
}
