//! Module Pipeline - Single Entry Point for Manifest Builds
//!
//! Version gate, platform gate, then every unit is generated and folded into
//! the module's source list.

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::generator::{GenerateError, GeneratedPair, Generator};
use crate::hashing::compute_manifest_hash;
use crate::io::FileSystem;
use crate::manifest::{Manifest, ModuleCapability};
use crate::sources::{reconcile_unit, SourceEntry};
use crate::GENERATOR_VERSION;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Module {module} cannot be built for platform {platform}")]
    UnsupportedPlatform { module: String, platform: String },

    #[error("Manifest requires generator >= {0}, current is {1}")]
    GeneratorVersionMismatch(String, String),

    #[error("Invalid version: {0}")]
    InvalidVersion(String),

    #[error("Generation failed: {0}")]
    Generate(#[from] GenerateError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleReport {
    pub module: String,
    pub platform: String,
    pub generator_version: String,
    pub generated_at: DateTime<Utc>,
    pub manifest_hash: String,
    pub units: Vec<GeneratedPair>,
    /// The manifest's source list after every unit was reconciled.
    pub sources: Vec<SourceEntry>,
    pub doc_classes: Vec<String>,
}

impl ModuleReport {
    pub fn changed_outputs(&self) -> usize {
        self.units
            .iter()
            .map(|u| u.header.changed as usize + u.implementation.changed as usize)
            .sum()
    }
}

pub struct ModulePipeline<F: FileSystem> {
    fs: F,
}

impl<F: FileSystem> ModulePipeline<F> {
    pub fn new(fs: F) -> Self {
        Self { fs }
    }

    pub fn file_system(&self) -> &F {
        &self.fs
    }

    /// Generate every unit of `manifest` for `platform`.
    pub fn build(&self, manifest: &Manifest, platform: &str) -> Result<ModuleReport, PipelineError> {
        self.check_generator_version(manifest)?;

        if !manifest.can_build(platform) {
            warn!("Skipping module {} on {}", manifest.name, platform);
            return Err(PipelineError::UnsupportedPlatform {
                module: manifest.name.clone(),
                platform: platform.to_string(),
            });
        }

        let generator = Generator::with_options(&self.fs, manifest.generator_options());

        // Every unit is read and rendered before the first output is written.
        let pending = manifest
            .units
            .iter()
            .map(|unit| generator.prepare(&unit.header, &unit.blacklist, &unit.function_params))
            .collect::<Result<Vec<_>, _>>()?;

        let mut sources = manifest.sources.clone();
        let mut units = Vec::with_capacity(pending.len());
        for pair in pending {
            let pair = generator.commit_pair(pair)?;
            sources = reconcile_unit(&sources, &pair.paths);
            units.push(pair);
        }

        let report = ModuleReport {
            module: manifest.name.clone(),
            platform: platform.to_string(),
            generator_version: GENERATOR_VERSION.to_string(),
            generated_at: Utc::now(),
            manifest_hash: compute_manifest_hash(manifest)?,
            units,
            sources,
            doc_classes: manifest.doc_classes(),
        };
        info!(
            "Module {}: {} units, {} outputs rewritten",
            report.module,
            report.units.len(),
            report.changed_outputs()
        );
        Ok(report)
    }

    fn check_generator_version(&self, manifest: &Manifest) -> Result<(), PipelineError> {
        let current = semver::Version::parse(GENERATOR_VERSION)
            .map_err(|_| PipelineError::InvalidVersion(GENERATOR_VERSION.to_string()))?;
        let required = semver::Version::parse(&manifest.generator_min_version)
            .map_err(|_| PipelineError::InvalidVersion(manifest.generator_min_version.clone()))?;

        if current < required {
            return Err(PipelineError::GeneratorVersionMismatch(
                manifest.generator_min_version.clone(),
                GENERATOR_VERSION.to_string(),
            ));
        }

        Ok(())
    }
}
