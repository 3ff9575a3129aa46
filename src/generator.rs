//! Binding Generator - One Pass per Artifact
//!
//! Reads a declaration file, runs every line through the rule tables and
//! writes the generated sibling. The input is read in full before anything is
//! written, so a missing input never leaves a partial output behind.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::hashing::{compute_rules_hash, sha256_hex};
use crate::io::FileSystem;
use crate::naming::{self, ArtifactKind, UnitPaths};
use crate::rules::{Blacklist, ParamOverrideTable};
use crate::transform::{Canonicalizer, LineOutcome, LineTransformer};

pub const GENERATED_BANNER: &str = "/* THIS FILE IS GENERATED DO NOT EDIT */";
pub const DEFAULT_IMPL_MARKER: &str = "GDMODULE_IMPL";

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("Cannot read input {path}: {source}")]
    InputUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot write output {path}: {source}")]
    OutputUnwritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Not a header or implementation file: {0}")]
    NotADeclarationFile(PathBuf),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    /// Macro defined for the duration of a generated header.
    pub impl_marker: String,
    pub canonicalizer: Canonicalizer,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            impl_marker: DEFAULT_IMPL_MARKER.to_string(),
            canonicalizer: Canonicalizer::new(),
        }
    }
}

/// Include guard plus the module-implementation marker it brackets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderGuard {
    pub token: String,
    pub marker: String,
}

/// A rendered output, before it touches disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedUnit {
    pub path: PathBuf,
    pub kind: ArtifactKind,
    /// Only header outputs are guarded.
    pub guard: Option<HeaderGuard>,
    /// Emitted lines, each with its original terminator.
    pub body: Vec<String>,
    pub lines_in: usize,
    pub blacklisted: usize,
}

impl GeneratedUnit {
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str(GENERATED_BANNER);
        out.push('\n');
        if let Some(guard) = &self.guard {
            out.push_str(&format!("#ifndef {}\n", guard.token));
            out.push_str(&format!("#define {}\n", guard.token));
            out.push_str(&format!("#define {}\n\n", guard.marker));
        }
        for line in &self.body {
            out.push_str(line);
        }
        out.push('\n');
        if let Some(guard) = &self.guard {
            out.push_str(&format!("#undef {}\n", guard.marker));
            out.push_str(&format!("#endif // {}", guard.token));
        }
        out
    }
}

/// Outcome of generating one artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationReport {
    pub kind: ArtifactKind,
    pub source_path: PathBuf,
    pub output_path: PathBuf,
    pub input_hash: String,
    pub rules_hash: String,
    pub output_hash: String,
    pub lines_in: usize,
    pub lines_out: usize,
    pub blacklisted: usize,
    /// False when the output already held identical bytes and was left alone.
    pub changed: bool,
}

/// Both artifacts of one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedPair {
    pub paths: UnitPaths,
    pub header: GenerationReport,
    pub implementation: GenerationReport,
}

impl GeneratedPair {
    pub fn header_path(&self) -> &Path {
        &self.paths.generated_header
    }

    pub fn impl_path(&self) -> &Path {
        &self.paths.generated_impl
    }

    pub fn raw_impl_path(&self) -> &Path {
        &self.paths.raw_impl
    }
}

/// A rendered output whose input has been read but which is not yet on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingArtifact {
    pub source_path: PathBuf,
    pub input_hash: String,
    pub rules_hash: String,
    pub unit: GeneratedUnit,
    pub contents: String,
}

/// Both rendered artifacts of one unit, not yet written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPair {
    pub paths: UnitPaths,
    pub header: PendingArtifact,
    pub implementation: PendingArtifact,
}

pub struct Generator<F: FileSystem> {
    fs: F,
    options: GeneratorOptions,
}

impl<F: FileSystem> Generator<F> {
    pub fn new(fs: F) -> Self {
        Self::with_options(fs, GeneratorOptions::default())
    }

    pub fn with_options(fs: F, options: GeneratorOptions) -> Self {
        Self { fs, options }
    }

    pub fn file_system(&self) -> &F {
        &self.fs
    }

    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    /// Generate both artifacts of the unit `input` belongs to.
    ///
    /// Returns the generated header and implementation paths with their
    /// reports. Both raw files must exist; if either cannot be read, neither
    /// output is written.
    pub fn generate(
        &self,
        input: &Path,
        blacklist: &Blacklist,
        overrides: &ParamOverrideTable,
    ) -> Result<GeneratedPair, GenerateError> {
        let pending = self.prepare(input, blacklist, overrides)?;
        self.commit_pair(pending)
    }

    /// Generate a single output. Its source is recovered from the output path.
    pub fn generate_artifact(
        &self,
        output: &Path,
        blacklist: &Blacklist,
        overrides: &ParamOverrideTable,
    ) -> Result<GenerationReport, GenerateError> {
        let pending = self.prepare_artifact(output, blacklist, overrides)?;
        self.commit(pending)
    }

    /// Read and render both artifacts of a unit without writing anything.
    pub fn prepare(
        &self,
        input: &Path,
        blacklist: &Blacklist,
        overrides: &ParamOverrideTable,
    ) -> Result<PendingPair, GenerateError> {
        let paths = UnitPaths::from_input(input)
            .ok_or_else(|| GenerateError::NotADeclarationFile(input.to_path_buf()))?;

        let header = self.prepare_artifact(&paths.generated_header, blacklist, overrides)?;
        let implementation = self.prepare_artifact(&paths.generated_impl, blacklist, overrides)?;

        Ok(PendingPair {
            paths,
            header,
            implementation,
        })
    }

    /// Read and render one output without writing it.
    pub fn prepare_artifact(
        &self,
        output: &Path,
        blacklist: &Blacklist,
        overrides: &ParamOverrideTable,
    ) -> Result<PendingArtifact, GenerateError> {
        let source = naming::source_path(output)
            .ok_or_else(|| GenerateError::NotADeclarationFile(output.to_path_buf()))?;
        debug!("{} : {}", source.display(), output.display());

        let input = self
            .fs
            .read_to_string(&source)
            .map_err(|source_err| GenerateError::InputUnreadable {
                path: source.clone(),
                source: source_err,
            })?;

        let unit = self.render(output, &input, blacklist, overrides)?;
        let contents = unit.to_text();

        Ok(PendingArtifact {
            source_path: source,
            input_hash: sha256_hex(input.as_bytes()),
            rules_hash: compute_rules_hash(blacklist, overrides)?,
            unit,
            contents,
        })
    }

    pub fn commit_pair(&self, pending: PendingPair) -> Result<GeneratedPair, GenerateError> {
        Ok(GeneratedPair {
            paths: pending.paths,
            header: self.commit(pending.header)?,
            implementation: self.commit(pending.implementation)?,
        })
    }

    /// Write a rendered output unless the file already holds the same bytes.
    pub fn commit(&self, pending: PendingArtifact) -> Result<GenerationReport, GenerateError> {
        let output = pending.unit.path.as_path();
        let changed = match self.fs.read_to_string(output) {
            Ok(existing) => existing != pending.contents,
            Err(_) => true,
        };
        if changed {
            self.fs
                .write(output, &pending.contents)
                .map_err(|source| GenerateError::OutputUnwritable {
                    path: output.to_path_buf(),
                    source,
                })?;
            info!("Generated {}", output.display());
        } else {
            debug!("{} is up to date", output.display());
        }

        Ok(GenerationReport {
            kind: pending.unit.kind,
            source_path: pending.source_path,
            output_path: pending.unit.path.clone(),
            input_hash: pending.input_hash,
            rules_hash: pending.rules_hash,
            output_hash: sha256_hex(pending.contents.as_bytes()),
            lines_in: pending.unit.lines_in,
            lines_out: pending.unit.body.len(),
            blacklisted: pending.unit.blacklisted,
            changed,
        })
    }

    /// Transform `input` into the unit that belongs at `output`. No I/O.
    pub fn render(
        &self,
        output: &Path,
        input: &str,
        blacklist: &Blacklist,
        overrides: &ParamOverrideTable,
    ) -> Result<GeneratedUnit, GenerateError> {
        let kind = ArtifactKind::of(output)
            .ok_or_else(|| GenerateError::NotADeclarationFile(output.to_path_buf()))?;
        let self_include = naming::self_include_marker(output)
            .ok_or_else(|| GenerateError::NotADeclarationFile(output.to_path_buf()))?;

        let guard = match kind {
            ArtifactKind::Header => Some(HeaderGuard {
                token: naming::header_guard(&self_include),
                marker: self.options.impl_marker.clone(),
            }),
            ArtifactKind::Implementation => None,
        };

        let transformer = LineTransformer::new(
            &self_include,
            blacklist,
            overrides,
            &self.options.canonicalizer,
        );

        // CRLF input is read the way a text-mode reader would see it.
        let input = input.replace("\r\n", "\n");
        let mut body = Vec::new();
        let mut lines_in = 0;
        let mut blacklisted = 0;
        for line in input.split_inclusive('\n') {
            lines_in += 1;
            match transformer.transform(line) {
                LineOutcome::Skipped => {}
                LineOutcome::Blacklisted(line) => {
                    blacklisted += 1;
                    body.push(line);
                }
                LineOutcome::Rewritten(line) => body.push(line),
            }
        }

        Ok(GeneratedUnit {
            path: output.to_path_buf(),
            kind,
            guard,
            body,
            lines_in,
            blacklisted,
        })
    }
}
