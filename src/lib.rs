//! extbind Core - Extension Binding Generator
//!
//! Turns hand-written extension interface files into module-bound sources.
//!
//! # Guarantees
//! 1. Same input, same rules, same bytes
//! 2. A missing input fails the pass before any output is written
//! 3. Rules that match nothing do nothing
//! 4. A module compiles the generated implementation, never the raw one

pub mod naming;
pub mod rules;
pub mod transform;
pub mod io;
pub mod hashing;
pub mod generator;
pub mod sources;
pub mod manifest;
pub mod pipeline;

pub use naming::{ArtifactKind, UnitPaths, header_guard};
pub use rules::{Blacklist, OverrideRecord, ParamOverrideTable, RuleSet, RulesError};
pub use transform::{Canonicalizer, LineOutcome, LineTransformer};
pub use io::{FileSystem, MemoryFileSystem, StdFileSystem};
pub use hashing::{canonical_json, compute_rules_hash, sha256_hex};
pub use generator::{
    GenerateError, GeneratedPair, GeneratedUnit, GenerationReport, Generator, GeneratorOptions,
    PendingArtifact, PendingPair,
};
pub use sources::{reconcile_sources, reconcile_unit, BuildSource, SourceEntry};
pub use manifest::{Manifest, ManifestError, ModuleCapability, UnitSpec};
pub use pipeline::{ModulePipeline, ModuleReport, PipelineError};

pub const GENERATOR_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const MIN_MANIFEST_VERSION: &str = "1.0.0";
