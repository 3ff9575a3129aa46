//! File-Naming Convention
//!
//! `X.hpp` <-> `X.gen.hpp`, `X.cpp` <-> `X.gen.cpp`.
//! Downstream staleness tracking keys on these names, so they are bit-exact.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const HEADER_SUFFIX: &str = ".hpp";
pub const IMPL_SUFFIX: &str = ".cpp";
pub const GENERATED_HEADER_SUFFIX: &str = ".gen.hpp";
pub const GENERATED_IMPL_SUFFIX: &str = ".gen.cpp";

/// Which side of a unit a file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Header,
    Implementation,
}

impl ArtifactKind {
    /// Classify a path by its extension. Generated and raw files share a kind.
    pub fn of(path: &Path) -> Option<Self> {
        let name = file_name(path)?;
        if name.ends_with(HEADER_SUFFIX) {
            Some(Self::Header)
        } else if name.ends_with(IMPL_SUFFIX) {
            Some(Self::Implementation)
        } else {
            None
        }
    }

    pub fn raw_suffix(self) -> &'static str {
        match self {
            Self::Header => HEADER_SUFFIX,
            Self::Implementation => IMPL_SUFFIX,
        }
    }

    pub fn generated_suffix(self) -> &'static str {
        match self {
            Self::Header => GENERATED_HEADER_SUFFIX,
            Self::Implementation => GENERATED_IMPL_SUFFIX,
        }
    }
}

/// The four paths that make up one generated unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitPaths {
    pub raw_header: PathBuf,
    pub raw_impl: PathBuf,
    pub generated_header: PathBuf,
    pub generated_impl: PathBuf,
}

impl UnitPaths {
    /// Derive the unit from any of its members (raw or generated, header or
    /// implementation).
    pub fn from_input(path: &Path) -> Option<Self> {
        let name = file_name(path)?;
        let stem = [
            GENERATED_HEADER_SUFFIX,
            GENERATED_IMPL_SUFFIX,
            HEADER_SUFFIX,
            IMPL_SUFFIX,
        ]
        .iter()
        .find_map(|suffix| name.strip_suffix(suffix))?;

        let sibling = |suffix: &str| path.with_file_name(format!("{}{}", stem, suffix));
        Some(Self {
            raw_header: sibling(HEADER_SUFFIX),
            raw_impl: sibling(IMPL_SUFFIX),
            generated_header: sibling(GENERATED_HEADER_SUFFIX),
            generated_impl: sibling(GENERATED_IMPL_SUFFIX),
        })
    }
}

/// Output path for a declaration file. Already-generated paths map to themselves.
pub fn generated_path(path: &Path) -> Option<PathBuf> {
    let kind = ArtifactKind::of(path)?;
    let name = file_name(path)?;
    if name.ends_with(kind.generated_suffix()) {
        return Some(path.to_path_buf());
    }
    replace_suffix(path, kind.raw_suffix(), kind.generated_suffix())
}

/// Reverse of [`generated_path`]: the file a generated output is read from.
pub fn source_path(generated: &Path) -> Option<PathBuf> {
    let kind = ArtifactKind::of(generated)?;
    replace_suffix(generated, kind.generated_suffix(), kind.raw_suffix())
}

/// Include-guard token: base name, dots to underscores, upper-cased.
///
/// `foo_bar.gen.hpp` becomes `FOO_BAR_GEN_HPP`.
pub fn header_guard(file_name: &str) -> String {
    file_name.replace('.', "_").to_uppercase()
}

/// Text that marks a line as including the unit's own generated header.
///
/// For implementation outputs `X.gen.cpp` this is `X.gen.h`, which is also a
/// prefix of `X.gen.hpp`.
pub fn self_include_marker(output: &Path) -> Option<String> {
    let name = file_name(output)?;
    Some(name.replace(GENERATED_IMPL_SUFFIX, ".gen.h"))
}

fn replace_suffix(path: &Path, from: &str, to: &str) -> Option<PathBuf> {
    let name = file_name(path)?;
    let stem = name.strip_suffix(from)?;
    Some(path.with_file_name(format!("{}{}", stem, to)))
}

fn file_name(path: &Path) -> Option<&str> {
    path.file_name()?.to_str()
}
