//! Build Source Reconciliation
//!
//! A module contributes exactly one implementation artifact to the build:
//! the generated one. The raw path is removed, the generated path appended
//! when missing.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use crate::naming::UnitPaths;

/// An entry in a caller's compiled-source list.
pub trait BuildSource {
    fn source_path(&self) -> &Path;

    /// The entry appended when the generated implementation is missing.
    fn from_generated(path: &Path) -> Self;
}

impl BuildSource for PathBuf {
    fn source_path(&self) -> &Path {
        self
    }

    fn from_generated(path: &Path) -> Self {
        path.to_path_buf()
    }
}

impl BuildSource for String {
    fn source_path(&self) -> &Path {
        Path::new(self.as_str())
    }

    fn from_generated(path: &Path) -> Self {
        path.to_string_lossy().into_owned()
    }
}

/// A source list entry as written in a manifest: a bare path, or an object
/// with a `path` and whatever else the host attaches to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceEntry {
    Path(PathBuf),
    Node {
        path: PathBuf,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
}

impl BuildSource for SourceEntry {
    fn source_path(&self) -> &Path {
        match self {
            Self::Path(path) => path,
            Self::Node { path, .. } => path,
        }
    }

    fn from_generated(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

/// Replace `raw_impl` with `generated_impl` in `sources`.
///
/// Only the first entry equal to `raw_impl` is removed. `generated_impl` is
/// appended unless some entry already names it. The input is not modified.
pub fn reconcile_sources<S: BuildSource + Clone>(
    sources: &[S],
    generated_impl: &Path,
    raw_impl: &Path,
) -> Vec<S> {
    let mut reconciled = sources.to_vec();
    if let Some(index) = reconciled.iter().position(|s| s.source_path() == raw_impl) {
        reconciled.remove(index);
    }
    if !reconciled.iter().any(|s| s.source_path() == generated_impl) {
        reconciled.push(S::from_generated(generated_impl));
    }
    reconciled
}

/// [`reconcile_sources`] for one unit's derived paths.
pub fn reconcile_unit<S: BuildSource + Clone>(sources: &[S], paths: &UnitPaths) -> Vec<S> {
    reconcile_sources(sources, &paths.generated_impl, &paths.raw_impl)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_raw_replaced_by_generated() {
        let sources = strings(&["a.cpp", "b.cpp"]);
        let out = reconcile_sources(&sources, Path::new("b.gen.cpp"), Path::new("b.cpp"));
        assert_eq!(out, strings(&["a.cpp", "b.gen.cpp"]));
        // Caller's list untouched
        assert_eq!(sources, strings(&["a.cpp", "b.cpp"]));
    }

    #[test]
    fn test_already_generated_unchanged() {
        let sources = strings(&["b.gen.cpp", "a.cpp"]);
        let out = reconcile_sources(&sources, Path::new("b.gen.cpp"), Path::new("b.cpp"));
        assert_eq!(out, sources);
    }

    #[test]
    fn test_neither_present_appends_generated() {
        let sources = strings(&["a.cpp"]);
        let out = reconcile_sources(&sources, Path::new("b.gen.cpp"), Path::new("b.cpp"));
        assert_eq!(out, strings(&["a.cpp", "b.gen.cpp"]));
    }

    #[test]
    fn test_both_present_drops_raw() {
        let sources = strings(&["b.cpp", "a.cpp", "b.gen.cpp"]);
        let out = reconcile_sources(&sources, Path::new("b.gen.cpp"), Path::new("b.cpp"));
        assert_eq!(out, strings(&["a.cpp", "b.gen.cpp"]));
    }

    #[test]
    fn test_node_entries_matched_by_path() {
        let sources: Vec<SourceEntry> =
            serde_json::from_value(json!(["a.cpp", {"path": "src/b.cpp", "flags": ["-O2"]}])).unwrap();

        let paths = UnitPaths::from_input(Path::new("src/b.hpp")).unwrap();
        let out = reconcile_unit(&sources, &paths);

        assert_eq!(
            serde_json::to_value(&out).unwrap(),
            json!(["a.cpp", "src/b.gen.cpp"])
        );
    }

    #[test]
    fn test_node_entry_survives_when_generated() {
        let sources: Vec<SourceEntry> =
            serde_json::from_value(json!([{"path": "b.gen.cpp", "flags": ["-O2"]}])).unwrap();
        let out = reconcile_sources(&sources, Path::new("b.gen.cpp"), Path::new("b.cpp"));
        assert_eq!(
            serde_json::to_value(&out).unwrap(),
            json!([{"path": "b.gen.cpp", "flags": ["-O2"]}])
        );
    }
}
