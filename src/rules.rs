//! Rule Tables - Blacklist and Per-Member Overrides
//!
//! Rules never fail to apply. A name that matches nothing is a no-op.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RulesError {
    #[error("Failed to read rules {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid rules {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Member names removed from the generated virtual surface.
///
/// Ordered: the first name that matches a line decides how it is handled.
/// Duplicates and empty names are dropped on insert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Blacklist {
    names: Vec<String>,
}

impl Blacklist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if name.is_empty() || self.contains(&name) {
            return false;
        }
        self.names.push(name);
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl From<Vec<String>> for Blacklist {
    fn from(names: Vec<String>) -> Self {
        names.into_iter().collect()
    }
}

impl From<Blacklist> for Vec<String> {
    fn from(blacklist: Blacklist) -> Self {
        blacklist.names
    }
}

impl<S: Into<String>> FromIterator<S> for Blacklist {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut blacklist = Self::new();
        for name in iter {
            blacklist.insert(name);
        }
        blacklist
    }
}

/// Per-member rewrite applied to every line mentioning the member.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideRecord {
    /// Replaces the first space-delimited token of the line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_return_type: Option<String>,

    /// Literal `(find, replace)` substitution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_replace: Option<(String, String)>,
}

impl OverrideRecord {
    pub fn return_type(ty: impl Into<String>) -> Self {
        Self {
            override_return_type: Some(ty.into()),
            text_replace: None,
        }
    }

    pub fn text_replace(find: impl Into<String>, replace: impl Into<String>) -> Self {
        Self {
            override_return_type: None,
            text_replace: Some((find.into(), replace.into())),
        }
    }

    pub fn with_text_replace(mut self, find: impl Into<String>, replace: impl Into<String>) -> Self {
        self.text_replace = Some((find.into(), replace.into()));
        self
    }
}

/// Member name -> override. Iterates in authoring order, which decides the
/// result when several entries match one line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamOverrideTable {
    entries: IndexMap<String, OverrideRecord>,
}

impl ParamOverrideTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, member: impl Into<String>, record: OverrideRecord) -> Option<OverrideRecord> {
        self.entries.insert(member.into(), record)
    }

    pub fn get(&self, member: &str) -> Option<&OverrideRecord> {
        self.entries.get(member)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OverrideRecord)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, OverrideRecord)> for ParamOverrideTable {
    fn from_iter<I: IntoIterator<Item = (S, OverrideRecord)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Both rule tables for one unit, as stored in a rules file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(default)]
    pub blacklist: Blacklist,
    #[serde(default)]
    pub function_params: ParamOverrideTable,
}

impl RuleSet {
    pub fn load(path: &Path) -> Result<Self, RulesError> {
        let content = fs::read_to_string(path).map_err(|source| RulesError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| RulesError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// `Type::name` occurrence, as in an out-of-class definition.
pub fn mentions_qualified(line: &str, member: &str) -> bool {
    line.contains(&format!("::{}", member))
}

/// `" name"` occurrence, as in an in-class declaration.
pub fn mentions_bare(line: &str, member: &str) -> bool {
    line.contains(&format!(" {}", member))
}

pub fn mentions_member(line: &str, member: &str) -> bool {
    !member.is_empty() && (mentions_qualified(line, member) || mentions_bare(line, member))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blacklist_dedups_and_keeps_order() {
        let blacklist: Blacklist = ["_step", "", "_init", "_step"].into_iter().collect();
        assert_eq!(blacklist.iter().collect::<Vec<_>>(), vec!["_step", "_init"]);
    }

    #[test]
    fn test_rule_set_from_json() {
        let rules: RuleSet = serde_json::from_str(
            r#"{
                "blacklist": ["_body_get_direct_state"],
                "function_params": {
                    "_space_get_direct_state": { "override_return_type": "PhysicsDirectSpaceState3D*" },
                    "_body_test_motion": { "text_replace": ["PhysicsServer3DExtensionMotionResult", "MotionResult"] }
                }
            }"#,
        )
        .unwrap();

        assert!(rules.blacklist.contains("_body_get_direct_state"));
        assert_eq!(
            rules.function_params.get("_space_get_direct_state").unwrap().override_return_type.as_deref(),
            Some("PhysicsDirectSpaceState3D*")
        );
        assert_eq!(
            rules.function_params.get("_body_test_motion").unwrap().text_replace,
            Some(("PhysicsServer3DExtensionMotionResult".to_string(), "MotionResult".to_string()))
        );
    }

    #[test]
    fn test_override_table_keeps_authoring_order() {
        let rules: RuleSet = serde_json::from_str(
            r#"{ "function_params": { "_zz": {}, "_aa": {}, "_mm": {} } }"#,
        )
        .unwrap();
        let members: Vec<_> = rules.function_params.iter().map(|(name, _)| name).collect();
        assert_eq!(members, vec!["_zz", "_aa", "_mm"]);
    }

    #[test]
    fn test_empty_rule_set_defaults() {
        let rules: RuleSet = serde_json::from_str("{}").unwrap();
        assert!(rules.blacklist.is_empty());
        assert!(rules.function_params.is_empty());
    }

    #[test]
    fn test_member_mentions() {
        assert!(mentions_qualified("void Foo::bar(int x)", "bar"));
        assert!(mentions_bare("\tvirtual void bar(int x) override;", "bar"));
        assert!(!mentions_member("void foobar();", "bar"));
        assert!(!mentions_member("void bar();", ""));
    }
}
