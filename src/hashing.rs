//! Fingerprints - SHA-256 over Inputs, Rules and Outputs
//!
//! Reports carry these so a build can tell whether a unit is stale.

use sha2::{Digest, Sha256};
use serde::Serialize;
use serde_json::{to_string, Value};

use crate::rules::{Blacklist, OverrideRecord, ParamOverrideTable};

/// Compute SHA-256 hash of bytes, return hex string
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    hex::encode(result)
}

/// Convert to canonical JSON (sorted keys, no whitespace)
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let v: Value = serde_json::to_value(value)?;
    let sorted = sort_value(&v);
    to_string(&sorted)
}

fn sort_value(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut sorted: Vec<_> = map.iter().collect();
            sorted.sort_by(|a, b| a.0.cmp(b.0));
            let sorted_map: serde_json::Map<String, Value> = sorted
                .into_iter()
                .map(|(k, v)| (k.clone(), sort_value(v)))
                .collect();
            Value::Object(sorted_map)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_value).collect()),
        _ => v.clone(),
    }
}

/// Fingerprint of one unit's rule tables.
///
/// Both tables are order-significant, so overrides are hashed as an ordered
/// list of `[member, record]` pairs rather than a (sorted) object.
pub fn compute_rules_hash(
    blacklist: &Blacklist,
    overrides: &ParamOverrideTable,
) -> Result<String, serde_json::Error> {
    #[derive(Serialize)]
    struct Rules<'a> {
        blacklist: &'a Blacklist,
        function_params: Vec<(&'a str, &'a OverrideRecord)>,
    }

    let canonical = canonical_json(&Rules {
        blacklist,
        function_params: overrides.iter().collect(),
    })?;
    Ok(sha256_hex(canonical.as_bytes()))
}

/// Fingerprint of a whole manifest, for build reports.
pub fn compute_manifest_hash<T: Serialize>(manifest: &T) -> Result<String, serde_json::Error> {
    let canonical = canonical_json(manifest)?;
    Ok(sha256_hex(canonical.as_bytes()))
}

mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{:02x}", b)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_json_sorted() {
        let obj = json!({"z": 1, "a": 2, "m": 3});
        let canonical = canonical_json(&obj).unwrap();
        assert_eq!(canonical, r#"{"a":2,"m":3,"z":1}"#);
    }

    #[test]
    fn test_sha256_known_value() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_rules_hash_stable() {
        let blacklist: Blacklist = ["_step"].into_iter().collect();
        let overrides: ParamOverrideTable =
            [("_get", OverrideRecord::return_type("int"))].into_iter().collect();

        let h1 = compute_rules_hash(&blacklist, &overrides).unwrap();
        let h2 = compute_rules_hash(&blacklist.clone(), &overrides.clone()).unwrap();
        assert_eq!(h1, h2);
    }

    #[test]
    fn test_rules_hash_sensitive_to_blacklist_order() {
        let overrides = ParamOverrideTable::new();
        let ab: Blacklist = ["_a", "_b"].into_iter().collect();
        let ba: Blacklist = ["_b", "_a"].into_iter().collect();
        assert_ne!(
            compute_rules_hash(&ab, &overrides).unwrap(),
            compute_rules_hash(&ba, &overrides).unwrap()
        );
    }

    #[test]
    fn test_rules_hash_sensitive_to_override_order() {
        let blacklist = Blacklist::new();
        let forward: ParamOverrideTable = [
            ("_zz", OverrideRecord::text_replace("A", "B")),
            ("_aa", OverrideRecord::text_replace("B", "C")),
        ]
        .into_iter()
        .collect();
        let reverse: ParamOverrideTable = [
            ("_aa", OverrideRecord::text_replace("B", "C")),
            ("_zz", OverrideRecord::text_replace("A", "B")),
        ]
        .into_iter()
        .collect();
        assert_ne!(
            compute_rules_hash(&blacklist, &forward).unwrap(),
            compute_rules_hash(&blacklist, &reverse).unwrap()
        );
    }
}
