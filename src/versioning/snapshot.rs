//! Snapshot conversion and content fingerprints
//!
//! The protocol only accepts plain field maps. Typed domain values are
//! converted once, at the call boundary, through `serde`.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::store::{Fields, ID_FIELD};

use super::errors::{VersionError, VersionResult};

/// Convert any serializable value into a field map.
///
/// The value must serialize to a JSON object. A top-level `_id` is dropped:
/// identifiers are never part of a snapshot.
pub fn to_fields<T: Serialize + ?Sized>(value: &T) -> VersionResult<Fields> {
    match serde_json::to_value(value) {
        Ok(Value::Object(mut fields)) => {
            fields.remove(ID_FIELD);
            Ok(fields)
        }
        Ok(other) => Err(VersionError::InvalidSnapshot(format!(
            "expected an object, got {}",
            json_kind(&other)
        ))),
        Err(e) => Err(VersionError::InvalidSnapshot(e.to_string())),
    }
}

/// SHA-256 hex digest of the canonical JSON of `fields`.
///
/// Keys are serialized in sorted order, so two maps with equal content
/// always share a fingerprint.
pub fn fingerprint(fields: &Fields) -> String {
    let canonical = Value::Object(fields.clone()).to_string();
    let digest = Sha256::digest(canonical.as_bytes());
    format!("{:x}", digest)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Post {
        #[serde(rename = "_id")]
        id: String,
        title: String,
        views: u32,
    }

    #[test]
    fn test_struct_to_fields_drops_id() {
        let post = Post {
            id: "p1".into(),
            title: "Hello".into(),
            views: 3,
        };
        let fields = to_fields(&post).unwrap();
        assert_eq!(Value::Object(fields), json!({"title": "Hello", "views": 3}));
    }

    #[test]
    fn test_non_object_rejected() {
        let err = to_fields(&vec![1, 2]).unwrap_err();
        assert_eq!(err.code(), "VERSION_INVALID_SNAPSHOT");
        assert!(err.to_string().contains("array"));
    }

    #[test]
    fn test_fingerprint_ignores_key_order() {
        let a = json!({"a": 1, "b": "x"}).as_object().cloned().unwrap();
        let mut b = Fields::new();
        b.insert("b".into(), json!("x"));
        b.insert("a".into(), json!(1));

        assert_eq!(fingerprint(&a), fingerprint(&b));
        assert_eq!(fingerprint(&a).len(), 64);

        let c = json!({"a": 2, "b": "x"}).as_object().cloned().unwrap();
        assert_ne!(fingerprint(&a), fingerprint(&c));
    }
}
