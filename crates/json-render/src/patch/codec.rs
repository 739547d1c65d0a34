//! JSON codec for [`Patch`]: RFC 6902 objects to and from `serde_json::Value`.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Map, Value};

use super::types::{Patch, PatchError};

fn string_member(map: &Map<String, Value>, key: &str) -> Result<String, PatchError> {
    match map.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(PatchError::InvalidOp(format!("{key} must be a string"))),
        None => Err(PatchError::InvalidOp(format!("missing {key}"))),
    }
}

// A missing `value` is read as null, except for `test` where it stays absent.
fn value_member(map: &Map<String, Value>) -> Value {
    map.get("value").cloned().unwrap_or(Value::Null)
}

impl Patch {
    /// Decodes an RFC 6902 operation object.
    ///
    /// Unknown members are ignored. An unknown `op` is an error.
    pub fn from_value(value: &Value) -> Result<Patch, PatchError> {
        let map = value
            .as_object()
            .ok_or_else(|| PatchError::InvalidOp("operation must be an object".into()))?;
        let op = string_member(map, "op")?;
        let path = string_member(map, "path")?;
        let patch = match op.as_str() {
            "add" => Patch::Add { path, value: value_member(map) },
            "remove" => Patch::Remove { path },
            "replace" => Patch::Replace { path, value: value_member(map) },
            "move" => Patch::Move { from: string_member(map, "from")?, path },
            "copy" => Patch::Copy { from: string_member(map, "from")?, path },
            "test" => Patch::Test { path, value: map.get("value").cloned() },
            other => return Err(PatchError::InvalidOp(format!("unknown op {other:?}"))),
        };
        Ok(patch)
    }

    pub fn to_value(&self) -> Value {
        match self {
            Patch::Add { path, value } => json!({"op": "add", "path": path, "value": value}),
            Patch::Remove { path } => json!({"op": "remove", "path": path}),
            Patch::Replace { path, value } => {
                json!({"op": "replace", "path": path, "value": value})
            }
            Patch::Move { from, path } => json!({"op": "move", "from": from, "path": path}),
            Patch::Copy { from, path } => json!({"op": "copy", "from": from, "path": path}),
            Patch::Test { path, value: Some(value) } => {
                json!({"op": "test", "path": path, "value": value})
            }
            Patch::Test { path, value: None } => json!({"op": "test", "path": path}),
        }
    }
}

impl Serialize for Patch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Patch {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Patch::from_value(&value).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_every_op() {
        let cases = [
            (json!({"op": "add", "path": "/a", "value": 1}), Patch::add("/a", json!(1))),
            (json!({"op": "remove", "path": "/a"}), Patch::remove("/a")),
            (json!({"op": "replace", "path": "/a", "value": [1]}), Patch::replace("/a", json!([1]))),
            (json!({"op": "move", "from": "/a", "path": "/b"}), Patch::move_from("/a", "/b")),
            (json!({"op": "copy", "from": "/a", "path": "/b"}), Patch::copy_from("/a", "/b")),
            (json!({"op": "test", "path": "/a", "value": "x"}), Patch::test("/a", json!("x"))),
        ];
        for (raw, expected) in cases {
            assert_eq!(Patch::from_value(&raw).unwrap(), expected);
            assert_eq!(expected.to_value(), raw);
        }
    }

    #[test]
    fn missing_value_is_null() {
        let patch = Patch::from_value(&json!({"op": "add", "path": "/a"})).unwrap();
        assert_eq!(patch, Patch::add("/a", Value::Null));
    }

    #[test]
    fn test_without_value_stays_absent() {
        let raw = json!({"op": "test", "path": "/missing"});
        let patch = Patch::from_value(&raw).unwrap();
        assert_eq!(patch, Patch::test_absent("/missing"));
        assert_eq!(patch.value(), None);
        assert_eq!(patch.to_value(), raw);
    }

    #[test]
    fn rejects_unknown_op_and_missing_from() {
        assert!(matches!(
            Patch::from_value(&json!({"op": "merge", "path": "/a"})),
            Err(PatchError::InvalidOp(_))
        ));
        assert!(Patch::from_value(&json!({"op": "move", "path": "/a"})).is_err());
        assert!(Patch::from_value(&json!({"op": "add", "path": 3})).is_err());
    }

    #[test]
    fn serde_uses_wire_shape() {
        let patch: Patch = serde_json::from_str(r#"{"op":"remove","path":"/x"}"#).unwrap();
        assert_eq!(patch, Patch::remove("/x"));
        assert_eq!(serde_json::to_string(&patch).unwrap(), r#"{"op":"remove","path":"/x"}"#);
    }
}
