//! Runtime value model.
//!
//! One enum covers both sides of the coercion boundary: the plain forms
//! (`Null`..`Map`) carry loosely-typed input, the typed forms (`Wrapped`,
//! `List`, `Record`, `Case`) are instances produced by a schema and carry
//! the name of the type that produced them. Feeding a typed value back into
//! its own schema is the identity (the `is_instance` short-circuit).

use indexmap::IndexMap;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Seq(Vec<Value>),
    Map(IndexMap<String, Value>),

    /// Instance of a string/integer/float-based type wrapping one raw value.
    Wrapped { ty: String, value: Box<Value> },
    /// Instance of a list-based type.
    List { ty: String, items: Vec<Value> },
    /// Instance of a shape.
    Record { ty: String, fields: IndexMap<String, Value> },
    /// One case of an enum; `value` is the backing value (the case name for
    /// unbacked enums).
    Case { ty: String, name: String, value: Box<Value> },
}

impl Value {
    /// Short type label used in error messages: the primitive kind for plain
    /// forms, the declaring type name for instances.
    pub fn type_label(&self) -> &str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Seq(_) => "array",
            Value::Map(_) => "object",
            Value::Wrapped { ty, .. }
            | Value::List { ty, .. }
            | Value::Record { ty, .. }
            | Value::Case { ty, .. } => ty,
        }
    }

    /// Type name for instance forms, `None` for plain forms.
    pub fn instance_type(&self) -> Option<&str> {
        match self {
            Value::Wrapped { ty, .. }
            | Value::List { ty, .. }
            | Value::Record { ty, .. }
            | Value::Case { ty, .. } => Some(ty),
            _ => None,
        }
    }

    /// Map-shaped view: plain maps and records of *any* shape type qualify.
    pub fn as_map_like(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            Value::Record { fields, .. } => Some(fields),
            _ => None,
        }
    }

    /// Sequence-shaped view: plain arrays and list instances.
    pub fn as_seq_like(&self) -> Option<&[Value]> {
        match self {
            Value::Seq(xs) => Some(xs),
            Value::List { items, .. } => Some(items),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Human description for the failure message: type label, plus the
    /// literal (truncated to 100 chars) for strings.
    pub fn describe(&self) -> String {
        match self {
            Value::Str(s) => {
                let lit: String = s.chars().take(100).collect();
                if lit.len() < s.len() {
                    format!("string \"{lit}…\"")
                } else {
                    format!("string \"{lit}\"")
                }
            }
            other => other.type_label().to_string(),
        }
    }

    /// Plain projection back to JSON. Typed forms unwrap to their payload;
    /// discriminator tagging is the normalizer's job, not this one.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Str(s) => serde_json::Value::from(s.clone()),
            Value::Seq(xs) => serde_json::Value::Array(xs.iter().map(Value::to_json).collect()),
            Value::Map(m) => {
                let mut out = serde_json::Map::new();
                for (k, v) in m {
                    out.insert(k.clone(), v.to_json());
                }
                serde_json::Value::Object(out)
            }
            Value::Wrapped { value, .. } => value.to_json(),
            Value::List { items, .. } => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Record { fields, .. } => {
                let mut out = serde_json::Map::new();
                for (k, v) in fields {
                    out.insert(k.clone(), v.to_json());
                }
                serde_json::Value::Object(out)
            }
            Value::Case { value, .. } => value.to_json(),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(f) = n.as_f64() {
                    Value::Float(f)
                } else {
                    // u64 above i64::MAX; widen.
                    Value::Float(n.as_u64().map(|u| u as f64).unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(xs) => Value::Seq(xs.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(m) => {
                Value::Map(m.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<&serde_json::Value> for Value {
    fn from(v: &serde_json::Value) -> Self {
        Value::from(v.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_round_trip_preserves_key_order() {
        let v = Value::from(json!({"z": 1, "a": [true, null], "m": {"k": 2.5}}));
        let back = v.to_json();
        let keys: Vec<_> = back.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
        assert_eq!(back, json!({"z": 1, "a": [true, null], "m": {"k": 2.5}}));
    }

    #[test]
    fn typed_forms_project_to_plain_json() {
        let v = Value::Record {
            ty: "Person".into(),
            fields: IndexMap::from([(
                "givenName".to_string(),
                Value::Wrapped { ty: "GivenName".into(), value: Box::new(Value::Str("Jane".into())) },
            )]),
        };
        assert_eq!(v.to_json(), json!({"givenName": "Jane"}));
        assert_eq!(v.instance_type(), Some("Person"));
        assert_eq!(v.type_label(), "Person");
    }

    #[test]
    fn describe_truncates_long_strings() {
        let long = "x".repeat(150);
        let d = Value::Str(long).describe();
        assert!(d.starts_with("string \"x"));
        assert!(d.ends_with("…\""));
        assert!(d.chars().filter(|c| *c == 'x').count() == 100);
    }
}
