//! Enums: a closed set of named cases.
//!
//! Value-backed enums coerce input to the backing kind first (numeric
//! round-trip rules included), then match case values. Unbacked enums match
//! the coerced string against case names directly.

use indexmap::IndexMap;
use serde_json::json;

use crate::issue::{Issue, Issues};
use crate::schema::num::int_from;
use crate::schema::text::string_from;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backing {
    Str,
    Int,
    /// Name-only cases; the case name doubles as the value.
    Unbacked,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CaseValue {
    Str(String),
    Int(i64),
}

impl CaseValue {
    fn render(&self) -> String {
        match self {
            CaseValue::Str(s) => s.clone(),
            CaseValue::Int(i) => i.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnumSchema {
    pub name: String,
    pub description: Option<String>,
    pub backing: Backing,
    /// Case name → backing value; `None` entries only in unbacked enums.
    pub cases: IndexMap<String, Option<CaseValue>>,
}

impl EnumSchema {
    fn accepted(&self) -> Vec<String> {
        self.cases
            .iter()
            .map(|(name, v)| match v {
                Some(cv) => cv.render(),
                None => name.clone(),
            })
            .collect()
    }

    pub(crate) fn instantiate(&self, value: &Value) -> Result<Value, Issues> {
        match self.backing {
            Backing::Int => {
                let Some(n) = int_from(value) else {
                    return Err(Issues::one(Issue::invalid_type(&self.name, value.type_label())));
                };
                for (case_name, case_value) in &self.cases {
                    if matches!(case_value, Some(CaseValue::Int(i)) if *i == n) {
                        return Ok(Value::Case {
                            ty: self.name.clone(),
                            name: case_name.clone(),
                            value: Box::new(Value::Int(n)),
                        });
                    }
                }
                Err(Issues::one(Issue::invalid_enum_value(self.accepted())))
            }
            Backing::Str | Backing::Unbacked => {
                let Some(s) = string_from(value) else {
                    return Err(Issues::one(Issue::invalid_type(&self.name, value.type_label())));
                };
                for (case_name, case_value) in &self.cases {
                    let hit = match (self.backing, case_value) {
                        (Backing::Str, Some(CaseValue::Str(v))) => *v == s,
                        (Backing::Unbacked, _) => *case_name == s,
                        _ => false,
                    };
                    if hit {
                        return Ok(Value::Case {
                            ty: self.name.clone(),
                            name: case_name.clone(),
                            value: Box::new(Value::Str(s)),
                        });
                    }
                }
                Err(Issues::one(Issue::invalid_enum_value(self.accepted())))
            }
        }
    }

    pub(crate) fn descriptor(&self) -> serde_json::Value {
        let cases: Vec<serde_json::Value> = self
            .cases
            .iter()
            .map(|(name, v)| {
                let value = match v {
                    Some(CaseValue::Str(s)) => json!(s),
                    Some(CaseValue::Int(i)) => json!(i),
                    None => json!(name),
                };
                json!({ "type": "case", "name": name, "value": value })
            })
            .collect();
        let mut o = json!({ "type": self.name, "name": self.name, "cases": cases });
        if let Some(d) = &self.description {
            o["description"] = json!(d);
        }
        o
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{CoerceOptions, Schema};

    fn title() -> Schema {
        Schema::Cases(EnumSchema {
            name: "Title".into(),
            description: None,
            backing: Backing::Unbacked,
            cases: ["MR", "MRS", "MISS", "MS", "OTHER"]
                .into_iter()
                .map(|n| (n.to_string(), None))
                .collect(),
        })
    }

    #[test]
    fn unbacked_matches_case_names_case_sensitively() {
        let opts = CoerceOptions::default();
        let schema = title();
        let ok = schema.instantiate(&Value::Str("MRS".into()), &opts).unwrap();
        assert!(matches!(&ok, Value::Case { ty, name, .. } if ty == "Title" && name == "MRS"));

        let err = schema.instantiate(&Value::Str("mr".into()), &opts).unwrap_err();
        assert!(matches!(
            &err.iter().next().unwrap().kind,
            crate::issue::IssueKind::InvalidEnumValue { accepted }
                if accepted == &["MR", "MRS", "MISS", "MS", "OTHER"]
        ));
    }

    #[test]
    fn existing_case_instance_passes_through_unchanged() {
        let opts = CoerceOptions::default();
        let schema = title();
        let instance = Value::Case {
            ty: "Title".into(),
            name: "MRS".into(),
            value: Box::new(Value::Str("MRS".into())),
        };
        assert_eq!(schema.instantiate(&instance, &opts), Ok(instance.clone()));
    }

    #[test]
    fn int_backed_uses_numeric_round_trip_rules() {
        let opts = CoerceOptions::default();
        let schema = Schema::Cases(EnumSchema {
            name: "Priority".into(),
            description: None,
            backing: Backing::Int,
            cases: IndexMap::from([
                ("LOW".to_string(), Some(CaseValue::Int(1))),
                ("HIGH".to_string(), Some(CaseValue::Int(2))),
            ]),
        });
        let ok = schema.instantiate(&Value::Str("2".into()), &opts).unwrap();
        assert!(matches!(&ok, Value::Case { name, .. } if name == "HIGH"));
        assert!(matches!(
            schema.instantiate(&Value::Float(1.0), &opts).unwrap(),
            Value::Case { .. }
        ));
        let err = schema.instantiate(&Value::Str("2.0".into()), &opts).unwrap_err();
        assert_eq!(err.iter().next().unwrap().kind.code(), "invalid_type");
        let err = schema.instantiate(&Value::Int(3), &opts).unwrap_err();
        assert!(matches!(
            &err.iter().next().unwrap().kind,
            crate::issue::IssueKind::InvalidEnumValue { accepted } if accepted == &["1", "2"]
        ));
    }

    #[test]
    fn string_backed_matches_values_not_names() {
        let opts = CoerceOptions::default();
        let schema = Schema::Cases(EnumSchema {
            name: "Suit".into(),
            description: None,
            backing: Backing::Str,
            cases: IndexMap::from([
                ("Hearts".to_string(), Some(CaseValue::Str("H".into()))),
                ("Spades".to_string(), Some(CaseValue::Str("S".into()))),
            ]),
        });
        let ok = schema.instantiate(&Value::Str("H".into()), &opts).unwrap();
        assert!(matches!(&ok, Value::Case { name, .. } if name == "Hearts"));
        assert!(schema.instantiate(&Value::Str("Hearts".into()), &opts).is_err());
    }
}
