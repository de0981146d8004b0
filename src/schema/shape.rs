//! Shapes: named product types with a fixed, ordered property set.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::issue::{Issue, Issues, PathSegment};
use crate::schema::{CoerceOptions, Discriminator, Schema};
use crate::value::Value;

/// One declared property: its schema plus optional per-property overrides.
#[derive(Debug, Clone)]
pub struct Property {
    pub schema: Arc<Schema>,
    /// Overrides the property type's own description in descriptors.
    pub description: Option<String>,
    /// Explicit discriminator binding; overrides the type-level default
    /// during normalization.
    pub discriminator: Option<Discriminator>,
}

impl Property {
    pub fn new(schema: Arc<Schema>) -> Self {
        Property { schema, description: None, discriminator: None }
    }
}

#[derive(Debug, Clone)]
pub struct ShapeSchema {
    pub name: String,
    pub description: Option<String>,
    pub properties: IndexMap<String, Property>,
}

impl ShapeSchema {
    pub(crate) fn instantiate(&self, value: &Value, opts: &CoerceOptions) -> Result<Value, Issues> {
        let Some(input) = value.as_map_like() else {
            return Err(Issues::one(Issue::invalid_type(&self.name, value.type_label())));
        };

        let mut out = Issues::new();
        let mut fields = IndexMap::new();

        // Declaration order, every property checked regardless of earlier
        // failures.
        for (name, prop) in &self.properties {
            match input.get(name) {
                Some(v) => match prop.schema.instantiate(v, opts) {
                    Ok(coerced) => {
                        fields.insert(name.clone(), coerced);
                    }
                    Err(issues) => out.add_all(issues, Some(PathSegment::Key(name.clone()))),
                },
                None => {
                    if matches!(prop.schema.as_ref(), Schema::Optional(_)) {
                        // Truly absent, not defaulted to null.
                        continue;
                    }
                    out.add(
                        Issue::required(prop.schema.display_name())
                            .with_prefix(PathSegment::Key(name.clone())),
                    );
                }
            }
        }

        let extras: Vec<String> = input
            .keys()
            .filter(|k| !self.properties.contains_key(*k))
            .cloned()
            .collect();
        if !extras.is_empty() && !opts.ignore_unrecognized_keys {
            out.add(Issue::unrecognized_keys(extras));
        }

        out.into_result()?;
        Ok(Value::Record { ty: self.name.clone(), fields })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{OptionalSchema, TextSchema};
    use serde_json::json;

    fn name_schema(name: &str) -> Arc<Schema> {
        Arc::new(Schema::Text(TextSchema {
            name: name.into(),
            description: None,
            min_length: Some(3),
            max_length: Some(20),
            pattern: None,
            format: None,
        }))
    }

    fn person() -> Schema {
        Schema::Shape(ShapeSchema {
            name: "Person".into(),
            description: None,
            properties: IndexMap::from([
                ("givenName".to_string(), Property::new(name_schema("GivenName"))),
                ("familyName".to_string(), Property::new(name_schema("FamilyName"))),
                (
                    "nickname".to_string(),
                    Property::new(Arc::new(Schema::Optional(OptionalSchema {
                        inner: name_schema("Nickname"),
                    }))),
                ),
            ]),
        })
    }

    #[test]
    fn short_given_name_is_the_only_issue() {
        let opts = CoerceOptions::default();
        let input = Value::from(json!({"givenName": "Jo", "familyName": "Do"}));
        let err = person().instantiate(&input, &opts).unwrap_err();
        // familyName is also too short here; use a valid one to isolate.
        let input = Value::from(json!({"givenName": "Jo", "familyName": "Doeson"}));
        let err2 = person().instantiate(&input, &opts).unwrap_err();
        assert_eq!(err2.len(), 1);
        let issue = err2.iter().next().unwrap();
        assert_eq!(issue.path_string(), "givenName");
        assert!(matches!(
            issue.kind,
            crate::issue::IssueKind::TooSmall { minimum, .. } if minimum == 3.0
        ));
        assert_eq!(err.len(), 2);
    }

    #[test]
    fn missing_required_property_reports_once_at_its_path() {
        let opts = CoerceOptions::default();
        let input = Value::from(json!({"familyName": "Doeson", "junk": 1}));
        let err = person().instantiate(&input, &opts).unwrap_err();
        let required: Vec<_> = err
            .iter()
            .filter(|i| i.kind.code() == "invalid_type")
            .collect();
        assert_eq!(required.len(), 1);
        assert_eq!(required[0].path_string(), "givenName");
    }

    #[test]
    fn extras_collapse_into_one_unrecognized_keys_issue() {
        let opts = CoerceOptions::default();
        let input = Value::from(json!({
            "givenName": "John", "familyName": "Doeson", "a": 1, "b": 2
        }));
        let err = person().instantiate(&input, &opts).unwrap_err();
        assert_eq!(err.len(), 1);
        assert!(matches!(
            &err.iter().next().unwrap().kind,
            crate::issue::IssueKind::UnrecognizedKeys { keys } if keys == &["a", "b"]
        ));
    }

    #[test]
    fn ignore_flag_drops_extras_from_the_result() {
        let opts = CoerceOptions { ignore_unrecognized_keys: true };
        let input = Value::from(json!({
            "givenName": "John", "familyName": "Doeson", "a": 1
        }));
        let out = person().instantiate(&input, &opts).unwrap();
        match out {
            Value::Record { fields, .. } => {
                assert!(!fields.contains_key("a"));
                assert_eq!(fields.len(), 2);
            }
            other => panic!("expected record, got {other:?}"),
        }
    }

    #[test]
    fn absent_optional_stays_absent() {
        let opts = CoerceOptions::default();
        let input = Value::from(json!({"givenName": "John", "familyName": "Doeson"}));
        let out = person().instantiate(&input, &opts).unwrap();
        match out {
            Value::Record { fields, .. } => assert!(!fields.contains_key("nickname")),
            other => panic!("expected record, got {other:?}"),
        }
    }

    #[test]
    fn idempotent_on_its_own_instances() {
        let opts = CoerceOptions::default();
        let schema = person();
        let input = Value::from(json!({"givenName": "John", "familyName": "Doeson"}));
        let first = schema.instantiate(&input, &opts).unwrap();
        let second = schema.instantiate(&first, &opts).unwrap();
        assert_eq!(first, second);
        assert!(schema.is_instance(&first));
    }

    #[test]
    fn records_of_other_shapes_are_map_like_input() {
        let opts = CoerceOptions::default();
        let foreign = Value::Record {
            ty: "Someone".into(),
            fields: IndexMap::from([
                ("givenName".to_string(), Value::Str("John".into())),
                ("familyName".to_string(), Value::Str("Doeson".into())),
            ]),
        };
        let out = person().instantiate(&foreign, &opts).unwrap();
        assert!(matches!(out, Value::Record { ty, .. } if ty == "Person"));
    }
}
