//! Runtime schema graph: coerce loosely-typed input into typed instances,
//! report every violation at once, and project instances back to plain JSON
//! with discriminator tags re-inserted where the declared schema is
//! polymorphic.
//!
//! The pieces:
//! - [`registry`] — declare named types ([`TypeDef`]/[`TypeRef`]) and build
//!   them into an immutable [`SchemaSet`]; recursive graphs build in one
//!   pass through deferred back-patching.
//! - [`schema`] — the schema variants themselves, each with `is_instance`
//!   (identity fast-path), `instantiate` (coerce or aggregate issues), and
//!   `descriptor` (JSON self-description).
//! - [`value`] — one [`Value`] enum spanning plain JSON-shaped input and
//!   typed instances; re-coercing an instance is the identity.
//! - [`issue`]/[`error`] — the multi-issue failure model and the
//!   [`CoerceError`] boundary.
//! - [`normalize`] — schema-directed projection back to JSON.
//!
//! ```
//! use schemacast::{CoerceOptions, PropertyDef, Registry, TypeDef, TypeRef};
//!
//! let mut registry = Registry::new();
//! registry.define(TypeDef::text("GivenName").min_length(3).max_length(20)).unwrap();
//! registry.define(
//!     TypeDef::shape("Person")
//!         .property(PropertyDef::new("givenName", TypeRef::named("GivenName"))),
//! ).unwrap();
//! let set = registry.build().unwrap();
//!
//! let person = set.schema("Person").unwrap();
//! let opts = CoerceOptions::default();
//! assert!(person.coerce_json(&serde_json::json!({"givenName": "Jane"}), &opts).is_ok());
//! let err = person.coerce_json(&serde_json::json!({"givenName": "Jo"}), &opts).unwrap_err();
//! assert_eq!(
//!     err.to_string(),
//!     "Failed to coerce object into Person. givenName: too_small expected at least 3 characters",
//! );
//! ```

pub mod error;
pub mod format;
pub mod issue;
pub mod normalize;
pub mod registry;
pub mod schema;
pub mod value;

pub use error::{BuildResult, CoerceError, SchemaError};
pub use format::StrFormat;
pub use issue::{Issue, IssueKind, Issues, PathSegment};
pub use normalize::{NormalizeOptions, Normalizer};
pub use registry::{PropertyDef, Registry, SchemaSet, TypeDef, TypeRef};
pub use schema::{CoerceOptions, Discriminator, Schema};
pub use value::Value;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn address_book() -> SchemaSet {
        let mut r = Registry::new();
        r.define(TypeDef::text("GivenName").min_length(3).max_length(20)).unwrap();
        r.define(TypeDef::text("FamilyName").min_length(3).max_length(20)).unwrap();
        r.define(TypeDef::str_enum("Title", [("Mr", "mr."), ("Ms", "ms."), ("Dr", "dr.")]))
            .unwrap();
        r.define(
            TypeDef::shape("Person")
                .property(PropertyDef::new("givenName", TypeRef::named("GivenName")))
                .property(PropertyDef::new("familyName", TypeRef::named("FamilyName")))
                .property(PropertyDef::new("title", TypeRef::named("Title")).optional()),
        )
        .unwrap();
        r.define(TypeDef::sequence("People", TypeRef::named("Person"), None, Some(4))).unwrap();
        r.build().unwrap()
    }

    #[test]
    fn coercion_is_idempotent() {
        let set = address_book();
        let person = set.schema("Person").unwrap();
        let opts = CoerceOptions::default();
        let first = person
            .coerce_json(&json!({"givenName": "Jane", "familyName": "Doeson"}), &opts)
            .unwrap();
        let second = person.instantiate(&first, &opts).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn violations_aggregate_across_siblings_and_depth() {
        let set = address_book();
        let people = set.schema("People").unwrap();
        let opts = CoerceOptions::default();
        let err = people
            .coerce_json(
                &json!([
                    {"givenName": "ab", "familyName": "Johnson"},
                    {"givenName": "Jane", "familyName": "Doeson"},
                    {"givenName": "x", "familyName": "y"},
                    {"givenName": "Janet", "familyName": "Doeson"},
                    {"givenName": "Maximilian", "familyName": "Longfellow"}
                ]),
                &opts,
            )
            .unwrap_err();

        // Count violation first, then item issues in index order.
        let located: Vec<_> = err
            .issues
            .iter()
            .map(|i| (i.kind.code(), i.path_string()))
            .collect();
        assert_eq!(
            located,
            vec![
                ("too_big", String::new()),
                ("too_small", "0.givenName".to_string()),
                ("too_small", "2.givenName".to_string()),
                ("too_small", "2.familyName".to_string()),
            ]
        );
    }

    #[test]
    fn missing_and_unknown_keys_are_both_reported() {
        let set = address_book();
        let person = set.schema("Person").unwrap();
        let opts = CoerceOptions::default();
        let err = person
            .coerce_json(&json!({"givenName": "Jane", "nickname": "J"}), &opts)
            .unwrap_err();
        let codes: Vec<_> = err.issues.iter().map(|i| i.kind.code()).collect();
        assert_eq!(codes, vec!["invalid_type", "unrecognized_keys"]);
        let required = err.issues.iter().next().unwrap();
        assert_eq!(required.path_string(), "familyName");
        assert_eq!(required.message, "required, expected FamilyName");

        // The flag drops the extras instead.
        let lax = CoerceOptions { ignore_unrecognized_keys: true };
        let out = person
            .coerce_json(
                &json!({"givenName": "Jane", "familyName": "Doeson", "nickname": "J"}),
                &lax,
            )
            .unwrap();
        let fields = out.as_map_like().unwrap();
        assert!(!fields.contains_key("nickname"));
    }

    #[test]
    fn enum_backed_values_coerce_and_report_accepted_set() {
        let set = address_book();
        let person = set.schema("Person").unwrap();
        let opts = CoerceOptions::default();
        let out = person
            .coerce_json(
                &json!({"givenName": "Jane", "familyName": "Doeson", "title": "dr."}),
                &opts,
            )
            .unwrap();
        let fields = out.as_map_like().unwrap();
        assert!(matches!(
            fields.get("title"),
            Some(Value::Case { ty, name, .. }) if ty == "Title" && name == "Dr"
        ));

        let err = person
            .coerce_json(
                &json!({"givenName": "Jane", "familyName": "Doeson", "title": "prof."}),
                &opts,
            )
            .unwrap_err();
        let issue = err.issues.iter().next().unwrap();
        assert_eq!(issue.kind.code(), "invalid_enum_value");
        assert_eq!(issue.path_string(), "title");
    }

    #[test]
    fn error_json_is_machine_readable() {
        let set = address_book();
        let person = set.schema("Person").unwrap();
        let err = person
            .coerce_json(&json!({"givenName": "Jo"}), &CoerceOptions::default())
            .unwrap_err();
        let j = err.to_json();
        assert_eq!(j[0]["code"], "too_small");
        assert_eq!(j[0]["path"], json!(["givenName"]));
        assert_eq!(j[1]["code"], "invalid_type");
        assert_eq!(j[1]["received"], "missing");
    }

    #[test]
    fn descriptors_expose_the_declared_surface() {
        let set = address_book();
        let d = set.schema("Person").unwrap().descriptor();
        assert_eq!(d["name"], "Person");
        let props = d["properties"].as_array().unwrap();
        assert_eq!(props.len(), 3);
        assert_eq!(props[2]["name"], "title");
        assert_eq!(props[2]["optional"], true);

        let t = set.schema("GivenName").unwrap().descriptor();
        assert_eq!(t["minLength"], 3);
        assert_eq!(t["maxLength"], 20);
    }
}
