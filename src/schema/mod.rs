//! Schema graph.
//!
//! A closed set of variants, each implementing the same contract:
//! `is_instance` (fast-path: the value already satisfies the type),
//! `instantiate` (coerce or report every violation), and `descriptor`
//! (JSON-shaped self-description for tooling).
//!
//! The general coercion algorithm is uniform across variants:
//! 1. identity short-circuit when `is_instance` holds;
//! 2. structural coercion, failing with `invalid_type`;
//! 3. every declared constraint checked — violations accumulate, nothing
//!    short-circuits — and the node fails only if the aggregate is non-empty.

pub mod cases;
pub mod list;
pub mod num;
pub mod poly;
pub mod shape;
pub mod text;

use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::CoerceError;
use crate::issue::{Issue, Issues};
use crate::value::Value;

pub use cases::{Backing, CaseValue, EnumSchema};
pub use list::SequenceSchema;
pub use num::{DecimalSchema, IntegerSchema};
pub use poly::{Discriminator, InterfaceSchema, OneOfSchema};
pub use shape::{Property, ShapeSchema};
pub use text::TextSchema;

/// Coercion knobs. One recognized flag so far.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CoerceOptions {
    /// Silently drop unknown shape keys instead of raising `unrecognized_keys`.
    pub ignore_unrecognized_keys: bool,
}

/// Wraps another schema, additionally accepting absence/null.
#[derive(Debug, Clone)]
pub struct OptionalSchema {
    pub inner: Arc<Schema>,
}

/// Placeholder handed out while its target type is still being built,
/// breaking construction-time cycles. The builder patches the shared slot
/// once the target completes; every operation forwards afterwards.
#[derive(Debug, Clone)]
pub struct DeferredSchema {
    pub name: String,
    pub slot: Arc<OnceCell<Arc<Schema>>>,
}

impl DeferredSchema {
    pub fn resolved(&self) -> &Arc<Schema> {
        // The registry patches every slot before the set is handed out.
        self.slot
            .get()
            .expect("deferred schema patched before the registry is sealed")
    }
}

#[derive(Debug, Clone)]
pub enum Schema {
    // Raw primitives, no wrapping type.
    Bool { description: Option<String> },
    Int { description: Option<String> },
    Float { description: Option<String> },
    Str { description: Option<String> },
    Null { description: Option<String> },
    /// Raw heterogeneous collection, unconstrained.
    Array { description: Option<String> },

    // Named types.
    Text(TextSchema),
    Integer(IntegerSchema),
    Decimal(DecimalSchema),
    Sequence(SequenceSchema),
    Shape(ShapeSchema),
    Cases(EnumSchema),
    Interface(InterfaceSchema),
    OneOf(OneOfSchema),
    Optional(OptionalSchema),
    Deferred(DeferredSchema),
}

impl Schema {
    pub fn type_name(&self) -> String {
        match self {
            Schema::Bool { .. } => "boolean".to_string(),
            Schema::Int { .. } => "integer".to_string(),
            Schema::Float { .. } => "float".to_string(),
            Schema::Str { .. } => "string".to_string(),
            Schema::Null { .. } => "null".to_string(),
            Schema::Array { .. } => "array".to_string(),
            Schema::Text(s) => s.name.clone(),
            Schema::Integer(s) => s.name.clone(),
            Schema::Decimal(s) => s.name.clone(),
            Schema::Sequence(s) => s.name.clone(),
            Schema::Shape(s) => s.name.clone(),
            Schema::Cases(s) => s.name.clone(),
            Schema::Interface(s) => s.name.clone(),
            Schema::OneOf(s) => s.joined_name(),
            Schema::Optional(s) => s.inner.type_name(),
            Schema::Deferred(s) => s.name.clone(),
        }
    }

    pub fn display_name(&self) -> String {
        self.type_name()
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Schema::Bool { description }
            | Schema::Int { description }
            | Schema::Float { description }
            | Schema::Str { description }
            | Schema::Null { description }
            | Schema::Array { description } => description.as_deref(),
            Schema::Text(s) => s.description.as_deref(),
            Schema::Integer(s) => s.description.as_deref(),
            Schema::Decimal(s) => s.description.as_deref(),
            Schema::Sequence(s) => s.description.as_deref(),
            Schema::Shape(s) => s.description.as_deref(),
            Schema::Cases(s) => s.description.as_deref(),
            Schema::Interface(s) => s.description.as_deref(),
            Schema::OneOf(s) => s.description.as_deref(),
            Schema::Optional(s) => s.inner.description(),
            Schema::Deferred(s) => s.resolved().description(),
        }
    }

    /// Fast-path test: the value already satisfies this schema, no coercion
    /// needed. Typed instances match the schema that declares their type.
    pub fn is_instance(&self, value: &Value) -> bool {
        match self {
            Schema::Bool { .. } => matches!(value, Value::Bool(_)),
            Schema::Int { .. } => matches!(value, Value::Int(_)),
            Schema::Float { .. } => matches!(value, Value::Float(_)),
            Schema::Str { .. } => matches!(value, Value::Str(_)),
            Schema::Null { .. } => matches!(value, Value::Null),
            Schema::Array { .. } => matches!(value, Value::Seq(_)),
            Schema::Text(s) => matches!(value, Value::Wrapped { ty, .. } if *ty == s.name),
            Schema::Integer(s) => matches!(value, Value::Wrapped { ty, .. } if *ty == s.name),
            Schema::Decimal(s) => matches!(value, Value::Wrapped { ty, .. } if *ty == s.name),
            Schema::Sequence(s) => matches!(value, Value::List { ty, .. } if *ty == s.name),
            Schema::Shape(s) => matches!(value, Value::Record { ty, .. } if *ty == s.name),
            Schema::Cases(s) => matches!(value, Value::Case { ty, .. } if *ty == s.name),
            Schema::Interface(s) => value
                .instance_type()
                .is_some_and(|ty| s.implementations.contains_key(ty)),
            Schema::OneOf(s) => s.subschemas.iter().any(|sub| sub.is_instance(value)),
            Schema::Optional(s) => value.is_null() || s.inner.is_instance(value),
            Schema::Deferred(s) => s.resolved().is_instance(value),
        }
    }

    /// Coerce `value` into an instance of this schema, or report every
    /// violation found. The `Err` carries issues whose paths are relative to
    /// this node; callers prefix their own segment when nesting.
    pub fn instantiate(&self, value: &Value, opts: &CoerceOptions) -> Result<Value, Issues> {
        if self.is_instance(value) {
            return Ok(value.clone());
        }
        match self {
            Schema::Bool { .. } => Err(Issues::one(Issue::invalid_type(
                "boolean",
                value.type_label(),
            ))),
            Schema::Int { .. } => num::int_from(value)
                .map(Value::Int)
                .ok_or_else(|| Issues::one(Issue::invalid_type("integer", value.type_label()))),
            Schema::Float { .. } => num::float_from(value)
                .map(Value::Float)
                .ok_or_else(|| Issues::one(Issue::invalid_type("float", value.type_label()))),
            Schema::Str { .. } => text::string_from(value)
                .map(Value::Str)
                .ok_or_else(|| Issues::one(Issue::invalid_type("string", value.type_label()))),
            Schema::Null { .. } => {
                Err(Issues::one(Issue::invalid_type("null", value.type_label())))
            }
            Schema::Array { .. } => match value.as_seq_like() {
                Some(items) => Ok(Value::Seq(items.to_vec())),
                None => Err(Issues::one(Issue::invalid_type("array", value.type_label()))),
            },
            Schema::Text(s) => s.instantiate(value),
            Schema::Integer(s) => s.instantiate(value),
            Schema::Decimal(s) => s.instantiate(value),
            Schema::Sequence(s) => s.instantiate(value, opts),
            Schema::Shape(s) => s.instantiate(value, opts),
            Schema::Cases(s) => s.instantiate(value),
            Schema::Interface(s) => s.instantiate(value, opts),
            Schema::OneOf(s) => s.instantiate(value, opts),
            Schema::Optional(s) => {
                if value.is_null() {
                    Ok(Value::Null)
                } else {
                    s.inner.instantiate(value, opts)
                }
            }
            Schema::Deferred(s) => s.resolved().instantiate(value, opts),
        }
    }

    /// Boundary form of [`Schema::instantiate`]: failures become one
    /// [`CoerceError`] carrying the full issue collection.
    pub fn coerce(&self, value: &Value, opts: &CoerceOptions) -> Result<Value, CoerceError> {
        self.instantiate(value, opts)
            .map_err(|issues| CoerceError::new(value, self.display_name(), issues))
    }

    pub fn coerce_json(
        &self,
        value: &serde_json::Value,
        opts: &CoerceOptions,
    ) -> Result<Value, CoerceError> {
        let value = Value::from(value);
        self.instantiate(&value, opts)
            .map_err(|issues| CoerceError::new(&value, self.display_name(), issues))
    }

    /// JSON descriptor: `{type, name, description, ...variant fields}`.
    /// Stable contract for tooling that consumes schema metadata.
    pub fn descriptor(&self) -> serde_json::Value {
        match self {
            Schema::Bool { description }
            | Schema::Int { description }
            | Schema::Float { description }
            | Schema::Str { description }
            | Schema::Null { description }
            | Schema::Array { description } => {
                let mut o = json!({ "type": self.type_name(), "name": self.type_name() });
                if let Some(d) = description {
                    o["description"] = json!(d);
                }
                o
            }
            Schema::Text(s) => s.descriptor(),
            Schema::Integer(s) => s.descriptor(),
            Schema::Decimal(s) => s.descriptor(),
            Schema::Sequence(s) => s.descriptor(),
            Schema::Shape(s) => {
                let mut o = json!({
                    "type": s.name,
                    "name": s.name,
                    "properties": property_descriptors(&s.properties),
                });
                if let Some(d) = &s.description {
                    o["description"] = json!(d);
                }
                o
            }
            Schema::Cases(s) => s.descriptor(),
            Schema::Interface(s) => {
                let mut o = json!({
                    "type": s.name,
                    "name": s.name,
                    "properties": property_descriptors(&s.properties),
                });
                if let Some(d) = &s.description {
                    o["description"] = json!(d);
                }
                o
            }
            Schema::OneOf(s) => {
                let joined = s.joined_name();
                let mut o = json!({
                    "type": joined,
                    "name": joined,
                    "subSchemas": s.subschemas.iter().map(|x| x.descriptor()).collect::<Vec<_>>(),
                });
                if let Some(d) = &s.description {
                    o["description"] = json!(d);
                }
                o
            }
            Schema::Optional(s) => s.inner.descriptor(),
            Schema::Deferred(s) => s.resolved().descriptor(),
        }
    }
}

fn property_descriptors(
    properties: &indexmap::IndexMap<String, Property>,
) -> Vec<serde_json::Value> {
    properties
        .iter()
        .map(|(name, p)| {
            let mut o = json!({ "type": p.schema.type_name(), "name": name });
            // Per-property override wins over the property type's own text.
            if let Some(d) = p
                .description
                .as_deref()
                .or_else(|| p.schema.description())
            {
                o["description"] = json!(d);
            }
            if matches!(p.schema.as_ref(), Schema::Optional(_)) {
                o["optional"] = json!(true);
            }
            o
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_schemas_accept_their_kind_and_coerce_loosely() {
        let opts = CoerceOptions::default();
        let int = Schema::Int { description: None };
        assert_eq!(int.instantiate(&Value::Int(7), &opts), Ok(Value::Int(7)));
        assert_eq!(int.instantiate(&Value::Float(2.0), &opts), Ok(Value::Int(2)));
        assert_eq!(
            int.instantiate(&Value::Str("41".into()), &opts),
            Ok(Value::Int(41))
        );
        let err = int.instantiate(&Value::Bool(true), &opts).unwrap_err();
        assert_eq!(err.iter().next().unwrap().kind.code(), "invalid_type");

        let null = Schema::Null { description: None };
        assert_eq!(null.instantiate(&Value::Null, &opts), Ok(Value::Null));
        assert!(null.instantiate(&Value::Int(0), &opts).is_err());
    }

    #[test]
    fn optional_maps_null_and_delegates_otherwise() {
        let opts = CoerceOptions::default();
        let schema = Schema::Optional(OptionalSchema {
            inner: Arc::new(Schema::Str { description: None }),
        });
        assert_eq!(schema.instantiate(&Value::Null, &opts), Ok(Value::Null));
        assert_eq!(
            schema.instantiate(&Value::Str("hi".into()), &opts),
            Ok(Value::Str("hi".into()))
        );
        assert!(schema.instantiate(&Value::Int(1), &opts).is_err());
        assert!(schema.is_instance(&Value::Null));
    }

    #[test]
    fn deferred_forwards_once_patched() {
        let opts = CoerceOptions::default();
        let slot = Arc::new(OnceCell::new());
        let deferred = Schema::Deferred(DeferredSchema { name: "Later".into(), slot: slot.clone() });
        slot.set(Arc::new(Schema::Bool { description: None })).unwrap();
        assert_eq!(
            deferred.instantiate(&Value::Bool(true), &opts),
            Ok(Value::Bool(true))
        );
        assert!(deferred.is_instance(&Value::Bool(false)));
    }
}
