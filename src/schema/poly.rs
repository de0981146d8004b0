//! Discriminated polymorphism: interfaces and unions.
//!
//! An input that is not already a conforming instance must be map-like and
//! carry a tag property (default `__type`) naming the concrete type to
//! delegate to, either directly or through the discriminator's tag→type
//! mapping. Non-map payloads travel boxed under `__value`. Untagged unions
//! skip all of this: first structurally matching subschema wins.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::issue::{Issue, Issues, PathSegment};
use crate::schema::{CoerceOptions, Property, Schema};
use crate::value::Value;

pub const DEFAULT_TAG_PROPERTY: &str = "__type";
pub const VALUE_KEY: &str = "__value";

/// Tag property name plus an optional tag→concrete-type mapping. Without a
/// mapping, the concrete type name itself is the tag.
#[derive(Debug, Clone)]
pub struct Discriminator {
    pub property: String,
    pub mapping: Option<IndexMap<String, String>>,
}

impl Discriminator {
    pub fn new() -> Self {
        Discriminator { property: DEFAULT_TAG_PROPERTY.to_string(), mapping: None }
    }

    pub fn with_property(property: impl Into<String>) -> Self {
        Discriminator { property: property.into(), mapping: None }
    }

    pub fn mapping<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.mapping = Some(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
        self
    }

    /// Tag value → concrete type name.
    pub fn resolve_type<'a>(&'a self, tag: &'a str) -> Option<&'a str> {
        match &self.mapping {
            None => Some(tag),
            Some(m) => m.get(tag).map(String::as_str),
        }
    }

    /// Concrete type name → tag value; `None` when a mapping exists but has
    /// no entry for the type.
    pub fn tag_for(&self, concrete: &str) -> Option<String> {
        match &self.mapping {
            None => Some(concrete.to_string()),
            Some(m) => m
                .iter()
                .find(|(_, v)| v.as_str() == concrete)
                .map(|(k, _)| k.clone()),
        }
    }
}

impl Default for Discriminator {
    fn default() -> Self {
        Self::new()
    }
}

/// Polymorphic contract: required properties, a discriminator, and an
/// explicit registry of concrete implementations.
#[derive(Debug, Clone)]
pub struct InterfaceSchema {
    pub name: String,
    pub description: Option<String>,
    pub properties: IndexMap<String, Property>,
    pub discriminator: Discriminator,
    pub implementations: IndexMap<String, Arc<Schema>>,
}

impl InterfaceSchema {
    pub(crate) fn instantiate(&self, value: &Value, opts: &CoerceOptions) -> Result<Value, Issues> {
        let Some(input) = value.as_map_like() else {
            return Err(Issues::one(Issue::invalid_type(&self.name, value.type_label())));
        };
        let (concrete_name, payload) = read_tag(input, &self.discriminator)?;
        let Some(concrete) = self.implementations.get(&concrete_name) else {
            return Err(Issues::one(Issue::custom(format!(
                "type \"{concrete_name}\" does not implement {}",
                self.name
            ))));
        };
        // Child issues are already relative to this level; no re-prefixing.
        let instance = concrete.instantiate(&payload, opts)?;
        self.check_contract(&instance)?;
        Ok(instance)
    }

    /// The resolved instance must really satisfy the contract: a registered
    /// implementer whose declared properties each hold a conforming value.
    fn check_contract(&self, instance: &Value) -> Result<(), Issues> {
        let mut out = Issues::new();
        match instance.instance_type() {
            Some(ty) if self.implementations.contains_key(ty) => {
                // Non-record implementers carry no fields at all, so every
                // required property reads as missing.
                let fields = match instance {
                    Value::Record { fields, .. } => Some(fields),
                    _ => None,
                };
                for (pname, prop) in &self.properties {
                    let optional = matches!(prop.schema.as_ref(), Schema::Optional(_));
                    match fields.and_then(|f| f.get(pname)) {
                        Some(v) if prop.schema.is_instance(v) => {}
                        Some(v) => out.add(
                            Issue::invalid_return_type(
                                prop.schema.display_name(),
                                v.type_label(),
                            )
                            .with_prefix(PathSegment::Key(pname.clone())),
                        ),
                        None if optional => {}
                        None => out.add(
                            Issue::invalid_return_type(prop.schema.display_name(), "missing")
                                .with_prefix(PathSegment::Key(pname.clone())),
                        ),
                    }
                }
            }
            _ => out.add(Issue::custom(format!(
                "value does not implement {}",
                self.name
            ))),
        }
        out.into_result()
    }
}

/// Union of N schemas. Untagged by default; a discriminator switches it to
/// the same tag-directed resolution interfaces use.
#[derive(Debug, Clone)]
pub struct OneOfSchema {
    pub subschemas: Vec<Arc<Schema>>,
    pub discriminator: Option<Discriminator>,
    pub description: Option<String>,
}

impl OneOfSchema {
    pub fn joined_name(&self) -> String {
        self.subschemas
            .iter()
            .map(|s| s.type_name())
            .collect::<Vec<_>>()
            .join("|")
    }

    pub(crate) fn instantiate(&self, value: &Value, opts: &CoerceOptions) -> Result<Value, Issues> {
        match &self.discriminator {
            Some(discriminator) => {
                let Some(input) = value.as_map_like() else {
                    return Err(Issues::one(Issue::invalid_type(
                        self.joined_name(),
                        value.type_label(),
                    )));
                };
                let (concrete_name, payload) = read_tag(input, discriminator)?;
                let Some(concrete) = self
                    .subschemas
                    .iter()
                    .find(|s| s.type_name() == concrete_name)
                else {
                    return Err(Issues::one(Issue::custom(format!(
                        "type \"{concrete_name}\" is not a member of {}",
                        self.joined_name()
                    ))));
                };
                let instance = concrete.instantiate(&payload, opts)?;
                if !self.subschemas.iter().any(|s| s.is_instance(&instance)) {
                    return Err(Issues::one(Issue::custom(format!(
                        "value does not belong to {}",
                        self.joined_name()
                    ))));
                }
                Ok(instance)
            }
            None => {
                // First subschema that can produce an instance wins; the
                // is_instance short-circuit above this call already handled
                // conforming values.
                for sub in &self.subschemas {
                    if let Ok(v) = sub.instantiate(value, opts) {
                        return Ok(v);
                    }
                }
                Err(Issues::one(Issue::invalid_type(
                    self.joined_name(),
                    value.type_label(),
                )))
            }
        }
    }
}

/// Shared tag-reading step for interfaces and tagged unions.
fn read_tag(
    input: &IndexMap<String, Value>,
    discriminator: &Discriminator,
) -> Result<(String, Value), Issues> {
    let tag_prop = &discriminator.property;
    let tag = match input.get(tag_prop) {
        None => {
            return Err(Issues::one(Issue::custom(format!(
                "missing discriminator property \"{tag_prop}\""
            ))));
        }
        Some(Value::Str(t)) => t,
        Some(_) => {
            return Err(Issues::one(Issue::custom(format!(
                "discriminator property \"{tag_prop}\" must be a string"
            ))));
        }
    };
    let Some(concrete) = discriminator.resolve_type(tag) else {
        return Err(Issues::one(Issue::custom(format!("unknown type tag \"{tag}\""))));
    };
    let payload = match input.get(VALUE_KEY) {
        Some(v) => v.clone(),
        None => {
            let mut rest = input.clone();
            rest.shift_remove(tag_prop);
            Value::Map(rest)
        }
    };
    Ok((concrete.to_string(), payload))
}
