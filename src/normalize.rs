//! Schema-directed normalization.
//!
//! Projects typed instances back to plain JSON, re-inserting discriminator
//! tags wherever the *declared* schema is polymorphic: a property or list
//! item declared as an interface (or a discriminated `OneOf`) gets its tag
//! property injected first, so the output coerces back through the same
//! schema. Instances sitting in positions declared as their concrete type
//! stay untagged.

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::registry::SchemaSet;
use crate::schema::poly::VALUE_KEY;
use crate::schema::{Discriminator, Schema};
use crate::value::Value;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NormalizeOptions {
    /// Tag the root value when it belongs to a discriminated family.
    pub tag_root: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        NormalizeOptions { tag_root: true }
    }
}

/// Walks instances against the set they were built from.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer<'a> {
    set: &'a SchemaSet,
}

impl<'a> Normalizer<'a> {
    pub fn new(set: &'a SchemaSet) -> Self {
        Normalizer { set }
    }

    pub fn normalize(&self, value: &Value, opts: &NormalizeOptions) -> Json {
        let plain = self.walk(value, None);
        if opts.tag_root {
            if let Some(ty) = value.instance_type() {
                if let Some(family) = self.set.discriminated_family(ty) {
                    return tag(plain, &family.discriminator, ty);
                }
            }
        }
        plain
    }

    /// `discriminator` is the polymorphic context declared by the enclosing
    /// property or list item, if any.
    fn walk(&self, value: &Value, discriminator: Option<&Discriminator>) -> Json {
        let plain = self.walk_plain(value);
        match (discriminator, value.instance_type()) {
            (Some(d), Some(ty)) => tag(plain, d, ty),
            _ => plain,
        }
    }

    fn walk_plain(&self, value: &Value) -> Json {
        match value {
            Value::Null | Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::Str(_) => {
                value.to_json()
            }
            Value::Seq(xs) => Json::Array(xs.iter().map(|x| self.walk(x, None)).collect()),
            Value::Map(m) => {
                let mut out = serde_json::Map::new();
                for (k, v) in m {
                    out.insert(k.clone(), self.walk(v, None));
                }
                Json::Object(out)
            }
            Value::Wrapped { value, .. } => value.to_json(),
            Value::Case { value, .. } => value.to_json(),
            Value::List { ty, items } => {
                let item_disc = self
                    .set
                    .schema(ty)
                    .and_then(|s| match unwrap_schema(s) {
                        Schema::Sequence(sq) => inherent_discriminator(&sq.item),
                        _ => None,
                    });
                Json::Array(items.iter().map(|x| self.walk(x, item_disc)).collect())
            }
            Value::Record { ty, fields } => {
                let shape = self.set.schema(ty).and_then(|s| match unwrap_schema(s) {
                    Schema::Shape(sh) => Some(sh),
                    _ => None,
                });
                let mut out = serde_json::Map::new();
                for (k, v) in fields {
                    let disc = shape
                        .and_then(|sh| sh.properties.get(k))
                        .and_then(|p| {
                            // Per-property binding wins over the type's own.
                            p.discriminator
                                .as_ref()
                                .or_else(|| inherent_discriminator(&p.schema))
                        });
                    out.insert(k.clone(), self.walk(v, disc));
                }
                Json::Object(out)
            }
        }
    }
}

/// The discriminator a declared schema carries for its values, if it is
/// polymorphic at all.
fn inherent_discriminator(schema: &Schema) -> Option<&Discriminator> {
    match unwrap_schema(schema) {
        Schema::Interface(i) => Some(&i.discriminator),
        Schema::OneOf(o) => o.discriminator.as_ref(),
        _ => None,
    }
}

fn unwrap_schema(schema: &Schema) -> &Schema {
    match schema {
        Schema::Optional(o) => unwrap_schema(&o.inner),
        Schema::Deferred(d) => unwrap_schema(d.resolved()),
        other => other,
    }
}

fn tag(plain: Json, discriminator: &Discriminator, concrete: &str) -> Json {
    // Unmapped concrete types get a null tag rather than an invented one.
    let tag_value = match discriminator.tag_for(concrete) {
        Some(t) => Json::String(t),
        None => Json::Null,
    };
    let mut out = serde_json::Map::new();
    out.insert(discriminator.property.clone(), tag_value);
    match plain {
        Json::Object(m) => {
            for (k, v) in m {
                out.insert(k, v);
            }
        }
        // Non-record instances get boxed so the tag has somewhere to live.
        other => {
            out.insert(VALUE_KEY.to_string(), other);
        }
    }
    Json::Object(out)
}
