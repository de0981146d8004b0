//! Schema-graph construction.
//!
//! The host side declares types through [`TypeDef`]/[`TypeRef`] (whatever
//! produced them — static declarations, codegen, reflection — is not this
//! crate's business); [`Registry::build`] lowers the definitions into an
//! immutable [`SchemaSet`], memoizing per name.
//!
//! Cycle guard: a name is marked in-progress before its definition is
//! lowered; re-entering it hands out a `Deferred` placeholder whose shared
//! slot is patched as soon as the definition completes. Mutually recursive
//! type graphs therefore build in one pass.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use regex::Regex;

use crate::error::{BuildResult, SchemaError};
use crate::format::StrFormat;
use crate::schema::{
    Backing, CaseValue, DecimalSchema, DeferredSchema, Discriminator, EnumSchema,
    IntegerSchema, InterfaceSchema, OneOfSchema, OptionalSchema, Property, Schema,
    SequenceSchema, ShapeSchema, TextSchema,
};

/// Reference to a member type inside a definition.
#[derive(Debug, Clone)]
pub enum TypeRef {
    Bool,
    Int,
    Float,
    Str,
    Null,
    /// Raw heterogeneous array, unconstrained.
    Array,
    Named(String),
    /// Becomes an untagged `OneOf`.
    Union(Vec<TypeRef>),
    /// Becomes `OneOf[inner, null]`; a union inner just gains a null arm.
    Nullable(Box<TypeRef>),
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named(name.into())
    }

    pub fn union(members: impl IntoIterator<Item = TypeRef>) -> Self {
        TypeRef::Union(members.into_iter().collect())
    }

    pub fn nullable(self) -> Self {
        TypeRef::Nullable(Box::new(self))
    }
}

/// One property of a shape or interface definition.
#[derive(Debug, Clone)]
pub struct PropertyDef {
    pub name: String,
    pub ty: TypeRef,
    pub optional: bool,
    pub description: Option<String>,
    pub discriminator: Option<Discriminator>,
}

impl PropertyDef {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        PropertyDef {
            name: name.into(),
            ty,
            optional: false,
            description: None,
            discriminator: None,
        }
    }

    /// Absence becomes acceptable (the schema is wrapped in `Optional`).
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Explicit discriminator binding for this property, overriding the
    /// property type's own during normalization.
    pub fn discriminator(mut self, d: Discriminator) -> Self {
        self.discriminator = Some(d);
        self
    }
}

#[derive(Debug, Clone)]
enum DefBody {
    Text {
        min_length: Option<usize>,
        max_length: Option<usize>,
        pattern: Option<String>,
        format: Option<StrFormat>,
    },
    Integer {
        min: Option<i64>,
        max: Option<i64>,
    },
    Decimal {
        min: Option<f64>,
        max: Option<f64>,
    },
    Sequence {
        item: TypeRef,
        min_count: Option<usize>,
        max_count: Option<usize>,
    },
    Shape {
        properties: Vec<PropertyDef>,
    },
    Cases {
        backing: Backing,
        cases: Vec<(String, Option<CaseValue>)>,
    },
    Interface {
        properties: Vec<PropertyDef>,
        discriminator: Discriminator,
        implementers: Vec<String>,
    },
}

/// Declarative definition of one named type. Exactly one based-on kind per
/// type, enforced by construction.
#[derive(Debug, Clone)]
pub struct TypeDef {
    name: String,
    description: Option<String>,
    body: DefBody,
}

impl TypeDef {
    pub fn text(name: impl Into<String>) -> Self {
        TypeDef {
            name: name.into(),
            description: None,
            body: DefBody::Text {
                min_length: None,
                max_length: None,
                pattern: None,
                format: None,
            },
        }
    }

    pub fn integer(name: impl Into<String>, min: Option<i64>, max: Option<i64>) -> Self {
        TypeDef { name: name.into(), description: None, body: DefBody::Integer { min, max } }
    }

    pub fn decimal(name: impl Into<String>, min: Option<f64>, max: Option<f64>) -> Self {
        TypeDef { name: name.into(), description: None, body: DefBody::Decimal { min, max } }
    }

    pub fn sequence(
        name: impl Into<String>,
        item: TypeRef,
        min_count: Option<usize>,
        max_count: Option<usize>,
    ) -> Self {
        TypeDef {
            name: name.into(),
            description: None,
            body: DefBody::Sequence { item, min_count, max_count },
        }
    }

    pub fn shape(name: impl Into<String>) -> Self {
        TypeDef {
            name: name.into(),
            description: None,
            body: DefBody::Shape { properties: Vec::new() },
        }
    }

    pub fn interface(name: impl Into<String>) -> Self {
        TypeDef {
            name: name.into(),
            description: None,
            body: DefBody::Interface {
                properties: Vec::new(),
                discriminator: Discriminator::new(),
                implementers: Vec::new(),
            },
        }
    }

    pub fn str_enum<I, K, V>(name: impl Into<String>, cases: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        TypeDef {
            name: name.into(),
            description: None,
            body: DefBody::Cases {
                backing: Backing::Str,
                cases: cases
                    .into_iter()
                    .map(|(k, v)| (k.into(), Some(CaseValue::Str(v.into()))))
                    .collect(),
            },
        }
    }

    pub fn int_enum<I, K>(name: impl Into<String>, cases: I) -> Self
    where
        I: IntoIterator<Item = (K, i64)>,
        K: Into<String>,
    {
        TypeDef {
            name: name.into(),
            description: None,
            body: DefBody::Cases {
                backing: Backing::Int,
                cases: cases
                    .into_iter()
                    .map(|(k, v)| (k.into(), Some(CaseValue::Int(v))))
                    .collect(),
            },
        }
    }

    pub fn unbacked_enum<I, K>(name: impl Into<String>, cases: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        TypeDef {
            name: name.into(),
            description: None,
            body: DefBody::Cases {
                backing: Backing::Unbacked,
                cases: cases.into_iter().map(|k| (k.into(), None)).collect(),
            },
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn min_length(mut self, n: usize) -> Self {
        if let DefBody::Text { min_length, .. } = &mut self.body {
            *min_length = Some(n);
        }
        self
    }

    pub fn max_length(mut self, n: usize) -> Self {
        if let DefBody::Text { max_length, .. } = &mut self.body {
            *max_length = Some(n);
        }
        self
    }

    pub fn pattern(mut self, p: impl Into<String>) -> Self {
        if let DefBody::Text { pattern, .. } = &mut self.body {
            *pattern = Some(p.into());
        }
        self
    }

    pub fn format(mut self, f: StrFormat) -> Self {
        if let DefBody::Text { format, .. } = &mut self.body {
            *format = Some(f);
        }
        self
    }

    /// Appends a property (shapes and interfaces).
    pub fn property(mut self, p: PropertyDef) -> Self {
        match &mut self.body {
            DefBody::Shape { properties } | DefBody::Interface { properties, .. } => {
                properties.push(p);
            }
            _ => {}
        }
        self
    }

    /// Replaces the interface's discriminator (defaults to `__type`).
    pub fn discriminator(mut self, d: Discriminator) -> Self {
        if let DefBody::Interface { discriminator, .. } = &mut self.body {
            *discriminator = d;
        }
        self
    }

    /// Registers a concrete type as an implementation of this interface.
    pub fn implementer(mut self, name: impl Into<String>) -> Self {
        if let DefBody::Interface { implementers, .. } = &mut self.body {
            implementers.push(name.into());
        }
        self
    }
}

/// Mutable collection of definitions; [`Registry::build`] seals it.
#[derive(Debug, Default)]
pub struct Registry {
    defs: IndexMap<String, TypeDef>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, def: TypeDef) -> BuildResult<()> {
        if self.defs.contains_key(&def.name) {
            return Err(SchemaError::DuplicateDefinition(def.name));
        }
        self.defs.insert(def.name.clone(), def);
        Ok(())
    }

    /// Lowers every definition, patching deferred slots as types complete.
    pub fn build(self) -> BuildResult<SchemaSet> {
        let defs = self.defs;
        let mut builder = Builder {
            defs: &defs,
            built: IndexMap::new(),
            in_progress: HashSet::new(),
            pending: HashMap::new(),
        };
        for name in defs.keys() {
            builder.schema_for(name)?;
        }
        if let Some(name) = builder.pending.keys().next() {
            return Err(SchemaError::Unresolved(name.clone()));
        }
        Ok(SchemaSet { schemas: builder.built })
    }
}

struct Builder<'a> {
    defs: &'a IndexMap<String, TypeDef>,
    built: IndexMap<String, Arc<Schema>>,
    in_progress: HashSet<String>,
    pending: HashMap<String, Vec<Arc<OnceCell<Arc<Schema>>>>>,
}

impl Builder<'_> {
    fn schema_for(&mut self, name: &str) -> BuildResult<Arc<Schema>> {
        if let Some(s) = self.built.get(name) {
            return Ok(s.clone());
        }
        if self.in_progress.contains(name) {
            let slot = Arc::new(OnceCell::new());
            self.pending
                .entry(name.to_string())
                .or_default()
                .push(slot.clone());
            return Ok(Arc::new(Schema::Deferred(DeferredSchema {
                name: name.to_string(),
                slot,
            })));
        }
        let defs = self.defs;
        let def = defs
            .get(name)
            .ok_or_else(|| SchemaError::UnknownType(name.to_string()))?;
        self.in_progress.insert(name.to_string());
        let schema = Arc::new(self.lower(def)?);
        self.in_progress.remove(name);
        self.built.insert(name.to_string(), schema.clone());
        if let Some(slots) = self.pending.remove(name) {
            for slot in slots {
                let _ = slot.set(schema.clone());
            }
        }
        Ok(schema)
    }

    fn resolve_ref(&mut self, r: &TypeRef) -> BuildResult<Arc<Schema>> {
        Ok(match r {
            TypeRef::Bool => Arc::new(Schema::Bool { description: None }),
            TypeRef::Int => Arc::new(Schema::Int { description: None }),
            TypeRef::Float => Arc::new(Schema::Float { description: None }),
            TypeRef::Str => Arc::new(Schema::Str { description: None }),
            TypeRef::Null => Arc::new(Schema::Null { description: None }),
            TypeRef::Array => Arc::new(Schema::Array { description: None }),
            TypeRef::Named(n) => self.schema_for(n)?,
            TypeRef::Union(members) => {
                let mut subschemas = Vec::with_capacity(members.len());
                for m in members {
                    subschemas.push(self.resolve_ref(m)?);
                }
                Arc::new(Schema::OneOf(OneOfSchema {
                    subschemas,
                    discriminator: None,
                    description: None,
                }))
            }
            TypeRef::Nullable(inner) => match inner.as_ref() {
                // Already a union: just make sure it has a null arm.
                TypeRef::Union(members) => {
                    let mut subschemas = Vec::with_capacity(members.len() + 1);
                    for m in members {
                        subschemas.push(self.resolve_ref(m)?);
                    }
                    if !members.iter().any(|m| matches!(m, TypeRef::Null)) {
                        subschemas.push(Arc::new(Schema::Null { description: None }));
                    }
                    Arc::new(Schema::OneOf(OneOfSchema {
                        subschemas,
                        discriminator: None,
                        description: None,
                    }))
                }
                other => {
                    let schema = self.resolve_ref(other)?;
                    Arc::new(Schema::OneOf(OneOfSchema {
                        subschemas: vec![schema, Arc::new(Schema::Null { description: None })],
                        discriminator: None,
                        description: None,
                    }))
                }
            },
        })
    }

    fn resolve_property(&mut self, p: &PropertyDef) -> BuildResult<(String, Property)> {
        let mut schema = self.resolve_ref(&p.ty)?;
        if p.optional {
            schema = Arc::new(Schema::Optional(OptionalSchema { inner: schema }));
        }
        Ok((
            p.name.clone(),
            Property {
                schema,
                description: p.description.clone(),
                discriminator: p.discriminator.clone(),
            },
        ))
    }

    fn lower(&mut self, def: &TypeDef) -> BuildResult<Schema> {
        let name = def.name.clone();
        let description = def.description.clone();
        Ok(match &def.body {
            DefBody::Text { min_length, max_length, pattern, format } => {
                let pattern = match pattern {
                    Some(p) => Some(Regex::new(p).map_err(|e| SchemaError::InvalidPattern {
                        name: name.clone(),
                        source: Box::new(e),
                    })?),
                    None => None,
                };
                Schema::Text(TextSchema {
                    name,
                    description,
                    min_length: *min_length,
                    max_length: *max_length,
                    pattern,
                    format: *format,
                })
            }
            DefBody::Integer { min, max } => {
                Schema::Integer(IntegerSchema { name, description, min: *min, max: *max })
            }
            DefBody::Decimal { min, max } => {
                Schema::Decimal(DecimalSchema { name, description, min: *min, max: *max })
            }
            DefBody::Sequence { item, min_count, max_count } => {
                Schema::Sequence(SequenceSchema {
                    name,
                    description,
                    item: self.resolve_ref(item)?,
                    min_count: *min_count,
                    max_count: *max_count,
                })
            }
            DefBody::Shape { properties } => {
                let mut props = IndexMap::with_capacity(properties.len());
                for p in properties {
                    let (pname, prop) = self.resolve_property(p)?;
                    props.insert(pname, prop);
                }
                Schema::Shape(ShapeSchema { name, description, properties: props })
            }
            DefBody::Cases { backing, cases } => {
                if cases.is_empty() {
                    return Err(SchemaError::EmptyEnum(name));
                }
                let mut seen = HashSet::new();
                let mut out = IndexMap::with_capacity(cases.len());
                for (case_name, value) in cases {
                    let rendered = match value {
                        Some(CaseValue::Str(s)) => s.clone(),
                        Some(CaseValue::Int(i)) => i.to_string(),
                        None => case_name.clone(),
                    };
                    if !seen.insert(rendered.clone()) {
                        return Err(SchemaError::DuplicateCaseValue { name, value: rendered });
                    }
                    out.insert(case_name.clone(), value.clone());
                }
                Schema::Cases(EnumSchema { name, description, backing: *backing, cases: out })
            }
            DefBody::Interface { properties, discriminator, implementers } => {
                let mut props = IndexMap::with_capacity(properties.len());
                for p in properties {
                    let (pname, prop) = self.resolve_property(p)?;
                    props.insert(pname, prop);
                }
                let mut implementations = IndexMap::with_capacity(implementers.len());
                for impl_name in implementers {
                    let schema =
                        self.schema_for(impl_name)
                            .map_err(|e| match e {
                                SchemaError::UnknownType(n) => SchemaError::UnknownImplementer {
                                    interface: name.clone(),
                                    name: n,
                                },
                                other => other,
                            })?;
                    implementations.insert(impl_name.clone(), schema);
                }
                Schema::Interface(InterfaceSchema {
                    name,
                    description,
                    properties: props,
                    discriminator: discriminator.clone(),
                    implementations,
                })
            }
        })
    }
}

/// Immutable, shareable result of a build. The process-wide cache of the
/// original design lives here explicitly instead of in ambient statics.
#[derive(Debug, Clone)]
pub struct SchemaSet {
    schemas: IndexMap<String, Arc<Schema>>,
}

impl SchemaSet {
    pub fn schema(&self, name: &str) -> Option<&Arc<Schema>> {
        self.schemas.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<Schema>)> {
        self.schemas.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// The discriminated family a concrete type belongs to, if any.
    pub fn discriminated_family(&self, concrete: &str) -> Option<&InterfaceSchema> {
        self.schemas.values().find_map(|s| match s.as_ref() {
            Schema::Interface(i) if i.implementations.contains_key(concrete) => Some(i),
            _ => None,
        })
    }
}
