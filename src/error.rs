//! Error boundary.
//!
//! Two distinct classes: [`CoerceError`] means the *data* was invalid and
//! carries the full issue collection; [`SchemaError`] means the schema
//! *definitions* are malformed (a programmer/configuration error raised
//! during graph construction, never aggregated into issues).

use thiserror::Error;

use crate::issue::Issues;
use crate::value::Value;

/// A failed coercion: offending value description, target schema name, and
/// every issue collected while the node and its children were checked.
#[derive(Debug, Clone, Error)]
#[error("Failed to coerce {value} into {schema}. {issues}")]
pub struct CoerceError {
    /// Rendered description of the offending value.
    pub value: String,
    /// Display name of the schema the value was coerced into.
    pub schema: String,
    pub issues: Issues,
}

impl CoerceError {
    pub fn new(value: &Value, schema: impl Into<String>, issues: Issues) -> Self {
        CoerceError { value: value.describe(), schema: schema.into(), issues }
    }

    /// JSON form: the issues array.
    pub fn to_json(&self) -> serde_json::Value {
        self.issues.to_json()
    }
}

/// Malformed schema definitions, reported while building the graph.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("unknown type reference: {0}")]
    UnknownType(String),

    #[error("duplicate type definition: {0}")]
    DuplicateDefinition(String),

    #[error("invalid pattern on {name}: {source}")]
    InvalidPattern {
        name: String,
        #[source]
        source: Box<regex::Error>,
    },

    #[error("duplicate case value {value} in enum {name}")]
    DuplicateCaseValue { name: String, value: String },

    #[error("enum {0} has no cases")]
    EmptyEnum(String),

    #[error("interface {interface} lists unknown implementer {name}")]
    UnknownImplementer { interface: String, name: String },

    #[error("deferred schema for {0} was never resolved")]
    Unresolved(String),
}

pub type BuildResult<T> = Result<T, SchemaError>;
