//! String-based named types: length bounds, substring pattern, format.

use regex::Regex;
use serde_json::json;

use crate::format::StrFormat;
use crate::issue::{Issue, Issues};
use crate::value::Value;

/// String reading of a loose value. Wrapper instances of other string-based
/// types count as stringable.
pub(crate) fn string_from(value: &Value) -> Option<String> {
    match value {
        Value::Str(s) => Some(s.clone()),
        Value::Wrapped { value, .. } => string_from(value),
        Value::Case { value, .. } => string_from(value),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct TextSchema {
    pub name: String,
    pub description: Option<String>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    /// Unanchored: a substring match satisfies the constraint.
    pub pattern: Option<Regex>,
    pub format: Option<StrFormat>,
}

impl TextSchema {
    pub(crate) fn instantiate(&self, value: &Value) -> Result<Value, Issues> {
        let Some(s) = string_from(value) else {
            return Err(Issues::one(Issue::invalid_type(&self.name, value.type_label())));
        };
        let mut out = Issues::new();
        let len = s.chars().count();
        let exact = self.min_length.is_some() && self.min_length == self.max_length;
        if let Some(min) = self.min_length {
            if len < min {
                out.add(Issue::too_small(min as f64, exact, "characters"));
            }
        }
        if let Some(max) = self.max_length {
            if len > max {
                out.add(Issue::too_big(max as f64, exact, "characters"));
            }
        }
        if let Some(pattern) = &self.pattern {
            if !pattern.is_match(&s) {
                out.add(Issue::invalid_string("pattern"));
            }
        }
        if let Some(format) = self.format {
            if !format.check(&s) {
                out.add(Issue::invalid_string(format.name()));
            }
        }
        out.into_result()?;
        Ok(Value::Wrapped { ty: self.name.clone(), value: Box::new(Value::Str(s)) })
    }

    pub(crate) fn descriptor(&self) -> serde_json::Value {
        let mut o = json!({ "type": self.name, "name": self.name });
        if let Some(d) = &self.description {
            o["description"] = json!(d);
        }
        if let Some(min) = self.min_length {
            o["minLength"] = json!(min);
        }
        if let Some(max) = self.max_length {
            o["maxLength"] = json!(max);
        }
        if let Some(p) = &self.pattern {
            o["pattern"] = json!(p.as_str());
        }
        if let Some(f) = self.format {
            o["format"] = json!(f.name());
        }
        o
    }
}
