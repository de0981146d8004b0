//! List-based named types: a fixed item schema plus count bounds.

use std::sync::Arc;

use serde_json::json;

use crate::issue::{Issue, Issues, PathSegment};
use crate::schema::{CoerceOptions, Schema};
use crate::value::Value;

#[derive(Debug, Clone)]
pub struct SequenceSchema {
    pub name: String,
    pub description: Option<String>,
    pub item: Arc<Schema>,
    pub min_count: Option<usize>,
    pub max_count: Option<usize>,
}

impl SequenceSchema {
    pub(crate) fn instantiate(&self, value: &Value, opts: &CoerceOptions) -> Result<Value, Issues> {
        let Some(input) = value.as_seq_like() else {
            return Err(Issues::one(Issue::invalid_type(&self.name, value.type_label())));
        };

        // Every item runs, no matter how many fail; each failure lands
        // under its index.
        let mut out = Issues::new();
        let mut items = Vec::with_capacity(input.len());
        for (i, item) in input.iter().enumerate() {
            match self.item.instantiate(item, opts) {
                Ok(v) => items.push(v),
                Err(issues) => out.add_all(issues, Some(PathSegment::Index(i))),
            }
        }

        // Count bounds are checked after the full iteration and spliced in
        // front, so they lead the final ordering.
        let mut counts = Issues::new();
        let exact = self.min_count.is_some() && self.min_count == self.max_count;
        if let Some(min) = self.min_count {
            if input.len() < min {
                counts.add(Issue::too_small(min as f64, exact, "items"));
            }
        }
        if let Some(max) = self.max_count {
            if input.len() > max {
                counts.add(Issue::too_big(max as f64, exact, "items"));
            }
        }
        out.prepend(counts);

        out.into_result()?;
        Ok(Value::List { ty: self.name.clone(), items })
    }

    pub(crate) fn descriptor(&self) -> serde_json::Value {
        let mut o = json!({
            "type": self.name,
            "name": self.name,
            "itemType": self.item.type_name(),
        });
        if let Some(d) = &self.description {
            o["description"] = json!(d);
        }
        if let Some(min) = self.min_count {
            o["minCount"] = json!(min);
        }
        if let Some(max) = self.max_count {
            o["maxCount"] = json!(max);
        }
        o
    }
}
