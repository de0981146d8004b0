//! Structured validation failures.
//!
//! Every check that fails produces one [`Issue`] (kind + message + path);
//! nested schema calls bubble their issues up through [`Issues`], prepending
//! a path segment per level, so the final path reads outer→inner. Nothing
//! short-circuits: a node exhausts its own checks and all of its children's
//! before the aggregate is either discarded (empty) or surfaced.

use std::fmt;

/// One step of the location path: a property name or a sequence index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(k) => write!(f, "{k}"),
            PathSegment::Index(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(k: &str) -> Self {
        PathSegment::Key(k.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(i: usize) -> Self {
        PathSegment::Index(i)
    }
}

/// Closed taxonomy of validation failures, each with kind-specific payload.
#[derive(Debug, Clone, PartialEq)]
pub enum IssueKind {
    InvalidType { expected: String, received: String },
    UnrecognizedKeys { keys: Vec<String> },
    InvalidEnumValue { accepted: Vec<String> },
    InvalidReturnType { expected: String, received: String },
    InvalidString { validation: String },
    TooSmall { minimum: f64, inclusive: bool, exact: bool },
    TooBig { maximum: f64, inclusive: bool, exact: bool },
    Custom,
}

impl IssueKind {
    pub fn code(&self) -> &'static str {
        match self {
            IssueKind::InvalidType { .. } => "invalid_type",
            IssueKind::UnrecognizedKeys { .. } => "unrecognized_keys",
            IssueKind::InvalidEnumValue { .. } => "invalid_enum_value",
            IssueKind::InvalidReturnType { .. } => "invalid_return_type",
            IssueKind::InvalidString { .. } => "invalid_string",
            IssueKind::TooSmall { .. } => "too_small",
            IssueKind::TooBig { .. } => "too_big",
            IssueKind::Custom => "custom",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
    pub kind: IssueKind,
    pub message: String,
    pub path: Vec<PathSegment>,
}

// Prefer emitting integers when the bound is whole (same convention as the
// descriptor emitter).
pub(crate) fn json_num_pref_i64(n: f64) -> serde_json::Value {
    if n.is_finite() && n.fract() == 0.0 && n >= i64::MIN as f64 && n <= i64::MAX as f64 {
        serde_json::Value::from(n as i64)
    } else {
        serde_json::Value::from(n)
    }
}

fn fmt_bound(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

impl Issue {
    pub fn invalid_type(expected: impl Into<String>, received: impl Into<String>) -> Self {
        let expected = expected.into();
        let received = received.into();
        let message = format!("expected {expected}, received {received}");
        Issue { kind: IssueKind::InvalidType { expected, received }, message, path: Vec::new() }
    }

    /// Missing required property: `invalid_type` with a "required" message.
    pub fn required(expected: impl Into<String>) -> Self {
        let expected = expected.into();
        let message = format!("required, expected {expected}");
        Issue {
            kind: IssueKind::InvalidType { expected, received: "missing".to_string() },
            message,
            path: Vec::new(),
        }
    }

    pub fn unrecognized_keys(keys: Vec<String>) -> Self {
        let message = format!("unrecognized keys: {}", keys.join(", "));
        Issue { kind: IssueKind::UnrecognizedKeys { keys }, message, path: Vec::new() }
    }

    pub fn invalid_enum_value(accepted: Vec<String>) -> Self {
        let message = format!("invalid enum value, expected one of {}", accepted.join("|"));
        Issue { kind: IssueKind::InvalidEnumValue { accepted }, message, path: Vec::new() }
    }

    pub fn invalid_return_type(
        expected: impl Into<String>,
        received: impl Into<String>,
    ) -> Self {
        let expected = expected.into();
        let received = received.into();
        let message = format!("expected {expected}, received {received}");
        Issue { kind: IssueKind::InvalidReturnType { expected, received }, message, path: Vec::new() }
    }

    pub fn invalid_string(validation: impl Into<String>) -> Self {
        let validation = validation.into();
        let message = format!("invalid {validation}");
        Issue { kind: IssueKind::InvalidString { validation }, message, path: Vec::new() }
    }

    /// `subject` names the counted unit ("characters", "items"); empty for
    /// plain numeric comparisons. `exact` flips the message to "exactly N"
    /// (used when a min/max pair collapses to one value).
    pub fn too_small(minimum: f64, exact: bool, subject: &str) -> Self {
        let bound = fmt_bound(minimum);
        let message = if exact {
            format!("expected exactly {bound} {subject}")
        } else {
            format!("expected at least {bound} {subject}")
        };
        Issue {
            kind: IssueKind::TooSmall { minimum, inclusive: true, exact },
            message: message.trim_end().to_string(),
            path: Vec::new(),
        }
    }

    pub fn too_big(maximum: f64, exact: bool, subject: &str) -> Self {
        let bound = fmt_bound(maximum);
        let message = if exact {
            format!("expected exactly {bound} {subject}")
        } else {
            format!("expected at most {bound} {subject}")
        };
        Issue {
            kind: IssueKind::TooBig { maximum, inclusive: true, exact },
            message: message.trim_end().to_string(),
            path: Vec::new(),
        }
    }

    pub fn custom(message: impl Into<String>) -> Self {
        Issue { kind: IssueKind::Custom, message: message.into(), path: Vec::new() }
    }

    /// Same issue, path extended at the front.
    pub fn with_prefix(mut self, segment: PathSegment) -> Self {
        self.path.insert(0, segment);
        self
    }

    /// Dot-joined path, empty string at the root.
    pub fn path_string(&self) -> String {
        self.path
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(".")
    }

    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::{json, Value};
        let path: Vec<Value> = self
            .path
            .iter()
            .map(|s| match s {
                PathSegment::Key(k) => Value::from(k.clone()),
                PathSegment::Index(i) => Value::from(*i),
            })
            .collect();
        let mut out = json!({
            "code": self.kind.code(),
            "message": self.message,
            "path": path,
        });
        match &self.kind {
            IssueKind::InvalidType { expected, received }
            | IssueKind::InvalidReturnType { expected, received } => {
                out["expected"] = Value::from(expected.clone());
                out["received"] = Value::from(received.clone());
            }
            IssueKind::UnrecognizedKeys { keys } => {
                out["keys"] = Value::Array(keys.iter().cloned().map(Value::from).collect());
            }
            IssueKind::InvalidEnumValue { accepted } => {
                out["accepted"] = Value::Array(accepted.iter().cloned().map(Value::from).collect());
            }
            IssueKind::InvalidString { validation } => {
                out["validation"] = Value::from(validation.clone());
            }
            IssueKind::TooSmall { minimum, inclusive, exact } => {
                out["minimum"] = json_num_pref_i64(*minimum);
                out["inclusive"] = Value::from(*inclusive);
                out["exact"] = Value::from(*exact);
            }
            IssueKind::TooBig { maximum, inclusive, exact } => {
                out["maximum"] = json_num_pref_i64(*maximum);
                out["inclusive"] = Value::from(*inclusive);
                out["exact"] = Value::from(*exact);
            }
            IssueKind::Custom => {}
        }
        out
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = self.path_string();
        if path.is_empty() {
            write!(f, "{}: {}", self.kind.code(), self.message)
        } else {
            write!(f, "{path}: {} {}", self.kind.code(), self.message)
        }
    }
}

/// Ordered collection of issues; the sole payload of a failed coercion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Issues {
    items: Vec<Issue>,
}

impl Issues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn one(issue: Issue) -> Self {
        Issues { items: vec![issue] }
    }

    pub fn add(&mut self, issue: Issue) {
        self.items.push(issue);
    }

    /// Append another collection; when `segment` is given, every added issue
    /// gets that segment prepended to its path first.
    pub fn add_all(&mut self, other: Issues, segment: Option<PathSegment>) {
        match segment {
            None => self.items.extend(other.items),
            Some(seg) => self
                .items
                .extend(other.items.into_iter().map(|i| i.with_prefix(seg.clone()))),
        }
    }

    /// Splice another collection *before* the current items, paths untouched.
    pub fn prepend(&mut self, other: Issues) {
        let mut items = other.items;
        items.append(&mut self.items);
        self.items = items;
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Issue> {
        self.items.iter()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Array(self.items.iter().map(Issue::to_json).collect())
    }

    /// `Ok(())` when empty, otherwise the collection itself.
    pub fn into_result(self) -> Result<(), Issues> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for Issues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .items
            .iter()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(". ");
        write!(f, "{joined}")
    }
}

impl IntoIterator for Issues {
    type Item = Issue;
    type IntoIter = std::vec::IntoIter<Issue>;
    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl From<Issue> for Issues {
    fn from(issue: Issue) -> Self {
        Issues::one(issue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixing_builds_outer_to_inner_paths() {
        let inner = Issue::too_small(3.0, false, "characters").with_prefix("givenName".into());
        let mut all = Issues::new();
        all.add_all(Issues::one(inner), Some("person".into()));
        let issue = all.iter().next().unwrap();
        assert_eq!(issue.path_string(), "person.givenName");
    }

    #[test]
    fn prepend_splices_before_existing_items() {
        let mut items = Issues::one(Issue::invalid_string("uuid").with_prefix(0.into()));
        let counts = Issues::one(Issue::too_big(4.0, false, "items"));
        items.prepend(counts);
        let codes: Vec<_> = items.iter().map(|i| i.kind.code()).collect();
        assert_eq!(codes, vec!["too_big", "invalid_string"]);
    }

    #[test]
    fn issue_json_carries_code_and_payload() {
        let issue = Issue::too_small(2.0, false, "items").with_prefix("tags".into());
        let j = issue.to_json();
        assert_eq!(j["code"], "too_small");
        assert_eq!(j["minimum"], 2);
        assert_eq!(j["inclusive"], true);
        assert_eq!(j["exact"], false);
        assert_eq!(j["path"], serde_json::json!(["tags"]));
    }

    #[test]
    fn exact_bound_message_reads_exactly() {
        let issue = Issue::too_small(3.0, true, "items");
        assert_eq!(issue.message, "expected exactly 3 items");
        let bare = Issue::too_big(10.0, false, "");
        assert_eq!(bare.message, "expected at most 10");
    }
}
