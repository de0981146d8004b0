//! Integer- and float-based named types, plus the shared numeric coercion
//! rules.
//!
//! String inputs must survive an exact round trip: `"2.0"` is not an
//! integer, `" 2"` is nothing at all. Floats reach an integer target only
//! when they carry no fractional part.

use serde_json::json;

use crate::issue::{json_num_pref_i64, Issue, Issues};
use crate::value::Value;

/// Exact integer reading of a loose value. `None` means the value has no
/// integer interpretation at all (a structural failure, not a range one).
pub(crate) fn int_from(value: &Value) -> Option<i64> {
    match value {
        Value::Int(i) => Some(*i),
        Value::Float(f) => {
            // Truncation round trip: fraction-free and strictly below 2^63.
            // `i64::MAX as f64` rounds up to 2^63 itself, so the top bound
            // is exclusive; the cast would otherwise saturate.
            if f.is_finite() && f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 {
                Some(*f as i64)
            } else {
                None
            }
        }
        Value::Str(s) => {
            let parsed: i64 = s.parse().ok()?;
            // The string form of the parsed number must equal the input, so
            // "+2", "2.0" and padded forms are all rejected.
            (parsed.to_string() == *s).then_some(parsed)
        }
        // Instances of other numeric wrapper types count as numbers.
        Value::Wrapped { value, .. } => int_from(value),
        _ => None,
    }
}

pub(crate) fn float_from(value: &Value) -> Option<f64> {
    match value {
        Value::Float(f) => Some(*f),
        Value::Int(i) => Some(*i as f64),
        Value::Str(s) => {
            let parsed: f64 = s.parse().ok()?;
            // Same exactness contract as the integer path: the canonical
            // string form of the parsed number must equal the input, so
            // "2.50", "+2.5", ".5" and "1e3" are all rejected.
            (parsed.is_finite() && parsed.to_string() == *s).then_some(parsed)
        }
        Value::Wrapped { value, .. } => float_from(value),
        _ => None,
    }
}

/// Named type wrapping an integer, with an inclusive range.
#[derive(Debug, Clone)]
pub struct IntegerSchema {
    pub name: String,
    pub description: Option<String>,
    pub min: Option<i64>,
    pub max: Option<i64>,
}

impl IntegerSchema {
    pub(crate) fn instantiate(&self, value: &Value) -> Result<Value, Issues> {
        let Some(n) = int_from(value) else {
            return Err(Issues::one(Issue::invalid_type(&self.name, value.type_label())));
        };
        let mut out = Issues::new();
        let exact = self.min.is_some() && self.min == self.max;
        if let Some(min) = self.min {
            if n < min {
                out.add(Issue::too_small(min as f64, exact, ""));
            }
        }
        if let Some(max) = self.max {
            if n > max {
                out.add(Issue::too_big(max as f64, exact, ""));
            }
        }
        out.into_result()?;
        Ok(Value::Wrapped { ty: self.name.clone(), value: Box::new(Value::Int(n)) })
    }

    pub(crate) fn descriptor(&self) -> serde_json::Value {
        let mut o = json!({ "type": self.name, "name": self.name });
        if let Some(d) = &self.description {
            o["description"] = json!(d);
        }
        if let Some(min) = self.min {
            o["minimum"] = json!(min);
        }
        if let Some(max) = self.max {
            o["maximum"] = json!(max);
        }
        o
    }
}

/// Named type wrapping a float, with an inclusive range.
#[derive(Debug, Clone)]
pub struct DecimalSchema {
    pub name: String,
    pub description: Option<String>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl DecimalSchema {
    pub(crate) fn instantiate(&self, value: &Value) -> Result<Value, Issues> {
        let Some(n) = float_from(value) else {
            return Err(Issues::one(Issue::invalid_type(&self.name, value.type_label())));
        };
        let mut out = Issues::new();
        let exact = self.min.is_some() && self.min == self.max;
        if let Some(min) = self.min {
            if n < min {
                out.add(Issue::too_small(min, exact, ""));
            }
        }
        if let Some(max) = self.max {
            if n > max {
                out.add(Issue::too_big(max, exact, ""));
            }
        }
        out.into_result()?;
        Ok(Value::Wrapped { ty: self.name.clone(), value: Box::new(Value::Float(n)) })
    }

    pub(crate) fn descriptor(&self) -> serde_json::Value {
        let mut o = json!({ "type": self.name, "name": self.name });
        if let Some(d) = &self.description {
            o["description"] = json!(d);
        }
        if let Some(min) = self.min {
            o["minimum"] = json_num_pref_i64(min);
        }
        if let Some(max) = self.max {
            o["maximum"] = json_num_pref_i64(max);
        }
        o
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{CoerceOptions, Schema};

    fn age() -> Schema {
        Schema::Integer(IntegerSchema {
            name: "Age".into(),
            description: None,
            min: Some(0),
            max: Some(150),
        })
    }

    #[test]
    fn string_round_trip_is_exact() {
        let opts = CoerceOptions::default();
        let schema = age();
        assert!(matches!(
            schema.instantiate(&Value::Str("42".into()), &opts),
            Ok(Value::Wrapped { .. })
        ));
        for bad in ["2.0", " 2", "2 ", "+2", "02"] {
            let err = schema.instantiate(&Value::Str(bad.into()), &opts).unwrap_err();
            assert_eq!(err.iter().next().unwrap().kind.code(), "invalid_type", "{bad}");
        }
    }

    #[test]
    fn floats_need_an_empty_fraction() {
        let opts = CoerceOptions::default();
        let schema = age();
        let ok = schema.instantiate(&Value::Float(2.0), &opts).unwrap();
        assert_eq!(
            ok,
            Value::Wrapped { ty: "Age".into(), value: Box::new(Value::Int(2)) }
        );
        assert!(schema.instantiate(&Value::Float(2.5), &opts).is_err());
    }

    #[test]
    fn inclusive_range_and_instance_passthrough() {
        let opts = CoerceOptions::default();
        let schema = age();
        assert!(schema.instantiate(&Value::Int(150), &opts).is_ok());
        let err = schema.instantiate(&Value::Int(151), &opts).unwrap_err();
        let issue = err.iter().next().unwrap();
        assert_eq!(issue.kind.code(), "too_big");
        assert_eq!(issue.message, "expected at most 150");

        let instance = Value::Wrapped { ty: "Age".into(), value: Box::new(Value::Int(9)) };
        assert_eq!(schema.instantiate(&instance, &opts), Ok(instance.clone()));
    }

    #[test]
    fn collapsed_range_reads_exactly() {
        let opts = CoerceOptions::default();
        let schema = Schema::Integer(IntegerSchema {
            name: "Five".into(),
            description: None,
            min: Some(5),
            max: Some(5),
        });
        let err = schema.instantiate(&Value::Int(4), &opts).unwrap_err();
        let issue = err.iter().next().unwrap();
        assert_eq!(issue.message, "expected exactly 5");
        assert!(matches!(
            issue.kind,
            crate::issue::IssueKind::TooSmall { exact: true, .. }
        ));
    }

    #[test]
    fn decimal_accepts_ints_and_numeric_strings() {
        let opts = CoerceOptions::default();
        let schema = Schema::Decimal(DecimalSchema {
            name: "Rating".into(),
            description: None,
            min: Some(0.0),
            max: Some(5.0),
        });
        assert!(schema.instantiate(&Value::Int(4), &opts).is_ok());
        assert!(schema.instantiate(&Value::Str("4.5".into()), &opts).is_ok());
        assert!(schema.instantiate(&Value::Str("nope".into()), &opts).is_err());
        let err = schema.instantiate(&Value::Float(5.5), &opts).unwrap_err();
        assert_eq!(err.iter().next().unwrap().kind.code(), "too_big");
    }

    #[test]
    fn decimal_string_round_trip_is_exact() {
        let opts = CoerceOptions::default();
        let schema = Schema::Decimal(DecimalSchema {
            name: "Rating".into(),
            description: None,
            min: None,
            max: None,
        });
        for ok in ["4.5", "2", "-3.25", "0.5"] {
            assert!(schema.instantiate(&Value::Str(ok.into()), &opts).is_ok(), "{ok}");
        }
        // Non-canonical spellings of valid numbers are still rejected.
        for bad in ["2.50", "+2.5", ".5", "1e3", "2.0", "NaN", "inf"] {
            let err = schema.instantiate(&Value::Str(bad.into()), &opts).unwrap_err();
            assert_eq!(err.iter().next().unwrap().kind.code(), "invalid_type", "{bad}");
        }
    }

    #[test]
    fn float_to_int_top_bound_is_exclusive() {
        let opts = CoerceOptions::default();
        let schema = Schema::Int { description: None };
        // 9.223372036854776e18 == 2^63 == i64::MAX as f64; casting it would
        // saturate to a different integer, so it must not coerce.
        assert!(schema.instantiate(&Value::Float(9.223372036854776e18), &opts).is_err());
        assert_eq!(
            schema.instantiate(&Value::Float(-9.223372036854776e18), &opts),
            Ok(Value::Int(i64::MIN))
        );
    }
}
