//! Evaluates a parsed [`Expr`] against a record's payload.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use regex::Regex;
use serde_json::Value;

// Layer 3: Internal module imports
use super::ast::{Expr, Literal, Op};
use pipeline_core::value::resolve_path;
use pipeline_core::Payload;

/// Evaluates `expr` against `payload`.
///
/// "Comparisons against missing fields: `exists` returns false; `!=`
/// returns true (note this documented asymmetry); all other operators
/// return false." (spec §4.6)
pub fn evaluate(expr: &Expr, payload: &Payload) -> bool {
    match expr {
        Expr::Exists(field) => resolve_path(payload, field).is_some(),
        Expr::Compare { field, op, value } => match resolve_path(payload, field) {
            None => *op == Op::Ne,
            Some(actual) => compare(actual, *op, value),
        },
        Expr::And(lhs, rhs) => evaluate(lhs, payload) && evaluate(rhs, payload),
        Expr::Or(lhs, rhs) => evaluate(lhs, payload) || evaluate(rhs, payload),
    }
}

fn compare(actual: &Value, op: Op, value: &Literal) -> bool {
    match op {
        Op::Eq => literal_eq(actual, value),
        Op::Ne => !literal_eq(actual, value),
        Op::Gt | Op::Ge | Op::Lt | Op::Le => numeric_compare(actual, op, value),
        Op::RegexMatch => regex_match(actual, value),
        Op::In => matches_any(actual, value),
        Op::NotIn => !matches_any(actual, value),
        Op::Contains => contains(actual, value),
        Op::StartsWith => string_op(actual, value, str::starts_with),
        Op::EndsWith => string_op(actual, value, str::ends_with),
    }
}

fn literal_eq(actual: &Value, literal: &Literal) -> bool {
    match literal {
        Literal::Str(s) => actual.as_str().map(|a| a == s).unwrap_or(false),
        Literal::Num(n) => actual.as_f64().map(|a| a == *n).unwrap_or(false),
        Literal::List(_) => false,
    }
}

fn numeric_compare(actual: &Value, op: Op, value: &Literal) -> bool {
    let (Some(a), Literal::Num(b)) = (actual.as_f64(), value) else {
        return false;
    };
    match op {
        Op::Gt => a > *b,
        Op::Ge => a >= *b,
        Op::Lt => a < *b,
        Op::Le => a <= *b,
        _ => unreachable!("numeric_compare only called for ordering operators"),
    }
}

fn regex_match(actual: &Value, value: &Literal) -> bool {
    let (Some(s), Literal::Str(pattern)) = (actual.as_str(), value) else {
        return false;
    };
    Regex::new(pattern).map(|re| re.is_match(s)).unwrap_or(false)
}

fn matches_any(actual: &Value, value: &Literal) -> bool {
    match value {
        Literal::List(items) => items.iter().any(|item| literal_eq(actual, item)),
        _ => false,
    }
}

fn contains(actual: &Value, value: &Literal) -> bool {
    match actual {
        Value::String(s) => matches!(value, Literal::Str(needle) if s.contains(needle.as_str())),
        Value::Array(items) => items.iter().any(|item| literal_eq(item, value)),
        _ => false,
    }
}

fn string_op(actual: &Value, value: &Literal, op: impl Fn(&str, &str) -> bool) -> bool {
    let (Some(s), Literal::Str(needle)) = (actual.as_str(), value) else {
        return false;
    };
    op(s, needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::parser::parse_filter;
    use serde_json::json;

    fn payload(json_value: serde_json::Value) -> Payload {
        match json_value {
            Value::Object(map) => map,
            _ => panic!("test fixture must be a JSON object"),
        }
    }

    #[test]
    fn missing_field_exists_is_false_but_ne_is_true() {
        let p = payload(json!({}));
        assert!(!evaluate(&parse_filter(".x exists").unwrap(), &p));
        assert!(evaluate(&parse_filter(r#".x != "y""#).unwrap(), &p));
        assert!(!evaluate(&parse_filter(r#".x == "y""#).unwrap(), &p));
        assert!(!evaluate(&parse_filter(".x > 1").unwrap(), &p));
    }

    #[test]
    fn string_equality_and_inequality() {
        let p = payload(json!({"level": "error"}));
        assert!(evaluate(&parse_filter(r#".level != "debug""#).unwrap(), &p));
        assert!(evaluate(&parse_filter(r#".level == "error""#).unwrap(), &p));
    }

    #[test]
    fn numeric_ordering_operators() {
        let p = payload(json!({"count": 5}));
        assert!(evaluate(&parse_filter(".count >= 5").unwrap(), &p));
        assert!(evaluate(&parse_filter(".count < 10").unwrap(), &p));
        assert!(!evaluate(&parse_filter(".count > 5").unwrap(), &p));
    }

    #[test]
    fn regex_and_string_ops() {
        let p = payload(json!({"path": "/api/v2/users"}));
        assert!(evaluate(&parse_filter(r#".path ~= "^/api/v2/""#).unwrap(), &p));
        assert!(evaluate(&parse_filter(r#".path startswith "/api""#).unwrap(), &p));
        assert!(evaluate(&parse_filter(r#".path endswith "users""#).unwrap(), &p));
        assert!(evaluate(&parse_filter(r#".path contains "v2""#).unwrap(), &p));
    }

    #[test]
    fn in_and_notin_against_list_literals() {
        let p = payload(json!({"level": "warn"}));
        assert!(evaluate(&parse_filter(r#".level in ["error", "warn"]"#).unwrap(), &p));
        assert!(!evaluate(&parse_filter(r#".level notin ["error", "warn"]"#).unwrap(), &p));
    }

    #[test]
    fn and_or_combine_subexpressions() {
        let p = payload(json!({"level": "error", "count": 2}));
        assert!(evaluate(
            &parse_filter(r#".level == "error" && .count > 1"#).unwrap(),
            &p
        ));
        assert!(!evaluate(
            &parse_filter(r#".level == "error" && .count > 10"#).unwrap(),
            &p
        ));
        assert!(evaluate(
            &parse_filter(r#".level == "debug" || .count > 1"#).unwrap(),
            &p
        ));
    }

    #[test]
    fn nested_field_path_resolves_through_objects() {
        let p = payload(json!({"user": {"roles": ["admin", "viewer"]}}));
        assert!(evaluate(
            &parse_filter(r#".user.roles contains "admin""#).unwrap(),
            &p
        ));
    }
}
