//! The `validate` stage and its schema (spec §4.6, §4.7.validation).
//!
//! "Per-field constraints: type ∈ {string, number, integer, boolean,
//! object, array, any}, required flag, regex pattern, min/max length,
//! min/max numeric bound, enum set, nested item schema (arrays), nested
//! property schemas (objects). Strict-mode schemas additionally reject
//! any record containing fields not declared in the schema. Validation
//! returns a composite error carrying one entry per violated field, so
//! callers can report all problems at once."

// Layer 1: Standard library imports
use std::collections::HashMap;

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

// Layer 3: Internal module imports
use pipeline_contracts::{OpContext, Stage, StageError};
use pipeline_core::{Payload, Record};

/// The declared type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
    Any,
}

impl FieldType {
    fn matches(self, value: &Value) -> bool {
        match self {
            FieldType::Any => true,
            FieldType::String => value.is_string(),
            FieldType::Number => value.is_number(),
            FieldType::Integer => value.is_i64() || value.is_u64(),
            FieldType::Boolean => value.is_boolean(),
            FieldType::Object => value.is_object(),
            FieldType::Array => value.is_array(),
        }
    }
}

/// A single field's constraints.
#[derive(Debug, Clone, Default)]
pub struct FieldSchema {
    pub field_type: Option<FieldType>,
    pub required: bool,
    pub pattern: Option<String>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub enum_values: Option<Vec<Value>>,
    /// Schema applied to each element, when the field is an array.
    pub items: Option<Box<FieldSchema>>,
    /// Schema applied to nested fields, when the field is an object.
    pub properties: Option<Schema>,
}

impl FieldSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn of_type(mut self, field_type: FieldType) -> Self {
        self.field_type = Some(field_type);
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn length_between(mut self, min: Option<usize>, max: Option<usize>) -> Self {
        self.min_length = min;
        self.max_length = max;
        self
    }

    pub fn bounded(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn one_of(mut self, values: Vec<Value>) -> Self {
        self.enum_values = Some(values);
        self
    }

    pub fn items(mut self, schema: FieldSchema) -> Self {
        self.items = Some(Box::new(schema));
        self
    }

    pub fn properties(mut self, schema: Schema) -> Self {
        self.properties = Some(schema);
        self
    }
}

/// A record schema: per-field constraints, plus strict-mode rejection of
/// undeclared fields.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub fields: HashMap<String, FieldSchema>,
    pub strict: bool,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, schema: FieldSchema) -> Self {
        self.fields.insert(name.into(), schema);
        self
    }

    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }
}

/// One violated constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

/// The composite validation failure: one entry per violated field.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("schema validation failed: {violations:?}")]
pub struct ValidationErrors {
    pub violations: Vec<FieldViolation>,
}

/// Validates `payload` against `schema`, collecting every violation
/// rather than stopping at the first.
pub fn validate(schema: &Schema, payload: &Payload) -> Result<(), ValidationErrors> {
    let mut violations = Vec::new();
    collect_violations(schema, payload, "", &mut violations);
    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors { violations })
    }
}

fn collect_violations(schema: &Schema, payload: &Payload, prefix: &str, out: &mut Vec<FieldViolation>) {
    for (name, field_schema) in &schema.fields {
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}.{name}")
        };
        match payload.get(name) {
            None => {
                if field_schema.required {
                    out.push(FieldViolation {
                        field: path,
                        message: "required field is missing".to_string(),
                    });
                }
            }
            Some(value) => check_value(field_schema, value, &path, out),
        }
    }

    if schema.strict {
        for key in payload.keys() {
            if !schema.fields.contains_key(key) {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                out.push(FieldViolation {
                    field: path,
                    message: "field is not declared in a strict schema".to_string(),
                });
            }
        }
    }
}

fn check_value(schema: &FieldSchema, value: &Value, path: &str, out: &mut Vec<FieldViolation>) {
    if let Some(field_type) = schema.field_type {
        if !field_type.matches(value) {
            out.push(FieldViolation {
                field: path.to_string(),
                message: format!("expected type {field_type:?}, found {}", type_name(value)),
            });
            return;
        }
    }

    if let Some(pattern) = &schema.pattern {
        if let Some(s) = value.as_str() {
            match Regex::new(pattern) {
                Ok(re) if !re.is_match(s) => out.push(FieldViolation {
                    field: path.to_string(),
                    message: format!("does not match pattern {pattern:?}"),
                }),
                Err(_) => out.push(FieldViolation {
                    field: path.to_string(),
                    message: format!("invalid pattern configured: {pattern:?}"),
                }),
                _ => {}
            }
        }
    }

    if let Some(s) = value.as_str() {
        if let Some(min) = schema.min_length {
            if s.chars().count() < min {
                out.push(FieldViolation {
                    field: path.to_string(),
                    message: format!("length below minimum of {min}"),
                });
            }
        }
        if let Some(max) = schema.max_length {
            if s.chars().count() > max {
                out.push(FieldViolation {
                    field: path.to_string(),
                    message: format!("length above maximum of {max}"),
                });
            }
        }
    }

    if let Some(n) = value.as_f64() {
        if let Some(min) = schema.min {
            if n < min {
                out.push(FieldViolation {
                    field: path.to_string(),
                    message: format!("value below minimum of {min}"),
                });
            }
        }
        if let Some(max) = schema.max {
            if n > max {
                out.push(FieldViolation {
                    field: path.to_string(),
                    message: format!("value above maximum of {max}"),
                });
            }
        }
    }

    if let Some(allowed) = &schema.enum_values {
        if !allowed.contains(value) {
            out.push(FieldViolation {
                field: path.to_string(),
                message: "value is not one of the declared enum options".to_string(),
            });
        }
    }

    if let (Some(item_schema), Value::Array(items)) = (&schema.items, value) {
        for (index, item) in items.iter().enumerate() {
            check_value(item_schema, item, &format!("{path}[{index}]"), out);
        }
    }

    if let (Some(nested), Value::Object(object)) = (&schema.properties, value) {
        collect_violations(nested, object, path, out);
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A stage that rejects or drops records failing a declared schema.
pub struct ValidateStage {
    name: String,
    schema: Schema,
    drop_on_fail: bool,
}

impl ValidateStage {
    pub fn new(name: impl Into<String>, schema: Schema, drop_on_fail: bool) -> Self {
        Self {
            name: name.into(),
            schema,
            drop_on_fail,
        }
    }
}

#[async_trait]
impl Stage for ValidateStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn stage_type(&self) -> &str {
        "validate"
    }

    async fn process(&mut self, _ctx: &OpContext, record: Record) -> Result<Option<Record>, StageError> {
        match validate(&self.schema, record.payload()) {
            Ok(()) => Ok(Some(record)),
            Err(errors) if self.drop_on_fail => {
                let _ = errors;
                Ok(None)
            }
            Err(errors) => Err(StageError::Rejected(errors.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline_core::RecordMetadata;
    use serde_json::json;

    fn record(fields: Value) -> Record {
        let payload = match fields {
            Value::Object(map) => map,
            _ => panic!("test fixture must be a JSON object"),
        };
        Record::new(payload, RecordMetadata::new("test", "test"))
    }

    #[test]
    fn required_field_missing_is_a_violation() {
        let schema = Schema::new().field("id", FieldSchema::new().of_type(FieldType::String).required());
        let payload = match json!({}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let result = validate(&schema, &payload);
        assert!(result.is_err());
    }

    #[test]
    fn type_mismatch_is_reported() {
        let schema = Schema::new().field("count", FieldSchema::new().of_type(FieldType::Integer));
        let payload = match json!({"count": "not a number"}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let errors = validate(&schema, &payload).unwrap_err();
        assert_eq!(errors.violations.len(), 1);
        assert_eq!(errors.violations[0].field, "count");
    }

    #[test]
    fn composite_error_reports_every_violation() {
        let schema = Schema::new()
            .field("id", FieldSchema::new().required())
            .field("age", FieldSchema::new().of_type(FieldType::Number).bounded(Some(0.0), Some(120.0)));
        let payload = match json!({"age": 999}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let errors = validate(&schema, &payload).unwrap_err();
        assert_eq!(errors.violations.len(), 2);
    }

    #[test]
    fn strict_schema_rejects_undeclared_fields() {
        let schema = Schema::new().field("id", FieldSchema::new()).strict();
        let payload = match json!({"id": "1", "extra": "nope"}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let errors = validate(&schema, &payload).unwrap_err();
        assert_eq!(errors.violations[0].field, "extra");
    }

    #[tokio::test]
    async fn drop_on_fail_filters_instead_of_erroring() {
        let schema = Schema::new().field("id", FieldSchema::new().required());
        let mut stage = ValidateStage::new("validate", schema, true);
        let ctx = OpContext::new_default();
        let out = stage.process(&ctx, record(json!({}))).await.unwrap();
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn without_drop_on_fail_returns_a_stage_error() {
        let schema = Schema::new().field("id", FieldSchema::new().required());
        let mut stage = ValidateStage::new("validate", schema, false);
        let ctx = OpContext::new_default();
        let result = stage.process(&ctx, record(json!({}))).await;
        assert!(matches!(result, Err(StageError::Rejected(_))));
    }
}
