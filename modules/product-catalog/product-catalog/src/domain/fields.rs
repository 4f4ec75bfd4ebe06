use product_catalog_sdk::ProductFields as F;
use serde_json::{Number, Value};

/// Per-field coercion and validation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    /// Stored verbatim
    Identity,
    /// Number or numeric string, finite and strictly positive
    PositiveNumber,
    /// Integer or integer string, zero or more
    NonNegativeInteger,
    /// String, trimmed, must not be empty
    NonEmptyText,
    /// `true`/`false`, their string forms, or `1`/`0`
    Boolean,
    /// Trimmed string; empty string or `null` clears the field
    NullableText,
}

impl FieldRule {
    /// Coerce `value` according to the rule.
    ///
    /// # Errors
    /// Returns the violation message (without the field name).
    pub fn apply(self, value: &Value) -> Result<Value, &'static str> {
        match self {
            FieldRule::Identity => Ok(value.clone()),
            FieldRule::PositiveNumber => positive_number(value),
            FieldRule::NonNegativeInteger => non_negative_integer(value),
            FieldRule::NonEmptyText => non_empty_text(value),
            FieldRule::Boolean => boolean(value),
            FieldRule::NullableText => nullable_text(value),
        }
    }
}

/// Updatable product fields, in the order assignments are produced.
pub const PRODUCT_FIELD_RULES: &[(&str, FieldRule)] = &[
    (F::NAME, FieldRule::NonEmptyText),
    (F::DESCRIPTION, FieldRule::NonEmptyText),
    (F::CATEGORY, FieldRule::Identity),
    (F::MANUFACTURER, FieldRule::Identity),
    (F::PRICE, FieldRule::PositiveNumber),
    (F::STOCK, FieldRule::NonNegativeInteger),
    (F::ACTIVE_INGREDIENT, FieldRule::Identity),
    (F::CONCENTRATION, FieldRule::Identity),
    (F::DOSAGE_FORM, FieldRule::Identity),
    (F::PRESENTATION, FieldRule::Identity),
    (F::SANITARY_REGISTRATION, FieldRule::Identity),
    (F::REQUIRES_PRESCRIPTION, FieldRule::Boolean),
    (F::EXPIRATION_DATE, FieldRule::Identity),
    (F::CONTRAINDICATIONS, FieldRule::Identity),
    (F::INDICATIONS, FieldRule::Identity),
    (F::IMAGE_URL, FieldRule::NullableText),
    (F::ACTIVE, FieldRule::Boolean),
];

/// Fields a create request must carry.
pub const REQUIRED_ON_CREATE: &[&str] = &[F::NAME, F::PRICE, F::DESCRIPTION];

fn positive_number(value: &Value) -> Result<Value, &'static str> {
    const MSG: &str = "must be a positive number";
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|n| n.is_finite() && *n > 0.0)
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or(MSG)
}

fn non_negative_integer(value: &Value) -> Result<Value, &'static str> {
    let n = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    n.map(Value::from).ok_or("must be a non-negative integer")
}

fn non_empty_text(value: &Value) -> Result<Value, &'static str> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Ok(Value::String(s.trim().to_owned())),
        Value::String(_) | Value::Null => Err("must not be empty"),
        _ => Err("must be a string"),
    }
}

fn boolean(value: &Value) -> Result<Value, &'static str> {
    let b = match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        Value::Number(n) => match n.as_u64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        _ => None,
    };
    b.map(Value::Bool).ok_or("must be a boolean")
}

fn nullable_text(value: &Value) -> Result<Value, &'static str> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::String(s) if s.trim().is_empty() => Ok(Value::Null),
        Value::String(s) => Ok(Value::String(s.trim().to_owned())),
        _ => Err("must be a string or null"),
    }
}
