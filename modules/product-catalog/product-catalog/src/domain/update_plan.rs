//! Partial-update plans: sparse input to ordered, validated assignments.

use product_catalog_sdk::{Product, ProductFields};
use serde_json::{Map, Value};
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use super::fields::FieldRule;

/// The first rule violation found in an input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field} {message}")]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub field: String,
    pub value: Value,
}

/// Ordered assignments; the modification timestamp is always first.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdatePlan {
    assignments: Vec<Assignment>,
}

impl UpdatePlan {
    #[must_use]
    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.assignments.iter().map(|a| a.field.as_str())
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.assignments
            .iter()
            .find(|a| a.field == field)
            .map(|a| &a.value)
    }

    /// Set `field`, replacing an earlier assignment of the same field.
    pub fn set(&mut self, field: &str, value: Value) {
        if let Some(existing) = self.assignments.iter_mut().find(|a| a.field == field) {
            existing.value = value;
        } else {
            self.assignments.push(Assignment {
                field: field.to_owned(),
                value,
            });
        }
    }

    /// Produce the product as it looks after the plan is applied.
    ///
    /// # Errors
    /// Fails if an assignment does not fit the product's typed shape.
    pub fn apply_to(&self, product: &Product) -> Result<Product, serde_json::Error> {
        let mut object = match serde_json::to_value(product)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        assign_all(&mut object, &self.assignments);
        serde_json::from_value(Value::Object(object))
    }
}

/// Validate every allowlisted field present in `input`, in allowlist order.
///
/// Fields absent from `input` or from `rules` produce nothing.
///
/// # Errors
/// Returns the first [`FieldViolation`].
pub fn coerce_fields(
    rules: &[(&str, FieldRule)],
    input: &Map<String, Value>,
) -> Result<Vec<Assignment>, FieldViolation> {
    rules
        .iter()
        .filter_map(|(field, rule)| input.get(*field).map(|value| (*field, *rule, value)))
        .map(|(field, rule, value)| {
            rule.apply(value)
                .map(|value| Assignment {
                    field: field.to_owned(),
                    value,
                })
                .map_err(|message| FieldViolation::new(field, message))
        })
        .collect()
}

/// Build an update plan stamped with `now`.
///
/// # Errors
/// Returns the first [`FieldViolation`]; nothing is applied in that case.
pub fn build_plan(
    rules: &[(&str, FieldRule)],
    input: &Map<String, Value>,
    now: OffsetDateTime,
) -> Result<UpdatePlan, FieldViolation> {
    let stamp = now
        .format(&Rfc3339)
        .map_err(|e| FieldViolation::new(ProductFields::UPDATED_AT, e.to_string()))?;

    let mut assignments = vec![Assignment {
        field: ProductFields::UPDATED_AT.to_owned(),
        value: Value::String(stamp),
    }];
    assignments.extend(coerce_fields(rules, input)?);
    Ok(UpdatePlan { assignments })
}

pub(crate) fn assign_all(object: &mut Map<String, Value>, assignments: &[Assignment]) {
    for a in assignments {
        object.insert(a.field.clone(), a.value.clone());
    }
}
