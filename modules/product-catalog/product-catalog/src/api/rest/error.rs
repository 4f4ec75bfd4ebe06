use catalog_errors::Problem;

use crate::domain::error::DomainError;
use crate::errors::ErrorCode;

pub(crate) fn current_trace_id() -> Option<String> {
    tracing::Span::current()
        .id()
        .map(|id| id.into_u64().to_string())
}

/// Map domain error to RFC 9457 Problem using the catalog error codes
pub fn domain_error_to_problem(e: &DomainError, instance: &str) -> Problem {
    let trace_id = current_trace_id();

    match e {
        DomainError::NotFound { codigo } => ErrorCode::PRODUCT_NOT_FOUND.with_context(
            format!("Product '{codigo}' not found"),
            instance,
            trace_id,
        ),
        DomainError::Validation { field, message } => {
            validation_problem(field, message, instance)
        }
        DomainError::StorageWriteFailed(source) => {
            tracing::error!(error = %source, "image storage write failed");
            ErrorCode::IMAGE_STORAGE_FAILED.with_context(
                "The image could not be stored",
                instance,
                trace_id,
            )
        }
        DomainError::Upstream(source) => {
            tracing::error!(error = ?source, "product store error");
            ErrorCode::INTERNAL.with_context("An internal error occurred", instance, trace_id)
        }
    }
}

/// 400 naming the offending field or parameter.
pub fn validation_problem(field: &str, message: &str, instance: &str) -> Problem {
    ErrorCode::VALIDATION
        .with_context(
            format!("Validation error on '{field}': {message}"),
            instance,
            current_trace_id(),
        )
        .with_invalid_param(field, message)
}

impl From<DomainError> for Problem {
    fn from(e: DomainError) -> Self {
        domain_error_to_problem(&e, "/")
    }
}
