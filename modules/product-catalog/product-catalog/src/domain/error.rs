//! Domain error types for the product catalog.

use product_catalog_sdk::CatalogError;
use thiserror::Error;

use super::cursor::CursorError;
use super::images::ImageError;
use super::update_plan::FieldViolation;

pub const IMAGE_FIELD: &str = "image";
pub const CURSOR_FIELD: &str = "cursor";
pub const LIMIT_FIELD: &str = "limit";
pub const EXTENSION_FIELD: &str = "extension";

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Product not found: {codigo}")]
    NotFound { codigo: String },

    #[error("Validation error on '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("Image storage failed: {0}")]
    StorageWriteFailed(#[source] anyhow::Error),

    /// Store failure; details stay in logs
    #[error("Upstream error: {0}")]
    Upstream(#[from] anyhow::Error),
}

impl DomainError {
    #[must_use]
    pub fn not_found(codigo: impl Into<String>) -> Self {
        Self::NotFound {
            codigo: codigo.into(),
        }
    }

    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<FieldViolation> for DomainError {
    fn from(v: FieldViolation) -> Self {
        let message = v.to_string();
        Self::Validation {
            field: v.field,
            message,
        }
    }
}

impl From<CursorError> for DomainError {
    fn from(e: CursorError) -> Self {
        Self::validation(CURSOR_FIELD, e.to_string())
    }
}

impl From<ImageError> for DomainError {
    fn from(e: ImageError) -> Self {
        match e {
            ImageError::StorageWriteFailed(source) => Self::StorageWriteFailed(source),
            ImageError::UnsupportedExtension(_) => Self::validation(EXTENSION_FIELD, e.to_string()),
            ImageError::UnsupportedFormat
            | ImageError::InvalidEncoding
            | ImageError::PayloadTooLarge { .. } => Self::validation(IMAGE_FIELD, e.to_string()),
        }
    }
}

impl From<DomainError> for CatalogError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::NotFound { codigo } => CatalogError::not_found(codigo),
            DomainError::Validation { field, message } => CatalogError::validation(field, message),
            DomainError::StorageWriteFailed(_) => CatalogError::StorageWriteFailed,
            DomainError::Upstream(_) => CatalogError::Internal,
        }
    }
}
