//! Product Catalog SDK
//!
//! This crate provides the public API for the `product-catalog` module:
//! - `ProductCatalogClientV1` trait for in-process consumers
//! - `Product` and the paging/draft models
//! - `CatalogError` for error handling

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

pub mod api;
pub mod errors;
pub mod models;

pub use api::ProductCatalogClientV1;
pub use errors::CatalogError;
pub use models::{
    ImagePayload, ListQuery, PresignedUpload, Product, ProductDraft, ProductFields, ProductPage,
};
