#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Product Catalog Module Implementation
//!
//! The public API is defined in `product-catalog-sdk` and re-exported here.

pub use product_catalog_sdk::{
    CatalogError, ImagePayload, ListQuery, PresignedUpload, Product, ProductCatalogClientV1,
    ProductDraft, ProductPage,
};

pub mod module;
pub use module::{CatalogModule, DEFAULT_BODY_LIMIT};

pub mod local_client;

#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod errors;
#[doc(hidden)]
pub mod infra;

pub use config::{CatalogConfig, DeletePolicy};
