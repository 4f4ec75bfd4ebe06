#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Bearer-token authentication for the product catalog.
//!
//! Token issuance lives elsewhere; this crate only verifies tokens and hands
//! the resulting [`Claims`] to request handlers.

pub mod claims;
pub mod errors;
pub mod jwt;
pub mod traits;

#[cfg(feature = "axum-ext")]
pub mod axum_ext;

pub use claims::Claims;
pub use errors::AuthError;
pub use jwt::{JwtConfig, JwtVerifier};
pub use traits::TokenVerifier;
