use crate::{claims::Claims, errors::AuthError};
use async_trait::async_trait;

/// Verifies a bearer token and yields the caller's claims
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Claims, AuthError>;
}
