use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authentication required: missing bearer token")]
    Missing,

    #[error("Token expired")]
    Expired,

    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Invalid token: {0}")]
    Invalid(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// True for failures caused by the caller's credentials (401).
    #[must_use]
    pub fn is_unauthenticated(&self) -> bool {
        !matches!(self, AuthError::Internal(_))
    }
}

#[cfg(feature = "axum-ext")]
mod http_error {
    use super::AuthError;
    use catalog_errors::ErrDef;

    pub(super) const UNAUTHORIZED: ErrDef = ErrDef {
        status: 401,
        title: "Unauthorized",
        code: "CATALOG_UNAUTHORIZED",
        type_url: "https://errors.catalog.dev/unauthorized",
    };

    pub(super) const AUTH_INTERNAL: ErrDef = ErrDef {
        status: 500,
        title: "Internal Server Error",
        code: "CATALOG_AUTH_INTERNAL",
        type_url: "https://errors.catalog.dev/internal",
    };

    impl axum::response::IntoResponse for AuthError {
        fn into_response(self) -> axum::response::Response {
            let problem = if self.is_unauthenticated() {
                UNAUTHORIZED.as_problem(self.to_string())
            } else {
                tracing::error!(error = %self, "auth pipeline misconfigured");
                AUTH_INTERNAL.as_problem("An internal error occurred")
            };
            problem.into_response()
        }
    }
}
