use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Verified caller identity.
///
/// `tenant_id` is the only source of the tenant partition for every catalog
/// operation; request bodies and cursors never override it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (`sub`), empty when the issuer omits it
    pub subject: String,

    /// Tenant partition the caller is bound to
    pub tenant_id: String,

    /// Issuer (`iss`)
    pub issuer: Option<String>,

    /// Audiences (`aud`), normalized to a list
    pub audiences: Vec<String>,

    /// Expiration time (`exp`)
    #[serde(with = "time::serde::timestamp::option")]
    pub expires_at: Option<OffsetDateTime>,
}

impl Claims {
    #[must_use]
    pub fn for_tenant(tenant_id: impl Into<String>) -> Self {
        Self {
            subject: String::new(),
            tenant_id: tenant_id.into(),
            issuer: None,
            audiences: Vec::new(),
            expires_at: None,
        }
    }

    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn tenant_claims_start_without_expiry() {
        let claims = Claims::for_tenant("acme").with_subject("user-1");
        assert_eq!(claims.tenant_id, "acme");
        assert_eq!(claims.subject, "user-1");
        assert!(claims.expires_at.is_none());
    }
}
