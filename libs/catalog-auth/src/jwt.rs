//! Shared-secret (HS256) JWT verifier.

use crate::{claims::Claims, errors::AuthError, traits::TokenVerifier};
use async_trait::async_trait;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Settings for [`JwtVerifier`].
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC secret shared with the token issuer
    pub secret: String,

    /// Allowed issuers (if empty, any issuer is accepted)
    pub issuers: Vec<String>,

    /// Allowed audiences (if empty, any audience is accepted)
    pub audiences: Vec<String>,

    /// Leeway in seconds for `exp`/`nbf`
    pub leeway_seconds: u64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            issuers: vec![],
            audiences: vec![],
            leeway_seconds: 60,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Default)]
#[serde(untagged)]
enum Audience {
    #[default]
    None,
    One(String),
    Many(Vec<String>),
}

impl Audience {
    fn into_vec(self) -> Vec<String> {
        match self {
            Audience::None => vec![],
            Audience::One(a) => vec![a],
            Audience::Many(v) => v,
        }
    }
}

/// Wire shape of the token payload.
#[derive(Debug, Deserialize, Serialize)]
struct JwtClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tenant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iss: Option<String>,
    #[serde(default, skip_serializing_if = "is_no_audience")]
    aud: Audience,
    exp: i64,
}

fn is_no_audience(aud: &Audience) -> bool {
    matches!(aud, Audience::None)
}

pub struct JwtVerifier {
    key: DecodingKey,
    signing_key: EncodingKey,
    validation: Validation,
}

impl JwtVerifier {
    /// Build a verifier from config.
    ///
    /// # Errors
    /// Returns `AuthError::Internal` when the secret is empty.
    pub fn new(config: &JwtConfig) -> Result<Self, AuthError> {
        if config.secret.is_empty() {
            return Err(AuthError::Internal("JWT secret must not be empty".to_owned()));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = config.leeway_seconds;
        validation.set_required_spec_claims(&["exp"]);
        if !config.issuers.is_empty() {
            validation.set_issuer(&config.issuers);
        }
        if config.audiences.is_empty() {
            validation.validate_aud = false;
        } else {
            validation.set_audience(&config.audiences);
        }

        Ok(Self {
            key: DecodingKey::from_secret(config.secret.as_bytes()),
            signing_key: EncodingKey::from_secret(config.secret.as_bytes()),
            validation,
        })
    }

    /// Mint a token for `claims` valid for `ttl`, signed with the same secret.
    ///
    /// Used by local tooling and tests; production tokens come from the identity provider.
    ///
    /// # Errors
    /// Returns `AuthError::Internal` if encoding fails.
    pub fn sign(&self, claims: &Claims, ttl: time::Duration) -> Result<String, AuthError> {
        let exp = claims
            .expires_at
            .unwrap_or_else(|| OffsetDateTime::now_utc() + ttl)
            .unix_timestamp();
        let aud = match claims.audiences.as_slice() {
            [] => Audience::None,
            [one] => Audience::One(one.clone()),
            many => Audience::Many(many.to_vec()),
        };
        let payload = JwtClaims {
            sub: (!claims.subject.is_empty()).then(|| claims.subject.clone()),
            tenant_id: Some(claims.tenant_id.clone()),
            iss: claims.issuer.clone(),
            aud,
            exp,
        };
        encode(&Header::new(Algorithm::HS256), &payload, &self.signing_key)
            .map_err(|e| AuthError::Internal(format!("token encoding failed: {e}")))
    }

    fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<JwtClaims>(token, &self.key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                ErrorKind::InvalidToken
                | ErrorKind::Base64(_)
                | ErrorKind::Json(_)
                | ErrorKind::Utf8(_) => AuthError::Malformed(e.to_string()),
                _ => AuthError::Invalid(e.to_string()),
            }
        })?;

        let raw = data.claims;
        let tenant_id = raw
            .tenant_id
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| AuthError::Invalid("missing tenant_id claim".to_owned()))?;

        Ok(Claims {
            subject: raw.sub.unwrap_or_default(),
            tenant_id,
            issuer: raw.iss,
            audiences: raw.aud.into_vec(),
            expires_at: OffsetDateTime::from_unix_timestamp(raw.exp).ok(),
        })
    }
}

#[async_trait]
impl TokenVerifier for JwtVerifier {
    async fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        self.decode(token)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn verifier() -> JwtVerifier {
        JwtVerifier::new(&JwtConfig {
            secret: "test-secret".to_owned(),
            leeway_seconds: 0,
            ..JwtConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert!(matches!(
            JwtVerifier::new(&JwtConfig::default()),
            Err(AuthError::Internal(_))
        ));
    }

    #[tokio::test]
    async fn signed_token_round_trips() {
        let v = verifier();
        let token = v
            .sign(
                &Claims::for_tenant("acme").with_subject("alice"),
                time::Duration::minutes(5),
            )
            .unwrap();

        let claims = v.verify(&token).await.unwrap();
        assert_eq!(claims.tenant_id, "acme");
        assert_eq!(claims.subject, "alice");
        assert!(claims.expires_at.is_some());
    }

    #[tokio::test]
    async fn expired_token_is_reported_as_expired() {
        let v = verifier();
        let mut claims = Claims::for_tenant("acme");
        claims.expires_at = Some(OffsetDateTime::now_utc() - time::Duration::hours(1));
        let token = v.sign(&claims, time::Duration::ZERO).unwrap();

        assert!(matches!(v.verify(&token).await, Err(AuthError::Expired)));
    }

    #[tokio::test]
    async fn garbage_is_malformed() {
        let err = verifier().verify("not-a-jwt").await.unwrap_err();
        assert!(matches!(err, AuthError::Malformed(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn foreign_secret_is_invalid() {
        let other = JwtVerifier::new(&JwtConfig {
            secret: "other-secret".to_owned(),
            ..JwtConfig::default()
        })
        .unwrap();
        let token = other
            .sign(&Claims::for_tenant("acme"), time::Duration::minutes(5))
            .unwrap();

        let err = verifier().verify(&token).await.unwrap_err();
        assert!(matches!(err, AuthError::Invalid(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn blank_tenant_claim_is_invalid() {
        let v = verifier();
        let token = v
            .sign(&Claims::for_tenant("  "), time::Duration::minutes(5))
            .unwrap();

        let err = v.verify(&token).await.unwrap_err();
        assert!(err.to_string().contains("tenant_id"));
    }

    #[tokio::test]
    async fn issuer_allowlist_is_enforced() {
        let v = JwtVerifier::new(&JwtConfig {
            secret: "test-secret".to_owned(),
            issuers: vec!["https://id.example.com".to_owned()],
            ..JwtConfig::default()
        })
        .unwrap();

        let mut claims = Claims::for_tenant("acme");
        claims.issuer = Some("https://evil.example.com".to_owned());
        let token = v.sign(&claims, time::Duration::minutes(5)).unwrap();
        assert!(matches!(v.verify(&token).await, Err(AuthError::Invalid(_))));

        claims.issuer = Some("https://id.example.com".to_owned());
        let token = v.sign(&claims, time::Duration::minutes(5)).unwrap();
        assert_eq!(v.verify(&token).await.unwrap().tenant_id, "acme");
    }
}
