//! Opaque pagination cursor wrapping the store's resume key.

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Store resume key: key-field name to value, ordered for a stable encoding.
pub type StoreKey = BTreeMap<String, String>;

const CURSOR_VERSION: u8 = 1;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CursorError {
    #[error("cursor is not valid base64url")]
    InvalidBase64,
    #[error("cursor payload is not valid JSON")]
    InvalidJson,
    #[error("unsupported cursor version {0}")]
    UnsupportedVersion(u8),
    #[error("cursor carries no key")]
    EmptyKey,
}

#[derive(Serialize)]
struct WireOut<'a> {
    v: u8,
    k: &'a StoreKey,
}

#[derive(Deserialize)]
struct WireIn {
    v: u8,
    k: StoreKey,
}

/// Encode a resume key as an opaque token.
#[must_use]
pub fn encode(key: &StoreKey) -> String {
    let wire = WireOut {
        v: CURSOR_VERSION,
        k: key,
    };
    // A map of strings always serializes
    let json = serde_json::to_vec(&wire).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(json)
}

/// Decode a token produced by [`encode`].
///
/// # Errors
/// Returns the specific [`CursorError`] for bad base64, bad JSON, an unknown
/// version or an empty key map.
pub fn decode(token: &str) -> Result<StoreKey, CursorError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(token.trim())
        .map_err(|_| CursorError::InvalidBase64)?;
    let wire: WireIn = serde_json::from_slice(&bytes).map_err(|_| CursorError::InvalidJson)?;
    if wire.v != CURSOR_VERSION {
        return Err(CursorError::UnsupportedVersion(wire.v));
    }
    if wire.k.is_empty() {
        return Err(CursorError::EmptyKey);
    }
    Ok(wire.k)
}
