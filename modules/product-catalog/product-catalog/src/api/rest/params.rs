//! Request field extraction across inconsistent request envelopes.
//!
//! Depending on what sits in front of the service, a path parameter may
//! arrive as a routed capture, a gateway `pathParameters` map, a query
//! parameter, or only inside some raw path string. [`FieldExtractor`] runs
//! a fixed chain of [`Strategy`] values and returns the first usable value.

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{FromRequestParts, MatchedPath, RawPathParams};
use catalog_errors::Problem;
use http::request::Parts;
use regex::Regex;
use serde::Deserialize;

use super::error::{current_trace_id, validation_problem};
use crate::errors::ErrorCode;

pub const CODIGO: &str = "codigo";

/// Headers a fronting proxy may use to report the original request path.
const RAW_PATH_HEADERS: [&str; 2] = ["x-original-uri", "x-forwarded-uri"];

/// Everything the extractor may look at.
///
/// Deserializes from a gateway-style JSON event; built from an axum request
/// via `FromRequestParts`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEnvelope {
    #[serde(default, deserialize_with = "nullable_map")]
    pub path_parameters: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "nullable_map")]
    pub query_string_parameters: BTreeMap<String, String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub raw_path: Option<String>,
    #[serde(default)]
    pub resource: Option<String>,
}

fn nullable_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<BTreeMap<String, String>>::deserialize(deserializer)?.unwrap_or_default())
}

impl RequestEnvelope {
    /// Parse a gateway event.
    ///
    /// # Errors
    /// Returns the JSON error for malformed events.
    pub fn from_event_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

impl<S> FromRequestParts<S> for RequestEnvelope
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let path_parameters = match RawPathParams::from_request_parts(parts, state).await {
            Ok(params) => params
                .iter()
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
                .collect(),
            Err(_) => BTreeMap::new(),
        };

        let query_string_parameters = parts
            .uri
            .query()
            .and_then(|q| serde_urlencoded::from_str::<Vec<(String, String)>>(q).ok())
            .map(|pairs| pairs.into_iter().collect())
            .unwrap_or_default();

        let raw_path = RAW_PATH_HEADERS.iter().find_map(|name| {
            parts
                .headers
                .get(*name)
                .and_then(|v| v.to_str().ok())
                .map(ToOwned::to_owned)
        });

        Ok(Self {
            path_parameters,
            query_string_parameters,
            path: Some(parts.uri.path().to_owned()),
            raw_path,
            resource: parts
                .extensions
                .get::<MatchedPath>()
                .map(|m| m.as_str().to_owned()),
        })
    }
}

/// One way of finding a named value in a [`RequestEnvelope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    PathParameters,
    PathParametersIgnoreCase,
    QueryString,
    PathTemplate,
    RawPath,
    ResourceTemplate,
}

impl Strategy {
    pub const CHAIN: [Strategy; 6] = [
        Strategy::PathParameters,
        Strategy::PathParametersIgnoreCase,
        Strategy::QueryString,
        Strategy::PathTemplate,
        Strategy::RawPath,
        Strategy::ResourceTemplate,
    ];

    /// Envelope field this strategy reads, as reported in diagnostics.
    #[must_use]
    pub fn source(self) -> &'static str {
        match self {
            Strategy::PathParameters | Strategy::PathParametersIgnoreCase => "pathParameters",
            Strategy::QueryString => "queryStringParameters",
            Strategy::PathTemplate => "path",
            Strategy::RawPath => "rawPath",
            Strategy::ResourceTemplate => "resource",
        }
    }

    fn extract(
        self,
        templates: &[PathTemplate],
        env: &RequestEnvelope,
        name: &str,
    ) -> Option<String> {
        let raw = match self {
            Strategy::PathParameters => env.path_parameters.get(name).cloned(),
            Strategy::PathParametersIgnoreCase => env
                .path_parameters
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.clone()),
            Strategy::QueryString => env.query_string_parameters.get(name).cloned(),
            Strategy::PathTemplate => env
                .path
                .as_deref()
                .and_then(|p| capture(templates, p, name, true)),
            Strategy::RawPath => env
                .raw_path
                .as_deref()
                .and_then(|p| capture(templates, p, name, false)),
            Strategy::ResourceTemplate => env
                .resource
                .as_deref()
                .and_then(|p| capture(templates, p, name, true)),
        }?;
        // serde_urlencoded has already decoded query values
        if self == Strategy::QueryString {
            Some(raw)
        } else {
            Some(percent_decoded(&raw))
        }
    }
}

fn capture(templates: &[PathTemplate], path: &str, name: &str, anchored: bool) -> Option<String> {
    templates.iter().find_map(|t| t.capture(path, name, anchored))
}

/// Resource path template such as `/catalog/v1/products/{codigo}`.
///
/// Sub-resources below the template (`.../{codigo}/image`) match as well.
#[derive(Debug, Clone)]
pub struct PathTemplate {
    anchored: Regex,
    unanchored: Regex,
}

impl PathTemplate {
    /// # Errors
    /// Returns the regex error for templates with invalid parameter names.
    pub fn new(template: &str) -> Result<Self, regex::Error> {
        let mut body = String::new();
        for (i, segment) in template.trim_matches('/').split('/').enumerate() {
            if i > 0 || template.starts_with('/') {
                body.push('/');
            }
            match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(param) => body.push_str(&format!("(?P<{param}>[^/?#]+)")),
                None => body.push_str(&regex::escape(segment)),
            }
        }
        let tail = "(?:/[^?#]*)?(?:[?#].*)?$";
        Ok(Self {
            anchored: Regex::new(&format!("^{body}{tail}"))?,
            unanchored: Regex::new(&format!("{body}{tail}"))?,
        })
    }

    #[must_use]
    pub fn capture(&self, path: &str, name: &str, anchored: bool) -> Option<String> {
        let re = if anchored { &self.anchored } else { &self.unanchored };
        re.captures(path)
            .and_then(|c| c.name(name))
            .map(|m| m.as_str().to_owned())
    }
}

/// Result of a failed lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingField {
    pub name: String,
    /// Envelope fields that were inspected, in order
    pub inspected: Vec<&'static str>,
}

/// Ordered strategy chain with the known resource templates.
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    templates: Vec<PathTemplate>,
    diagnostics: bool,
}

impl FieldExtractor {
    /// # Errors
    /// Returns the regex error of the first invalid template.
    pub fn new(templates: &[&str], diagnostics: bool) -> Result<Self, regex::Error> {
        Ok(Self {
            templates: templates
                .iter()
                .map(|t| PathTemplate::new(t))
                .collect::<Result<_, _>>()?,
            diagnostics,
        })
    }

    #[must_use]
    pub fn diagnostics(&self) -> bool {
        self.diagnostics
    }

    /// Find `name`, trying every [`Strategy`] in [`Strategy::CHAIN`] order.
    ///
    /// # Errors
    /// [`MissingField`] lists what was inspected.
    pub fn extract(&self, env: &RequestEnvelope, name: &str) -> Result<String, MissingField> {
        let mut inspected: Vec<&'static str> = Vec::new();
        for strategy in Strategy::CHAIN {
            if !inspected.contains(&strategy.source()) {
                inspected.push(strategy.source());
            }
            if let Some(value) = strategy
                .extract(&self.templates, env, name)
                .and_then(|raw| usable(&raw))
            {
                return Ok(value);
            }
        }
        Err(MissingField {
            name: name.to_owned(),
            inspected,
        })
    }

    /// 400 problem for a field that could not be found.
    pub fn missing_problem(&self, missing: &MissingField, instance: &str) -> Problem {
        let message = if self.diagnostics {
            format!("is required (inspected: {})", missing.inspected.join(", "))
        } else {
            "is required".to_owned()
        };
        validation_problem(&missing.name, &message, instance)
    }
}

/// Path segments that are not valid UTF-8 once decoded are kept as sent.
fn percent_decoded(raw: &str) -> String {
    urlencoding::decode(raw).map_or_else(|_| raw.to_owned(), |d| d.into_owned())
}

/// Trimmed, non-empty and not a `{placeholder}`.
fn usable(raw: &str) -> Option<String> {
    let value = raw.trim();
    if value.is_empty() || (value.starts_with('{') && value.ends_with('}')) {
        return None;
    }
    Some(value.to_owned())
}

/// The `{codigo}` path parameter, resolved through the [`FieldExtractor`]
/// found in request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductCode(pub String);

impl<S> FromRequestParts<S> for ProductCode
where
    S: Send + Sync,
{
    type Rejection = Problem;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let instance = parts.uri.path().to_owned();
        let Some(extractor) = parts.extensions.get::<Arc<FieldExtractor>>().cloned() else {
            tracing::error!("FieldExtractor extension missing from router");
            return Err(ErrorCode::INTERNAL.with_context(
                "An internal error occurred",
                &instance,
                current_trace_id(),
            ));
        };
        let Ok(envelope) = RequestEnvelope::from_request_parts(parts, state).await;
        extractor
            .extract(&envelope, CODIGO)
            .map(ProductCode)
            .map_err(|missing| {
                tracing::debug!(
                    param = %missing.name,
                    inspected = ?missing.inspected,
                    "path parameter not found"
                );
                extractor.missing_problem(&missing, &instance)
            })
    }
}
