//! Request body extractors for product writes and image uploads.
//!
//! Both accept JSON or `multipart/form-data`. In JSON the image is a base64
//! string under `image`; in multipart it is either a file part or a text
//! part named `image`.

use axum::body::Bytes;
use axum::extract::{FromRequest, Multipart, Request};
use catalog_errors::Problem;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, StatusCode};
use product_catalog_sdk::{ImagePayload, ProductDraft};
use serde_json::{Map, Value};

use super::error::validation_problem;
use crate::domain::error::IMAGE_FIELD;

pub const BODY_FIELD: &str = "body";

/// Largest accepted image in bytes, installed as a router extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageLimit(pub usize);

/// Problem for a body that could not be read.
///
/// Only an image can push a request past the body limit, so a 413 rejection
/// is reported against `image`.
fn read_failure(
    status: StatusCode,
    text: &str,
    field: &str,
    limit: Option<ImageLimit>,
    instance: &str,
) -> Problem {
    if status != StatusCode::PAYLOAD_TOO_LARGE {
        return validation_problem(field, text, instance);
    }
    let message = match limit {
        Some(ImageLimit(max)) => format!("request body is too large, limit is {max} bytes"),
        None => "request body is too large".to_owned(),
    };
    validation_problem(IMAGE_FIELD, &message, instance)
}

fn content_type(headers: &HeaderMap) -> Option<mime::Mime> {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<mime::Mime>().ok())
}

fn is_multipart(headers: &HeaderMap) -> bool {
    content_type(headers)
        .is_some_and(|m| m.type_() == mime::MULTIPART && m.subtype() == mime::FORM_DATA)
}

fn is_image(headers: &HeaderMap) -> bool {
    content_type(headers).is_some_and(|m| m.type_() == mime::IMAGE)
}

/// Body of create and update requests.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductBody(pub ProductDraft);

impl<S> FromRequest<S> for ProductBody
where
    S: Send + Sync,
{
    type Rejection = Problem;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let instance = req.uri().path().to_owned();
        let limit = req.extensions().get::<ImageLimit>().copied();
        if is_multipart(req.headers()) {
            let multipart = Multipart::from_request(req, state).await.map_err(|e| {
                read_failure(e.status(), &e.body_text(), BODY_FIELD, limit, &instance)
            })?;
            return read_multipart_draft(multipart, limit, &instance).await.map(Self);
        }

        let bytes = Bytes::from_request(req, state).await.map_err(|e| {
            read_failure(e.status(), &e.body_text(), BODY_FIELD, limit, &instance)
        })?;
        draft_from_json(&bytes).map(Self).map_err(|(field, message)| {
            validation_problem(field, message, &instance)
        })
    }
}

/// Split a JSON body into product fields and the inline image.
///
/// An empty body is an empty object.
fn draft_from_json(bytes: &[u8]) -> Result<ProductDraft, (&'static str, &'static str)> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(ProductDraft::default());
    }
    let value: Value =
        serde_json::from_slice(bytes).map_err(|_| (BODY_FIELD, "must be valid JSON"))?;
    let Value::Object(mut fields) = value else {
        return Err((BODY_FIELD, "must be a JSON object"));
    };
    let image = match fields.remove(IMAGE_FIELD) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(Value::String(s)) => Some(ImagePayload::Base64(s)),
        Some(_) => return Err((IMAGE_FIELD, "must be a base64 string")),
    };
    Ok(ProductDraft { fields, image })
}

async fn read_multipart_draft(
    mut multipart: Multipart,
    limit: Option<ImageLimit>,
    instance: &str,
) -> Result<ProductDraft, Problem> {
    let mut fields = Map::new();
    let mut image = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| read_failure(e.status(), &e.body_text(), BODY_FIELD, limit, instance))?
    {
        let Some(name) = field.name().map(ToOwned::to_owned) else {
            continue;
        };
        let is_file = field.file_name().is_some();
        if name == IMAGE_FIELD && is_file {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| {
                    read_failure(e.status(), &e.body_text(), IMAGE_FIELD, limit, instance)
                })?;
            image = Some(ImagePayload::Raw(bytes));
            continue;
        }
        let text = field
            .text()
            .await
            .map_err(|e| read_failure(e.status(), &e.body_text(), &name, limit, instance))?;
        if name == IMAGE_FIELD {
            if !text.trim().is_empty() {
                image = Some(ImagePayload::Base64(text));
            }
        } else {
            fields.insert(name, Value::String(text));
        }
    }
    Ok(ProductDraft { fields, image })
}

/// Body of the standalone image upload: JSON `{"image": "<base64>"}`,
/// multipart with an `image` part, or raw `image/*` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBody(pub ImagePayload);

impl<S> FromRequest<S> for ImageBody
where
    S: Send + Sync,
{
    type Rejection = Problem;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let instance = req.uri().path().to_owned();
        let limit = req.extensions().get::<ImageLimit>().copied();
        let missing = |instance: &str| validation_problem(IMAGE_FIELD, "is required", instance);

        if is_multipart(req.headers()) {
            let multipart = Multipart::from_request(req, state).await.map_err(|e| {
                read_failure(e.status(), &e.body_text(), BODY_FIELD, limit, &instance)
            })?;
            let draft = read_multipart_draft(multipart, limit, &instance).await?;
            return draft.image.map(Self).ok_or_else(|| missing(&instance));
        }

        let raw = is_image(req.headers());
        let bytes = Bytes::from_request(req, state).await.map_err(|e| {
            read_failure(e.status(), &e.body_text(), BODY_FIELD, limit, &instance)
        })?;
        if raw {
            if bytes.is_empty() {
                return Err(missing(&instance));
            }
            return Ok(Self(ImagePayload::Raw(bytes)));
        }

        let draft = draft_from_json(&bytes)
            .map_err(|(field, message)| validation_problem(field, message, &instance))?;
        draft.image.map(Self).ok_or_else(|| missing(&instance))
    }
}
