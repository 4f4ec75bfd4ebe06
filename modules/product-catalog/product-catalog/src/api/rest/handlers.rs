use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Extension, Query};
use axum::http::{HeaderValue, StatusCode, Uri, header};
use axum::response::IntoResponse;
use catalog_auth::axum_ext::Authz;
use catalog_errors::Problem;
use product_catalog_sdk::ListQuery;
use tracing::field::Empty;

use crate::domain::error::{CURSOR_FIELD, EXTENSION_FIELD, LIMIT_FIELD};
use crate::domain::service::Service;

use super::body::{BODY_FIELD, ImageBody, ProductBody};
use super::dto::{
    HealthDto, ListParams, PresignRequest, PresignedUploadDto, ProductDto, ProductListDto,
};
use super::error::{domain_error_to_problem, validation_problem};
use super::params::ProductCode;

pub type ApiResult<T> = Result<T, Problem>;

/// Parse the `limit` query value; absent means "use the default".
fn parse_limit(raw: Option<&str>) -> Result<Option<u32>, &'static str> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    match raw.parse::<i64>() {
        Ok(n) if n > 0 => Ok(Some(u32::try_from(n).unwrap_or(u32::MAX))),
        _ => Err("must be a positive integer"),
    }
}

#[tracing::instrument(skip_all, fields(tenant_id = %authz.tenant_id(), count = Empty))]
pub async fn list_products(
    authz: Authz,
    Extension(svc): Extension<Arc<Service>>,
    uri: Uri,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Json<ProductListDto>> {
    let Query(params) =
        params.map_err(|e| validation_problem(CURSOR_FIELD, &e.body_text(), uri.path()))?;
    let limit = parse_limit(params.limit.as_deref())
        .map_err(|message| validation_problem(LIMIT_FIELD, message, uri.path()))?;

    let query = ListQuery {
        limit,
        cursor: params.cursor.or(params.last_key),
    };
    let page = svc
        .list(authz.tenant_id(), &query)
        .await
        .map_err(|e| domain_error_to_problem(&e, uri.path()))?;

    tracing::Span::current().record("count", page.items.len());
    Ok(Json(page.into()))
}

pub async fn create_product(
    authz: Authz,
    Extension(svc): Extension<Arc<Service>>,
    uri: Uri,
    ProductBody(draft): ProductBody,
) -> ApiResult<impl IntoResponse> {
    let product = svc
        .create(authz.tenant_id(), draft)
        .await
        .map_err(|e| domain_error_to_problem(&e, uri.path()))?;

    let location = format!("{}/{}", uri.path().trim_end_matches('/'), product.codigo);
    let mut response = (StatusCode::CREATED, Json(ProductDto::from(product))).into_response();
    if let Ok(value) = HeaderValue::from_str(&location) {
        response.headers_mut().insert(header::LOCATION, value);
    }
    Ok(response)
}

pub async fn get_product(
    authz: Authz,
    Extension(svc): Extension<Arc<Service>>,
    uri: Uri,
    ProductCode(codigo): ProductCode,
) -> ApiResult<Json<ProductDto>> {
    let product = svc
        .get(authz.tenant_id(), &codigo)
        .await
        .map_err(|e| domain_error_to_problem(&e, uri.path()))?;
    Ok(Json(product.into()))
}

pub async fn update_product(
    authz: Authz,
    Extension(svc): Extension<Arc<Service>>,
    uri: Uri,
    ProductCode(codigo): ProductCode,
    ProductBody(draft): ProductBody,
) -> ApiResult<Json<ProductDto>> {
    let product = svc
        .update(authz.tenant_id(), &codigo, draft)
        .await
        .map_err(|e| domain_error_to_problem(&e, uri.path()))?;
    Ok(Json(product.into()))
}

pub async fn delete_product(
    authz: Authz,
    Extension(svc): Extension<Arc<Service>>,
    uri: Uri,
    ProductCode(codigo): ProductCode,
) -> ApiResult<Json<ProductDto>> {
    let product = svc
        .delete(authz.tenant_id(), &codigo)
        .await
        .map_err(|e| domain_error_to_problem(&e, uri.path()))?;
    Ok(Json(product.into()))
}

pub async fn upload_image(
    authz: Authz,
    Extension(svc): Extension<Arc<Service>>,
    uri: Uri,
    ProductCode(codigo): ProductCode,
    ImageBody(payload): ImageBody,
) -> ApiResult<Json<ProductDto>> {
    let product = svc
        .upload_image(authz.tenant_id(), &codigo, &payload)
        .await
        .map_err(|e| domain_error_to_problem(&e, uri.path()))?;
    Ok(Json(product.into()))
}

pub async fn presign_image(
    authz: Authz,
    Extension(svc): Extension<Arc<Service>>,
    uri: Uri,
    ProductCode(codigo): ProductCode,
    body: Result<Json<PresignRequest>, JsonRejection>,
) -> ApiResult<Json<PresignedUploadDto>> {
    let Json(req) = body.map_err(|e| {
        let field = match e {
            JsonRejection::JsonDataError(_) => EXTENSION_FIELD,
            _ => BODY_FIELD,
        };
        validation_problem(field, &e.body_text(), uri.path())
    })?;
    let upload = svc
        .presign_image(authz.tenant_id(), &codigo, &req.extension)
        .await
        .map_err(|e| domain_error_to_problem(&e, uri.path()))?;
    Ok(Json(upload.into()))
}

pub async fn health() -> Json<HealthDto> {
    Json(HealthDto {
        status: "ok".to_owned(),
    })
}
