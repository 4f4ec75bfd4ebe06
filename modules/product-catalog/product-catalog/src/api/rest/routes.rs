use std::sync::Arc;

use axum::routing::{get, post};
use axum::{Extension, Router};
use http::Method;

use crate::api::rest::openapi::{ApiDoc, OperationDoc};
use crate::api::rest::{dto, handlers};
use crate::domain::service::Service;

use super::params::FieldExtractor;

pub const PRODUCTS_PATH: &str = "/catalog/v1/products";
pub const PRODUCT_PATH: &str = "/catalog/v1/products/{codigo}";
pub const PRODUCT_IMAGE_PATH: &str = "/catalog/v1/products/{codigo}/image";
pub const PRODUCT_PRESIGN_PATH: &str = "/catalog/v1/products/{codigo}/image/presign";
pub const OPENAPI_PATH: &str = "/catalog/v1/openapi.json";
pub const HEALTH_PATH: &str = "/health";

/// Templates the field extractor matches raw paths against.
pub const RESOURCE_TEMPLATES: &[&str] = &[PRODUCT_PATH];

const CODIGO_DOC: &str = "Product code, e.g. `MED-LOYW3V28-4F7K2Q`";

/// Product routes. All of them expect verified claims in request extensions.
pub fn register_routes(
    service: Arc<Service>,
    extractor: Arc<FieldExtractor>,
    doc: &mut ApiDoc,
) -> Router {
    let list = OperationDoc::new(
        Method::GET,
        PRODUCTS_PATH,
        "catalog.list_products",
        "List products",
    )
    .query_param("limit", "Page size, 1..=100 (default 20)")
    .query_param("cursor", "Continuation token from a previous page")
    .query_param("lastKey", "Alias of `cursor`")
    .json_response::<dto::ProductListDto>(doc, 200, "Page of products")
    .problems(doc, &[400, 401, 500]);
    doc.register(list);

    let create = OperationDoc::new(
        Method::POST,
        PRODUCTS_PATH,
        "catalog.create_product",
        "Create a product",
    )
    .json_or_multipart_request::<dto::ProductWriteRequest>(doc)
    .json_response::<dto::ProductDto>(doc, 201, "Product created")
    .problems(doc, &[400, 401, 500, 502]);
    doc.register(create);

    let get_one = OperationDoc::new(
        Method::GET,
        PRODUCT_PATH,
        "catalog.get_product",
        "Get a product",
    )
    .path_param("codigo", CODIGO_DOC)
    .json_response::<dto::ProductDto>(doc, 200, "Product")
    .problems(doc, &[400, 401, 404, 500]);
    doc.register(get_one);

    for (method, id) in [
        (Method::PUT, "catalog.update_product"),
        (Method::PATCH, "catalog.patch_product"),
    ] {
        let update = OperationDoc::new(method, PRODUCT_PATH, id, "Update product fields")
            .path_param("codigo", CODIGO_DOC)
            .json_or_multipart_request::<dto::ProductWriteRequest>(doc)
            .json_response::<dto::ProductDto>(doc, 200, "Updated product")
            .problems(doc, &[400, 401, 404, 500, 502]);
        doc.register(update);
    }

    let delete = OperationDoc::new(
        Method::DELETE,
        PRODUCT_PATH,
        "catalog.delete_product",
        "Delete a product",
    )
    .path_param("codigo", CODIGO_DOC)
    .json_response::<dto::ProductDto>(doc, 200, "Snapshot of the deleted product")
    .problems(doc, &[400, 401, 404, 500]);
    doc.register(delete);

    let upload = OperationDoc::new(
        Method::POST,
        PRODUCT_IMAGE_PATH,
        "catalog.upload_image",
        "Replace the product image",
    )
    .path_param("codigo", CODIGO_DOC)
    .json_or_multipart_request::<dto::ImageUploadRequest>(doc)
    .json_response::<dto::ProductDto>(doc, 200, "Product with its new image")
    .problems(doc, &[400, 401, 404, 500, 502]);
    doc.register(upload);

    let presign = OperationDoc::new(
        Method::POST,
        PRODUCT_PRESIGN_PATH,
        "catalog.presign_image",
        "Issue a direct image upload URL",
    )
    .path_param("codigo", CODIGO_DOC)
    .json_request::<dto::PresignRequest>(doc)
    .json_response::<dto::PresignedUploadDto>(doc, 200, "Upload URL issued")
    .problems(doc, &[400, 401, 404, 500, 502]);
    doc.register(presign);

    Router::new()
        .route(
            PRODUCTS_PATH,
            get(handlers::list_products).post(handlers::create_product),
        )
        .route(
            PRODUCT_PATH,
            get(handlers::get_product)
                .put(handlers::update_product)
                .patch(handlers::update_product)
                .delete(handlers::delete_product),
        )
        .route(PRODUCT_IMAGE_PATH, post(handlers::upload_image))
        .route(PRODUCT_PRESIGN_PATH, post(handlers::presign_image))
        .layer(Extension(service))
        .layer(Extension(extractor))
}

/// Routes served without a token.
pub fn register_public_routes(doc: &mut ApiDoc) -> Router {
    let health = OperationDoc::new(Method::GET, HEALTH_PATH, "catalog.health", "Liveness probe")
        .tag("System")
        .public()
        .json_response::<dto::HealthDto>(doc, 200, "Service is up");
    doc.register(health);

    let openapi = OperationDoc::new(
        Method::GET,
        OPENAPI_PATH,
        "catalog.openapi",
        "OpenAPI document",
    )
    .tag("System")
    .public();
    doc.register(openapi);

    Router::new().route(HEALTH_PATH, get(handlers::health))
}
