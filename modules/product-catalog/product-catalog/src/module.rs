//! Wiring of the product-catalog module: service, client and HTTP router.

use std::sync::Arc;

use anyhow::Context;
use axum::extract::{DefaultBodyLimit, Request};
use axum::http::{HeaderName, Response};
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::{Extension, Json, Router};
use catalog_auth::TokenVerifier;
use catalog_auth::axum_ext::{AuthState, auth_required};
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::field::Empty;
use utoipa::openapi::OpenApi;
use uuid::Uuid;

use crate::api::rest::body::ImageLimit;
use crate::api::rest::openapi::ApiDoc;
use crate::api::rest::params::FieldExtractor;
use crate::api::rest::routes::{self, OPENAPI_PATH, RESOURCE_TEMPLATES};
use crate::config::CatalogConfig;
use crate::domain::blob::BlobStore;
use crate::domain::repo::ProductStore;
use crate::domain::service::Service;
use crate::infra::{InMemoryBlobStore, InMemoryProductStore};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Largest accepted request body; leaves room for a base64-inflated image.
pub const DEFAULT_BODY_LIMIT: usize = 16 * 1024 * 1024;

#[derive(Clone, Copy, Default)]
struct MakeReqId;

impl MakeRequestId for MakeReqId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        http::HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

pub struct CatalogModule {
    service: Arc<Service>,
    extractor: Arc<FieldExtractor>,
    config: CatalogConfig,
}

impl CatalogModule {
    /// # Errors
    /// Fails when the resource templates do not compile.
    pub fn new(
        store: Arc<dyn ProductStore>,
        blobs: Arc<dyn BlobStore>,
        config: &CatalogConfig,
    ) -> anyhow::Result<Self> {
        let extractor = FieldExtractor::new(RESOURCE_TEMPLATES, config.diagnostics)
            .context("compiling resource path templates")?;
        tracing::info!(
            namespace = %config.namespace,
            delete_policy = ?config.delete_policy,
            diagnostics = config.diagnostics,
            "product catalog initialized"
        );
        Ok(Self {
            service: Arc::new(Service::new(store, blobs, config)),
            extractor: Arc::new(extractor),
            config: config.clone(),
        })
    }

    /// Module backed by the in-process product table and blob store.
    ///
    /// # Errors
    /// See [`CatalogModule::new`].
    pub fn in_memory(config: &CatalogConfig) -> anyhow::Result<Self> {
        Self::new(
            Arc::new(InMemoryProductStore::new()),
            Arc::new(InMemoryBlobStore::new(config)),
            config,
        )
    }

    #[must_use]
    pub fn service(&self) -> Arc<Service> {
        Arc::clone(&self.service)
    }

    #[must_use]
    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Full HTTP surface with auth, CORS, tracing and request ids.
    ///
    /// Runtime order, outermost first: `SetRequestId`, `PropagateRequestId`,
    /// Trace, CORS, body limit, auth (product routes only), handler.
    pub fn router(&self, verifier: Arc<dyn TokenVerifier>, body_limit: usize) -> Router {
        let mut doc = ApiDoc::new();

        let protected =
            routes::register_routes(self.service(), Arc::clone(&self.extractor), &mut doc)
                .route_layer(from_fn_with_state(AuthState::new(verifier), auth_required))
                .layer(Extension(ImageLimit(self.config.max_image_bytes)));
        let public = routes::register_public_routes(&mut doc);

        let openapi: Arc<OpenApi> =
            Arc::new(doc.build("Product Catalog", env!("CARGO_PKG_VERSION")));
        tracing::debug!(operations = doc.operation_count(), "OpenAPI document built");

        let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

        Router::new()
            .merge(protected)
            .merge(public)
            .route(
                OPENAPI_PATH,
                get(|Extension(doc): Extension<Arc<OpenApi>>| async move { Json((*doc).clone()) }),
            )
            .layer(Extension(openapi))
            .layer(DefaultBodyLimit::max(body_limit))
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            )
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(|req: &Request| {
                        let rid = req
                            .headers()
                            .get(REQUEST_ID_HEADER)
                            .and_then(|v| v.to_str().ok())
                            .unwrap_or("n/a");
                        tracing::info_span!(
                            "http_request",
                            method = %req.method(),
                            uri = %req.uri().path(),
                            request_id = %rid,
                            status = Empty,
                            latency_ms = Empty,
                        )
                    })
                    .on_response(
                        |res: &Response<axum::body::Body>,
                         latency: std::time::Duration,
                         span: &tracing::Span| {
                            span.record("status", res.status().as_u16());
                            span.record("latency_ms", latency.as_millis());
                        },
                    ),
            )
            .layer(PropagateRequestIdLayer::new(request_id.clone()))
            .layer(SetRequestIdLayer::new(request_id, MakeReqId))
    }
}
