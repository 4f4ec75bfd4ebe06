#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, header};
use catalog_auth::{Claims, JwtConfig, JwtVerifier};
use product_catalog::infra::{InMemoryBlobStore, InMemoryProductStore};
use product_catalog::{CatalogConfig, CatalogModule, DEFAULT_BODY_LIMIT};
use serde_json::Value;
use tower::ServiceExt as _;

pub const SECRET: &str = "integration-secret";

/// 1x1 PNG
pub const PNG_B64: &str = concat!(
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNk",
    "+M9QDwADhgGAWjR9awAAAABJRU5ErkJggg=="
);

pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryProductStore>,
    pub blobs: Arc<InMemoryBlobStore>,
    pub verifier: Arc<JwtVerifier>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(CatalogConfig::default())
    }

    pub fn with_config(cfg: CatalogConfig) -> Self {
        Self::with_limits(cfg, DEFAULT_BODY_LIMIT)
    }

    pub fn with_limits(cfg: CatalogConfig, body_limit: usize) -> Self {
        let store = Arc::new(InMemoryProductStore::new());
        let blobs = Arc::new(InMemoryBlobStore::new(&cfg));
        let module = CatalogModule::new(store.clone(), blobs.clone(), &cfg).unwrap();
        let verifier = Arc::new(
            JwtVerifier::new(&JwtConfig {
                secret: SECRET.to_owned(),
                ..JwtConfig::default()
            })
            .unwrap(),
        );
        let router = module.router(verifier.clone(), body_limit);
        Self {
            router,
            store,
            blobs,
            verifier,
        }
    }

    pub fn token(&self, tenant: &str) -> String {
        self.verifier
            .sign(
                &Claims::for_tenant(tenant).with_subject("tester"),
                time::Duration::minutes(5),
            )
            .unwrap()
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn call(
        &self,
        tenant: &str,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (u16, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token(tenant)));
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = self.send(builder.body(body).unwrap()).await;
        let status = response.status().as_u16();
        (status, json_body(response).await)
    }
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap()
}
