#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::TestApp;
use serde_json::json;

async fn seed(app: &TestApp, tenant: &str, n: usize) -> Vec<String> {
    let mut codes = Vec::with_capacity(n);
    for i in 0..n {
        let (status, created) = app
            .call(
                tenant,
                "POST",
                "/catalog/v1/products",
                Some(json!({"name": format!("Product {i}"), "description": "Seeded", "price": 1})),
            )
            .await;
        assert_eq!(status, 201);
        codes.push(created["codigo"].as_str().unwrap().to_owned());
    }
    codes
}

#[tokio::test]
async fn walks_every_product_once() {
    let app = TestApp::new();
    let mut expected = seed(&app, "acme", 3).await;
    seed(&app, "globex", 2).await;

    let mut seen = Vec::new();
    let mut uri = "/catalog/v1/products?limit=1".to_owned();
    loop {
        let (status, page) = app.call("acme", "GET", &uri, None).await;
        assert_eq!(status, 200);
        assert!(page["count"].as_u64().unwrap() <= 1);
        for item in page["items"].as_array().unwrap() {
            seen.push(item["codigo"].as_str().unwrap().to_owned());
        }
        if page["has_more"] != true {
            break;
        }
        let cursor = page["next_cursor"].as_str().unwrap();
        uri = format!("/catalog/v1/products?limit=1&cursor={}", urlencoding::encode(cursor));
    }

    seen.sort();
    expected.sort();
    assert_eq!(seen, expected);
}

#[tokio::test]
async fn last_key_is_an_alias_for_cursor() {
    let app = TestApp::new();
    seed(&app, "acme", 2).await;

    let (_, first) = app.call("acme", "GET", "/catalog/v1/products?limit=1", None).await;
    let cursor = urlencoding::encode(first["next_cursor"].as_str().unwrap()).into_owned();

    let (_, by_cursor) = app
        .call("acme", "GET", &format!("/catalog/v1/products?limit=1&cursor={cursor}"), None)
        .await;
    let (_, by_last_key) = app
        .call("acme", "GET", &format!("/catalog/v1/products?limit=1&lastKey={cursor}"), None)
        .await;
    assert_eq!(by_cursor["items"], by_last_key["items"]);
    assert_ne!(by_cursor["items"][0]["codigo"], first["items"][0]["codigo"]);
}

#[tokio::test]
async fn invalid_paging_input_is_400() {
    let app = TestApp::new();

    for uri in [
        "/catalog/v1/products?limit=0",
        "/catalog/v1/products?limit=-1",
        "/catalog/v1/products?limit=many",
    ] {
        let (status, problem) = app.call("acme", "GET", uri, None).await;
        assert_eq!(status, 400, "{uri}");
        assert_eq!(problem["invalid_params"][0]["name"], "limit");
    }

    let (status, problem) = app
        .call("acme", "GET", "/catalog/v1/products?cursor=%25%25%25", None)
        .await;
    assert_eq!(status, 400);
    assert_eq!(problem["invalid_params"][0]["name"], "cursor");
}
