#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use bytes::Bytes;
    use product_catalog_sdk::{ImagePayload, ListQuery, ProductDraft};
    use serde_json::{Map, Value, json};
    use tracing_test::traced_test;

    use crate::config::{CatalogConfig, DeletePolicy};
    use crate::domain::error::DomainError;
    use crate::domain::service::Service;
    use crate::infra::{InMemoryBlobStore, InMemoryProductStore};

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13];
    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0, 16, b'J', b'F', b'I', b'F', 0, 1];

    struct Harness {
        service: Service,
        store: Arc<InMemoryProductStore>,
        blobs: Arc<InMemoryBlobStore>,
        cfg: CatalogConfig,
    }

    fn harness_with(cfg: CatalogConfig) -> Harness {
        let store = Arc::new(InMemoryProductStore::new());
        let blobs = Arc::new(InMemoryBlobStore::new(&cfg));
        let service = Service::new(store.clone(), blobs.clone(), &cfg);
        Harness {
            service,
            store,
            blobs,
            cfg,
        }
    }

    fn harness() -> Harness {
        harness_with(CatalogConfig::default())
    }

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    fn aspirin() -> ProductDraft {
        ProductDraft::new(fields(json!({
            "name": "Aspirin",
            "price": 5.5,
            "description": "Pain relief",
            "category": "analgesic"
        })))
    }

    fn blob_path(h: &Harness, url: &str) -> String {
        url.strip_prefix(&format!("{}/", h.cfg.public_base_url))
            .unwrap()
            .to_owned()
    }

    #[tokio::test]
    async fn create_fills_defaults_and_generates_code() {
        let h = harness();
        let p = h.service.create("acme", aspirin()).await.unwrap();

        assert!(p.codigo.starts_with("MED-"));
        assert_eq!(p.tenant_id, "acme");
        assert_eq!(p.stock, 0);
        assert!(!p.requires_prescription);
        assert!(p.active);
        assert_eq!(p.image_url, None);
        assert_eq!(p.created_at, p.updated_at);
        assert_eq!(p.attributes["category"], json!("analgesic"));
        assert_eq!(h.store.len(), 1);
    }

    #[tokio::test]
    async fn create_requires_core_fields() {
        let h = harness();
        let draft = ProductDraft::new(fields(json!({"name": "Aspirin", "description": "x"})));
        let err = h.service.create("acme", draft).await.unwrap_err();
        match err {
            DomainError::Validation { field, message } => {
                assert_eq!(field, "price");
                assert_eq!(message, "price is required");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(h.store.is_empty());
    }

    #[tokio::test]
    async fn create_rejects_non_positive_price() {
        let h = harness();
        let draft = ProductDraft::new(fields(json!({
            "name": "Aspirin", "price": 0, "description": "x"
        })));
        let err = h.service.create("acme", draft).await.unwrap_err();
        let DomainError::Validation { message, .. } = err else {
            panic!("expected a validation error");
        };
        assert_eq!(message, "price must be a positive number");
    }

    #[tokio::test]
    async fn create_ignores_client_active_flag() {
        let h = harness();
        let mut draft = aspirin();
        draft.fields.insert("active".to_owned(), json!(false));
        let p = h.service.create("acme", draft).await.unwrap();
        assert!(p.active);
    }

    #[tokio::test]
    async fn create_stores_inline_image() {
        let h = harness();
        let payload = format!("data:image/png;base64,{}", STANDARD.encode(PNG));
        let p = h
            .service
            .create("acme", aspirin().with_image(ImagePayload::Base64(payload)))
            .await
            .unwrap();

        let url = p.image_url.unwrap();
        let path = blob_path(&h, &url);
        assert!(path.starts_with(&format!("products/acme/{}/", p.codigo)));
        assert!(path.ends_with(".png"));
        let blob = h.blobs.get(&path).unwrap();
        assert_eq!(blob.bytes.as_ref(), PNG);
        assert_eq!(blob.media_type, "image/png");
    }

    #[tokio::test]
    async fn create_rejects_oversize_image_before_writing() {
        let h = harness_with(CatalogConfig {
            max_image_bytes: 8,
            ..CatalogConfig::default()
        });
        let err = h
            .service
            .create(
                "acme",
                aspirin().with_image(ImagePayload::Raw(Bytes::from_static(PNG))),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation { ref field, .. } if field == "image"));
        assert!(h.store.is_empty());
        assert!(h.blobs.is_empty());
    }

    #[tokio::test]
    async fn create_discards_image_when_store_write_fails() {
        let h = harness();
        h.store.set_unavailable(true);
        let err = h
            .service
            .create(
                "acme",
                aspirin().with_image(ImagePayload::Raw(Bytes::from_static(JPEG))),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Upstream(_)));
        assert!(h.blobs.is_empty());
    }

    #[tokio::test]
    async fn create_maps_blob_failure_to_storage_error() {
        let h = harness();
        h.blobs.fail_writes(true);
        let err = h
            .service
            .create(
                "acme",
                aspirin().with_image(ImagePayload::Raw(Bytes::from_static(JPEG))),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::StorageWriteFailed(_)));
        assert!(h.store.is_empty());
    }

    #[tokio::test]
    async fn get_is_scoped_to_tenant() {
        let h = harness();
        let p = h.service.create("acme", aspirin()).await.unwrap();

        assert_eq!(h.service.get("acme", &p.codigo).await.unwrap(), p);
        let err = h.service.get("other", &p.codigo).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn update_is_sparse_and_refreshes_timestamp() {
        let h = harness();
        let p = h.service.create("acme", aspirin()).await.unwrap();

        let updated = h
            .service
            .update(
                "acme",
                &p.codigo,
                ProductDraft::new(fields(json!({"stock": 12, "unknown": "dropped"}))),
            )
            .await
            .unwrap();

        assert_eq!(updated.stock, 12);
        assert_eq!(updated.name, "Aspirin");
        assert!((updated.price - 5.5).abs() < f64::EPSILON);
        assert_eq!(updated.created_at, p.created_at);
        assert!(updated.updated_at >= p.updated_at);
        assert!(!updated.attributes.contains_key("unknown"));
    }

    #[tokio::test]
    async fn update_of_missing_product_is_not_found() {
        let h = harness();
        let err = h
            .service
            .update("acme", "MED-NOPE", ProductDraft::new(fields(json!({"stock": 1}))))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { ref codigo } if codigo == "MED-NOPE"));
    }

    #[tokio::test]
    async fn update_rejects_bad_field_without_writing() {
        let h = harness();
        let p = h.service.create("acme", aspirin()).await.unwrap();
        let err = h
            .service
            .update("acme", &p.codigo, ProductDraft::new(fields(json!({"stock": -1}))))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation { ref field, .. } if field == "stock"));
        assert_eq!(h.service.get("acme", &p.codigo).await.unwrap(), p);
    }

    #[tokio::test]
    async fn update_with_image_replaces_old_blob() {
        let h = harness();
        let p = h
            .service
            .create(
                "acme",
                aspirin().with_image(ImagePayload::Raw(Bytes::from_static(PNG))),
            )
            .await
            .unwrap();
        let old_path = blob_path(&h, p.image_url.as_deref().unwrap());

        let updated = h
            .service
            .update(
                "acme",
                &p.codigo,
                ProductDraft::new(Map::new())
                    .with_image(ImagePayload::Raw(Bytes::from_static(JPEG))),
            )
            .await
            .unwrap();

        let new_path = blob_path(&h, updated.image_url.as_deref().unwrap());
        assert_ne!(new_path, old_path);
        assert!(new_path.ends_with(".jpg"));
        assert!(h.blobs.contains(&new_path));
        assert!(!h.blobs.contains(&old_path));
    }

    #[tokio::test]
    #[traced_test]
    async fn update_survives_failed_cleanup_of_old_image() {
        let h = harness();
        let p = h
            .service
            .create(
                "acme",
                aspirin().with_image(ImagePayload::Raw(Bytes::from_static(PNG))),
            )
            .await
            .unwrap();
        h.blobs.fail_deletes(true);

        let updated = h
            .service
            .update(
                "acme",
                &p.codigo,
                ProductDraft::new(Map::new())
                    .with_image(ImagePayload::Raw(Bytes::from_static(JPEG))),
            )
            .await
            .unwrap();

        assert_ne!(updated.image_url, p.image_url);
        assert_eq!(h.blobs.len(), 2);
        assert!(logs_contain("failed to delete old image"));
    }

    #[tokio::test]
    async fn soft_delete_hides_product_and_clears_image() {
        let h = harness();
        let p = h
            .service
            .create(
                "acme",
                aspirin().with_image(ImagePayload::Raw(Bytes::from_static(PNG))),
            )
            .await
            .unwrap();

        let snapshot = h.service.delete("acme", &p.codigo).await.unwrap();
        assert_eq!(snapshot, p);
        assert!(h.blobs.is_empty());
        assert_eq!(h.store.len(), 1);

        assert!(matches!(
            h.service.get("acme", &p.codigo).await.unwrap_err(),
            DomainError::NotFound { .. }
        ));
        assert!(matches!(
            h.service.delete("acme", &p.codigo).await.unwrap_err(),
            DomainError::NotFound { .. }
        ));
        let page = h.service.list("acme", &ListQuery::default()).await.unwrap();
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn update_can_reactivate_soft_deleted_product() {
        let h = harness();
        let p = h.service.create("acme", aspirin()).await.unwrap();
        h.service.delete("acme", &p.codigo).await.unwrap();

        let revived = h
            .service
            .update("acme", &p.codigo, ProductDraft::new(fields(json!({"active": true}))))
            .await
            .unwrap();
        assert!(revived.active);
        assert_eq!(h.service.get("acme", &p.codigo).await.unwrap(), revived);
    }

    #[tokio::test]
    async fn hard_delete_removes_record_and_keeps_inactive_visible() {
        let h = harness_with(CatalogConfig {
            delete_policy: DeletePolicy::Hard,
            ..CatalogConfig::default()
        });
        let p = h.service.create("acme", aspirin()).await.unwrap();
        let hidden = h
            .service
            .update("acme", &p.codigo, ProductDraft::new(fields(json!({"active": false}))))
            .await
            .unwrap();

        assert_eq!(h.service.get("acme", &p.codigo).await.unwrap(), hidden);
        h.service.delete("acme", &p.codigo).await.unwrap();
        assert!(h.store.is_empty());
    }

    #[tokio::test]
    async fn list_walks_pages_with_cursor() {
        let h = harness();
        for _ in 0..3 {
            h.service.create("acme", aspirin()).await.unwrap();
        }
        h.service.create("other", aspirin()).await.unwrap();

        let mut seen = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let mut q = ListQuery::default().with_limit(1);
            if let Some(c) = &cursor {
                q = q.with_cursor(c.clone());
            }
            let page = h.service.list("acme", &q).await.unwrap();
            assert!(page.items.len() <= 1);
            seen.extend(page.items.iter().map(|p| p.codigo.clone()));
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        assert_eq!(seen.len(), 3);
        let mut sorted = seen.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(seen, sorted);
    }

    #[tokio::test]
    async fn list_clamps_and_validates_limit() {
        let h = harness_with(CatalogConfig {
            max_page_size: 2,
            ..CatalogConfig::default()
        });
        for _ in 0..3 {
            h.service.create("acme", aspirin()).await.unwrap();
        }

        let page = h
            .service
            .list("acme", &ListQuery::default().with_limit(50))
            .await
            .unwrap();
        assert_eq!(page.items.len(), 2);
        assert!(page.has_more());

        let err = h
            .service
            .list("acme", &ListQuery::default().with_limit(0))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation { ref field, .. } if field == "limit"));
    }

    #[tokio::test]
    async fn list_rejects_malformed_cursor() {
        let h = harness();
        let err = h
            .service
            .list("acme", &ListQuery::default().with_cursor("%%%"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation { ref field, .. } if field == "cursor"));
    }

    #[tokio::test]
    async fn list_ignores_tenant_inside_cursor() {
        let h = harness();
        for _ in 0..2 {
            h.service.create("acme", aspirin()).await.unwrap();
        }
        h.service.create("other", aspirin()).await.unwrap();

        let first = h
            .service
            .list("acme", &ListQuery::default().with_limit(1))
            .await
            .unwrap();
        let cursor = first.next_cursor.unwrap();

        let foreign = h
            .service
            .list("other", &ListQuery::default().with_cursor(cursor))
            .await
            .unwrap();
        assert!(foreign.items.iter().all(|p| p.tenant_id == "other"));
    }

    #[tokio::test]
    async fn upload_image_requires_visible_product() {
        let h = harness();
        let err = h
            .service
            .upload_image("acme", "MED-NOPE", &ImagePayload::Raw(Bytes::from_static(PNG)))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
        assert!(h.blobs.is_empty());
    }

    #[tokio::test]
    async fn upload_image_rejects_unknown_format() {
        let h = harness();
        let p = h.service.create("acme", aspirin()).await.unwrap();
        let err = h
            .service
            .upload_image(
                "acme",
                &p.codigo,
                &ImagePayload::Base64(STANDARD.encode(b"plain text, not an image")),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation { ref field, .. } if field == "image"));
    }

    #[tokio::test]
    async fn upload_image_sets_url() {
        let h = harness();
        let p = h.service.create("acme", aspirin()).await.unwrap();
        let updated = h
            .service
            .upload_image("acme", &p.codigo, &ImagePayload::Raw(Bytes::from_static(JPEG)))
            .await
            .unwrap();
        let path = blob_path(&h, updated.image_url.as_deref().unwrap());
        assert!(h.blobs.contains(&path));
    }

    #[tokio::test]
    async fn presign_checks_product_and_extension() {
        let h = harness();
        let p = h.service.create("acme", aspirin()).await.unwrap();

        let upload = h.service.presign_image("acme", &p.codigo, "PNG").await.unwrap();
        assert!(upload.path.starts_with(&format!("products/acme/{}/", p.codigo)));
        assert!(upload.path.ends_with(".png"));
        assert_eq!(upload.expires_in, 600);
        assert_eq!(upload.public_url, format!("{}/{}", h.cfg.public_base_url, upload.path));

        let err = h.service.presign_image("acme", &p.codigo, "exe").await.unwrap_err();
        assert!(matches!(err, DomainError::Validation { ref field, .. } if field == "extension"));

        let err = h.service.presign_image("other", &p.codigo, "png").await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }
}
