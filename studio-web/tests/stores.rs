mod common;

use rust_decimal::Decimal;
use serde_json::json;
use studio_core::supabase::{ChangeHub, ChangeKind};
use studio_web::models::BusinessSettings;
use studio_web::stores::{LiveSettings, ReceiptsStore, ServicesStore};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn receipt_row(id: &str, number: &str) -> serde_json::Value {
    json!({
        "id": id,
        "receiptNumber": number,
        "customerName": "Ayesha",
        "items": [],
        "subtotal": 100,
        "tax": 0,
        "total": 100,
        "balanceDue": 100,
        "status": "pending",
        "createdAt": "2024-06-01T10:00:00Z"
    })
}

#[tokio::test]
async fn services_refresh_replaces_stock_catalog() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/services"))
        .and(query_param("order", "created_at.asc"))
        .and(header("apikey", common::ANON_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "a", "name": "Reels", "category": "videography", "price": 5000, "description": null, "isActive": true},
            {"id": "b", "name": "Album", "category": "addon", "price": "12000.50", "isActive": false}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let store = ServicesStore::new(common::rest_client(&server), ChangeHub::default(), studio_web::models::service::default_catalog());
    assert_eq!(store.len(), 20);
    assert!(store.is_loading());

    store.refresh().await;

    assert!(!store.is_loading());
    assert_eq!(store.len(), 2);
    let album = store.find("b").unwrap();
    assert_eq!(album.price, Decimal::new(1200050, 2));
    assert!(!album.is_active);
    assert_eq!(store.find("a").unwrap().description, "");
}

#[tokio::test]
async fn unreadable_rows_are_skipped_on_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "a", "name": "Reels", "category": "videography", "price": 5000, "isActive": true},
            {"id": "b", "name": "Drone", "category": "aerial", "price": 9000, "isActive": true}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/receipts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            receipt_row("1", "MFW0001"),
            {"id": "2", "receiptNumber": "MFW0002", "items": "not a list", "subtotal": 1, "tax": 0, "total": 1, "balanceDue": 1}
        ])))
        .mount(&server)
        .await;

    let services = ServicesStore::new(common::rest_client(&server), ChangeHub::default(), Vec::new());
    let receipts = ReceiptsStore::new(common::rest_client(&server), ChangeHub::default(), Vec::new());
    services.refresh().await;
    receipts.refresh().await;

    assert_eq!(services.len(), 1);
    assert!(services.find("b").is_none());
    assert_eq!(receipts.len(), 1);
    assert!(receipts.find("1").is_some());
}

#[tokio::test]
async fn failed_refresh_keeps_rows_and_clears_loading() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/services"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "boom"})))
        .mount(&server)
        .await;

    let store = ServicesStore::new(common::rest_client(&server), ChangeHub::default(), studio_web::models::service::default_catalog());
    store.refresh().await;

    assert_eq!(store.len(), 20);
    assert!(!store.is_loading());
}

#[tokio::test]
async fn deleted_receipt_is_gone_locally_and_after_refetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/receipts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            receipt_row("1", "MFW0001"),
            receipt_row("2", "MFW0002")
        ])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/receipts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([receipt_row("2", "MFW0002")])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/receipts"))
        .and(query_param("id", "eq.1"))
        .and(header("authorization", "Bearer admin-token"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let hub = ChangeHub::default();
    let mut changes = hub.subscribe("receipts");
    let store = ReceiptsStore::new(common::rest_client(&server), hub, Vec::new());
    store.refresh().await;
    assert_eq!(store.len(), 2);

    store.delete("1", Some("admin-token")).await.unwrap();

    assert!(store.find("1").is_none());
    assert_eq!(store.len(), 1);
    assert_eq!(changes.recv().await.unwrap().kind, ChangeKind::Delete);

    store.refresh().await;
    let ids: Vec<_> = store.items().into_iter().map(|r| r.id).collect();
    assert_eq!(ids, vec!["2"]);
}

#[tokio::test]
async fn failed_delete_keeps_row() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/receipts"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "code": "42501",
            "message": "permission denied for table receipts"
        })))
        .mount(&server)
        .await;

    let initial = vec![serde_json::from_value(receipt_row("1", "MFW0001")).unwrap()];
    let store = ReceiptsStore::new(common::rest_client(&server), ChangeHub::default(), initial);

    let err = store.delete("1", None).await.unwrap_err();

    assert_eq!(err.status(), Some(403));
    assert!(store.find("1").is_some());
}

#[tokio::test]
async fn mounted_store_refetches_after_local_insert() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/receipts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/receipts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([receipt_row("9", "MFW0001")])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/receipts"))
        .and(header("prefer", "return=representation"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([receipt_row("9", "MFW0001")])))
        .expect(1)
        .mount(&server)
        .await;

    let store = ReceiptsStore::new(common::rest_client(&server), ChangeHub::default(), Vec::new());
    let mut updates = store.watch();
    let _mount = store.mount();

    updates.wait_for(|s| !s.loading).await.unwrap();
    assert!(store.is_empty());

    let receipt = serde_json::from_value(receipt_row("9", "MFW0001")).unwrap();
    store.add(&receipt, None).await.unwrap();

    updates.wait_for(|s| s.data.len() == 1).await.unwrap();
    assert_eq!(store.find("9").unwrap().receipt_number, "MFW0001");
}

#[tokio::test]
async fn missing_settings_row_is_seeded_with_defaults() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/settings"))
        .and(query_param("id", "eq.default_settings"))
        .and(header("accept", "application/vnd.pgrst.object+json"))
        .respond_with(ResponseTemplate::new(406).set_body_json(json!({
            "code": "PGRST116",
            "message": "JSON object requested, multiple (or no) rows returned",
            "details": "The result contains 0 rows"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/settings"))
        .and(body_partial_json(json!({"id": "default_settings", "businessName": "Moonfilmwork"})))
        .and(header("prefer", "return=minimal"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{"id": "default_settings"}])))
        .expect(1)
        .mount(&server)
        .await;

    let store = LiveSettings::new(common::rest_client(&server), ChangeHub::default());
    store.refresh().await;

    assert!(!store.is_loading());
    assert_eq!(store.current(), BusinessSettings::default());
}

#[tokio::test]
async fn fetched_settings_are_merged_over_defaults() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/settings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "default_settings",
            "created_at": "2024-01-01T00:00:00Z",
            "businessName": "Lens & Light",
            "taxRate": 5,
            "upiId": null,
            "darkMode": true
        })))
        .mount(&server)
        .await;

    let store = LiveSettings::new(common::rest_client(&server), ChangeHub::default());
    store.refresh().await;

    let settings = store.current();
    assert_eq!(settings.business_name, "Lens & Light");
    assert_eq!(settings.tax_rate, Decimal::from(5));
    assert_eq!(settings.currency, BusinessSettings::default().currency);
    assert_eq!(settings.dark_mode, Some(true));
    assert!(settings.upi_id.is_none());
}

#[tokio::test]
async fn settings_update_stays_local_when_write_fails() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/settings"))
        .and(query_param("id", "eq.default_settings"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "JWT expired"})))
        .expect(1)
        .mount(&server)
        .await;

    let store = LiveSettings::new(common::rest_client(&server), ChangeHub::default());
    let changed = BusinessSettings {
        business_name: "Renamed Studio".to_string(),
        ..BusinessSettings::default()
    };

    let err = store.update(changed.clone(), Some("stale-token")).await.unwrap_err();

    assert_eq!(err.user_message(), "JWT expired");
    assert_eq!(store.current(), changed);
}
