mod common;

use chrono::Utc;
use serde_json::json;
use studio_web::builder::ReceiptDraft;
use studio_web::handoff::hand_off;
use studio_web::models::BusinessSettings;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn failed_save_keeps_the_whatsapp_link() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/receipts"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "database unavailable"})))
        .expect(1)
        .mount(&server)
        .await;
    let state = common::test_state(&server);
    let settings = BusinessSettings::default();

    let mut draft = ReceiptDraft::default();
    draft.add_service(&state.services.find("3").expect("stock service"));
    let receipt = draft.submit(&settings, "MFW", 0, Utc::now()).unwrap();

    let handoff = hand_off(state.receipts.clone(), receipt, &settings, Utc::now());

    assert!(handoff.whatsapp_url.is_some());
    assert!(!handoff.persistence.await.unwrap());
    assert!(state.receipts.is_empty());
}

#[tokio::test]
async fn successful_save_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/receipts"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    let state = common::test_state(&server);
    let settings = BusinessSettings::default();

    let mut draft = ReceiptDraft::default();
    draft.add_service(&state.services.find("3").expect("stock service"));
    let receipt = draft.submit(&settings, "MFW", 0, Utc::now()).unwrap();

    let handoff = hand_off(state.receipts.clone(), receipt, &settings, Utc::now());

    assert!(handoff.persistence.await.unwrap());
}
