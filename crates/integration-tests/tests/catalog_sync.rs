//! Integration tests for catalog fetching and refetch-after-mutation.
//!
//! Each test runs against its own in-process mock catalog service.

use axum::http::Method;
use md_estimator::catalog::CatalogSync;
use md_estimator::{CatalogError, HttpCatalogGateway};
use md_estimator_core::{ItemDraft, ItemId};
use md_estimator_integration_tests::{Envelope, MockCatalog};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::json;

fn sync_for(mock: &MockCatalog) -> CatalogSync<HttpCatalogGateway> {
    let gateway = HttpCatalogGateway::new(&mock.config()).expect("Failed to build gateway");
    CatalogSync::new(gateway)
}

fn seed() -> Vec<serde_json::Value> {
    vec![
        json!({ "id": 1, "name": "Wall Panel", "price": 500 }),
        json!({ "id": "a7", "name": "Curtain Rod", "price": "120.50" }),
        json!({ "name": "Unsaved Fabric", "price": 80 }),
    ]
}

// ============================================================================
// Fetch Tests
// ============================================================================

#[tokio::test]
async fn test_all_envelopes_yield_the_same_catalog() {
    let mock = MockCatalog::with_records(seed()).await;
    let sync = sync_for(&mock);

    let mut seen = Vec::new();
    for envelope in [Envelope::Bare, Envelope::Data, Envelope::Items] {
        mock.set_envelope(envelope);
        sync.refresh().await.expect("Refresh failed");
        let items = sync.items();
        seen.push(
            items
                .iter()
                .map(|item| (item.name.clone(), item.price.amount()))
                .collect::<Vec<_>>(),
        );

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].id.as_str(), "1");
        assert_eq!(items[1].id.as_str(), "a7");
        assert!(items[2].id.is_placeholder());
    }

    assert_eq!(seen[0], seen[1]);
    assert_eq!(seen[1], seen[2]);
    assert_eq!(seen[0][1].1, Decimal::new(12_050, 2));
}

#[tokio::test]
async fn test_fetch_failure_keeps_previous_catalog() {
    let mock = MockCatalog::with_records(seed()).await;
    let sync = sync_for(&mock);
    sync.refresh().await.expect("Refresh failed");

    mock.fail_fetch(true);
    let err = sync.refresh().await.expect_err("Refresh should fail");

    assert!(matches!(err, CatalogError::Status { status: 503, .. }));
    assert_eq!(sync.len(), 3);
    assert!(!sync.is_loading());
}

#[tokio::test]
async fn test_bearer_token_is_sent() {
    let mock = MockCatalog::start().await;
    let mut config = mock.config();
    config.api_token = Some(SecretString::from("catalog-token"));
    let sync = CatalogSync::new(HttpCatalogGateway::new(&config).expect("Failed to build gateway"));

    sync.refresh().await.expect("Refresh failed");

    let hits = mock.hits();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].authorization.as_deref(), Some("Bearer catalog-token"));
}

// ============================================================================
// Mutation Tests
// ============================================================================

#[tokio::test]
async fn test_create_sends_numeric_price_and_refetches() {
    let mock = MockCatalog::start().await;
    let sync = sync_for(&mock);
    let draft = ItemDraft::parse("  Sofa Fabric ", "850.75").expect("Valid draft");

    sync.create(&draft).await.expect("Create failed");

    let records = mock.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["name"], "Sofa Fabric");
    assert_eq!(records[0]["price"], json!(850.75));

    assert_eq!(mock.hit_count(&Method::POST), 1);
    assert_eq!(mock.hit_count(&Method::GET), 1);
    assert_eq!(sync.items()[0].id.as_str(), "1000");
}

#[tokio::test]
async fn test_update_and_delete_refetch() {
    let mock = MockCatalog::with_records(seed()).await;
    let sync = sync_for(&mock);
    sync.refresh().await.expect("Refresh failed");

    let draft = ItemDraft::parse("Wall Panel XL", "650").expect("Valid draft");
    sync.update(&ItemId::new("1"), &draft)
        .await
        .expect("Update failed");
    let panel = sync.item(&ItemId::new("1")).expect("Panel still listed");
    assert_eq!(panel.name, "Wall Panel XL");
    assert_eq!(panel.price.amount(), Decimal::from(650));

    let message = sync.delete(&ItemId::new("a7")).await.expect("Delete failed");
    assert_eq!(message, "Item deleted successfully");
    assert!(sync.item(&ItemId::new("a7")).is_none());

    assert_eq!(mock.hit_count(&Method::GET), 3);
}

#[tokio::test]
async fn test_rejected_update_does_not_refetch() {
    let mock = MockCatalog::with_records(seed()).await;
    let sync = sync_for(&mock);
    let draft = ItemDraft::parse("Ghost", "1").expect("Valid draft");

    let err = sync
        .update(&ItemId::new("404"), &draft)
        .await
        .expect_err("Update should fail");

    assert!(matches!(err, CatalogError::Status { status: 404, .. }));
    assert_eq!(mock.hit_count(&Method::GET), 0);
}

#[tokio::test]
async fn test_identity_is_percent_encoded() {
    // An unencoded slash would split the identity into two path segments
    let mock = MockCatalog::with_records(vec![json!({ "id": "a/b c", "name": "Slashed" })]).await;
    let sync = sync_for(&mock);
    let id = ItemId::new("a/b c");

    let draft = ItemDraft::parse("Slashed", "75").expect("Valid draft");
    sync.update(&id, &draft).await.expect("Update failed");
    sync.delete(&id).await.expect("Delete failed");

    let paths: Vec<(Method, String)> = mock
        .hits()
        .into_iter()
        .filter(|hit| hit.method != Method::GET)
        .map(|hit| (hit.method, hit.path))
        .collect();
    assert_eq!(
        paths,
        vec![
            (Method::PUT, "/api/items/a/b c".to_string()),
            (Method::DELETE, "/api/items/a/b c".to_string()),
        ]
    );
    assert!(mock.records().is_empty());
}
