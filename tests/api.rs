//! REST API integration tests driven through the router with `oneshot`.

#![allow(clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use webhook_monitor::app::build_app;
use webhook_monitor::app_state::AppState;
use webhook_monitor::config::StorefrontConfig;
use webhook_monitor::domain::stats::stats_document_id;
use webhook_monitor::domain::{CollectionPath, EventBus};
use webhook_monitor::monitor::MonitorSettings;
use webhook_monitor::service::WebhookRepository;
use webhook_monitor::store::{DocumentStore, MemoryDocumentStore};

fn setup() -> (Arc<MemoryDocumentStore>, axum::Router) {
    let store = Arc::new(MemoryDocumentStore::new(EventBus::new(256)));
    let state = AppState {
        repository: WebhookRepository::new(Arc::clone(&store) as Arc<dyn DocumentStore>, "ops"),
        settings: MonitorSettings::default(),
        storefront: StorefrontConfig::new(
            Some("shop.example.com".to_string()),
            Some("secret-token".to_string()),
        ),
        store_backend: "memory",
    };
    (store, build_app(state, Duration::from_secs(5)))
}

async fn seed(store: &MemoryDocumentStore, collection: CollectionPath, id: &str, data: Value) {
    let Ok(()) = store.set(&collection.doc(id), data).await else {
        panic!("seed {id} failed");
    };
}

async fn seed_purchases(store: &MemoryDocumentStore) {
    seed(
        store,
        CollectionPath::purchases(),
        "p1",
        json!({
            "order": {"id": 7001, "orderNumber": 1001},
            "user": {"email": "alice@example.com"},
            "product": {"title": "Gift Card"},
            "processingResult": {"status": "success", "errors": [], "warnings": []},
            "webhookTopic": "orders/paid",
            "createdAt": "2026-10-18T09:00:00Z",
            "fullPayload": {"id": 7001},
        }),
    )
    .await;
    seed(
        store,
        CollectionPath::purchases(),
        "p2",
        json!({
            "orderId": "7002",
            "orderNumber": "1002",
            "userEmail": "bob@example.com",
            "processingResult": {"status": "no_user", "errors": ["no account"]},
            "createdAt": "2026-10-18T10:00:00Z",
        }),
    )
    .await;
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let Ok(response) = app.clone().oneshot(request).await else {
        panic!("request failed");
    };
    let status = response.status();
    let Ok(collected) = response.into_body().collect().await else {
        panic!("read body");
    };
    let bytes = collected.to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        let Ok(json) = serde_json::from_slice(&bytes) else {
            panic!("body is not JSON");
        };
        json
    };
    (status, json)
}

async fn get(app: &axum::Router, uri: &str) -> (StatusCode, Value) {
    let Ok(request) = Request::builder().uri(uri).body(Body::empty()) else {
        panic!("build request");
    };
    send(app, request).await
}

async fn post(app: &axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let Ok(request) = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
    else {
        panic!("build request");
    };
    send(app, request).await
}

#[tokio::test]
async fn health_reports_store_backend() {
    let (_, app) = setup();
    let (status, json) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.pointer("/status"), Some(&json!("healthy")));
    assert_eq!(json.pointer("/store"), Some(&json!("memory")));
}

#[tokio::test]
async fn storefront_settings_never_echo_the_token() {
    let (_, app) = setup();
    let (status, json) = get(&app, "/config/storefront").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.pointer("/store_domain"), Some(&json!("shop.example.com")));
    assert_eq!(json.pointer("/configured"), Some(&json!(true)));
    assert!(!json.to_string().contains("secret-token"));
}

#[tokio::test]
async fn webhooks_are_listed_newest_first() {
    let (store, app) = setup();
    seed_purchases(&store).await;

    let (status, json) = get(&app, "/api/v1/webhooks").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.pointer("/count"), Some(&json!(2)));
    assert_eq!(json.pointer("/max_results"), Some(&json!(50)));
    assert_eq!(json.pointer("/status"), Some(&json!("all")));
    assert_eq!(json.pointer("/data/0/id"), Some(&json!("p2")));
    assert_eq!(json.pointer("/data/1/order_display"), Some(&json!("#1001")));
    assert_eq!(json.pointer("/data/1/badge/label"), Some(&json!("SUCCESS")));
    assert_eq!(json.pointer("/data/0/product_title"), Some(&json!("Unknown Product")));
}

#[tokio::test]
async fn webhooks_filter_by_status_and_search() {
    let (store, app) = setup();
    seed_purchases(&store).await;

    let (_, json) = get(&app, "/api/v1/webhooks?status=no_user").await;
    assert_eq!(json.pointer("/count"), Some(&json!(1)));
    assert_eq!(json.pointer("/data/0/id"), Some(&json!("p2")));

    let (_, json) = get(&app, "/api/v1/webhooks?search=ALICE").await;
    assert_eq!(json.pointer("/count"), Some(&json!(1)));
    assert_eq!(json.pointer("/data/0/user_email"), Some(&json!("alice@example.com")));

    let (_, json) = get(&app, "/api/v1/webhooks?max_results=1").await;
    assert_eq!(json.pointer("/count"), Some(&json!(1)));
}

#[tokio::test]
async fn unknown_status_filter_is_rejected() {
    let (_, app) = setup();
    let (status, json) = get(&app, "/api/v1/webhooks?status=exploded").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json.pointer("/error/code"), Some(&json!(1002)));
}

#[tokio::test]
async fn webhook_detail_expands_payload() {
    let (store, app) = setup();
    seed_purchases(&store).await;

    let (status, json) = get(&app, "/api/v1/webhooks/p1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.pointer("/id"), Some(&json!("p1")));
    assert_eq!(json.pointer("/payload_expanded"), Some(&json!(true)));
    assert!(
        json.pointer("/payload")
            .and_then(Value::as_str)
            .is_some_and(|p| p.contains("7001"))
    );

    let (status, json) = get(&app, "/api/v1/webhooks/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json.pointer("/error/code"), Some(&json!(2001)));
}

#[tokio::test]
async fn resolving_an_alert_removes_it_from_the_active_list() {
    let (store, app) = setup();
    seed(
        &store,
        CollectionPath::alerts(),
        "a1",
        json!({
            "type": "user_not_found",
            "severity": "critical",
            "resolved": false,
            "details": {"message": "No user for order", "orderNumber": "1002"},
            "createdAt": "2026-10-18T10:00:00Z",
        }),
    )
    .await;
    seed(
        &store,
        CollectionPath::alerts(),
        "a2",
        json!({"severity": "warning", "resolved": false, "createdAt": "2026-10-18T09:00:00Z"}),
    )
    .await;

    let (status, json) = get(&app, "/api/v1/alerts").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.pointer("/alert_count"), Some(&json!(2)));
    assert_eq!(json.pointer("/critical_alert_count"), Some(&json!(1)));

    let (_, json) = get(&app, "/api/v1/alerts?severity=warning").await;
    assert_eq!(json.pointer("/alert_count"), Some(&json!(1)));

    let (status, json) = post(&app, "/api/v1/alerts/a1/resolve", json!({"notes": "account created"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.pointer("/alert_id"), Some(&json!("a1")));
    assert_eq!(json.pointer("/resolved_by"), Some(&json!("ops")));

    let (_, json) = get(&app, "/api/v1/alerts").await;
    assert_eq!(json.pointer("/alert_count"), Some(&json!(1)));
    assert_eq!(json.pointer("/critical_alert_count"), Some(&json!(0)));

    let (_, json) = get(&app, "/api/v1/alerts/history?limit=10").await;
    assert_eq!(json.pointer("/limit"), Some(&json!(10)));
    assert_eq!(json.pointer("/data/0/id"), Some(&json!("a1")));
    assert_eq!(json.pointer("/data/0/resolved"), Some(&json!(true)));
}

#[tokio::test]
async fn resolve_is_idempotent_and_honours_resolved_by() {
    let (store, app) = setup();
    seed(
        &store,
        CollectionPath::alerts(),
        "a1",
        json!({"severity": "error", "resolved": false, "createdAt": "2026-10-18T10:00:00Z"}),
    )
    .await;

    let (first, _) = post(&app, "/api/v1/alerts/a1/resolve", json!({})).await;
    let (second, json) = post(
        &app,
        "/api/v1/alerts/a1/resolve",
        json!({"notes": "again", "resolved_by": "alice"}),
    )
    .await;
    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::OK);
    assert_eq!(json.pointer("/resolved_by"), Some(&json!("alice")));
    assert_eq!(json.pointer("/notes"), Some(&json!("again")));
}

#[tokio::test]
async fn resolving_a_missing_alert_is_not_found() {
    let (_, app) = setup();
    let (status, json) = post(&app, "/api/v1/alerts/ghost/resolve", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json.pointer("/error/code"), Some(&json!(2002)));
}

#[tokio::test]
async fn stats_default_to_zero_and_parse_dates() {
    let (store, app) = setup();
    let (status, json) = get(&app, "/api/v1/stats/today").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.pointer("/stats/total_webhooks"), Some(&json!(0)));

    let Some(date) = chrono::NaiveDate::from_ymd_opt(2026, 10, 17) else {
        panic!("valid date");
    };
    seed(
        &store,
        CollectionPath::daily_stats(),
        &stats_document_id(date),
        json!({"totalWebhooks": 10, "successfulOrders": 9}),
    )
    .await;
    let (status, json) = get(&app, "/api/v1/stats/2026-10-17").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.pointer("/date"), Some(&json!("2026-10-17")));
    assert_eq!(json.pointer("/stats/total_webhooks"), Some(&json!(10)));
    assert_eq!(json.pointer("/success_rate"), Some(&json!(90.0)));

    let (status, json) = get(&app, "/api/v1/stats/yesterday").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json.pointer("/error/code"), Some(&json!(1001)));
}

#[tokio::test]
async fn dashboard_summarises_today() {
    let (store, app) = setup();
    seed(
        &store,
        CollectionPath::alerts(),
        "a1",
        json!({"severity": "critical", "resolved": false, "createdAt": "2026-10-18T10:00:00Z"}),
    )
    .await;
    let (status, json) = get(&app, "/api/v1/dashboard").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.pointer("/alert_count"), Some(&json!(1)));
    assert_eq!(json.pointer("/critical_alert_count"), Some(&json!(1)));
    assert_eq!(json.pointer("/storefront_configured"), Some(&json!(true)));
}
