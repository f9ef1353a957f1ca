//! HTTP-level tests: routing, status codes and error bodies.

mod common;

use crate::common::{unique_tag, ProviderFixture, TestHarness};
use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use dispatch_core::kernel::MockGeocoder;
use serde_json::{json, Value};
use test_context::test_context;
use tower::ServiceExt;

async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[test_context(TestHarness)]
#[tokio::test]
async fn health_reports_database(ctx: &TestHarness) {
    let (app, _) = ctx.app(MockGeocoder::new());

    let (status, body) = send(app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"]["status"], "ok");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn register_then_fetch(ctx: &TestHarness) {
    let tag = unique_tag();
    let (app, geocoder) = ctx.app(MockGeocoder::new().with_hit(-15.79, -47.88));

    let (status, created) = send(
        app.clone(),
        Method::POST,
        "/providers/register",
        Some(json!({
            "name": format!("Candango {tag}"),
            "street": "SQS 308 Bloco A",
            "city": "Brasília",
            "state": "DF",
            "approved": true,
            "regions": ["Asa Sul"],
            "dispatch_fee": "150.00"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["approved"], false);
    assert_eq!(created["latitude"], -15.79);
    assert_eq!(geocoder.call_count(), 1);

    let id = created["id"].as_str().unwrap();
    let (status, fetched) = send(app, Method::GET, &format!("/providers/{id}"), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["regions"], json!(["Asa Sul"]));
    assert_eq!(fetched["dispatch_fee"], "150.00");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn list_reads_csv_filters(ctx: &TestHarness) {
    let tag = unique_tag();
    ProviderFixture::new("Planalto", &tag)
        .city("Goiânia", "GO")
        .regions(&["Brasília"])
        .functions(&["guincho"])
        .insert(&ctx.db_pool)
        .await
        .unwrap();
    let (app, _) = ctx.app(MockGeocoder::new());

    let uri = format!(
        "/providers?locality=brasilia&name={tag}&functions=guincho,escolta&page_size=5"
    );
    let (status, body) = send(app, Method::GET, &uri, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["page"], 1);
    assert_eq!(body["page_size"], 5);
    assert_eq!(body["providers"][0]["name"], format!("Planalto {tag}"));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn errors_use_json_bodies(ctx: &TestHarness) {
    let (app, _) = ctx.app(MockGeocoder::new());

    let (status, body) = send(app.clone(), Method::GET, "/providers/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 400);

    let missing = dispatch_core::common::ProviderId::new();
    let (status, body) = send(
        app.clone(),
        Method::DELETE,
        &format!("/providers/{missing}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "provider not found");

    let (status, body) = send(
        app,
        Method::POST,
        "/providers",
        Some(json!({ "name": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "name is required");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn approval_toggle_and_delete(ctx: &TestHarness) {
    let tag = unique_tag();
    let stored = ProviderFixture::new("Toggle", &tag)
        .approved(false)
        .insert(&ctx.db_pool)
        .await
        .unwrap();
    let (app, _) = ctx.app(MockGeocoder::new());

    let (status, body) = send(
        app.clone(),
        Method::PATCH,
        &format!("/providers/{}/approval", stored.id),
        Some(json!({ "approved": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["approved"], true);

    let (status, _) = send(
        app,
        Method::DELETE,
        &format!("/providers/{}", stored.id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}
