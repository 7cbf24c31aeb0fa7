//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};

use api::config::Config;
use api::state::AppState;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use document_store::{Collection, InMemoryDocumentStore};
use domain::JoinStrategy;
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup_with_config(config: &Config) -> (axum::Router, InMemoryDocumentStore) {
    let store = InMemoryDocumentStore::new();
    let state = api::create_state(store.clone(), config, CancellationToken::new());
    let app = api::create_app(state, get_metrics_handle());
    (app, store)
}

fn setup() -> (axum::Router, InMemoryDocumentStore) {
    setup_with_config(&Config::default())
}

async fn send(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> Response {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

async fn create_customer(app: &axum::Router, name: &str) -> String {
    let response = send(app, "POST", "/customers", Some(json!({ "name": name }))).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["id"].as_str().unwrap().to_string()
}

fn order_payload(customer_id: &str) -> Value {
    json!({
        "customerID": customer_id,
        "items": [{ "productID": "p1", "quantity": 2, "price": 1.5 }],
        "total": 3.0,
        "status": "new"
    })
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = setup();

    let response = send(&app, "GET", "/health", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");
}

#[tokio::test]
async fn test_create_and_get_customer() {
    let (app, _) = setup();

    let id = create_customer(&app, "Ana").await;
    assert!(!id.is_empty());

    let response = send(&app, "GET", &format!("/customers/{id}"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["id"], id.as_str());
    assert_eq!(json["name"], "Ana");
}

#[tokio::test]
async fn test_create_ignores_client_supplied_id() {
    let (app, _) = setup();

    let response = send(
        &app,
        "POST",
        "/customers",
        Some(json!({ "id": "chosen-by-client", "name": "Ana" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_ne!(json["id"], "chosen-by-client");
}

#[tokio::test]
async fn test_list_customers_in_insertion_order() {
    let (app, _) = setup();
    create_customer(&app, "Ana").await;
    create_customer(&app, "Bo").await;

    let response = send(&app, "GET", "/customers", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let names: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Ana", "Bo"]);
}

#[tokio::test]
async fn test_empty_collection_lists_as_empty_array() {
    let (app, _) = setup();

    let response = send(&app, "GET", "/products", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!([]));
}

#[tokio::test]
async fn test_get_missing_customer_is_not_found() {
    let (app, _) = setup();

    let response = send(&app, "GET", "/customers/does-not-exist", None).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(!body.is_empty());
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let (app, store) = setup();

    let request = Request::builder()
        .method("POST")
        .uri("/customers")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(store.count(Collection::Customers).await, 0);
}

#[tokio::test]
async fn test_update_customer_echoes_document() {
    let (app, _) = setup();
    let id = create_customer(&app, "Ana").await;

    let response = send(
        &app,
        "PUT",
        &format!("/customers/{id}"),
        Some(json!({ "name": "Ana Maria" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let echoed = body_json(response).await;
    assert_eq!(echoed["id"], id.as_str());
    assert_eq!(echoed["name"], "Ana Maria");

    let stored = body_json(send(&app, "GET", &format!("/customers/{id}"), None).await).await;
    assert_eq!(stored["name"], "Ana Maria");
}

#[tokio::test]
async fn test_update_missing_customer_is_silent_noop() {
    let (app, store) = setup();

    let response = send(
        &app,
        "PUT",
        "/customers/nope",
        Some(json!({ "name": "Ghost" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(store.count(Collection::Customers).await, 0);
}

#[tokio::test]
async fn test_delete_customer_and_missing_id() {
    let (app, _) = setup();
    let id = create_customer(&app, "Ana").await;

    let response = send(&app, "DELETE", &format!("/customers/{id}"), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, "GET", &format!("/customers/{id}"), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, "DELETE", &format!("/customers/{id}"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_product_crud() {
    let (app, _) = setup();

    let response = send(
        &app,
        "POST",
        "/products",
        Some(json!({ "name": "Widget", "price": 9.5 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["price"], 9.5);

    let response = send(
        &app,
        "PUT",
        &format!("/products/{id}"),
        Some(json!({ "name": "Widget", "price": 11.0 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let fetched = body_json(send(&app, "GET", &format!("/products/{id}"), None).await).await;
    assert_eq!(fetched["price"], 11.0);

    let response = send(&app, "DELETE", &format!("/products/{id}"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let listed = body_json(send(&app, "GET", "/products", None).await).await;
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn test_create_order_stamps_ids_and_timestamps() {
    let (app, _) = setup();
    let customer_id = create_customer(&app, "Ana").await;

    let response = send(&app, "POST", "/orders", Some(order_payload(&customer_id))).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let order = body_json(response).await;
    assert!(!order["id"].as_str().unwrap().is_empty());
    assert!(!order["items"][0]["id"].as_str().unwrap().is_empty());
    assert_eq!(order["customerID"], customer_id.as_str());
    assert!(order["created"].is_string());
    assert_eq!(order["created"], order["updated"]);
}

#[tokio::test]
async fn test_order_list_joins_customer() {
    let (app, _) = setup();
    let customer_id = create_customer(&app, "Ana").await;
    let response = send(&app, "POST", "/orders", Some(order_payload(&customer_id))).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = send(&app, "GET", "/orders", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let orders = body_json(response).await;
    let orders = orders.as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["customer"]["name"], "Ana");
    assert_eq!(orders[0]["customer"]["id"], customer_id.as_str());
    assert_eq!(orders[0]["created"], orders[0]["updated"]);
    assert_eq!(orders[0]["items"][0]["productID"], "p1");
}

#[tokio::test]
async fn test_get_order_joins_customer() {
    let (app, _) = setup();
    let customer_id = create_customer(&app, "Ana").await;
    let created = body_json(send(&app, "POST", "/orders", Some(order_payload(&customer_id))).await).await;
    let order_id = created["id"].as_str().unwrap();

    let response = send(&app, "GET", &format!("/orders/{order_id}"), None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let order = body_json(response).await;
    assert_eq!(order["id"], order_id);
    assert_eq!(order["customer"]["name"], "Ana");
    assert_eq!(order["total"], 3.0);
}

#[tokio::test]
async fn test_orphaned_order_is_hidden_from_reads() {
    let (app, store) = setup();
    let created = body_json(send(&app, "POST", "/orders", Some(order_payload("missing"))).await).await;
    let order_id = created["id"].as_str().unwrap();

    let listed = body_json(send(&app, "GET", "/orders", None).await).await;
    assert_eq!(listed, json!([]));

    let response = send(&app, "GET", &format!("/orders/{order_id}"), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    assert_eq!(store.count(Collection::Orders).await, 1);
}

#[tokio::test]
async fn test_deleting_customer_orphans_orders() {
    let (app, _) = setup();
    let customer_id = create_customer(&app, "Ana").await;
    send(&app, "POST", "/orders", Some(order_payload(&customer_id))).await;

    send(&app, "DELETE", &format!("/customers/{customer_id}"), None).await;

    let listed = body_json(send(&app, "GET", "/orders", None).await).await;
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn test_update_order_keeps_created_and_refreshes_updated() {
    let (app, _) = setup();
    let customer_id = create_customer(&app, "Ana").await;
    let created = body_json(send(&app, "POST", "/orders", Some(order_payload(&customer_id))).await).await;
    let order_id = created["id"].as_str().unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let mut replacement = order_payload(&customer_id);
    replacement["status"] = json!("shipped");
    replacement["created"] = json!("2001-01-01T00:00:00Z");
    let response = send(&app, "PUT", &format!("/orders/{order_id}"), Some(replacement)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let order = body_json(send(&app, "GET", &format!("/orders/{order_id}"), None).await).await;
    assert_eq!(order["status"], "shipped");
    assert_eq!(order["created"], created["created"]);
    assert_ne!(order["updated"], created["updated"]);
}

#[tokio::test]
async fn test_application_join_strategy_serves_same_shape() {
    let config = Config {
        join_strategy: JoinStrategy::Application,
        ..Config::default()
    };
    let (app, _) = setup_with_config(&config);
    let customer_id = create_customer(&app, "Ana").await;
    send(&app, "POST", "/orders", Some(order_payload(&customer_id))).await;
    send(&app, "POST", "/orders", Some(order_payload("missing"))).await;

    let orders = body_json(send(&app, "GET", "/orders", None).await).await;

    let orders = orders.as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["customer"]["name"], "Ana");
}

#[tokio::test]
async fn test_cancelled_server_reports_unavailable() {
    let shutdown = CancellationToken::new();
    shutdown.cancel();
    let state = Arc::new(AppState::new(
        InMemoryDocumentStore::new(),
        JoinStrategy::Pipeline,
        None,
        shutdown,
    ));
    let app = api::create_app(state, get_metrics_handle());

    let response = send(&app, "GET", "/customers", None).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let response = send(&app, "GET", "/health", None).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(response).await["status"], "unavailable");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let (app, _) = setup();
    let customer_id = create_customer(&app, "Ana").await;
    send(&app, "POST", "/orders", Some(order_payload(&customer_id))).await;

    let response = send(&app, "GET", "/metrics", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        api::routes::metrics::PROMETHEUS_CONTENT_TYPE
    );
    let body = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(body.contains("orders_created_total"));
    assert!(body.contains("store_operations_total"));
}
