//! Client tests against an in-process fake backend.
//!
//! The fake answers in the same inconsistent shapes the real backend does:
//! bare arrays, `{data: ...}` envelopes, one-element arrays for single
//! entities, and numeric ids.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};

use h10cm_client::{ApiError, H10Client, NoAuth, OrderSubmitter, QueryKey, StaticToken, TokenSource};
use h10cm_core::{ServiceError, TrackerConfig};
use h10cm_inventory::{CartItem, CartStore};
use h10cm_tracking::model::{ProjectStatus, StepStatus};
use h10cm_tracking::store::UnitStore;
use h10cm_tracking::{partition, BatchApplier, CreateUnits};

// =====================================================================
// Fake backend
// =====================================================================

#[derive(Default)]
struct Backend {
    /// item_id -> (project_id, unit json)
    units: Mutex<BTreeMap<u64, (String, Value)>>,
    transactions: Mutex<Vec<Value>>,
    created_items: Mutex<Vec<Value>>,
    project_status: Mutex<BTreeMap<String, String>>,
    unit_list_hits: AtomicUsize,
    step_list_hits: AtomicUsize,
}

type Shared = Arc<Backend>;

fn id_of(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn not_found(what: &str) -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": format!("{what} not found") }))).into_response()
}

async fn list_projects(State(b): State<Shared>) -> Json<Value> {
    let status = b.project_status.lock().unwrap().clone();
    let s = |id: &str, default: &str| status.get(id).cloned().unwrap_or_else(|| default.to_string());
    // Bare array, deliberately unsorted.
    Json(json!([
        { "project_id": 3, "project_name": "Zeta sensor", "project_type": "ASSY", "status": s("3", "Active") },
        { "project_id": 1, "project_name": "PR board", "project_type": "PR", "status": s("1", "Planning") },
        { "project_id": 2, "project_name": "Archive", "project_type": "PR", "status": s("2", "Archived") },
        { "project_id": 4, "project_name": "Alpha kit", "project_type": "PR", "status": s("4", "Active") }
    ]))
}

async fn get_project(Path(id): Path<String>, State(b): State<Shared>) -> Response {
    if id != "1" {
        return not_found("project");
    }
    let status = b.project_status.lock().unwrap().get("1").cloned().unwrap_or("Planning".into());
    // One-element array for a single entity.
    Json(json!([{ "project_id": 1, "project_name": "PR board", "project_type": "PR", "status": status }]))
        .into_response()
}

async fn update_project(Path(id): Path<String>, State(b): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    if let Some(status) = body["status"].as_str() {
        b.project_status.lock().unwrap().insert(id, status.to_string());
    }
    Json(json!({ "message": "updated" }))
}

async fn list_steps(Path(_id): Path<String>, State(b): State<Shared>) -> Json<Value> {
    b.step_list_hits.fetch_add(1, Ordering::SeqCst);
    Json(json!({ "data": [
        { "step_id": 11, "step_name": "Test", "step_order": 2 },
        { "step_id": 10, "step_name": "Assembly", "step_order": 1 }
    ]}))
}

async fn delete_step(Path((_pid, _sid)): Path<(String, String)>) -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn list_units(Path(pid): Path<String>, State(b): State<Shared>) -> Json<Value> {
    b.unit_list_hits.fetch_add(1, Ordering::SeqCst);
    let units: Vec<Value> = b
        .units
        .lock()
        .unwrap()
        .values()
        .filter(|(p, _)| *p == pid)
        .map(|(_, u)| u.clone())
        .collect();
    Json(json!({ "data": units }))
}

async fn create_unit(Path(pid): Path<String>, State(b): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut units = b.units.lock().unwrap();
    let serial = body["unit_serial_number"].clone();
    if units.values().any(|(p, u)| *p == pid && u["unit_serial_number"] == serial) {
        return (StatusCode::CONFLICT, Json(json!({ "error": "Serial number already exists" }))).into_response();
    }
    let id = units.keys().max().copied().unwrap_or(100) + 1;
    let mut unit = body.clone();
    unit["item_id"] = json!(id);
    unit["is_shipped"] = json!(0);
    units.insert(id, (pid, unit));
    (StatusCode::CREATED, Json(json!({ "data": { "item_id": id } }))).into_response()
}

async fn get_unit(Path(id): Path<u64>, State(b): State<Shared>) -> Response {
    match b.units.lock().unwrap().get(&id) {
        Some((_, u)) => Json(u.clone()).into_response(),
        None => not_found("tracked item"),
    }
}

async fn ship_unit(Path(id): Path<u64>, State(b): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut units = b.units.lock().unwrap();
    let Some((_, unit)) = units.get_mut(&id) else {
        return not_found("tracked item");
    };
    unit["is_shipped"] = body["is_shipped"].clone();
    unit["shipped_date"] = body["shipped_date"].clone();
    Json(json!({ "message": "ok" })).into_response()
}

async fn update_unit_step(
    Path((id, step_id)): Path<(u64, String)>,
    State(b): State<Shared>,
    Json(body): Json<Value>,
) -> Response {
    let mut units = b.units.lock().unwrap();
    let Some((_, unit)) = units.get_mut(&id) else {
        return not_found("tracked item");
    };
    let statuses = unit["step_statuses"].as_array_mut().expect("statuses");
    let Some(entry) = statuses.iter_mut().find(|s| id_of(&s["stepId"]) == step_id) else {
        return (StatusCode::BAD_REQUEST, Json(json!({ "message": "Invalid step" }))).into_response();
    };
    entry["status"] = body["status"].clone();
    for key in ["completedDate", "completedBy"] {
        if let Some(v) = body.get(key) {
            entry[key] = v.clone();
        }
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn list_inventory() -> Json<Value> {
    Json(json!([
        { "inventory_item_id": 1, "item_name": "Screw", "unit_of_measure": "pcs", "current_stock_level": 500, "reorder_point": 100 },
        { "inventory_item_id": 2, "item_name": "Solder", "unit_of_measure": "g", "current_stock_level": "20", "reorder_point": 50, "cost_per_unit": "0.10" }
    ]))
}

async fn create_inventory_item(State(b): State<Shared>, Json(body): Json<Value>) -> Response {
    if body["item_name"] == "Rejected part" {
        return (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "error": "part number required" }))).into_response();
    }
    b.created_items.lock().unwrap().push(body);
    (StatusCode::CREATED, Json(json!({ "data": { "inventory_item_id": 9 } }))).into_response()
}

async fn post_transaction(Path(id): Path<String>, State(b): State<Shared>, Json(mut body): Json<Value>) -> Json<Value> {
    body["path_id"] = json!(id);
    b.transactions.lock().unwrap().push(body);
    Json(json!({ "message": "recorded" }))
}

async fn health(headers: HeaderMap) -> Json<Value> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    Json(json!({ "status": "ok", "authorization": auth }))
}

struct TestServer {
    base_url: String,
    backend: Shared,
}

async fn start_test_server() -> TestServer {
    let backend: Shared = Arc::new(Backend::default());
    let app = Router::new()
        .route("/api/projects", get(list_projects))
        .route("/api/projects/{id}", get(get_project).put(update_project))
        .route("/api/projects/{id}/steps", get(list_steps))
        .route("/api/projects/{id}/steps/{step_id}", axum::routing::delete(delete_step))
        .route("/api/projects/{id}/tracked-items", get(list_units).post(create_unit))
        .route("/api/tracked-items/{id}", get(get_unit).put(ship_unit))
        .route("/api/tracked-items/{id}/steps/{step_id}", put(update_unit_step))
        .route("/api/inventory-items", get(list_inventory).post(create_inventory_item))
        .route("/api/inventory-items/{id}/transactions", post(post_transaction))
        .route("/api/health", get(health))
        .with_state(backend.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        base_url: format!("http://{addr}/api"),
        backend,
    }
}

fn client_for(server: &TestServer, token: Arc<dyn TokenSource>) -> H10Client {
    let config = TrackerConfig {
        server: server.base_url.clone(),
        ..TrackerConfig::default()
    };
    H10Client::new(&config, token).unwrap()
}

async fn seed_units(client: &Arc<H10Client>, quantity: usize) -> Vec<String> {
    let catalog = client.step_catalog("1").await.unwrap();
    let report = BatchApplier::new(client.clone())
        .create_units(CreateUnits {
            project_id: "1",
            catalog: &catalog,
            quantity,
            start_serial: "PR-001",
            pcb_start_serial: None,
        })
        .await
        .unwrap();
    assert!(report.is_complete_success(), "{:?}", report.failed);
    let mut ids = report.succeeded;
    ids.sort();
    ids
}

// =====================================================================
// Tests
// =====================================================================

#[tokio::test]
async fn decodes_every_envelope_shape() {
    let server = start_test_server().await;
    let client = client_for(&server, Arc::new(NoAuth));

    let projects = client.list_projects().await.unwrap();
    let names: Vec<_> = projects.iter().map(|p| p.project_name.as_str()).collect();
    assert_eq!(names, ["Alpha kit", "Zeta sensor", "PR board", "Archive"]);

    let project = client.get_project("1").await.unwrap();
    assert_eq!(project.project_id, "1");
    assert_eq!(project.status, ProjectStatus::Planning);

    let catalog = client.step_catalog("1").await.unwrap();
    let order: Vec<_> = catalog.iter().map(|s| s.step_id.as_str()).collect();
    assert_eq!(order, ["10", "11"]);

    let inventory = client.list_inventory().await.unwrap();
    assert_eq!(inventory[1].current_stock_level, 20);
    let low = client.low_stock().await.unwrap();
    assert_eq!(low.len(), 1);
    assert_eq!(low[0].item_name, "Solder");
}

#[tokio::test]
async fn reads_are_cached_until_a_mutation() {
    let server = start_test_server().await;
    let client = Arc::new(client_for(&server, Arc::new(NoAuth)));
    let ids = seed_units(&client, 2).await;

    let before = client.list_units("1").await.unwrap();
    client.list_units("1").await.unwrap();
    assert_eq!(server.backend.unit_list_hits.load(Ordering::SeqCst), 1);
    assert!(before.iter().all(|u| u.status_of("10") == StepStatus::NotStarted));
    assert!(client.cache().contains(&QueryKey::TrackedItems("1".into())).await);

    let applier = BatchApplier::new(client.clone());
    let report = applier.apply_status(&ids, "10", StepStatus::Complete, "Alice").await;
    assert!(report.is_complete_success());

    let after = client.list_units("1").await.unwrap();
    assert_eq!(server.backend.unit_list_hits.load(Ordering::SeqCst), 2);
    for unit in &after {
        let entry = unit.step_status("10").unwrap();
        assert_eq!(entry.status, StepStatus::Complete);
        assert_eq!(entry.completed_by.as_deref(), Some("Alice"));
        assert!(entry.completed_date.is_some());
    }
}

#[tokio::test]
async fn step_delete_drops_every_step_list() {
    let server = start_test_server().await;
    let client = client_for(&server, Arc::new(NoAuth));
    client.list_steps("1").await.unwrap();
    client.list_steps("2").await.unwrap();
    client.list_steps("1").await.unwrap();
    assert_eq!(server.backend.step_list_hits.load(Ordering::SeqCst), 2);

    client.delete_step("1", "11").await.unwrap();
    client.list_steps("2").await.unwrap();
    assert_eq!(server.backend.step_list_hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn project_status_update_invalidates_project_reads() {
    let server = start_test_server().await;
    let client = client_for(&server, Arc::new(NoAuth));
    assert_eq!(client.get_project("1").await.unwrap().status, ProjectStatus::Planning);

    client.set_project_status("1", &ProjectStatus::Active).await.unwrap();
    assert_eq!(client.get_project("1").await.unwrap().status, ProjectStatus::Active);
    let first = client.list_projects().await.unwrap();
    assert_eq!(first[0].project_name, "Alpha kit");
    assert_eq!(first[1].project_name, "PR board");
}

#[tokio::test]
async fn ship_is_gated_and_idempotent_end_to_end() {
    let server = start_test_server().await;
    let client = Arc::new(client_for(&server, Arc::new(NoAuth)));
    let ids = seed_units(&client, 2).await;
    let applier = BatchApplier::new(client.clone());

    applier.apply_status(&ids[..1], "10", StepStatus::Complete, "Bob").await;
    applier.apply_status(&ids[..1], "11", StepStatus::NotApplicable, "Bob").await;

    let report = applier.mark_shipped(&ids).await;
    assert_eq!(report.succeeded, [ids[0].clone()]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].id, ids[1]);

    let shipped = client.get_unit(&ids[0]).await.unwrap();
    assert!(shipped.is_shipped);
    let again = applier.mark_shipped(&ids[..1]).await;
    assert!(again.is_complete_success());
    let still = UnitStore::get_unit(client.as_ref(), &ids[0]).await.unwrap();
    assert_eq!(still.shipped_date, shipped.shipped_date);

    let buckets = partition(&client.list_units("1").await.unwrap());
    assert_eq!(buckets.shipped.len(), 1);
    assert_eq!(buckets.in_progress.len(), 1);
}

#[tokio::test]
async fn maps_backend_errors() {
    let server = start_test_server().await;
    let client = Arc::new(client_for(&server, Arc::new(NoAuth)));

    match client.get_unit("999").await {
        Err(ApiError::Server { status, message }) => {
            assert_eq!(status, 404);
            assert_eq!(message, "tracked item not found");
        }
        other => panic!("unexpected: {other:?}"),
    }
    let err = UnitStore::get_unit(client.as_ref(), "999").await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    seed_units(&client, 1).await;
    let catalog = client.step_catalog("1").await.unwrap();
    let report = BatchApplier::new(client.clone())
        .create_units(CreateUnits {
            project_id: "1",
            catalog: &catalog,
            quantity: 2,
            start_serial: "PR-001",
            pcb_start_serial: None,
        })
        .await
        .unwrap();
    assert_eq!(report.succeeded.len(), 1);
    assert_eq!(report.failed[0].id, "PR-001");
    assert_eq!(report.failed[0].error, ServiceError::Conflict("Serial number already exists".into()));
}

#[tokio::test]
async fn unreachable_backend_is_unavailable() {
    let config = TrackerConfig {
        server: "http://127.0.0.1:1/api".into(),
        ..TrackerConfig::default()
    };
    let client = H10Client::new(&config, Arc::new(NoAuth)).unwrap();
    let err = client.list_projects().await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_)));
    assert_eq!(ServiceError::from(err).error_code(), "UNAVAILABLE");
}

#[tokio::test]
async fn attaches_bearer_token() {
    let server = start_test_server().await;
    let client = client_for(&server, Arc::new(StaticToken::new("tok-42")));
    let health = client.health().await.unwrap();
    assert_eq!(health.status, "ok");
    assert_eq!(health.details["authorization"], "Bearer tok-42");
}

#[tokio::test]
async fn cart_submission_posts_orders() {
    let server = start_test_server().await;
    let client = client_for(&server, Arc::new(NoAuth));
    let dir = tempfile::tempdir().unwrap();
    let cart = CartStore::open(&dir.path().join("cart.redb")).unwrap();

    let inventory = client.list_inventory().await.unwrap();
    cart.add(CartItem::reorder(&inventory[1], 200)).unwrap();
    cart.add(CartItem::new_part("Heat sink", "pcs", 10)).unwrap();
    let rejected = cart.add(CartItem::new_part("Rejected part", "pcs", 1)).unwrap();

    let result = cart.submit(&OrderSubmitter::new(&client, "Carol")).await.unwrap();
    assert!(!result.success);
    assert_eq!(result.successful_items.len(), 2);
    assert_eq!(result.failed_items[0].cart_item_id, rejected.id);
    assert_eq!(result.failed_items[0].error, "part number required");

    let txs = server.backend.transactions.lock().unwrap().clone();
    assert_eq!(txs.len(), 1);
    assert_eq!(txs[0]["path_id"], "2");
    assert_eq!(txs[0]["quantity_changed"], 200);
    assert_eq!(txs[0]["transaction_type"], "Reorder");
    assert_eq!(txs[0]["user_name"], "Carol");
    assert_eq!(server.backend.created_items.lock().unwrap()[0]["current_stock_level"], 0);
    assert_eq!(cart.list().unwrap().len(), 1);
}
