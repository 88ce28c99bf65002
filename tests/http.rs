//! HTTP surface tests, driven through the router with `oneshot`.

#![cfg(feature = "server")]

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use rolegate::server::{router, AppState, ROLE_HEADER};
use rolegate::*;
use serde_json::Value;
use std::sync::OnceLock;
use tempfile::TempDir;
use tokio::sync::{Mutex, MutexGuard};
use tower::ServiceExt;

static TEST_DIR: OnceLock<TempDir> = OnceLock::new();

// Held across awaits; `test_lock()` is only taken inside `setup`.
static SERIAL: Mutex<()> = Mutex::const_new(());

const SECRET: &str = "http-test-secret";

fn registry() -> ControllerRegistry {
    ControllerRegistry::new(["UserController", "RoleController"])
}

async fn setup() -> (MutexGuard<'static, ()>, Bootstrap) {
    let serial = SERIAL.lock().await;
    let b = {
        let _db = test_lock();
        let dir = TEST_DIR.get_or_init(|| TempDir::new().unwrap());
        init(dir.path().to_str().unwrap()).unwrap();
        clear_all().unwrap();
        bootstrap(&registry()).unwrap()
    };
    (serial, b)
}

async fn send(req: Request<Body>) -> Response {
    let app = router(AppState::new(registry(), CsrfTokens::new(SECRET).unwrap()));
    app.oneshot(req).await.unwrap()
}

fn get(uri: &str, actor: Option<u64>) -> Request<Body> {
    let mut b = Request::get(uri);
    if let Some(id) = actor {
        b = b.header(ROLE_HEADER, id.to_string());
    }
    b.body(Body::empty()).unwrap()
}

fn post(uri: &str, actor: u64, form: &str) -> Request<Body> {
    Request::post(uri)
        .header(ROLE_HEADER, actor.to_string())
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap()
}

async fn json(resp: Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn redirects_to_index(resp: &Response) -> bool {
    resp.status() == StatusCode::SEE_OTHER && resp.headers()[header::LOCATION] == "/dashboard/role/"
}

// ============================================================================
// Listing and rights
// ============================================================================

#[tokio::test]
async fn health_is_ok() {
    let resp = send(get("/health", None)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json(resp).await["status"], "ok");
}

#[tokio::test]
async fn admin_lists_roles() {
    let (_serial, b) = setup().await;
    let resp = send(get("/dashboard/role/", Some(b.admin.id))).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = json(resp).await;
    let roles = body.as_array().unwrap();
    assert_eq!(roles.len(), 2);
    assert_eq!(roles[0]["label"], "admin");
    assert_eq!(roles[0]["full_color"], "#000000");
    assert_eq!(roles[0]["permissions"].as_array().unwrap().len(), 2);
    assert_eq!(roles[0]["permissions"][0]["access_names"], serde_json::json!(["view", "create", "edit", "delete"]));
}

#[tokio::test]
async fn anonymous_actor_is_forbidden() {
    let (_serial, _b) = setup().await;
    let resp = send(get("/dashboard/role/", None)).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(json(resp).await["code"], 403);
}

#[tokio::test]
async fn malformed_actor_header_is_bad_request() {
    let (_serial, _b) = setup().await;
    let req = Request::get("/dashboard/role/").header(ROLE_HEADER, "abc").body(Body::empty()).unwrap();
    assert_eq!(send(req).await.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_role_is_not_found() {
    let (_serial, b) = setup().await;
    let resp = send(get("/dashboard/role/9999", Some(b.admin.id))).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Create / edit
// ============================================================================

#[tokio::test]
async fn new_form_shows_synchronized_draft() {
    let (_serial, b) = setup().await;
    let resp = send(get("/dashboard/role/new", Some(b.admin.id))).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = json(resp).await;
    assert_eq!(body["role"]["permissions"].as_array().unwrap().len(), 2);
    assert!(body["errors"].as_array().unwrap().is_empty());
    assert_eq!(list_roles().unwrap().len(), 2);
}

#[tokio::test]
async fn valid_submission_redirects_to_index() {
    let (_serial, b) = setup().await;
    let resp = send(post("/dashboard/role/new", b.admin.id, "label=editor&color=00ff00&icon=bi-pen&active=1")).await;
    assert!(redirects_to_index(&resp));

    let editor = find_role("editor").unwrap().unwrap();
    assert!(editor.attrs.active);
    assert_eq!(editor.permissions.len(), 2);
}

#[tokio::test]
async fn unchecked_active_box_saves_inactive_role() {
    let (_serial, b) = setup().await;
    let resp = send(post("/dashboard/role/new", b.admin.id, "label=editor&color=00ff00")).await;
    assert!(redirects_to_index(&resp));
    assert!(!find_role("editor").unwrap().unwrap().attrs.active);
}

#[tokio::test]
async fn invalid_submission_is_unprocessable() {
    let (_serial, b) = setup().await;
    let resp = send(post("/dashboard/role/new", b.admin.id, "label=&color=zz")).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = json(resp).await;
    assert_eq!(body["errors"].as_array().unwrap().len(), 2);
    assert_eq!(body["role"]["permissions"].as_array().unwrap().len(), 2);
    assert_eq!(list_roles().unwrap().len(), 2);
}

#[tokio::test]
async fn edit_round_trip() {
    let (_serial, b) = setup().await;
    let uri = format!("/dashboard/role/{}/edit", b.user.id);

    let resp = send(get(&uri, Some(b.admin.id))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json(resp).await["form"]["label"], DEFAULT_USER_ROLE);

    let resp = send(post(&uri, b.admin.id, "label=ROLE_USER&color=abcdef&active=true")).await;
    assert!(redirects_to_index(&resp));
    assert_eq!(get_role(b.user.id).unwrap().unwrap().attrs.color, "abcdef");
}

#[tokio::test]
async fn set_access_updates_one_permission() {
    let (_serial, b) = setup().await;
    let uri = format!("/dashboard/role/{}/permission", b.user.id);
    let resp = send(post(&uri, b.admin.id, "controller=UserController&access=view,edit")).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = json(resp).await;
    assert_eq!(body["access"], VIEW | EDIT);
    assert_eq!(body["access_names"], serde_json::json!(["view", "edit"]));
    assert_eq!(get_access(b.user.id, "UserController").unwrap(), VIEW | EDIT);
}

// ============================================================================
// Delete
// ============================================================================

#[tokio::test]
async fn delete_with_issued_token_removes_role() {
    let (_serial, b) = setup().await;
    let uri = format!("/dashboard/role/{}", b.user.id);

    let resp = send(get(&uri, Some(b.admin.id))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let token = json(resp).await["delete_token"].as_str().unwrap().to_string();

    let resp = send(post(&uri, b.admin.id, &format!("_token={}", token))).await;
    assert!(redirects_to_index(&resp));
    assert!(get_role(b.user.id).unwrap().is_none());
    assert_eq!(list_controllers().unwrap().len(), 2);
}

#[tokio::test]
async fn delete_with_bad_token_still_redirects() {
    let (_serial, b) = setup().await;
    let uri = format!("/dashboard/role/{}", b.user.id);

    for form in ["_token=deadbeef", ""] {
        let resp = send(post(&uri, b.admin.id, form)).await;
        assert!(redirects_to_index(&resp));
    }
    assert!(get_role(b.user.id).unwrap().is_some());
}

#[tokio::test]
async fn delete_without_rights_is_forbidden() {
    let (_serial, b) = setup().await;
    let uri = format!("/dashboard/role/{}", b.admin.id);
    let token = CsrfTokens::new(SECRET).unwrap().issue(&delete_intent(b.admin.id));

    let resp = send(post(&uri, b.user.id, &format!("_token={}", token))).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert!(get_role(b.admin.id).unwrap().is_some());
}

#[tokio::test]
async fn admin_access_is_not_editable() {
    let (_serial, b) = setup().await;
    let uri = format!("/dashboard/role/{}/permission", b.admin.id);
    let resp = send(post(&uri, b.admin.id, "controller=RoleController&access=view")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(get_access(b.admin.id, "RoleController").unwrap(), ALL);
}
