//! HTTP surface for the role screen
//!
//! Forms are urlencoded, responses are JSON documents, successful submissions
//! redirect to the role list with 303 See Other.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Settings;
use crate::constants::{access_to_names, names_to_access};
use crate::csrf::{delete_intent, CsrfTokens};
use crate::error::{Result, RolegateError};
use crate::form::RoleForm;
use crate::model::{Permission, Role};
use crate::read::find_default_user_role;
use crate::registry::ControllerRegistry;
use crate::roles::{self, FormOutcome};

/// Header carrying the acting role id
pub const ROLE_HEADER: &str = "x-role-id";

const ROLE_INDEX: &str = "/dashboard/role/";

// ============================================================================
// State
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ControllerRegistry>,
    pub csrf: Arc<CsrfTokens>,
}

impl AppState {
    pub fn new(registry: ControllerRegistry, csrf: CsrfTokens) -> Self {
        AppState { registry: Arc::new(registry), csrf: Arc::new(csrf) }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self::new(settings.controllers.clone(), settings.csrf()?))
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct DeleteForm {
    #[serde(default, rename = "_token")]
    token: String,
}

#[derive(Debug, Deserialize)]
struct AccessForm {
    controller: String,
    /// Comma separated access names, e.g. `view,edit` or `all`
    #[serde(default)]
    access: String,
}

#[derive(Debug, Serialize)]
struct PermissionView {
    #[serde(flatten)]
    permission: Permission,
    access_names: Vec<&'static str>,
}

impl From<Permission> for PermissionView {
    fn from(permission: Permission) -> Self {
        let access_names = access_to_names(permission.access);
        PermissionView { permission, access_names }
    }
}

#[derive(Debug, Serialize)]
struct RoleView {
    id: u64,
    label: String,
    color: String,
    full_color: String,
    icon: String,
    full_icon: String,
    active: bool,
    permissions: Vec<PermissionView>,
}

impl From<Role> for RoleView {
    fn from(role: Role) -> Self {
        RoleView {
            id: role.id,
            full_color: role.attrs.full_color(),
            full_icon: role.attrs.full_icon(),
            label: role.attrs.label,
            color: role.attrs.color,
            icon: role.attrs.icon,
            active: role.attrs.active,
            permissions: role.permissions.into_iter().map(PermissionView::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ShowResponse {
    role: RoleView,
    delete_token: String,
}

#[derive(Debug, Serialize)]
struct FormResponse {
    form: RoleForm,
    role: RoleView,
    errors: Vec<String>,
}

impl FormResponse {
    fn new(role: Role, errors: Vec<String>) -> Self {
        FormResponse { form: RoleForm::from_role(&role), role: role.into(), errors }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    code: u16,
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

// ============================================================================
// Errors
// ============================================================================

impl RolegateError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::AlreadyExists(_) => StatusCode::CONFLICT,
            Self::Validation(_) | Self::Config(_) => StatusCode::BAD_REQUEST,
            Self::NotInitialized
            | Self::AlreadyInitialized(_)
            | Self::AlreadyBootstrapped
            | Self::Corrupted(_)
            | Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RolegateError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            "An internal error occurred".to_string()
        } else {
            self.to_string()
        };
        (status, Json(ErrorResponse { code: status.as_u16(), error })).into_response()
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Acting role: the `x-role-id` header, else the default user role.
/// With neither, id 0 is returned, which holds no rights.
fn actor(headers: &HeaderMap) -> Result<u64> {
    match headers.get(ROLE_HEADER) {
        Some(v) => v
            .to_str()
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .ok_or_else(|| RolegateError::Validation(format!("invalid {} header", ROLE_HEADER))),
        None => Ok(find_default_user_role()?.map(|r| r.id).unwrap_or(0)),
    }
}

fn respond(outcome: FormOutcome) -> Response {
    match outcome {
        FormOutcome::Saved(_) => Redirect::to(ROLE_INDEX).into_response(),
        FormOutcome::Form(role) => Json(FormResponse::new(role, Vec::new())).into_response(),
        FormOutcome::Invalid { role, errors } => {
            (StatusCode::UNPROCESSABLE_ENTITY, Json(FormResponse::new(role, errors))).into_response()
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn index(headers: HeaderMap) -> Result<Json<Vec<RoleView>>> {
    let roles = roles::list(actor(&headers)?)?;
    Ok(Json(roles.into_iter().map(RoleView::from).collect()))
}

async fn new_form(State(state): State<AppState>, headers: HeaderMap) -> Result<Response> {
    Ok(respond(roles::create(actor(&headers)?, &state.registry, None)?))
}

async fn new_submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<RoleForm>,
) -> Result<Response> {
    Ok(respond(roles::create(actor(&headers)?, &state.registry, Some(&form))?))
}

async fn show(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<ShowResponse>> {
    let role = roles::show(actor(&headers)?, id)?;
    Ok(Json(ShowResponse {
        delete_token: state.csrf.issue(&delete_intent(id)),
        role: role.into(),
    }))
}

async fn edit_form(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Response> {
    Ok(respond(roles::edit(actor(&headers)?, &state.registry, id, None)?))
}

async fn edit_submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Form(form): Form<RoleForm>,
) -> Result<Response> {
    Ok(respond(roles::edit(actor(&headers)?, &state.registry, id, Some(&form))?))
}

/// Redirects to the list whether or not the token matched
async fn delete(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    form: Option<Form<DeleteForm>>,
) -> Result<Redirect> {
    let token = form.map(|Form(f)| f.token).unwrap_or_default();
    roles::delete(actor(&headers)?, &state.csrf, id, &token)?;
    Ok(Redirect::to(ROLE_INDEX))
}

async fn set_access(
    headers: HeaderMap,
    Path(id): Path<u64>,
    Form(form): Form<AccessForm>,
) -> Result<Json<PermissionView>> {
    let names: Vec<&str> = form.access.split(',').collect();
    let permission = roles::set_access(actor(&headers)?, id, &form.controller, names_to_access(&names))?;
    Ok(Json(permission.into()))
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/dashboard/role/", get(index))
        .route("/dashboard/role/new", get(new_form).post(new_submit))
        .route("/dashboard/role/:id", get(show).post(delete))
        .route("/dashboard/role/:id/edit", get(edit_form).post(edit_submit))
        .route("/dashboard/role/:id/permission", post(set_access))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
