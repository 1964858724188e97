//! libgate REST API Server
//!
//! Run with: cargo run --features server --bin libgate-server
//!
//! Permissions:
//!   GET    /permissions                          - List permissions (by name)
//!   POST   /permissions                          - Create permission
//!   GET    /permissions/:id                      - Get permission
//!   PUT    /permissions/:id                      - Replace permission fields
//!   DELETE /permissions/:id                      - Delete permission and its bindings
//!   GET    /permissions/:id/with-libraries       - Permission plus bound slugs
//!   GET    /permissions-with-libraries           - All permissions plus bound slugs
//!
//! Bindings:
//!   GET    /permissions/:id/libraries            - Bound library slugs
//!   PUT    /permissions/:id/libraries            - Replace bound slugs atomically
//!   POST   /permissions/:id/libraries/:slug      - Bind library
//!   DELETE /permissions/:id/libraries/:slug      - Unbind library
//!   GET    /permissions/:id/users                - Users holding the permission
//!   GET    /permissions/:id/roles                - Roles holding the permission
//!   GET    /users/:username/permissions          - Direct permission ids
//!   POST   /users/:username/permissions/:id      - Assign to user
//!   DELETE /users/:username/permissions/:id      - Revoke from user
//!   GET    /roles/:role/permissions              - Role permission ids
//!   POST   /roles/:role/permissions/:id          - Assign to role
//!   DELETE /roles/:role/permissions/:id          - Revoke from role
//!
//! Decisions:
//!   GET    /access/users/:username/libraries        - Accessible slugs
//!   GET    /access/users/:username/libraries/:slug  - Single library check
//!   GET    /access/users/:username/premium          - Premium chapter check
//!   GET    /access/anonymous/libraries              - Accessible slugs for visitors
//!   GET    /access/anonymous/libraries/:slug        - Single library check for visitors
//!   GET    /access/roles/:role/premium              - Premium chapter check for a role
//!
//! Directory (in-memory users and libraries backing the decisions):
//!   PUT    /directory/users/:username            - Upsert user {role}
//!   DELETE /directory/users/:username            - Remove user
//!   PUT    /directory/libraries/:slug            - Upsert library {enabled}
//!   DELETE /directory/libraries/:slug            - Remove library

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use libgate::{
    AccessError, AccessResolver, MemoryDirectory, NewPermission, Permission, PermissionId, PermissionUpdate,
    PermissionWithLibraries, Role, Store, StoreConfig,
};

// ============================================================================
// Config & State
// ============================================================================

#[derive(Debug, Clone)]
struct ServerConfig {
    bind_address: String,
    directory: Option<PathBuf>,
    request_timeout_secs: u64,
}

impl ServerConfig {
    fn from_env() -> Self {
        Self {
            bind_address: env::var("LIBGATE_BIND").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            directory: env::var("LIBGATE_DIRECTORY").ok().map(PathBuf::from),
            request_timeout_secs: env::var("LIBGATE_REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
        }
    }
}

struct AppState {
    store: Store,
    directory: MemoryDirectory,
}

impl AppState {
    fn resolver(&self) -> AccessResolver<'_, MemoryDirectory, MemoryDirectory> {
        AccessResolver::new(&self.store, &self.directory, &self.directory)
    }
}

type Shared = State<Arc<AppState>>;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
struct SetLibrariesReq {
    libraries: Vec<String>,
}

#[derive(Deserialize)]
struct UpsertUserReq {
    role: String,
}

#[derive(Deserialize)]
struct UpsertLibraryReq {
    enabled: bool,
}

#[derive(Serialize)]
struct Changed {
    changed: bool,
}

#[derive(Serialize)]
struct Decision {
    allowed: bool,
}

#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self { success: true, data: Some(data), error: None }
    }

    fn err(msg: impl Into<String>) -> Self {
        Self { success: false, data: None, error: Some(msg.into()) }
    }
}

type Reply<T> = (StatusCode, Json<ApiResponse<T>>);

// ============================================================================
// Helpers
// ============================================================================

fn status_for(e: &AccessError) -> StatusCode {
    match e {
        AccessError::Validation(_) => StatusCode::BAD_REQUEST,
        e if e.is_not_found() => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn reply<T>(r: libgate::Result<T>) -> Reply<T> {
    match r {
        Ok(v) => (StatusCode::OK, Json(ApiResponse::ok(v))),
        Err(e) => {
            let status = status_for(&e);
            if status == StatusCode::INTERNAL_SERVER_ERROR {
                tracing::error!(error = %e, "request failed");
            }
            (status, Json(ApiResponse::err(e.to_string())))
        }
    }
}

fn changed(r: libgate::Result<bool>) -> Reply<Changed> {
    reply(r.map(|changed| Changed { changed }))
}

fn decision(r: libgate::Result<bool>) -> Reply<Decision> {
    reply(r.map(|allowed| Decision { allowed }))
}

// ============================================================================
// Permission handlers
// ============================================================================

async fn list_permissions(State(s): Shared) -> Reply<Vec<Permission>> {
    reply(s.store.get_permissions())
}

async fn create_permission(State(s): Shared, Json(req): Json<NewPermission>) -> Reply<Permission> {
    reply(s.store.create_permission(req))
}

async fn get_permission(State(s): Shared, Path(id): Path<u64>) -> Reply<Permission> {
    reply(s.store.get_permission(PermissionId(id)))
}

async fn update_permission(
    State(s): Shared,
    Path(id): Path<u64>,
    Json(req): Json<PermissionUpdate>,
) -> Reply<Permission> {
    reply(s.store.update_permission(PermissionId(id), req))
}

async fn delete_permission(State(s): Shared, Path(id): Path<u64>) -> Reply<Changed> {
    changed(s.store.delete_permission(PermissionId(id)))
}

async fn permission_with_libraries(State(s): Shared, Path(id): Path<u64>) -> Reply<PermissionWithLibraries> {
    reply(s.store.get_permission_with_libraries(PermissionId(id)))
}

async fn all_with_libraries(State(s): Shared) -> Reply<Vec<PermissionWithLibraries>> {
    reply(s.store.get_all_permissions_with_libraries())
}

// ============================================================================
// Binding handlers
// ============================================================================

async fn get_libraries(State(s): Shared, Path(id): Path<u64>) -> Reply<Vec<String>> {
    reply(s.store.get_libraries_for_permission(PermissionId(id)))
}

async fn set_libraries(
    State(s): Shared,
    Path(id): Path<u64>,
    Json(req): Json<SetLibrariesReq>,
) -> Reply<Vec<String>> {
    let id = PermissionId(id);
    reply(
        s.store
            .set_libraries_for_permission(id, &req.libraries)
            .and_then(|_| s.store.get_libraries_for_permission(id)),
    )
}

async fn bind_library(State(s): Shared, Path((id, slug)): Path<(u64, String)>) -> Reply<Changed> {
    changed(s.store.bind_permission_to_library(PermissionId(id), &slug))
}

async fn unbind_library(State(s): Shared, Path((id, slug)): Path<(u64, String)>) -> Reply<Changed> {
    changed(s.store.unbind_permission_from_library(PermissionId(id), &slug))
}

async fn users_with_permission(State(s): Shared, Path(id): Path<u64>) -> Reply<Vec<String>> {
    reply(s.store.get_users_with_permission(PermissionId(id)))
}

async fn roles_with_permission(State(s): Shared, Path(id): Path<u64>) -> Reply<Vec<Role>> {
    reply(s.store.get_roles_with_permission(PermissionId(id)))
}

async fn user_permissions(State(s): Shared, Path(username): Path<String>) -> Reply<Vec<PermissionId>> {
    reply(s.store.get_user_permissions(&username))
}

async fn assign_user(State(s): Shared, Path((username, id)): Path<(String, u64)>) -> Reply<Changed> {
    changed(s.store.assign_permission_to_user(&username, PermissionId(id)))
}

async fn revoke_user(State(s): Shared, Path((username, id)): Path<(String, u64)>) -> Reply<Changed> {
    changed(s.store.revoke_permission_from_user(&username, PermissionId(id)))
}

async fn role_permissions(State(s): Shared, Path(role): Path<String>) -> Reply<Vec<PermissionId>> {
    reply(role.parse::<Role>().and_then(|role| s.store.get_role_permissions(role)))
}

async fn assign_role(State(s): Shared, Path((role, id)): Path<(String, u64)>) -> Reply<Changed> {
    changed(role.parse::<Role>().and_then(|role| s.store.assign_permission_to_role(role, PermissionId(id))))
}

async fn revoke_role(State(s): Shared, Path((role, id)): Path<(String, u64)>) -> Reply<Changed> {
    changed(role.parse::<Role>().and_then(|role| s.store.revoke_permission_from_role(role, PermissionId(id))))
}

// ============================================================================
// Decision handlers
// ============================================================================

async fn user_libraries(State(s): Shared, Path(username): Path<String>) -> Reply<Vec<String>> {
    reply(s.resolver().get_accessible_libraries_for_user(&username))
}

async fn user_library(State(s): Shared, Path((username, slug)): Path<(String, String)>) -> Reply<Decision> {
    decision(s.resolver().user_has_library_access(&username, &slug))
}

async fn user_premium(State(s): Shared, Path(username): Path<String>) -> Reply<Decision> {
    decision(s.resolver().user_has_premium_chapter_access(&username))
}

async fn anonymous_libraries(State(s): Shared) -> Reply<Vec<String>> {
    reply(s.resolver().get_accessible_libraries_for_anonymous())
}

async fn anonymous_library(State(s): Shared, Path(slug): Path<String>) -> Reply<Decision> {
    decision(s.resolver().anonymous_has_library_access(&slug))
}

async fn role_premium(State(s): Shared, Path(role): Path<String>) -> Reply<Decision> {
    decision(role.parse::<Role>().and_then(|role| s.resolver().role_has_access(role)))
}

// ============================================================================
// Directory handlers
// ============================================================================

async fn upsert_user(
    State(s): Shared,
    Path(username): Path<String>,
    Json(req): Json<UpsertUserReq>,
) -> Reply<Changed> {
    changed(
        req.role
            .parse::<Role>()
            .and_then(|role| s.directory.insert_user(&username, role))
            .map(|_| true),
    )
}

async fn remove_user(State(s): Shared, Path(username): Path<String>) -> Reply<Changed> {
    changed(Ok(s.directory.remove_user(&username)))
}

async fn upsert_library(
    State(s): Shared,
    Path(slug): Path<String>,
    Json(req): Json<UpsertLibraryReq>,
) -> Reply<Changed> {
    changed(s.directory.upsert_library(&slug, req.enabled).map(|_| true))
}

async fn remove_library(State(s): Shared, Path(slug): Path<String>) -> Reply<Changed> {
    changed(Ok(s.directory.remove_library(&slug)))
}

// ============================================================================
// Main
// ============================================================================

fn router(state: Arc<AppState>, timeout: Duration) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/permissions", get(list_permissions).post(create_permission))
        .route("/permissions/:id", get(get_permission).put(update_permission).delete(delete_permission))
        .route("/permissions/:id/with-libraries", get(permission_with_libraries))
        .route("/permissions-with-libraries", get(all_with_libraries))
        .route("/permissions/:id/libraries", get(get_libraries).put(set_libraries))
        .route("/permissions/:id/libraries/:slug", post(bind_library).delete(unbind_library))
        .route("/permissions/:id/users", get(users_with_permission))
        .route("/permissions/:id/roles", get(roles_with_permission))
        .route("/users/:username/permissions", get(user_permissions))
        .route("/users/:username/permissions/:id", post(assign_user).delete(revoke_user))
        .route("/roles/:role/permissions", get(role_permissions))
        .route("/roles/:role/permissions/:id", post(assign_role).delete(revoke_role))
        .route("/access/users/:username/libraries", get(user_libraries))
        .route("/access/users/:username/libraries/:slug", get(user_library))
        .route("/access/users/:username/premium", get(user_premium))
        .route("/access/anonymous/libraries", get(anonymous_libraries))
        .route("/access/anonymous/libraries/:slug", get(anonymous_library))
        .route("/access/roles/:role/premium", get(role_premium))
        .route("/directory/users/:username", put(upsert_user).delete(remove_user))
        .route("/directory/libraries/:slug", put(upsert_library).delete(remove_library))
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let store_config = StoreConfig::from_env();
    let config = ServerConfig::from_env();
    info!(path = %store_config.path.display(), "opening permission store");
    let store = Store::open(&store_config)?;

    let directory = match &config.directory {
        Some(path) => {
            info!(path = %path.display(), "loading directory seed");
            MemoryDirectory::load(path)?
        }
        None => MemoryDirectory::new(),
    };

    let state = Arc::new(AppState { store, directory });
    let app = router(state, Duration::from_secs(config.request_timeout_secs));

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!("libgate server running at http://{}", config.bind_address);
    axum::serve(listener, app).await?;
    Ok(())
}
