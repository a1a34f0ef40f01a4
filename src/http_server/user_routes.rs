//! Users HTTP Routes
//!
//! Thin adapter over the storage driver. Every user is stored in the
//! `users` collection under its `Name`.
//!
//! | Method | Path       | Success                        |
//! |--------|------------|--------------------------------|
//! | GET    | `/`        | liveness banner                |
//! | POST   | `/process` | `{"users": user}`              |
//! | GET    | `/users`   | `[user, ...]`                  |
//! | DELETE | `/delete`  | `{"message": ..., "user": ...}`|
//!
//! Bodies are decoded by hand so that every decode failure is a 400.
//! Unsupported methods get a 405 from the router.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::json;

use super::models::User;
use crate::driver::{Driver, DriverError, DriverResult};
use crate::observability::SharedLogger;

/// Collection holding user documents
pub const USERS_COLLECTION: &str = "users";

/// Banner returned by `GET /`
pub const BANNER: &str = "filedb server is running\n";

// ==================
// Shared State
// ==================

/// Users service state shared across handlers
pub struct UsersState {
    pub driver: Arc<Driver>,
    pub logger: SharedLogger,
}

impl UsersState {
    pub fn new(driver: Arc<Driver>, logger: SharedLogger) -> Self {
        Self { driver, logger }
    }
}

// ==================
// Router
// ==================

/// Create the users router
pub fn user_routes(state: Arc<UsersState>) -> Router {
    Router::new()
        .route("/", get(banner))
        .route("/process", post(process_user))
        .route("/users", get(list_users))
        .route("/delete", delete(delete_user))
        .with_state(state)
}

// ==================
// Handlers
// ==================

async fn banner() -> &'static str {
    BANNER
}

/// Decode a user, store it, echo it back
async fn process_user(State(state): State<Arc<UsersState>>, body: Bytes) -> Response {
    let user: User = match serde_json::from_slice(&body) {
        Ok(user) => user,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    let driver = Arc::clone(&state.driver);
    let stored = user.clone();
    let result = blocking(move || driver.write(USERS_COLLECTION, &stored.name, &stored)).await;

    match result {
        Ok(()) => Json(json!({ "users": user })).into_response(),
        Err(e) => {
            state.logger.error(
                "USER_WRITE_FAILED",
                &[("name", &user.name), ("error", &e.to_string())],
            );
            driver_error_response(&e)
        }
    }
}

/// Return every stored user
async fn list_users(State(state): State<Arc<UsersState>>) -> Response {
    let driver = Arc::clone(&state.driver);
    let result = blocking(move || driver.read_all_as::<User>(USERS_COLLECTION)).await;

    match result {
        Ok(users) => Json(users).into_response(),
        Err(e) => {
            state
                .logger
                .error("USER_LIST_FAILED", &[("error", &e.to_string())]);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// Delete the user named in the body
async fn delete_user(State(state): State<Arc<UsersState>>, body: Bytes) -> Response {
    let user: User = match serde_json::from_slice(&body) {
        Ok(user) => user,
        Err(_) => return (StatusCode::BAD_REQUEST, "Invalid request body").into_response(),
    };

    let driver = Arc::clone(&state.driver);
    let name = user.name.clone();
    let result = blocking(move || driver.delete(USERS_COLLECTION, &name)).await;

    match result {
        Ok(()) => Json(json!({
            "message": "User deleted successfully",
            "user": user,
        }))
        .into_response(),
        Err(e) => {
            state.logger.error(
                "USER_DELETE_FAILED",
                &[("name", &user.name), ("error", &e.to_string())],
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error deleting user: {}", e),
            )
                .into_response()
        }
    }
}

// ==================
// Helpers
// ==================

/// Run a blocking driver call off the async workers
async fn blocking<T, F>(f: F) -> DriverResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> DriverResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        DriverError::io(
            "driver task did not complete",
            std::io::Error::new(std::io::ErrorKind::Other, e),
        )
    })?
}

fn driver_error_response(err: &DriverError) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, err.to_string()).into_response()
}
