//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use tower_http::cors::CorsLayer;
use tracing::{debug, error};

use crate::query::{self, JsonRow, QueryError, RouteStop};
use crate::store::RefreshStatus;
use crate::table::TableName;

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/status", get(status))
        .route("/routes", get(list_routes))
        .route("/stops", get(list_stops))
        .route("/trips", get(list_trips))
        .route("/route/:route_id/stops", get(route_stops))
        .route("/debug/zip", get(debug_zip))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Liveness message.
async fn root() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "GTFS schedule API is running".to_string(),
    })
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Refresh metadata: loaded tables, last refresh time, last error.
async fn status(State(state): State<AppState>) -> Json<RefreshStatus> {
    Json(state.store.status().await)
}

async fn list_routes(State(state): State<AppState>) -> Result<Json<Vec<JsonRow>>, AppError> {
    list(&state, TableName::Routes).await
}

async fn list_stops(State(state): State<AppState>) -> Result<Json<Vec<JsonRow>>, AppError> {
    list(&state, TableName::Stops).await
}

async fn list_trips(State(state): State<AppState>) -> Result<Json<Vec<JsonRow>>, AppError> {
    list(&state, TableName::Trips).await
}

async fn list(state: &AppState, name: TableName) -> Result<Json<Vec<JsonRow>>, AppError> {
    let snapshot = state.store.snapshot().await;
    let rows = query::list_table(&snapshot, name)?;
    Ok(Json(rows))
}

/// Ordered stops of the first trip of a route.
async fn route_stops(
    State(state): State<AppState>,
    Path(route_id): Path<String>,
) -> Result<Json<Vec<RouteStop>>, AppError> {
    let snapshot = state.store.snapshot().await;
    let stops = query::stops_for_route(&snapshot, &route_id)?;
    Ok(Json(stops))
}

/// Entry names of the last decoded archive.
async fn debug_zip(State(state): State<AppState>) -> Result<Json<Vec<String>>, AppError> {
    match state.store.archive_entries().await {
        Some(entries) => Ok(Json(entries)),
        None => {
            let message = state
                .store
                .last_error()
                .await
                .unwrap_or_else(|| "no archive has been fetched yet".to_string());
            Err(AppError::Internal { message })
        }
    }
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    NotFound { message: String },
    Internal { message: String },
}

impl From<QueryError> for AppError {
    fn from(e: QueryError) -> Self {
        let message = e.to_string();
        if e.is_not_found() {
            AppError::NotFound { message }
        } else {
            AppError::Internal { message }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        if status.is_server_error() {
            error!(%status, %message, "request failed");
        } else {
            debug!(%status, %message, "request failed");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
