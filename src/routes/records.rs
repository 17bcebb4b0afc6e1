//! Resource tree routes: `/`, `/:database`, `/:database/:table`, `/:database/:table/:record`.

use crate::handlers::records::{create, delete, list_databases, list_records, list_tables, read, update};
use crate::state::AppState;
use axum::{routing::get, Router};
use tower_http::limit::RequestBodyLimitLayer;

pub fn record_routes(state: AppState, body_limit_bytes: usize) -> Router {
    Router::new()
        .route("/", get(list_databases))
        .route("/:database", get(list_tables))
        .route("/:database/:table", get(list_records).post(create))
        .route("/:database/:table/:record", get(read).put(update).delete(delete))
        .layer(RequestBodyLimitLayer::new(body_limit_bytes))
        .with_state(state)
}
