//! Router assembly.

mod common;
mod records;

pub use common::{common_routes, common_routes_with_ready};
pub use records::record_routes;

use crate::state::AppState;
use axum::Router;

/// Health/readiness/version plus the resource tree. Static routes win over `/:database`.
pub fn app(state: AppState, body_limit_bytes: usize) -> Router {
    Router::new()
        .merge(common_routes_with_ready(state.clone()))
        .merge(record_routes(state, body_limit_bytes))
}
