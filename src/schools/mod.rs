mod dto;
pub mod handlers;
pub mod repo;
mod repo_types;

pub use repo_types::School;

use axum::Router;

use crate::{auth::RouteRule, state::AppState};

pub fn router() -> Router<AppState> {
    handlers::routes()
}

pub fn policies() -> Vec<RouteRule> {
    handlers::policies()
}
