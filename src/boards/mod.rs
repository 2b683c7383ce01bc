mod dto;
pub mod handlers;
pub mod repo;
mod repo_types;

pub use repo_types::Board;

use crate::{auth::RouteRule, state::AppState};
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::routes()
}

pub fn policies() -> Vec<RouteRule> {
    handlers::policies()
}
