use crate::state::AppState;
use axum::Router;

pub mod claims;
mod dto;
pub mod extractors;
pub mod guard;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod repo;
mod repo_types;
pub mod strategy;

pub use guard::RouteRule;

pub fn public_router() -> Router<AppState> {
    handlers::public_routes()
}

pub fn protected_router() -> Router<AppState> {
    handlers::protected_routes()
}

pub fn policies() -> Vec<RouteRule> {
    handlers::policies()
}
