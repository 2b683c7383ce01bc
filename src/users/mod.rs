mod dto;
pub mod handlers;
pub mod repo;
mod repo_types;

use anyhow::Context;
use axum::Router;
use sqlx::PgPool;
use tracing::info;

use self::repo_types::UserFields;
use crate::{
    auth::{claims::Role, password::hash_password_async, RouteRule},
    config::AdminSeed,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    handlers::routes()
}

pub fn policies() -> Vec<RouteRule> {
    handlers::policies()
}

/// Creates the configured administrator unless a live user already has that
/// email. Returns whether a row was inserted.
pub async fn seed_admin(db: &PgPool, seed: &AdminSeed) -> anyhow::Result<bool> {
    if repo::email_taken(db, &seed.email, None)
        .await
        .context("check admin email")?
    {
        return Ok(false);
    }

    let hash = hash_password_async(seed.password.clone()).await?;
    let fields = UserFields {
        name: "Administrator",
        email: &seed.email,
        address: "-",
        role: Role::Admin,
        school_id: None,
        is_active: 1,
    };
    let id = repo::insert(db, &fields, &hash, None)
        .await
        .context("insert admin")?;
    info!(user_id = id, email = %seed.email, "seeded administrator");
    Ok(true)
}
