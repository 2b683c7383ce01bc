use axum::{
    extract::State,
    http::Method,
    routing::{delete, get, post, put},
    Router,
};
use tracing::{info, instrument, warn};

use super::{
    dto::{CreateUserRequest, UpdateUserRequest},
    repo,
    repo_types::{User, UserFields},
};
use crate::{
    auth::{claims::Role, extractors::AuthUser, password::hash_password_async, RouteRule},
    error::{conflict_or_internal, internal, ApiResponse, AppError, AppResult},
    extract::{AppJson, AppPath, AppQuery},
    pagination::{ListQuery, Page},
    schools,
    state::AppState,
};

const ADMIN: &[Role] = &[Role::Admin];
const STAFF: &[Role] = &[Role::Admin, Role::Teacher];
const EVERYONE: &[Role] = &[Role::Admin, Role::Teacher, Role::EndUser];

const TAKEN: &str = "Email already taken";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/user/create", post(create))
        .route("/api/user/all", get(all))
        .route("/api/user/view/:id", get(show))
        .route("/api/user/edit/:id", put(update))
        .route("/api/user/remove/:id", delete(remove))
}

pub fn policies() -> Vec<RouteRule> {
    vec![
        RouteRule::new(Method::POST, "/api/user/create", ADMIN),
        RouteRule::new(Method::GET, "/api/user/all", STAFF),
        RouteRule::new(Method::GET, "/api/user/view/:id", EVERYONE),
        RouteRule::new(Method::PUT, "/api/user/edit/:id", ADMIN),
        RouteRule::new(Method::DELETE, "/api/user/remove/:id", ADMIN),
    ]
}

fn not_found() -> AppError {
    AppError::NotFound("User detail not found.".into())
}

async fn ensure_school(state: &AppState, school_id: Option<i64>, err: &'static str) -> AppResult<()> {
    let Some(school_id) = school_id else {
        return Ok(());
    };
    if schools::repo::exists(&state.db, school_id)
        .await
        .map_err(internal(err))?
    {
        Ok(())
    } else {
        warn!(school_id, "user references a missing school");
        Err(AppError::Conflict("School detail not found.".into()))
    }
}

#[instrument(skip(state, payload))]
pub async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppJson(payload): AppJson<CreateUserRequest>,
) -> AppResult<ApiResponse<()>> {
    payload.validate()?;
    const ERR: &str = "An error occurred while creating the user.";
    let email = payload.normalized_email();

    if repo::email_taken(&state.db, &email, None)
        .await
        .map_err(internal(ERR))?
    {
        warn!(%email, "email already taken");
        return Err(AppError::Conflict(TAKEN.into()));
    }
    ensure_school(&state, payload.school_id, ERR).await?;

    let hash = hash_password_async(payload.password.clone())
        .await
        .map_err(internal(ERR))?;
    let fields = UserFields {
        name: payload.name.trim(),
        email: &email,
        address: &payload.address,
        role: payload.role,
        school_id: payload.school_id,
        is_active: payload.is_active,
    };
    let id = repo::insert(&state.db, &fields, &hash, Some(user.id))
        .await
        .map_err(conflict_or_internal(TAKEN, ERR))?;

    info!(user_id = id, role = ?payload.role, "user created");
    Ok(ApiResponse::created("User detail added successfully."))
}

#[instrument(skip(state))]
pub async fn all(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ListQuery>,
) -> AppResult<ApiResponse<Page<User>>> {
    let params = query.resolve(repo::SORTABLE)?;
    let (records, total) = repo::list(&state.db, &params)
        .await
        .map_err(internal("An error occurred while fetching the users."))?;
    Ok(ApiResponse::ok(
        "User's details fetched successfully.",
        Page::new(records, total, &params),
    ))
}

#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> AppResult<ApiResponse<User>> {
    let user = repo::find(&state.db, id)
        .await
        .map_err(internal("An error occurred while fetching the user."))?
        .ok_or_else(not_found)?;
    Ok(ApiResponse::ok("User detail fetched successfully.", user))
}

#[instrument(skip(state, payload))]
pub async fn update(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppPath(id): AppPath<i64>,
    AppJson(payload): AppJson<UpdateUserRequest>,
) -> AppResult<ApiResponse<()>> {
    payload.validate()?;
    const ERR: &str = "An error occurred while updating the user.";
    let email = payload.normalized_email();

    if !repo::exists(&state.db, id).await.map_err(internal(ERR))? {
        return Err(not_found());
    }
    if repo::email_taken(&state.db, &email, Some(id))
        .await
        .map_err(internal(ERR))?
    {
        return Err(AppError::Conflict(TAKEN.into()));
    }
    ensure_school(&state, payload.school_id, ERR).await?;

    let fields = UserFields {
        name: payload.name.trim(),
        email: &email,
        address: &payload.address,
        role: payload.role,
        school_id: payload.school_id,
        is_active: payload.is_active,
    };
    let touched = repo::update(&state.db, id, &fields, user.id)
        .await
        .map_err(conflict_or_internal(TAKEN, ERR))?;
    if touched == 0 {
        return Err(not_found());
    }

    info!(user_id = id, "user updated");
    Ok(ApiResponse::done("User detail updated successfully."))
}

#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppPath(id): AppPath<i64>,
) -> AppResult<ApiResponse<()>> {
    let touched = repo::soft_delete(&state.db, id, user.id)
        .await
        .map_err(internal("An error occurred while removing the user."))?;
    if touched == 0 {
        return Err(not_found());
    }
    info!(user_id = id, "user removed");
    Ok(ApiResponse::done("User detail removed successfully."))
}
