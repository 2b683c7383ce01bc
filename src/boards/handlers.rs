use axum::{
    extract::State,
    http::Method,
    routing::{delete, get, post, put},
    Router,
};
use tracing::{info, instrument, warn};

use super::{dto::BoardRequest, repo, repo_types::Board};
use crate::{
    auth::{claims::Role, extractors::AuthUser, RouteRule},
    error::{conflict_or_internal, internal, ApiResponse, AppError, AppResult},
    extract::{AppJson, AppPath, AppQuery},
    pagination::{ListQuery, Page},
    state::AppState,
};

const ADMIN: &[Role] = &[Role::Admin];

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/board/create", post(create))
        .route("/api/board/all", get(all))
        .route("/api/board/view/:id", get(show))
        .route("/api/board/edit/:id", put(update))
        .route("/api/board/remove/:id", delete(remove))
}

pub fn policies() -> Vec<RouteRule> {
    vec![
        RouteRule::new(Method::POST, "/api/board/create", ADMIN),
        RouteRule::new(Method::GET, "/api/board/all", ADMIN),
        RouteRule::new(Method::GET, "/api/board/view/:id", ADMIN),
        RouteRule::new(Method::PUT, "/api/board/edit/:id", ADMIN),
        RouteRule::new(Method::DELETE, "/api/board/remove/:id", ADMIN),
    ]
}

fn not_found() -> AppError {
    AppError::NotFound("Board detail not found.".into())
}

#[instrument(skip(state, payload))]
pub async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppJson(payload): AppJson<BoardRequest>,
) -> AppResult<ApiResponse<()>> {
    payload.validate()?;
    const ERR: &str = "An error occurred while creating the board.";
    const TAKEN: &str = "Board detail already exists.";

    if repo::name_taken(&state.db, payload.name.trim(), None)
        .await
        .map_err(internal(ERR))?
    {
        warn!(name = %payload.name, "board name already taken");
        return Err(AppError::Conflict(TAKEN.into()));
    }

    let id = repo::insert(&state.db, &payload, user.id)
        .await
        .map_err(conflict_or_internal(TAKEN, ERR))?;

    info!(board_id = id, "board created");
    Ok(ApiResponse::created("Board detail created successfully."))
}

#[instrument(skip(state))]
pub async fn all(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ListQuery>,
) -> AppResult<ApiResponse<Page<Board>>> {
    let params = query.resolve(repo::SORTABLE)?;
    let (records, total) = repo::list(&state.db, &params)
        .await
        .map_err(internal("An error occurred while fetching the boards."))?;
    Ok(ApiResponse::ok(
        "Board's details fetched successfully.",
        Page::new(records, total, &params),
    ))
}

#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> AppResult<ApiResponse<Board>> {
    let board = repo::find(&state.db, id)
        .await
        .map_err(internal("An error occurred while fetching the board."))?
        .ok_or_else(not_found)?;
    Ok(ApiResponse::ok("Board detail fetched successfully.", board))
}

#[instrument(skip(state, payload))]
pub async fn update(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppPath(id): AppPath<i64>,
    AppJson(payload): AppJson<BoardRequest>,
) -> AppResult<ApiResponse<()>> {
    payload.validate()?;
    const ERR: &str = "An error occurred while updating the board.";
    const TAKEN: &str = "Board detail already exists.";

    if !repo::exists(&state.db, id).await.map_err(internal(ERR))? {
        return Err(not_found());
    }
    if repo::name_taken(&state.db, payload.name.trim(), Some(id))
        .await
        .map_err(internal(ERR))?
    {
        return Err(AppError::Conflict(TAKEN.into()));
    }

    let touched = repo::update(&state.db, id, &payload, user.id)
        .await
        .map_err(conflict_or_internal(TAKEN, ERR))?;
    if touched == 0 {
        return Err(not_found());
    }

    info!(board_id = id, "board updated");
    Ok(ApiResponse::done("Board detail updated successfully."))
}

#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppPath(id): AppPath<i64>,
) -> AppResult<ApiResponse<()>> {
    let touched = repo::soft_delete(&state.db, id, user.id)
        .await
        .map_err(internal("An error occurred while removing the board."))?;
    if touched == 0 {
        return Err(not_found());
    }
    info!(board_id = id, "board removed");
    Ok(ApiResponse::done("Board detail removed successfully."))
}
