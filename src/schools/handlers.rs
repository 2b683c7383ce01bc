use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    http::Method,
    routing::{delete, get, post, put},
    Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{SchoolRequest, UploadResponse},
    repo,
    repo_types::School,
};
use crate::{
    auth::{claims::Role, extractors::AuthUser, RouteRule},
    boards,
    error::{conflict_or_internal, internal, ApiResponse, AppError, AppResult},
    extract::{AppJson, AppPath, AppQuery},
    pagination::{ListQuery, Page},
    state::AppState,
};

const ADMIN: &[Role] = &[Role::Admin];

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
const IMAGE_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png"];

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/school/create", post(create))
        .route("/api/school/all", get(all))
        .route("/api/school/view/:id", get(show))
        .route("/api/school/edit/:id", put(update))
        .route("/api/school/remove/:id", delete(remove))
        .route(
            "/api/school/upload",
            // leave room for the multipart framing around the file itself
            post(upload).layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + 64 * 1024)),
        )
}

pub fn policies() -> Vec<RouteRule> {
    vec![
        RouteRule::new(Method::POST, "/api/school/create", ADMIN),
        RouteRule::new(Method::GET, "/api/school/all", ADMIN),
        RouteRule::new(Method::GET, "/api/school/view/:id", ADMIN),
        RouteRule::new(Method::PUT, "/api/school/edit/:id", ADMIN),
        RouteRule::new(Method::DELETE, "/api/school/remove/:id", ADMIN),
        RouteRule::new(Method::POST, "/api/school/upload", ADMIN),
    ]
}

fn not_found() -> AppError {
    AppError::NotFound("School detail not found.".into())
}

async fn ensure_board(state: &AppState, board_id: i64, err: &'static str) -> AppResult<()> {
    if boards::repo::exists(&state.db, board_id)
        .await
        .map_err(internal(err))?
    {
        Ok(())
    } else {
        warn!(board_id, "school references a missing board");
        Err(AppError::Conflict("Board detail not found.".into()))
    }
}

#[instrument(skip(state, payload))]
pub async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppJson(payload): AppJson<SchoolRequest>,
) -> AppResult<ApiResponse<()>> {
    payload.validate()?;
    const ERR: &str = "An error occurred while creating the school.";
    const TAKEN: &str = "School detail already exists.";

    if repo::name_taken(&state.db, payload.name.trim(), None)
        .await
        .map_err(internal(ERR))?
    {
        warn!(name = %payload.name, "school name already taken");
        return Err(AppError::Conflict(TAKEN.into()));
    }
    ensure_board(&state, payload.board_id, ERR).await?;

    let id = repo::insert(&state.db, &payload, user.id)
        .await
        .map_err(conflict_or_internal(TAKEN, ERR))?;

    info!(school_id = id, board_id = payload.board_id, "school created");
    Ok(ApiResponse::created("School detail created successfully."))
}

#[instrument(skip(state))]
pub async fn all(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ListQuery>,
) -> AppResult<ApiResponse<Page<School>>> {
    let params = query.resolve(repo::SORTABLE)?;
    let (records, total) = repo::list(&state.db, &params)
        .await
        .map_err(internal("An error occurred while fetching the schools."))?;
    Ok(ApiResponse::ok(
        "School's details fetched successfully.",
        Page::new(records, total, &params),
    ))
}

#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> AppResult<ApiResponse<School>> {
    let school = repo::find(&state.db, id)
        .await
        .map_err(internal("An error occurred while fetching the school."))?
        .ok_or_else(not_found)?;
    Ok(ApiResponse::ok("School detail fetched successfully.", school))
}

#[instrument(skip(state, payload))]
pub async fn update(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppPath(id): AppPath<i64>,
    AppJson(payload): AppJson<SchoolRequest>,
) -> AppResult<ApiResponse<()>> {
    payload.validate()?;
    const ERR: &str = "An error occurred while updating the school.";
    const TAKEN: &str = "School detail already exists.";

    if !repo::exists(&state.db, id).await.map_err(internal(ERR))? {
        return Err(not_found());
    }
    if repo::name_taken(&state.db, payload.name.trim(), Some(id))
        .await
        .map_err(internal(ERR))?
    {
        return Err(AppError::Conflict(TAKEN.into()));
    }
    ensure_board(&state, payload.board_id, ERR).await?;

    let touched = repo::update(&state.db, id, &payload, user.id)
        .await
        .map_err(conflict_or_internal(TAKEN, ERR))?;
    if touched == 0 {
        return Err(not_found());
    }

    info!(school_id = id, "school updated");
    Ok(ApiResponse::done("School detail updated successfully."))
}

#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppPath(id): AppPath<i64>,
) -> AppResult<ApiResponse<()>> {
    let touched = repo::soft_delete(&state.db, id, user.id)
        .await
        .map_err(internal("An error occurred while removing the school."))?;
    if touched == 0 {
        return Err(not_found());
    }
    info!(school_id = id, "school removed");
    Ok(ApiResponse::done("School detail removed successfully."))
}

/// POST /api/school/upload (multipart, field `file`)
#[instrument(skip(state, mp))]
pub async fn upload(
    State(state): State<AppState>,
    mp: Result<Multipart, MultipartRejection>,
) -> AppResult<ApiResponse<UploadResponse>> {
    const ERR: &str = "An error occurred while uploading school image.";
    let mut mp = mp?;

    while let Some(field) = mp.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let content_type = field.content_type().unwrap_or_default().to_ascii_lowercase();
        if !IMAGE_TYPES.contains(&content_type.as_str()) {
            warn!(%content_type, "rejected school image");
            return Err(AppError::BadRequest(
                "Invalid file type. only jpeg, jpg, and png are allowed.".into(),
            ));
        }
        let original = field.file_name().unwrap_or("image").to_string();
        let body = field.bytes().await?;
        if body.len() > MAX_IMAGE_BYTES {
            return Err(AppError::BadRequest("File too large. Maximum size is 5 MB.".into()));
        }

        let key = stored_name(&original, OffsetDateTime::now_utc(), Uuid::new_v4());
        state
            .storage
            .put_object(&key, body, &content_type)
            .await
            .map_err(internal(ERR))?;

        info!(%key, "school image stored");
        return Ok(ApiResponse::ok(
            "School image uploaded successfully.",
            UploadResponse {
                path: state.storage.public_url(&key),
            },
        ));
    }

    Err(AppError::BadRequest("file is required".into()))
}

/// `<unix-millis>-<uuid>-<name>` where `name` keeps only filename-safe chars.
fn stored_name(original: &str, now: OffsetDateTime, id: Uuid) -> String {
    let millis = now.unix_timestamp_nanos() / 1_000_000;
    let mut name: String = original
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or_default()
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
            _ => '_',
        })
        .take(100)
        .collect();
    if name.trim_matches('.').is_empty() {
        name = "image".into();
    }
    format!("{}-{}-{}", millis, id.simple(), name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn stored_name_is_flat_and_safe() {
        let id = Uuid::nil();
        let at = datetime!(2024-03-01 00:00:00 UTC);
        let name = stored_name("../../etc/my photo.PNG", at, id);
        assert_eq!(
            name,
            format!("{}-{}-my_photo.PNG", 1_709_251_200_000i64, id.simple())
        );
        assert!(!name.contains('/'));
    }

    #[test]
    fn stored_name_falls_back_when_nothing_usable() {
        let name = stored_name("..", datetime!(2024-03-01 00:00:00 UTC), Uuid::nil());
        assert!(name.ends_with("-image"));
    }
}
