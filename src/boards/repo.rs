use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{dto::BoardRequest, repo_types::Board};
use crate::pagination::ListParams;

pub const SORTABLE: &[&str] = &["created_at", "id", "name", "established_year", "is_active"];

const COLUMNS: &str =
    "id, name, address, phone, email, established_year, is_active, created_by, created_at";

/// Whether a live board other than `except` already uses `name`.
pub async fn name_taken(db: &PgPool, name: &str, except: Option<i64>) -> sqlx::Result<bool> {
    sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM boards
            WHERE name = $1 AND is_deleted = 0 AND ($2::BIGINT IS NULL OR id <> $2)
        )
        "#,
    )
    .bind(name)
    .bind(except)
    .fetch_one(db)
    .await
}

pub async fn exists(db: &PgPool, id: i64) -> sqlx::Result<bool> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM boards WHERE id = $1 AND is_deleted = 0)",
    )
    .bind(id)
    .fetch_one(db)
    .await
}

pub async fn insert(db: &PgPool, b: &BoardRequest, actor: i64) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO boards (name, address, phone, email, established_year, is_active, created_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id
        "#,
    )
    .bind(b.name.trim())
    .bind(&b.address)
    .bind(&b.phone)
    .bind(b.email.trim())
    .bind(b.established_year)
    .bind(b.is_active)
    .bind(actor)
    .fetch_one(db)
    .await
}

pub async fn list(db: &PgPool, params: &ListParams) -> sqlx::Result<(Vec<Board>, i64)> {
    let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM boards");
    params.push_filters(&mut count, "");
    let total = count.build_query_scalar::<i64>().fetch_one(db).await?;

    let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM boards", COLUMNS));
    params.push_filters(&mut select, "");
    params.push_page(&mut select, "");
    let rows = select.build_query_as::<Board>().fetch_all(db).await?;

    Ok((rows, total))
}

pub async fn find(db: &PgPool, id: i64) -> sqlx::Result<Option<Board>> {
    sqlx::query_as::<_, Board>(&format!(
        "SELECT {} FROM boards WHERE id = $1 AND is_deleted = 0",
        COLUMNS
    ))
    .bind(id)
    .fetch_optional(db)
    .await
}

/// Returns the number of rows touched; 0 means no live board with that id.
pub async fn update(db: &PgPool, id: i64, b: &BoardRequest, actor: i64) -> sqlx::Result<u64> {
    let done = sqlx::query(
        r#"
        UPDATE boards
        SET name = $2, address = $3, phone = $4, email = $5, established_year = $6,
            is_active = $7, updated_by = $8, updated_at = now()
        WHERE id = $1 AND is_deleted = 0
        "#,
    )
    .bind(id)
    .bind(b.name.trim())
    .bind(&b.address)
    .bind(&b.phone)
    .bind(b.email.trim())
    .bind(b.established_year)
    .bind(b.is_active)
    .bind(actor)
    .execute(db)
    .await?;
    Ok(done.rows_affected())
}

pub async fn soft_delete(db: &PgPool, id: i64, actor: i64) -> sqlx::Result<u64> {
    let done = sqlx::query(
        r#"
        UPDATE boards
        SET is_deleted = 1, deleted_by = $2, deleted_at = now()
        WHERE id = $1 AND is_deleted = 0
        "#,
    )
    .bind(id)
    .bind(actor)
    .execute(db)
    .await?;
    Ok(done.rows_affected())
}

/// Boards referenced by schools; soft-deleted boards are included so that
/// a school never loses its board in reads.
pub async fn find_many(db: &PgPool, ids: &[i64]) -> sqlx::Result<Vec<Board>> {
    sqlx::query_as::<_, Board>(&format!("SELECT {} FROM boards WHERE id = ANY($1)", COLUMNS))
        .bind(ids)
        .fetch_all(db)
        .await
}
