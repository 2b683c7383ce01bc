use sqlx::{PgPool, Postgres, QueryBuilder};

use super::repo_types::{User, UserFields};
use crate::pagination::ListParams;

pub const SORTABLE: &[&str] = &["created_at", "id", "name", "email", "role", "is_active"];

const COLUMNS: &str =
    "id, name, email, address, role, school_id, is_active, created_by, created_at";

/// Whether a live user other than `except` already uses `email`.
pub async fn email_taken(db: &PgPool, email: &str, except: Option<i64>) -> sqlx::Result<bool> {
    sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM users
            WHERE email = $1 AND is_deleted = 0 AND ($2::BIGINT IS NULL OR id <> $2)
        )
        "#,
    )
    .bind(email)
    .bind(except)
    .fetch_one(db)
    .await
}

pub async fn exists(db: &PgPool, id: i64) -> sqlx::Result<bool> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM users WHERE id = $1 AND is_deleted = 0)",
    )
    .bind(id)
    .fetch_one(db)
    .await
}

/// `password_hash` must already be an Argon2 PHC string.
pub async fn insert(
    db: &PgPool,
    u: &UserFields<'_>,
    password_hash: &str,
    actor: Option<i64>,
) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO users (name, email, password, address, role, school_id, is_active, created_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id
        "#,
    )
    .bind(u.name)
    .bind(u.email)
    .bind(password_hash)
    .bind(u.address)
    .bind(u.role)
    .bind(u.school_id)
    .bind(u.is_active)
    .bind(actor)
    .fetch_one(db)
    .await
}

pub async fn list(db: &PgPool, params: &ListParams) -> sqlx::Result<(Vec<User>, i64)> {
    let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users");
    params.push_filters(&mut count, "");
    let total = count.build_query_scalar::<i64>().fetch_one(db).await?;

    let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM users", COLUMNS));
    params.push_filters(&mut select, "");
    params.push_page(&mut select, "");
    let rows = select.build_query_as::<User>().fetch_all(db).await?;

    Ok((rows, total))
}

pub async fn find(db: &PgPool, id: i64) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE id = $1 AND is_deleted = 0",
        COLUMNS
    ))
    .bind(id)
    .fetch_optional(db)
    .await
}

/// Leaves the password untouched.
pub async fn update(db: &PgPool, id: i64, u: &UserFields<'_>, actor: i64) -> sqlx::Result<u64> {
    let done = sqlx::query(
        r#"
        UPDATE users
        SET name = $2, email = $3, address = $4, role = $5, school_id = $6, is_active = $7,
            updated_by = $8, updated_at = now()
        WHERE id = $1 AND is_deleted = 0
        "#,
    )
    .bind(id)
    .bind(u.name)
    .bind(u.email)
    .bind(u.address)
    .bind(u.role)
    .bind(u.school_id)
    .bind(u.is_active)
    .bind(actor)
    .execute(db)
    .await?;
    Ok(done.rows_affected())
}

pub async fn soft_delete(db: &PgPool, id: i64, actor: i64) -> sqlx::Result<u64> {
    let done = sqlx::query(
        r#"
        UPDATE users
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
