use std::collections::HashMap;

use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{
    dto::SchoolRequest,
    repo_types::{School, SchoolRow},
};
use crate::{boards, pagination::ListParams};

pub const SORTABLE: &[&str] = &[
    "created_at",
    "id",
    "name",
    "established_year",
    "school_type",
    "total_students",
    "total_teachers",
    "is_active",
];

const COLUMNS: &str = "id, name, address, phone, email, established_year, school_type, \
     board_id, total_students, total_teachers, image, is_active, created_by, created_at";

pub async fn name_taken(db: &PgPool, name: &str, except: Option<i64>) -> sqlx::Result<bool> {
    sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM schools
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
        "SELECT EXISTS (SELECT 1 FROM schools WHERE id = $1 AND is_deleted = 0)",
    )
    .bind(id)
    .fetch_one(db)
    .await
}

pub async fn insert(db: &PgPool, s: &SchoolRequest, actor: i64) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO schools (name, address, phone, email, established_year, school_type,
                             board_id, total_students, total_teachers, image, is_active,
                             created_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING id
        "#,
    )
    .bind(s.name.trim())
    .bind(&s.address)
    .bind(&s.phone)
    .bind(s.email.trim())
    .bind(s.established_year)
    .bind(s.school_type)
    .bind(s.board_id)
    .bind(s.total_students)
    .bind(s.total_teachers)
    .bind(&s.image)
    .bind(s.is_active)
    .bind(actor)
    .fetch_one(db)
    .await
}

pub async fn list(db: &PgPool, params: &ListParams) -> sqlx::Result<(Vec<School>, i64)> {
    let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM schools");
    params.push_filters(&mut count, "");
    let total = count.build_query_scalar::<i64>().fetch_one(db).await?;

    let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM schools", COLUMNS));
    params.push_filters(&mut select, "");
    params.push_page(&mut select, "");
    let rows = select.build_query_as::<SchoolRow>().fetch_all(db).await?;

    Ok((with_boards(db, rows).await?, total))
}

pub async fn find(db: &PgPool, id: i64) -> sqlx::Result<Option<School>> {
    let row = sqlx::query_as::<_, SchoolRow>(&format!(
        "SELECT {} FROM schools WHERE id = $1 AND is_deleted = 0",
        COLUMNS
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;

    match row {
        Some(row) => Ok(with_boards(db, vec![row]).await?.pop()),
        None => Ok(None),
    }
}

/// Attaches each school's board with a single extra query.
async fn with_boards(db: &PgPool, rows: Vec<SchoolRow>) -> sqlx::Result<Vec<School>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let mut ids: Vec<i64> = rows.iter().map(|r| r.board_id).collect();
    ids.sort_unstable();
    ids.dedup();

    let boards: HashMap<i64, boards::Board> = boards::repo::find_many(db, &ids)
        .await?
        .into_iter()
        .map(|b| (b.id, b))
        .collect();

    Ok(rows
        .into_iter()
        .map(|school| {
            let board = boards.get(&school.board_id).cloned();
            School { school, board }
        })
        .collect())
}

pub async fn update(db: &PgPool, id: i64, s: &SchoolRequest, actor: i64) -> sqlx::Result<u64> {
    let done = sqlx::query(
        r#"
        UPDATE schools
        SET name = $2, address = $3, phone = $4, email = $5, established_year = $6,
            school_type = $7, board_id = $8, total_students = $9, total_teachers = $10,
            image = $11, is_active = $12, updated_by = $13, updated_at = now()
        WHERE id = $1 AND is_deleted = 0
        "#,
    )
    .bind(id)
    .bind(s.name.trim())
    .bind(&s.address)
    .bind(&s.phone)
    .bind(s.email.trim())
    .bind(s.established_year)
    .bind(s.school_type)
    .bind(s.board_id)
    .bind(s.total_students)
    .bind(s.total_teachers)
    .bind(&s.image)
    .bind(s.is_active)
    .bind(actor)
    .execute(db)
    .await?;
    Ok(done.rows_affected())
}

pub async fn soft_delete(db: &PgPool, id: i64, actor: i64) -> sqlx::Result<u64> {
    let done = sqlx::query(
        r#"
        UPDATE schools
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
