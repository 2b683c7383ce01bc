use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

/// Board as returned to clients; update/delete audit columns are not exposed.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Board {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub established_year: i32,
    pub is_active: i16,
    pub created_by: Option<i64>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
