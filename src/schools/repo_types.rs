use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

use super::dto::SchoolType;
use crate::boards::Board;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SchoolRow {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub established_year: i32,
    pub school_type: SchoolType,
    #[serde(skip_serializing)]
    pub board_id: i64,
    pub total_students: i32,
    pub total_teachers: i32,
    pub image: String,
    pub is_active: i16,
    pub created_by: Option<i64>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// School with its board embedded.
#[derive(Debug, Clone, Serialize)]
pub struct School {
    #[serde(flatten)]
    pub school: SchoolRow,
    pub board: Option<Board>,
}
