use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::auth::claims::Role;

/// Public view of a user; the password hash is never selected.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub address: String,
    pub role: Role,
    pub school_id: Option<i64>,
    pub is_active: i16,
    pub created_by: Option<i64>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Column values shared by insert and update.
pub struct UserFields<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub address: &'a str,
    pub role: Role,
    pub school_id: Option<i64>,
    pub is_active: i16,
}
