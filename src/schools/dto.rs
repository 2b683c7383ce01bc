use serde::{Deserialize, Serialize};

use crate::{error::AppError, validate::Violations};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "school_type", rename_all = "snake_case")]
pub enum SchoolType {
    Government,
    Private,
    International,
}

/// Body of both `create` and `edit`.
#[derive(Debug, Deserialize)]
pub struct SchoolRequest {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub established_year: i32,
    pub board_id: i64,
    pub school_type: SchoolType,
    pub total_students: i32,
    pub total_teachers: i32,
    #[serde(default)]
    pub image: String,
    pub is_active: i16,
}

impl SchoolRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        Violations::default()
            .not_empty("name", &self.name)
            .not_empty("address", &self.address)
            .not_empty("phone", &self.phone)
            .email("email", &self.email)
            .at_least("established_year", self.established_year.into(), 1900)
            .at_least("total_students", self.total_students.into(), 0)
            .at_least("total_teachers", self.total_teachers.into(), 0)
            .flag("is_active", self.is_active)
            .finish()
    }
}

/// `data` of a successful upload.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub path: String,
}
