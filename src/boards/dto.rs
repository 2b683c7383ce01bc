use serde::Deserialize;

use crate::{error::AppError, validate::Violations};

/// Body of both `create` and `edit`.
#[derive(Debug, Deserialize)]
pub struct BoardRequest {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub established_year: i32,
    pub is_active: i16,
}

impl BoardRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        Violations::default()
            .not_empty("name", &self.name)
            .not_empty("address", &self.address)
            .not_empty("phone", &self.phone)
            .email("email", &self.email)
            .at_least("established_year", self.established_year.into(), 1900)
            .flag("is_active", self.is_active)
            .finish()
    }
}
