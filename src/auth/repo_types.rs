use sqlx::FromRow;

use super::claims::{Principal, Role};

/// Login view of a user row.
#[derive(Debug, Clone, FromRow)]
pub struct CredentialRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password: String, // Argon2 PHC string
    pub role: Role,
    pub is_active: i16,
    pub is_deleted: i16,
}

impl CredentialRecord {
    pub fn is_usable(&self) -> bool {
        self.is_active == 1 && self.is_deleted == 0
    }

    /// Drops the password hash.
    pub fn into_principal(self) -> Principal {
        Principal {
            id: self.id,
            name: self.name,
            role: self.role,
        }
    }
}
