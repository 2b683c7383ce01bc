use serde::{Deserialize, Serialize};

/// Role carried by every user; a user has exactly one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
pub enum Role {
    Admin,
    Teacher,
    EndUser,
}

/// Authenticated identity attached to a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: i64,
    pub name: String,
    pub role: Role,
}

/// JWT payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: i64,
    pub name: String,
    pub role: Role,
    pub iat: usize, // issued at (unix timestamp)
    pub exp: usize, // expires at (unix timestamp)
}

impl From<Claims> for Principal {
    fn from(c: Claims) -> Self {
        Self {
            id: c.id,
            name: c.name,
            role: c.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_wire_names() {
        assert_eq!(serde_json::to_string(&Role::EndUser).unwrap(), "\"end_user\"");
        let r: Role = serde_json::from_str("\"teacher\"").unwrap();
        assert_eq!(r, Role::Teacher);
        assert!(serde_json::from_str::<Role>("\"root\"").is_err());
    }
}
