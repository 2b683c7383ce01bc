use serde::Deserialize;

use crate::{auth::claims::Role, error::AppError, validate::Violations};

/// Width of the `VARCHAR` name, email and address columns.
const FIELD_MAX: usize = 100;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub address: String,
    pub role: Role,
    pub is_active: i16,
    #[serde(default)]
    pub school_id: Option<i64>,
}

impl CreateUserRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        Violations::default()
            .not_empty("name", &self.name)
            .max_length("name", &self.name, FIELD_MAX)
            .email("email", &self.email)
            .max_length("email", &self.email, FIELD_MAX)
            .length("password", &self.password, 6, 20)
            .not_empty("address", &self.address)
            .max_length("address", &self.address, FIELD_MAX)
            .flag("is_active", self.is_active)
            .finish()
    }

    pub fn normalized_email(&self) -> String {
        self.email.trim().to_lowercase()
    }
}

/// Same as [`CreateUserRequest`] without the password; passwords are not
/// changed through `edit`.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: String,
    pub email: String,
    pub address: String,
    pub role: Role,
    pub is_active: i16,
    #[serde(default)]
    pub school_id: Option<i64>,
}

impl UpdateUserRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        Violations::default()
            .not_empty("name", &self.name)
            .max_length("name", &self.name, FIELD_MAX)
            .email("email", &self.email)
            .max_length("email", &self.email, FIELD_MAX)
            .not_empty("address", &self.address)
            .max_length("address", &self.address, FIELD_MAX)
            .flag("is_active", self.is_active)
            .finish()
    }

    pub fn normalized_email(&self) -> String {
        self.email.trim().to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn short_password_and_bad_email_are_both_reported() {
        let req: CreateUserRequest = serde_json::from_value(json!({
            "name": "Asha",
            "email": "asha-at-example",
            "password": "abc",
            "address": "12 Lake View",
            "role": "teacher",
            "is_active": 1
        }))
        .unwrap();
        match req.validate().unwrap_err() {
            AppError::Validation(v) => assert_eq!(v.len(), 2),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn school_is_optional_and_email_is_normalized() {
        let req: UpdateUserRequest = serde_json::from_value(json!({
            "name": "Asha",
            "email": "  Asha@Example.COM ",
            "address": "12 Lake View",
            "role": "end_user",
            "is_active": 0
        }))
        .unwrap();
        assert!(req.school_id.is_none());
        assert_eq!(req.role, Role::EndUser);
        assert!(req.validate().is_ok());
        assert_eq!(req.normalized_email(), "asha@example.com");
    }

    #[test]
    fn overlong_columns_are_rejected() {
        let long = "x".repeat(101);
        let req: CreateUserRequest = serde_json::from_value(json!({
            "name": long,
            "email": format!("{}@example.com", "a".repeat(95)),
            "password": "secret1",
            "address": long,
            "role": "admin",
            "is_active": 1
        }))
        .unwrap();
        match req.validate().unwrap_err() {
            AppError::Validation(v) => assert_eq!(
                v,
                vec![
                    "name must be shorter than or equal to 100 characters".to_string(),
                    "email must be shorter than or equal to 100 characters".to_string(),
                    "address must be shorter than or equal to 100 characters".to_string(),
                ]
            ),
            other => panic!("unexpected {:?}", other),
        }

        let req: UpdateUserRequest = serde_json::from_value(json!({
            "name": "x".repeat(100),
            "email": "asha@example.com",
            "address": "y".repeat(100),
            "role": "teacher",
            "is_active": 1
        }))
        .unwrap();
        assert!(req.validate().is_ok());
    }

    #[test]
    fn unknown_role_is_rejected() {
        let res = serde_json::from_value::<UpdateUserRequest>(json!({
            "name": "Asha",
            "email": "asha@example.com",
            "address": "12 Lake View",
            "role": "principal",
            "is_active": 1
        }));
        assert!(res.is_err());
    }
}
