use serde::{Deserialize, Serialize};

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// `data` of a successful login.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}
