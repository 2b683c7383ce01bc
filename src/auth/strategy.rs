use std::sync::Arc;

use tracing::{debug, warn};

use super::{claims::Principal, jwt::JwtKeys, password::verify_password_async, repo::CredentialStore};
use crate::error::{internal, AppError};

/// What a caller presents to prove who they are.
pub enum Credentials {
    Local { email: String, password: String },
    Bearer(String),
}

/// Turns either kind of credential into a [`Principal`].
#[derive(Clone)]
pub struct Authenticator {
    store: Arc<dyn CredentialStore>,
    keys: JwtKeys,
}

impl Authenticator {
    pub fn new(store: Arc<dyn CredentialStore>, keys: JwtKeys) -> Self {
        Self { store, keys }
    }

    pub fn keys(&self) -> &JwtKeys {
        &self.keys
    }

    pub async fn authenticate(&self, credentials: Credentials) -> Result<Principal, AppError> {
        match credentials {
            Credentials::Local { email, password } => self.local(&email, password).await,
            Credentials::Bearer(token) => self.bearer(&token),
        }
    }

    async fn local(&self, email: &str, password: String) -> Result<Principal, AppError> {
        let record = self
            .store
            .find_by_email(email)
            .await
            .map_err(internal("An error occurred while user login."))?;

        let Some(record) = record else {
            warn!(email = %email, "login unknown email");
            return Err(AppError::Unauthorized("Email not found.".into()));
        };

        if !record.is_usable() {
            warn!(user_id = record.id, "login on inactive or deleted user");
            return Err(AppError::Unauthorized("User is inactive or deleted.".into()));
        }

        let matched = verify_password_async(password, record.password.clone())
            .await
            .map_err(internal("An error occurred while user login."))?;
        if !matched {
            warn!(user_id = record.id, "login invalid password");
            return Err(AppError::Unauthorized("Password not matched.".into()));
        }

        debug!(user_id = record.id, email = %record.email, "credentials verified");
        Ok(record.into_principal())
    }

    fn bearer(&self, token: &str) -> Result<Principal, AppError> {
        match self.keys.verify(token) {
            Ok(claims) => Ok(claims.into()),
            Err(e) => {
                warn!(error = %e, "invalid bearer token");
                Err(AppError::Unauthorized("Unauthorized".into()))
            }
        }
    }
}
