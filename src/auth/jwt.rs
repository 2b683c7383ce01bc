use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use super::claims::{Claims, Principal};
use crate::config::JwtConfig;

/// Signing and verification keys plus token lifetime settings.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: TimeDuration,
    enforce_expiry: bool,
}

impl JwtKeys {
    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            ttl: TimeDuration::seconds(cfg.ttl_seconds),
            enforce_expiry: cfg.enforce_expiry,
        }
    }

    pub fn sign(&self, principal: &Principal) -> anyhow::Result<String> {
        self.sign_at(principal, OffsetDateTime::now_utc())
    }

    fn sign_at(&self, principal: &Principal, now: OffsetDateTime) -> anyhow::Result<String> {
        let exp = now + self.ttl;
        let claims = Claims {
            id: principal.id,
            name: principal.name.clone(),
            role: principal.role,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        debug!(user_id = principal.id, role = ?principal.role, "jwt signed");
        Ok(token)
    }

    /// Checks the signature. Expiry is only checked when `JWT_ENFORCE_EXPIRY` is set.
    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = self.enforce_expiry;
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = data.claims.id, role = ?data.claims.role, "jwt verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::Role;

    fn config(secret: &str, enforce_expiry: bool) -> JwtConfig {
        JwtConfig {
            secret: secret.into(),
            expiry: "1h".into(),
            ttl_seconds: 3600,
            enforce_expiry,
        }
    }

    fn principal(role: Role) -> Principal {
        Principal {
            id: 7,
            name: "Asha".into(),
            role,
        }
    }

    #[test]
    fn sign_and_verify() {
        let keys = JwtKeys::from_config(&config("dev-secret", false));
        let token = keys.sign(&principal(Role::Teacher)).expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.id, 7);
        assert_eq!(claims.name, "Asha");
        assert_eq!(claims.role, Role::Teacher);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn expired_token_is_still_accepted_by_default() {
        let keys = JwtKeys::from_config(&config("dev-secret", false));
        let two_days_ago = OffsetDateTime::now_utc() - TimeDuration::days(2);
        let token = keys.sign_at(&principal(Role::Admin), two_days_ago).unwrap();
        let claims = keys.verify(&token).expect("expired token accepted");
        assert!((claims.exp as i64) < OffsetDateTime::now_utc().unix_timestamp());
    }

    #[test]
    fn expired_token_rejected_when_enforced() {
        let keys = JwtKeys::from_config(&config("dev-secret", true));
        let two_days_ago = OffsetDateTime::now_utc() - TimeDuration::days(2);
        let token = keys.sign_at(&principal(Role::Admin), two_days_ago).unwrap();
        assert!(keys.verify(&token).is_err());
        let fresh = keys.sign(&principal(Role::Admin)).unwrap();
        assert!(keys.verify(&fresh).is_ok());
    }

    #[test]
    fn foreign_secret_is_rejected() {
        let ours = JwtKeys::from_config(&config("ours", false));
        let theirs = JwtKeys::from_config(&config("theirs", false));
        let token = theirs.sign(&principal(Role::Admin)).unwrap();
        assert!(ours.verify(&token).is_err());
    }

    #[test]
    fn malformed_token_is_rejected() {
        let keys = JwtKeys::from_config(&config("dev-secret", false));
        assert!(keys.verify("not.a.jwt").is_err());
        assert!(keys.verify("").is_err());
    }
}
