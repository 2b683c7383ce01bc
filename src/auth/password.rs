use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

fn hash_failure(stage: &'static str) -> impl FnOnce(password_hash::Error) -> anyhow::Error {
    move |e| {
        error!(error = %e, stage, "argon2 failure");
        anyhow::anyhow!("argon2 {}: {}", stage, e)
    }
}

/// Argon2id PHC string with a fresh random salt.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(hash_failure("hash"))
}

/// Argon2's verifier compares digests in constant time. A malformed stored
/// hash is an error, a mismatch is `Ok(false)`.
pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(hash_failure("parse"))?;
    match Argon2::default().verify_password(plain.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(hash_failure("verify")(e)),
    }
}

/// Hashing is CPU-bound; run it off the async workers.
pub async fn hash_password_async(plain: String) -> anyhow::Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&plain)).await?
}

pub async fn verify_password_async(plain: String, hash: String) -> anyhow::Result<bool> {
    tokio::task::spawn_blocking(move || verify_password(&plain, &hash)).await?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_and_mismatching_passwords() {
        let hash = hash_password("secret1").expect("hash");
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("secret1", &hash).expect("verify"));
        assert!(!verify_password("secret2", &hash).expect("verify"));
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        let err = verify_password("anything", "not-a-valid-hash").unwrap_err();
        assert!(err.to_string().starts_with("argon2 parse"));
    }

    #[tokio::test]
    async fn async_variants_agree() {
        let hash = hash_password_async("secret1".into()).await.unwrap();
        assert!(verify_password_async("secret1".into(), hash.clone()).await.unwrap());
        assert!(!verify_password_async("secret2".into(), hash).await.unwrap());
    }
}
