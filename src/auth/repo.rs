use async_trait::async_trait;
use sqlx::PgPool;

use super::repo_types::CredentialRecord;

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<CredentialRecord>>;
}

#[derive(Clone)]
pub struct PgCredentialStore {
    db: PgPool,
}

impl PgCredentialStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    /// A live record wins over soft-deleted ones sharing the same email.
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<CredentialRecord>> {
        let record = sqlx::query_as::<_, CredentialRecord>(
            r#"
            SELECT id, name, email, password, role, is_active, is_deleted
            FROM users
            WHERE email = $1
            ORDER BY is_deleted ASC, id DESC
            LIMIT 1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(record)
    }
}

#[cfg(test)]
pub mod memory {
    use super::*;
    use crate::auth::{claims::Role, password::hash_password};

    /// In-memory store for tests.
    #[derive(Default)]
    pub struct MemoryCredentialStore {
        records: Vec<CredentialRecord>,
    }

    impl MemoryCredentialStore {
        pub fn with_user(
            mut self,
            id: i64,
            email: &str,
            password: &str,
            role: Role,
            is_active: i16,
            is_deleted: i16,
        ) -> Self {
            self.records.push(CredentialRecord {
                id,
                name: format!("user-{}", id),
                email: email.into(),
                password: hash_password(password).expect("hash"),
                role,
                is_active,
                is_deleted,
            });
            self
        }
    }

    #[async_trait]
    impl CredentialStore for MemoryCredentialStore {
        async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<CredentialRecord>> {
            let mut hits: Vec<&CredentialRecord> =
                self.records.iter().filter(|r| r.email == email).collect();
            hits.sort_by_key(|r| (r.is_deleted, -r.id));
            Ok(hits.first().map(|r| (*r).clone()))
        }
    }
}
