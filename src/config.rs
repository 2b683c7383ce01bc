use anyhow::{bail, Context};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    /// Raw expiry as configured, e.g. "1h".
    pub expiry: String,
    pub ttl_seconds: i64,
    pub enforce_expiry: bool,
}

/// First administrator, created at startup when no live user owns the email.
#[derive(Clone, Deserialize)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for AdminSeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSeed")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub jwt: JwtConfig,
    pub host: String,
    pub port: u16,
    pub upload_dir: String,
    pub public_base_url: String,
    pub admin: Option<AdminSeed>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;

        let secret = std::env::var("JWT_SECRET").context("JWT_SECRET is not set")?;
        if secret.trim().is_empty() {
            bail!("JWT_SECRET must not be empty");
        }
        let expiry = std::env::var("JWT_EXPIRY").unwrap_or_else(|_| "1h".into());
        let ttl_seconds = parse_expiry(&expiry)?;
        let enforce_expiry = std::env::var("JWT_ENFORCE_EXPIRY")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let host = std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port = std::env::var("APP_PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(8080);
        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{}", port));

        Ok(Self {
            database_url,
            db_max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(10),
            jwt: JwtConfig {
                secret,
                expiry,
                ttl_seconds,
                enforce_expiry,
            },
            host,
            port,
            upload_dir: std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".into()),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            admin: admin_seed(),
        })
    }
}

fn admin_seed() -> Option<AdminSeed> {
    let email = std::env::var("ADMIN_EMAIL").ok()?.trim().to_lowercase();
    let password = std::env::var("ADMIN_PASSWORD").ok()?;
    if email.is_empty() || password.is_empty() {
        return None;
    }
    Some(AdminSeed { email, password })
}

/// Ten years; keeps `iat + ttl` far inside the representable timestamp range.
const MAX_EXPIRY_SECONDS: i64 = 10 * 365 * 24 * 60 * 60;

/// Parses an expiry such as `"45s"`, `"30m"`, `"1h"`, `"7d"`, `"2w"` into seconds.
/// A bare number is taken as seconds.
pub fn parse_expiry(raw: &str) -> anyhow::Result<i64> {
    let s = raw.trim();
    let split = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    let (digits, unit) = s.split_at(split);
    let amount: i64 = digits
        .parse()
        .with_context(|| format!("invalid JWT_EXPIRY {:?}", raw))?;

    let multiplier = match unit.trim() {
        "" | "s" | "sec" | "secs" => 1,
        "m" | "min" | "mins" => 60,
        "h" | "hr" | "hrs" => 60 * 60,
        "d" | "day" | "days" => 24 * 60 * 60,
        "w" | "week" | "weeks" => 7 * 24 * 60 * 60,
        other => bail!("invalid JWT_EXPIRY unit {:?}", other),
    };
    if amount == 0 {
        bail!("JWT_EXPIRY must be positive");
    }
    match amount.checked_mul(multiplier) {
        Some(seconds) if seconds <= MAX_EXPIRY_SECONDS => Ok(seconds),
        _ => bail!("JWT_EXPIRY {:?} is too large", raw),
    }
}
