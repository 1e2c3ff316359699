use std::env;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Credentials for the administrator seeded at startup when none exists.
#[derive(Clone, Debug)]
pub struct AdminSeed {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    pub auth_issuer: String,
    pub admin_seed: Option<AdminSeed>,
    pub revocation_sweep_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret = required("JWT_SECRET")?;
        if jwt_secret.trim().is_empty() {
            return Err(ConfigError::Invalid { name: "JWT_SECRET", reason: "must not be empty".into() });
        }

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            port: parsed("PORT", 5000)?,
            jwt_secret,
            jwt_expiry_hours: parsed("JWT_EXPIRY_HOURS", 24)?,
            auth_issuer: env::var("AUTH_ISSUER").unwrap_or_else(|_| "workload-tracker".to_string()),
            admin_seed: admin_seed()?,
            revocation_sweep_secs: parsed("REVOCATION_SWEEP_SECS", 300)?,
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn parsed<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid { name, reason: e.to_string() }),
        Err(_) => Ok(default),
    }
}

fn admin_seed() -> Result<Option<AdminSeed>, ConfigError> {
    let username = env::var("ADMIN_USERNAME").ok();
    let email = env::var("ADMIN_EMAIL").ok();
    let password = env::var("ADMIN_PASSWORD").ok();

    match (username, email, password) {
        (Some(username), Some(email), Some(password)) => Ok(Some(AdminSeed { username, email, password })),
        (None, None, None) => Ok(None),
        _ => Err(ConfigError::Invalid {
            name: "ADMIN_USERNAME/ADMIN_EMAIL/ADMIN_PASSWORD",
            reason: "set all three or none".into(),
        }),
    }
}
