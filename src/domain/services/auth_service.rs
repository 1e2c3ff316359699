use std::sync::Arc;
use crate::domain::{
    models::{auth::{Claims, RevokedToken}, user::User},
    ports::AuthRepository
};
use crate::error::AppError;
use crate::config::Config;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::rngs::OsRng;
use uuid::Uuid;
use chrono::{DateTime, Duration, TimeZone, Utc};
use tracing::{debug, error};

pub const TOKEN_AUDIENCE: &str = "workload-dashboard";

/// A verified access token.
#[derive(Debug, Clone)]
pub struct VerifiedToken {
    pub user_id: String,
    pub token_id: String,
    pub expires_at: DateTime<Utc>,
}

pub struct AuthService {
    repo: Arc<dyn AuthRepository>,
    issuer: String,
    expiry: Duration,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl AuthService {
    pub fn new(repo: Arc<dyn AuthRepository>, config: &Config) -> Self {
        let secret = config.jwt_secret.as_bytes();
        Self {
            repo,
            issuer: config.auth_issuer.clone(),
            expiry: Duration::hours(config.jwt_expiry_hours),
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    pub fn hash_password(&self, password: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(format!("password hashing failed: {}", e)))
    }

    pub fn verify_password(&self, password: &str, password_hash: &str) -> Result<bool, AppError> {
        let parsed_hash = PasswordHash::new(password_hash)
            .map_err(|e| AppError::Internal(format!("stored password hash is malformed: {}", e)))?;

        Ok(Argon2::default().verify_password(password.as_bytes(), &parsed_hash).is_ok())
    }

    pub fn issue_token(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            iss: self.issuer.clone(),
            sub: user.id.clone(),
            aud: TOKEN_AUDIENCE.to_string(),
            exp: (now + self.expiry).timestamp() as usize,
            iat: now.timestamp() as usize,
            jti: Uuid::new_v4().to_string(),
            role: user.role.as_str().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| {
                error!("JWT encoding failed: {}", e);
                AppError::Internal("token encoding failed".into())
            })
    }

    /// Checks signature, issuer, audience, expiry and revocation.
    pub async fn verify_token(&self, token: &str) -> Result<VerifiedToken, AppError> {
        let claims = self.decode_claims(token)?;

        if self.repo.is_revoked(&claims.jti).await? {
            debug!("Rejected revoked token {}", claims.jti);
            return Err(AppError::Unauthenticated("Token has been revoked".into()));
        }

        let expires_at = Utc
            .timestamp_opt(claims.exp as i64, 0)
            .single()
            .ok_or_else(|| AppError::Unauthenticated("Invalid token".into()))?;

        Ok(VerifiedToken {
            user_id: claims.sub,
            token_id: claims.jti,
            expires_at,
        })
    }

    pub async fn revoke(&self, token_id: &str, expires_at: DateTime<Utc>) -> Result<(), AppError> {
        self.repo.revoke(&RevokedToken { jti: token_id.to_string(), expires_at }).await
    }

    pub async fn purge_expired_revocations(&self) -> Result<u64, AppError> {
        self.repo.purge_expired(Utc::now()).await
    }

    fn decode_claims(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[TOKEN_AUDIENCE]);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!("Token rejected: {}", e);
                AppError::Unauthenticated("Invalid or expired token".into())
            })
    }
}
