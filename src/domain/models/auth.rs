use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use super::user::PublicUser;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub exp: usize,
    pub iat: usize,
    pub jti: String,
    pub role: String,
}

#[derive(Debug, Clone)]
pub struct RevokedToken {
    pub jti: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
}
