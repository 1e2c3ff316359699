use axum::{
    extract::{FromRequestParts, FromRef},
    http::{header::AUTHORIZATION, request::Parts},
};
use crate::state::AppState;
use crate::domain::models::user::User;
use crate::error::AppError;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, Span};

/// The authenticated, active user behind a `Bearer` token.
pub struct AuthUser {
    pub user: User,
    pub token_id: String,
    pub token_expires_at: DateTime<Utc>,
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;

        let app_state = <Arc<AppState> as FromRef<S>>::from_ref(state);

        let verified = app_state.auth_service.verify_token(&token).await?;

        let user = app_state.user_repo.find_by_id(&verified.user_id).await?
            .ok_or_else(|| {
                debug!("Token subject {} no longer exists", verified.user_id);
                AppError::Unauthenticated("User no longer exists".into())
            })?;

        if !user.is_active {
            return Err(AppError::Unauthenticated("Account is deactivated".into()));
        }

        Span::current().record("user_id", user.id.as_str());

        Ok(AuthUser {
            user,
            token_id: verified.token_id,
            token_expires_at: verified.expires_at,
        })
    }
}

fn bearer_token(parts: &Parts) -> Result<String, AppError> {
    let header = parts.headers.get(AUTHORIZATION)
        .ok_or_else(AppError::unauthenticated)?
        .to_str()
        .map_err(|_| AppError::Unauthenticated("Malformed Authorization header".into()))?;

    let (scheme, token) = header.split_once(' ')
        .ok_or_else(|| AppError::Unauthenticated("Malformed Authorization header".into()))?;

    if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
        return Err(AppError::Unauthenticated("Malformed Authorization header".into()));
    }

    Ok(token.trim().to_string())
}
