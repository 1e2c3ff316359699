use axum::{
    extract::{FromRequestParts, FromRef, Path},
    http::request::Parts,
};
use crate::api::extractors::auth::AuthUser;
use crate::domain::models::user::Role;
use crate::domain::services::access::{require_owner_or_admin, require_role};
use crate::error::AppError;
use crate::state::AppState;
use std::sync::Arc;

/// Authenticated user holding the `admin` role.
pub struct AdminUser(pub AuthUser);

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = AuthUser::from_request_parts(parts, state).await?;
        require_role(&auth.user, &[Role::Admin])?;
        Ok(AdminUser(auth))
    }
}

/// Authenticated user allowed to read user statistics (admins and managers).
pub struct StatsViewer(pub AuthUser);

impl<S> FromRequestParts<S> for StatsViewer
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = AuthUser::from_request_parts(parts, state).await?;
        require_role(&auth.user, &[Role::Admin, Role::Manager])?;
        Ok(StatsViewer(auth))
    }
}

/// Authenticated user acting on the `{user_id}` path segment, which must be
/// their own id unless they are an admin.
pub struct SelfOrAdmin {
    pub auth: AuthUser,
    pub target_id: String,
}

impl<S> FromRequestParts<S> for SelfOrAdmin
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = AuthUser::from_request_parts(parts, state).await?;

        let Path(target_id) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::invalid_field("userId", &rejection.body_text()))?;

        require_owner_or_admin(&auth.user, &target_id)?;
        Ok(SelfOrAdmin { auth, target_id })
    }
}
