use crate::domain::models::user::{Role, User};
use crate::error::AppError;

pub fn require_role(user: &User, allowed: &[Role]) -> Result<(), AppError> {
    if allowed.contains(&user.role) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!("Role '{}' may not perform this action", user.role)))
    }
}

pub fn require_owner_or_admin(user: &User, owner_id: &str) -> Result<(), AppError> {
    if user.is_admin() || user.id == owner_id {
        Ok(())
    } else {
        Err(AppError::Forbidden("Access denied".into()))
    }
}
