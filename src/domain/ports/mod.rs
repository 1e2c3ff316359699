use crate::domain::models::{
    user::{Role, RoleCount, User},
    workload::{PageRequest, WorkloadEntry, WorkloadFilter},
    auth::RevokedToken,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User) -> Result<User, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError>;
    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<User>, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;
    async fn list(&self, role: Option<Role>, is_active: Option<bool>) -> Result<Vec<User>, AppError>;
    async fn update(&self, user: &User) -> Result<User, AppError>;
    async fn update_password(&self, id: &str, password_hash: &str) -> Result<(), AppError>;
    async fn touch_last_login(&self, id: &str, at: DateTime<Utc>) -> Result<(), AppError>;
    async fn count_by_role(&self, role: Role) -> Result<i64, AppError>;
    async fn role_counts(&self) -> Result<Vec<RoleCount>, AppError>;
    async fn delete(&self, id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait WorkloadRepository: Send + Sync {
    async fn create(&self, entry: &WorkloadEntry) -> Result<WorkloadEntry, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<WorkloadEntry>, AppError>;
    /// Returns one page of matching entries (date desc) and the total match count.
    async fn list(&self, filter: &WorkloadFilter, page: PageRequest) -> Result<(Vec<WorkloadEntry>, i64), AppError>;
    /// All entries dated within `[start, end]`, optionally restricted to one owner.
    async fn list_in_range(&self, start: NaiveDate, end: NaiveDate, user_id: Option<&str>) -> Result<Vec<WorkloadEntry>, AppError>;
    async fn update(&self, entry: &WorkloadEntry) -> Result<WorkloadEntry, AppError>;
    async fn delete(&self, id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn revoke(&self, token: &RevokedToken) -> Result<(), AppError>;
    async fn is_revoked(&self, jti: &str) -> Result<bool, AppError>;
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError>;
}
