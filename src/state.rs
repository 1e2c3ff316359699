use std::sync::Arc;
use crate::domain::ports::{UserRepository, WorkloadRepository};
use crate::domain::services::auth_service::AuthService;
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub user_repo: Arc<dyn UserRepository>,
    pub workload_repo: Arc<dyn WorkloadRepository>,
    pub auth_service: Arc<AuthService>,
}
