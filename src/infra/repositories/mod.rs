pub mod sqlite_user_repo;
pub mod sqlite_workload_repo;
pub mod sqlite_auth_repo;

pub mod postgres_user_repo;
pub mod postgres_workload_repo;
pub mod postgres_auth_repo;
