use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::{PgPool, SqlitePool, ConnectOptions};
use tracing::info;
use tracing::log::LevelFilter;

use crate::config::{AdminSeed, Config};
use crate::state::AppState;
use crate::domain::models::user::{Role, User};
use crate::domain::ports::UserRepository;
use crate::domain::services::auth_service::AuthService;
use crate::error::{AppError, StartupError};
use crate::infra::repositories::{
    postgres_auth_repo::PostgresAuthRepo, postgres_user_repo::PostgresUserRepo,
    postgres_workload_repo::PostgresWorkloadRepo,
    sqlite_auth_repo::SqliteAuthRepo, sqlite_user_repo::SqliteUserRepo,
    sqlite_workload_repo::SqliteWorkloadRepo,
};

pub async fn bootstrap_state(config: &Config) -> Result<AppState, StartupError> {
    let database_url = &config.database_url;

    let state = if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        info!("Initializing PostgreSQL connection...");

        let opts: PgConnectOptions = database_url.parse::<PgConnectOptions>()?
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_with(opts)
            .await?;

        run_postgres_migrations(&pool).await?;
        postgres_state(config, pool)
    } else {
        info!("Initializing SQLite connection with WAL Mode...");

        let opts = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await?;

        run_sqlite_migrations(&pool).await?;
        sqlite_state(config, pool)
    };

    if let Some(seed) = &config.admin_seed {
        seed_admin(state.user_repo.as_ref(), &state.auth_service, seed).await?;
    }

    Ok(state)
}

pub fn sqlite_state(config: &Config, pool: SqlitePool) -> AppState {
    let auth_repo = Arc::new(SqliteAuthRepo::new(pool.clone()));
    AppState {
        config: config.clone(),
        user_repo: Arc::new(SqliteUserRepo::new(pool.clone())),
        workload_repo: Arc::new(SqliteWorkloadRepo::new(pool)),
        auth_service: Arc::new(AuthService::new(auth_repo, config)),
    }
}

pub fn postgres_state(config: &Config, pool: PgPool) -> AppState {
    let auth_repo = Arc::new(PostgresAuthRepo::new(pool.clone()));
    AppState {
        config: config.clone(),
        user_repo: Arc::new(PostgresUserRepo::new(pool.clone())),
        workload_repo: Arc::new(PostgresWorkloadRepo::new(pool)),
        auth_service: Arc::new(AuthService::new(auth_repo, config)),
    }
}

/// Creates the configured administrator unless an administrator already exists.
pub async fn seed_admin(
    users: &dyn UserRepository,
    auth: &AuthService,
    seed: &AdminSeed,
) -> Result<(), AppError> {
    if users.count_by_role(Role::Admin).await? > 0 {
        return Ok(());
    }

    if users.find_by_email(&seed.email).await?.is_some()
        || users.find_by_username(&seed.username).await?.is_some()
    {
        return Err(AppError::InvalidOperation(
            "Seed administrator collides with an existing non-admin user".into(),
        ));
    }

    let mut admin = User::new(seed.username.clone(), seed.email.clone(), auth.hash_password(&seed.password)?);
    admin.role = Role::Admin;
    let created = users.create(&admin).await?;

    info!("Seeded administrator account {}", created.id);
    Ok(())
}

pub async fn run_postgres_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations/postgres").run(pool).await
}

pub async fn run_sqlite_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations/sqlite").run(pool).await
}
