#![allow(dead_code)]

use workload_backend::{
    api::router::create_router,
    state::AppState,
    config::Config,
    domain::models::user::{Role, User},
    infra::factory::{run_sqlite_migrations, sqlite_state},
};
use sqlx::{sqlite::{SqliteConnectOptions, SqlitePoolOptions}, Pool, Sqlite};
use std::sync::Arc;
use uuid::Uuid;
use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    Router,
};
use std::str::FromStr;
use tower::ServiceExt;
use serde_json::{json, Value};

pub const PASSWORD: &str = "password123";

pub struct TestUser {
    pub id: String,
    pub token: String,
}

pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
}

impl TestApp {
    pub async fn new() -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        run_sqlite_migrations(&pool)
            .await
            .expect("Failed to migrate test db");

        let config = Config {
            database_url: db_url.clone(),
            port: 0,
            jwt_secret: "test-secret".to_string(),
            jwt_expiry_hours: 24,
            auth_issuer: "test-issuer".to_string(),
            admin_seed: None,
            revocation_sweep_secs: 60,
        };

        let state = Arc::new(sqlite_state(&config, pool.clone()));
        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            state,
        }
    }

    /// Sends a request and returns the status and the parsed JSON body (`Null` if empty).
    pub async fn send(&self, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    pub async fn register(&self, username: &str) -> TestUser {
        let (status, body) = self.send("POST", "/api/auth/register", None, Some(json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "password": PASSWORD
        }))).await;

        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

        TestUser {
            id: body["user"]["id"].as_str().unwrap().to_string(),
            token: body["token"].as_str().unwrap().to_string(),
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.send("POST", "/api/auth/login", None, Some(json!({
            "email": email,
            "password": password
        }))).await
    }

    /// Inserts a user with the given role straight into the store, then logs in.
    pub async fn create_user_with_role(&self, username: &str, role: Role) -> TestUser {
        let hash = self.state.auth_service.hash_password(PASSWORD).unwrap();
        let mut user = User::new(username.to_string(), format!("{}@example.com", username), hash);
        user.role = role;
        let created = self.state.user_repo.create(&user).await.unwrap();

        let (status, body) = self.login(&created.email, PASSWORD).await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);

        TestUser {
            id: created.id,
            token: body["token"].as_str().unwrap().to_string(),
        }
    }

    pub async fn create_admin(&self, username: &str) -> TestUser {
        self.create_user_with_role(username, Role::Admin).await
    }

    pub async fn create_entry(&self, token: &str, overrides: Value) -> Value {
        let mut payload = json!({
            "project": "P",
            "task": "Task",
            "taskType": "development",
            "hoursSpent": 4,
            "date": "2024-03-01",
            "status": "planned",
            "priority": "medium"
        });
        if let (Some(base), Some(extra)) = (payload.as_object_mut(), overrides.as_object()) {
            for (k, v) in extra {
                base.insert(k.clone(), v.clone());
            }
        }

        let (status, body) = self.send("POST", "/api/workload", Some(token), Some(payload)).await;
        assert_eq!(status, StatusCode::CREATED, "create entry failed: {}", body);
        body
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_filename));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_filename));
    }
}
