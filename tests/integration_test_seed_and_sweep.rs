mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::TestApp;
use workload_backend::{
    background::sweep_revocations,
    config::AdminSeed,
    domain::models::user::Role,
    error::AppError,
    infra::factory::seed_admin,
};

fn seed(username: &str, email: &str) -> AdminSeed {
    AdminSeed {
        username: username.to_string(),
        email: email.to_string(),
        password: "seed-password".to_string(),
    }
}

async fn revoked_count(app: &TestApp) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM revoked_tokens")
        .fetch_one(&app.pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_purge_drops_only_expired_revocations() {
    let app = TestApp::new().await;
    let alice = app.register("alice").await;
    let auth = &app.state.auth_service;

    let live = auth.verify_token(&alice.token).await.unwrap();
    auth.revoke(&live.token_id, live.expires_at).await.unwrap();
    auth.revoke("stale-token-id", Utc::now() - Duration::hours(1)).await.unwrap();
    assert_eq!(revoked_count(&app).await, 2);

    assert_eq!(auth.purge_expired_revocations().await.unwrap(), 1);
    assert_eq!(auth.purge_expired_revocations().await.unwrap(), 0);
    assert_eq!(revoked_count(&app).await, 1);

    // The revocation that has not expired yet still applies.
    assert!(matches!(auth.verify_token(&alice.token).await, Err(AppError::Unauthenticated(_))));
    let (status, _) = app.send("GET", "/api/auth/profile", Some(&alice.token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_background_sweep_purges_expired_revocations() {
    let app = TestApp::new().await;
    let auth = &app.state.auth_service;

    auth.revoke("old-1", Utc::now() - Duration::hours(2)).await.unwrap();
    auth.revoke("old-2", Utc::now() - Duration::minutes(1)).await.unwrap();
    auth.revoke("fresh", Utc::now() + Duration::hours(1)).await.unwrap();

    sweep_revocations(&app.state).await;

    assert_eq!(revoked_count(&app).await, 1);
    assert_eq!(auth.purge_expired_revocations().await.unwrap(), 0);
}

#[tokio::test]
async fn test_seed_admin_is_idempotent_and_can_log_in() {
    let app = TestApp::new().await;
    let admin_seed = seed("boss", "boss@example.com");

    seed_admin(app.state.user_repo.as_ref(), &app.state.auth_service, &admin_seed).await.unwrap();
    seed_admin(app.state.user_repo.as_ref(), &app.state.auth_service, &admin_seed).await.unwrap();

    assert_eq!(app.state.user_repo.count_by_role(Role::Admin).await.unwrap(), 1);

    let (status, body) = app.login("boss@example.com", "seed-password").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["role"], "admin");
    assert_eq!(body["user"]["username"], "boss");
}

#[tokio::test]
async fn test_seed_admin_skips_when_an_admin_exists() {
    let app = TestApp::new().await;
    app.create_admin("root").await;

    seed_admin(app.state.user_repo.as_ref(), &app.state.auth_service, &seed("boss", "boss@example.com"))
        .await
        .unwrap();

    assert_eq!(app.state.user_repo.count_by_role(Role::Admin).await.unwrap(), 1);
    assert!(app.state.user_repo.find_by_username("boss").await.unwrap().is_none());
}

#[tokio::test]
async fn test_seed_admin_rejects_collisions_with_existing_users() {
    let app = TestApp::new().await;
    app.register("alice").await;

    let by_email = seed_admin(
        app.state.user_repo.as_ref(),
        &app.state.auth_service,
        &seed("boss", "alice@example.com"),
    ).await;
    assert!(matches!(by_email, Err(AppError::InvalidOperation(_))));

    let by_username = seed_admin(
        app.state.user_repo.as_ref(),
        &app.state.auth_service,
        &seed("alice", "boss@example.com"),
    ).await;
    assert!(matches!(by_username, Err(AppError::InvalidOperation(_))));

    assert_eq!(app.state.user_repo.count_by_role(Role::Admin).await.unwrap(), 0);
    let (status, body) = app.login("alice@example.com", common::PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["role"], "user");
}
