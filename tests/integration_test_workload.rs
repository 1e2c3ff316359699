mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn test_create_entry_assigns_owner() {
    let app = TestApp::new().await;
    let alice = app.register("alice").await;

    let body = app.create_entry(&alice.token, json!({
        "project": "P",
        "task": "Implement login",
        "taskType": "development",
        "hoursSpent": 4,
        "date": "2024-03-01",
        "status": "in-progress",
        "priority": "high",
        "tags": ["backend", "auth", "backend-2"]
    })).await;

    assert_eq!(body["project"], "P");
    assert_eq!(body["taskType"], "development");
    assert_eq!(body["status"], "in-progress");
    assert_eq!(body["priority"], "high");
    assert_eq!(body["hoursSpent"].as_f64(), Some(4.0));
    assert_eq!(body["date"], "2024-03-01");
    assert_eq!(body["userId"], alice.id.as_str());
    assert_eq!(body["user"]["username"], "alice");
    assert_eq!(body["tags"], json!(["backend", "auth", "backend-2"]));
    assert_eq!(body["dependencies"], json!([]));
    assert!(body["user"].get("passwordHash").is_none());

    let id = body["id"].as_str().unwrap();
    let (status, fetched) = app.send("GET", &format!("/api/workload/{}", id), Some(&alice.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["tags"], json!(["backend", "auth", "backend-2"]));
    assert_eq!(fetched["user"]["id"], alice.id.as_str());
}

#[tokio::test]
async fn test_create_entry_reports_every_violation() {
    let app = TestApp::new().await;
    let alice = app.register("alice").await;

    let (status, body) = app.send("POST", "/api/workload", Some(&alice.token), Some(json!({
        "project": "P",
        "task": "T",
        "taskType": "coding",
        "hoursSpent": -5,
        "date": "2024-03-01",
        "status": "planned",
        "priority": "urgent"
    }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation failed");
    let fields: Vec<&str> = body["details"].as_array().unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["hoursSpent", "priority", "taskType"]);

    let (status, body) = app.send("POST", "/api/workload", Some(&alice.token), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"].as_array().unwrap().len(), 7);

    let (status, body) = app.send("GET", "/api/workload", Some(&alice.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn test_malformed_body_is_rejected() {
    let app = TestApp::new().await;
    let alice = app.register("alice").await;

    let (status, body) = app.send("POST", "/api/workload", Some(&alice.token), Some(json!({
        "hoursSpent": "four"
    }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "body");
}

#[tokio::test]
async fn test_dependencies_are_deduplicated() {
    let app = TestApp::new().await;
    let alice = app.register("alice").await;
    let first = app.create_entry(&alice.token, json!({})).await;
    let dep = first["id"].as_str().unwrap();

    let body = app.create_entry(&alice.token, json!({
        "dependencies": [dep, dep]
    })).await;
    assert_eq!(body["dependencies"], json!([dep]));

    let (status, _) = app.send("POST", "/api/workload", Some(&alice.token), Some(json!({
        "project": "P",
        "task": "T",
        "taskType": "review",
        "hoursSpent": 1,
        "date": "2024-03-01",
        "status": "planned",
        "priority": "low",
        "dependencies": ["not-an-id"]
    }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_is_scoped_to_caller() {
    let app = TestApp::new().await;
    let admin = app.create_admin("root").await;
    let alice = app.register("alice").await;
    let bob = app.register("bob").await;

    app.create_entry(&alice.token, json!({ "task": "alice-1" })).await;
    app.create_entry(&alice.token, json!({ "task": "alice-2" })).await;
    app.create_entry(&bob.token, json!({ "task": "bob-1" })).await;

    let (status, body) = app.send("GET", "/api/workload", Some(&alice.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    for entry in body["data"].as_array().unwrap() {
        assert_eq!(entry["userId"], alice.id.as_str());
    }

    let (status, _) = app.send("GET", &format!("/api/workload?userId={}", bob.id), Some(&alice.token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.send("GET", "/api/workload", Some(&admin.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 3);

    let (status, body) = app.send("GET", &format!("/api/workload?userId={}", bob.id), Some(&admin.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["task"], "bob-1");
    assert_eq!(body["data"][0]["user"]["username"], "bob");
}

#[tokio::test]
async fn test_list_pagination_orders_by_date_descending() {
    let app = TestApp::new().await;
    let alice = app.register("alice").await;

    for day in 1..=15 {
        app.create_entry(&alice.token, json!({
            "task": format!("day-{}", day),
            "date": format!("2024-03-{:02}", day)
        })).await;
    }

    let (status, body) = app.send("GET", "/api/workload", Some(&alice.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 15);
    assert_eq!(body["page"], 1);
    assert_eq!(body["limit"], 10);
    assert_eq!(body["pages"], 2);
    let first_page = body["data"].as_array().unwrap();
    assert_eq!(first_page.len(), 10);
    assert_eq!(first_page[0]["date"], "2024-03-15");

    let (status, body) = app.send("GET", "/api/workload?page=2&limit=10", Some(&alice.token), None).await;
    assert_eq!(status, StatusCode::OK);
    let dates: Vec<&str> = body["data"].as_array().unwrap()
        .iter()
        .map(|e| e["date"].as_str().unwrap())
        .collect();
    assert_eq!(dates, vec!["2024-03-05", "2024-03-04", "2024-03-03", "2024-03-02", "2024-03-01"]);

    let (status, body) = app.send("GET", "/api/workload?page=3", Some(&alice.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
    assert_eq!(body["total"], 15);

    let (status, _) = app.send("GET", "/api/workload?limit=0", Some(&alice.token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app.send("GET", "/api/workload?page=0", Some(&alice.token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_filters() {
    let app = TestApp::new().await;
    let alice = app.register("alice").await;

    app.create_entry(&alice.token, json!({ "project": "Apollo", "date": "2024-03-01", "status": "completed" })).await;
    app.create_entry(&alice.token, json!({ "project": "Apollo", "date": "2024-03-10", "taskType": "meeting" })).await;
    app.create_entry(&alice.token, json!({ "project": "Gemini", "date": "2024-03-31" })).await;
    app.create_entry(&alice.token, json!({ "project": "Gemini", "date": "2024-04-01" })).await;

    let (_, body) = app.send("GET", "/api/workload?startDate=2024-03-01&endDate=2024-03-31", Some(&alice.token), None).await;
    assert_eq!(body["total"], 3);

    let (_, body) = app.send("GET", "/api/workload?project=Apollo", Some(&alice.token), None).await;
    assert_eq!(body["total"], 2);

    let (_, body) = app.send("GET", "/api/workload?status=completed", Some(&alice.token), None).await;
    assert_eq!(body["total"], 1);

    let (_, body) = app.send("GET", "/api/workload?taskType=meeting", Some(&alice.token), None).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["date"], "2024-03-10");

    let (status, _) = app.send("GET", "/api/workload?status=done", Some(&alice.token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.send("GET", "/api/workload?startDate=2024-04-01&endDate=2024-03-01", Some(&alice.token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_entry_owner_admin_and_stranger() {
    let app = TestApp::new().await;
    let admin = app.create_admin("root").await;
    let alice = app.register("alice").await;
    let bob = app.register("bob").await;

    let entry = app.create_entry(&alice.token, json!({ "tags": ["a"] })).await;
    let uri = format!("/api/workload/{}", entry["id"].as_str().unwrap());

    let (status, body) = app.send("PUT", &uri, Some(&alice.token), Some(json!({
        "status": "completed",
        "hoursSpent": 6.5
    }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "completed");
    assert_eq!(body["hoursSpent"].as_f64(), Some(6.5));
    assert_eq!(body["project"], "P");
    assert_eq!(body["tags"], json!(["a"]));

    let (status, _) = app.send("PUT", &uri, Some(&bob.token), Some(json!({ "status": "blocked" }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.send("PUT", &uri, Some(&admin.token), Some(json!({
        "status": "blocked",
        "blockers": "Waiting on API keys"
    }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "blocked");
    assert_eq!(body["blockers"], "Waiting on API keys");
    assert_eq!(body["userId"], alice.id.as_str());

    let (status, _) = app.send("PUT", &uri, Some(&alice.token), Some(json!({ "hoursSpent": -1 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.send(
        "PUT",
        "/api/workload/00000000-0000-0000-0000-000000000000",
        Some(&admin.token),
        Some(json!({ "status": "blocked" })),
    ).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_entry_requires_owner_or_admin() {
    let app = TestApp::new().await;
    let alice = app.register("alice").await;
    let bob = app.register("bob").await;

    let entry = app.create_entry(&alice.token, json!({})).await;
    let uri = format!("/api/workload/{}", entry["id"].as_str().unwrap());

    let (status, _) = app.send("GET", &uri, Some(&bob.token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.send("GET", "/api/workload/missing", Some(&alice.token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_entry() {
    let app = TestApp::new().await;
    let admin = app.create_admin("root").await;
    let alice = app.register("alice").await;
    let bob = app.register("bob").await;

    let first = app.create_entry(&alice.token, json!({})).await;
    let second = app.create_entry(&alice.token, json!({})).await;
    let first_uri = format!("/api/workload/{}", first["id"].as_str().unwrap());
    let second_uri = format!("/api/workload/{}", second["id"].as_str().unwrap());

    let (status, _) = app.send("DELETE", &first_uri, Some(&bob.token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.send("DELETE", &first_uri, Some(&alice.token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.send("DELETE", &first_uri, Some(&alice.token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.send("DELETE", &second_uri, Some(&admin.token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.send("GET", "/api/workload", Some(&alice.token), None).await;
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn test_rfc3339_date_is_stored_as_calendar_date() {
    let app = TestApp::new().await;
    let alice = app.register("alice").await;

    let body = app.create_entry(&alice.token, json!({ "date": "2024-02-29T23:30:00Z" })).await;
    assert_eq!(body["date"], "2024-02-29");
}

#[tokio::test]
async fn test_explicit_null_clears_description_and_blockers() {
    let app = TestApp::new().await;
    let alice = app.register("alice").await;

    let entry = app.create_entry(&alice.token, json!({
        "description": "x",
        "blockers": "Waiting on API keys"
    })).await;
    let uri = format!("/api/workload/{}", entry["id"].as_str().unwrap());

    let (status, body) = app.send("PUT", &uri, Some(&alice.token), Some(json!({ "status": "blocked" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["description"], "x");
    assert_eq!(body["blockers"], "Waiting on API keys");

    let (status, body) = app.send("PUT", &uri, Some(&alice.token), Some(json!({
        "description": null,
        "blockers": null
    }))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["description"].is_null());
    assert!(body["blockers"].is_null());

    let (_, fetched) = app.send("GET", &uri, Some(&alice.token), None).await;
    assert!(fetched["description"].is_null());
    assert!(fetched["blockers"].is_null());
}
