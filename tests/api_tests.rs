use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use dapur::config::Config;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

/// Default API key seeded by migration (must match m20240101_initial.rs)
const DEFAULT_API_KEY: &str = "dapur_default_api_key_please_rotate";
const ADMIN_EMAIL: &str = "admin@example.com";
const ADMIN_PASSWORD: &str = "qwerty12345";

async fn spawn_app() -> Router {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    // A pooled :memory: database is per-connection, so the pool must stay at 1.
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;

    let state = dapur::api::create_app_state_from_config(config)
        .await
        .expect("Failed to create app state");
    dapur::api::router(state)
}

fn build_request(
    method: &str,
    uri: &str,
    api_key: Option<&str>,
    bearer: Option<&str>,
    body: Option<&Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(key) = api_key {
        builder = builder.header("x-api-key", key);
    }
    if let Some(token) = bearer {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }

    match body {
        Some(value) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(serde_json::to_string(value).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    bearer: Option<&str>,
    body: Option<&Value>,
) -> (StatusCode, Value) {
    let request = build_request(method, uri, Some(DEFAULT_API_KEY), bearer, body);
    let response = app.clone().oneshot(request).await.unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, json)
}

/// Sign in and return (access_token, refresh_token).
async fn sign_in(app: &Router, email: &str, password: &str) -> (String, String) {
    let (status, body) = send(
        app,
        "POST",
        "/api/v1/auth/sign-in",
        None,
        Some(&json!({ "email": email, "password": password })),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "sign-in failed: {body}");

    (
        body["data"]["access_token"]["token"]
            .as_str()
            .unwrap()
            .to_string(),
        body["data"]["refresh_token"]["token"]
            .as_str()
            .unwrap()
            .to_string(),
    )
}

async fn sign_up_user(app: &Router, name: &str, email: &str, password: &str) {
    let (status, body) = send(
        app,
        "POST",
        "/api/v1/auth/sign-up",
        None,
        Some(&json!({
            "name": name,
            "email": email,
            "password": password,
            "password_confirmation": password,
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "sign-up failed: {body}");
}

#[tokio::test]
async fn api_key_gate() {
    let app = spawn_app().await;

    let credentials = json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD });

    let response = app
        .clone()
        .oneshot(build_request(
            "POST",
            "/api/v1/auth/sign-in",
            None,
            None,
            Some(&credentials),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(build_request(
            "POST",
            "/api/v1/auth/sign-in",
            Some("wrong-key"),
            None,
            Some(&credentials),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, "POST", "/api/v1/auth/sign-in", None, Some(&credentials)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn sign_in_and_me() {
    let app = spawn_app().await;

    let (access, _refresh) = sign_in(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let (status, body) = send(&app, "GET", "/api/v1/auth/me", Some(&access), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], ADMIN_EMAIL);
    let roles: Vec<&str> = body["data"]["roles"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert!(roles.contains(&"ADMIN"));
    assert!(body["data"].get("password_hash").is_none());
}

#[tokio::test]
async fn sign_in_rejects_wrong_password() {
    let app = spawn_app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/auth/sign-in",
        None,
        Some(&json!({ "email": ADMIN_EMAIL, "password": "not-the-password" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["errors"].as_str().unwrap().contains("email or password"));
}

#[tokio::test]
async fn sign_up_validation_and_duplicates() {
    let app = spawn_app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/auth/sign-up",
        None,
        Some(&json!({
            "name": "",
            "email": "nope",
            "password": "short",
            "password_confirmation": "different",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["name"].is_string());
    assert!(body["errors"]["email"].is_string());
    assert!(body["errors"]["password"].is_string());
    assert!(body["errors"]["password_confirmation"].is_string());

    sign_up_user(&app, "Jane", "jane@example.com", "qwerty12345").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/auth/sign-up",
        None,
        Some(&json!({
            "name": "Jane Again",
            "email": "jane@example.com",
            "password": "qwerty12345",
            "password_confirmation": "qwerty12345",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"].as_str().unwrap().contains("already exists"));
}

#[tokio::test]
async fn refresh_rotates_and_is_single_use() {
    let app = spawn_app().await;

    let (_access, refresh) = sign_in(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/auth/refresh-token",
        None,
        Some(&json!({ "refresh_token": refresh })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let new_access = body["data"]["access_token"]["token"].as_str().unwrap();
    let new_refresh = body["data"]["refresh_token"]["token"].as_str().unwrap();
    assert_ne!(new_refresh, refresh);

    // The new access token works.
    let (status, _) = send(&app, "GET", "/api/v1/auth/me", Some(new_access), None).await;
    assert_eq!(status, StatusCode::OK);

    // Replaying the consumed refresh token fails.
    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/auth/refresh-token",
        None,
        Some(&json!({ "refresh_token": refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // The rotated-in refresh token still works.
    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/auth/refresh-token",
        None,
        Some(&json!({ "refresh_token": new_refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn refresh_rejects_access_token() {
    let app = spawn_app().await;

    let (access, _refresh) = sign_in(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/auth/refresh-token",
        None,
        Some(&json!({ "refresh_token": access })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn sign_out_revokes_pair() {
    let app = spawn_app().await;

    let (access, refresh) = sign_in(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/auth/sign-out",
        Some(&access),
        Some(&json!({ "access_token": access, "refresh_token": refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // The revoked access token is dead even though it hasn't expired.
    let (status, _) = send(&app, "GET", "/api/v1/auth/me", Some(&access), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // So is the refresh token.
    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/auth/refresh-token",
        None,
        Some(&json!({ "refresh_token": refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn sign_out_rejects_someone_elses_tokens() {
    let app = spawn_app().await;

    sign_up_user(&app, "Mallory", "mallory@example.com", "qwerty12345").await;

    let (victim_access, victim_refresh) = sign_in(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let (attacker_access, _) = sign_in(&app, "mallory@example.com", "qwerty12345").await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/auth/sign-out",
        Some(&attacker_access),
        Some(&json!({
            "access_token": victim_access,
            "refresh_token": victim_refresh,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // The victim's pair is untouched.
    let (status, _) = send(&app, "GET", "/api/v1/auth/me", Some(&victim_access), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn admin_routes_require_admin_role() {
    let app = spawn_app().await;

    sign_up_user(&app, "Plain User", "user@example.com", "qwerty12345").await;
    let (user_access, _) = sign_in(&app, "user@example.com", "qwerty12345").await;

    let (status, _) = send(&app, "GET", "/api/v1/admin/tags", Some(&user_access), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (admin_access, _) = sign_in(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let (status, _) = send(&app, "GET", "/api/v1/admin/tags", Some(&admin_access), None).await;
    assert_eq!(status, StatusCode::OK);

    // No bearer token at all.
    let (status, _) = send(&app, "GET", "/api/v1/admin/tags", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn tag_crud_with_slug_dedup() {
    let app = spawn_app().await;
    let (access, _) = sign_in(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    // A batch with colliding names gets suffixed slugs.
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/admin/tags",
        Some(&access),
        Some(&json!({ "name": ["Spicy Food", "spicy   food"] })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    let created = body["data"].as_array().unwrap();
    assert_eq!(created[0]["slug"], "spicy-food");
    assert_eq!(created[1]["slug"], "spicy-food-1");

    let tag_id = created[0]["id"].as_i64().unwrap();

    // A single string body works too.
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/admin/tags",
        Some(&access),
        Some(&json!({ "name": "Vegan" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"][0]["slug"], "vegan");

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/v1/admin/tags/{tag_id}"),
        Some(&access),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Spicy Food");

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/v1/admin/tags/{tag_id}"),
        Some(&access),
        Some(&json!({ "name": "Extra Spicy" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["slug"], "extra-spicy");

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/v1/admin/tags/{tag_id}"),
        Some(&access),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Deleting again reports it gone.
    let (status, body) = send(
        &app,
        "DELETE",
        &format!("/api/v1/admin/tags/{tag_id}"),
        Some(&access),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn tag_listing_paginates_and_searches() {
    let app = spawn_app().await;
    let (access, _) = sign_in(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/admin/tags",
        Some(&access),
        Some(&json!({ "name": ["Sweet", "Sour", "Savory"] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        "GET",
        "/api/v1/admin/tags?page=1&size=2&order_by=name&order_dir=asc",
        Some(&access),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let pagination = &body["data"]["pagination"];
    assert_eq!(pagination["total_items"], 3);
    assert_eq!(pagination["total_pages"], 2);
    assert_eq!(pagination["current_page"], 1);
    assert_eq!(pagination["next_page"], 2);
    assert_eq!(pagination["prev_page"], Value::Null);

    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["name"], "Savory");
    assert_eq!(items[1]["name"], "Sour");

    // Substring search over names and slugs.
    let (status, body) = send(
        &app,
        "GET",
        "/api/v1/admin/tags?search=sw",
        Some(&access),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], "Sweet");

    // Bad query parameters are rejected as a field map.
    let (status, body) = send(
        &app,
        "GET",
        "/api/v1/admin/tags?page=0&size=500&order_by=nope",
        Some(&access),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["page"].is_string());
    assert!(body["errors"]["size"].is_string());
    assert!(body["errors"]["order_by"].is_string());
}

#[tokio::test]
async fn expired_token_sweep_is_idempotent() {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;

    let state = dapur::api::create_app_state_from_config(config)
        .await
        .expect("Failed to create app state");

    let past = chrono::Utc::now() - chrono::Duration::hours(1);
    let future = chrono::Utc::now() + chrono::Duration::hours(1);

    // Seeded admin user has id 1.
    state
        .store
        .insert_token_pair(1, "stale-access", past, "stale-refresh", past)
        .await
        .unwrap();
    state
        .store
        .insert_token_pair(1, "live-access", future, "live-refresh", future)
        .await
        .unwrap();

    let deleted = state
        .store
        .delete_expired_tokens(chrono::Utc::now())
        .await
        .unwrap();
    assert_eq!(deleted, 2);

    // Sweeping again over the same rows deletes nothing.
    let deleted = state
        .store
        .delete_expired_tokens(chrono::Utc::now())
        .await
        .unwrap();
    assert_eq!(deleted, 0);

    // The unexpired pair survives both sweeps.
    assert!(
        state
            .store
            .has_live_token(1, "ACCESS", "live-access")
            .await
            .unwrap()
    );
    assert!(
        state
            .store
            .has_live_token(1, "REFRESH", "live-refresh")
            .await
            .unwrap()
    );

    // The background sweeper goes through the same delete.
    state
        .store
        .insert_token_pair(1, "stale-access-2", past, "stale-refresh-2", past)
        .await
        .unwrap();

    let sweeper =
        dapur::scheduler::TokenSweeper::new(state.store.clone(), state.config.scheduler.clone());
    sweeper.run_once().await;

    let deleted = state
        .store
        .delete_expired_tokens(chrono::Utc::now())
        .await
        .unwrap();
    assert_eq!(deleted, 0);
}

#[tokio::test]
async fn tag_batch_delete() {
    let app = spawn_app().await;
    let (access, _) = sign_in(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/admin/tags",
        Some(&access),
        Some(&json!({ "name": ["One", "Two", "Three"] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let ids: Vec<i64> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_i64().unwrap())
        .collect();

    // Unknown ids are skipped, not an error.
    let (status, body) = send(
        &app,
        "DELETE",
        "/api/v1/admin/tags",
        Some(&access),
        Some(&json!({ "ids": [ids[0], ids[1], 999_999] })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["deleted"], 2);
    assert_eq!(body["message"], "Hooray, 2 tags have been deleted");

    let (status, body) = send(&app, "GET", "/api/v1/admin/tags", Some(&access), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["pagination"]["total_items"], 1);

    let (status, body) = send(
        &app,
        "DELETE",
        "/api/v1/admin/tags",
        Some(&access),
        Some(&json!({ "ids": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["ids"].is_string());
}
