mod common;

use common::{set_cookie, set_cookie_header, spawn_app, TestApp, PASSWORD};
use serde_json::{json, Value};

use credential_lifecycle::account::Role;
use credential_lifecycle::store::CredentialStore;

async fn login(app: &TestApp, username: &str) -> reqwest::Response {
    app.client
        .post(&app.url("/auth/login"))
        .json(&json!({ "username": username, "password": PASSWORD }))
        .send()
        .await
        .expect("Failed to execute request.")
}

/// Logs in and returns (access token, refresh token) from the cookies
async fn login_tokens(app: &TestApp, username: &str) -> (String, String) {
    let response = login(app, username).await;
    assert_eq!(200, response.status().as_u16());
    (
        set_cookie(&response, "token").expect("No access cookie"),
        set_cookie(&response, "refreshToken").expect("No refresh cookie"),
    )
}

async fn error_code(response: reqwest::Response) -> String {
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["success"], false);
    body["code"].as_str().unwrap_or_default().to_string()
}

// --- Registration Tests ---

#[tokio::test]
async fn register_returns_201_without_session() {
    let app = spawn_app();

    let response = app
        .client
        .post(&app.url("/auth/register"))
        .json(&json!({
            "username": "john",
            "email": "john@example.com",
            "password": PASSWORD
        }))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(201, response.status().as_u16());
    assert!(set_cookie(&response, "token").is_none());

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["account"]["username"], "john");
    assert_eq!(body["account"]["role"], "member");
    assert_eq!(body["account"]["is_verified"], false);
    assert_eq!(body["verification_email_sent"], true);
    assert!(body["account"].get("password_hash").is_none());
}

#[tokio::test]
async fn register_returns_409_for_duplicate_username() {
    let app = spawn_app();
    app.context.unverified_account("john").await;

    let response = app
        .client
        .post(&app.url("/auth/register"))
        .json(&json!({
            "username": "john",
            "email": "another@example.com",
            "password": PASSWORD
        }))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(409, response.status().as_u16());
    assert_eq!(error_code(response).await, "DUPLICATE_ENTRY");
}

#[tokio::test]
async fn register_returns_400_for_invalid_input() {
    let app = spawn_app();
    let test_cases = vec![
        (json!({"username": "john", "email": "bad", "password": PASSWORD}), "invalid email"),
        (json!({"username": "john", "email": "john@example.com", "password": "short"}), "weak password"),
        (json!({"username": "john", "email": "john@example.com"}), "missing password"),
    ];

    for (body, description) in test_cases {
        let response = app
            .client
            .post(&app.url("/auth/register"))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.");

        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 Bad Request for {}.",
            description
        );
        assert_eq!(error_code(response).await, "VALIDATION_ERROR");
    }
}

// --- Login Tests ---

#[tokio::test]
async fn login_sets_scoped_http_only_cookies() {
    let app = spawn_app();
    app.context.verified_account("john", Role::Member).await;

    let response = login(&app, "john").await;
    assert_eq!(200, response.status().as_u16());

    let access = set_cookie_header(&response, "token").expect("No access cookie");
    assert!(access.contains("HttpOnly"));
    assert!(access.contains("SameSite=Lax"));
    assert!(access.contains("Path=/;") || access.ends_with("Path=/"));
    assert!(access.contains("Max-Age=900"));

    let refresh = set_cookie_header(&response, "refreshToken").expect("No refresh cookie");
    assert!(refresh.contains("HttpOnly"));
    assert!(refresh.contains("Path=/auth"));
    assert!(refresh.contains("Max-Age=604800"));

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], 900);
}

#[tokio::test]
async fn login_error_codes() {
    let app = spawn_app();
    app.context.unverified_account("pending").await;
    app.context.verified_account("john", Role::Member).await;

    let response = login(&app, "nobody").await;
    assert_eq!(404, response.status().as_u16());
    assert_eq!(error_code(response).await, "NOT_FOUND");

    let response = login(&app, "pending").await;
    assert_eq!(403, response.status().as_u16());
    assert_eq!(error_code(response).await, "NOT_VERIFIED");

    let response = app
        .client
        .post(&app.url("/auth/login"))
        .json(&json!({ "username": "john", "password": "WrongPass999" }))
        .send()
        .await
        .unwrap();
    assert_eq!(401, response.status().as_u16());
    assert_eq!(error_code(response).await, "BAD_CREDENTIAL");
}

// --- Protected Route Tests ---

#[tokio::test]
async fn me_accepts_cookie_or_bearer_header() {
    let app = spawn_app();
    let account = app.context.verified_account("john", Role::Member).await;
    let (access, _) = login_tokens(&app, "john").await;

    let by_cookie = app
        .client
        .get(&app.url("/auth/me"))
        .header("Cookie", format!("token={}", access))
        .send()
        .await
        .unwrap();
    assert_eq!(200, by_cookie.status().as_u16());
    let body: Value = by_cookie.json().await.unwrap();
    assert_eq!(body["account"]["id"], account.id.to_string());

    let by_header = app
        .client
        .get(&app.url("/auth/me"))
        .bearer_auth(&access)
        .send()
        .await
        .unwrap();
    assert_eq!(200, by_header.status().as_u16());
}

#[tokio::test]
async fn protected_routes_reject_missing_and_bad_tokens() {
    let app = spawn_app();

    let response = app.client.get(&app.url("/auth/verify")).send().await.unwrap();
    assert_eq!(401, response.status().as_u16());
    assert_eq!(error_code(response).await, "NO_TOKEN");

    let response = app
        .client
        .get(&app.url("/auth/verify"))
        .bearer_auth("not.a.jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(401, response.status().as_u16());
    assert_eq!(error_code(response).await, "MALFORMED_TOKEN");
}

#[tokio::test]
async fn verify_returns_claims() {
    let app = spawn_app();
    let account = app.context.verified_account("john", Role::Author).await;
    let (access, _) = login_tokens(&app, "john").await;

    let response = app
        .client
        .get(&app.url("/auth/verify"))
        .bearer_auth(&access)
        .send()
        .await
        .unwrap();

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["claims"]["sub"], account.id.to_string());
    assert_eq!(body["claims"]["role"], "author");
}

#[tokio::test]
async fn admin_route_requires_admin_role() {
    let app = spawn_app();
    app.context.verified_account("john", Role::Author).await;
    app.context.verified_account("root", Role::Admin).await;

    let (access, _) = login_tokens(&app, "john").await;
    let response = app
        .client
        .get(&app.url("/auth/admin"))
        .bearer_auth(&access)
        .send()
        .await
        .unwrap();
    assert_eq!(403, response.status().as_u16());
    assert_eq!(error_code(response).await, "FORBIDDEN");

    let (access, _) = login_tokens(&app, "root").await;
    let response = app
        .client
        .get(&app.url("/auth/admin"))
        .bearer_auth(&access)
        .send()
        .await
        .unwrap();
    assert_eq!(200, response.status().as_u16());
}

// --- Refresh / Logout Tests ---

#[tokio::test]
async fn refresh_token_cookie_yields_new_access_token() {
    let app = spawn_app();
    app.context.verified_account("john", Role::Member).await;
    let (_, refresh) = login_tokens(&app, "john").await;

    let response = app
        .client
        .post(&app.url("/auth/refresh-token"))
        .header("Cookie", format!("refreshToken={}", refresh))
        .send()
        .await
        .unwrap();

    assert_eq!(200, response.status().as_u16());
    let new_access = set_cookie(&response, "token").expect("No access cookie");
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["access_token"], new_access);
}

#[tokio::test]
async fn refresh_without_cookie_returns_no_token() {
    let app = spawn_app();

    let response = app
        .client
        .post(&app.url("/auth/refresh-token"))
        .send()
        .await
        .unwrap();

    assert_eq!(401, response.status().as_u16());
    assert_eq!(error_code(response).await, "NO_TOKEN");
}

#[tokio::test]
async fn logout_revokes_refresh_token_and_clears_cookies() {
    let app = spawn_app();
    let account = app.context.verified_account("john", Role::Member).await;
    let (access, refresh) = login_tokens(&app, "john").await;

    let response = app
        .client
        .post(&app.url("/auth/logout"))
        .bearer_auth(&access)
        .send()
        .await
        .unwrap();
    assert_eq!(200, response.status().as_u16());
    assert_eq!(set_cookie(&response, "token").as_deref(), Some(""));
    assert_eq!(set_cookie(&response, "refreshToken").as_deref(), Some(""));

    let stored = app.context.store.find_by_id(account.id).await.unwrap().unwrap();
    assert_eq!(stored.latest_session, None);

    let response = app
        .client
        .post(&app.url("/auth/refresh-token"))
        .header("Cookie", format!("refreshToken={}", refresh))
        .send()
        .await
        .unwrap();
    assert_eq!(401, response.status().as_u16());
    assert_eq!(set_cookie(&response, "refreshToken").as_deref(), Some(""));
    assert_eq!(error_code(response).await, "INVALID_REFRESH_TOKEN");
}

// --- Email Verification Tests ---

#[tokio::test]
async fn verify_email_link_logs_the_account_in() {
    let app = spawn_app();
    app.context.unverified_account("john").await;
    let token = app.context.mailer.last_token_for("john@example.com");

    let response = app
        .client
        .get(&app.url(&format!(
            "/auth/verify-email?token={}",
            urlencoding::encode(&token)
        )))
        .send()
        .await
        .unwrap();

    assert_eq!(200, response.status().as_u16());
    assert!(set_cookie(&response, "token").is_some());
    assert!(set_cookie(&response, "refreshToken").is_some());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["account"]["is_verified"], true);

    let response = app
        .client
        .get(&app.url(&format!("/auth/verify-email?token={}", token)))
        .send()
        .await
        .unwrap();
    assert_eq!(400, response.status().as_u16());
    assert_eq!(error_code(response).await, "TOKEN_NOT_FOUND");
}

#[tokio::test]
async fn verify_email_without_token_is_not_found() {
    let app = spawn_app();

    let response = app
        .client
        .get(&app.url("/auth/verify-email"))
        .send()
        .await
        .unwrap();

    assert_eq!(400, response.status().as_u16());
    assert_eq!(error_code(response).await, "TOKEN_NOT_FOUND");
}

#[tokio::test]
async fn resend_verification_reports_delivery() {
    let app = spawn_app();
    app.context.unverified_account("john").await;

    let response = app
        .client
        .post(&app.url("/auth/resend-verification"))
        .json(&json!({ "username": "john" }))
        .send()
        .await
        .unwrap();
    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["already_verified"], false);
    assert_eq!(app.context.mailer.sent().len(), 2);

    app.context.mailer.fail_deliveries(true);
    let response = app
        .client
        .post(&app.url("/auth/resend-verification"))
        .json(&json!({ "username": "john" }))
        .send()
        .await
        .unwrap();
    assert_eq!(503, response.status().as_u16());
    assert_eq!(error_code(response).await, "EMAIL_SERVICE_ERROR");
}
