mod common;

use serde_json::{json, Value};

#[tokio::test]
async fn register_sets_session_cookie() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .post(app.url("/auth/register"))
        .json(&json!({
            "username": "resident",
            "email": "resident@example.com",
            "password": "correct horse",
            "first_name": "Rae"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 201);
    let cookie = resp
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("access_token="));
    assert!(cookie.contains("HttpOnly"));

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["user"]["username"], "resident");
    assert_eq!(body["data"]["user"]["role"], "citizen");
    assert!(body["data"]["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn duplicate_username_conflicts() {
    let app = common::spawn_app().await;
    let payload = json!({
        "username": "twin",
        "email": "twin@example.com",
        "password": "password123"
    });

    let first = app
        .client
        .post(app.url("/auth/register"))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), 201);

    let second = app
        .client
        .post(app.url("/auth/register"))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), 409);
}

#[tokio::test]
async fn short_password_is_rejected() {
    let app = common::spawn_app().await;
    let resp = app
        .client
        .post(app.url("/auth/register"))
        .json(&json!({
            "username": "shorty",
            "email": "shorty@example.com",
            "password": "abc"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn login_and_me() {
    let app = common::spawn_app().await;
    let (user_id, _) = common::create_test_user(&app, "login").await;
    let username = app
        .storage
        .find_user(&user_id)
        .await
        .unwrap()
        .unwrap()
        .username;

    let resp = app
        .client
        .post(app.url("/auth/login"))
        .json(&json!({ "username": username, "password": "wrong_password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = app
        .client
        .post(app.url("/auth/login"))
        .json(&json!({ "username": username, "password": "test_password_123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let token = body["data"]["token"].as_str().unwrap();

    let body: Value = app
        .client
        .get(app.url("/auth/me"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["id"], user_id.as_str());
}

#[tokio::test]
async fn session_cookie_authenticates() {
    let app = common::spawn_app().await;
    let (user_id, token) = common::create_test_user(&app, "cookie").await;

    let body: Value = app
        .client
        .get(app.url("/auth/me"))
        .header("cookie", format!("access_token={}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["id"], user_id.as_str());
}

#[tokio::test]
async fn garbage_token_is_unauthorized() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .get(app.url("/auth/me"))
        .bearer_auth("not.a.jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn logout_clears_cookie() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_test_user(&app, "leaver").await;

    let resp = app
        .client
        .post(app.url("/auth/logout"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let cookie = resp
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn health_reports_storage() {
    let app = common::spawn_app().await;
    let body: Value = app
        .client
        .get(app.root_url("/"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage"], "memory");
}
