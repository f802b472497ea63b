#![allow(dead_code)]

use civic_report::{
    config::rate_limit::RateLimitConfig,
    models::Role,
    routes::{create_app, AppContext},
    services::{email::EmailService, upload::UploadConfig},
    storage::{MemoryStorage, SharedStorage},
};
use reqwest::{multipart, Client};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Once,
};

static INIT: Once = Once::new();
static USER_COUNTER: AtomicUsize = AtomicUsize::new(0);
static NAME_COUNTER: AtomicUsize = AtomicUsize::new(0);

pub const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46];
pub const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

fn init_env() {
    INIT.call_once(|| {
        std::env::set_var(
            "JWT_SECRET",
            "integration_test_secret_that_is_at_least_32_characters_long",
        );
        let config = civic_report::config::jwt::JwtConfig::from_env().unwrap();
        // Another test binary thread may have won the race.
        let _ = civic_report::utils::jwt::init_jwt_config(config);
    });
}

pub struct TestApp {
    pub addr: String,
    pub storage: SharedStorage,
    pub client: Client,
    pub upload_dir: String,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.addr, path)
    }

    pub fn root_url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.upload_dir);
    }
}

pub async fn spawn_app() -> TestApp {
    init_env();

    let storage: SharedStorage = Arc::new(MemoryStorage::new());
    let upload_dir = std::env::temp_dir()
        .join(format!("civic-report-test-{}", uuid::Uuid::new_v4()))
        .to_string_lossy()
        .into_owned();

    let app = create_app(
        AppContext {
            storage: storage.clone(),
            email: EmailService::disabled(),
            uploads: UploadConfig {
                upload_dir: upload_dir.clone(),
            },
        },
        &RateLimitConfig::disabled(),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    TestApp {
        addr: format!("http://{}", addr),
        storage,
        client: Client::new(),
        upload_dir,
    }
}

/// Register a user and return (user_id, token).
pub async fn create_test_user(app: &TestApp, username_prefix: &str) -> (String, String) {
    let counter = USER_COUNTER.fetch_add(1, Ordering::SeqCst);
    let unique_username = format!("{}_{}", username_prefix, counter);

    let resp = app
        .client
        .post(app.url("/auth/register"))
        .json(&serde_json::json!({
            "username": unique_username,
            "email": format!("{}@test.com", unique_username),
            "password": "test_password_123"
        }))
        .send()
        .await
        .expect("Failed to register user");

    let status = resp.status();
    let body: Value = resp.json().await.expect("Failed to parse register response");
    if status != 201 {
        panic!(
            "Failed to register user '{}': status={}, body={}",
            unique_username, status, body
        );
    }

    let user_id = body["data"]["user"]["id"]
        .as_str()
        .expect("Response missing user id")
        .to_string();
    let token = body["data"]["token"]
        .as_str()
        .expect("Response missing token")
        .to_string();
    (user_id, token)
}

/// Register a user and promote them straight in storage. The token stays
/// valid because the role is read on every request.
pub async fn create_admin(app: &TestApp) -> (String, String) {
    let (id, token) = create_test_user(app, "admin").await;
    app.storage
        .set_user_role(&id, Role::Admin)
        .await
        .expect("Failed to promote user")
        .expect("User vanished");
    (id, token)
}

pub async fn create_department(app: &TestApp, admin_token: &str) -> String {
    let counter = NAME_COUNTER.fetch_add(1, Ordering::SeqCst);
    let resp = app
        .client
        .post(app.url("/departments"))
        .bearer_auth(admin_token)
        .json(&serde_json::json!({
            "name": format!("Public Works {}", counter),
            "email": "works@city.gov"
        }))
        .send()
        .await
        .expect("Failed to create department");

    let status = resp.status();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(status, 201, "create department failed: {}", body);
    body["data"]["id"].as_str().unwrap().to_string()
}

pub async fn create_category(
    app: &TestApp,
    admin_token: &str,
    name: &str,
    department_id: Option<&str>,
) -> String {
    let resp = app
        .client
        .post(app.url("/categories"))
        .bearer_auth(admin_token)
        .json(&serde_json::json!({
            "name": name,
            "description": format!("{} issues", name),
            "department_id": department_id
        }))
        .send()
        .await
        .expect("Failed to create category");

    let status = resp.status();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(status, 201, "create category failed: {}", body);
    body["data"]["id"].as_str().unwrap().to_string()
}

/// A minimal valid submission form.
pub fn report_form(title: &str) -> multipart::Form {
    multipart::Form::new()
        .text("title", title.to_string())
        .text("description", "Large pothole on the corner")
        .text("address", "5th and Main")
        .text("latitude", "40.7128")
        .text("longitude", "-74.0060")
}

pub fn media_part(data: &[u8], file_name: &str, mime: &str) -> multipart::Part {
    multipart::Part::bytes(data.to_vec())
        .file_name(file_name.to_string())
        .mime_str(mime)
        .unwrap()
}

/// Submit a report and return its JSON body.
pub async fn submit_report(app: &TestApp, token: &str, form: multipart::Form) -> Value {
    let resp = app
        .client
        .post(app.url("/reports"))
        .bearer_auth(token)
        .multipart(form)
        .send()
        .await
        .expect("Failed to submit report");

    let status = resp.status();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(status, 201, "submit report failed: {}", body);
    body["data"].clone()
}

pub async fn update_status(app: &TestApp, token: &str, report_id: &str, payload: Value) -> (u16, Value) {
    let resp = app
        .client
        .patch(app.url(&format!("/reports/{}/status", report_id)))
        .bearer_auth(token)
        .json(&payload)
        .send()
        .await
        .expect("Failed to update status");

    let status = resp.status().as_u16();
    let body: Value = resp.json().await.unwrap();
    (status, body)
}
