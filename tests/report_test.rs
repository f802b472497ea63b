mod common;

use serde_json::{json, Value};

#[tokio::test]
async fn submitted_report_starts_pending() {
    let app = common::spawn_app().await;
    let (user_id, token) = common::create_test_user(&app, "citizen").await;

    let form = common::report_form("Pothole on Main St")
        .text("priority", "high")
        .text("status", "resolved");
    let report = common::submit_report(&app, &token, form).await;

    assert_eq!(report["status"], "pending");
    assert_eq!(report["priority"], "high");
    assert_eq!(report["user_id"], user_id.as_str());
    assert_eq!(report["assigned_to_id"], Value::Null);
    assert_eq!(report["latitude"], 40.7128);
    assert_eq!(report["media_urls"], json!([]));
}

#[tokio::test]
async fn priority_defaults_to_medium() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_test_user(&app, "citizen").await;

    let report = common::submit_report(&app, &token, common::report_form("Broken light")).await;
    assert_eq!(report["priority"], "medium");
}

#[tokio::test]
async fn submission_requires_login() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .post(app.url("/reports"))
        .multipart(common::report_form("Anonymous drive-by"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn missing_title_is_rejected() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_test_user(&app, "citizen").await;

    let form = reqwest::multipart::Form::new().text("description", "No title given");
    let resp = app
        .client
        .post(app.url("/reports"))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn half_a_location_is_rejected() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_test_user(&app, "citizen").await;

    let form = reqwest::multipart::Form::new()
        .text("title", "Graffiti")
        .text("description", "On the underpass")
        .text("latitude", "40.0");
    let resp = app
        .client
        .post(app.url("/reports"))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn category_routing_overrides_requested_department() {
    let app = common::spawn_app().await;
    let (_, admin_token) = common::create_admin(&app).await;
    let department_id = common::create_department(&app, &admin_token).await;
    let category_id =
        common::create_category(&app, &admin_token, "Roads", Some(&department_id)).await;

    let other_department = common::create_department(&app, &admin_token).await;

    let (_, token) = common::create_test_user(&app, "citizen").await;
    let form = common::report_form("Pothole")
        .text("category_id", category_id.clone())
        .text("department_id", other_department.clone());
    let report = common::submit_report(&app, &token, form).await;

    assert_eq!(report["category_id"], category_id.as_str());
    assert_eq!(report["department_id"], department_id.as_str());
    assert_ne!(report["department_id"], other_department.as_str());
}

#[tokio::test]
async fn unknown_category_is_rejected() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_test_user(&app, "citizen").await;

    let form = common::report_form("Pothole").text("category_id", "no-such-category");
    let resp = app
        .client
        .post(app.url("/reports"))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn citizens_only_see_their_own_reports() {
    let app = common::spawn_app().await;
    let (_, alice) = common::create_test_user(&app, "alice").await;
    let (_, bob) = common::create_test_user(&app, "bob").await;

    let mine = common::submit_report(&app, &alice, common::report_form("Alice's report")).await;
    common::submit_report(&app, &bob, common::report_form("Bob's report")).await;

    let resp = app
        .client
        .get(app.url("/reports"))
        .bearer_auth(&alice)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["id"], mine["id"]);

    let resp = app
        .client
        .get(app.url(&format!("/reports/{}", mine["id"].as_str().unwrap())))
        .bearer_auth(&bob)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
}

#[tokio::test]
async fn admin_sees_all_reports_and_filters_by_status() {
    let app = common::spawn_app().await;
    let (_, admin) = common::create_admin(&app).await;
    let (_, alice) = common::create_test_user(&app, "alice").await;
    let (_, bob) = common::create_test_user(&app, "bob").await;

    let first = common::submit_report(&app, &alice, common::report_form("One")).await;
    common::submit_report(&app, &bob, common::report_form("Two")).await;

    let (status, _) = common::update_status(
        &app,
        &admin,
        first["id"].as_str().unwrap(),
        json!({ "status": "resolved" }),
    )
    .await;
    assert_eq!(status, 200);

    let body: Value = app
        .client
        .get(app.url("/reports"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["total"], 2);

    let body: Value = app
        .client
        .get(app.url("/reports?status=resolved"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["id"], first["id"]);

    let resp = app
        .client
        .get(app.url("/reports?status=closed"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn missing_report_is_not_found() {
    let app = common::spawn_app().await;
    let (_, admin) = common::create_admin(&app).await;

    let resp = app
        .client
        .get(app.url("/reports/does-not-exist"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let (status, _) =
        common::update_status(&app, &admin, "does-not-exist", json!({ "status": "resolved" }))
            .await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn department_report_listing_is_admin_only() {
    let app = common::spawn_app().await;
    let (_, admin) = common::create_admin(&app).await;
    let department_id = common::create_department(&app, &admin).await;
    let category_id = common::create_category(&app, &admin, "Parks", Some(&department_id)).await;

    let (_, citizen) = common::create_test_user(&app, "citizen").await;
    common::submit_report(
        &app,
        &citizen,
        common::report_form("Broken bench").text("category_id", category_id),
    )
    .await;
    common::submit_report(&app, &citizen, common::report_form("Unrouted")).await;

    let path = format!("/departments/{}/reports", department_id);
    let resp = app
        .client
        .get(app.url(&path))
        .bearer_auth(&citizen)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let body: Value = app
        .client
        .get(app.url(&path))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["title"], "Broken bench");

    let resp = app
        .client
        .get(app.url("/departments/nope/reports"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}
