mod common;

use serde_json::Value;
use std::path::Path;

fn files_in(dir: &str) -> usize {
    std::fs::read_dir(Path::new(dir).join("reports"))
        .map(|entries| entries.count())
        .unwrap_or(0)
}

#[tokio::test]
async fn media_is_stored_and_served_to_owner_and_admin() {
    let app = common::spawn_app().await;
    let (_, admin) = common::create_admin(&app).await;
    let (_, owner) = common::create_test_user(&app, "owner").await;
    let (_, stranger) = common::create_test_user(&app, "stranger").await;

    let form = common::report_form("Dumped sofa")
        .part("media", common::media_part(common::JPEG, "sofa.jpg", "image/jpeg"))
        .part("media", common::media_part(common::PNG, "sofa.png", "image/png"));
    let report = common::submit_report(&app, &owner, form).await;

    let urls = report["media_urls"].as_array().unwrap();
    assert_eq!(urls.len(), 2);
    let url = urls[0].as_str().unwrap();
    assert!(url.starts_with("/uploads/reports/"));
    assert!(url.ends_with(".jpg"));
    assert_eq!(files_in(&app.upload_dir), 2);

    let resp = app
        .client
        .get(app.root_url(url))
        .bearer_auth(&owner)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.bytes().await.unwrap().as_ref(), common::JPEG);

    let resp = app
        .client
        .get(app.root_url(url))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app
        .client
        .get(app.root_url(url))
        .bearer_auth(&stranger)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = app.client.get(app.root_url(url)).send().await.unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn unreferenced_media_is_not_found() {
    let app = common::spawn_app().await;
    let (_, admin) = common::create_admin(&app).await;

    let resp = app
        .client
        .get(app.root_url("/uploads/reports/unknown.jpg"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn unsupported_file_rejects_the_whole_submission() {
    let app = common::spawn_app().await;
    let (_, owner) = common::create_test_user(&app, "owner").await;

    let form = common::report_form("Bad upload")
        .part("media", common::media_part(common::JPEG, "ok.jpg", "image/jpeg"))
        .part(
            "media",
            common::media_part(b"%PDF-1.7 not an image", "doc.pdf", "application/pdf"),
        );
    let resp = app
        .client
        .post(app.url("/reports"))
        .bearer_auth(&owner)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert_eq!(files_in(&app.upload_dir), 0);

    let body: Value = app
        .client
        .get(app.url("/reports"))
        .bearer_auth(&owner)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["total"], 0);
}

#[tokio::test]
async fn mismatched_content_type_is_rejected() {
    let app = common::spawn_app().await;
    let (_, owner) = common::create_test_user(&app, "owner").await;

    let form = common::report_form("Disguised")
        .part("media", common::media_part(common::PNG, "photo.jpg", "image/jpeg"));
    let resp = app
        .client
        .post(app.url("/reports"))
        .bearer_auth(&owner)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn sixth_attachment_is_rejected() {
    let app = common::spawn_app().await;
    let (_, owner) = common::create_test_user(&app, "owner").await;

    let mut form = common::report_form("Too many photos");
    for i in 0..6 {
        form = form.part(
            "media",
            common::media_part(common::JPEG, &format!("p{}.jpg", i), "image/jpeg"),
        );
    }
    let resp = app
        .client
        .post(app.url("/reports"))
        .bearer_auth(&owner)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert_eq!(files_in(&app.upload_dir), 0);
}

#[tokio::test]
async fn failed_insert_discards_staged_files() {
    let app = common::spawn_app().await;
    let (_, owner) = common::create_test_user(&app, "owner").await;

    // Unknown category fails after the files are written.
    let form = common::report_form("Orphaned photo")
        .text("category_id", "missing")
        .part("media", common::media_part(common::JPEG, "a.jpg", "image/jpeg"));
    let resp = app
        .client
        .post(app.url("/reports"))
        .bearer_auth(&owner)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert_eq!(files_in(&app.upload_dir), 0);
}

#[tokio::test]
async fn blank_title_is_rejected_before_files_are_written() {
    let app = common::spawn_app().await;
    let (_, owner) = common::create_test_user(&app, "owner").await;

    let form = reqwest::multipart::Form::new()
        .text("title", "   ")
        .text("description", "Photo attached")
        .part("media", common::media_part(common::JPEG, "a.jpg", "image/jpeg"));
    let resp = app
        .client
        .post(app.url("/reports"))
        .bearer_auth(&owner)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    // Staging creates the media directory, so it must not exist.
    assert!(!Path::new(&app.upload_dir).join("reports").exists());
}
