// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use super::helpers::{
    audit_body, create_test_app, create_test_app_with, new_uuid, ToolBehavior, FAKE_PDF,
};
use axum::http::StatusCode;
use serde_json::{json, Value};
use std::future::IntoFuture;
use std::sync::atomic::Ordering;

#[tokio::test]
async fn test_audit_returns_pdf_attachment() {
    let app = create_test_app();
    let uuid = new_uuid();

    let response = app.server.post("/audit").json(&audit_body(&uuid)).await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(
        response.header("content-type").to_str().unwrap(),
        "application/pdf"
    );
    assert_eq!(
        response.header("content-disposition").to_str().unwrap(),
        "attachment; filename=\"lighthouse-report.pdf\""
    );
    assert_eq!(&response.as_bytes()[..], FAKE_PDF);

    let dir = app.report_dir(&uuid);
    assert!(dir.join("report.html").is_file());
    assert_eq!(std::fs::read(dir.join("output.pdf")).unwrap(), FAKE_PDF);

    assert_eq!(
        *app.runner.urls.lock().unwrap(),
        vec!["https://example.com".to_string()]
    );
    let notified = app.notifier.notified.lock().unwrap();
    assert_eq!(notified.len(), 1);
    assert_eq!(notified[0].name, "Ada Lovelace");
    assert_eq!(notified[0].phone, "555-0100");
}

#[tokio::test]
async fn test_each_missing_field_is_rejected_without_side_effects() {
    let app = create_test_app();

    for field in ["name", "emailid", "url", "phone", "uuid"] {
        let mut body = audit_body(&new_uuid());
        body.as_object_mut().unwrap().remove(field);

        let response = app.server.post("/audit").json(&body).await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        let error: Value = response.json();
        assert_eq!(error["error"], format!("Missing field: {}", field));
    }

    assert_eq!(app.report_dir_count(), 0);
    assert_eq!(app.runner.calls.load(Ordering::SeqCst), 0);
    assert!(app.notifier.notified.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_validation_order_email_url_uuid() {
    let app = create_test_app();

    let body = json!({
        "name": "Ada",
        "emailid": "not-an-email",
        "url": "not a url",
        "phone": "555-0100",
        "uuid": "nope"
    });
    let response = app.server.post("/audit").json(&body).await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "Invalid email address");

    let mut body = body;
    body["emailid"] = json!("ada@example.com");
    let response = app.server.post("/audit").json(&body).await;
    assert_eq!(response.json::<Value>()["error"], "Invalid URL");

    body["url"] = json!("https://example.com/page");
    let response = app.server.post("/audit").json(&body).await;
    assert_eq!(response.json::<Value>()["error"], "Invalid UUID");

    assert_eq!(app.report_dir_count(), 0);
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let app = create_test_app();

    let response = app
        .server
        .post("/audit")
        .text("{not json")
        .content_type("application/json")
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "Invalid JSON body");

    let response = app.server.post("/audit").json(&json!(["a", "b"])).await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "Invalid JSON body");

    assert_eq!(app.report_dir_count(), 0);
}

#[tokio::test]
async fn test_non_string_field_is_bad_request() {
    let app = create_test_app();
    let mut body = audit_body(&new_uuid());
    body["phone"] = json!(5550100);

    let response = app.server.post("/audit").json(&body).await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "Invalid field: phone");
}

#[tokio::test]
async fn test_missing_tool_is_server_error() {
    let app = create_test_app_with(ToolBehavior::Missing);
    let uuid = new_uuid();

    let response = app.server.post("/audit").json(&audit_body(&uuid)).await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let error = response.json::<Value>()["error"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(error.contains("Lighthouse not found"));
    assert!(error.contains("npm install -g lighthouse"));

    // directory is created before the tool runs, but no artifacts follow
    let dir = app.report_dir(&uuid);
    assert!(dir.is_dir());
    assert!(!dir.join("output.pdf").exists());
    assert!(app.notifier.notified.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_nonzero_tool_exit_still_returns_pdf() {
    let app = create_test_app_with(ToolBehavior::ExitsNonZero);

    let response = app
        .server
        .post("/audit")
        .json(&audit_body(&new_uuid()))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(&response.as_bytes()[..], FAKE_PDF);
}

#[tokio::test]
async fn test_report_directory_uses_submitted_uuid() {
    let app = create_test_app();
    let submitted = "936DA01F-9ABD-4D9D-80C7-02AF85C822A8";

    let response = app.server.post("/audit").json(&audit_body(submitted)).await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(app.report_dir(submitted).join("report.html").is_file());
    assert!(app.report_dir(submitted).join("output.pdf").is_file());
    assert_eq!(app.report_dir_count(), 1);
}

#[tokio::test]
async fn test_braced_uuid_directory_is_canonical() {
    let app = create_test_app();

    let response = app
        .server
        .post("/audit")
        .json(&audit_body("{936DA01F-9ABD-4D9D-80C7-02AF85C822A8}"))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(app
        .report_dir("936da01f-9abd-4d9d-80c7-02af85c822a8")
        .join("output.pdf")
        .is_file());
    assert_eq!(app.report_dir_count(), 1);
}

#[tokio::test]
async fn test_resubmission_overwrites_artifacts() {
    let app = create_test_app();
    let uuid = new_uuid();

    let first = app.server.post("/audit").json(&audit_body(&uuid)).await;
    let second = app.server.post("/audit").json(&audit_body(&uuid)).await;

    assert_eq!(first.status_code(), StatusCode::OK);
    assert_eq!(second.status_code(), StatusCode::OK);
    assert_eq!(app.report_dir_count(), 1);
    assert_eq!(app.runner.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_concurrent_same_uuid_is_serialized() {
    let app = create_test_app();
    let uuid = new_uuid();

    let first = app.server.post("/audit").json(&audit_body(&uuid));
    let second = app.server.post("/audit").json(&audit_body(&uuid));
    let (first, second) = tokio::join!(first.into_future(), second.into_future());

    assert_eq!(first.status_code(), StatusCode::OK);
    assert_eq!(second.status_code(), StatusCode::OK);
    assert_eq!(app.runner.calls.load(Ordering::SeqCst), 2);
    assert_eq!(app.runner.max_in_flight.load(Ordering::SeqCst), 1);
}
