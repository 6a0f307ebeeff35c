// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use lighthouse_audit::config::settings::CrmSettings;
use lighthouse_audit::domain::models::audit_request::AuditRequest;
use lighthouse_audit::domain::services::crm_notifier::{CrmError, CrmNotifier, TaskOutcome};
use lighthouse_audit::infrastructure::crm::highlevel_client::HighLevelClient;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings(api_base: String) -> CrmSettings {
    CrmSettings {
        enabled: true,
        api_base,
        api_version: "2021-07-28".to_string(),
        api_key: Some("pit-secret".to_string()),
        location_id: "loc-42".to_string(),
        assignee_id: "user-7".to_string(),
        creator_id: "creator-9".to_string(),
        timeout_secs: 5,
    }
}

fn request() -> AuditRequest {
    let submission_id = Uuid::new_v4();
    AuditRequest {
        name: "Ada".to_string(),
        email: "ada@example.com".to_string(),
        url: "https://example.com".to_string(),
        phone: "555-0100".to_string(),
        submission_id,
        submitted_uuid: submission_id.to_string(),
    }
}

#[tokio::test]
async fn test_notify_creates_task_then_contact() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/contacts/creator-9/tasks"))
        .and(header("Authorization", "Bearer pit-secret"))
        .and(header("Version", "2021-07-28"))
        .and(header("Accept", "application/json"))
        .and(body_partial_json(json!({
            "title": "Ada-555-0100",
            "body": "Name: Ada\nPhone: 555-0100\nEmail: ada@example.com\nURL: https://example.com\n",
            "completed": false,
            "assignedTo": "user-7"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "task": { "id": "t-1" } })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/contacts/"))
        .and(header("Authorization", "Bearer pit-secret"))
        .and(body_partial_json(json!({
            "name": "Ada",
            "email": "ada@example.com",
            "locationId": "loc-42",
            "phone": "555-0100"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "contact": {} })))
        .expect(1)
        .mount(&server)
        .await;

    let client = HighLevelClient::new(settings(server.uri())).unwrap();
    let report = client.notify(&request()).await.unwrap();

    assert_eq!(
        report.task,
        TaskOutcome::Created(json!({ "task": { "id": "t-1" } }))
    );
    assert_eq!(report.contact_status, Some(200));
}

#[tokio::test]
async fn test_rejected_task_does_not_fail_notification() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/contacts/creator-9/tasks"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "Unauthorized" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/contacts/"))
        .respond_with(ResponseTemplate::new(422))
        .expect(1)
        .mount(&server)
        .await;

    let client = HighLevelClient::new(settings(server.uri())).unwrap();
    let report = client.notify(&request()).await.unwrap();

    assert_eq!(report.task, TaskOutcome::Rejected { status: 401 });
    assert_eq!(report.contact_status, Some(422));
}

#[tokio::test]
async fn test_created_task_with_unparseable_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/contacts/creator-9/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/contacts/"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;

    let client = HighLevelClient::new(settings(server.uri())).unwrap();
    let report = client.notify(&request()).await.unwrap();

    assert_eq!(report.task, TaskOutcome::Created(serde_json::Value::Null));
}

#[tokio::test]
async fn test_unreachable_crm_is_transport_error() {
    // nothing listens on the discard port
    let client = HighLevelClient::new(settings("http://127.0.0.1:9".to_string())).unwrap();

    let err = client.notify(&request()).await.unwrap_err();

    assert!(matches!(err, CrmError::Transport(_)));
}
