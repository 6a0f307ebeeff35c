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

use crate::config::settings::CrmSettings;
use crate::domain::models::audit_request::AuditRequest;
use crate::domain::services::crm_notifier::{
    CrmError, CrmNotifier, NotificationReport, TaskOutcome,
};
use async_trait::async_trait;
use chrono::{DateTime, Days, Utc};
use metrics::counter;
use reqwest::{header, Client};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{info, warn};

/// 任务请求体
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPayload {
    pub title: String,
    pub body: String,
    pub due_date: String,
    pub completed: bool,
    pub assigned_to: String,
}

/// 联系人请求体
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactPayload {
    pub name: String,
    pub email: String,
    pub location_id: String,
    pub phone: String,
}

/// 截止时间：次日 23:59:00 UTC
pub fn due_date(now: DateTime<Utc>) -> String {
    let tomorrow = now
        .date_naive()
        .checked_add_days(Days::new(1))
        .unwrap_or_else(|| now.date_naive());
    tomorrow
        .and_hms_opt(23, 59, 0)
        .map(|at| at.and_utc().format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_default()
}

/// HighLevel (LeadConnector) CRM 客户端
///
/// 凭证、位置、指派人和创建人均通过 [`CrmSettings`] 在构造时注入
#[derive(Clone, Debug)]
pub struct HighLevelClient {
    client: Client,
    settings: CrmSettings,
}

impl HighLevelClient {
    pub fn new(settings: CrmSettings) -> Result<Self, CrmError> {
        let api_key = settings
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| CrmError::Config("missing API key".to_string()))?;

        let mut headers = header::HeaderMap::new();
        let mut auth = header::HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|e| CrmError::Config(e.to_string()))?;
        auth.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth);
        headers.insert(
            "Version",
            header::HeaderValue::from_str(&settings.api_version)
                .map_err(|e| CrmError::Config(e.to_string()))?,
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self { client, settings })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.settings.api_base.trim_end_matches('/'), path)
    }

    pub fn task_payload(&self, request: &AuditRequest, now: DateTime<Utc>) -> TaskPayload {
        TaskPayload {
            title: request.task_title(),
            body: request.task_body(),
            due_date: due_date(now),
            completed: false,
            assigned_to: self.settings.assignee_id.clone(),
        }
    }

    pub fn contact_payload(&self, request: &AuditRequest) -> ContactPayload {
        ContactPayload {
            name: request.name.clone(),
            email: request.email.clone(),
            location_id: self.settings.location_id.clone(),
            phone: request.phone.clone(),
        }
    }

    /// 创建跟进任务
    ///
    /// # 返回值
    ///
    /// * `Ok(TaskOutcome::Created)` - 服务端返回 200 或 201
    /// * `Ok(TaskOutcome::Rejected)` - 其他状态
    /// * `Err(CrmError)` - 传输失败
    pub async fn create_task(&self, payload: &TaskPayload) -> Result<TaskOutcome, CrmError> {
        let url = self.endpoint(&format!("contacts/{}/tasks", self.settings.creator_id));
        let response = self.client.post(&url).json(payload).send().await?;
        let status = response.status();

        if status.as_u16() == 200 || status.as_u16() == 201 {
            counter!("crm_requests_total", "kind" => "task", "outcome" => "created").increment(1);
            let body = response.json::<Value>().await.unwrap_or(Value::Null);
            Ok(TaskOutcome::Created(body))
        } else {
            counter!("crm_requests_total", "kind" => "task", "outcome" => "rejected").increment(1);
            warn!(status = status.as_u16(), "CRM task creation rejected");
            Ok(TaskOutcome::Rejected {
                status: status.as_u16(),
            })
        }
    }

    /// 创建联系人，返回 HTTP 状态码，不检查是否成功
    pub async fn create_contact(&self, payload: &ContactPayload) -> Result<u16, CrmError> {
        let url = self.endpoint("contacts/");
        let response = self.client.post(&url).json(payload).send().await?;
        let status = response.status().as_u16();
        counter!("crm_requests_total", "kind" => "contact", "outcome" => "sent").increment(1);
        Ok(status)
    }
}

#[async_trait]
impl CrmNotifier for HighLevelClient {
    async fn notify(&self, request: &AuditRequest) -> Result<NotificationReport, CrmError> {
        let task = self
            .create_task(&self.task_payload(request, Utc::now()))
            .await?;
        let contact_status = self.create_contact(&self.contact_payload(request)).await?;

        info!(
            submission_id = %request.submission_id,
            task_created = task.is_created(),
            contact_status,
            "CRM notified"
        );

        Ok(NotificationReport {
            task,
            contact_status: Some(contact_status),
        })
    }
}
