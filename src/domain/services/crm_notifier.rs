// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::audit_request::AuditRequest;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::info;

/// CRM 错误类型
///
/// 只有传输层失败才会成为错误；服务端拒绝通过返回值体现
#[derive(Error, Debug)]
pub enum CrmError {
    /// 请求失败
    #[error("CRM request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// 客户端配置错误
    #[error("CRM client misconfigured: {0}")]
    Config(String),
}

/// 任务创建结果
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    /// 已创建，附带服务端返回的内容
    Created(Value),
    /// 服务端以非成功状态拒绝
    Rejected { status: u16 },
    /// 通知未启用
    Skipped,
}

impl TaskOutcome {
    pub fn is_created(&self) -> bool {
        matches!(self, TaskOutcome::Created(_))
    }
}

/// 一次通知的结果
///
/// 调用方不依赖其内容，仅用于日志
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationReport {
    /// 任务创建结果
    pub task: TaskOutcome,
    /// 联系人创建的 HTTP 状态，未发送时为空
    pub contact_status: Option<u16>,
}

impl NotificationReport {
    pub fn skipped() -> Self {
        Self {
            task: TaskOutcome::Skipped,
            contact_status: None,
        }
    }
}

/// CRM 通知服务特质
///
/// 为提交人创建一条跟进任务和一条联系人记录
#[async_trait]
pub trait CrmNotifier: Send + Sync {
    async fn notify(&self, request: &AuditRequest) -> Result<NotificationReport, CrmError>;
}

/// 未配置凭证或被禁用时使用的通知器
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledNotifier;

#[async_trait]
impl CrmNotifier for DisabledNotifier {
    async fn notify(&self, request: &AuditRequest) -> Result<NotificationReport, CrmError> {
        info!(
            submission_id = %request.submission_id,
            "CRM notification disabled, skipping"
        );
        Ok(NotificationReport::skipped())
    }
}
