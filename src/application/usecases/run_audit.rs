// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use metrics::{counter, histogram};
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use crate::domain::models::audit_request::AuditRequest;
use crate::domain::services::crm_notifier::{CrmError, CrmNotifier};
use crate::engines::traits::{
    AuditJob, AuditRunner, AuditToolError, RenderError, ReportRenderer, ToolExit,
};
use crate::infrastructure::storage::{ReportWorkspace, WorkspaceError};

/// 流水线错误类型
///
/// 显示文本直接透传底层错误，作为 500 响应的错误消息
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
    #[error(transparent)]
    Audit(#[from] AuditToolError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Crm(#[from] CrmError),
    #[error("Failed to read PDF artifact: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// 用于指标标签的阶段名称
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::Workspace(_) => "workspace",
            PipelineError::Audit(_) => "audit",
            PipelineError::Render(_) => "render",
            PipelineError::Crm(_) => "crm",
            PipelineError::Io(_) => "artifact",
        }
    }
}

/// 审计产物
#[derive(Debug, Clone)]
pub struct AuditArtifact {
    /// 提交标识符
    pub submission_id: Uuid,
    /// PDF 内容
    pub pdf: Bytes,
    /// HTML 报告路径
    pub html_path: PathBuf,
    /// PDF 路径
    pub pdf_path: PathBuf,
    /// 审计工具退出情况
    pub tool_exit: ToolExit,
}

/// 运行审计用例
///
/// 严格按 报告目录 → 审计工具 → PDF 渲染 → CRM 通知 → 读取 PDF 的顺序执行，
/// 任一步失败即终止，已写出的中间文件保留在报告目录中。
pub struct RunAuditUseCase {
    workspace: ReportWorkspace,
    runner: Arc<dyn AuditRunner>,
    renderer: Arc<dyn ReportRenderer>,
    notifier: Arc<dyn CrmNotifier>,
    headless: bool,
}

impl RunAuditUseCase {
    pub fn new(
        workspace: ReportWorkspace,
        runner: Arc<dyn AuditRunner>,
        renderer: Arc<dyn ReportRenderer>,
        notifier: Arc<dyn CrmNotifier>,
        headless: bool,
    ) -> Self {
        Self {
            workspace,
            runner,
            renderer,
            notifier,
            headless,
        }
    }

    pub async fn execute(&self, request: &AuditRequest) -> Result<AuditArtifact, PipelineError> {
        let start = Instant::now();
        let result = self.run_pipeline(request).await;
        histogram!("audit_pipeline_duration_seconds").record(start.elapsed().as_secs_f64());

        match &result {
            Ok(_) => {
                counter!("audit_requests_total", "outcome" => "success").increment(1);
            }
            Err(e) => {
                counter!("audit_requests_total", "outcome" => e.stage()).increment(1);
                error!(
                    submission_id = %request.submission_id,
                    stage = e.stage(),
                    "Audit pipeline failed: {}",
                    e
                );
            }
        }
        result
    }

    async fn run_pipeline(&self, request: &AuditRequest) -> Result<AuditArtifact, PipelineError> {
        let lease = self
            .workspace
            .acquire(request.submission_id, &request.directory_key())
            .await?;
        let html_path = lease.html_path();
        let pdf_path = lease.pdf_path();

        info!(
            submission_id = %request.submission_id,
            url = %request.url,
            runner = self.runner.name(),
            "Running audit"
        );
        let run = self
            .runner
            .run(AuditJob {
                url: &request.url,
                output_path: &html_path,
                headless: self.headless,
            })
            .await?;

        info!(
            submission_id = %request.submission_id,
            renderer = self.renderer.name(),
            "Rendering report"
        );
        self.renderer.render(&html_path, &pdf_path).await?;

        let report = self.notifier.notify(request).await?;
        info!(
            submission_id = %request.submission_id,
            task_created = report.task.is_created(),
            "Submitter registered"
        );

        let pdf = tokio::fs::read(&pdf_path).await?;

        Ok(AuditArtifact {
            submission_id: request.submission_id,
            pdf: Bytes::from(pdf),
            html_path,
            pdf_path,
            tool_exit: run.exit,
        })
    }
}
