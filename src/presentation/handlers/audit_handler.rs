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

use axum::{
    extract::{rejection::JsonRejection, Extension, Json},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

use crate::{
    application::{dto::audit_request::AuditRequestDto, usecases::run_audit::RunAuditUseCase},
    presentation::errors::AppError,
    utils::validators::ValidationError,
};

/// 返回给客户端的下载文件名
pub const DOWNLOAD_FILENAME: &str = "lighthouse-report.pdf";

/// 运行网站审计并返回 PDF 报告
///
/// 校验失败时不会创建任何报告目录
pub async fn create_audit(
    Extension(use_case): Extension<Arc<RunAuditUseCase>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(body) = payload.map_err(|rejection| {
        debug!("Rejected audit body: {}", rejection.body_text());
        ValidationError::InvalidBody
    })?;

    let request = AuditRequestDto::from_value(body)?.validate()?;
    info!(submission_id = %request.submission_id, url = %request.url, "Audit accepted");

    let artifact = use_case.execute(&request).await?;
    Ok(pdf_attachment(artifact.pdf))
}

fn pdf_attachment(pdf: Bytes) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", DOWNLOAD_FILENAME),
            ),
        ],
        pdf,
    )
        .into_response()
}
