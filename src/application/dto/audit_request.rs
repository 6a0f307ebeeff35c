// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde_json::{Map, Value};

use crate::domain::models::audit_request::AuditRequest;
use crate::utils::validators::{self, ValidationError};

/// 必填字段，按校验顺序排列
pub const REQUIRED_FIELDS: [&str; 5] = ["name", "emailid", "url", "phone", "uuid"];

/// 审计请求数据传输对象
///
/// 保留原始 JSON 对象，以便按固定顺序报告缺失字段
#[derive(Debug, Clone)]
pub struct AuditRequestDto {
    fields: Map<String, Value>,
}

impl AuditRequestDto {
    /// 从请求体构造，非对象请求体视为无效
    pub fn from_value(body: Value) -> Result<Self, ValidationError> {
        match body {
            Value::Object(fields) => Ok(Self { fields }),
            _ => Err(ValidationError::InvalidBody),
        }
    }

    /// 校验并转换为领域实体
    ///
    /// 先按 name→emailid→url→phone→uuid 的顺序检查字段存在性，
    /// 再依次校验邮箱、URL 和 UUID 格式
    pub fn validate(self) -> Result<AuditRequest, ValidationError> {
        for field in REQUIRED_FIELDS {
            self.field(field)?;
        }

        let name = self.field("name")?;
        let email = self.field("emailid")?;
        let url = self.field("url")?;
        let phone = self.field("phone")?;
        let uuid = self.field("uuid")?;

        validators::validate_email(email)?;
        validators::validate_url(url)?;
        let submission_id = validators::validate_uuid(uuid)?;

        Ok(AuditRequest {
            name: name.to_string(),
            email: email.to_string(),
            url: url.to_string(),
            phone: phone.to_string(),
            submission_id,
            submitted_uuid: uuid.to_string(),
        })
    }

    fn field(&self, name: &'static str) -> Result<&str, ValidationError> {
        match self.fields.get(name) {
            None | Some(Value::Null) => Err(ValidationError::MissingField(name)),
            Some(Value::String(value)) => Ok(value),
            Some(_) => Err(ValidationError::InvalidField(name)),
        }
    }
}
