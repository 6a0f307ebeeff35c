// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::Serialize;
use uuid::Uuid;

/// 审计请求实体
///
/// 由经过校验的入站字段构造，一经接受即不可变。
/// 生命周期在响应发送后结束，请求本身不做持久化。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditRequest {
    /// 提交人姓名
    pub name: String,
    /// 提交人邮箱
    pub email: String,
    /// 待审计的网站地址
    pub url: String,
    /// 提交人电话
    pub phone: String,
    /// 解析后的提交标识符
    pub submission_id: Uuid,
    /// 客户端提交的标识符原文
    pub submitted_uuid: String,
}

impl AuditRequest {
    /// 报告目录名称
    ///
    /// 连字符和无连字符形式按提交原文使用；花括号和 `urn:uuid:` 形式
    /// 以及其他任何含非十六进制字符的输入都转换为小写连字符形式
    pub fn directory_key(&self) -> String {
        let submitted = self.submitted_uuid.as_str();
        let plain = !submitted.is_empty()
            && submitted
                .chars()
                .all(|c| c.is_ascii_hexdigit() || c == '-');
        if plain && Uuid::parse_str(submitted).ok() == Some(self.submission_id) {
            submitted.to_string()
        } else {
            self.submission_id.hyphenated().to_string()
        }
    }

    /// CRM 任务标题，格式为 `<name>-<phone>`
    pub fn task_title(&self) -> String {
        format!("{}-{}", self.name, self.phone)
    }

    /// CRM 任务正文
    pub fn task_body(&self) -> String {
        format!(
            "Name: {}\nPhone: {}\nEmail: {}\nURL: {}\n",
            self.name, self.phone, self.email, self.url
        )
    }
}
