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

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use url::{Host, Url};
use uuid::Uuid;

/// 宽松的 `local@domain.tld` 形式，只锚定开头
static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@]+@[^@]+\.[^@]+").expect("email pattern is valid"));

const ALLOWED_SCHEMES: [&str; 4] = ["http", "https", "ftp", "ftps"];

/// 验证错误类型
///
/// 显示文本即返回给客户端的错误消息
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// 请求体不是 JSON 对象
    #[error("Invalid JSON body")]
    InvalidBody,
    /// 缺少必填字段
    #[error("Missing field: {0}")]
    MissingField(&'static str),
    /// 字段存在但不是字符串
    #[error("Invalid field: {0}")]
    InvalidField(&'static str),
    /// 邮箱无效
    #[error("Invalid email address")]
    InvalidEmail,
    /// URL无效
    #[error("Invalid URL")]
    InvalidUrl,
    /// UUID无效
    #[error("Invalid UUID")]
    InvalidUuid,
}

/// 验证邮箱
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if EMAIL_REGEX.is_match(email) {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail)
    }
}

/// 验证URL
///
/// 要求受支持的协议、完整的主机名（带顶级域）或 IP 地址，且不含空白字符
///
/// # 参数
///
/// * `url` - URL字符串
///
/// # 返回值
///
/// * `Ok(())` - URL有效
/// * `Err(ValidationError)` - URL无效
pub fn validate_url(url: &str) -> Result<(), ValidationError> {
    if url.is_empty() || url.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ValidationError::InvalidUrl);
    }

    let parsed = Url::parse(url).map_err(|_| ValidationError::InvalidUrl)?;
    if !ALLOWED_SCHEMES.contains(&parsed.scheme()) {
        return Err(ValidationError::InvalidUrl);
    }

    match parsed.host() {
        Some(Host::Domain(domain)) if is_valid_domain(domain) => Ok(()),
        Some(Host::Ipv4(_)) | Some(Host::Ipv6(_)) => Ok(()),
        _ => Err(ValidationError::InvalidUrl),
    }
}

/// 验证UUID并返回解析结果
pub fn validate_uuid(value: &str) -> Result<Uuid, ValidationError> {
    Uuid::parse_str(value).map_err(|_| ValidationError::InvalidUuid)
}

fn is_valid_domain(domain: &str) -> bool {
    let domain = domain.strip_suffix('.').unwrap_or(domain);
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }

    let labels_ok = labels.iter().all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    });

    let tld = labels[labels.len() - 1];
    let tld_ok = tld.starts_with("xn--")
        || (tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic()));

    labels_ok && tld_ok
}
