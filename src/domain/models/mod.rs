// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// - 审计请求（audit_request）：一次经过校验的网站审计提交
pub mod audit_request;
