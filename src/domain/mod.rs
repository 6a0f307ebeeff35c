// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含系统的核心业务概念，包括：
/// - 领域模型（models）：经过校验的审计请求
/// - 服务（services）：CRM 通知等领域服务接口
///
/// 领域层不依赖于任何外部实现。
pub mod models;
pub mod services;
