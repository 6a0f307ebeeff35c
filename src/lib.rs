// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 包含请求 DTO 和审计流水线用例
pub mod application;

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含审计请求实体和 CRM 通知接口
pub mod domain;

/// 引擎模块
///
/// 实现 Lighthouse 审计执行和 PDF 报告渲染
pub mod engines;

/// 基础设施模块
///
/// 提供报告目录、CRM 客户端和指标导出等外部集成
pub mod infrastructure;

/// 表示层模块
///
/// 处理HTTP请求和响应，包括路由和处理器
pub mod presentation;

/// 工具模块
///
/// 提供日志初始化和输入校验等辅助功能
pub mod utils;
