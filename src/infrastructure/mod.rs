// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 该模块包含系统的技术实现细节，负责与外部系统的交互。
///
/// 包含的子模块：
/// - CRM（crm）：HighLevel CRM 的 HTTP 客户端
/// - 指标（metrics）：Prometheus 指标导出
/// - 存储（storage）：按提交标识符划分的报告目录
pub mod crm;
pub mod metrics;
pub mod storage;
