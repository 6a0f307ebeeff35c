// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 包含的服务：
/// - CRM 通知（crm_notifier）：为提交人登记跟进任务和联系人
pub mod crm_notifier;
