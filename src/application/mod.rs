// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 包含请求 DTO 与审计流水线用例，负责协调领域对象和基础设施
pub mod dto;
pub mod usecases;
