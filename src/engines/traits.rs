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

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// 审计工具错误类型
#[derive(Error, Debug)]
pub enum AuditToolError {
    /// 主机上找不到可执行文件
    #[error("Lighthouse not found. Install it with: npm install -g lighthouse")]
    NotFound,
    /// 启动子进程失败
    #[error("Failed to launch lighthouse at {}: {source}", path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 运行超时
    #[error("Lighthouse timed out after {0:?}")]
    TimedOut(Duration),
    /// 以非零状态退出（仅在策略为中止时返回）
    #[error("Lighthouse exited with status {code:?}: {stderr}")]
    ExitedNonZero { code: Option<i32>, stderr: String },
}

/// 渲染错误类型
#[derive(Error, Debug)]
pub enum RenderError {
    /// 浏览器启动或连接失败
    #[error("Browser launch failed: {0}")]
    Launch(String),
    /// 页面导航失败
    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },
    /// 页面脚本执行失败
    #[error("Script evaluation failed during {step}: {message}")]
    Script { step: &'static str, message: String },
    /// 等待就绪超时
    #[error("Timed out after {timeout:?} waiting for {step}")]
    NotReady {
        step: &'static str,
        timeout: Duration,
    },
    /// 导出前仍残留链接或页眉页脚
    #[error("Report still has {anchors} linked anchors and {chrome} visible chrome elements")]
    ChromeNotStripped { anchors: u64, chrome: u64 },
    /// PDF 导出失败
    #[error("PDF export failed: {0}")]
    Export(String),
    /// IO错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// 子进程退出情况
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolExit {
    /// 正常退出
    Success,
    /// 工具已运行但以非零状态退出，报告文件可能不完整
    ExitedNonZero { code: Option<i32> },
}

/// 非零退出的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NonZeroExitPolicy {
    /// 记录日志后按成功处理，继续渲染
    #[default]
    TreatAsSuccess,
    /// 中止流水线
    Abort,
}

/// 一次审计运行的结果
///
/// 报告内容只通过输出文件传递，这里仅携带控制台文本
#[derive(Debug, Clone)]
pub struct AuditRun {
    /// 标准输出
    pub stdout: String,
    /// 标准错误
    pub stderr: String,
    /// 退出情况
    pub exit: ToolExit,
}

/// 审计请求参数
#[derive(Debug, Clone)]
pub struct AuditJob<'a> {
    /// 目标URL
    pub url: &'a str,
    /// HTML 报告输出路径
    pub output_path: &'a Path,
    /// 是否无头运行
    pub headless: bool,
}

/// 审计运行器特质
#[async_trait]
pub trait AuditRunner: Send + Sync {
    /// 运行审计工具并把 HTML 报告写入输出路径
    async fn run(&self, job: AuditJob<'_>) -> Result<AuditRun, AuditToolError>;

    /// 运行器名称
    fn name(&self) -> &'static str;
}

/// 报告渲染器特质
#[async_trait]
pub trait ReportRenderer: Send + Sync {
    /// 把 HTML 报告渲染为 PDF 并写入目标路径
    async fn render(&self, html_path: &Path, pdf_path: &Path) -> Result<(), RenderError>;

    /// 渲染器名称
    fn name(&self) -> &'static str;
}
