// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::LighthouseSettings;
use crate::engines::traits::{
    AuditJob, AuditRun, AuditRunner, AuditToolError, NonZeroExitPolicy, ToolExit,
};
use async_trait::async_trait;
use metrics::counter;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, info, warn};

#[cfg(not(windows))]
const PROGRAM_NAME: &str = "lighthouse";

/// 可执行文件定位器
///
/// 优先使用显式配置的路径；否则 Windows 上查找 `%APPDATA%\npm\lighthouse.cmd`，
/// 其他平台在 `PATH` 中搜索 `lighthouse`。
#[derive(Debug, Clone, Default)]
pub struct ExecutableLocator {
    explicit: Option<PathBuf>,
}

impl ExecutableLocator {
    pub fn new(explicit: Option<PathBuf>) -> Self {
        Self { explicit }
    }

    /// 查找可执行文件，磁盘上不存在的候选视为未找到
    pub fn locate(&self) -> Option<PathBuf> {
        match &self.explicit {
            Some(path) => path.is_file().then(|| path.clone()),
            None => platform_default(),
        }
    }
}

#[cfg(windows)]
fn platform_default() -> Option<PathBuf> {
    let candidate = PathBuf::from(std::env::var_os("APPDATA")?)
        .join("npm")
        .join("lighthouse.cmd");
    candidate.is_file().then_some(candidate)
}

#[cfg(not(windows))]
fn platform_default() -> Option<PathBuf> {
    search_path(&std::env::var_os("PATH")?, PROGRAM_NAME)
}

/// 在 `PATH` 风格的目录列表中查找可执行程序
pub fn search_path(path: &OsStr, program: &str) -> Option<PathBuf> {
    std::env::split_paths(path)
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// 构造命令行参数：`<url> --output html --output-path <path> [--chrome-flags=--headless]`
pub fn build_args(job: &AuditJob<'_>) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        job.url.into(),
        "--output".into(),
        "html".into(),
        "--output-path".into(),
        job.output_path.as_os_str().to_owned(),
    ];
    if job.headless {
        args.push("--chrome-flags=--headless".into());
    }
    args
}

/// Lighthouse 运行器
///
/// 以子进程方式调用 Lighthouse CLI 并捕获其控制台输出
#[derive(Debug, Clone)]
pub struct LighthouseRunner {
    locator: ExecutableLocator,
    policy: NonZeroExitPolicy,
    timeout: Option<Duration>,
}

impl LighthouseRunner {
    pub fn new(
        locator: ExecutableLocator,
        policy: NonZeroExitPolicy,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            locator,
            policy,
            timeout,
        }
    }

    pub fn from_settings(settings: &LighthouseSettings) -> Self {
        let policy = if settings.fail_on_nonzero_exit {
            NonZeroExitPolicy::Abort
        } else {
            NonZeroExitPolicy::TreatAsSuccess
        };
        Self::new(
            ExecutableLocator::new(settings.executable.clone()),
            policy,
            settings.timeout(),
        )
    }
}

#[async_trait]
impl AuditRunner for LighthouseRunner {
    async fn run(&self, job: AuditJob<'_>) -> Result<AuditRun, AuditToolError> {
        let program = self.locator.locate().ok_or(AuditToolError::NotFound)?;
        debug!(program = %program.display(), url = job.url, "Launching lighthouse");

        let mut command = Command::new(&program);
        command
            .args(build_args(&job))
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let start = Instant::now();
        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, command.output())
                .await
                .map_err(|_| AuditToolError::TimedOut(limit))?,
            None => command.output().await,
        }
        .map_err(|source| AuditToolError::Spawn {
            path: program.clone(),
            source,
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        let exit = if output.status.success() {
            ToolExit::Success
        } else {
            ToolExit::ExitedNonZero {
                code: output.status.code(),
            }
        };

        match exit {
            ToolExit::Success => {
                info!(
                    url = job.url,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Lighthouse finished"
                );
            }
            ToolExit::ExitedNonZero { code } => {
                counter!("audit_tool_nonzero_exit_total").increment(1);
                warn!(
                    url = job.url,
                    code = ?code,
                    stderr = %stderr.trim(),
                    policy = ?self.policy,
                    "Lighthouse exited with non-zero status"
                );
                if self.policy == NonZeroExitPolicy::Abort {
                    return Err(AuditToolError::ExitedNonZero { code, stderr });
                }
            }
        }

        Ok(AuditRun {
            stdout,
            stderr,
            exit,
        })
    }

    fn name(&self) -> &'static str {
        "lighthouse"
    }
}
