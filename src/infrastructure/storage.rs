// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;
use uuid::Uuid;

pub const REPORT_FILE: &str = "report.html";
pub const PDF_FILE: &str = "output.pdf";

/// 报告目录错误类型
#[derive(Error, Debug)]
pub enum WorkspaceError {
    /// 创建目录失败
    #[error("Failed to create report directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// 报告工作区
///
/// 每个提交标识符对应 `<root>/<uuid>/` 目录。同一标识符的并发请求
/// 通过按标识符划分的异步锁串行执行；目录从不被删除，重复提交会覆盖旧产物。
#[derive(Clone, Debug)]
pub struct ReportWorkspace {
    root: PathBuf,
    locks: Arc<DashMap<Uuid, Arc<Mutex<()>>>>,
}

impl ReportWorkspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            locks: Arc::new(DashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 指定目录名称的报告目录路径
    pub fn directory_for(&self, directory_key: &str) -> PathBuf {
        self.root.join(directory_key)
    }

    /// 获取报告目录租约
    ///
    /// 等待同一标识符的前一个租约释放，然后幂等地创建目录。
    /// 锁按解析后的标识符划分，大小写不同的同一标识符也会串行执行。
    pub async fn acquire(
        &self,
        submission_id: Uuid,
        directory_key: &str,
    ) -> Result<ReportLease, WorkspaceError> {
        let lock = self
            .locks
            .entry(submission_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = lock.lock_owned().await;

        // the lease owns the lock entry from here on, so a failure below still releases it
        let lease = ReportLease {
            submission_id,
            directory: self.directory_for(directory_key),
            locks: self.locks.clone(),
            guard: Some(guard),
        };

        tokio::fs::create_dir_all(&lease.directory)
            .await
            .map_err(|source| WorkspaceError::CreateDir {
                path: lease.directory.clone(),
                source,
            })?;
        debug!(directory = %lease.directory.display(), "Report directory acquired");

        Ok(lease)
    }

    /// 当前持有或等待中的标识符数量
    pub fn active_leases(&self) -> usize {
        self.locks.len()
    }
}

/// 报告目录租约
///
/// 持有期间同一标识符的其他请求会等待；释放时清理空闲的锁条目
#[derive(Debug)]
pub struct ReportLease {
    submission_id: Uuid,
    directory: PathBuf,
    locks: Arc<DashMap<Uuid, Arc<Mutex<()>>>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl ReportLease {
    pub fn submission_id(&self) -> Uuid {
        self.submission_id
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn html_path(&self) -> PathBuf {
        self.directory.join(REPORT_FILE)
    }

    pub fn pdf_path(&self) -> PathBuf {
        self.directory.join(PDF_FILE)
    }
}

impl Drop for ReportLease {
    fn drop(&mut self) {
        drop(self.guard.take());
        // only the map still references the lock when nobody is waiting
        self.locks
            .remove_if(&self.submission_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}
