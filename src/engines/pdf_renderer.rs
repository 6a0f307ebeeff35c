// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::RendererSettings;
use crate::engines::render_scripts::{self, ChromeState};
use crate::engines::traits::{RenderError, ReportRenderer};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

/// 一次渲染使用的浏览器会话
///
/// 正常路径调用 `teardown`；渲染被中途取消时由 `Drop` 兜底清理
struct BrowserSession {
    browser: Option<Browser>,
    handler: JoinHandle<()>,
    /// 本地启动时的独立用户目录；连接远程浏览器时为空
    profile_dir: Option<PathBuf>,
}

impl BrowserSession {
    async fn new_page(&self) -> Result<Page, RenderError> {
        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| RenderError::Launch("browser session already closed".to_string()))?;
        browser
            .new_page("about:blank")
            .await
            .map_err(|e| RenderError::Launch(e.to_string()))
    }

    async fn teardown(mut self, page: Option<Page>) {
        if let Some(page) = page {
            if let Err(e) = page.close().await {
                debug!("Failed to close page: {}", e);
            }
        }

        if let Some(mut browser) = self.browser.take() {
            if self.profile_dir.is_some() {
                if let Err(e) = browser.close().await {
                    warn!("Failed to close browser: {}", e);
                }
                if let Err(e) = browser.wait().await {
                    debug!("Failed to wait for browser exit: {}", e);
                }
            }
        }
        self.handler.abort();

        if let Some(dir) = self.profile_dir.take() {
            if let Err(e) = tokio::fs::remove_dir_all(&dir).await {
                debug!("Failed to remove browser profile {}: {}", dir.display(), e);
            }
        }
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        // dropping a launched browser kills its process before the profile is removed
        drop(self.browser.take());
        self.handler.abort();

        if let Some(dir) = self.profile_dir.take() {
            warn!(
                profile = %dir.display(),
                "Render cancelled before teardown, cleaning up browser profile"
            );
            if let Err(e) = std::fs::remove_dir_all(&dir) {
                debug!("Failed to remove browser profile {}: {}", dir.display(), e);
            }
        }
    }
}

/// 报告就绪方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// 报告主体已渲染
    Report,
    /// 只有文档加载完成，报告可能不完整
    DocumentOnly,
}

/// 就绪选择器等待超时且文档已加载完成时，按不完整报告继续渲染
pub fn fallback_readiness(
    selector_wait: Result<(), RenderError>,
    document_complete: bool,
) -> Result<Readiness, RenderError> {
    match selector_wait {
        Ok(()) => Ok(Readiness::Report),
        Err(RenderError::NotReady { .. }) if document_complete => Ok(Readiness::DocumentOnly),
        Err(e) => Err(e),
    }
}

/// Chromium 报告渲染器
///
/// 基于 chromiumoxide 驱动无头浏览器，把 Lighthouse HTML 报告
/// 展开、去除导航元素后导出为 PDF。用显式就绪轮询代替固定等待。
#[derive(Debug, Clone)]
pub struct ChromiumRenderer {
    settings: RendererSettings,
}

impl ChromiumRenderer {
    pub fn new(settings: RendererSettings) -> Self {
        Self { settings }
    }

    async fn open_session(&self) -> Result<BrowserSession, RenderError> {
        let (browser, mut handler, profile_dir) =
            if let Some(url) = &self.settings.remote_debugging_url {
                info!("Connecting to remote Chrome instance at: {}", url);
                let (browser, handler) = Browser::connect(url)
                    .await
                    .map_err(|e| RenderError::Launch(format!("Failed to connect to remote Chrome: {}", e)))?;
                (browser, handler, None)
            } else {
                let profile_dir =
                    std::env::temp_dir().join(format!("lighthouse-audit-chrome-{}", Uuid::new_v4()));
                let mut builder = BrowserConfig::builder()
                    .no_sandbox()
                    .user_data_dir(&profile_dir)
                    .request_timeout(self.settings.ready_timeout())
                    .arg("--disable-gpu")
                    .arg("--disable-dev-shm-usage");
                if let Some(executable) = &self.settings.chrome_executable {
                    builder = builder.chrome_executable(executable);
                }

                let config = builder.build().map_err(RenderError::Launch)?;
                let (browser, handler) = Browser::launch(config)
                    .await
                    .map_err(|e| RenderError::Launch(e.to_string()))?;
                (browser, handler, Some(profile_dir))
            };

        // Drive CDP events for the lifetime of the session
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        Ok(BrowserSession {
            browser: Some(browser),
            handler,
            profile_dir,
        })
    }

    /// 打开报告并整理 DOM，返回导出前的页面状态
    async fn prepare(&self, page: &Page, file_url: &Url) -> Result<ChromeState, RenderError> {
        page.goto(file_url.as_str())
            .await
            .map_err(|e| RenderError::Navigation {
                url: file_url.to_string(),
                message: e.to_string(),
            })?;

        let selector_wait = self
            .wait_until(
                page,
                "report ready",
                &render_scripts::ready_probe(&self.settings.ready_selector),
            )
            .await;
        let document_complete = match &selector_wait {
            Err(RenderError::NotReady { .. }) => {
                evaluate::<bool>(page, "document ready", render_scripts::DOCUMENT_COMPLETE).await?
            }
            _ => false,
        };
        if fallback_readiness(selector_wait, document_complete)? == Readiness::DocumentOnly {
            warn!(
                selector = %self.settings.ready_selector,
                url = %file_url,
                "Report body not found, rendering a possibly partial report"
            );
        }

        let expanded: u64 = evaluate(page, "expand sections", render_scripts::EXPAND_SECTIONS).await?;
        self.wait_until(page, "sections expanded", render_scripts::SECTIONS_EXPANDED)
            .await?;

        let clumps: u64 = evaluate(page, "show more", render_scripts::SHOW_MORE_CLUMPS).await?;
        self.wait_until(page, "clumps expanded", render_scripts::CLUMPS_EXPANDED)
            .await?;

        let anchors: u64 = evaluate(page, "strip chrome", render_scripts::STRIP_CHROME).await?;
        debug!(expanded, clumps, anchors, "Report DOM prepared");

        evaluate(page, "verify chrome", render_scripts::CHROME_STATE).await
    }

    async fn drive(&self, page: &Page, file_url: &Url, pdf_path: &Path) -> Result<(), RenderError> {
        let timeout = self.settings.ready_timeout();

        let state = self.prepare(page, file_url).await?;
        if !state.is_clean() {
            return Err(RenderError::ChromeNotStripped {
                anchors: state.anchors,
                chrome: state.chrome,
            });
        }

        let params = PrintToPdfParams {
            paper_width: Some(self.settings.paper_width_in),
            paper_height: Some(self.settings.paper_height_in),
            print_background: Some(self.settings.print_background),
            ..Default::default()
        };
        let pdf = tokio::time::timeout(timeout, page.pdf(params))
            .await
            .map_err(|_| RenderError::NotReady {
                step: "pdf export",
                timeout,
            })?
            .map_err(|e| RenderError::Export(e.to_string()))?;

        tokio::fs::write(pdf_path, pdf).await?;
        Ok(())
    }

    /// 轮询布尔表达式直到为真或超时
    async fn wait_until(
        &self,
        page: &Page,
        step: &'static str,
        probe: &str,
    ) -> Result<(), RenderError> {
        let timeout = self.settings.ready_timeout();
        let deadline = Instant::now() + timeout;
        loop {
            if evaluate::<bool>(page, step, probe).await? {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(RenderError::NotReady { step, timeout });
            }
            tokio::time::sleep(self.settings.poll_interval()).await;
        }
    }
}

async fn evaluate<T: DeserializeOwned>(
    page: &Page,
    step: &'static str,
    script: &str,
) -> Result<T, RenderError> {
    let script_error = |message: String| RenderError::Script { step, message };

    let params = EvaluateParams::builder()
        .expression(script)
        .await_promise(true)
        .return_by_value(true)
        .build()
        .map_err(script_error)?;

    page.evaluate_expression(params)
        .await
        .map_err(|e| script_error(e.to_string()))?
        .into_value::<T>()
        .map_err(|e| script_error(e.to_string()))
}

/// 把本地报告路径转换为 `file://` URL
pub fn file_url(html_path: &Path) -> Result<Url, RenderError> {
    Url::from_file_path(html_path).map_err(|_| RenderError::Navigation {
        url: html_path.display().to_string(),
        message: "report path is not absolute".to_string(),
    })
}

#[async_trait]
impl ReportRenderer for ChromiumRenderer {
    async fn render(&self, html_path: &Path, pdf_path: &Path) -> Result<(), RenderError> {
        let start = Instant::now();
        let absolute = tokio::fs::canonicalize(html_path).await?;
        let url = file_url(&absolute)?;

        let session = self.open_session().await?;
        let page = match session.new_page().await {
            Ok(page) => page,
            Err(e) => {
                session.teardown(None).await;
                return Err(e);
            }
        };

        let result = self.drive(&page, &url, pdf_path).await;
        session.teardown(Some(page)).await;

        if result.is_ok() {
            info!(
                pdf = %pdf_path.display(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Report rendered"
            );
        }
        result
    }

    fn name(&self) -> &'static str {
        "chromium"
    }
}
