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

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// 应用程序配置设置
///
/// 包含服务器、报告存储、Lighthouse、渲染器、CRM 和指标等所有配置项
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 服务器配置
    pub server: ServerSettings,
    /// 报告存储配置
    pub storage: StorageSettings,
    /// Lighthouse 命令行工具配置
    pub lighthouse: LighthouseSettings,
    /// PDF 渲染器配置
    pub renderer: RendererSettings,
    /// CRM 配置
    pub crm: CrmSettings,
    /// 指标配置
    pub metrics: MetricsSettings,
}

/// 服务器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// 服务器监听主机地址
    pub host: String,
    /// 服务器监听端口
    pub port: u16,
}

/// 报告存储配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// 报告根目录，每次提交在其下创建 `<uuid>/` 子目录
    pub report_root: PathBuf,
}

/// Lighthouse 配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct LighthouseSettings {
    /// 显式指定的可执行文件路径，设置后跳过平台查找
    pub executable: Option<PathBuf>,
    /// 是否以无头模式启动 Chrome
    pub headless: bool,
    /// 工具以非零状态退出时是否中止流水线
    pub fail_on_nonzero_exit: bool,
    /// 工具运行超时时间（秒），未设置时无限等待
    pub timeout_secs: Option<u64>,
}

impl LighthouseSettings {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// 渲染器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct RendererSettings {
    /// Chrome 可执行文件路径
    pub chrome_executable: Option<PathBuf>,
    /// 远程调试地址，设置后连接已有浏览器而不是启动新实例
    pub remote_debugging_url: Option<String>,
    /// 报告渲染完成的标志选择器
    pub ready_selector: String,
    /// 每个就绪等待的超时时间（毫秒）
    pub ready_timeout_ms: u64,
    /// 就绪轮询间隔（毫秒）
    pub poll_interval_ms: u64,
    /// 纸张宽度（英寸）
    pub paper_width_in: f64,
    /// 纸张高度（英寸）
    pub paper_height_in: f64,
    /// 是否打印背景
    pub print_background: bool,
}

impl RendererSettings {
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            chrome_executable: None,
            remote_debugging_url: None,
            ready_selector: ".lh-category".to_string(),
            ready_timeout_ms: 30_000,
            poll_interval_ms: 100,
            paper_width_in: 8.27,
            paper_height_in: 11.69,
            print_background: true,
        }
    }
}

/// CRM 配置设置
///
/// 在构造时注入通知器，替代模块级常量
#[derive(Debug, Clone, Deserialize)]
pub struct CrmSettings {
    /// 是否启用 CRM 通知
    pub enabled: bool,
    /// API 基础地址
    pub api_base: String,
    /// API 版本请求头
    pub api_version: String,
    /// Bearer 凭证
    pub api_key: Option<String>,
    /// 联系人所属位置 ID
    pub location_id: String,
    /// 任务指派人 ID
    pub assignee_id: String,
    /// 任务创建人 ID
    pub creator_id: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl CrmSettings {
    /// 是否具备发送通知的条件
    pub fn is_active(&self) -> bool {
        self.disabled_reason().is_none()
    }

    /// 通知未启用的原因，启用时为空
    pub fn disabled_reason(&self) -> Option<&'static str> {
        if !self.enabled {
            Some("crm.enabled is false")
        } else if !self.api_key.as_deref().is_some_and(|key| !key.is_empty()) {
            Some("no API key configured")
        } else {
            None
        }
    }
}

/// 指标配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    /// 是否启用 Prometheus 导出器
    pub enabled: bool,
    /// 导出器监听地址
    pub listen_addr: String,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次加载内置默认值、`config/default`、`config/<APP_ENVIRONMENT>`
    /// 和 `LIGHTHOUSE_AUDIT__` 前缀的环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        Self::builder()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("LIGHTHOUSE_AUDIT").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// 仅包含内置默认值的配置
    pub fn defaults() -> Result<Self, ConfigError> {
        Self::builder()?.build()?.try_deserialize()
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        let renderer = RendererSettings::default();
        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 5000)?
            .set_default("storage.report_root", "report")?
            .set_default("lighthouse.headless", true)?
            .set_default("lighthouse.fail_on_nonzero_exit", false)?
            .set_default("renderer.ready_selector", renderer.ready_selector)?
            .set_default("renderer.ready_timeout_ms", renderer.ready_timeout_ms)?
            .set_default("renderer.poll_interval_ms", renderer.poll_interval_ms)?
            .set_default("renderer.paper_width_in", renderer.paper_width_in)?
            .set_default("renderer.paper_height_in", renderer.paper_height_in)?
            .set_default("renderer.print_background", renderer.print_background)?
            .set_default("crm.enabled", true)?
            .set_default("crm.api_base", "https://services.leadconnectorhq.com")?
            .set_default("crm.api_version", "2021-07-28")?
            .set_default("crm.location_id", "")?
            .set_default("crm.assignee_id", "")?
            .set_default("crm.creator_id", "")?
            .set_default("crm.timeout_secs", 30)?
            .set_default("metrics.enabled", false)?
            .set_default("metrics.listen_addr", "0.0.0.0:9000")
    }
}
