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

use lighthouse_audit::application::usecases::run_audit::RunAuditUseCase;
use lighthouse_audit::config::settings::Settings;
use lighthouse_audit::domain::services::crm_notifier::{CrmNotifier, DisabledNotifier};
use lighthouse_audit::engines::lighthouse_runner::LighthouseRunner;
use lighthouse_audit::engines::pdf_renderer::ChromiumRenderer;
use lighthouse_audit::infrastructure::crm::highlevel_client::HighLevelClient;
use lighthouse_audit::infrastructure::metrics;
use lighthouse_audit::infrastructure::storage::ReportWorkspace;
use lighthouse_audit::presentation::routes;
use lighthouse_audit::utils::telemetry;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting lighthouse-audit...");

    // 2. Load configuration
    let settings = Settings::new()?;
    info!("Configuration loaded");

    // 3. Initialize Prometheus Metrics
    metrics::init_metrics(&settings.metrics)?;

    // 4. Audit and rendering engines
    let runner = Arc::new(LighthouseRunner::from_settings(&settings.lighthouse));
    let renderer = Arc::new(ChromiumRenderer::new(settings.renderer.clone()));

    // 5. CRM notifier
    let notifier: Arc<dyn CrmNotifier> = match settings.crm.disabled_reason() {
        None => {
            info!("CRM notifications enabled for {}", settings.crm.api_base);
            Arc::new(HighLevelClient::new(settings.crm.clone())?)
        }
        Some(reason) => {
            warn!("CRM notifications disabled: {}", reason);
            Arc::new(DisabledNotifier)
        }
    };

    // 6. Report workspace
    let workspace = ReportWorkspace::new(settings.storage.report_root.clone());
    info!(
        "Reports will be written under {}",
        workspace.root().display()
    );

    let use_case = Arc::new(RunAuditUseCase::new(
        workspace,
        runner,
        renderer,
        notifier,
        settings.lighthouse.headless,
    ));

    // 7. Start HTTP server
    let app = routes::app(use_case);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
