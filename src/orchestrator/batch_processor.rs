//! 批量编号处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责一次完整运行的资源管理和调度。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：打开结果文件、创建渲染器
//! 2. **批量加载**：读取编号列表（不可读时在探测开始前终止）
//! 3. **并发控制**：交给 WorkerPool，按配置的并发数运行
//! 4. **结果收集**：ResultCollector 逐条落盘并按提交顺序整理
//! 5. **中断处理**：Ctrl-C 触发有界关闭，已收集的结果照常写出汇总
//! 6. **全局统计**：输出各分类数量

use crate::browser::LaunchSettings;
use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::{ChromiumRenderer, Renderer};
use crate::models::{load_codes, Code, ResultSet};
use crate::orchestrator::result_collector::ResultCollector;
use crate::orchestrator::worker_pool::{PoolSettings, WorkerPool};
use crate::services::{report, result_writer, ResultWriter};
use crate::utils::logging;
use crate::workflow::ProbeSettings;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// 应用主结构
pub struct App {
    config: Config,
    renderer: Arc<dyn Renderer>,
    writer: Arc<ResultWriter>,
}

impl App {
    /// 初始化应用（chromiumoxide 渲染器）
    pub async fn initialize(config: Config) -> AppResult<Self> {
        let launch = LaunchSettings {
            executable: config.browser_executable.as_ref().map(PathBuf::from),
            ..LaunchSettings::default()
        };
        let renderer = Arc::new(ChromiumRenderer::new(
            config.effective_isolation(),
            launch,
            config.browser_debug_port,
        ));
        Self::with_renderer(config, renderer)
    }

    /// 使用指定的渲染器初始化
    ///
    /// 结果文件打不开时直接失败，不会开始任何探测。
    pub fn with_renderer(config: Config, renderer: Arc<dyn Renderer>) -> AppResult<Self> {
        logging::log_startup(&config);
        let writer = Arc::new(ResultWriter::create(config.results_path())?);
        Ok(Self {
            config,
            renderer,
            writer,
        })
    }

    /// 运行应用主逻辑，Ctrl-C 触发有界关闭
    pub async fn run(&self) -> AppResult<ResultSet> {
        let codes = self.load_codes().await?;

        let shutdown = CancellationToken::new();
        let interrupt = {
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("⚠️ 收到中断信号，停止认领新的编号");
                    shutdown.cancel();
                }
            })
        };

        let result = self.run_codes(codes, shutdown).await;
        interrupt.abort();
        result
    }

    /// 加载编号
    async fn load_codes(&self) -> AppResult<Vec<Code>> {
        info!("\n📁 正在读取编号列表: {}", self.config.codes_file);
        let codes = load_codes(Path::new(&self.config.codes_file)).await?;
        if codes.is_empty() {
            warn!("⚠️ 编号列表为空");
        }
        Ok(codes)
    }

    /// 处理给定的编号
    ///
    /// 即使运行被中断，也会按已收集的结果写出汇总；
    /// 结果文件写入失败会在汇总写出之后再报告。
    pub async fn run_codes(&self, codes: Vec<Code>, shutdown: CancellationToken) -> AppResult<ResultSet> {
        let concurrency = self.config.effective_concurrency();
        logging::log_codes_loaded(codes.len(), concurrency);

        let pool = WorkerPool::new(
            self.renderer.clone(),
            ProbeSettings::from_config(&self.config),
            PoolSettings::from_config(&self.config),
        );
        let mut run = pool.run_all_with(codes, shutdown);

        let collector = ResultCollector::new(self.config.mode, self.writer.clone(), run.total());
        let collection = collector.collect(&mut run).await;
        drop(run);
        self.renderer.shutdown().await;

        let collection = collection?;
        let results = collection.results;

        // 输出汇总
        let summary_path = self.config.summary_path();
        let summary = report::render_summary(self.config.mode, &results);
        if let Err(e) = result_writer::write_report(&summary_path, &summary) {
            error!("❌ 汇总写入失败: {}", e);
            return Err(collection.write_error.unwrap_or(e));
        }

        // 输出最终统计
        logging::print_final_stats(
            self.config.mode,
            &results,
            &self.writer.path().display().to_string(),
            &summary_path,
        );

        match collection.write_error {
            Some(e) => Err(e),
            None => Ok(results),
        }
    }
}
