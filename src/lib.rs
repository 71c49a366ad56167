//! # Catalog Probe
//!
//! 批量检查商品编号在目录站点上的结果：渲染每个编号的页面，
//! 读取内嵌的内容 frame，判断是无结果、单个结果还是多个结果。
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（浏览器 / 页面），只暴露渲染能力
//! - `Renderer` / `RenderSession` / `RenderedFrame` - 可替换的渲染接口
//! - `ChromiumRenderer` - chromiumoxide 实现，`JsExecutor` 负责页面内脚本
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个结果
//! - `classifier` - frame 文本分类（纯函数）
//! - `report` - 结果行和汇总格式
//! - `ResultWriter` - 逐条写入结果文件
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个编号"的完整探测流程
//! - `ProbeCtx` - 上下文封装（索引 + 编号）
//! - `ProbeSession` - 导航 → 等待 frame → 读取 → 分类 → 关闭
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/worker_pool` - 有界并发，原子游标认领编号
//! - `orchestrator/result_collector` - 逐条落盘，按提交顺序整理
//! - `orchestrator/batch_processor` - 应用入口，资源和统计
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{Config, RunMode, SessionIsolation};
pub use error::{AppError, AppResult, ProbeError, ProbeResult};
pub use infrastructure::{ChromiumRenderer, RenderSession, RenderedFrame, Renderer};
pub use models::{Code, Outcome, OutcomeKind, ResultSet, Tally};
pub use orchestrator::{App, PoolRun, PoolSettings, ResultCollector, WorkerPool};
pub use workflow::{ProbeCtx, ProbeSession, ProbeSettings, ProbeStyle};
