//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量编号处理器
//! - 管理应用生命周期（初始化、运行、清理）
//! - 加载编号列表（Vec<Code>）
//! - 管理渲染器资源
//! - 输出汇总和全局统计
//!
//! ### `worker_pool` - 有界工作池
//! - 原子游标认领编号
//! - 每个编号一个探测会话
//! - 有界关闭，未完成的编号补齐为 Error
//!
//! ### `result_collector` - 结果收集器
//! - 逐条落盘
//! - 按提交顺序整理结果
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<Code>)
//!     ↓
//! worker_pool ──(index, Outcome)──→ result_collector
//!     ↓
//! workflow::ProbeSession (处理单个编号)
//!     ↓
//! services (能力层：classifier / report / result_writer)
//!     ↓
//! infrastructure (基础设施：Renderer / JsExecutor)
//! ```

pub mod batch_processor;
pub mod result_collector;
pub mod worker_pool;

// 重新导出主要类型
pub use batch_processor::App;
pub use result_collector::{Collection, ResultCollector};
pub use worker_pool::{Completion, PoolRun, PoolSettings, WorkerPool, ABANDONED_MESSAGE};
