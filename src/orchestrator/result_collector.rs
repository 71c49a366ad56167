//! 结果收集器 - 编排层
//!
//! 从工作池的完成流中逐条接收结果（到达顺序任意）：
//! 1. 立即写入结果文件（逐条落盘）
//! 2. 放进按输入长度预先分配的槽位
//!
//! 流结束后检查每个槽位都已填充，按提交顺序生成 ResultSet。

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::config::RunMode;
use crate::error::{AppError, AppResult};
use crate::models::{Outcome, ResultSet};
use crate::orchestrator::worker_pool::{Completion, PoolRun};
use crate::services::report;
use crate::services::ResultWriter;

/// 收集完成后的结果
#[derive(Debug)]
pub struct Collection {
    pub results: ResultSet,
    /// 第一次写入失败（已写入的行仍然保留在文件中）
    pub write_error: Option<AppError>,
}

/// 结果收集器
pub struct ResultCollector {
    mode: RunMode,
    writer: Arc<ResultWriter>,
    slots: Vec<Option<Outcome>>,
    received: usize,
    write_error: Option<AppError>,
}

impl ResultCollector {
    pub fn new(mode: RunMode, writer: Arc<ResultWriter>, total: usize) -> Self {
        Self {
            mode,
            writer,
            slots: vec![None; total],
            received: 0,
            write_error: None,
        }
    }

    /// 消费完整的完成流
    pub async fn collect(mut self, run: &mut PoolRun) -> AppResult<Collection> {
        while let Some(completion) = run.recv().await {
            self.record(completion);
        }
        self.finish()
    }

    /// 记录一条结果
    pub fn record(&mut self, completion: Completion) {
        let Completion { index, outcome } = completion;

        // 先校验槽位，被拒绝的结果不落盘
        match self.slots.get(index) {
            None => {
                warn!("忽略越界的结果: {} ({})", index, outcome.code);
                return;
            }
            Some(Some(_)) => {
                warn!("忽略重复的结果: {} ({})", index, outcome.code);
                return;
            }
            Some(None) => {}
        }

        let line = report::result_line(self.mode, &outcome);
        if self.write_error.is_none() {
            if let Err(e) = self.writer.write_line(&line) {
                error!("❌ 结果写入失败，后续结果只保留在内存中: {}", e);
                self.write_error = Some(e);
            }
        }

        self.slots[index] = Some(outcome);
        self.received += 1;

        info!("[{}/{}] {}", self.received, self.slots.len(), line);
    }

    /// 按提交顺序生成结果集
    pub fn finish(self) -> AppResult<Collection> {
        let total = self.slots.len();
        let missing = self.slots.iter().filter(|slot| slot.is_none()).count();
        if missing > 0 {
            return Err(AppError::Incomplete { missing, total });
        }

        let outcomes = self.slots.into_iter().flatten().collect();
        Ok(Collection {
            results: ResultSet::from_ordered(outcomes),
            write_error: self.write_error,
        })
    }
}
