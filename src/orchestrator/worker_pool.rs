//! 有界工作池 - 编排层
//!
//! ## 调度模型
//!
//! - N 个 worker 共享一个原子游标，每次 `fetch_add` 认领下一个编号
//! - 认领后立即释放游标，探测期间不持有任何共享锁
//! - 每个探测结果带着原始索引发送到完成通道，完成顺序不做保证
//! - N = 1 且设置请求间隔时即为顺序执行的 analyze 变体
//!
//! ## 关闭
//!
//! 两种情况会开始计算宽限期：取消令牌触发（不再认领新编号），
//! 或者最后一个编号已被认领。宽限期内等待进行中的探测完成，
//! 超时后强制中止。所有没有完成的编号都以 Error 结果补齐，不会静默丢失。

use std::any::Any;
use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::infrastructure::Renderer;
use crate::models::{Code, Outcome};
use crate::workflow::{ProbeCtx, ProbeSession, ProbeSettings};

/// 被中止或从未认领的编号使用的错误信息
pub const ABANDONED_MESSAGE: &str = "abandoned: run was interrupted before this code completed";

/// 工作池参数
#[derive(Debug, Clone)]
pub struct PoolSettings {
    /// 同时运行的探测数量上限
    pub concurrency: usize,
    /// 同一 worker 两次探测之间的间隔
    pub inter_request_delay: Option<Duration>,
    /// 关闭时等待进行中探测的最长时间
    pub shutdown_grace: Duration,
}

impl PoolSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            concurrency: config.effective_concurrency(),
            inter_request_delay: config.inter_request_delay(),
            shutdown_grace: config.shutdown_grace(),
        }
    }
}

/// 一个编号的完成消息
#[derive(Debug, Clone)]
pub struct Completion {
    /// 编号在输入列表中的位置
    pub index: usize,
    pub outcome: Outcome,
}

/// 有界工作池
pub struct WorkerPool {
    renderer: Arc<dyn Renderer>,
    probe: Arc<ProbeSettings>,
    settings: PoolSettings,
}

impl WorkerPool {
    pub fn new(renderer: Arc<dyn Renderer>, probe: ProbeSettings, settings: PoolSettings) -> Self {
        Self {
            renderer,
            probe: Arc::new(probe),
            settings,
        }
    }

    /// 启动全部 worker
    pub fn run_all(&self, codes: Vec<Code>) -> PoolRun {
        self.run_all_with(codes, CancellationToken::new())
    }

    /// 启动全部 worker，使用外部提供的取消令牌
    pub fn run_all_with(&self, codes: Vec<Code>, shutdown: CancellationToken) -> PoolRun {
        let codes: Arc<[Code]> = codes.into();
        let total = codes.len();
        let cursor = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = mpsc::unbounded_channel();
        let all_claimed = CancellationToken::new();

        // worker 数不超过编号数
        let worker_count = self.settings.concurrency.max(1).min(total);
        debug!("启动 {} 个 worker, 共 {} 个编号", worker_count, total);

        let handles = (0..worker_count)
            .map(|worker_id| {
                let worker = Worker {
                    id: worker_id,
                    codes: codes.clone(),
                    cursor: cursor.clone(),
                    renderer: self.renderer.clone(),
                    probe: self.probe.clone(),
                    inter_request_delay: self.settings.inter_request_delay,
                    shutdown: shutdown.clone(),
                    all_claimed: all_claimed.clone(),
                    tx: tx.clone(),
                };
                tokio::spawn(worker.run())
            })
            .collect();
        drop(tx);

        PoolRun {
            rx,
            handles,
            shutdown,
            all_claimed,
            grace: self.settings.shutdown_grace,
            deadline: None,
            codes,
            reported: vec![false; total],
            abandoned: None,
        }
    }
}

struct Worker {
    id: usize,
    codes: Arc<[Code]>,
    cursor: Arc<AtomicUsize>,
    renderer: Arc<dyn Renderer>,
    probe: Arc<ProbeSettings>,
    inter_request_delay: Option<Duration>,
    shutdown: CancellationToken,
    /// 最后一个编号被认领时触发
    all_claimed: CancellationToken,
    tx: mpsc::UnboundedSender<Completion>,
}

impl Worker {
    async fn run(self) {
        let total = self.codes.len();
        loop {
            if self.shutdown.is_cancelled() {
                debug!("worker {} 收到关闭请求，停止认领", self.id);
                break;
            }

            let index = self.cursor.fetch_add(1, Ordering::SeqCst);
            if index + 1 >= total {
                self.all_claimed.cancel();
            }
            if index >= total {
                break;
            }

            let ctx = ProbeCtx::new(index, self.codes[index].clone(), total);
            let outcome = self.probe_guarded(&ctx).await;
            if self.tx.send(Completion { index, outcome }).is_err() {
                warn!("worker {} 完成通道已关闭", self.id);
                break;
            }

            if let Some(delay) = self.inter_request_delay {
                if self.cursor.load(Ordering::SeqCst) < total {
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = self.shutdown.cancelled() => break,
                    }
                }
            }
        }
        debug!("worker {} 退出", self.id);
    }

    /// 执行一次探测，会话创建失败和 panic 都转换成 Error 结果
    async fn probe_guarded(&self, ctx: &ProbeCtx) -> Outcome {
        let session = ProbeSession::new(self.renderer.as_ref(), &self.probe);
        match AssertUnwindSafe(session.run(ctx)).catch_unwind().await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                error!("{} ❌ 无法创建渲染会话: {}", ctx, e);
                Outcome::error(ctx.code.clone(), e.to_string())
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!("{} ❌ 探测过程 panic: {}", ctx, message);
                Outcome::error(ctx.code.clone(), format!("probe panicked: {}", message))
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

enum Next {
    Message(Option<Completion>),
    ShutdownRequested,
    AllClaimed,
    GraceElapsed,
}

/// 一次运行的完成流
///
/// 保证每个索引恰好产出一个 `Completion`：正常完成的按到达顺序产出，
/// 中止或从未认领的在最后以 Error 结果补齐。
pub struct PoolRun {
    rx: mpsc::UnboundedReceiver<Completion>,
    handles: Vec<JoinHandle<()>>,
    shutdown: CancellationToken,
    all_claimed: CancellationToken,
    grace: Duration,
    deadline: Option<Instant>,
    codes: Arc<[Code]>,
    reported: Vec<bool>,
    abandoned: Option<VecDeque<Completion>>,
}

impl PoolRun {
    pub fn total(&self) -> usize {
        self.codes.len()
    }

    /// 取消令牌，用于从外部请求关闭
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// 请求关闭：不再认领新编号
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// 下一个完成的编号；全部产出后返回 `None`
    pub async fn recv(&mut self) -> Option<Completion> {
        loop {
            if let Some(abandoned) = self.abandoned.as_mut() {
                return abandoned.pop_front();
            }

            let next = match self.deadline {
                None => tokio::select! {
                    biased;
                    msg = self.rx.recv() => Next::Message(msg),
                    _ = self.shutdown.cancelled() => Next::ShutdownRequested,
                    _ = self.all_claimed.cancelled() => Next::AllClaimed,
                },
                Some(deadline) => match tokio::time::timeout_at(deadline, self.rx.recv()).await {
                    Ok(msg) => Next::Message(msg),
                    Err(_) => Next::GraceElapsed,
                },
            };

            match next {
                Next::Message(Some(completion)) => {
                    let Some(seen) = self.reported.get_mut(completion.index) else {
                        warn!("忽略越界的完成消息: {}", completion.index);
                        continue;
                    };
                    if *seen {
                        warn!("忽略重复的完成消息: {}", completion.index);
                        continue;
                    }
                    *seen = true;
                    return Some(completion);
                }
                Next::Message(None) => {
                    self.finish_with_abandoned();
                }
                Next::ShutdownRequested => {
                    info!(
                        "🛑 收到关闭请求，最多等待 {} 秒让进行中的探测完成",
                        self.grace.as_secs()
                    );
                    self.deadline = Some(Instant::now() + self.grace);
                }
                Next::AllClaimed => {
                    debug!(
                        "全部编号已认领，剩余探测最多再等待 {} 秒",
                        self.grace.as_secs()
                    );
                    self.deadline = Some(Instant::now() + self.grace);
                }
                Next::GraceElapsed => {
                    warn!("⏱️ 宽限期已到，强制中止剩余探测");
                    self.finish_with_abandoned();
                }
            }
        }
    }

    fn finish_with_abandoned(&mut self) {
        for handle in &self.handles {
            handle.abort();
        }
        self.rx.close();

        let mut abandoned = VecDeque::new();
        // 关闭通道后仍可能有已发送的消息
        while let Ok(completion) = self.rx.try_recv() {
            if let Some(seen) = self.reported.get_mut(completion.index) {
                if !*seen {
                    *seen = true;
                    abandoned.push_back(completion);
                }
            }
        }
        let mut missing = 0;
        for (index, seen) in self.reported.iter_mut().enumerate() {
            if !*seen {
                *seen = true;
                missing += 1;
                abandoned.push_back(Completion {
                    index,
                    outcome: Outcome::error(self.codes[index].clone(), ABANDONED_MESSAGE),
                });
            }
        }
        if missing > 0 {
            warn!("⚠️ {} 个编号未完成，已记为错误", missing);
        }
        self.abandoned = Some(abandoned);
    }
}

impl Drop for PoolRun {
    fn drop(&mut self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}
