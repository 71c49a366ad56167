/// 日志工具模块
///
/// 提供日志初始化和格式化输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{Config, RunMode};
use crate::models::{OutcomeKind, ResultSet};

/// 初始化日志
///
/// 优先使用 `RUST_LOG`，否则按 `verbose` 选择 debug / info。
/// 重复调用是安全的（测试中会多次初始化）。
pub fn init(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    match config.mode {
        RunMode::Check => info!("🚀 程序启动 - 并发存在性检查模式"),
        RunMode::Analyze => info!("🚀 程序启动 - 顺序详细分析模式"),
    }
    info!("📊 最大并发数: {}", config.effective_concurrency());
    info!("🌐 站点: {}", config.site_root);
    info!(
        "🕒 启动时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
}

/// 记录编号加载信息
pub fn log_codes_loaded(total: usize, concurrency: usize) {
    info!("✓ 找到 {} 个待检查的编号", total);
    info!("📋 将以 {} 个并发探测处理", concurrency);
}

/// 打印最终统计信息
pub fn print_final_stats(mode: RunMode, results: &ResultSet, results_path: &str, summary_path: &str) {
    let tally = &results.tally;
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("总数: {}", results.len());
    match mode {
        RunMode::Check => {
            info!("✅ 找到: {}", tally.found());
            info!("➖ 未找到: {}", tally.not_found());
        }
        RunMode::Analyze => {
            info!("1️⃣ 单个结果: {}", tally.count(OutcomeKind::Single));
            info!("🔢 多个结果: {}", tally.count(OutcomeKind::Multiple));
            info!("📄 仅静态页面: {}", tally.static_html_only());
        }
    }
    info!("❌ 错误: {}", tally.count(OutcomeKind::Error));
    info!("{}", "=".repeat(60));
    info!("\n结果已保存至: {} / {}", results_path, summary_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
