use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use chromiumoxide::{Browser, BrowserConfig};
use tracing::{debug, error};

use super::{BrowserHandle, LaunchSettings, ProfileDir};

/// 进程内启动次数，用于生成互不冲突的配置目录
static LAUNCH_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// 启动无头浏览器
///
/// 每个实例使用独立的用户数据目录，多个浏览器可以同时运行。
pub async fn launch_headless_browser(settings: &LaunchSettings) -> Result<BrowserHandle> {
    let profile_dir = ProfileDir::new(unique_profile_dir());
    debug!("🚀 启动无头浏览器, 配置目录: {}", profile_dir.path().display());

    let mut builder = BrowserConfig::builder()
        .new_headless_mode()
        .user_data_dir(profile_dir.path())
        .args(settings.args.clone());
    if let Some(executable) = &settings.executable {
        builder = builder.chrome_executable(executable);
    }
    let config = builder.build().map_err(|e| {
        error!("配置无头浏览器失败: {}", e);
        anyhow::anyhow!("配置无头浏览器失败: {}", e)
    })?;

    let (browser, events) = match Browser::launch(config).await {
        Ok(launched) => launched,
        Err(e) => {
            error!("启动无头浏览器失败: {}", e);
            // 启动失败时 Chrome 可能已经写入了部分配置
            profile_dir.remove().await;
            return Err(anyhow::anyhow!("启动无头浏览器失败: {}", e));
        }
    };
    debug!("无头浏览器启动成功");

    Ok(BrowserHandle::attach(browser, events, true, Some(profile_dir)).await)
}

fn unique_profile_dir() -> PathBuf {
    let n = LAUNCH_COUNTER.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("catalog-probe-{}-{}", std::process::id(), n))
}
