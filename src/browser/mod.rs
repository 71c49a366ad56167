//! 浏览器生命周期：启动 / 连接 / 关闭

mod connection;
mod headless;
mod profile;

pub use connection::connect_to_browser;
pub use headless::launch_headless_browser;
pub use profile::ProfileDir;

use anyhow::Result;
use chromiumoxide::handler::Handler;
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// 事件循环启动后等待浏览器状态同步的时间
const ATTACH_SETTLE: Duration = Duration::from_millis(300);

/// 无头浏览器启动参数
#[derive(Debug, Clone)]
pub struct LaunchSettings {
    /// 浏览器可执行文件，为空时自动查找
    pub executable: Option<PathBuf>,
    pub args: Vec<String>,
}

impl Default for LaunchSettings {
    fn default() -> Self {
        Self {
            executable: None,
            args: vec![
                "--no-sandbox".to_string(),            // 禁用沙盒，防止权限问题导致的崩溃
                "--disable-dev-shm-usage".to_string(), // 防止共享内存不足
            ],
        }
    }
}

/// 浏览器连接及其后台事件任务
///
/// 句柄被直接丢弃时（任务被中止）：Browser 结束子进程，
/// 事件任务被中止，配置目录由 `ProfileDir` 删除。
pub struct BrowserHandle {
    browser: Browser,
    handler: JoinHandle<()>,
    /// 由本进程启动（而不是连接到外部浏览器）
    launched: bool,
    // 放在 browser 之后，保证先结束进程再删除目录
    profile_dir: Option<ProfileDir>,
}

impl BrowserHandle {
    /// 在后台驱动浏览器事件循环，并包装成句柄
    pub(crate) async fn attach(
        browser: Browser,
        mut events: Handler,
        launched: bool,
        profile_dir: Option<ProfileDir>,
    ) -> Self {
        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if let Err(e) = event {
                    debug!("浏览器事件循环结束: {}", e);
                    break;
                }
            }
        });
        tokio::time::sleep(ATTACH_SETTLE).await;

        Self {
            browser,
            handler,
            launched,
            profile_dir,
        }
    }

    /// 创建空白页面
    pub async fn new_blank_page(&self) -> Result<Page> {
        Ok(self.browser.new_page("about:blank").await?)
    }

    /// 关闭浏览器；连接到外部浏览器时只断开连接
    pub async fn close(mut self) {
        if self.launched {
            if let Err(e) = self.browser.close().await {
                warn!("关闭浏览器失败: {}", e);
            }
            if let Err(e) = self.browser.wait().await {
                warn!("等待浏览器进程退出失败: {}", e);
            }
        }
        self.handler.abort();

        if let Some(dir) = self.profile_dir.take() {
            dir.remove().await;
        }
        debug!("浏览器已关闭");
    }
}

impl Drop for BrowserHandle {
    fn drop(&mut self) {
        self.handler.abort();
    }
}
