use anyhow::{Context, Result};
use chromiumoxide::Browser;
use tracing::info;

use super::BrowserHandle;

/// 连接到已运行的浏览器（需以 `--remote-debugging-port` 启动）
///
/// 连接得到的句柄关闭时只断开，不会结束外部浏览器进程。
pub async fn connect_to_browser(port: u16) -> Result<BrowserHandle> {
    let endpoint = format!("http://localhost:{}", port);
    info!("🔌 正在连接到浏览器: {}", endpoint);

    let (browser, events) = Browser::connect(&endpoint)
        .await
        .with_context(|| format!("无法连接调试端口 {}", port))?;

    Ok(BrowserHandle::attach(browser, events, false, None).await)
}
