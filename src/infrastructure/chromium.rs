//! chromiumoxide 渲染后端 - 基础设施层
//!
//! 三种会话方式：
//! - `Isolated`：每个会话启动独立的无头浏览器，关闭会话时一起关闭
//! - `Shared`：首次使用时启动一个浏览器，之后每个会话开一个新页面
//! - `Connect`：连接到已运行的浏览器（调试端口），每个会话开一个新页面

use crate::browser::{self, BrowserHandle, LaunchSettings};
use crate::config::SessionIsolation;
use crate::error::{ProbeError, ProbeResult};
use crate::infrastructure::renderer::{FramePredicate, RenderSession, RenderedFrame, Renderer};
use crate::infrastructure::JsExecutor;
use async_trait::async_trait;
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// 选择器轮询间隔
const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// 列出页面内所有 iframe 及其当前 URL（同源时取实际加载地址，否则取 src）
const LIST_FRAMES_JS: &str = r#"
(() => Array.from(document.querySelectorAll('iframe')).map((el, index) => {
    let url = el.src || '';
    try {
        const href = el.contentWindow && el.contentWindow.location.href;
        if (href && href !== 'about:blank') { url = href; }
    } catch (e) {}
    return { index, url };
}))()
"#;

#[derive(Debug, Deserialize)]
struct FrameInfo {
    index: usize,
    url: String,
}

#[derive(Debug, Deserialize)]
struct FrameDocument {
    ok: bool,
    html: String,
}

/// chromiumoxide 渲染器
pub struct ChromiumRenderer {
    isolation: SessionIsolation,
    launch: LaunchSettings,
    debug_port: u16,
    shared: Mutex<Option<Arc<BrowserHandle>>>,
}

impl ChromiumRenderer {
    pub fn new(isolation: SessionIsolation, launch: LaunchSettings, debug_port: u16) -> Self {
        Self {
            isolation,
            launch,
            debug_port,
            shared: Mutex::new(None),
        }
    }

    /// 取得共享浏览器，首次调用时启动或连接
    async fn shared_browser(&self) -> ProbeResult<Arc<BrowserHandle>> {
        let mut slot = self.shared.lock().await;
        if let Some(handle) = slot.as_ref() {
            return Ok(handle.clone());
        }

        let handle = match self.isolation {
            SessionIsolation::Connect => browser::connect_to_browser(self.debug_port).await,
            _ => browser::launch_headless_browser(&self.launch).await,
        }
        .map_err(ProbeError::resource)?;

        let handle = Arc::new(handle);
        *slot = Some(handle.clone());
        Ok(handle)
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn new_session(&self) -> ProbeResult<Box<dyn RenderSession>> {
        match self.isolation {
            SessionIsolation::Isolated => {
                let handle = browser::launch_headless_browser(&self.launch)
                    .await
                    .map_err(ProbeError::resource)?;
                match handle.new_blank_page().await {
                    Ok(page) => Ok(Box::new(ChromiumSession::new(page, Some(handle)))),
                    Err(e) => {
                        handle.close().await;
                        Err(ProbeError::resource(e))
                    }
                }
            }
            SessionIsolation::Shared | SessionIsolation::Connect => {
                let handle = self.shared_browser().await?;
                let page = handle
                    .new_blank_page()
                    .await
                    .map_err(ProbeError::resource)?;
                Ok(Box::new(ChromiumSession::new(page, None)))
            }
        }
    }

    async fn shutdown(&self) {
        let Some(handle) = self.shared.lock().await.take() else {
            return;
        };
        match Arc::try_unwrap(handle) {
            Ok(handle) => handle.close().await,
            Err(_) => warn!("⚠️ 共享浏览器仍被占用，跳过关闭"),
        }
    }
}

/// 一个编号独占的页面；`Isolated` 方式下还独占整个浏览器
struct ChromiumSession {
    executor: JsExecutor,
    owned_browser: Option<BrowserHandle>,
    /// 最近一次导航的地址，用于错误信息
    current_url: String,
}

impl ChromiumSession {
    fn new(page: Page, owned_browser: Option<BrowserHandle>) -> Self {
        Self {
            executor: JsExecutor::new(page),
            owned_browser,
            current_url: String::new(),
        }
    }
}

#[async_trait]
impl RenderSession for ChromiumSession {
    async fn navigate(&mut self, url: &str) -> ProbeResult<()> {
        debug!("导航到: {}", url);
        self.current_url = url.to_string();
        self.executor
            .page()
            .goto(url)
            .await
            .map(|_| ())
            .map_err(|e| ProbeError::navigation(url, e))
    }

    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> ProbeResult<()> {
        let page = self.executor.page();
        let url = self.current_url.as_str();
        let poll = async {
            loop {
                match page.find_element(selector).await {
                    Ok(_) => return Ok(()),
                    Err(e) if element_pending(&e) => {}
                    Err(e) => return Err(ProbeError::navigation(url, e)),
                }
                tokio::time::sleep(SELECTOR_POLL_INTERVAL).await;
            }
        };
        match tokio::time::timeout(timeout, poll).await {
            Ok(result) => result,
            Err(_) => Err(ProbeError::FrameTimeout {
                selector: selector.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            }),
        }
    }

    async fn frame_matching(
        &mut self,
        predicate: FramePredicate<'_>,
    ) -> ProbeResult<Option<Box<dyn RenderedFrame>>> {
        let frames: Vec<FrameInfo> = self
            .executor
            .eval_as(LIST_FRAMES_JS)
            .await
            .map_err(ProbeError::extraction)?;
        debug!("页面共有 {} 个 iframe", frames.len());

        let matched = frames.into_iter().find(|frame| predicate(frame.url.as_str()));
        Ok(matched.map(|frame| {
            Box::new(ChromiumFrame {
                executor: JsExecutor::new(self.executor.page().clone()),
                index: frame.index,
                url: frame.url,
            }) as Box<dyn RenderedFrame>
        }))
    }

    async fn close(self: Box<Self>) -> ProbeResult<()> {
        let ChromiumSession {
            executor,
            owned_browser,
            current_url: _,
        } = *self;
        let page_result = executor.into_page().close().await;
        if let Some(handle) = owned_browser {
            handle.close().await;
        }
        page_result.map_err(ProbeError::resource)
    }
}

/// 元素还没出现时 CDP 返回协议错误（找不到节点）或 `NotFound`；
/// 连接断开、页面崩溃等其他错误不再轮询
fn element_pending(err: &CdpError) -> bool {
    matches!(err, CdpError::Chrome(_) | CdpError::NotFound)
}

/// 通过父页面读取同源 iframe 的文档
struct ChromiumFrame {
    executor: JsExecutor,
    index: usize,
    url: String,
}

#[async_trait]
impl RenderedFrame for ChromiumFrame {
    fn url(&self) -> &str {
        &self.url
    }

    async fn content(&self) -> ProbeResult<String> {
        let js_code = format!(
            r#"
            (() => {{
                const el = document.querySelectorAll('iframe')[{}];
                try {{
                    const doc = el && el.contentDocument;
                    if (doc && doc.documentElement) {{
                        return {{ ok: true, html: doc.documentElement.outerHTML }};
                    }}
                }} catch (e) {{}}
                return {{ ok: false, html: '' }};
            }})()
            "#,
            self.index
        );

        let document: FrameDocument = self
            .executor
            .eval_as(js_code)
            .await
            .map_err(ProbeError::extraction)?;
        if !document.ok {
            return Err(ProbeError::extraction(format!(
                "无法访问 frame 文档: {}",
                self.url
            )));
        }
        Ok(document.html)
    }
}
