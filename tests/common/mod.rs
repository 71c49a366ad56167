//! 测试用的假渲染器：按编号预设每次探测的行为

#![allow(dead_code)]

use async_trait::async_trait;
use catalog_probe::infrastructure::FramePredicate;
use catalog_probe::{ProbeError, ProbeResult, ProbeSettings, ProbeStyle, RenderSession, RenderedFrame, Renderer};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const SITE_ROOT: &str = "https://catalog.test/";

pub const SINGLE_FRAME: &str = r#"<div class="product-list"><img src="/pics/images/m/a.jpg" alt="x"><a href="/addCart/1">Add</a></div>"#;

pub const MULTIPLE_FRAME: &str = "<div class=\"product-list\">\n\
    <img src=\"/pics/images/m/a.jpg\" alt=\"a\">\n\
    <a href=\"/addCart/1\">Add</a>\n\
    <img src=\"/pics/images/m/b.jpg\" alt=\"b\">\n\
    <a href=\"/addCart/2\">Add</a>\n\
</div>";

pub const NO_MATCH_FRAME: &str = "<p>Sorry, we didn´t find a matching Entry.</p>";

/// 一次探测的预设行为
#[derive(Debug, Clone)]
pub enum Script {
    /// frame 正常出现，内容如下
    Frame(String),
    /// frame 标记元素一直没有出现
    NoFrame,
    /// 有 iframe，但 URL 不匹配
    UnrelatedFrame,
    /// 导航失败
    NavigationFails,
    /// frame 内容读取失败
    ExtractionFails,
    /// 探测过程中 panic
    Panics,
    /// 先等待一段时间再执行内部行为
    Slow(Duration, Box<Script>),
}

impl Script {
    pub fn frame(text: &str) -> Self {
        Script::Frame(text.to_string())
    }

    pub fn slow(millis: u64, inner: Script) -> Self {
        Script::Slow(Duration::from_millis(millis), Box::new(inner))
    }
}

#[derive(Default)]
struct Shared {
    scripts: HashMap<String, Script>,
    default: Option<Script>,
    failing_sessions: HashSet<usize>,
    opened: AtomicUsize,
    closed: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
    navigations: Mutex<Vec<String>>,
}

impl Shared {
    fn script_for(&self, code: &str) -> Script {
        self.scripts
            .get(code)
            .cloned()
            .or_else(|| self.default.clone())
            .unwrap_or_else(|| Script::frame(SINGLE_FRAME))
    }
}

/// 按编号脚本化的渲染器
#[derive(Clone, Default)]
pub struct FakeRenderer {
    shared: Arc<Shared>,
}

impl FakeRenderer {
    pub fn builder() -> FakeRendererBuilder {
        FakeRendererBuilder::default()
    }

    pub fn opened(&self) -> usize {
        self.shared.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.shared.closed.load(Ordering::SeqCst)
    }

    pub fn active(&self) -> usize {
        self.shared.active.load(Ordering::SeqCst)
    }

    pub fn max_active(&self) -> usize {
        self.shared.max_active.load(Ordering::SeqCst)
    }

    pub fn navigations(&self) -> Vec<String> {
        self.shared.navigations.lock().unwrap().clone()
    }
}

#[derive(Default)]
pub struct FakeRendererBuilder {
    shared: Shared,
}

impl FakeRendererBuilder {
    pub fn script(mut self, code: &str, script: Script) -> Self {
        self.shared.scripts.insert(code.to_string(), script);
        self
    }

    pub fn default_script(mut self, script: Script) -> Self {
        self.shared.default = Some(script);
        self
    }

    /// 第 n 次（从 0 开始）创建会话时失败
    pub fn fail_session(mut self, n: usize) -> Self {
        self.shared.failing_sessions.insert(n);
        self
    }

    pub fn build(self) -> FakeRenderer {
        FakeRenderer {
            shared: Arc::new(self.shared),
        }
    }
}

#[async_trait]
impl Renderer for FakeRenderer {
    async fn new_session(&self) -> ProbeResult<Box<dyn RenderSession>> {
        let n = self.shared.opened.fetch_add(1, Ordering::SeqCst);
        if self.shared.failing_sessions.contains(&n) {
            // 失败的会话不计入打开数
            self.shared.opened.fetch_sub(1, Ordering::SeqCst);
            return Err(ProbeError::resource("browser launch failed: out of capacity"));
        }

        let active = self.shared.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.max_active.fetch_max(active, Ordering::SeqCst);

        Ok(Box::new(FakeSession {
            shared: self.shared.clone(),
            script: None,
        }))
    }
}

struct FakeSession {
    shared: Arc<Shared>,
    script: Option<Script>,
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        self.shared.active.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl RenderSession for FakeSession {
    async fn navigate(&mut self, url: &str) -> ProbeResult<()> {
        self.shared.navigations.lock().unwrap().push(url.to_string());
        let code = url.strip_prefix(SITE_ROOT).unwrap_or(url);

        let mut script = self.shared.script_for(code);
        while let Script::Slow(delay, inner) = script {
            tokio::time::sleep(delay).await;
            script = *inner;
        }

        match &script {
            Script::NavigationFails => {
                return Err(ProbeError::navigation(url, "net::ERR_NAME_NOT_RESOLVED"));
            }
            Script::Panics => panic!("renderer crashed while loading {}", code),
            _ => {}
        }
        self.script = Some(script);
        Ok(())
    }

    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> ProbeResult<()> {
        match self.script {
            Some(Script::NoFrame) => Err(ProbeError::FrameTimeout {
                selector: selector.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            }),
            _ => Ok(()),
        }
    }

    async fn frame_matching(
        &mut self,
        predicate: FramePredicate<'_>,
    ) -> ProbeResult<Option<Box<dyn RenderedFrame>>> {
        let (url, content) = match &self.script {
            Some(Script::UnrelatedFrame) => ("https://ads.test/banner.html".to_string(), Ok(String::new())),
            Some(Script::ExtractionFails) => (
                format!("{}content.php?param=x", SITE_ROOT),
                Err("frame detached".to_string()),
            ),
            Some(Script::Frame(text)) => (format!("{}content.php?param=x", SITE_ROOT), Ok(text.clone())),
            _ => return Ok(None),
        };

        if !predicate(url.as_str()) {
            return Ok(None);
        }
        Ok(Some(Box::new(FakeFrame { url, content })))
    }

    async fn close(self: Box<Self>) -> ProbeResult<()> {
        self.shared.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct FakeFrame {
    url: String,
    content: Result<String, String>,
}

#[async_trait]
impl RenderedFrame for FakeFrame {
    fn url(&self) -> &str {
        &self.url
    }

    async fn content(&self) -> ProbeResult<String> {
        self.content.clone().map_err(ProbeError::extraction)
    }
}

pub fn probe_settings(style: ProbeStyle) -> ProbeSettings {
    ProbeSettings {
        site_root: SITE_ROOT.to_string(),
        frame_selector: "iframe#myIframe".to_string(),
        frame_url_pattern: "content.php?param=".to_string(),
        selector_timeout: Duration::from_millis(50),
        settle_delay: None,
        style,
    }
}

pub fn codes(list: &[&str]) -> Vec<String> {
    list.iter().map(|c| c.to_string()).collect()
}
