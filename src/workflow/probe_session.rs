//! 单个编号的探测流程 - 流程层
//!
//! 流程顺序：
//! 1. 打开只属于本编号的渲染会话
//! 2. 导航到 站点根地址 + 编号
//! 3. 等待 frame 标记元素（超时 = frame 不存在，不是错误）
//! 4. 找到 URL 匹配的 frame
//! 5. （analyze）等待 frame 填充
//! 6. 读取 frame 内容并分类
//! 7. 无论哪一步失败，都关闭会话
//!
//! 除渲染器无法创建会话外，所有失败都落成一个 Error 结果。

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::{Config, RunMode};
use crate::error::{ProbeError, ProbeResult};
use crate::infrastructure::{RenderSession, Renderer};
use crate::models::{Outcome, OutcomeKind};
use crate::services::classifier::{self, Verdict};
use crate::utils::logging::truncate_text;
use crate::workflow::probe_ctx::ProbeCtx;

/// frame 所在元素的选择器
pub const FRAME_SELECTOR: &str = "iframe#myIframe";
/// 内容 frame 的 URL 特征
pub const FRAME_URL_PATTERN: &str = "content.php?param=";

/// 分类方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStyle {
    /// 只判断有无结果
    Check,
    /// 统计商品数量
    Analyze,
}

impl From<RunMode> for ProbeStyle {
    fn from(mode: RunMode) -> Self {
        match mode {
            RunMode::Check => ProbeStyle::Check,
            RunMode::Analyze => ProbeStyle::Analyze,
        }
    }
}

/// 探测参数
#[derive(Debug, Clone)]
pub struct ProbeSettings {
    pub site_root: String,
    pub frame_selector: String,
    pub frame_url_pattern: String,
    pub selector_timeout: Duration,
    /// 读取 frame 前的等待，`None` 表示立即读取
    pub settle_delay: Option<Duration>,
    pub style: ProbeStyle,
}

impl ProbeSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            site_root: config.site_root.clone(),
            frame_selector: FRAME_SELECTOR.to_string(),
            frame_url_pattern: FRAME_URL_PATTERN.to_string(),
            selector_timeout: config.selector_timeout(),
            settle_delay: config.settle_delay(),
            style: config.mode.into(),
        }
    }

    /// 编号对应的页面地址
    pub fn probe_url(&self, code: &str) -> String {
        format!("{}{}", self.site_root, code)
    }
}

/// 单个编号的探测流程
///
/// - 不持有任何浏览器资源，会话在 `run` 内创建和释放
/// - 只依赖渲染能力接口和分类规则
pub struct ProbeSession<'a> {
    renderer: &'a dyn Renderer,
    settings: &'a ProbeSettings,
}

impl<'a> ProbeSession<'a> {
    pub fn new(renderer: &'a dyn Renderer, settings: &'a ProbeSettings) -> Self {
        Self { renderer, settings }
    }

    /// 执行一次探测
    ///
    /// 只有 `ProbeError::Resource`（会话无法创建）会作为错误返回，
    /// 其余失败都已转换成 Error 结果。
    pub async fn run(&self, ctx: &ProbeCtx) -> ProbeResult<Outcome> {
        let mut session = self.renderer.new_session().await?;

        let result = self.probe(session.as_mut(), ctx).await;

        if let Err(e) = session.close().await {
            warn!("{} ⚠️ 关闭会话失败: {}", ctx, e);
        }

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("{} ❌ 探测失败: {}", ctx, truncate_text(&e.to_string(), 200));
                Outcome::error(ctx.code.clone(), e.to_string())
            }
        };
        Ok(outcome)
    }

    async fn probe(&self, session: &mut dyn RenderSession, ctx: &ProbeCtx) -> ProbeResult<Outcome> {
        let url = self.settings.probe_url(&ctx.code);
        info!("{} 🔍 正在检查: {}", ctx, url);

        session.navigate(&url).await?;

        let frame_text = self.read_frame(session, ctx).await?;
        Ok(self.build_outcome(&ctx.code, frame_text.as_deref()))
    }

    /// 读取内容 frame；frame 未出现或没有匹配的 frame 时返回 `None`
    async fn read_frame(
        &self,
        session: &mut dyn RenderSession,
        ctx: &ProbeCtx,
    ) -> ProbeResult<Option<String>> {
        match session
            .wait_for_selector(&self.settings.frame_selector, self.settings.selector_timeout)
            .await
        {
            Ok(()) => {}
            Err(ProbeError::FrameTimeout { .. }) => {
                debug!("{} frame 未出现", ctx);
                return Ok(None);
            }
            Err(e) => return Err(e),
        }

        let pattern = self.settings.frame_url_pattern.as_str();
        let predicate = |url: &str| url.contains(pattern);
        let Some(frame) = session.frame_matching(&predicate).await? else {
            debug!("{} 没有 URL 包含 {} 的 frame", ctx, pattern);
            return Ok(None);
        };
        debug!("{} 找到 frame: {}", ctx, frame.url());

        if let Some(delay) = self.settings.settle_delay {
            tokio::time::sleep(delay).await;
        }

        frame.content().await.map(Some)
    }

    fn build_outcome(&self, code: &str, frame_text: Option<&str>) -> Outcome {
        match self.settings.style {
            ProbeStyle::Analyze => {
                let classification = classifier::classify(frame_text);
                Outcome::new(
                    code,
                    classification.kind,
                    classification.description(),
                    classification.count,
                )
            }
            ProbeStyle::Check => match frame_text {
                None => Outcome::new(code, OutcomeKind::Indeterminate, "Iframe not found", 0),
                Some(text) => match classifier::has_results(text) {
                    Verdict::NoMatch => {
                        Outcome::new(code, OutcomeKind::NoMatch, "No product indicators", 0)
                    }
                    Verdict::HasResults => {
                        let count = classifier::count_products(text).max(1);
                        let kind = if count > 1 {
                            OutcomeKind::Multiple
                        } else {
                            OutcomeKind::Single
                        };
                        Outcome::new(code, kind, "Product indicators found", count)
                    }
                },
            },
        }
    }
}
