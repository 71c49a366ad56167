//! 渲染能力接口 - 基础设施层
//!
//! 探测流程只依赖这组窄接口，任何满足约定的后端都可以替换，
//! 包括测试用的假实现。

use crate::error::ProbeResult;
use async_trait::async_trait;
use std::time::Duration;

/// frame URL 判定函数
pub type FramePredicate<'a> = &'a (dyn Fn(&str) -> bool + Send + Sync);

/// 渲染器：创建会话
///
/// 创建失败（浏览器无法启动、容量耗尽）返回 `ProbeError::Resource`。
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn new_session(&self) -> ProbeResult<Box<dyn RenderSession>>;

    /// 运行结束时释放长期持有的资源
    async fn shutdown(&self) {}
}

/// 一次探测独占的渲染会话（页面 / 浏览器句柄）
#[async_trait]
pub trait RenderSession: Send {
    /// 导航到指定地址，失败返回 `ProbeError::Navigation`
    async fn navigate(&mut self, url: &str) -> ProbeResult<()>;

    /// 等待选择器出现，超时返回 `ProbeError::FrameTimeout`
    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> ProbeResult<()>;

    /// 查找 URL 满足条件的 frame
    async fn frame_matching(
        &mut self,
        predicate: FramePredicate<'_>,
    ) -> ProbeResult<Option<Box<dyn RenderedFrame>>>;

    /// 释放会话资源
    async fn close(self: Box<Self>) -> ProbeResult<()>;
}

/// 已渲染的 frame
#[async_trait]
pub trait RenderedFrame: Send + Sync {
    fn url(&self) -> &str;

    /// 读取 frame 内容，失败返回 `ProbeError::Extraction`
    async fn content(&self) -> ProbeResult<String>;
}
