//! 基础设施层
//!
//! 持有稀缺资源（浏览器 / 页面），只向上暴露渲染能力

pub mod chromium;
pub mod js_executor;
pub mod renderer;

pub use chromium::ChromiumRenderer;
pub use js_executor::JsExecutor;
pub use renderer::{FramePredicate, RenderSession, RenderedFrame, Renderer};
