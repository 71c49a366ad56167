//! 探测上下文
//!
//! 封装"我正在处理第几个编号"这一信息

use std::fmt::Display;

/// 探测上下文
#[derive(Debug, Clone)]
pub struct ProbeCtx {
    /// 编号在输入列表中的位置（从 0 开始，结果按它重新排序）
    pub index: usize,

    /// 编号
    pub code: String,

    /// 编号总数（仅用于日志显示）
    pub total: usize,
}

impl ProbeCtx {
    pub fn new(index: usize, code: impl Into<String>, total: usize) -> Self {
        Self {
            index,
            code: code.into(),
            total,
        }
    }
}

impl Display for ProbeCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}/{} {}]", self.index + 1, self.total, self.code)
    }
}
