//! 商品结果分类 - 业务能力层
//!
//! 纯函数：frame 文本 → 分类。不做 I/O，不持有状态。
//! 存在性检查（`has_results`）和详细分析（`classify`）共用同一组标记，
//! 因此两者对"无结果"的判断不会出现分歧。
//!
//! 计数规则是对站点标记的启发式解析，需要保持原样以兼容历史结果。

use crate::models::OutcomeKind;

/// 站点返回"无结果"时的提示语
pub const NO_MATCH_MARKER: &str = "Sorry, we didn´t find a matching Entry.";
/// 商品图片路径片段
pub const IMAGE_MARKER: &str = "/pics/images/m/";
/// 加入购物车链接片段
pub const CART_MARKER: &str = "/addCart/";
/// 商品列表容器（双引号 / 单引号两种写法）
pub const LIST_MARKERS: [&str; 2] = ["class=\"product-list\"", "class='product-list'"];
/// 图片行需要同时带有 alt 属性才计数
pub const ALT_ATTRIBUTE: &str = "alt=";

/// 存在性检查的结论
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    NoMatch,
    HasResults,
}

/// 分类依据，用于生成描述
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    /// frame 从未出现
    FrameAbsent,
    /// frame 内容为空
    EmptyFrame,
    /// 出现"无结果"提示
    NoMatchMarker,
    /// 没有任何商品标记
    NoIndicators,
    /// 有商品标记但无法计数
    UnsizedIndicators,
    /// 已计数
    Counted,
}

/// 详细分类结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub kind: OutcomeKind,
    pub count: usize,
    pub reason: Reason,
}

impl Classification {
    fn new(kind: OutcomeKind, count: usize, reason: Reason) -> Self {
        Self { kind, count, reason }
    }

    /// 详细分析输出使用的描述
    pub fn description(&self) -> &'static str {
        match (self.reason, self.kind) {
            (Reason::FrameAbsent, _) => "Iframe not found - only checking static HTML",
            (Reason::EmptyFrame, _) => "Iframe content is empty - only checking static HTML",
            (Reason::NoMatchMarker, _) | (Reason::NoIndicators, _) => {
                "Iframe contains no product indicators - only checking static HTML"
            }
            (Reason::UnsizedIndicators, _) => {
                "Iframe has product indicators but count is 0 - only checking static HTML"
            }
            (Reason::Counted, OutcomeKind::Single) => "Single product found in iframe",
            (Reason::Counted, _) => "Multiple products found in iframe",
        }
    }
}

/// 三个独立的商品信号
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Indicators {
    image: bool,
    cart: bool,
    list: bool,
}

impl Indicators {
    fn scan(text: &str) -> Self {
        Self {
            image: text.contains(IMAGE_MARKER),
            cart: text.contains(CART_MARKER),
            list: LIST_MARKERS.iter().any(|marker| text.contains(marker)),
        }
    }

    fn any(&self) -> bool {
        self.image || self.cart || self.list
    }
}

/// 存在性检查：只看标记是否出现
pub fn has_results(text: &str) -> Verdict {
    if text.contains(NO_MATCH_MARKER) || !Indicators::scan(text).any() {
        Verdict::NoMatch
    } else {
        Verdict::HasResults
    }
}

/// 估算商品数量
///
/// 图片按"同一行带 alt"计数，购物车链接按行计数，列表容器只作为标记。
/// 两者都有时取较小值；都没有但有列表容器时视为 1。
pub fn count_products(text: &str) -> usize {
    let indicators = Indicators::scan(text);

    let image_count = if indicators.image {
        text.split('\n')
            .filter(|line| line.contains(IMAGE_MARKER) && line.contains(ALT_ATTRIBUTE))
            .count()
    } else {
        0
    };

    let cart_count = if indicators.cart {
        text.split('\n').filter(|line| line.contains(CART_MARKER)).count()
    } else {
        0
    };

    match (image_count, cart_count) {
        (i, c) if i > 0 && c > 0 => i.min(c),
        (i, _) if i > 0 => i,
        (_, c) if c > 0 => c,
        _ if indicators.list => 1,
        _ => 0,
    }
}

/// 详细分类
///
/// `None` 表示 frame 从未出现，结果为 Indeterminate 而不是 NoMatch，
/// 调用方据此区分"没有动态内容"和"确实无结果"。
pub fn classify(frame: Option<&str>) -> Classification {
    let Some(text) = frame else {
        return Classification::new(OutcomeKind::Indeterminate, 0, Reason::FrameAbsent);
    };

    if text.trim().is_empty() {
        return Classification::new(OutcomeKind::NoMatch, 0, Reason::EmptyFrame);
    }
    if text.contains(NO_MATCH_MARKER) {
        return Classification::new(OutcomeKind::NoMatch, 0, Reason::NoMatchMarker);
    }
    if !Indicators::scan(text).any() {
        return Classification::new(OutcomeKind::NoMatch, 0, Reason::NoIndicators);
    }

    match count_products(text) {
        0 => Classification::new(OutcomeKind::Indeterminate, 0, Reason::UnsizedIndicators),
        1 => Classification::new(OutcomeKind::Single, 1, Reason::Counted),
        n => Classification::new(OutcomeKind::Multiple, n, Reason::Counted),
    }
}
