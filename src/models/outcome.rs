use std::fmt;

/// 一次目录查询的编号
///
/// 来自输入列表，非空且已去除首尾空白。允许重复，每次出现都是独立的工作单元。
pub type Code = String;

/// 探测结果分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeKind {
    /// 没有匹配的商品
    NoMatch,
    /// 恰好一个商品
    Single,
    /// 多个商品
    Multiple,
    /// 无法判断（frame 未出现，或有商品迹象但无法计数）
    Indeterminate,
    /// 探测失败
    Error,
}

impl OutcomeKind {
    pub const ALL: [OutcomeKind; 5] = [
        OutcomeKind::NoMatch,
        OutcomeKind::Single,
        OutcomeKind::Multiple,
        OutcomeKind::Indeterminate,
        OutcomeKind::Error,
    ];

    /// 存在性检查中算作 FOUND
    pub fn is_found(self) -> bool {
        matches!(self, OutcomeKind::Single | OutcomeKind::Multiple)
    }

    /// 详细分析输出中的状态标签
    pub fn status_label(self) -> &'static str {
        match self {
            OutcomeKind::Single => "SINGLE",
            OutcomeKind::Multiple => "MULTIPLE",
            OutcomeKind::NoMatch | OutcomeKind::Indeterminate => "STATIC_HTML",
            OutcomeKind::Error => "ERROR",
        }
    }

    fn slot(self) -> usize {
        match self {
            OutcomeKind::NoMatch => 0,
            OutcomeKind::Single => 1,
            OutcomeKind::Multiple => 2,
            OutcomeKind::Indeterminate => 3,
            OutcomeKind::Error => 4,
        }
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutcomeKind::NoMatch => "NoMatch",
            OutcomeKind::Single => "Single",
            OutcomeKind::Multiple => "Multiple",
            OutcomeKind::Indeterminate => "Indeterminate",
            OutcomeKind::Error => "Error",
        };
        f.write_str(name)
    }
}

/// 单个编号的最终结果，创建后不可变
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub code: Code,
    pub kind: OutcomeKind,
    /// 描述；Error 时为错误信息
    pub detail: String,
    pub count: usize,
}

impl Outcome {
    pub fn new(code: impl Into<Code>, kind: OutcomeKind, detail: impl Into<String>, count: usize) -> Self {
        Self {
            code: code.into(),
            kind,
            detail: detail.into(),
            count,
        }
    }

    /// 创建错误结果
    pub fn error(code: impl Into<Code>, message: impl Into<String>) -> Self {
        Self::new(code, OutcomeKind::Error, message, 0)
    }

    pub fn is_error(&self) -> bool {
        self.kind == OutcomeKind::Error
    }
}

/// 各分类的数量统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    counts: [usize; 5],
}

impl Tally {
    pub fn record(&mut self, kind: OutcomeKind) {
        self.counts[kind.slot()] += 1;
    }

    pub fn count(&self, kind: OutcomeKind) -> usize {
        self.counts[kind.slot()]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    pub fn found(&self) -> usize {
        self.count(OutcomeKind::Single) + self.count(OutcomeKind::Multiple)
    }

    pub fn not_found(&self) -> usize {
        self.count(OutcomeKind::NoMatch) + self.count(OutcomeKind::Indeterminate)
    }

    /// 详细分析中的 "Static HTML only"
    pub fn static_html_only(&self) -> usize {
        self.not_found()
    }
}

impl<'a> FromIterator<&'a Outcome> for Tally {
    fn from_iter<I: IntoIterator<Item = &'a Outcome>>(iter: I) -> Self {
        let mut tally = Tally::default();
        for outcome in iter {
            tally.record(outcome.kind);
        }
        tally
    }
}

/// 按提交顺序排列的完整结果集
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    pub outcomes: Vec<Outcome>,
    pub tally: Tally,
}

impl ResultSet {
    /// 由已按提交顺序排列的结果构建
    pub fn from_ordered(outcomes: Vec<Outcome>) -> Self {
        let tally = outcomes.iter().collect();
        Self { outcomes, tally }
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally_groups_kinds() {
        let set = ResultSet::from_ordered(vec![
            Outcome::new("a", OutcomeKind::Single, "", 1),
            Outcome::new("b", OutcomeKind::Multiple, "", 3),
            Outcome::new("c", OutcomeKind::NoMatch, "", 0),
            Outcome::new("d", OutcomeKind::Indeterminate, "", 0),
            Outcome::error("e", "boom"),
            Outcome::error("e", "boom again"),
        ]);

        assert_eq!(set.len(), 6);
        assert_eq!(set.tally.total(), 6);
        assert_eq!(set.tally.found(), 2);
        assert_eq!(set.tally.not_found(), 2);
        assert_eq!(set.tally.count(OutcomeKind::Error), 2);
        assert_eq!(
            OutcomeKind::ALL
                .iter()
                .map(|k| set.tally.count(*k))
                .sum::<usize>(),
            6
        );
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(OutcomeKind::NoMatch.status_label(), "STATIC_HTML");
        assert_eq!(OutcomeKind::Indeterminate.status_label(), "STATIC_HTML");
        assert_eq!(OutcomeKind::Multiple.status_label(), "MULTIPLE");
        assert!(!OutcomeKind::Indeterminate.is_found());
    }
}
