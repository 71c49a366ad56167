//! 结果格式化 - 业务能力层
//!
//! 逐条结果行和运行结束时的汇总报告，两种运行模式各有一套格式。

use crate::config::RunMode;
use crate::models::{Outcome, OutcomeKind, ResultSet};

const RULE_WIDTH: usize = 60;

/// 存在性检查的结果行：`<code>: FOUND` / `NOT FOUND` / `ERROR - <message>`
pub fn check_line(outcome: &Outcome) -> String {
    match outcome.kind {
        OutcomeKind::Error => format!("{}: ERROR - {}", outcome.code, outcome.detail),
        kind if kind.is_found() => format!("{}: FOUND", outcome.code),
        _ => format!("{}: NOT FOUND", outcome.code),
    }
}

/// 详细分析的结果行：`[<STATUS>] <code>: <description> (Products: <n>)`
pub fn analysis_line(outcome: &Outcome) -> String {
    let description = match outcome.kind {
        OutcomeKind::Error => format!("Error analyzing code: {}", outcome.detail),
        _ => outcome.detail.clone(),
    };
    format!(
        "[{}] {}: {} (Products: {})",
        outcome.kind.status_label(),
        outcome.code,
        description,
        outcome.count
    )
}

/// 按运行模式选择结果行格式
pub fn result_line(mode: RunMode, outcome: &Outcome) -> String {
    match mode {
        RunMode::Check => check_line(outcome),
        RunMode::Analyze => analysis_line(outcome),
    }
}

/// 汇总报告：有序结果行 + 统计块
pub fn render_summary(mode: RunMode, results: &ResultSet) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let title = match mode {
        RunMode::Check => "CODE CHECK RESULTS",
        RunMode::Analyze => "CODE ANALYSIS RESULTS",
    };

    let mut out = format!("{}\n{}\n\n", title, rule);
    for outcome in &results.outcomes {
        out.push_str(&result_line(mode, outcome));
        out.push('\n');
    }

    out.push_str(&format!("\n{}\nSUMMARY\n{}\n", rule, rule));
    let tally = &results.tally;
    match mode {
        RunMode::Check => {
            out.push_str(&format!("Total codes checked: {}\n", results.len()));
            out.push_str(&format!("Found: {}\n", tally.found()));
            out.push_str(&format!("Not found: {}\n", tally.not_found()));
            out.push_str(&format!("Errors: {}\n", tally.count(OutcomeKind::Error)));
        }
        RunMode::Analyze => {
            out.push_str(&format!("Total codes analyzed: {}\n", results.len()));
            out.push_str(&format!("Single result: {}\n", tally.count(OutcomeKind::Single)));
            out.push_str(&format!(
                "Multiple results: {}\n",
                tally.count(OutcomeKind::Multiple)
            ));
            out.push_str(&format!("Static HTML only: {}\n", tally.static_html_only()));
            out.push_str(&format!("Errors: {}\n", tally.count(OutcomeKind::Error)));
        }
    }
    out
}
