use crate::error::{AppError, AppResult};
use crate::models::outcome::Code;
use std::path::Path;
use tokio::fs;

/// 状态日志行的前缀，加载时跳过
pub const STATUS_LINE_PREFIX: &str = "Processing:";

/// 从文件加载编号列表
///
/// 文件不可读是致命错误，在任何探测开始之前终止运行。
pub async fn load_codes(path: &Path) -> AppResult<Vec<Code>> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| AppError::input(path.display().to_string(), e))?;

    let codes = parse_codes(&content);
    tracing::info!("✓ 从 {} 加载了 {} 个编号", path.display(), codes.len());
    Ok(codes)
}

/// 解析编号文本：去除空白，跳过空行和状态行，保留重复项
pub fn parse_codes(content: &str) -> Vec<Code> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with(STATUS_LINE_PREFIX))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_blank_and_status_lines() {
        let content = "dtw004\n\n  qv002  \nProcessing: dtw004\r\nnbastwax016\n   \n";
        assert_eq!(parse_codes(content), vec!["dtw004", "qv002", "nbastwax016"]);
    }

    #[test]
    fn test_parse_keeps_duplicates() {
        assert_eq!(parse_codes("a\nb\na\n"), vec!["a", "b", "a"]);
    }

    #[tokio::test]
    async fn test_load_missing_file_is_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_codes(&dir.path().join("missing.txt")).await.unwrap_err();
        assert!(matches!(err, AppError::Input { .. }));
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("codes.txt");
        std::fs::write(&path, "rawqtroo3\nProcessing: x\nqv002\n").unwrap();
        let codes = load_codes(&path).await.unwrap();
        assert_eq!(codes, vec!["rawqtroo3", "qv002"]);
    }
}
