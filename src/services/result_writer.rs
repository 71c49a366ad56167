//! 结果写入服务 - 业务能力层
//!
//! 只负责"追加一行结果"能力：每条结果落地后立即写入并刷新，
//! 运行中途崩溃也不会丢失已完成的结果。

use crate::error::{AppError, AppResult};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// 结果写入服务
///
/// 内部互斥锁保证多个写入方并发追加时，一行不会与另一行交错。
#[derive(Debug)]
pub struct ResultWriter {
    path: PathBuf,
    file: Mutex<File>,
}

impl ResultWriter {
    /// 创建（或截断）结果文件
    ///
    /// 打不开文件是致命错误，在开始探测之前返回。
    pub fn create(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| AppError::output(path.display().to_string(), e))?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 写入一行并立即刷新
    pub fn write_line(&self, line: &str) -> AppResult<()> {
        debug!("写入结果: {}", line);

        let mut buf = String::with_capacity(line.len() + 1);
        buf.push_str(line);
        buf.push('\n');

        // 锁中毒只说明另一个写入方 panic 过，文件句柄本身仍然可用
        let mut file = self.file.lock().unwrap_or_else(|e| e.into_inner());
        file.write_all(buf.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|e| AppError::output(self.path.display().to_string(), e))
    }
}

/// 一次性写入整个文件（汇总报告）
pub fn write_report(path: impl AsRef<Path>, content: &str) -> AppResult<()> {
    let path = path.as_ref();
    std::fs::write(path, content).map_err(|e| AppError::output(path.display().to_string(), e))
}
