//! 浏览器用户数据目录

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// 本进程启动的浏览器独占的配置目录
///
/// 正常关闭时调用 `remove` 异步删除；句柄被直接丢弃（例如探测任务被中止）
/// 时在 Drop 中删除。
#[derive(Debug)]
pub struct ProfileDir {
    path: PathBuf,
    removed: bool,
}

impl ProfileDir {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            removed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 删除目录
    pub async fn remove(mut self) {
        self.removed = true;
        if let Err(e) = tokio::fs::remove_dir_all(&self.path).await {
            log_failure(&self.path, &e);
        }
    }
}

impl Drop for ProfileDir {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        let path = std::mem::take(&mut self.path);
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn_blocking(move || remove_blocking(&path));
            }
            Err(_) => remove_blocking(&path),
        }
    }
}

fn remove_blocking(path: &Path) {
    if let Err(e) = std::fs::remove_dir_all(path) {
        log_failure(path, &e);
    }
}

fn log_failure(path: &Path, e: &std::io::Error) {
    // 浏览器没来得及创建目录时不算失败
    if e.kind() != ErrorKind::NotFound {
        debug!("清理浏览器配置目录失败 {}: {}", path.display(), e);
    }
}
