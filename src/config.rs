//! 程序配置
//!
//! 加载顺序：默认值 → TOML 配置文件（可选）→ 环境变量 → 命令行模式参数

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{AppResult, ConfigError};

/// 默认站点根地址
pub const DEFAULT_SITE_ROOT: &str = "https://deejay.de/";
/// 默认配置文件
pub const DEFAULT_CONFIG_FILE: &str = "probe.toml";

/// 运行模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// 批量存在性检查：并发、每个编号独立浏览器、FOUND / NOT FOUND
    Check,
    /// 详细分析：顺序执行、复用浏览器、统计商品数量
    Analyze,
}

impl FromStr for RunMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "check" => Ok(RunMode::Check),
            "analyze" | "analyse" => Ok(RunMode::Analyze),
            other => Err(ConfigError::InvalidValue {
                value: other.to_string(),
                expected: "check, analyze".to_string(),
            }),
        }
    }
}

/// 渲染会话的隔离方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionIsolation {
    /// 每个编号启动一个完整的浏览器实例
    Isolated,
    /// 共享一个浏览器，每个编号一个新页面
    Shared,
    /// 连接到已运行的浏览器（调试端口），每个编号一个新页面
    Connect,
}

impl FromStr for SessionIsolation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "isolated" => Ok(SessionIsolation::Isolated),
            "shared" => Ok(SessionIsolation::Shared),
            "connect" => Ok(SessionIsolation::Connect),
            other => Err(ConfigError::InvalidValue {
                value: other.to_string(),
                expected: "isolated, shared, connect".to_string(),
            }),
        }
    }
}

/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// 运行模式
    pub mode: RunMode,
    /// 站点根地址，探测地址 = 根地址 + 编号
    pub site_root: String,
    /// 编号列表文件
    pub codes_file: String,
    /// 同时运行的探测数量（仅 check 模式生效）
    pub max_concurrent_probes: usize,
    /// 等待 frame 出现的超时
    pub selector_timeout_ms: u64,
    /// analyze 模式读取 frame 前的等待时间
    pub settle_delay_ms: u64,
    /// analyze 模式两次请求之间的间隔
    pub inter_request_delay_ms: u64,
    /// 关闭时等待进行中探测的最长时间
    pub shutdown_grace_secs: u64,
    /// 逐条写入的结果文件（None 时按模式取默认值）
    pub results_file: Option<String>,
    /// 运行结束时写入的汇总文件（None 时按模式取默认值）
    pub summary_file: Option<String>,
    /// 会话隔离方式（None 时按模式取默认值）
    pub session_isolation: Option<SessionIsolation>,
    /// 浏览器调试端口（connect 方式使用）
    pub browser_debug_port: u16,
    /// 浏览器可执行文件路径（为空时由 chromiumoxide 自动查找）
    pub browser_executable: Option<String>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: RunMode::Check,
            site_root: DEFAULT_SITE_ROOT.to_string(),
            codes_file: "codes.txt".to_string(),
            max_concurrent_probes: 8,
            selector_timeout_ms: 8000,
            settle_delay_ms: 2000,
            inter_request_delay_ms: 1000,
            shutdown_grace_secs: 30,
            results_file: None,
            summary_file: None,
            session_isolation: None,
            browser_debug_port: 9222,
            browser_executable: None,
            verbose_logging: false,
        }
    }
}

/// TOML 配置文件内容，所有字段可选
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    mode: Option<RunMode>,
    site_root: Option<String>,
    codes_file: Option<String>,
    max_concurrent_probes: Option<usize>,
    selector_timeout_ms: Option<u64>,
    settle_delay_ms: Option<u64>,
    inter_request_delay_ms: Option<u64>,
    shutdown_grace_secs: Option<u64>,
    results_file: Option<String>,
    summary_file: Option<String>,
    session_isolation: Option<SessionIsolation>,
    browser_debug_port: Option<u16>,
    browser_executable: Option<String>,
    verbose_logging: Option<bool>,
}

impl Config {
    /// 按完整顺序加载配置
    ///
    /// 配置文件路径取 `PROBE_CONFIG`，未设置时仅在 `probe.toml` 存在时读取。
    /// 任何一层出错都返回 `AppError::Config`。
    pub fn load(mode_arg: Option<&str>) -> AppResult<Self> {
        let mut config = match std::env::var("PROBE_CONFIG") {
            Ok(path) => Self::from_file(&path)?,
            Err(_) if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(DEFAULT_CONFIG_FILE)?
            }
            Err(_) => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        if let Some(mode) = mode_arg {
            config.mode = mode.parse()?;
        }
        Ok(config)
    }

    /// 只使用环境变量覆盖默认值
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// 从 TOML 文件读取配置
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| {
            ConfigError::FileReadFailed {
                path: path.to_string(),
                source,
            }
        })?;
        Self::from_toml_str(&content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.to_string(),
            source,
        })
    }

    /// 解析 TOML 文本，缺失字段使用默认值
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        let file: ConfigFile = toml::from_str(content)?;
        let default = Self::default();
        Ok(Self {
            mode: file.mode.unwrap_or(default.mode),
            site_root: file.site_root.unwrap_or(default.site_root),
            codes_file: file.codes_file.unwrap_or(default.codes_file),
            max_concurrent_probes: file
                .max_concurrent_probes
                .unwrap_or(default.max_concurrent_probes),
            selector_timeout_ms: file
                .selector_timeout_ms
                .unwrap_or(default.selector_timeout_ms),
            settle_delay_ms: file.settle_delay_ms.unwrap_or(default.settle_delay_ms),
            inter_request_delay_ms: file
                .inter_request_delay_ms
                .unwrap_or(default.inter_request_delay_ms),
            shutdown_grace_secs: file
                .shutdown_grace_secs
                .unwrap_or(default.shutdown_grace_secs),
            results_file: file.results_file.or(default.results_file),
            summary_file: file.summary_file.or(default.summary_file),
            session_isolation: file.session_isolation.or(default.session_isolation),
            browser_debug_port: file
                .browser_debug_port
                .unwrap_or(default.browser_debug_port),
            browser_executable: file.browser_executable.or(default.browser_executable),
            verbose_logging: file.verbose_logging.unwrap_or(default.verbose_logging),
        })
    }

    /// 用环境变量覆盖当前配置
    ///
    /// `lookup` 便于测试时注入变量而不修改进程环境。
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("PROBE_MODE") {
            self.mode = v.parse()?;
        }
        if let Some(v) = lookup("SITE_ROOT") {
            self.site_root = v;
        }
        if let Some(v) = lookup("CODES_FILE") {
            self.codes_file = v;
        }
        if let Some(v) = lookup("MAX_CONCURRENT_PROBES") {
            self.max_concurrent_probes = parse_var("MAX_CONCURRENT_PROBES", &v, "usize")?;
        }
        if let Some(v) = lookup("SELECTOR_TIMEOUT_MS") {
            self.selector_timeout_ms = parse_var("SELECTOR_TIMEOUT_MS", &v, "u64")?;
        }
        if let Some(v) = lookup("SETTLE_DELAY_MS") {
            self.settle_delay_ms = parse_var("SETTLE_DELAY_MS", &v, "u64")?;
        }
        if let Some(v) = lookup("INTER_REQUEST_DELAY_MS") {
            self.inter_request_delay_ms = parse_var("INTER_REQUEST_DELAY_MS", &v, "u64")?;
        }
        if let Some(v) = lookup("SHUTDOWN_GRACE_SECS") {
            self.shutdown_grace_secs = parse_var("SHUTDOWN_GRACE_SECS", &v, "u64")?;
        }
        if let Some(v) = lookup("RESULTS_FILE") {
            self.results_file = Some(v);
        }
        if let Some(v) = lookup("SUMMARY_FILE") {
            self.summary_file = Some(v);
        }
        if let Some(v) = lookup("SESSION_ISOLATION") {
            self.session_isolation = Some(v.parse()?);
        }
        if let Some(v) = lookup("BROWSER_DEBUG_PORT") {
            self.browser_debug_port = parse_var("BROWSER_DEBUG_PORT", &v, "u16")?;
        }
        if let Some(v) = lookup("BROWSER_EXECUTABLE") {
            self.browser_executable = Some(v);
        }
        if let Some(v) = lookup("VERBOSE_LOGGING") {
            self.verbose_logging = parse_var("VERBOSE_LOGGING", &v, "bool")?;
        }
        Ok(())
    }

    /// 实际生效的并发数：analyze 模式固定为 1
    pub fn effective_concurrency(&self) -> usize {
        match self.mode {
            RunMode::Check => self.max_concurrent_probes.max(1),
            RunMode::Analyze => 1,
        }
    }

    /// 实际生效的会话隔离方式
    pub fn effective_isolation(&self) -> SessionIsolation {
        self.session_isolation.unwrap_or(match self.mode {
            RunMode::Check => SessionIsolation::Isolated,
            RunMode::Analyze => SessionIsolation::Shared,
        })
    }

    pub fn results_path(&self) -> String {
        self.results_file.clone().unwrap_or_else(|| {
            match self.mode {
                RunMode::Check => "results.txt",
                RunMode::Analyze => "analysis_progress.txt",
            }
            .to_string()
        })
    }

    pub fn summary_path(&self) -> String {
        self.summary_file.clone().unwrap_or_else(|| {
            match self.mode {
                RunMode::Check => "results_summary.txt",
                RunMode::Analyze => "code_analysis_results.txt",
            }
            .to_string()
        })
    }

    pub fn selector_timeout(&self) -> Duration {
        Duration::from_millis(self.selector_timeout_ms)
    }

    /// 只有 analyze 模式等待 frame 填充
    pub fn settle_delay(&self) -> Option<Duration> {
        match self.mode {
            RunMode::Analyze if self.settle_delay_ms > 0 => {
                Some(Duration::from_millis(self.settle_delay_ms))
            }
            _ => None,
        }
    }

    /// 只有 analyze 模式在请求之间停顿
    pub fn inter_request_delay(&self) -> Option<Duration> {
        match self.mode {
            RunMode::Analyze if self.inter_request_delay_ms > 0 => {
                Some(Duration::from_millis(self.inter_request_delay_ms))
            }
            _ => None,
        }
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

fn parse_var<T: FromStr>(var_name: &str, value: &str, expected_type: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::EnvVarParseFailed {
            var_name: var_name.to_string(),
            value: value.to_string(),
            expected_type: expected_type.to_string(),
        })
}
