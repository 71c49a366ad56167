use thiserror::Error;

/// 单次探测过程中的错误
///
/// 全部在 ProbeSession 边界被转换成 Outcome，不会中断整个运行。
/// 唯一允许向上传播的是 `Resource`，由 WorkerPool 兜底转换。
#[derive(Debug, Error)]
pub enum ProbeError {
    /// 导航失败（网络 / DNS / 页面加载）
    #[error("导航到 {url} 失败: {message}")]
    Navigation { url: String, message: String },

    /// 等待选择器超时（不是故障，映射为"frame 不存在"）
    #[error("等待 {selector} 超时 ({timeout_ms} ms)")]
    FrameTimeout { selector: String, timeout_ms: u64 },

    /// frame 已找到但内容无法读取
    #[error("读取 frame 内容失败: {message}")]
    Extraction { message: String },

    /// 渲染器 / 会话无法创建（例如容量耗尽、浏览器启动失败）
    #[error("渲染器资源不可用: {message}")]
    Resource { message: String },
}

impl ProbeError {
    /// 创建导航错误
    pub fn navigation(url: impl Into<String>, source: impl std::fmt::Display) -> Self {
        ProbeError::Navigation {
            url: url.into(),
            message: source.to_string(),
        }
    }

    /// 创建内容提取错误
    pub fn extraction(source: impl std::fmt::Display) -> Self {
        ProbeError::Extraction {
            message: source.to_string(),
        }
    }

    /// 创建资源错误
    pub fn resource(source: impl std::fmt::Display) -> Self {
        ProbeError::Resource {
            message: source.to_string(),
        }
    }
}

/// 应用程序错误类型
///
/// 只有这里的错误会终止运行：输入不可读（开始前）、输出不可写（运行后报告）。
#[derive(Debug, Error)]
pub enum AppError {
    /// 输入文件读取失败
    #[error("无法读取输入文件 {path}: {source}")]
    Input {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// 结果文件写入失败
    #[error("无法写入结果文件 {path}: {source}")]
    Output {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// 结果集不完整（某个编号没有得到 Outcome）
    #[error("结果集不完整: 缺少 {missing} 个结果 (共 {total} 个编号)")]
    Incomplete { missing: usize, total: usize },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },

    /// 配置文件读取失败
    #[error("无法读取配置文件 {path}: {source}")]
    FileReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// 配置文件解析失败
    #[error("无法解析配置文件 {path}: {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    /// 未知的运行模式 / 会话隔离方式
    #[error("无效的取值 '{value}' (可选: {expected})")]
    InvalidValue { value: String, expected: String },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建输入文件读取错误
    pub fn input(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::Input {
            path: path.into(),
            source,
        }
    }

    /// 创建结果文件写入错误
    pub fn output(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::Output {
            path: path.into(),
            source,
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

/// 探测结果类型
pub type ProbeResult<T> = Result<T, ProbeError>;
