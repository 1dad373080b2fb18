//! 统一错误处理框架
//!
//! 核心层（聚合/百分位/坐标变换）与工具层（请求/文件/绘图）共用的错误类型定义。
//! 所有错误都只作用于单个频率bin或单个通道，是否终止进程由驱动层决定。

use std::fmt;
use std::io;

/// 基线计算相关的统一错误类型
#[derive(Debug)]
pub enum BaselineError {
    /// 输入验证错误（命令行参数、百分位列表、日期范围等）
    InvalidInput(String),

    /// 文件I/O错误
    IoError(io::Error),

    /// 记录格式错误（带逗号但字段无法解析的行、损坏的基线文件）
    FormatError(String),

    /// 网络请求错误（连接失败、超时、非2xx状态）
    NetworkError(String),

    /// 整个通道没有任何有效记录
    EmptyStream(String),

    /// 已关闭的bin总计数为0，百分位无定义
    DegenerateBin(String),

    /// 累积遍历结束仍未命中目标水平
    PercentileUnreachable(String),

    /// 周期坐标变换失败（频率为0）
    AxisTransformError(String),

    /// 绘图失败
    RenderError(String),

    /// 资源访问错误（线程池等）
    ResourceError(String),
}

impl fmt::Display for BaselineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaselineError::InvalidInput(msg) => write!(f, "输入验证失败: {msg}"),
            BaselineError::IoError(err) => write!(f, "文件I/O错误: {err}"),
            BaselineError::FormatError(msg) => write!(f, "数据格式错误: {msg}"),
            BaselineError::NetworkError(msg) => write!(f, "网络请求失败: {msg}"),
            BaselineError::EmptyStream(msg) => write!(f, "无有效数据: {msg}"),
            BaselineError::DegenerateBin(msg) => write!(f, "退化bin: {msg}"),
            BaselineError::PercentileUnreachable(msg) => write!(f, "百分位不可达: {msg}"),
            BaselineError::AxisTransformError(msg) => write!(f, "坐标变换失败: {msg}"),
            BaselineError::RenderError(msg) => write!(f, "绘图失败: {msg}"),
            BaselineError::ResourceError(msg) => write!(f, "资源访问错误: {msg}"),
        }
    }
}

impl std::error::Error for BaselineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BaselineError::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for BaselineError {
    fn from(err: io::Error) -> Self {
        BaselineError::IoError(err)
    }
}

impl From<reqwest::Error> for BaselineError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            BaselineError::NetworkError(format!("请求超时: {err}"))
        } else {
            BaselineError::NetworkError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for BaselineError {
    fn from(err: serde_json::Error) -> Self {
        BaselineError::FormatError(format!("JSON序列化错误: {err}"))
    }
}

/// 基线计算操作的标准Result类型
pub type BaselineResult<T> = Result<T, BaselineError>;

// ==================== 错误转换Helper函数 ====================
// 消除重复的 .map_err(|e| BaselineError::XXX(format!(...))) 模式

/// 创建格式错误的helper函数
#[inline]
pub fn format_error<E: fmt::Display>(context: &str, err: E) -> BaselineError {
    BaselineError::FormatError(format!("{context}: {err}"))
}

/// 创建网络错误的helper函数
#[inline]
pub fn network_error<E: fmt::Display>(context: &str, err: E) -> BaselineError {
    BaselineError::NetworkError(format!("{context}: {err}"))
}

/// 创建绘图错误的helper函数
#[inline]
pub fn render_error<E: fmt::Display>(context: &str, err: E) -> BaselineError {
    BaselineError::RenderError(format!("{context}: {err}"))
}

// ==================== 错误分类系统 ====================
// 用于批量处理中的错误统计和分析

/// 错误类别枚举（用于批量处理统计）
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub enum ErrorCategory {
    /// 输入/格式相关错误（参数错误、记录损坏等）
    Format,
    /// 网络相关错误（连接失败、超时、服务端错误）
    Network,
    /// I/O相关错误（目录创建失败、权限不足等）
    Io,
    /// 计算相关错误（空数据、退化bin、百分位不可达、坐标变换）
    Calculation,
    /// 其他未分类错误
    Other,
}

impl ErrorCategory {
    /// 从BaselineError提取错误类别
    pub fn from_baseline_error(e: &BaselineError) -> Self {
        match e {
            BaselineError::FormatError(_) | BaselineError::InvalidInput(_) => Self::Format,
            BaselineError::NetworkError(_) => Self::Network,
            BaselineError::IoError(_) => Self::Io,
            BaselineError::EmptyStream(_)
            | BaselineError::DegenerateBin(_)
            | BaselineError::PercentileUnreachable(_)
            | BaselineError::AxisTransformError(_) => Self::Calculation,
            BaselineError::RenderError(_) | BaselineError::ResourceError(_) => Self::Other,
        }
    }

    /// 获取错误类别的显示名称
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Format => "格式错误",
            Self::Network => "网络错误",
            Self::Io => "I/O错误",
            Self::Calculation => "计算错误",
            Self::Other => "其他错误",
        }
    }
}
