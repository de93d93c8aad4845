//! 错误类型
//!
//! - `AppError`：一次分析运行对外可见的错误
//! - `CapabilityError`：单个 (分段, 能力) 调用的失败，只影响该调用本身

use std::time::Duration;
use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 输入无效（空文档、超长文档、分段参数非法），在分发前即被拒绝
    #[error("输入无效: {0}")]
    InvalidInput(String),

    /// 合并任务异常退出
    #[error("合并失败: {0}")]
    Merge(String),

    /// 所有分段的所有能力调用都失败，没有任何可用结果
    #[error("分析失败: {segments} 个分段的全部 {calls} 次调用均未成功")]
    TotalFailure { segments: usize, calls: usize },

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 文件操作错误
    #[error("文件错误 ({path}): {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// 单个能力调用错误
#[derive(Debug, Error)]
pub enum CapabilityError {
    /// 调用超时
    #[error("{capability} 调用超时 ({}ms)", .after.as_millis())]
    Timeout {
        capability: &'static str,
        after: Duration,
    },

    /// 输出无法解析为期望的结构
    #[error("{capability} 输出格式错误: {detail}")]
    Malformed {
        capability: &'static str,
        detail: String,
    },

    /// LLM API 调用失败
    #[error("LLM API 调用失败 (模型: {model}): {message}")]
    Llm { model: String, message: String },

    /// LLM 返回内容为空
    #[error("LLM 返回内容为空 (模型: {model})")]
    EmptyResponse { model: String },

    /// 其他能力内部错误
    #[error("{0}")]
    Other(String),
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建输入无效错误
    pub fn invalid_input(message: impl Into<String>) -> Self {
        AppError::InvalidInput(message.into())
    }

    /// 创建配置错误
    pub fn config(message: impl Into<String>) -> Self {
        AppError::Config(message.into())
    }

    /// 创建文件错误
    pub fn file(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File {
            path: path.into(),
            source,
        }
    }
}

impl CapabilityError {
    /// 创建输出格式错误
    pub fn malformed(capability: &'static str, detail: impl Into<String>) -> Self {
        CapabilityError::Malformed {
            capability,
            detail: detail.into(),
        }
    }

    /// 创建 LLM API 调用错误
    pub fn llm(model: impl Into<String>, source: impl std::fmt::Display) -> Self {
        CapabilityError::Llm {
            model: model.into(),
            message: source.to_string(),
        }
    }
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
