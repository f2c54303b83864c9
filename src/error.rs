use std::fmt;

use thiserror::Error;

use crate::api::{Generation, Operation};

/// 应用程序错误类型
#[derive(Debug)]
pub enum AppError {
    /// API 调用错误
    Api(ApiError),
    /// 端点配置错误
    Endpoint(EndpointError),
    /// 题目记录错误
    Record(RecordError),
    /// 文件操作错误
    File(FileError),
    /// 业务逻辑错误
    Business(BusinessError),
    /// 配置错误
    Config(ConfigError),
    /// 其他错误（用于包装第三方库错误）
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Api(e) => write!(f, "API错误: {}", e),
            AppError::Endpoint(e) => write!(f, "端点错误: {}", e),
            AppError::Record(e) => write!(f, "记录错误: {}", e),
            AppError::File(e) => write!(f, "文件错误: {}", e),
            AppError::Business(e) => write!(f, "业务错误: {}", e),
            AppError::Config(e) => write!(f, "配置错误: {}", e),
            AppError::Other(msg) => write!(f, "错误: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Api(e) => Some(e),
            AppError::Endpoint(e) => Some(e),
            AppError::Record(e) => Some(e),
            AppError::File(e) => Some(e),
            AppError::Business(e) => Some(e),
            AppError::Config(e) => Some(e),
            AppError::Other(_) => None,
        }
    }
}

/// API 调用错误
///
/// 这些错误只在门面内部流转，越过门面边界前会被转换为失败的
/// `CanonicalResponse`。
#[derive(Debug, Error)]
pub enum ApiError {
    /// 网络层失败（DNS、连接、超时）
    #[error("网络请求失败 ({url}): {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// 非 2xx 状态码
    #[error("HTTP 状态异常 ({url}): {status}")]
    HttpStatus { url: String, status: u16 },
    /// 响应可解析，但业务上失败
    #[error("API返回失败响应 (code={code:?}): {message}")]
    UnsuccessfulEnvelope { code: Option<i64>, message: String },
    /// 响应体为空或为 null
    #[error("API返回空结果: {url}")]
    EmptyResponse { url: String },
    /// JSON 解析失败
    #[error("JSON解析失败: {source}")]
    JsonParseFailed {
        #[source]
        source: serde_json::Error,
    },
}

/// 端点解析错误（编程错误，致命）
#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("未找到端点 {operation} 在API版本 {generation} 中")]
    UnknownOperation {
        operation: Operation,
        generation: Generation,
    },
    #[error("端点 {operation} 缺少路径参数 {param}")]
    MissingPathParam {
        operation: Operation,
        param: String,
    },
}

/// 题目记录错误
#[derive(Debug, Error)]
pub enum RecordError {
    /// 题目记录缺少必要字段或结构不合法
    #[error("题目记录不完整 (QID: {question_id}): {reason}")]
    Malformed { question_id: String, reason: String },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    #[error("创建目录失败 ({path}): {source}")]
    CreateDirFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// 业务逻辑错误
#[derive(Debug, Error)]
pub enum BusinessError {
    /// 课程目录获取失败，整次导出中止
    #[error("获取课程目录失败 (课程: {course_id}): {message}")]
    DirectoryUnavailable { course_id: String, message: String },
    /// 课程目录中没有章节
    #[error("课程 {course_id} 中没有找到章节")]
    NoChapters { course_id: String },
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
    /// 环境变量不存在或为空
    #[error("环境变量 {var_name} 不存在")]
    EnvVarNotFound { var_name: String },
}

// ========== 从常见错误类型转换 ==========

impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        AppError::Api(err)
    }
}

impl From<EndpointError> for AppError {
    fn from(err: EndpointError) -> Self {
        AppError::Endpoint(err)
    }
}

impl From<RecordError> for AppError {
    fn from(err: RecordError) -> Self {
        AppError::Record(err)
    }
}

impl From<FileError> for AppError {
    fn from(err: FileError) -> Self {
        AppError::File(err)
    }
}

impl From<BusinessError> for AppError {
    fn from(err: BusinessError) -> Self {
        AppError::Business(err)
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Api(ApiError::JsonParseFailed { source: err })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
