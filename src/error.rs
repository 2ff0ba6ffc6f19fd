use thiserror::Error;

use crate::models::{Address, PipelineResult};

/// 输入表格错误
#[derive(Debug, Error)]
pub enum InputError {
    /// 文件不存在
    #[error("文件不存在: {path}")]
    FileNotFound { path: String },
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// CSV 解析失败
    #[error("CSV 解析失败 ({path}): {source}")]
    CsvParseFailed {
        path: String,
        #[source]
        source: csv::Error,
    },
    /// 工作簿解析失败
    #[error("工作簿解析失败 ({path}): {source}")]
    WorkbookParseFailed {
        path: String,
        #[source]
        source: calamine::Error,
    },
    /// 表格没有任何列
    #[error("表格中没有找到任何列: {path}")]
    NoColumns { path: String },
    /// 指定的地址列不存在
    #[error("列 `{column}` 不存在, 可用的列: {}", .available.join(", "))]
    ColumnNotFound {
        column: String,
        available: Vec<String>,
    },
}

/// 地理编码服务故障
///
/// 注意："未找到地址" 不是错误，由 `Ok(None)` 表示
#[derive(Debug, Error)]
pub enum GeocodingError {
    /// 创建 HTTP 客户端失败
    #[error("创建 HTTP 客户端失败: {source}")]
    ClientSetup {
        #[source]
        source: reqwest::Error,
    },
    /// 网络请求失败
    #[error("请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// 请求超时
    #[error("请求超时: {endpoint}")]
    Timeout { endpoint: String },
    /// 服务返回非成功状态码
    #[error("服务返回错误状态 ({endpoint}): HTTP {status}")]
    BadStatus { endpoint: String, status: u16 },
    /// 请求频率限制
    #[error("请求频率限制 ({endpoint}), 建议等待: {retry_after:?}秒")]
    RateLimited {
        endpoint: String,
        retry_after: Option<u64>,
    },
    /// 响应格式错误
    #[error("响应格式错误 ({endpoint}): {message}")]
    MalformedResponse { endpoint: String, message: String },
}

impl GeocodingError {
    /// 是否为可重试的瞬时故障
    pub fn is_transient(&self) -> bool {
        match self {
            GeocodingError::RequestFailed { .. }
            | GeocodingError::Timeout { .. }
            | GeocodingError::RateLimited { .. } => true,
            GeocodingError::BadStatus { status, .. } => *status >= 500,
            GeocodingError::ClientSetup { .. } | GeocodingError::MalformedResponse { .. } => false,
        }
    }

    /// 服务建议的等待时间（秒）
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            GeocodingError::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

/// 流水线错误
#[derive(Debug, Error)]
pub enum PipelineError {
    /// 输入地址列表为空（或全部为空白）
    #[error("所选列中没有任何地址")]
    EmptyInput,
    /// 地理编码服务故障，流水线中止
    #[error("地址 `{address}` 查询失败 (故障前已处理 {processed}/{total}): {source}")]
    GeocodingFault {
        address: Address,
        processed: usize,
        total: usize,
        /// 故障前已收集的结果
        partial: Box<PipelineResult>,
        #[source]
        source: GeocodingError,
    },
}

impl PipelineError {
    /// 故障前已收集的部分结果
    pub fn partial_result(&self) -> Option<&PipelineResult> {
        match self {
            PipelineError::GeocodingFault { partial, .. } => Some(partial.as_ref()),
            PipelineError::EmptyInput => None,
        }
    }
}

/// 输出文件错误
#[derive(Debug, Error)]
pub enum OutputError {
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 序列化失败
    #[error("JSON 序列化失败: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 读取配置文件失败
    #[error("读取配置文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 配置项取值非法
    #[error("配置项 {field} 非法: {reason}")]
    Invalid { field: String, reason: String },
}

// ========== 便捷构造函数 ==========

impl GeocodingError {
    /// 根据 reqwest 错误创建请求失败（超时单独归类）
    pub fn from_reqwest(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        let endpoint = endpoint.into();
        if source.is_timeout() {
            GeocodingError::Timeout { endpoint }
        } else {
            GeocodingError::RequestFailed { endpoint, source }
        }
    }

    /// 创建响应格式错误
    pub fn malformed(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        GeocodingError::MalformedResponse {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }
}

impl ConfigError {
    /// 创建配置项非法错误
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
