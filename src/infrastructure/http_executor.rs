//! HTTP 执行器 - 基础设施层
//!
//! 持有唯一的 HTTP 客户端，只暴露"发送 GET 请求并取回 JSON"的能力

use crate::config::Config;
use crate::error::GeocodingError;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, StatusCode};
use serde_json::Value as JsonValue;
use std::time::Duration;
use tracing::debug;

/// HTTP 执行器
///
/// 职责：
/// - 持有唯一的 reqwest Client（内部使用 Arc，可安全 clone）
/// - 统一设置 User-Agent 和单次请求超时
/// - 把状态码、超时、JSON 解析失败统一转换为 `GeocodingError`
/// - 不认识 Address / 坐标
#[derive(Clone)]
pub struct HttpExecutor {
    client: Client,
}

impl HttpExecutor {
    /// 根据配置创建 HTTP 执行器
    pub fn new(config: &Config) -> Result<Self, GeocodingError> {
        let client = Client::builder()
            .user_agent(config.geocoder_user_agent.as_str())
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|source| GeocodingError::ClientSetup { source })?;

        Ok(Self { client })
    }

    /// 发送 GET 请求并返回 JSON 结果
    ///
    /// # 参数
    /// - `url`: 请求地址
    /// - `query`: 查询参数
    pub async fn get_json(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<JsonValue, GeocodingError> {
        debug!("GET {} {:?}", url, query);

        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| GeocodingError::from_reqwest(url, e))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok());
            return Err(GeocodingError::RateLimited {
                endpoint: url.to_string(),
                retry_after,
            });
        }
        if !status.is_success() {
            return Err(GeocodingError::BadStatus {
                endpoint: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| GeocodingError::from_reqwest(url, e))?;

        serde_json::from_str(&body)
            .map_err(|e| GeocodingError::malformed(url, format!("JSON解析失败: {}", e)))
    }
}
