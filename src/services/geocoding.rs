//! 地理编码服务 - 业务能力层
//!
//! 只负责"一个地址 → 一个坐标"的查询能力，不关心去重和流程
//!
//! ## 技术栈
//! - 通过 `HttpExecutor` 调用 Nominatim 兼容的 `/search` 接口
//! - `GeocodingClient` trait 可被测试替换为确定性的桩实现

use crate::config::Config;
use crate::error::GeocodingError;
use crate::infrastructure::HttpExecutor;
use crate::models::{Address, GeodeticCoordinate};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::debug;

/// 地理编码能力
///
/// - `Ok(Some(_))`: 找到坐标
/// - `Ok(None)`: 服务正常返回但没有匹配结果
/// - `Err(_)`: 服务故障（网络、超时、状态码、响应格式）
///
/// 每次调用恰好发出一次外部请求，不做缓存
#[async_trait]
pub trait GeocodingClient: Send + Sync {
    async fn resolve(&self, address: &Address)
        -> Result<Option<GeodeticCoordinate>, GeocodingError>;
}

/// Nominatim（OpenStreetMap）地理编码客户端
pub struct NominatimClient {
    executor: HttpExecutor,
    search_url: String,
}

/// `/search` 返回数组中的一项，lat / lon 为字符串
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: Option<String>,
}

impl NominatimClient {
    /// 创建新的 Nominatim 客户端
    pub fn new(executor: HttpExecutor, config: &Config) -> Self {
        Self::with_base_url(executor, &config.geocoder_base_url)
    }

    /// 使用自定义服务地址创建
    pub fn with_base_url(executor: HttpExecutor, base_url: &str) -> Self {
        Self {
            executor,
            search_url: format!("{}/search", base_url.trim_end_matches('/')),
        }
    }

    pub fn search_url(&self) -> &str {
        &self.search_url
    }
}

#[async_trait]
impl GeocodingClient for NominatimClient {
    async fn resolve(
        &self,
        address: &Address,
    ) -> Result<Option<GeodeticCoordinate>, GeocodingError> {
        let result = self
            .executor
            .get_json(
                &self.search_url,
                &[("q", address.as_str()), ("format", "jsonv2"), ("limit", "1")],
            )
            .await?;

        debug!("Nominatim 搜索结果: {}", result);

        parse_search_response(&self.search_url, result)
    }
}

/// 解析 `/search` 响应，取第一个（最佳）匹配
///
/// 空数组表示未找到；结构不符或坐标越界视为服务故障
pub fn parse_search_response(
    endpoint: &str,
    result: JsonValue,
) -> Result<Option<GeodeticCoordinate>, GeocodingError> {
    let places: Vec<NominatimPlace> = serde_json::from_value(result)
        .map_err(|e| GeocodingError::malformed(endpoint, format!("无法解析搜索结果: {}", e)))?;

    let Some(place) = places.into_iter().next() else {
        return Ok(None);
    };

    let latitude = parse_degrees(endpoint, "lat", &place.lat)?;
    let longitude = parse_degrees(endpoint, "lon", &place.lon)?;

    if let Some(name) = &place.display_name {
        debug!("最佳匹配: {} ({}, {})", name, latitude, longitude);
    }

    GeodeticCoordinate::new(latitude, longitude)
        .map(Some)
        .ok_or_else(|| {
            GeocodingError::malformed(
                endpoint,
                format!("坐标超出范围: ({}, {})", latitude, longitude),
            )
        })
}

fn parse_degrees(endpoint: &str, field: &str, value: &str) -> Result<f64, GeocodingError> {
    value
        .trim()
        .parse()
        .map_err(|_| GeocodingError::malformed(endpoint, format!("{} 不是数字: {:?}", field, value)))
}
