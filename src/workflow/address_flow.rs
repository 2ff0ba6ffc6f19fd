//! 单个地址的处理流程 - 流程层
//!
//! 流程顺序：
//! 1. 地理编码查询（瞬时故障按重试策略重试）
//! 2. 检查坐标是否可投影（两极除外）
//! 3. 投影并生成地图标记

use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::GeocodingError;
use crate::models::{GeodeticCoordinate, MapMarker};
use crate::services::projection::{is_projectable, project_coordinate};
use crate::services::GeocodingClient;
use crate::workflow::aggregation::marker_size;
use crate::workflow::lookup_ctx::LookupCtx;

/// 单个地址的处理结果
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    /// 找到坐标并生成了标记
    Resolved(MapMarker),
    /// 服务没有匹配结果
    NotFound,
    /// 找到的坐标位于两极，无法投影
    Unprojectable(GeodeticCoordinate),
}

/// 重试策略
///
/// 只对瞬时故障重试，"未找到" 永远不重试
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: usize,
    pub delay: Duration,
}

impl RetryPolicy {
    /// 不重试
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            delay: Duration::ZERO,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            max_retries: config.max_retries,
            delay: Duration::from_millis(config.retry_delay_ms),
        }
    }

    /// 本次故障后的等待时间，服务给出 Retry-After 时取较大值
    fn delay_for(&self, error: &GeocodingError) -> Duration {
        match error.retry_after() {
            Some(secs) => self.delay.max(Duration::from_secs(secs)),
            None => self.delay,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

/// 单个地址的处理流程
///
/// - 只处理一个不重复地址
/// - 不知道其他地址，也不负责去重和汇总
/// - 只依赖业务能力（services）
pub struct AddressFlow {
    client: Arc<dyn GeocodingClient>,
    retry: RetryPolicy,
    verbose_logging: bool,
}

impl AddressFlow {
    pub fn new(client: Arc<dyn GeocodingClient>) -> Self {
        Self {
            client,
            retry: RetryPolicy::none(),
            verbose_logging: false,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_verbose_logging(mut self, verbose_logging: bool) -> Self {
        self.verbose_logging = verbose_logging;
        self
    }

    pub async fn run(&self, ctx: &LookupCtx) -> Result<LookupOutcome, GeocodingError> {
        debug!("{} 🔍 查询坐标...", ctx);

        let coordinate = match self.resolve_with_retry(ctx).await? {
            Some(coordinate) => coordinate,
            None => {
                warn!("{} ⚠️ 未找到该地址", ctx);
                return Ok(LookupOutcome::NotFound);
            }
        };

        // 两极处投影发散，按未找到处理
        if !is_projectable(&coordinate) {
            warn!(
                "{} ⚠️ 坐标位于两极 (纬度 {})，无法投影，按未找到处理",
                ctx, coordinate.latitude
            );
            return Ok(LookupOutcome::Unprojectable(coordinate));
        }

        let position = project_coordinate(&coordinate);

        if self.verbose_logging {
            info!(
                "{} ✓ ({:.5}, {:.5}) → ({:.1}, {:.1})",
                ctx, coordinate.latitude, coordinate.longitude, position.x, position.y
            );
        }

        Ok(LookupOutcome::Resolved(MapMarker {
            address: ctx.address.clone(),
            coordinate,
            position,
            count: ctx.count,
            size: marker_size(ctx.count),
        }))
    }

    async fn resolve_with_retry(
        &self,
        ctx: &LookupCtx,
    ) -> Result<Option<GeodeticCoordinate>, GeocodingError> {
        let mut attempt = 0;
        loop {
            match self.client.resolve(&ctx.address).await {
                Err(e) if e.is_transient() && attempt < self.retry.max_retries => {
                    attempt += 1;
                    let delay = self.retry.delay_for(&e);
                    warn!(
                        "{} ⚠️ 查询失败: {} (重试 {}/{}), 等待 {:?} 后重试...",
                        ctx, e, attempt, self.retry.max_retries, delay
                    );
                    sleep(delay).await;
                }
                other => return other,
            }
        }
    }
}
