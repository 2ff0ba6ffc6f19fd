//! 去重与聚合引擎 - 流程层
//!
//! 原始地址 → 归一化计数 → 每个不重复地址只查询一次 → 标记 / 未找到 分区
//!
//! 外部查询次数只取决于不重复地址数量，与输入行数无关

use futures::{stream, StreamExt};
use std::sync::Arc;
use tracing::{error, warn};

use crate::config::Config;
use crate::error::PipelineError;
use crate::models::{AddressCount, FaultedAddress, PipelineResult};
use crate::services::GeocodingClient;
use crate::workflow::address_flow::{AddressFlow, LookupOutcome, RetryPolicy};
use crate::workflow::lookup_ctx::LookupCtx;

/// 每次出现对应的标记大小增量
pub const SIZE_MULTIPLIER: usize = 4;

/// 标记大小上限，避免单个地址的圆圈过大
pub const MAX_MARKER_SIZE: u32 = 20;

/// 标记大小 = min(次数 × 4, 20)
pub fn marker_size(count: usize) -> u32 {
    count
        .saturating_mul(SIZE_MULTIPLIER)
        .min(MAX_MARKER_SIZE as usize) as u32
}

/// 服务故障时的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FaultPolicy {
    /// 中止并返回故障前的部分结果
    #[default]
    Halt,
    /// 记录到 `faulted` 后继续处理后续地址
    SkipAndContinue,
}

/// 单个地址查询完成后的状态，用于进度观察
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupStatus {
    Resolved,
    Unresolved,
    Faulted,
}

/// 统计原始地址，空白单元格会被跳过
///
/// 输入为空或全部为空白时返回 `PipelineError::EmptyInput`
pub fn count_addresses<S: AsRef<str>>(addresses: &[S]) -> Result<AddressCount, PipelineError> {
    let address_count = AddressCount::from_raw(addresses);

    if address_count.blank_rows() > 0 {
        warn!(
            "⚠️ 跳过 {} 个空白单元格 (共 {} 行)",
            address_count.blank_rows(),
            address_count.total_rows()
        );
    }

    if address_count.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    Ok(address_count)
}

/// 去重与聚合引擎
pub struct AggregationEngine {
    flow: AddressFlow,
    max_concurrent_lookups: usize,
    fault_policy: FaultPolicy,
}

impl AggregationEngine {
    /// 顺序查询、遇故障中止、不重试
    pub fn new(client: Arc<dyn GeocodingClient>) -> Self {
        Self {
            flow: AddressFlow::new(client),
            max_concurrent_lookups: 1,
            fault_policy: FaultPolicy::Halt,
        }
    }

    pub fn from_config(client: Arc<dyn GeocodingClient>, config: &Config) -> Self {
        let flow = AddressFlow::new(client)
            .with_retry(RetryPolicy::from_config(config))
            .with_verbose_logging(config.verbose_logging);
        let fault_policy = if config.continue_on_fault {
            FaultPolicy::SkipAndContinue
        } else {
            FaultPolicy::Halt
        };

        Self {
            flow,
            max_concurrent_lookups: config.max_concurrent_lookups.max(1),
            fault_policy,
        }
    }

    pub fn with_max_concurrent_lookups(mut self, max_concurrent_lookups: usize) -> Self {
        self.max_concurrent_lookups = max_concurrent_lookups.max(1);
        self
    }

    pub fn with_fault_policy(mut self, fault_policy: FaultPolicy) -> Self {
        self.fault_policy = fault_policy;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.flow = self.flow.with_retry(retry);
        self
    }

    pub fn max_concurrent_lookups(&self) -> usize {
        self.max_concurrent_lookups
    }

    pub fn fault_policy(&self) -> FaultPolicy {
        self.fault_policy
    }

    /// 聚合原始地址
    pub async fn aggregate<S: AsRef<str>>(
        &self,
        addresses: &[S],
    ) -> Result<PipelineResult, PipelineError> {
        self.aggregate_with_observer(addresses, |_, _| {}).await
    }

    /// 聚合原始地址，每个不重复地址处理完成后调用一次 `observer`
    ///
    /// 结果按首次出现顺序收集；并发查询时由本函数单独汇总，
    /// 因此 `observer` 的调用同样按首次出现顺序、不会重复
    pub async fn aggregate_with_observer<S, F>(
        &self,
        addresses: &[S],
        mut observer: F,
    ) -> Result<PipelineResult, PipelineError>
    where
        S: AsRef<str>,
        F: FnMut(&LookupCtx, LookupStatus),
    {
        let address_count = count_addresses(addresses)?;
        let total = address_count.len();
        let mut result = PipelineResult::new(address_count.total_rows(), total);

        let mut lookups = stream::iter(address_count.iter().enumerate())
            .map(|(index, (address, count))| {
                let ctx = LookupCtx::new(index + 1, total, address.clone(), count);
                async move {
                    let outcome = self.flow.run(&ctx).await;
                    (ctx, outcome)
                }
            })
            .buffered(self.max_concurrent_lookups);

        while let Some((ctx, outcome)) = lookups.next().await {
            let status = match outcome {
                Ok(LookupOutcome::Resolved(marker)) => {
                    result.markers.push(marker);
                    LookupStatus::Resolved
                }
                Ok(LookupOutcome::NotFound) | Ok(LookupOutcome::Unprojectable(_)) => {
                    result.unresolved.push(ctx.address.clone());
                    LookupStatus::Unresolved
                }
                Err(source) => match self.fault_policy {
                    FaultPolicy::SkipAndContinue => {
                        error!("{} ❌ 查询故障，跳过: {}", ctx, source);
                        result.faulted.push(FaultedAddress {
                            address: ctx.address.clone(),
                            reason: source.to_string(),
                        });
                        LookupStatus::Faulted
                    }
                    FaultPolicy::Halt => {
                        error!("{} ❌ 查询故障，中止处理: {}", ctx, source);
                        let processed = result.processed();
                        return Err(PipelineError::GeocodingFault {
                            address: ctx.address,
                            processed,
                            total,
                            partial: Box::new(result),
                            source,
                        });
                    }
                },
            };

            observer(&ctx, status);
        }

        Ok(result)
    }
}
