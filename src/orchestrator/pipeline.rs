//! 流水线驱动 - 编排层
//!
//! ## 职责
//!
//! 1. **顺序编排**：调用聚合引擎完成 去重 → 查询 → 投影 → 汇总
//! 2. **进度转换**：把引擎的单地址事件转换为 `progress(completed, total)`
//! 3. **结果汇总**：返回标记与未找到列表，记录运行摘要
//!
//! 不包含业务判断，只做调度和进度转换

use crate::error::PipelineError;
use crate::models::PipelineResult;
use crate::workflow::{AggregationEngine, LookupStatus};
use std::time::Instant;
use tracing::{debug, error, info};

/// 流水线驱动
pub struct PipelineDriver {
    engine: AggregationEngine,
}

impl PipelineDriver {
    pub fn new(engine: AggregationEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &AggregationEngine {
        &self.engine
    }

    /// 运行流水线
    ///
    /// # 参数
    /// - `addresses`: 原始地址（未归一化）
    /// - `progress`: 每完成一个不重复地址调用一次，`total` 为不重复地址数量
    ///
    /// # 返回
    /// 返回标记与未找到地址；服务故障时错误中携带故障前的部分结果
    pub async fn run<S, P>(
        &self,
        addresses: &[S],
        mut progress: P,
    ) -> Result<PipelineResult, PipelineError>
    where
        S: AsRef<str>,
        P: FnMut(usize, usize),
    {
        let started = Instant::now();
        let mut completed = 0;

        let outcome = self
            .engine
            .aggregate_with_observer(addresses, |ctx, status| {
                completed += 1;
                if status != LookupStatus::Resolved {
                    debug!("{} 状态: {:?}", ctx, status);
                }
                progress(completed, ctx.total);
            })
            .await;

        match &outcome {
            Ok(result) => {
                info!(
                    "✓ 查询完成: {} 个不重复地址, 找到 {}, 未找到 {}, 故障 {} (耗时 {:.1?})",
                    result.unique_addresses,
                    result.markers.len(),
                    result.unresolved.len(),
                    result.faulted.len(),
                    started.elapsed()
                );
            }
            Err(PipelineError::GeocodingFault {
                address,
                processed,
                total,
                ..
            }) => {
                error!(
                    "❌ 流水线在地址 `{}` 处中止: 故障前已处理 {}/{} 个不重复地址",
                    address, processed, total
                );
            }
            Err(PipelineError::EmptyInput) => {
                error!("❌ 所选列中没有任何地址");
            }
        }

        outcome
    }
}
