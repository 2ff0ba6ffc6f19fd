//! 地图标记与流水线结果

use crate::models::address::Address;
use crate::models::coordinate::{GeodeticCoordinate, ProjectedCoordinate};
use serde::Serialize;

/// 地图标记：一个已解析的不重复地址
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    pub address: Address,
    pub coordinate: GeodeticCoordinate,
    pub position: ProjectedCoordinate,
    /// 地址在输入中出现的次数
    pub count: usize,
    /// 标记显示大小
    pub size: u32,
}

/// 因服务故障被跳过的地址（仅在跳过模式下出现）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaultedAddress {
    pub address: Address,
    pub reason: String,
}

/// 流水线结果
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineResult {
    pub markers: Vec<MapMarker>,
    pub unresolved: Vec<Address>,
    pub faulted: Vec<FaultedAddress>,
    /// 输入行数（包括空白行）
    pub total_rows: usize,
    /// 不重复的地址数量
    pub unique_addresses: usize,
}

impl PipelineResult {
    pub(crate) fn new(total_rows: usize, unique_addresses: usize) -> Self {
        Self {
            total_rows,
            unique_addresses,
            ..Default::default()
        }
    }

    /// 已处理完成的不重复地址数量
    pub fn processed(&self) -> usize {
        self.markers.len() + self.unresolved.len() + self.faulted.len()
    }

    /// 所有地址都已处理且没有故障
    pub fn is_clean(&self) -> bool {
        self.faulted.is_empty() && self.processed() == self.unique_addresses
    }
}
