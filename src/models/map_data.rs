//! 渲染层使用的列式数据源

use crate::models::marker::MapMarker;
use crate::services::projection::WORLD_EXTENT;
use serde::Serialize;

/// 列式地图数据：每一列长度相同，下标一一对应
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapData {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub address: Vec<String>,
    pub sizes: Vec<u32>,
    /// 整个世界地图的 x 范围
    pub x_range: [f64; 2],
    /// 整个世界地图的 y 范围
    pub y_range: [f64; 2],
}

impl MapData {
    pub fn from_markers(markers: &[MapMarker]) -> Self {
        let mut data = Self {
            x: Vec::with_capacity(markers.len()),
            y: Vec::with_capacity(markers.len()),
            address: Vec::with_capacity(markers.len()),
            sizes: Vec::with_capacity(markers.len()),
            x_range: [-WORLD_EXTENT, WORLD_EXTENT],
            y_range: [-WORLD_EXTENT, WORLD_EXTENT],
        };
        for marker in markers {
            data.x.push(marker.position.x);
            data.y.push(marker.position.y);
            data.address.push(marker.address.to_string());
            data.sizes.push(marker.size);
        }
        data
    }

    pub fn len(&self) -> usize {
        self.address.len()
    }

    pub fn is_empty(&self) -> bool {
        self.address.is_empty()
    }
}
