//! 坐标投影服务 - 业务能力层
//!
//! WGS84 经纬度 → Web Mercator 平面坐标，纯函数

use crate::models::{GeodeticCoordinate, ProjectedCoordinate};
use std::f64::consts::PI;

/// 地球赤道半径（米）
pub const EQUATORIAL_RADIUS: f64 = 6_378_137.0;

/// 世界地图在 x / y 方向的半宽（米）
pub const WORLD_EXTENT: f64 = PI * EQUATORIAL_RADIUS;

/// 经纬度投影为平面坐标
///
/// 调用方必须保证纬度在 (-90, 90) 开区间内，两极处公式发散
pub fn project(latitude: f64, longitude: f64) -> ProjectedCoordinate {
    debug_assert!(latitude.abs() < 90.0, "纬度 {latitude} 超出投影范围");

    let x = longitude * (EQUATORIAL_RADIUS * PI / 180.0);
    let y = ((90.0 + latitude) * PI / 360.0).tan().ln() * EQUATORIAL_RADIUS;
    ProjectedCoordinate { x, y }
}

/// 投影已校验的经纬度坐标
pub fn project_coordinate(coordinate: &GeodeticCoordinate) -> ProjectedCoordinate {
    project(coordinate.latitude, coordinate.longitude)
}

/// 坐标是否在投影定义域内（不在两极）
pub fn is_projectable(coordinate: &GeodeticCoordinate) -> bool {
    coordinate.latitude.abs() < 90.0
}
