use serde::Serialize;

/// 经纬度坐标（度）
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeodeticCoordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeodeticCoordinate {
    /// 创建经纬度坐标，超出 [-90, 90] / [-180, 180] 或非有限值时返回 `None`
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        valid.then_some(Self {
            latitude,
            longitude,
        })
    }
}

/// 投影后的平面坐标（米）
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProjectedCoordinate {
    pub x: f64,
    pub y: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_accepts_bounds() {
        assert!(GeodeticCoordinate::new(90.0, 180.0).is_some());
        assert!(GeodeticCoordinate::new(-90.0, -180.0).is_some());
    }

    #[test]
    fn test_new_rejects_out_of_range() {
        assert!(GeodeticCoordinate::new(90.5, 0.0).is_none());
        assert!(GeodeticCoordinate::new(0.0, -180.1).is_none());
        assert!(GeodeticCoordinate::new(f64::NAN, 0.0).is_none());
        assert!(GeodeticCoordinate::new(0.0, f64::INFINITY).is_none());
    }
}
