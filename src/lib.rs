//! # Visitor Map
//!
//! 把访客表格中的地址解析为坐标，投影到 Web Mercator 平面，并按出现次数聚合为地图标记
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（HTTP Client），只暴露能力
//! - `HttpExecutor` - 唯一的 client owner，提供 get_json() 能力
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个地址或单份结果
//! - `GeocodingClient` / `NominatimClient` - 地址 → 经纬度
//! - `projection` - 经纬度 → 平面坐标
//! - `ReportWriter` - 写地图数据与未找到地址
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个地址"的处理流程以及整张表的去重聚合
//! - `LookupCtx` - 上下文封装（序号 + 地址 + 次数）
//! - `AddressFlow` - 流程编排（查询 → 校验 → 投影 → 标记）
//! - `AggregationEngine` - 去重计数、每个不重复地址查询一次、分区汇总
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/pipeline` - 流水线驱动，进度转换
//! - `orchestrator/app` - 读取输入、写出结果、统计
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{GeocodingError, InputError, PipelineError};
pub use infrastructure::HttpExecutor;
pub use models::{
    normalize_address, Address, GeodeticCoordinate, MapData, MapMarker, PipelineResult,
    ProjectedCoordinate,
};
pub use orchestrator::{App, PipelineDriver};
pub use services::{GeocodingClient, NominatimClient};
pub use workflow::{AggregationEngine, FaultPolicy, RetryPolicy};
