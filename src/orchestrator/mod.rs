//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `app` - 应用入口
//! - 管理应用生命周期（初始化、运行）
//! - 读取 CSV 地址列
//! - 写出地图数据与未找到地址
//! - 输出全局统计信息
//!
//! ### `pipeline` - 流水线驱动
//! - 调用聚合引擎
//! - 把单地址事件转换为 (completed, total) 进度
//!
//! ## 层次关系
//!
//! ```text
//! app (处理整张表)
//!     ↓
//! pipeline (进度转换)
//!     ↓
//! workflow::AggregationEngine (去重 + 汇总)
//!     ↓
//! workflow::AddressFlow (处理单个地址)
//!     ↓
//! services (能力层：geocoding / projection / report)
//!     ↓
//! infrastructure (基础设施：HttpExecutor)
//! ```

pub mod app;
pub mod pipeline;

// 重新导出主要类型
pub use app::App;
pub use pipeline::PipelineDriver;
