//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：创建 HttpExecutor、地理编码客户端、聚合引擎
//! 2. **加载输入**：从 CSV 或 Excel 工作簿中读取地址列
//! 3. **运行流水线**：委托 PipelineDriver 完成查询与聚合
//! 4. **写出结果**：地图数据 JSON + 未找到地址列表
//! 5. **全局统计**：输出运行摘要
//!
//! 唯一持有 HttpExecutor 的模块

use crate::config::Config;
use crate::infrastructure::HttpExecutor;
use crate::models::{load_address_column, MapData, PipelineResult, TableFormat};
use crate::orchestrator::pipeline::PipelineDriver;
use crate::services::{GeocodingClient, NominatimClient, ReportWriter};
use crate::utils::logging;
use crate::workflow::AggregationEngine;
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

/// 应用主结构
pub struct App {
    config: Config,
    driver: PipelineDriver,
    writer: ReportWriter,
}

impl App {
    /// 初始化应用（使用 Nominatim 地理编码）
    pub async fn initialize(config: Config) -> Result<Self> {
        let executor = HttpExecutor::new(&config).context("无法创建 HTTP 客户端")?;
        let client = NominatimClient::new(executor, &config);
        Ok(Self::with_client(config, Arc::new(client)))
    }

    /// 使用自定义地理编码客户端初始化
    pub fn with_client(config: Config, client: Arc<dyn GeocodingClient>) -> Self {
        logging::log_startup(&config);

        let engine = AggregationEngine::from_config(client, &config);
        let writer = ReportWriter::new(&config.output_file, &config.unresolved_file);

        Self {
            config,
            driver: PipelineDriver::new(engine),
            writer,
        }
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<PipelineResult> {
        let addresses = self.load_addresses().await?;
        logging::log_addresses_loaded(addresses.len(), &self.config);

        match self.driver.run(&addresses, logging::log_progress).await {
            Ok(result) => {
                self.write_outputs(&result).await?;
                logging::print_final_stats(&result, &self.config);
                Ok(result)
            }
            Err(err) => {
                if let Some(partial) = err.partial_result() {
                    // 故障前的结果仍然写出
                    warn!("⚠️ 写出故障前的部分结果");
                    if let Err(write_err) = self.write_outputs(partial).await {
                        error!("❌ 部分结果写出失败: {:#}", write_err);
                    }
                    logging::print_final_stats(partial, &self.config);
                }
                Err(err).context("流水线运行失败")
            }
        }
    }

    /// 加载地址列（CSV 或 Excel 工作簿，按扩展名判断）
    async fn load_addresses(&self) -> Result<Vec<String>> {
        let path = Path::new(&self.config.input_file);
        info!(
            "\n📁 正在读取 {} ({:?}) ...",
            self.config.input_file,
            TableFormat::from_path(path)
        );

        load_address_column(path, &self.config.address_column)
            .await
            .with_context(|| format!("无法读取地址列: {}", self.config.address_column))
    }

    /// 写出地图数据和未找到的地址
    async fn write_outputs(&self, result: &PipelineResult) -> Result<()> {
        let map_data = MapData::from_markers(&result.markers);
        self.writer
            .write_map_data(&map_data)
            .await
            .context("无法写入地图数据")?;
        info!("✓ 地图数据已保存至: {}", self.writer.map_file_path());

        if !result.unresolved.is_empty() {
            warn!("⚠️ 无法找到以下地址:");
            for address in &result.unresolved {
                warn!("\t{}", address);
            }
        }
        self.writer
            .write_unresolved(&result.unresolved)
            .await
            .context("无法写入未找到的地址")?;

        for faulted in &result.faulted {
            error!("❌ 查询故障: {} ({})", faulted.address, faulted.reason);
        }

        Ok(())
    }
}

