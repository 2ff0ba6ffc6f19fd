//! 结果写入服务 - 业务能力层
//!
//! 只负责"把结果写到文件"能力，不关心流程

use crate::error::OutputError;
use crate::models::{Address, MapData};
use std::path::Path;
use tokio::fs;
use tracing::debug;

/// 结果写入服务
///
/// 职责：
/// - 将地图数据写入 JSON 文件，供渲染层读取
/// - 将未找到的地址写入文本文件，每行一个
/// - 每次运行覆盖旧文件
pub struct ReportWriter {
    map_file_path: String,
    unresolved_file_path: String,
}

impl ReportWriter {
    /// 创建新的结果写入服务
    pub fn new(map_file_path: impl Into<String>, unresolved_file_path: impl Into<String>) -> Self {
        Self {
            map_file_path: map_file_path.into(),
            unresolved_file_path: unresolved_file_path.into(),
        }
    }

    pub fn map_file_path(&self) -> &str {
        &self.map_file_path
    }

    pub fn unresolved_file_path(&self) -> &str {
        &self.unresolved_file_path
    }

    /// 写入地图数据
    pub async fn write_map_data(&self, data: &MapData) -> Result<(), OutputError> {
        debug!("写入地图数据: {} 个标记 → {}", data.len(), self.map_file_path);

        let json = serde_json::to_string_pretty(data)?;
        write_file(&self.map_file_path, json).await
    }

    /// 写入未找到的地址列表
    ///
    /// 列表为空时删除旧文件，避免留下上一次运行的结果
    pub async fn write_unresolved(&self, unresolved: &[Address]) -> Result<(), OutputError> {
        if unresolved.is_empty() {
            if Path::new(&self.unresolved_file_path).exists() {
                fs::remove_file(&self.unresolved_file_path)
                    .await
                    .map_err(|source| OutputError::WriteFailed {
                        path: self.unresolved_file_path.clone(),
                        source,
                    })?;
            }
            return Ok(());
        }

        debug!(
            "写入未找到的地址: {} 个 → {}",
            unresolved.len(),
            self.unresolved_file_path
        );

        let mut content = String::new();
        for address in unresolved {
            content.push_str(address.as_str());
            content.push('\n');
        }
        write_file(&self.unresolved_file_path, content).await
    }
}

async fn write_file(path: &str, content: String) -> Result<(), OutputError> {
    fs::write(path, content)
        .await
        .map_err(|source| OutputError::WriteFailed {
            path: path.to_string(),
            source,
        })
}
