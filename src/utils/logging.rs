//! 日志工具模块
//!
//! 提供日志初始化、格式化和输出的辅助函数
use crate::config::Config;
use crate::models::PipelineResult;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化 tracing 日志
///
/// `RUST_LOG` 优先；否则默认 info，详细模式下为 debug
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 访客地图生成");
    info!("🌍 地理编码服务: {}", config.geocoder_base_url);
    info!("📊 最大并发查询数: {}", config.max_concurrent_lookups);
    if config.max_retries > 0 {
        info!(
            "🔁 瞬时故障最多重试 {} 次, 间隔 {} 毫秒",
            config.max_retries, config.retry_delay_ms
        );
    }
    if config.continue_on_fault {
        info!("⏭️ 服务故障时跳过该地址继续处理");
    }
    info!("{}", "=".repeat(60));
}

/// 记录地址加载信息
///
/// # 参数
/// - `rows`: 读取到的行数
/// - `config`: 配置
pub fn log_addresses_loaded(rows: usize, config: &Config) {
    info!(
        "✓ 从列 `{}` 中读取到 {} 行地址",
        config.address_column, rows
    );
    info!("💡 相同地址只查询一次\n");
}

/// 记录查询进度
///
/// # 参数
/// - `completed`: 已完成的不重复地址数量
/// - `total`: 不重复地址总数
pub fn log_progress(completed: usize, total: usize) {
    let percent = if total == 0 {
        100
    } else {
        completed * 100 / total
    };
    info!("📍 查询进度: {}/{} ({}%)", completed, total, percent);
}

/// 打印最终统计信息
pub fn print_final_stats(result: &PipelineResult, config: &Config) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("📄 输入行数: {}", result.total_rows);
    info!("🏷️ 不重复地址: {}", result.unique_addresses);
    info!("✅ 找到: {}/{}", result.markers.len(), result.unique_addresses);
    info!("❓ 未找到: {}", result.unresolved.len());
    if !result.faulted.is_empty() {
        info!("❌ 故障: {}", result.faulted.len());
    }
    if result.processed() < result.unique_addresses {
        info!(
            "⛔ 未处理: {}",
            result.unique_addresses - result.processed()
        );
    }
    info!("{}", "=".repeat(60));
    info!("\n地图数据已保存至: {}", config.output_file);
    if !result.unresolved.is_empty() {
        info!("未找到的地址已保存至: {}", config.unresolved_file);
    }
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
