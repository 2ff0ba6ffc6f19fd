use crate::error::ConfigError;
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// 默认配置文件名
pub const DEFAULT_CONFIG_FILE: &str = "visitor_map.toml";

/// 指定配置文件路径的环境变量
pub const CONFIG_FILE_ENV: &str = "VISITOR_MAP_CONFIG";

/// 程序配置文件
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// 输入的 CSV 表格
    pub input_file: String,
    /// 地址所在列的列名
    pub address_column: String,
    /// 地图数据输出文件（JSON）
    pub output_file: String,
    /// 未找到的地址列表输出文件
    pub unresolved_file: String,
    // --- 地理编码服务配置 ---
    pub geocoder_base_url: String,
    pub geocoder_user_agent: String,
    /// 单次查询超时（秒）
    pub request_timeout_secs: u64,
    /// 同时进行的查询数量（1 表示严格顺序）
    pub max_concurrent_lookups: usize,
    /// 瞬时故障的最大重试次数
    pub max_retries: usize,
    /// 重试间隔（毫秒）
    pub retry_delay_ms: u64,
    /// 遇到服务故障时跳过该地址继续处理
    pub continue_on_fault: bool,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_file: "visitors.csv".to_string(),
            address_column: "address".to_string(),
            output_file: "visitor_map.json".to_string(),
            unresolved_file: "unresolved.txt".to_string(),
            geocoder_base_url: "https://nominatim.openstreetmap.org".to_string(),
            geocoder_user_agent: concat!("visitor_map/", env!("CARGO_PKG_VERSION")).to_string(),
            request_timeout_secs: 10,
            max_concurrent_lookups: 1,
            max_retries: 0,
            retry_delay_ms: 1000,
            continue_on_fault: false,
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 加载配置：配置文件（可选）→ 环境变量覆盖 → 校验
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_FILE_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let config = Self::from_file_or_default(&path)?.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// 从 TOML 文件加载，文件不存在时使用默认配置
    pub fn from_file_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content).map_err(|source| {
                ConfigError::TomlParseFailed {
                    path: path.display().to_string(),
                    source,
                }
            }),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!("未找到配置文件 {}，使用默认配置", path.display());
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::ReadFailed {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    /// 解析 TOML 文本，未出现的字段使用默认值
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// 只使用默认配置和环境变量
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().apply_env()
    }

    /// 用环境变量覆盖已有配置
    pub fn apply_env(self) -> Result<Self, ConfigError> {
        Ok(Self {
            input_file: env_string("INPUT_FILE").unwrap_or(self.input_file),
            address_column: env_string("ADDRESS_COLUMN").unwrap_or(self.address_column),
            output_file: env_string("OUTPUT_FILE").unwrap_or(self.output_file),
            unresolved_file: env_string("UNRESOLVED_FILE").unwrap_or(self.unresolved_file),
            geocoder_base_url: env_string("GEOCODER_BASE_URL").unwrap_or(self.geocoder_base_url),
            geocoder_user_agent: env_string("GEOCODER_USER_AGENT")
                .unwrap_or(self.geocoder_user_agent),
            request_timeout_secs: env_parse("REQUEST_TIMEOUT_SECS", "u64")?
                .unwrap_or(self.request_timeout_secs),
            max_concurrent_lookups: env_parse("MAX_CONCURRENT_LOOKUPS", "usize")?
                .unwrap_or(self.max_concurrent_lookups),
            max_retries: env_parse("MAX_RETRIES", "usize")?.unwrap_or(self.max_retries),
            retry_delay_ms: env_parse("RETRY_DELAY_MS", "u64")?.unwrap_or(self.retry_delay_ms),
            continue_on_fault: env_parse("CONTINUE_ON_FAULT", "bool")?
                .unwrap_or(self.continue_on_fault),
            verbose_logging: env_parse("VERBOSE_LOGGING", "bool")?
                .unwrap_or(self.verbose_logging),
        })
    }

    /// 校验配置项取值
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent_lookups == 0 {
            return Err(ConfigError::invalid("max_concurrent_lookups", "必须大于 0"));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::invalid("request_timeout_secs", "必须大于 0"));
        }
        if self.address_column.trim().is_empty() {
            return Err(ConfigError::invalid("address_column", "不能为空"));
        }
        if self.geocoder_base_url.trim().is_empty() {
            return Err(ConfigError::invalid("geocoder_base_url", "不能为空"));
        }
        Ok(())
    }
}

fn env_string(var_name: &str) -> Option<String> {
    std::env::var(var_name).ok()
}

fn env_parse<T: FromStr>(var_name: &str, expected_type: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(var_name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            input_file = "guests.csv"
            address_column = "Adresse"
            max_concurrent_lookups = 4
            "#,
        )
        .unwrap();

        assert_eq!(config.input_file, "guests.csv");
        assert_eq!(config.address_column, "Adresse");
        assert_eq!(config.max_concurrent_lookups, 4);
        assert_eq!(config.output_file, Config::default().output_file);
        assert_eq!(config.max_retries, 0);
        assert!(!config.continue_on_fault);
    }

    #[test]
    fn test_invalid_toml_type() {
        assert!(Config::from_toml_str("max_retries = \"three\"").is_err());
    }

    #[test]
    fn test_missing_file_falls_back_to_default() {
        let config = Config::from_file_or_default("does/not/exist/visitor_map.toml").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let config = Config {
            max_concurrent_lookups: 0,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { ref field, .. }) if field == "max_concurrent_lookups"
        ));
    }

    #[test]
    fn test_default_is_valid() {
        assert!(Config::default().validate().is_ok());
    }
}
