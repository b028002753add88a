//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::application::ports::ACTIVE_TASK_KEY;
use crate::infrastructure::adapters::HttpStatusClientConfig;
use crate::infrastructure::persistence::SledHandleStoreConfig;
use crate::infrastructure::polling::PollingConfig;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 后端 API 配置
    #[serde(default)]
    pub api: ApiConfig,

    /// 轮询配置
    #[serde(default)]
    pub polling: PollConfig,

    /// 活动任务句柄存储配置
    #[serde(default)]
    pub store: StoreConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 后端 API 配置
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// 后端基础 URL
    #[serde(default = "default_api_url")]
    pub base_url: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_api_timeout")]
    pub timeout_secs: u64,
}

fn default_api_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_api_timeout() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_url(),
            timeout_secs: default_api_timeout(),
        }
    }
}

impl ApiConfig {
    pub fn client_config(&self) -> HttpStatusClientConfig {
        HttpStatusClientConfig::new(self.base_url.clone()).with_timeout(self.timeout_secs)
    }
}

/// 轮询配置
#[derive(Debug, Clone, Deserialize)]
pub struct PollConfig {
    /// 轮询间隔（毫秒）
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// 每个周期的最大重试次数
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// 退避基数（毫秒）
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// 退避上限（毫秒）
    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,
}

fn default_interval_ms() -> u64 {
    2500
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_base_ms() -> u64 {
    1000
}

fn default_backoff_max_ms() -> u64 {
    30_000
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_max_ms: default_backoff_max_ms(),
        }
    }
}

impl PollConfig {
    pub fn scheduler_config(&self) -> PollingConfig {
        PollingConfig {
            interval: Duration::from_millis(self.interval_ms),
            max_retries: self.max_retries,
            backoff_base: Duration::from_millis(self.backoff_base_ms),
            backoff_max: Duration::from_millis(self.backoff_max_ms),
        }
    }
}

/// 活动任务句柄存储配置
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Sled 数据库路径
    #[serde(default = "default_store_path")]
    pub path: PathBuf,

    /// 存储键
    #[serde(default = "default_store_key")]
    pub key: String,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("data/streamscale.sled")
}

fn default_store_key() -> String {
    ACTIVE_TASK_KEY.to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            key: default_store_key(),
        }
    }
}

impl StoreConfig {
    pub fn sled_config(&self) -> SledHandleStoreConfig {
        SledHandleStoreConfig {
            db_path: self.path.to_string_lossy().to_string(),
            key: self.key.clone(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.api.base_url, "http://localhost:8000");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.polling.interval_ms, 2500);
        assert_eq!(config.polling.max_retries, 3);
        assert_eq!(config.store.key, "streamscale_active_task");
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_scheduler_config() {
        let config = PollConfig::default().scheduler_config();
        assert_eq!(config.interval, Duration::from_millis(2500));
        assert_eq!(config.backoff_base, Duration::from_millis(1000));
        assert_eq!(config.backoff_max, Duration::from_millis(30_000));
    }

    #[test]
    fn test_sled_config() {
        let config = StoreConfig::default().sled_config();
        assert_eq!(config.db_path, "data/streamscale.sled");
        assert_eq!(config.key, ACTIVE_TASK_KEY);
    }
}
