use serde::{Deserialize, Serialize};

/// 全局应用配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub query: QueryConfig,
    pub feed: FeedConfig,
}

/// 本地存储配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    // 数据目录，SQLite 文件与日志都放在这里
    pub data_dir: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
        }
    }
}

/// # Summary
/// 查询层配置。
///
/// # Invariants
/// - `retry_base_delay_ms` <= `retry_max_delay_ms`，否则退避时长以上限为准。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    // 缓存条目的新鲜期 (毫秒)
    pub stale_time_ms: u64,
    // 首次失败后的额外重试次数
    pub retry: u32,
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            stale_time_ms: 30_000,
            retry: 2,
            retry_base_delay_ms: 1_000,
            retry_max_delay_ms: 30_000,
        }
    }
}

/// 模拟行情源配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    // 模拟网络延迟区间 (毫秒)
    pub latency_min_ms: u64,
    pub latency_max_ms: u64,
    // 随机种子，未设置时使用系统熵
    pub seed: Option<u64>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            latency_min_ms: 300,
            latency_max_ms: 500,
            seed: None,
        }
    }
}
