use crate::key::{QueryFilter, QueryKey};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::future::{BoxFuture, FutureExt, Shared};
use kabu_cache::mem::MemCache;
use kabu_core::cache::port::{Cache, CacheExt};
use kabu_core::common::time::{RealTimeProvider, TimeProvider};
use kabu_core::config::QueryConfig;
use kabu_core::query::error::QueryError;
use kabu_core::stock::error::ProviderError;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::future::Future;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// # Summary
/// 查询层的运行参数。
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOptions {
    // 条目在此时长内视为新鲜，直接返回而不请求数据源
    pub stale_time: Duration,
    // 首次失败后的额外重试次数
    pub retry: u32,
    pub retry_base_delay: Duration,
    pub retry_max_delay: Duration,
}

impl QueryOptions {
    /// # Summary
    /// 第 `attempt` 次重试前的等待时长 (从 0 开始计数)。
    ///
    /// # Logic
    /// 基础时长 × 2^attempt，上限为 `retry_max_delay`。
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.retry_base_delay
            .saturating_mul(factor)
            .min(self.retry_max_delay)
    }
}

impl From<&QueryConfig> for QueryOptions {
    fn from(config: &QueryConfig) -> Self {
        Self {
            stale_time: Duration::from_millis(config.stale_time_ms),
            retry: config.retry,
            retry_base_delay: Duration::from_millis(config.retry_base_delay_ms),
            retry_max_delay: Duration::from_millis(config.retry_max_delay_ms),
        }
    }
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self::from(&QueryConfig::default())
    }
}

/// 缓存中保存的条目
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CachedEntry {
    data: Value,
    fetched_at: DateTime<Utc>,
    // 被显式失效后，下一次读取必须重新请求
    #[serde(default)]
    invalidated: bool,
}

type SharedFetch = Shared<BoxFuture<'static, Result<Arc<Value>, QueryError>>>;

/// 进行中的请求
struct InFlight {
    task: SharedFetch,
    // 请求期间被失效，写入缓存时条目直接标记为失效
    invalidated: Arc<AtomicBool>,
}

/// # Summary
/// 带缓存、新鲜期、重试与并发合并的查询客户端。
///
/// # Invariants
/// - 同一键同一时刻至多存在一个进行中的请求，其余调用方等待同一结果。
/// - 请求失败时保留旧条目，`peek` 仍可读到过期数据。
/// - 不支持取消：被替代的请求照常完成并写入缓存。
/// - 请求期间发生的失效不会丢失：写入的条目带有失效标记，下一次读取重新请求。
pub struct QueryClient {
    // 条目存储
    cache: Arc<dyn Cache>,
    // 新鲜度判断使用的时钟
    clock: Arc<dyn TimeProvider>,
    options: QueryOptions,
    // 进行中的请求，Key 为查询键的字符串形式
    in_flight: DashMap<String, InFlight>,
}

impl QueryClient {
    pub fn new(cache: Arc<dyn Cache>, clock: Arc<dyn TimeProvider>, options: QueryOptions) -> Self {
        Self {
            cache,
            clock,
            options,
            in_flight: DashMap::new(),
        }
    }

    /// 使用进程内缓存与系统时钟
    pub fn in_memory(options: QueryOptions) -> Self {
        Self::new(Arc::new(MemCache::new()), Arc::new(RealTimeProvider), options)
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    async fn read_entry(&self, hash: &str) -> Option<CachedEntry> {
        match self.cache.get::<CachedEntry>(hash).await {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key = hash, error = %e, "discarding unreadable cache entry");
                None
            }
        }
    }

    fn is_fresh(&self, entry: &CachedEntry) -> bool {
        if entry.invalidated {
            return false;
        }
        match self
            .clock
            .now()
            .signed_duration_since(entry.fetched_at)
            .to_std()
        {
            Ok(age) => age < self.options.stale_time,
            // 时钟回拨，条目时间在未来
            Err(_) => true,
        }
    }

    /// # Summary
    /// 读取缓存中的数据，不论是否过期，也不触发请求。
    ///
    /// # Returns
    /// 从未成功请求过或条目无法解码时返回 None。
    pub async fn peek<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
        let entry = self.read_entry(&key.hash_key()).await?;
        decode(&entry.data).ok()
    }

    /// 条目缺失、过期或已失效时返回 true
    pub async fn is_stale(&self, key: &QueryKey) -> bool {
        self.read_entry(&key.hash_key())
            .await
            .is_none_or(|entry| !self.is_fresh(&entry))
    }

    /// # Summary
    /// 获取查询结果。
    ///
    /// # Logic
    /// 1. 缓存中存在新鲜条目时直接返回。
    /// 2. 否则加入该键进行中的请求，若不存在则发起新请求。
    /// 3. 请求按配置重试，成功后写入缓存。
    /// 4. 请求结束后从进行中表移除。
    ///
    /// # Arguments
    /// * `key`: 查询键。
    /// * `fetcher`: 每次尝试调用一次，生成请求数据源的 Future。
    ///
    /// # Returns
    /// 查询结果，或重试耗尽后的最后一个错误。
    pub async fn fetch<T, F, Fut>(&self, key: &QueryKey, fetcher: F) -> Result<T, QueryError>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ProviderError>> + Send + 'static,
    {
        let hash = key.hash_key();
        if let Some(entry) = self.read_entry(&hash).await
            && self.is_fresh(&entry)
        {
            match decode(&entry.data) {
                Ok(value) => {
                    debug!(key = %hash, "cache hit");
                    return Ok(value);
                }
                Err(e) => warn!(key = %hash, error = %e, "cached entry has wrong shape, refetching"),
            }
        }

        let pending = self.join_or_start(&hash, fetcher);
        let result = pending.await;
        self.in_flight
            .remove_if(&hash, |_, pending| pending.task.peek().is_some());
        let data = result?;
        decode(data.as_ref())
    }

    fn join_or_start<T, F, Fut>(&self, hash: &str, fetcher: F) -> SharedFetch
    where
        T: Serialize + Send + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ProviderError>> + Send + 'static,
    {
        match self.in_flight.entry(hash.to_string()) {
            Entry::Occupied(existing) => {
                debug!(key = hash, "joining in-flight request");
                existing.get().task.clone()
            }
            Entry::Vacant(slot) => {
                debug!(key = hash, "starting request");
                let invalidated = Arc::new(AtomicBool::new(false));
                let task = run_with_retry(
                    self.cache.clone(),
                    self.clock.clone(),
                    self.options.clone(),
                    hash.to_string(),
                    invalidated.clone(),
                    fetcher,
                )
                .boxed()
                .shared();
                slot.insert(InFlight {
                    task: task.clone(),
                    invalidated,
                });
                task
            }
        }
    }

    /// # Summary
    /// 将匹配的条目标记为失效，下一次 `fetch` 必然重新请求。
    ///
    /// # Logic
    /// 1. 先标记匹配的进行中请求，其结果写入缓存时即为失效状态。
    /// 2. 以过滤器前缀列出候选键并按段精确过滤。
    /// 3. 逐个将尚未失效的条目标记为失效并写回，数据保留供 `peek` 使用。
    ///
    /// # Returns
    /// 本次新标记的键数量，同一键只计一次。
    pub async fn invalidate(&self, filter: &QueryFilter) -> Result<usize, QueryError> {
        let mut marked = BTreeSet::new();
        for pending in self.in_flight.iter() {
            if filter.matches(pending.key())
                && !pending.invalidated.swap(true, Ordering::SeqCst)
            {
                marked.insert(pending.key().clone());
            }
        }

        let keys = self.cache.keys(&filter.stem()).await?;
        for key in keys.into_iter().filter(|k| filter.matches(k)) {
            if let Some(mut entry) = self.read_entry(&key).await
                && !entry.invalidated
            {
                entry.invalidated = true;
                self.cache.set(&key, &entry).await?;
                marked.insert(key);
            }
        }
        let count = marked.len();
        info!(count, "queries invalidated");
        Ok(count)
    }
}

fn decode<T: DeserializeOwned>(value: &Value) -> Result<T, QueryError> {
    T::deserialize(value).map_err(|e| QueryError::Codec(e.to_string()))
}

/// # Summary
/// 执行一次带重试的请求并写入缓存。
///
/// # Logic
/// 1. 失败且仍有重试次数时，按指数退避等待后重试。
/// 2. 成功后编码为 JSON，连同当前时间写入缓存；写入失败只记录日志。
/// 3. 请求期间已被失效时，条目以失效状态写入。
async fn run_with_retry<T, F, Fut>(
    cache: Arc<dyn Cache>,
    clock: Arc<dyn TimeProvider>,
    options: QueryOptions,
    hash: String,
    invalidated: Arc<AtomicBool>,
    fetcher: F,
) -> Result<Arc<Value>, QueryError>
where
    T: Serialize + Send + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, ProviderError>> + Send + 'static,
{
    let mut attempt: u32 = 0;
    let fetched = loop {
        match fetcher().await {
            Ok(value) => break value,
            Err(e) if attempt < options.retry => {
                let delay = options.retry_delay(attempt);
                warn!(key = %hash, attempt = attempt + 1, ?delay, error = %e, "request failed, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                error!(key = %hash, attempts = attempt + 1, error = %e, "request failed");
                return Err(QueryError::Provider {
                    attempts: attempt + 1,
                    source: e,
                });
            }
        }
    };

    let mut entry = CachedEntry {
        data: serde_json::to_value(&fetched).map_err(|e| QueryError::Codec(e.to_string()))?,
        fetched_at: clock.now(),
        invalidated: invalidated.load(Ordering::SeqCst),
    };
    if let Err(e) = cache.set(&hash, &entry).await {
        warn!(key = %hash, error = %e, "failed to cache query result");
    }
    // 失效可能发生在读取标记与写入缓存之间
    if !entry.invalidated && invalidated.load(Ordering::SeqCst) {
        entry.invalidated = true;
        if let Err(e) = cache.set(&hash, &entry).await {
            warn!(key = %hash, error = %e, "failed to mark cached result stale");
        }
    }
    if entry.invalidated {
        debug!(key = %hash, "invalidated while in flight, cached as stale");
    }
    Ok(Arc::new(entry.data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_delay_is_exponential_and_capped() {
        let options = QueryOptions::default();
        assert_eq!(options.retry_delay(0), Duration::from_secs(1));
        assert_eq!(options.retry_delay(1), Duration::from_secs(2));
        assert_eq!(options.retry_delay(2), Duration::from_secs(4));
        assert_eq!(options.retry_delay(4), Duration::from_secs(16));
        assert_eq!(options.retry_delay(5), Duration::from_secs(30));
        assert_eq!(options.retry_delay(40), Duration::from_secs(30));
    }

    #[test]
    fn test_options_from_config() {
        let options = QueryOptions::from(&QueryConfig {
            stale_time_ms: 0,
            retry: 5,
            retry_base_delay_ms: 10,
            retry_max_delay_ms: 50,
        });
        assert_eq!(options.stale_time, Duration::ZERO);
        assert_eq!(options.retry, 5);
        assert_eq!(options.retry_delay(3), Duration::from_millis(50));
    }
}
