use async_trait::async_trait;
use dashmap::DashMap;
use kabu_core::cache::error::CacheError;
use kabu_core::cache::port::Cache;
use tracing::trace;

/// # Summary
/// 基于 DashMap 的进程内查询缓存。
///
/// # Invariants
/// - 所有操作均通过并发哈希表执行，可在多个任务间共享。
/// - 不做自动过期或容量淘汰，条目的新鲜度由查询层负责判断。
#[derive(Default)]
pub struct MemCache {
    // 查询键 -> 编码后的缓存条目
    entries: DashMap<String, Vec<u8>>,
}

impl MemCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前条目数量
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 清空全部条目
    pub fn clear(&self) {
        self.entries.clear();
    }
}

#[async_trait]
impl Cache for MemCache {
    async fn set_raw(&self, key: &str, value: Vec<u8>) -> Result<(), CacheError> {
        trace!(key, bytes = value.len(), "cache write");
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    async fn del(&self, key: &str) -> Result<(), CacheError> {
        self.entries.remove(key);
        Ok(())
    }

    /// # Summary
    /// 前缀匹配列出键。
    ///
    /// # Logic
    /// 先收集快照再返回，避免调用方持有分片锁时再写入造成死锁。
    async fn keys(&self, prefix: &str) -> Result<Vec<String>, CacheError> {
        Ok(self
            .entries
            .iter()
            .filter(|e| e.key().starts_with(prefix))
            .map(|e| e.key().clone())
            .collect())
    }
}
