use async_trait::async_trait;
use dashmap::DashMap;
use kabu_core::store::error::StoreError;
use kabu_core::store::port::LocalStore;
use std::sync::atomic::{AtomicBool, Ordering};

/// # Summary
/// 基于 DashMap 的内存本地存储，用于测试与 `--ephemeral` 临时会话。
///
/// # Invariants
/// - 进程退出后数据即丢失。
/// - `fail_writes` 开启后所有写入与删除均返回 `StoreError::Rejected`。
#[derive(Default)]
pub struct MemLocalStore {
    items: DashMap<String, String>,
    fail_writes: AtomicBool,
}

impl MemLocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 使用初始键值对构造
    pub fn with_items<K: Into<String>, V: Into<String>>(
        items: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        let store = Self::default();
        for (k, v) in items {
            store.items.insert(k.into(), v.into());
        }
        store
    }

    /// 模拟写入失败 (例如存储配额耗尽)
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// 同步读取，便于断言
    pub fn peek(&self, key: &str) -> Option<String> {
        self.items.get(key).map(|v| v.value().clone())
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Rejected("quota exceeded".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl LocalStore for MemLocalStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.peek(key))
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.check_writable()?;
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        self.check_writable()?;
        self.items.remove(key);
        Ok(())
    }
}
