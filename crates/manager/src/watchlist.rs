use kabu_core::common::Ticker;
use kabu_core::store::error::StoreError;
use kabu_core::store::port::{LEGACY_BOOKMARKS_KEY, LocalStore, WATCHLIST_KEY};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// # Summary
/// 自选股服务，通过依赖注入传递给需要它的组件。
///
/// # Invariants
/// - 列表中的代码唯一、大写，并保持加入顺序。
/// - 每次修改后立即持久化；修改在互斥锁内串行执行，持久化顺序与内存顺序一致。
/// - 存储失败只记录日志，内存状态照常更新。
pub struct WatchlistManager {
    // 本地存储接口
    store: Arc<dyn LocalStore>,
    // 有序的自选代码
    items: Mutex<Vec<Ticker>>,
}

impl WatchlistManager {
    /// # Summary
    /// 从存储加载自选列表，必要时迁移旧版书签。
    ///
    /// # Logic
    /// 1. 当前键存在且为 JSON 数组时，取其中的字符串元素。
    /// 2. 否则读取旧版书签键；若为数组，将字符串元素写入当前键并删除旧键。
    /// 3. 加载的代码经规范化与去重，其它情况返回空列表。
    pub async fn load(store: Arc<dyn LocalStore>) -> Self {
        let items = match read_list(store.as_ref(), WATCHLIST_KEY).await {
            Some(items) => items,
            None => migrate_legacy(store.as_ref()).await.unwrap_or_default(),
        };
        debug!(count = items.len(), "watchlist loaded");
        Self {
            store,
            items: Mutex::new(items),
        }
    }

    /// 当前列表的快照
    pub async fn list(&self) -> Vec<Ticker> {
        self.items.lock().await.clone()
    }

    pub async fn contains(&self, ticker: &Ticker) -> bool {
        self.items.lock().await.contains(ticker)
    }

    /// # Summary
    /// 加入自选，已存在时不做任何事。
    ///
    /// # Returns
    /// 本次是否新加入。
    pub async fn add(&self, ticker: &Ticker) -> bool {
        let mut items = self.items.lock().await;
        if items.contains(ticker) {
            return false;
        }
        items.push(ticker.clone());
        self.persist(&items).await;
        info!(%ticker, "added to watchlist");
        true
    }

    /// # Summary
    /// 移除所有匹配项并持久化，即使没有匹配项也会写入。
    ///
    /// # Returns
    /// 本次是否移除了条目。
    pub async fn remove(&self, ticker: &Ticker) -> bool {
        let mut items = self.items.lock().await;
        let before = items.len();
        items.retain(|t| t != ticker);
        self.persist(&items).await;
        let removed = items.len() != before;
        if removed {
            info!(%ticker, "removed from watchlist");
        }
        removed
    }

    /// # Summary
    /// 不存在则加入，存在则移除。
    ///
    /// # Returns
    /// 操作后是否在自选列表中。
    pub async fn toggle(&self, ticker: &Ticker) -> bool {
        let mut items = self.items.lock().await;
        let now_present = if items.contains(ticker) {
            items.retain(|t| t != ticker);
            false
        } else {
            items.push(ticker.clone());
            true
        };
        self.persist(&items).await;
        info!(%ticker, now_present, "watchlist toggled");
        now_present
    }

    async fn persist(&self, items: &[Ticker]) {
        if let Err(e) = write_list(self.store.as_ref(), WATCHLIST_KEY, items).await {
            warn!(error = %e, "failed to save watchlist to storage");
        }
    }
}

/// 读取字符串数组，非字符串及非法代码被丢弃；键缺失或非数组时返回 None
async fn read_list(store: &dyn LocalStore, key: &str) -> Option<Vec<Ticker>> {
    let raw = match store.get_item(key).await {
        Ok(raw) => raw?,
        Err(e) => {
            warn!(key, error = %e, "failed to load watchlist from storage");
            return None;
        }
    };
    let Ok(Value::Array(entries)) = serde_json::from_str::<Value>(&raw) else {
        warn!(key, "stored watchlist is not a JSON array, ignoring");
        return None;
    };
    let mut items: Vec<Ticker> = Vec::with_capacity(entries.len());
    for ticker in entries
        .iter()
        .filter_map(Value::as_str)
        .filter_map(|s| Ticker::new(s).ok())
    {
        if !items.contains(&ticker) {
            items.push(ticker);
        }
    }
    Some(items)
}

async fn write_list(
    store: &dyn LocalStore,
    key: &str,
    items: &[Ticker],
) -> Result<(), StoreError> {
    let symbols: Vec<&str> = items.iter().map(Ticker::as_str).collect();
    let json = serde_json::to_string(&symbols)
        .map_err(|e| StoreError::Rejected(e.to_string()))?;
    store.set_item(key, &json).await
}

/// 将旧版书签迁移到当前键，旧键不存在或不是数组时返回 None
async fn migrate_legacy(store: &dyn LocalStore) -> Option<Vec<Ticker>> {
    let items = read_list(store, LEGACY_BOOKMARKS_KEY).await?;
    // 新键写入失败时保留旧键，下次启动重新迁移
    if let Err(e) = write_list(store, WATCHLIST_KEY, &items).await {
        warn!(error = %e, "failed to write migrated watchlist, keeping legacy bookmarks");
        return Some(items);
    }
    if let Err(e) = store.remove_item(LEGACY_BOOKMARKS_KEY).await {
        warn!(error = %e, "failed to remove legacy bookmarks");
    }
    info!(count = items.len(), "migrated legacy bookmarks to watchlist");
    Some(items)
}
