use super::error::StoreError;
use async_trait::async_trait;

/// 分析参数快照的存储键
pub const SETTINGS_KEY: &str = "stock-analysis-settings";
/// 自选股列表的存储键
pub const WATCHLIST_KEY: &str = "stock-analysis-watchlist";
/// 旧版书签列表的存储键，加载时迁移后删除
pub const LEGACY_BOOKMARKS_KEY: &str = "stock-analysis-bookmarks";

/// # Summary
/// 本地键值存储接口，对应浏览器 localStorage 的语义。
///
/// # Invariants
/// - 值为任意文本 (通常为 JSON)。
/// - 写入后立即可读，多次写入以最后一次为准。
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// # Summary
    /// 读取键对应的文本。
    ///
    /// # Returns
    /// 存在返回 `Some(String)`，否则返回 `None`。
    async fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// # Summary
    /// 写入或覆盖键对应的文本。
    async fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// # Summary
    /// 删除键，键不存在时同样返回 Ok。
    async fn remove_item(&self, key: &str) -> Result<(), StoreError>;
}
