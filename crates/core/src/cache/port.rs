use crate::cache::error::CacheError;
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};

/// # Summary
/// 查询结果缓存的异步 KV 接口 (Port)。
///
/// # Invariants
/// - 处理原始字节，确保 Trait 是对象安全的 (Object Safe)。
/// - 不负责过期判断，新鲜度由上游查询层根据条目内的时间戳决定。
#[async_trait]
pub trait Cache: Send + Sync {
    /// # Summary
    /// 写入原始字节，同名键直接覆盖。
    ///
    /// # Arguments
    /// * `key`: 查询键。
    /// * `value`: 编码后的条目。
    async fn set_raw(&self, key: &str, value: Vec<u8>) -> Result<(), CacheError>;

    /// # Summary
    /// 读取原始字节。
    ///
    /// # Returns
    /// 存在则返回 `Some(Vec<u8>)`，否则返回 `None`。
    async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// # Summary
    /// 删除指定键，键不存在时同样返回 Ok。
    async fn del(&self, key: &str) -> Result<(), CacheError>;

    /// # Summary
    /// 列出以指定前缀开头的全部键。
    ///
    /// # Logic
    /// 1. 遍历当前全部键并做前缀匹配。
    /// 2. 空前缀匹配全部键。
    ///
    /// # Arguments
    /// * `prefix`: 键前缀，例如 `stock`。
    ///
    /// # Returns
    /// 匹配的键列表，顺序不作保证。
    async fn keys(&self, prefix: &str) -> Result<Vec<String>, CacheError>;
}

/// # Summary
/// 缓存泛型扩展接口，以 JSON 编码存取强类型条目。
///
/// # Invariants
/// - 自动为所有实现 `Cache` 的类型提供支持。
#[async_trait]
pub trait CacheExt: Cache {
    /// 序列化后写入
    async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(value).map_err(|e| CacheError::Serialize(e.to_string()))?;
        self.set_raw(key, bytes).await
    }

    /// 读取后反序列化，键不存在时返回 None
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>, CacheError> {
        match self.get_raw(key).await? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| CacheError::Deserialize(e.to_string())),
            None => Ok(None),
        }
    }
}

impl<T: Cache + ?Sized> CacheExt for T {}
