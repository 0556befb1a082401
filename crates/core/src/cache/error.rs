use thiserror::Error;

/// # Summary
/// 查询缓存错误枚举，处理条目的编解码及底层存储故障。
///
/// # Invariants
/// - 必须通过 `thiserror` 派生 `Error` trait。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    // 条目序列化失败
    #[error("Serialize error: {0}")]
    Serialize(String),
    // 条目反序列化失败
    #[error("Deserialize error: {0}")]
    Deserialize(String),
    // 底层存储引擎故障
    #[error("Storage error: {0}")]
    Storage(String),
}
