use crate::cache::error::CacheError;
use crate::stock::error::ProviderError;
use thiserror::Error;

/// # Summary
/// 查询层错误，同一请求的所有等待者共享同一个错误值。
///
/// # Invariants
/// - 必须实现 `Clone`，因为进行中的请求会被多个调用方共同等待。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    // 数据源在重试耗尽后仍然失败
    #[error("Provider error after {attempts} attempt(s): {source}")]
    Provider {
        attempts: u32,
        source: ProviderError,
    },
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
    // 结果编解码失败
    #[error("Codec error: {0}")]
    Codec(String),
}

impl QueryError {
    /// 返回底层数据源错误 (若有)
    pub fn provider_error(&self) -> Option<&ProviderError> {
        match self {
            QueryError::Provider { source, .. } => Some(source),
            _ => None,
        }
    }
}
