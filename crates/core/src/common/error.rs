use thiserror::Error;

/// # Summary
/// 证券代码校验错误。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TickerError {
    // 规范化后为空，附带原始输入
    #[error("Ticker must not be empty (got {0:?})")]
    Empty(String),
}
