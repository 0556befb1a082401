use kabu_core::common::error::TickerError;
use kabu_core::query::error::QueryError;
use kabu_core::settings::error::SettingsError;
use thiserror::Error;

/// # Summary
/// Manager 层的统一错误类型。
///
/// # Invariants
/// - 不包含存储错误：存储失败只记录日志，不向用户传播。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ManagerError {
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),
    #[error("Query error: {0}")]
    Query(#[from] QueryError),
    // 需要当前证券代码的操作在未选择代码时调用
    #[error("No ticker selected")]
    NoTicker,
    #[error("Invalid ticker: {0}")]
    InvalidTicker(#[from] TickerError),
}
