use thiserror::Error;

/// # Summary
/// 本地存储错误枚举，处理数据库连接、读写失败等问题。
///
/// # Invariants
/// - 必须通过 `thiserror` 派生 `Error` trait。
/// - 上层服务只记录日志，不会把此错误传播给用户。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// 数据库操作失败
    #[error("Database error: {0}")]
    Database(String),
    /// 存储被拒绝写入 (例如配额耗尽)
    #[error("Write rejected: {0}")]
    Rejected(String),
    /// 初始化存储失败
    #[error("Initialization error: {0}")]
    InitError(String),
}
