use thiserror::Error;

/// # Summary
/// 行情数据提供者错误枚举，处理网络、解析及数据缺失等问题。
///
/// # Invariants
/// - 必须通过 `thiserror` 派生 `Error` trait。
/// - 可克隆，以便合并后的并发请求共享同一失败结果。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    // 网络层错误
    #[error("Network error: {0}")]
    Network(String),
    // 数据解析错误
    #[error("Parse error: {0}")]
    Parse(String),
    // 请求的证券不存在
    #[error("Ticker not found: {0}")]
    NotFound(String),
    // 未知或未分类的错误
    #[error("Unknown error: {0}")]
    Unknown(String),
}
