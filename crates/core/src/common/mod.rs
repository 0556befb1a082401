pub mod error;
pub mod time;

use error::TickerError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// # Summary
/// 证券代码值对象，代表用户选择或关注的股票。
///
/// # Invariants
/// - 内部字符串已去除首尾空白并统一为大写。
/// - 不允许为空。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ticker(String);

impl Ticker {
    /// # Summary
    /// 规范化并构造证券代码。
    ///
    /// # Logic
    /// 1. 去除首尾空白。
    /// 2. 转换为大写。
    /// 3. 为空时拒绝。
    ///
    /// # Arguments
    /// * `raw`: 用户输入的原始代码。
    ///
    /// # Returns
    /// 规范化后的 `Ticker`；为空时返回 `TickerError::Empty`。
    pub fn new(raw: &str) -> Result<Self, TickerError> {
        let normalized = raw.trim().to_uppercase();
        if normalized.is_empty() {
            return Err(TickerError::Empty(raw.to_string()));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Ticker {
    type Err = TickerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Ticker {
    type Error = TickerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Ticker> for String {
    fn from(value: Ticker) -> Self {
        value.0
    }
}

impl std::fmt::Display for Ticker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Ticker {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
