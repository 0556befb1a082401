use kabu_core::common::Ticker;
use kabu_core::settings::entity::AnalysisSettings;
use serde_json::Value;

/// 所有行情类查询共享的根，按此前缀失效即可覆盖全部实体
pub const STOCK_ROOT: &str = "stock";

/// # Summary
/// 查询的实体类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Summary,
    Decision,
    Metrics,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Summary => "summary",
            EntityKind::Decision => "decision",
            EntityKind::Metrics => "metrics",
        }
    }
}

/// # Summary
/// 复合查询键：(实体类型, 证券代码, 参数)。
///
/// # Invariants
/// - 概要查询不携带参数，参数变化不会使其缓存失效。
/// - 参数按值参与比较，两份取值相同的参数映射到同一键。
#[derive(Debug, Clone, PartialEq)]
pub struct QueryKey {
    kind: EntityKind,
    ticker: Ticker,
    settings: Option<AnalysisSettings>,
}

impl QueryKey {
    pub fn summary(ticker: &Ticker) -> Self {
        Self {
            kind: EntityKind::Summary,
            ticker: ticker.clone(),
            settings: None,
        }
    }

    pub fn decision(ticker: &Ticker, settings: &AnalysisSettings) -> Self {
        Self {
            kind: EntityKind::Decision,
            ticker: ticker.clone(),
            settings: Some(*settings),
        }
    }

    pub fn metrics(ticker: &Ticker, settings: &AnalysisSettings) -> Self {
        Self {
            kind: EntityKind::Metrics,
            ticker: ticker.clone(),
            settings: Some(*settings),
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    /// 键的各段：根、实体类型、代码，以及可选的参数对象
    fn parts(&self) -> Vec<Value> {
        let mut parts = vec![
            Value::from(STOCK_ROOT),
            Value::from(self.kind.as_str()),
            Value::from(self.ticker.as_str()),
        ];
        if let Some(settings) = &self.settings {
            parts.push(serde_json::to_value(settings).unwrap_or(Value::Null));
        }
        parts
    }

    /// # Summary
    /// 键的稳定字符串形式，作为缓存中的存储键。
    ///
    /// # Logic
    /// 将各段编码为 JSON 数组，例如 `["stock","summary","AAPL"]`。
    pub fn hash_key(&self) -> String {
        encode_parts(&self.parts())
    }
}

impl std::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.hash_key())
    }
}

fn encode_parts(parts: &[Value]) -> String {
    Value::Array(parts.to_vec()).to_string()
}

/// # Summary
/// 按键前缀匹配一组查询，用于批量失效。
///
/// # Invariants
/// - 按完整的段匹配：`["stock"]` 匹配 `["stock", ...]`，不会匹配 `["stocks", ...]`。
/// - 空过滤器匹配全部键。
#[derive(Debug, Clone, PartialEq)]
pub struct QueryFilter {
    parts: Vec<Value>,
}

impl QueryFilter {
    /// 匹配全部键
    pub fn all() -> Self {
        Self { parts: Vec::new() }
    }

    /// 匹配指定根下的全部键，例如 `QueryFilter::root(STOCK_ROOT)`
    pub fn root(root: &str) -> Self {
        Self {
            parts: vec![Value::from(root)],
        }
    }

    /// 匹配某一实体类型的全部键
    pub fn kind(kind: EntityKind) -> Self {
        Self {
            parts: vec![Value::from(STOCK_ROOT), Value::from(kind.as_str())],
        }
    }

    /// 用于在存储键上做初筛的字符串前缀
    pub(crate) fn stem(&self) -> String {
        let encoded = encode_parts(&self.parts);
        encoded
            .strip_suffix(']')
            .map(str::to_string)
            .unwrap_or(encoded)
    }

    /// # Summary
    /// 判断存储键是否落在过滤器范围内。
    ///
    /// # Logic
    /// 1. 空过滤器总是匹配。
    /// 2. 否则要求存储键等于完整编码，或以 "编码去掉 `]` 后加 `,`" 开头。
    pub fn matches(&self, hash_key: &str) -> bool {
        if self.parts.is_empty() {
            return true;
        }
        let stem = self.stem();
        hash_key
            .strip_prefix(stem.as_str())
            .is_some_and(|rest| rest == "]" || rest.starts_with(','))
    }
}

impl From<&QueryKey> for QueryFilter {
    fn from(key: &QueryKey) -> Self {
        Self { parts: key.parts() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kabu_core::settings::entity::OutlookPreset;

    fn aapl() -> Ticker {
        Ticker::new("aapl").unwrap()
    }

    #[test]
    fn test_summary_key_ignores_settings() {
        let key = QueryKey::summary(&aapl());
        assert_eq!(key.hash_key(), r#"["stock","summary","AAPL"]"#);
    }

    #[test]
    fn test_settings_compared_by_value() {
        let a = AnalysisSettings::default();
        let b = AnalysisSettings::default();
        assert_eq!(
            QueryKey::decision(&aapl(), &a).hash_key(),
            QueryKey::decision(&aapl(), &b).hash_key()
        );

        let optimistic = AnalysisSettings {
            preset: OutlookPreset::Optimistic,
            ..AnalysisSettings::default()
        };
        assert_ne!(
            QueryKey::decision(&aapl(), &a).hash_key(),
            QueryKey::decision(&aapl(), &optimistic).hash_key()
        );
    }

    #[test]
    fn test_filter_matches_whole_segments() {
        let settings = AnalysisSettings::default();
        let root = QueryFilter::root(STOCK_ROOT);
        assert!(root.matches(&QueryKey::summary(&aapl()).hash_key()));
        assert!(root.matches(&QueryKey::metrics(&aapl(), &settings).hash_key()));
        assert!(!root.matches(r#"["stocks","summary","AAPL"]"#));
        assert!(root.matches(r#"["stock"]"#));

        let metrics_only = QueryFilter::kind(EntityKind::Metrics);
        assert!(metrics_only.matches(&QueryKey::metrics(&aapl(), &settings).hash_key()));
        assert!(!metrics_only.matches(&QueryKey::summary(&aapl()).hash_key()));

        let exact = QueryFilter::from(&QueryKey::summary(&aapl()));
        assert!(exact.matches(&QueryKey::summary(&aapl()).hash_key()));
        let msft = Ticker::new("MSFT").unwrap();
        assert!(!exact.matches(&QueryKey::summary(&msft).hash_key()));

        assert!(QueryFilter::all().matches("anything"));
    }
}
