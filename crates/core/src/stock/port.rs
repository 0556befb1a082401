use crate::common::Ticker;
use crate::settings::entity::AnalysisSettings;
use crate::stock::entity::{StockDecision, StockMetrics, StockSummary};
use crate::stock::error::ProviderError;
use async_trait::async_trait;

/// # Summary
/// 股票分析数据提供者接口，任何真实行情后端都必须实现此契约才能替换模拟实现。
///
/// # Invariants
/// - 结果仅取决于 (证券代码, 分析参数)，调用方可据此缓存。
/// - 所有操作均为异步且可能失败。
#[async_trait]
pub trait StockDataProvider: Send + Sync {
    /// # Summary
    /// 获取行情概要。
    ///
    /// # Arguments
    /// * `ticker`: 证券代码。
    ///
    /// # Returns
    /// 价格快照与关键统计数据。
    async fn summary(&self, ticker: &Ticker) -> Result<StockSummary, ProviderError>;

    /// # Summary
    /// 计算投资结论。
    ///
    /// # Logic
    /// 1. 综合各维度得出 0-100 的评分。
    /// 2. 将评分映射为 Buy / Hold / Sell。
    /// 3. 给出置信度、驱动因素与说明文本。
    ///
    /// # Arguments
    /// * `ticker`: 证券代码。
    /// * `settings`: 当前分析参数。
    ///
    /// # Returns
    /// 投资结论。
    async fn decision(
        &self,
        ticker: &Ticker,
        settings: &AnalysisSettings,
    ) -> Result<StockDecision, ProviderError>;

    /// # Summary
    /// 获取六组财务指标。
    ///
    /// # Arguments
    /// * `ticker`: 证券代码。
    /// * `settings`: 当前分析参数，用于指标名称与阈值说明。
    ///
    /// # Returns
    /// 指标集合，每组至少一个指标。
    async fn metrics(
        &self,
        ticker: &Ticker,
        settings: &AnalysisSettings,
    ) -> Result<StockMetrics, ProviderError>;
}
