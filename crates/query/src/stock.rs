use crate::client::QueryClient;
use crate::key::{QueryFilter, QueryKey, STOCK_ROOT};
use kabu_core::common::Ticker;
use kabu_core::query::error::QueryError;
use kabu_core::settings::entity::AnalysisSettings;
use kabu_core::stock::entity::{StockDecision, StockMetrics, StockSummary};
use kabu_core::stock::port::StockDataProvider;
use std::sync::Arc;

/// # Summary
/// 行情数据的强类型查询入口，将数据源调用接入查询客户端。
///
/// # Invariants
/// - 概要查询只按代码缓存；结论与指标按 (代码, 参数) 缓存。
#[derive(Clone)]
pub struct StockQueries {
    client: Arc<QueryClient>,
    provider: Arc<dyn StockDataProvider>,
}

impl StockQueries {
    pub fn new(client: Arc<QueryClient>, provider: Arc<dyn StockDataProvider>) -> Self {
        Self { client, provider }
    }

    pub fn client(&self) -> &QueryClient {
        &self.client
    }

    pub async fn summary(&self, ticker: &Ticker) -> Result<StockSummary, QueryError> {
        let provider = self.provider.clone();
        let ticker = ticker.clone();
        let key = QueryKey::summary(&ticker);
        self.client
            .fetch(&key, move || {
                let provider = provider.clone();
                let ticker = ticker.clone();
                async move { provider.summary(&ticker).await }
            })
            .await
    }

    pub async fn decision(
        &self,
        ticker: &Ticker,
        settings: &AnalysisSettings,
    ) -> Result<StockDecision, QueryError> {
        let provider = self.provider.clone();
        let ticker = ticker.clone();
        let settings = *settings;
        let key = QueryKey::decision(&ticker, &settings);
        self.client
            .fetch(&key, move || {
                let provider = provider.clone();
                let ticker = ticker.clone();
                async move { provider.decision(&ticker, &settings).await }
            })
            .await
    }

    pub async fn metrics(
        &self,
        ticker: &Ticker,
        settings: &AnalysisSettings,
    ) -> Result<StockMetrics, QueryError> {
        let provider = self.provider.clone();
        let ticker = ticker.clone();
        let settings = *settings;
        let key = QueryKey::metrics(&ticker, &settings);
        self.client
            .fetch(&key, move || {
                let provider = provider.clone();
                let ticker = ticker.clone();
                async move { provider.metrics(&ticker, &settings).await }
            })
            .await
    }

    /// 使全部行情查询失效，参数应用或重置后调用
    pub async fn invalidate_all(&self) -> Result<usize, QueryError> {
        self.client.invalidate(&QueryFilter::root(STOCK_ROOT)).await
    }

    /// 使单个查询失效，手动重试某张卡片时调用
    pub async fn invalidate(&self, key: &QueryKey) -> Result<usize, QueryError> {
        self.client.invalidate(&QueryFilter::from(key)).await
    }
}
