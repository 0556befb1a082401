use crate::error::ManagerError;
use crate::settings::SettingsManager;
use crate::watchlist::WatchlistManager;
use futures::future::{FutureExt, LocalBoxFuture, join_all};
use futures::stream::{FuturesUnordered, StreamExt};
use kabu_core::common::Ticker;
use kabu_core::query::error::QueryError;
use kabu_core::settings::entity::{AnalysisSettings, SettingsPatch};
use kabu_core::stock::entity::{StockDecision, StockMetrics, StockSummary};
use kabu_query::client::QueryClient;
use kabu_query::key::QueryKey;
use kabu_query::stock::StockQueries;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 仪表盘地址的默认路径
pub const DEFAULT_PATH: &str = "/";

/// # Summary
/// 单张卡片的数据状态，卡片的展示完全由它决定。
#[derive(Debug, Clone, PartialEq)]
pub enum CardState<T> {
    // 请求尚未完成
    Loading,
    // 请求失败，附带可展示的错误信息
    Failed(String),
    Ready(T),
    // 已过期的缓存数据，后台正在重新请求
    Refreshing(T),
}

impl<T> Default for CardState<T> {
    fn default() -> Self {
        CardState::Loading
    }
}

impl<T> CardState<T> {
    pub fn is_failed(&self) -> bool {
        matches!(self, CardState::Failed(_))
    }

    /// 可展示的数据，过期数据同样返回
    pub fn ready(&self) -> Option<&T> {
        match self {
            CardState::Ready(value) | CardState::Refreshing(value) => Some(value),
            _ => None,
        }
    }

    /// 仍在等待请求结果
    pub fn is_pending(&self) -> bool {
        matches!(self, CardState::Loading | CardState::Refreshing(_))
    }
}

impl<T> From<Result<T, QueryError>> for CardState<T> {
    fn from(result: Result<T, QueryError>) -> Self {
        match result {
            Ok(value) => CardState::Ready(value),
            Err(e) => CardState::Failed(e.to_string()),
        }
    }
}

/// # Summary
/// 仪表盘上的数据卡片。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Card {
    Snapshot,
    Decision,
    Metrics,
}

impl Card {
    pub const ALL: [Card; 3] = [Card::Snapshot, Card::Decision, Card::Metrics];

    pub fn title(&self) -> &'static str {
        match self {
            Card::Snapshot => "Snapshot",
            Card::Decision => "Decision",
            Card::Metrics => "Metrics",
        }
    }

    /// 卡片对应的查询键
    pub fn key(&self, ticker: &Ticker, settings: &AnalysisSettings) -> QueryKey {
        match self {
            Card::Snapshot => QueryKey::summary(ticker),
            Card::Decision => QueryKey::decision(ticker, settings),
            Card::Metrics => QueryKey::metrics(ticker, settings),
        }
    }
}

/// 当前证券的三张卡片
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DashboardCards {
    pub snapshot: CardState<StockSummary>,
    pub decision: CardState<StockDecision>,
    pub metrics: CardState<StockMetrics>,
}

impl DashboardCards {
    /// 仍在等待请求结果的卡片
    pub fn pending(&self) -> Vec<Card> {
        Card::ALL
            .into_iter()
            .filter(|card| match card {
                Card::Snapshot => self.snapshot.is_pending(),
                Card::Decision => self.decision.is_pending(),
                Card::Metrics => self.metrics.is_pending(),
            })
            .collect()
    }

    /// 处于失败状态的卡片
    pub fn failed(&self) -> Vec<Card> {
        Card::ALL
            .into_iter()
            .filter(|card| match card {
                Card::Snapshot => self.snapshot.is_failed(),
                Card::Decision => self.decision.is_failed(),
                Card::Metrics => self.metrics.is_failed(),
            })
            .collect()
    }
}

/// 单张卡片的请求结果
enum CardUpdate {
    Snapshot(CardState<StockSummary>),
    Decision(CardState<StockDecision>),
    Metrics(CardState<StockMetrics>),
}

impl DashboardCards {
    fn apply(&mut self, update: CardUpdate) -> Card {
        match update {
            CardUpdate::Snapshot(state) => {
                self.snapshot = state;
                Card::Snapshot
            }
            CardUpdate::Decision(state) => {
                self.decision = state;
                Card::Decision
            }
            CardUpdate::Metrics(state) => {
                self.metrics = state;
                Card::Metrics
            }
        }
    }
}

/// 由缓存构造卡片的初始状态：无数据为 Loading，过期数据为 Refreshing
async fn cached_state<T: DeserializeOwned>(client: &QueryClient, key: &QueryKey) -> CardState<T> {
    match client.peek::<T>(key).await {
        Some(value) if client.is_stale(key).await => CardState::Refreshing(value),
        Some(value) => CardState::Ready(value),
        None => CardState::Loading,
    }
}

/// 自选列表中的一行
#[derive(Debug, Clone, PartialEq)]
pub struct WatchlistRow {
    pub ticker: Ticker,
    pub summary: CardState<StockSummary>,
}

/// # Summary
/// 单个用户的仪表盘会话：当前证券、参数与地址。
///
/// # Invariants
/// - `location` 始终与当前证券及参数一致，每次变化后整体替换，不保留历史。
/// - 参数应用或重置后，全部行情查询均被标记失效。
pub struct DashboardSession {
    settings: Arc<SettingsManager>,
    watchlist: Arc<WatchlistManager>,
    queries: StockQueries,
    // 地址的路径部分
    path: String,
    ticker: Option<Ticker>,
    location: String,
}

impl DashboardSession {
    pub async fn new(
        settings: Arc<SettingsManager>,
        watchlist: Arc<WatchlistManager>,
        queries: StockQueries,
        path: &str,
        ticker: Option<Ticker>,
    ) -> Self {
        let location = settings.sync_url(path, ticker.as_ref()).await;
        Self {
            settings,
            watchlist,
            queries,
            path: path.to_string(),
            ticker,
            location,
        }
    }

    pub fn ticker(&self) -> Option<&Ticker> {
        self.ticker.as_ref()
    }

    /// 当前地址
    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn watchlist(&self) -> &WatchlistManager {
        &self.watchlist
    }

    pub async fn current_settings(&self) -> AnalysisSettings {
        self.settings.current().await
    }

    async fn sync_location(&mut self) {
        self.location = self
            .settings
            .sync_url(&self.path, self.ticker.as_ref())
            .await;
        debug!(location = %self.location, "location replaced");
    }

    /// # Summary
    /// 选择证券，输入会被规范化为大写。
    ///
    /// # Returns
    /// 空白输入返回 `ManagerError::InvalidTicker`。
    pub async fn select_ticker(&mut self, raw: &str) -> Result<Ticker, ManagerError> {
        let ticker = Ticker::new(raw)?;
        info!(%ticker, "ticker selected");
        self.ticker = Some(ticker.clone());
        self.sync_location().await;
        Ok(ticker)
    }

    /// 回到自选列表视图
    pub async fn clear_ticker(&mut self) {
        self.ticker = None;
        self.sync_location().await;
    }

    /// # Summary
    /// 应用参数修改。
    ///
    /// # Logic
    /// 1. 合并并持久化参数。
    /// 2. 将全部行情查询标记失效。
    /// 3. 重新生成地址。
    pub async fn apply_settings(&mut self, patch: &SettingsPatch) -> AnalysisSettings {
        let settings = self.settings.update(patch).await;
        self.invalidate_stock().await;
        self.sync_location().await;
        settings
    }

    /// 恢复默认参数，随后同样失效查询并同步地址
    pub async fn reset_settings(&mut self) -> AnalysisSettings {
        let settings = self.settings.reset().await;
        self.invalidate_stock().await;
        self.sync_location().await;
        settings
    }

    async fn invalidate_stock(&self) {
        if let Err(e) = self.queries.invalidate_all().await {
            warn!(error = %e, "failed to invalidate stock queries");
        }
    }

    pub async fn in_watchlist(&self) -> bool {
        match &self.ticker {
            Some(ticker) => self.watchlist.contains(ticker).await,
            None => false,
        }
    }

    /// # Summary
    /// 切换当前证券的自选状态。
    ///
    /// # Returns
    /// 操作后是否在自选列表中；未选择证券时返回 `ManagerError::NoTicker`。
    pub async fn toggle_watchlist(&self) -> Result<bool, ManagerError> {
        let ticker = self.ticker.as_ref().ok_or(ManagerError::NoTicker)?;
        Ok(self.watchlist.toggle(ticker).await)
    }

    /// # Summary
    /// 请求开始前即可展示的卡片状态。
    ///
    /// # Logic
    /// 从未请求过的卡片为 Loading；缓存已过期的卡片为 Refreshing，携带旧数据。
    ///
    /// # Returns
    /// 未选择证券时返回 `ManagerError::NoTicker`。
    pub async fn cached_cards(&self) -> Result<DashboardCards, ManagerError> {
        let ticker = self.ticker.as_ref().ok_or(ManagerError::NoTicker)?;
        let settings = self.settings.current().await;
        let client = self.queries.client();
        Ok(DashboardCards {
            snapshot: cached_state(client, &Card::Snapshot.key(ticker, &settings)).await,
            decision: cached_state(client, &Card::Decision.key(ticker, &settings)).await,
            metrics: cached_state(client, &Card::Metrics.key(ticker, &settings)).await,
        })
    }

    /// # Summary
    /// 并发请求三张卡片，每张完成后立即回调。
    ///
    /// # Logic
    /// 1. 三个请求同时发出，按完成先后写回 `cards`。
    /// 2. 每写回一张卡片调用一次 `on_update`，慢卡片不阻塞其它卡片的展示。
    ///
    /// # Arguments
    /// * `cards`: 当前展示的卡片，通常来自 `cached_cards`。
    /// * `on_update`: 接收刚完成的卡片与最新的整体状态。
    pub async fn refresh_cards<F>(
        &self,
        cards: &mut DashboardCards,
        mut on_update: F,
    ) -> Result<(), ManagerError>
    where
        F: FnMut(Card, &DashboardCards),
    {
        let ticker = self.ticker.as_ref().ok_or(ManagerError::NoTicker)?;
        let settings = self.settings.current().await;
        let settings = &settings;
        let queries = &self.queries;

        let mut pending: FuturesUnordered<LocalBoxFuture<'_, CardUpdate>> = FuturesUnordered::new();
        pending.push(
            async move { CardUpdate::Snapshot(queries.summary(ticker).await.into()) }.boxed_local(),
        );
        pending.push(
            async move { CardUpdate::Decision(queries.decision(ticker, settings).await.into()) }
                .boxed_local(),
        );
        pending.push(
            async move { CardUpdate::Metrics(queries.metrics(ticker, settings).await.into()) }
                .boxed_local(),
        );

        while let Some(update) = pending.next().await {
            let card = cards.apply(update);
            debug!(card = card.title(), "card resolved");
            on_update(card, cards);
        }
        Ok(())
    }

    /// # Summary
    /// 加载当前证券的三张卡片，全部完成后返回。
    ///
    /// # Returns
    /// 每张卡片独立成功或失败；未选择证券时返回 `ManagerError::NoTicker`。
    pub async fn load_cards(&self) -> Result<DashboardCards, ManagerError> {
        let mut cards = self.cached_cards().await?;
        self.refresh_cards(&mut cards, |_, _| {}).await?;
        Ok(cards)
    }

    /// # Summary
    /// 手动重试单张卡片。
    ///
    /// # Logic
    /// 1. 将该卡片的查询标记失效，失效失败只记录日志。
    /// 2. 重新请求并更新卡片状态。
    pub async fn retry(&self, card: Card, cards: &mut DashboardCards) -> Result<(), ManagerError> {
        let ticker = self.ticker.as_ref().ok_or(ManagerError::NoTicker)?;
        let settings = self.settings.current().await;
        if let Err(e) = self.queries.invalidate(&card.key(ticker, &settings)).await {
            warn!(card = card.title(), error = %e, "failed to invalidate card query");
        }
        info!(card = card.title(), %ticker, "retrying card");
        match card {
            Card::Snapshot => cards.snapshot = self.queries.summary(ticker).await.into(),
            Card::Decision => {
                cards.decision = self.queries.decision(ticker, &settings).await.into();
            }
            Card::Metrics => cards.metrics = self.queries.metrics(ticker, &settings).await.into(),
        }
        Ok(())
    }

    /// 自选列表每行的行情概要，单行失败不影响其它行
    pub async fn watchlist_rows(&self) -> Vec<WatchlistRow> {
        let tickers = self.watchlist.list().await;
        join_all(tickers.into_iter().map(|ticker| async move {
            let summary = self.queries.summary(&ticker).await.into();
            WatchlistRow { ticker, summary }
        }))
        .await
    }
}
