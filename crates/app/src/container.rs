use anyhow::Context;
use kabu_cache::mem::MemCache;
use kabu_core::common::Ticker;
use kabu_core::common::time::RealTimeProvider;
use kabu_core::config::AppConfig;
use kabu_core::settings::location::parse_location;
use kabu_core::store::port::LocalStore;
use kabu_feed::mock::MockStockProvider;
use kabu_manager::session::{DEFAULT_PATH, DashboardSession};
use kabu_manager::settings::SettingsManager;
use kabu_manager::watchlist::WatchlistManager;
use kabu_query::client::{QueryClient, QueryOptions};
use kabu_query::stock::StockQueries;
use kabu_store::local::SqliteLocalStore;
use kabu_store::mem::MemLocalStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// # Summary
/// 纯粹的 DI 容器。
/// 负责实例化全部具体实现并通过 `Arc<dyn Trait>` 注入到应用服务。
///
/// # Invariants
/// - 一个进程只构造一个容器，所有会话共享同一个查询缓存与自选列表。
pub struct Container {
    store: Arc<dyn LocalStore>,
    queries: StockQueries,
    watchlist: Arc<WatchlistManager>,
}

impl Container {
    /// # Summary
    /// 按配置组装基础设施与服务。
    ///
    /// # Logic
    /// 1. 设置数据根目录并打开本地存储；`ephemeral` 时使用内存存储。
    /// 2. 实例化模拟行情源与基于内存缓存的查询客户端。
    /// 3. 加载自选列表 (含旧键迁移)。
    ///
    /// # Returns
    /// 本地存储无法打开时返回错误，这是唯一的启动期致命错误。
    pub async fn build(config: &AppConfig, ephemeral: bool) -> anyhow::Result<Self> {
        kabu_store::config::set_root_dir(PathBuf::from(&config.store.data_dir));

        let store: Arc<dyn LocalStore> = if ephemeral {
            info!("using in-memory store");
            Arc::new(MemLocalStore::new())
        } else {
            let path = kabu_store::config::store_db_path();
            let store = SqliteLocalStore::new()
                .await
                .with_context(|| format!("failed to open store at {}", path.display()))?;
            info!(path = %path.display(), "local store opened");
            Arc::new(store)
        };

        let provider = Arc::new(MockStockProvider::new(&config.feed));
        let client = Arc::new(QueryClient::new(
            Arc::new(MemCache::new()),
            Arc::new(RealTimeProvider),
            QueryOptions::from(&config.query),
        ));
        let queries = StockQueries::new(client, provider);
        let watchlist = Arc::new(WatchlistManager::load(store.clone()).await);

        Ok(Self {
            store,
            queries,
            watchlist,
        })
    }

    pub fn watchlist(&self) -> &WatchlistManager {
        &self.watchlist
    }

    /// # Summary
    /// 打开一个仪表盘会话。
    ///
    /// # Logic
    /// 1. 解析地址中的证券代码与参数覆盖，非法部分被忽略。
    /// 2. 参数按 默认值 < 存储 < 地址 合并。
    /// 3. 显式给出的证券代码优先于地址中的代码。
    ///
    /// # Arguments
    /// * `location`: 可选的分享地址。
    /// * `ticker`: 可选的显式证券代码。
    pub async fn session(
        &self,
        location: Option<&str>,
        ticker: Option<Ticker>,
    ) -> DashboardSession {
        let state = location.map(parse_location).unwrap_or_default();
        let settings = Arc::new(SettingsManager::load(self.store.clone(), &state.overrides).await);
        DashboardSession::new(
            settings,
            self.watchlist.clone(),
            self.queries.clone(),
            DEFAULT_PATH,
            ticker.or(state.ticker),
        )
        .await
    }
}
