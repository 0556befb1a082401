use async_trait::async_trait;
use kabu_core::common::Ticker;
use kabu_core::settings::entity::{
    AnalysisSettings, Benchmark, LookbackWindow, OutlookPreset, SettingsPatch, SharpeWindow,
};
use kabu_core::settings::location::parse_location;
use kabu_core::store::error::StoreError;
use kabu_core::store::port::{LocalStore, SETTINGS_KEY};
use kabu_manager::settings::SettingsManager;
use kabu_store::mem::MemLocalStore;
use serde_json::Value;
use std::sync::Arc;

/// 所有操作都失败的存储
struct BrokenStore;

#[async_trait]
impl LocalStore for BrokenStore {
    async fn get_item(&self, _: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Database("disk I/O error".to_string()))
    }

    async fn set_item(&self, _: &str, _: &str) -> Result<(), StoreError> {
        Err(StoreError::Database("disk I/O error".to_string()))
    }

    async fn remove_item(&self, _: &str) -> Result<(), StoreError> {
        Err(StoreError::Database("disk I/O error".to_string()))
    }
}

fn stored(store: &MemLocalStore) -> Value {
    serde_json::from_str(&store.peek(SETTINGS_KEY).unwrap()).unwrap()
}

#[tokio::test]
async fn test_load_layers_store_then_url() {
    let store = Arc::new(MemLocalStore::with_items([(
        SETTINGS_KEY,
        r#"{"preset":"optimistic","betaBenchmark":"QQQ","sharpeWindow":"999","riskFreeRate":"abc"}"#,
    )]));
    let url = parse_location("/?betaBenchmark=IWM&peWindow=5y");
    let manager = SettingsManager::load(store.clone(), &url.overrides).await;

    let current = manager.current().await;
    assert_eq!(current.preset, OutlookPreset::Optimistic);
    assert_eq!(current.beta_benchmark, Benchmark::Iwm);
    assert_eq!(current.pe_window, LookbackWindow::FiveYears);
    // 非法值回落到默认值
    assert_eq!(current.sharpe_window, SharpeWindow::Days252);
    assert_eq!(current.risk_free_rate, 0.045);
    // 加载不写回
    assert!(store.peek(SETTINGS_KEY).unwrap().contains("QQQ"));
}

#[tokio::test]
async fn test_malformed_snapshot_falls_back_to_defaults() {
    let store = Arc::new(MemLocalStore::with_items([(SETTINGS_KEY, "{not json")]));
    let manager = SettingsManager::load(store, &SettingsPatch::default()).await;
    assert_eq!(manager.current().await, AnalysisSettings::default());

    let store = Arc::new(MemLocalStore::with_items([(SETTINGS_KEY, "[1,2,3]")]));
    let manager = SettingsManager::load(store, &SettingsPatch::default()).await;
    assert_eq!(manager.current().await, AnalysisSettings::default());
}

#[tokio::test]
async fn test_update_persists_full_object() {
    let store = Arc::new(MemLocalStore::new());
    let manager = SettingsManager::load(store.clone(), &SettingsPatch::default()).await;

    let patch = SettingsPatch {
        preset: Some(OutlookPreset::Pessimistic),
        risk_free_rate: Some(0.05),
        ..SettingsPatch::default()
    };
    let updated = manager.update(&patch).await;
    assert_eq!(updated.preset, OutlookPreset::Pessimistic);

    let snapshot = stored(&store);
    assert_eq!(snapshot["preset"], "pessimistic");
    assert_eq!(snapshot["riskFreeRate"], 0.05);
    assert_eq!(snapshot["betaBenchmark"], "SPY");
    assert_eq!(snapshot["dividendWindow"], "5y");

    // 重新加载得到相同参数
    let reloaded = SettingsManager::load(store, &SettingsPatch::default()).await;
    assert_eq!(reloaded.current().await, updated);
}

#[tokio::test]
async fn test_reset_restores_and_persists_defaults() {
    let store = Arc::new(MemLocalStore::with_items([(SETTINGS_KEY, r#"{"preset":"optimistic"}"#)]));
    let manager = SettingsManager::load(store.clone(), &SettingsPatch::default()).await;
    assert_eq!(manager.current().await.preset, OutlookPreset::Optimistic);

    assert_eq!(manager.reset().await, AnalysisSettings::default());
    assert_eq!(stored(&store)["preset"], "neutral");
}

#[tokio::test]
async fn test_sync_url_contains_only_non_default_fields() {
    let store = Arc::new(MemLocalStore::new());
    let manager = SettingsManager::load(store, &SettingsPatch::default()).await;
    assert_eq!(manager.sync_url("/", None).await, "/");

    manager
        .update(&SettingsPatch {
            sharpe_window: Some(SharpeWindow::Days126),
            risk_free_rate: Some(0.03),
            ..SettingsPatch::default()
        })
        .await;
    let ticker = Ticker::new("msft").unwrap();
    assert_eq!(
        manager.sync_url("/", Some(&ticker)).await,
        "/?ticker=MSFT&sharpeWindow=126&rf=0.03"
    );
}

#[tokio::test]
async fn test_store_failures_are_not_propagated() {
    let manager = SettingsManager::load(Arc::new(BrokenStore), &SettingsPatch::default()).await;
    assert_eq!(manager.current().await, AnalysisSettings::default());

    let updated = manager
        .update(&SettingsPatch {
            preset: Some(OutlookPreset::Optimistic),
            ..SettingsPatch::default()
        })
        .await;
    assert_eq!(updated.preset, OutlookPreset::Optimistic);
    assert_eq!(manager.current().await.preset, OutlookPreset::Optimistic);
    assert_eq!(manager.reset().await, AnalysisSettings::default());
}
