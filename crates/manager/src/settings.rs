use kabu_core::common::Ticker;
use kabu_core::settings::entity::{AnalysisSettings, SettingsPatch};
use kabu_core::settings::location::build_location;
use kabu_core::store::port::{LocalStore, SETTINGS_KEY};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// # Summary
/// 分析参数的应用服务，负责加载、更新、重置与持久化。
///
/// # Invariants
/// - 当前参数的每个字段始终合法。
/// - 每次修改都立即写入完整的参数对象；写入失败只记录日志。
/// - 修改在互斥锁内完成，持久化顺序与内存中的修改顺序一致。
pub struct SettingsManager {
    // 本地存储接口
    store: Arc<dyn LocalStore>,
    // 当前生效的参数
    current: Mutex<AnalysisSettings>,
}

impl SettingsManager {
    /// # Summary
    /// 按 默认值 < 存储快照 < URL 参数 的优先级构造当前参数。
    ///
    /// # Logic
    /// 1. 读取存储快照，读取失败或格式错误时视为无快照。
    /// 2. 逐字段合并快照与 URL 覆盖，非法值被丢弃。
    /// 3. 加载本身不写回存储。
    ///
    /// # Arguments
    /// * `store`: 本地存储接口。
    /// * `url_overrides`: 从地址中解析出的参数覆盖。
    pub async fn load(store: Arc<dyn LocalStore>, url_overrides: &SettingsPatch) -> Self {
        let stored = read_snapshot(store.as_ref()).await;
        let current = AnalysisSettings::resolve(&stored, url_overrides);
        debug!(?current, "settings resolved");
        Self {
            store,
            current: Mutex::new(current),
        }
    }

    pub async fn current(&self) -> AnalysisSettings {
        *self.current.lock().await
    }

    /// # Summary
    /// 合并部分字段并持久化完整结果。
    ///
    /// # Returns
    /// 合并后的参数。
    pub async fn update(&self, patch: &SettingsPatch) -> AnalysisSettings {
        let mut current = self.current.lock().await;
        current.apply(patch);
        self.persist(&current).await;
        info!(changed = ?patch, "settings updated");
        *current
    }

    /// 恢复默认值并持久化
    pub async fn reset(&self) -> AnalysisSettings {
        let mut current = self.current.lock().await;
        *current = AnalysisSettings::default();
        self.persist(&current).await;
        info!("settings reset to defaults");
        *current
    }

    /// # Summary
    /// 生成与当前参数对应的地址。
    ///
    /// # Arguments
    /// * `path`: 地址的路径部分。
    /// * `ticker`: 可选的当前证券代码，写在参数最前。
    ///
    /// # Returns
    /// 只包含非默认字段的地址，无参数时为纯路径。
    pub async fn sync_url(&self, path: &str, ticker: Option<&Ticker>) -> String {
        let current = self.current().await;
        build_location(path, &current, ticker)
    }

    async fn persist(&self, settings: &AnalysisSettings) {
        let json = match serde_json::to_string(settings) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "failed to encode settings, write skipped");
                return;
            }
        };
        if let Err(e) = self.store.set_item(SETTINGS_KEY, &json).await {
            warn!(error = %e, "failed to save settings to storage");
        }
    }
}

/// 读取存储中的参数快照，任何失败都视为空补丁
async fn read_snapshot(store: &dyn LocalStore) -> SettingsPatch {
    let raw = match store.get_item(SETTINGS_KEY).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return SettingsPatch::default(),
        Err(e) => {
            warn!(error = %e, "failed to load settings from storage");
            return SettingsPatch::default();
        }
    };
    match serde_json::from_str::<Value>(&raw) {
        Ok(snapshot) => SettingsPatch::from_stored(&snapshot),
        Err(e) => {
            warn!(error = %e, "stored settings are not valid JSON, ignoring");
            SettingsPatch::default()
        }
    }
}
