use super::error::SettingsError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// 为只有有限合法取值的参数生成枚举及其字符串编解码。
macro_rules! setting_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($variant:ident => $wire:literal, $label:literal),+ $(,)?
        }
        default = $default:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $wire)] $variant,)+
        }

        impl $name {
            /// 全部合法取值，按展示顺序排列
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// 存储与 URL 中使用的线上表示
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }

            /// 面向用户的描述文本
            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl FromStr for $name {
            type Err = SettingsError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    _ => Err(SettingsError::IllegalValue {
                        field: stringify!($name),
                        value: s.to_string(),
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

setting_enum! {
    /// 全局展望预设，决定评分的基准偏移
    OutlookPreset {
        Pessimistic => "pessimistic", "Pessimistic",
        Neutral => "neutral", "Neutral",
        Optimistic => "optimistic", "Optimistic",
    }
    default = Neutral
}

setting_enum! {
    /// Beta 与 Sharpe 的对比基准指数
    Benchmark {
        Spy => "SPY", "SPY (S&P 500)",
        Qqq => "QQQ", "QQQ (Nasdaq 100)",
        Iwm => "IWM", "IWM (Russell 2000)",
    }
    default = Spy
}

setting_enum! {
    /// Sharpe 比率的交易日窗口
    SharpeWindow {
        Days126 => "126", "6 Months (126 days)",
        Days252 => "252", "1 Year (252 days)",
        Days504 => "504", "3 Years (504 days)",
    }
    default = Days252
}

setting_enum! {
    /// P/E 与 EPS 的历史回溯窗口
    LookbackWindow {
        OneYear => "1y", "1 Year",
        ThreeYears => "3y", "3 Years",
        FiveYears => "5y", "5 Years",
    }
    default = ThreeYears
}

setting_enum! {
    /// 波动率计算的交易日窗口
    VolatilityWindow {
        Days30 => "30", "30 days",
        Days90 => "90", "90 days",
        Days252 => "252", "252 days (1 year)",
    }
    default = Days252
}

setting_enum! {
    /// EV/EBITDA 口径
    EvEbitdaType {
        Ttm => "ttm", "Trailing Twelve Months",
        Forward => "forward", "Forward",
    }
    default = Ttm
}

setting_enum! {
    /// 股息增长的统计窗口
    DividendWindow {
        ThreeYears => "3y", "3 Years",
        FiveYears => "5y", "5 Years",
        TenYears => "10y", "10 Years",
    }
    default = FiveYears
}

/// 默认无风险利率 (小数形式)
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.045;

/// # Summary
/// 分析参数的字段标识，统一管理存储键与 URL 参数名。
///
/// # Invariants
/// - `ALL` 的顺序即 URL 序列化时的参数顺序。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingField {
    Preset,
    BetaBenchmark,
    SharpeWindow,
    RiskFreeRate,
    PeWindow,
    EpsWindow,
    VolatilityWindow,
    EvEbitdaType,
    DividendWindow,
}

impl SettingField {
    pub const ALL: [SettingField; 9] = [
        SettingField::Preset,
        SettingField::BetaBenchmark,
        SettingField::SharpeWindow,
        SettingField::RiskFreeRate,
        SettingField::PeWindow,
        SettingField::EpsWindow,
        SettingField::VolatilityWindow,
        SettingField::EvEbitdaType,
        SettingField::DividendWindow,
    ];

    /// 持久化 JSON 对象中的键名
    pub fn storage_key(&self) -> &'static str {
        match self {
            SettingField::Preset => "preset",
            SettingField::BetaBenchmark => "betaBenchmark",
            SettingField::SharpeWindow => "sharpeWindow",
            SettingField::RiskFreeRate => "riskFreeRate",
            SettingField::PeWindow => "peWindow",
            SettingField::EpsWindow => "epsWindow",
            SettingField::VolatilityWindow => "volatilityWindow",
            SettingField::EvEbitdaType => "evEbitdaType",
            SettingField::DividendWindow => "dividendWindow",
        }
    }

    /// URL 查询参数名，仅无风险利率使用缩写
    pub fn query_key(&self) -> &'static str {
        match self {
            SettingField::RiskFreeRate => "rf",
            other => other.storage_key(),
        }
    }

    /// 面向用户的字段名
    pub fn title(&self) -> &'static str {
        match self {
            SettingField::Preset => "Global Outlook Preset",
            SettingField::BetaBenchmark => "Beta Benchmark",
            SettingField::SharpeWindow => "Sharpe Window",
            SettingField::RiskFreeRate => "Risk-Free Rate",
            SettingField::PeWindow => "P/E Window",
            SettingField::EpsWindow => "EPS Window",
            SettingField::VolatilityWindow => "Volatility Window",
            SettingField::EvEbitdaType => "EV/EBITDA Type",
            SettingField::DividendWindow => "Dividend Window",
        }
    }

    /// 按存储键或 URL 参数名查找字段
    pub fn from_key(key: &str) -> Option<SettingField> {
        SettingField::ALL
            .into_iter()
            .find(|f| f.storage_key() == key || f.query_key() == key)
    }
}

/// # Summary
/// 解析无风险利率，接受任意有限的数值文本。
fn parse_rate(raw: &str) -> Result<f64, SettingsError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| SettingsError::IllegalValue {
            field: "RiskFreeRate",
            value: raw.to_string(),
        })
}

/// # Summary
/// 完整的分析参数集合。
///
/// # Invariants
/// - 每个字段始终持有合法值。
/// - `risk_free_rate` 始终为有限数值。
/// - 仅通过 `SettingsPatch` 合并或整体替换进行修改。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSettings {
    pub preset: OutlookPreset,
    pub beta_benchmark: Benchmark,
    pub sharpe_window: SharpeWindow,
    pub risk_free_rate: f64,
    pub pe_window: LookbackWindow,
    pub eps_window: LookbackWindow,
    pub volatility_window: VolatilityWindow,
    pub ev_ebitda_type: EvEbitdaType,
    pub dividend_window: DividendWindow,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            preset: OutlookPreset::default(),
            beta_benchmark: Benchmark::default(),
            sharpe_window: SharpeWindow::default(),
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
            pe_window: LookbackWindow::default(),
            eps_window: LookbackWindow::default(),
            volatility_window: VolatilityWindow::default(),
            ev_ebitda_type: EvEbitdaType::default(),
            dividend_window: DividendWindow::default(),
        }
    }
}

impl AnalysisSettings {
    /// # Summary
    /// 按 默认值 < 存储快照 < URL 参数 的优先级逐字段解析参数。
    ///
    /// # Arguments
    /// * `stored`: 存储中读出的补丁 (已过滤非法值)。
    /// * `url`: URL 中读出的补丁 (已过滤非法值)。
    ///
    /// # Returns
    /// 所有字段均合法的完整参数。
    pub fn resolve(stored: &SettingsPatch, url: &SettingsPatch) -> Self {
        Self::default().merged(stored).merged(url)
    }

    /// 返回合并补丁后的新参数，补丁中为 None 的字段保持不变
    pub fn merged(mut self, patch: &SettingsPatch) -> Self {
        self.apply(patch);
        self
    }

    /// 原地合并补丁
    pub fn apply(&mut self, patch: &SettingsPatch) {
        if let Some(v) = patch.preset {
            self.preset = v;
        }
        if let Some(v) = patch.beta_benchmark {
            self.beta_benchmark = v;
        }
        if let Some(v) = patch.sharpe_window {
            self.sharpe_window = v;
        }
        if let Some(v) = patch.risk_free_rate {
            self.risk_free_rate = v;
        }
        if let Some(v) = patch.pe_window {
            self.pe_window = v;
        }
        if let Some(v) = patch.eps_window {
            self.eps_window = v;
        }
        if let Some(v) = patch.volatility_window {
            self.volatility_window = v;
        }
        if let Some(v) = patch.ev_ebitda_type {
            self.ev_ebitda_type = v;
        }
        if let Some(v) = patch.dividend_window {
            self.dividend_window = v;
        }
    }

    /// 字段的线上表示
    pub fn value_of(&self, field: SettingField) -> String {
        match field {
            SettingField::Preset => self.preset.to_string(),
            SettingField::BetaBenchmark => self.beta_benchmark.to_string(),
            SettingField::SharpeWindow => self.sharpe_window.to_string(),
            SettingField::RiskFreeRate => self.risk_free_rate.to_string(),
            SettingField::PeWindow => self.pe_window.to_string(),
            SettingField::EpsWindow => self.eps_window.to_string(),
            SettingField::VolatilityWindow => self.volatility_window.to_string(),
            SettingField::EvEbitdaType => self.ev_ebitda_type.to_string(),
            SettingField::DividendWindow => self.dividend_window.to_string(),
        }
    }

    /// # Summary
    /// 列出与默认值不同的字段及其线上表示。
    ///
    /// # Returns
    /// 按 `SettingField::ALL` 顺序排列的 (字段, 值) 列表。
    pub fn non_default_fields(&self) -> Vec<(SettingField, String)> {
        let defaults = Self::default();
        SettingField::ALL
            .into_iter()
            .filter(|field| match field {
                SettingField::RiskFreeRate => {
                    self.risk_free_rate.to_bits() != defaults.risk_free_rate.to_bits()
                }
                other => self.value_of(*other) != defaults.value_of(*other),
            })
            .map(|field| (field, self.value_of(field)))
            .collect()
    }
}

/// # Summary
/// 分析参数的部分更新，每个字段可选。
///
/// # Invariants
/// - 持有的每个 Some 值都是合法值，非法输入在构造时已被丢弃。
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SettingsPatch {
    pub preset: Option<OutlookPreset>,
    pub beta_benchmark: Option<Benchmark>,
    pub sharpe_window: Option<SharpeWindow>,
    pub risk_free_rate: Option<f64>,
    pub pe_window: Option<LookbackWindow>,
    pub eps_window: Option<LookbackWindow>,
    pub volatility_window: Option<VolatilityWindow>,
    pub ev_ebitda_type: Option<EvEbitdaType>,
    pub dividend_window: Option<DividendWindow>,
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// # Summary
    /// 为单个字段设置文本值，非法值返回错误。
    ///
    /// # Arguments
    /// * `field`: 目标字段。
    /// * `raw`: 线上表示的文本值。
    ///
    /// # Returns
    /// 合法则写入补丁并返回 Ok。
    pub fn set(&mut self, field: SettingField, raw: &str) -> Result<(), SettingsError> {
        match field {
            SettingField::Preset => self.preset = Some(raw.parse()?),
            SettingField::BetaBenchmark => self.beta_benchmark = Some(raw.parse()?),
            SettingField::SharpeWindow => self.sharpe_window = Some(raw.parse()?),
            SettingField::RiskFreeRate => self.risk_free_rate = Some(parse_rate(raw)?),
            SettingField::PeWindow => self.pe_window = Some(raw.parse()?),
            SettingField::EpsWindow => self.eps_window = Some(raw.parse()?),
            SettingField::VolatilityWindow => self.volatility_window = Some(raw.parse()?),
            SettingField::EvEbitdaType => self.ev_ebitda_type = Some(raw.parse()?),
            SettingField::DividendWindow => self.dividend_window = Some(raw.parse()?),
        }
        Ok(())
    }

    /// # Summary
    /// 从 URL 查询参数对构造补丁。
    ///
    /// # Logic
    /// 1. 仅识别 URL 参数名 (`rf` 而非 `riskFreeRate`)。
    /// 2. 同名参数只取第一次出现的值。
    /// 3. 非法值静默丢弃。
    ///
    /// # Arguments
    /// * `pairs`: 已解码的 (参数名, 值) 序列。
    ///
    /// # Returns
    /// 仅包含合法字段的补丁。
    pub fn from_query_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut patch = Self::default();
        let mut seen: Vec<SettingField> = Vec::new();
        for (key, value) in pairs {
            let Some(field) = SettingField::ALL
                .into_iter()
                .find(|f| f.query_key() == key.as_ref())
            else {
                continue;
            };
            if seen.contains(&field) {
                continue;
            }
            seen.push(field);
            if let Err(e) = patch.set(field, value.as_ref()) {
                debug!("Discarding URL setting: {}", e);
            }
        }
        patch
    }

    /// # Summary
    /// 从存储中的 JSON 快照构造补丁。
    ///
    /// # Logic
    /// 1. 非对象类型的快照视为空。
    /// 2. 按存储键读取字段，字符串与数字均转为文本后校验。
    /// 3. 非法值静默丢弃。
    ///
    /// # Arguments
    /// * `snapshot`: 已解析的 JSON 值。
    ///
    /// # Returns
    /// 仅包含合法字段的补丁。
    pub fn from_stored(snapshot: &Value) -> Self {
        let mut patch = Self::default();
        let Some(object) = snapshot.as_object() else {
            return patch;
        };
        for field in SettingField::ALL {
            let raw = match object.get(field.storage_key()) {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Number(n)) => n.to_string(),
                _ => continue,
            };
            if let Err(e) = patch.set(field, &raw) {
                debug!("Discarding stored setting: {}", e);
            }
        }
        patch
    }

    /// # Summary
    /// 解析命令行形式的 `field=value` 赋值列表。
    ///
    /// # Arguments
    /// * `assignments`: 赋值表达式列表，字段名可用存储键或 URL 参数名。
    ///
    /// # Returns
    /// 全部合法时返回补丁，否则返回首个错误。
    pub fn from_assignments<S: AsRef<str>>(assignments: &[S]) -> Result<Self, SettingsError> {
        let mut patch = Self::default();
        for assignment in assignments {
            let assignment = assignment.as_ref();
            let (key, value) = assignment
                .split_once('=')
                .ok_or_else(|| SettingsError::Malformed(assignment.to_string()))?;
            let field = SettingField::from_key(key.trim())
                .ok_or_else(|| SettingsError::UnknownField(key.trim().to_string()))?;
            patch.set(field, value.trim())?;
        }
        Ok(patch)
    }
}

impl From<AnalysisSettings> for SettingsPatch {
    fn from(s: AnalysisSettings) -> Self {
        Self {
            preset: Some(s.preset),
            beta_benchmark: Some(s.beta_benchmark),
            sharpe_window: Some(s.sharpe_window),
            risk_free_rate: Some(s.risk_free_rate),
            pe_window: Some(s.pe_window),
            eps_window: Some(s.eps_window),
            volatility_window: Some(s.volatility_window),
            ev_ebitda_type: Some(s.ev_ebitda_type),
            dividend_window: Some(s.dividend_window),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let s = AnalysisSettings::default();
        assert_eq!(s.preset, OutlookPreset::Neutral);
        assert_eq!(s.beta_benchmark, Benchmark::Spy);
        assert_eq!(s.sharpe_window, SharpeWindow::Days252);
        assert_eq!(s.risk_free_rate, 0.045);
        assert_eq!(s.pe_window, LookbackWindow::ThreeYears);
        assert_eq!(s.eps_window, LookbackWindow::ThreeYears);
        assert_eq!(s.volatility_window, VolatilityWindow::Days252);
        assert_eq!(s.ev_ebitda_type, EvEbitdaType::Ttm);
        assert_eq!(s.dividend_window, DividendWindow::FiveYears);
        assert!(s.non_default_fields().is_empty());
    }

    #[test]
    fn test_serializes_with_storage_keys() {
        let value = serde_json::to_value(AnalysisSettings::default()).unwrap();
        assert_eq!(value["betaBenchmark"], "SPY");
        assert_eq!(value["sharpeWindow"], "252");
        assert_eq!(value["riskFreeRate"], 0.045);
        assert_eq!(value["dividendWindow"], "5y");
    }

    #[test]
    fn test_illegal_values_fall_back_to_defaults() {
        let stored = SettingsPatch::from_stored(&json!({
            "preset": "euphoric",
            "betaBenchmark": "DIA",
            "sharpeWindow": 252,
            "riskFreeRate": "abc",
            "peWindow": "10y",
            "volatilityWindow": "91",
        }));
        let url = SettingsPatch::from_query_pairs([
            ("evEbitdaType", "TTM"),
            ("rf", "NaN"),
            ("dividendWindow", "6m"),
        ]);
        let resolved = AnalysisSettings::resolve(&stored, &url);
        let defaults = AnalysisSettings::default();
        assert_eq!(resolved.preset, defaults.preset);
        assert_eq!(resolved.beta_benchmark, defaults.beta_benchmark);
        assert_eq!(resolved.risk_free_rate, defaults.risk_free_rate);
        assert_eq!(resolved.pe_window, defaults.pe_window);
        assert_eq!(resolved.volatility_window, defaults.volatility_window);
        assert_eq!(resolved.ev_ebitda_type, defaults.ev_ebitda_type);
        assert_eq!(resolved.dividend_window, defaults.dividend_window);
        // 数字形式的 252 是合法的窗口
        assert_eq!(resolved.sharpe_window, SharpeWindow::Days252);
    }

    #[test]
    fn test_url_overrides_storage_field_by_field() {
        let stored = SettingsPatch::from_stored(&json!({
            "preset": "pessimistic",
            "betaBenchmark": "QQQ",
            "riskFreeRate": 0.03,
        }));
        let url = SettingsPatch::from_query_pairs([("preset", "optimistic"), ("rf", "0.05")]);
        let resolved = AnalysisSettings::resolve(&stored, &url);
        assert_eq!(resolved.preset, OutlookPreset::Optimistic);
        assert_eq!(resolved.beta_benchmark, Benchmark::Qqq);
        assert_eq!(resolved.risk_free_rate, 0.05);
    }

    #[test]
    fn test_query_pairs_use_first_occurrence_and_url_names() {
        let patch = SettingsPatch::from_query_pairs([
            ("preset", "bogus"),
            ("preset", "optimistic"),
            ("riskFreeRate", "0.01"),
        ]);
        assert_eq!(patch.preset, None);
        assert_eq!(patch.risk_free_rate, None);
    }

    #[test]
    fn test_non_array_snapshot_is_empty_patch() {
        assert!(SettingsPatch::from_stored(&json!(["neutral"])).is_empty());
        assert!(SettingsPatch::from_stored(&json!("neutral")).is_empty());
    }

    #[test]
    fn test_assignments() {
        let patch =
            SettingsPatch::from_assignments(&["preset=optimistic", "rf = 0.02", "peWindow=5y"])
                .unwrap();
        assert_eq!(patch.preset, Some(OutlookPreset::Optimistic));
        assert_eq!(patch.risk_free_rate, Some(0.02));
        assert_eq!(patch.pe_window, Some(LookbackWindow::FiveYears));

        assert_eq!(
            SettingsPatch::from_assignments(&["color=red"]),
            Err(SettingsError::UnknownField("color".to_string()))
        );
        assert!(matches!(
            SettingsPatch::from_assignments(&["preset"]),
            Err(SettingsError::Malformed(_))
        ));
        assert!(matches!(
            SettingsPatch::from_assignments(&["sharpeWindow=100"]),
            Err(SettingsError::IllegalValue { .. })
        ));
    }

    #[test]
    fn test_non_default_fields_in_query_order() {
        let settings = AnalysisSettings {
            dividend_window: DividendWindow::TenYears,
            preset: OutlookPreset::Optimistic,
            risk_free_rate: 0.05,
            ..AnalysisSettings::default()
        };
        let fields: Vec<_> = settings
            .non_default_fields()
            .into_iter()
            .map(|(f, v)| (f.query_key(), v))
            .collect();
        assert_eq!(
            fields,
            vec![
                ("preset", "optimistic".to_string()),
                ("rf", "0.05".to_string()),
                ("dividendWindow", "10y".to_string()),
            ]
        );
    }
}
