use thiserror::Error;

/// # Summary
/// 分析参数域错误枚举，仅用于显式编辑参数的场景。
///
/// # Invariants
/// - 从存储或 URL 解析参数时不会产生此错误，非法值直接回退默认值。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    // 字段值不在合法集合内
    #[error("Illegal value for {field}: {value}")]
    IllegalValue { field: &'static str, value: String },
    // 未知的字段名
    #[error("Unknown setting: {0}")]
    UnknownField(String),
    // 赋值表达式格式错误 (应为 field=value)
    #[error("Malformed assignment: {0}")]
    Malformed(String),
}
