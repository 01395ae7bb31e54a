use crate::handler::DispatchMode;
use bon::Builder;

/// 注册表配置
///
/// ```rust
/// use event_bus::{DispatchMode, RegistryConfig};
///
/// let config = RegistryConfig::builder()
///     .default_mode(DispatchMode::Spawned)
///     .maybe_label(Some("orders".into()))
///     .build();
/// assert_eq!(config.label(), Some("orders"));
/// ```
#[derive(Builder, Clone, Debug, Default)]
pub struct RegistryConfig {
    /// `register` 未显式指定执行方式时使用的默认值
    #[builder(default)]
    default_mode: DispatchMode,
    /// 日志中用于区分不同注册表实例的标签
    label: Option<String>,
}

impl RegistryConfig {
    pub fn default_mode(&self) -> DispatchMode {
        self.default_mode
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}
