//! 选项树模型配置

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::model::data_core::OptionsError;

/// 默认自动刷新间隔（毫秒）
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeModelConfig {
    /// 轮询行数变化的间隔
    pub refresh_interval_ms: u64,
    /// 关闭后只响应显式的变更通知
    pub auto_refresh: bool,
}

impl Default for TreeModelConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: DEFAULT_REFRESH_INTERVAL_MS,
            auto_refresh: true,
        }
    }
}

impl TreeModelConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn from_json_str(s: &str) -> Result<Self, OptionsError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn load(p: &Path) -> Result<Self, OptionsError> {
        let text = std::fs::read_to_string(p)?;
        let config = Self::from_json_str(&text)?;
        if config.refresh_interval_ms == 0 {
            return Err(OptionsError::State("refresh_interval_ms 必须大于 0".into()));
        }
        Ok(config)
    }
}
