// ==========================================
// 公交轮班调度系统 - 配置管理 API
// ==========================================
// 职责: 调度参数查询、覆写、快照
// 红线: 写入后参数组合不合法时回退到写入前的值
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::config::{config_keys, ConfigManager, RotationSettings};

/// 可覆写的配置键
pub const KNOWN_KEYS: [&str; 7] = [
    config_keys::MIN_TRIPS_BEFORE_BREAK,
    config_keys::BREAK_TIME_PER_SHIFT_MINUTES,
    config_keys::DISPATCH_FREQUENCY_MINUTES,
    config_keys::MORNING_SHIFT_START,
    config_keys::MORNING_SHIFT_END,
    config_keys::DISPATCH_WINDOW_END,
    config_keys::DAILY_GENERATION_TIME,
];

/// 配置项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigItem {
    pub key: String,
    /// None 表示未覆写，使用默认值
    pub value: Option<String>,
}

pub struct ConfigApi {
    config_manager: Arc<ConfigManager>,
}

impl ConfigApi {
    pub fn new(config_manager: Arc<ConfigManager>) -> Self {
        Self { config_manager }
    }

    /// 查询所有已知配置键的当前覆写值
    pub fn list_configs(&self) -> ApiResult<Vec<ConfigItem>> {
        KNOWN_KEYS
            .iter()
            .map(|key| {
                Ok::<_, ApiError>(ConfigItem {
                    key: key.to_string(),
                    value: self.config_manager.get_global_config_value(key)?,
                })
            })
            .collect()
    }

    /// 查询当前生效的调度参数
    pub fn get_settings(&self) -> ApiResult<RotationSettings> {
        Ok(self.config_manager.read_settings()?)
    }

    /// 覆写单个配置
    ///
    /// # 返回
    /// - Ok(RotationSettings): 覆写后生效的参数
    /// - Err(InvalidInput): 未知配置键
    /// - Err(ValidationError): 值无法解析或参数组合不合法（已回退）
    pub fn update_config(&self, key: &str, value: &str) -> ApiResult<RotationSettings> {
        if !KNOWN_KEYS.contains(&key) {
            return Err(ApiError::InvalidInput(format!("未知配置键: {}", key)));
        }

        let previous = self.config_manager.get_global_config_value(key)?;
        self.config_manager.set_config_value(key, value.trim())?;

        match self.config_manager.read_settings() {
            Ok(settings) => Ok(settings),
            Err(e) => {
                tracing::warn!(key = key, value = value, "配置不合法，回退: {}", e);
                match previous {
                    Some(old) => self.config_manager.set_config_value(key, &old)?,
                    None => {
                        self.config_manager.remove_config_value(key)?;
                    }
                }
                Err(e.into())
            }
        }
    }

    /// 删除覆写，恢复默认值
    pub fn reset_config(&self, key: &str) -> ApiResult<bool> {
        if !KNOWN_KEYS.contains(&key) {
            return Err(ApiError::InvalidInput(format!("未知配置键: {}", key)));
        }
        Ok(self.config_manager.remove_config_value(key)?)
    }

    /// 获取配置快照
    pub fn get_config_snapshot(&self) -> ApiResult<serde_json::Value> {
        Ok(self.config_manager.get_config_snapshot()?)
    }
}
