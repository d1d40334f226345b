// ==========================================
// 公交轮班调度系统 - 调度配置读取 Trait
// ==========================================
// 职责: 定义排班/休息流程所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::settings::{ConfigError, RotationSettings};
use async_trait::async_trait;

// ==========================================
// RotationConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait RotationConfigReader: Send + Sync {
    /// 读取并校验完整的调度参数
    ///
    /// # 返回
    /// - Ok(RotationSettings): 缺省键使用默认值
    /// - Err(ConfigError::Parse): 某个键的值无法解析
    /// - Err(ConfigError::Invalid): 参数组合不合法
    async fn load_settings(&self) -> Result<RotationSettings, ConfigError>;

    /// 获取开始休息前至少完成的班次数
    ///
    /// # 默认值
    /// - 1
    async fn get_min_trips_before_break(&self) -> Result<i32, ConfigError>;

    /// 获取每个班次的休息额度（分钟）
    ///
    /// # 默认值
    /// - 60
    async fn get_break_time_per_shift_minutes(&self) -> Result<f64, ConfigError>;

    /// 获取全部配置的快照（写入生成审计记录）
    async fn get_config_snapshot(&self) -> Result<serde_json::Value, ConfigError>;
}
