// ==========================================
// 公交轮班调度系统 - 配置层
// ==========================================
// 职责: 调度参数的读取、覆写与校验
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod rotation_config_trait;
pub mod settings;

// 重导出核心配置管理器
pub use config_manager::{ConfigManager, GLOBAL_SCOPE};
pub use rotation_config_trait::RotationConfigReader;
pub use settings::{config_keys, ConfigError, RotationSettings};
