// ==========================================
// 公交轮班调度系统 - 应用层
// ==========================================
// 职责: 装配应用状态、通知连接注册表、每日定时生成
// ==========================================

pub mod connection_registry;
pub mod daily_trigger;
pub mod state;

// 重导出
pub use connection_registry::{ConnectionId, ConnectionRegistry, RegistryError};
pub use daily_trigger::{duration_until_next, run_once, spawn_daily_trigger, DAILY_TRIGGER_ACTOR};
pub use state::{get_default_db_path, AppState, DB_PATH_ENV};
