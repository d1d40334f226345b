// ==========================================
// 公交轮班调度系统 - API 层
// ==========================================
// 职责: 对外暴露排班/休息/配置接口,负责错误转换与提交后通知
// ==========================================

pub mod break_api;
pub mod config_api;
pub mod error;
pub mod schedule_api;

// 重导出核心类型
pub use break_api::BreakApi;
pub use config_api::{ConfigApi, ConfigItem};
pub use error::{ApiError, ApiResult};
pub use schedule_api::ScheduleApi;
