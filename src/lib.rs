// ==========================================
// 公交轮班调度系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite + tokio
// 系统定位: 每日轮班/班次生成 + 司机休息生命周期
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 调度参数
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 装配与定时任务
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    DriverStatus, RotationPosition, ShiftType, TripDirection, TripStatus, VehicleStatus,
};

// 领域实体
pub use domain::{BreakLog, BreakStatus, Driver, RotationAssignment, Route, Trip, Vehicle};

// 引擎
pub use engine::{BreakManager, GenerationMode, GenerationOutcome, ScheduleReconciler};

// API
pub use api::{BreakApi, ConfigApi, ScheduleApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "公交轮班调度系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
