// ==========================================
// 公交轮班调度系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod audit_log;
pub mod break_log;
pub mod fleet;
pub mod rotation;
pub mod trip;
pub mod types;

// 重导出核心类型
pub use audit_log::{AuditAction, AuditLog};
pub use break_log::{BreakLog, BreakStatus};
pub use fleet::{Driver, Route, Vehicle};
pub use rotation::{DriverExchange, RotationAssignment};
pub use trip::{PositionLog, Ticket, Trip, TripView};
pub use types::{
    DriverStatus, ReplacementReason, RotationPosition, ShiftType, TripDirection, TripStatus,
    VehicleStatus,
};
