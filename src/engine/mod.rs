// ==========================================
// 公交轮班调度系统 - 引擎层
// ==========================================
// 职责: 实现排班生成与休息生命周期规则,不拼 SQL
// 红线: 所有拒绝必须输出 reason
// ==========================================
// 生成流水线: ResourcePoolSelector -> AssignmentBuilder -> TripSequencer
// 由 ScheduleReconciler 在单个事务内驱动
// ==========================================

pub mod assignment_builder;
pub mod break_manager;
pub mod error;
pub mod events;
pub mod reconciler;
pub mod resource_pool;
pub mod trip_sequencer;

// 重导出核心引擎
pub use assignment_builder::AssignmentBuilder;
pub use break_manager::{break_status, check_break_eligibility, BreakManager};
pub use error::{EngineError, EngineResult, IneligibilityReason};
pub use events::{
    NoOpRelay, Notification, NotificationCategory, NotificationRelay, OptionalRelay,
};
pub use reconciler::{
    GenerationMode, GenerationOutcome, GenerationRequest, PurgeSummary, ScheduleReconciler,
};
pub use resource_pool::{PoolAllocation, ResourcePoolSelector, RouteCrew, SkippedRoute};
pub use trip_sequencer::{trip_number, TripSequencer};
