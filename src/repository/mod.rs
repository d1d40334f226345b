// ==========================================
// 公交轮班调度系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化; 枚举只在此层与字符串互转
// 约定: `*_in(conn, ..)` 形式的函数接受事务，供引擎层在工作单元内组合
// ==========================================

pub mod assignment_repo;
pub mod audit_log_repo;
pub mod break_log_repo;
pub mod driver_repo;
pub mod error;
pub mod route_repo;
pub mod sql_builder;
pub mod trip_dependents_repo;
pub mod trip_repo;
pub mod unit_of_work;
pub mod vehicle_repo;

// 重导出核心仓储
pub use assignment_repo::AssignmentRepository;
pub use audit_log_repo::AuditLogRepository;
pub use break_log_repo::BreakLogRepository;
pub use driver_repo::DriverRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use route_repo::RouteRepository;
pub use trip_dependents_repo::{ExchangeRepository, PositionLogRepository, TicketRepository};
pub use trip_repo::TripRepository;
pub use unit_of_work::UnitOfWork;
pub use vehicle_repo::VehicleRepository;
