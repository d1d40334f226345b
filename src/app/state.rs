// ==========================================
// 公交轮班调度系统 - 应用状态
// ==========================================
// 职责: 打开数据库、装配 Repository/Engine/API，持有连接注册表
// ==========================================

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::api::{BreakApi, ConfigApi, ScheduleApi};
use crate::app::connection_registry::ConnectionRegistry;
use crate::config::{ConfigManager, RotationConfigReader};
use crate::db::{init_schema, open_sqlite_connection, read_schema_version, CURRENT_SCHEMA_VERSION};
use crate::engine::{BreakManager, OptionalRelay, ScheduleReconciler};
use crate::repository::{
    AssignmentRepository, AuditLogRepository, BreakLogRepository, DriverRepository,
    RouteRepository, TripRepository,
};

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "TRANSIT_ROTATION_DB_PATH";

/// 应用状态
///
/// 所有 API 共享同一个数据库连接
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 排班API
    pub schedule_api: Arc<ScheduleApi>,

    /// 休息API
    pub break_api: Arc<BreakApi>,

    /// 配置API
    pub config_api: Arc<ConfigApi>,

    /// 配置读取（供定时任务使用）
    pub config_reader: Arc<dyn RotationConfigReader>,

    /// 在线连接注册表（通知投递）
    pub connection_registry: Arc<ConnectionRegistry>,

    /// 司机仓储
    pub driver_repo: Arc<DriverRepository>,

    /// 休息记录仓储
    pub break_log_repo: Arc<BreakLogRepository>,

    /// 审计日志仓储
    pub audit_log_repo: Arc<AuditLogRepository>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开数据库并幂等建表
    /// 2. 初始化所有Repository与Engine
    /// 3. 创建所有API实例，通知经由 ConnectionRegistry 投递
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("数据库建表失败: {}", e))?;
        match read_schema_version(&conn) {
            Ok(Some(v)) if v == CURRENT_SCHEMA_VERSION => {}
            Ok(v) => tracing::warn!(
                found = ?v,
                expected = CURRENT_SCHEMA_VERSION,
                "schema_version 与代码期望不一致"
            ),
            Err(e) => tracing::warn!("读取 schema_version 失败(将继续启动): {}", e),
        }
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let route_repo = Arc::new(RouteRepository::new(conn.clone()));
        let driver_repo = Arc::new(DriverRepository::new(conn.clone()));
        let trip_repo = Arc::new(TripRepository::new(conn.clone()));
        let assignment_repo = Arc::new(AssignmentRepository::new(conn.clone()));
        let break_log_repo = Arc::new(BreakLogRepository::new(conn.clone()));
        let audit_log_repo = Arc::new(AuditLogRepository::new(conn.clone()));

        // ==========================================
        // 初始化Engine层
        // ==========================================
        let config_manager = Arc::new(ConfigManager::from_connection(conn.clone()));
        let config_reader: Arc<dyn RotationConfigReader> = config_manager.clone();
        let reconciler = Arc::new(ScheduleReconciler::new(conn.clone()));
        let break_manager = Arc::new(BreakManager::new(conn));

        let connection_registry = Arc::new(ConnectionRegistry::new());
        let relay = OptionalRelay::with_relay(connection_registry.clone());

        // ==========================================
        // 初始化API层
        // ==========================================
        let schedule_api = Arc::new(ScheduleApi::new(
            reconciler,
            trip_repo,
            assignment_repo,
            route_repo,
            config_reader.clone(),
            relay.clone(),
        ));
        let break_api = Arc::new(BreakApi::new(break_manager, config_reader.clone(), relay));
        let config_api = Arc::new(ConfigApi::new(config_manager));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            schedule_api,
            break_api,
            config_api,
            config_reader,
            connection_registry,
            driver_repo,
            break_log_repo,
            audit_log_repo,
        })
    }
}

/// 获取默认数据库路径
///
/// # 优先级
/// 1. 环境变量 `TRANSIT_ROTATION_DB_PATH`
/// 2. 用户数据目录 `<data_dir>/transit-rotation/transit_rotation.db`
/// 3. 当前目录 `./transit_rotation.db`
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./transit_rotation.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("transit-rotation");
        // 目录创建失败时退回当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("transit_rotation.db");
        }
    }

    path.to_string_lossy().to_string()
}
