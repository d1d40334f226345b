// ==========================================
// 公交轮班调度系统 - 排班生成/重建协调器
// ==========================================
// 职责: 驱动 资源池选择 -> 分配构建 -> 班次编排，并处理重建
// 模式:
// - CREATE: 当日已有班次则不做任何事
// - REGENERATE: 先收集当日分配/班次 ID，再按依赖顺序清理后重建
// 红线: 清理与重建处于同一事务；任何失败整体回滚，不留半删半建状态
// ==========================================

use crate::config::RotationSettings;
use crate::domain::audit_log::{AuditAction, AuditLog};
use crate::domain::rotation::RotationAssignment;
use crate::domain::trip::Trip;
use crate::engine::assignment_builder::AssignmentBuilder;
use crate::engine::error::EngineResult;
use crate::engine::resource_pool::{ResourcePoolSelector, SkippedRoute};
use crate::engine::trip_sequencer::TripSequencer;
use crate::repository::{
    AssignmentRepository, AuditLogRepository, ExchangeRepository, PositionLogRepository,
    TicketRepository, TripRepository, UnitOfWork,
};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use serde::Serialize;
use serde_json::json;
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};

/// 审计实体类型
pub const SCHEDULE_ENTITY: &str = "Schedule";

// ==========================================
// 生成结果
// ==========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GenerationMode {
    /// 首次生成
    Created,
    /// 强制重建
    Regenerated,
    /// 当日已存在班次，未做任何修改
    AlreadyGenerated,
}

/// 重建时各表清理的行数
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PurgeSummary {
    pub tickets: usize,
    pub position_logs: usize,
    pub exchanges: usize,
    pub trips: usize,
    pub assignments: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationOutcome {
    pub date: NaiveDate,
    pub mode: GenerationMode,
    pub assignments: Vec<RotationAssignment>,
    pub trips: Vec<Trip>,
    pub purged: Option<PurgeSummary>,
    pub skipped_routes: Vec<SkippedRoute>,
}

impl GenerationOutcome {
    fn already_generated(date: NaiveDate) -> Self {
        Self {
            date,
            mode: GenerationMode::AlreadyGenerated,
            assignments: Vec::new(),
            trips: Vec::new(),
            purged: None,
            skipped_routes: Vec::new(),
        }
    }
}

/// 单次生成请求的上下文
#[derive(Debug, Clone)]
pub struct GenerationRequest<'a> {
    pub date: NaiveDate,
    pub force_regenerate: bool,
    pub settings: &'a RotationSettings,
    /// 写入审计记录的配置快照
    pub config_snapshot: Option<serde_json::Value>,
    pub actor: Option<&'a str>,
    pub now: NaiveDateTime,
}

// ==========================================
// ScheduleReconciler
// ==========================================
pub struct ScheduleReconciler {
    uow: UnitOfWork,
}

impl ScheduleReconciler {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            uow: UnitOfWork::new(conn),
        }
    }

    /// 生成（或重建）某日排班
    ///
    /// # 返回
    /// - Ok(outcome): mode 指明本次是创建、重建还是未变更
    /// - Err(Validation): 参数非法，未触碰存储
    /// - Err(TransactionFailure): 存储失败，已整体回滚
    pub fn generate(&self, req: GenerationRequest<'_>) -> EngineResult<GenerationOutcome> {
        req.settings.validate()?;

        let date = req.date;
        let result = self.uow.execute(|tx| Self::generate_in(tx, &req));

        match &result {
            Ok(outcome) => info!(
                date = %date,
                mode = ?outcome.mode,
                assignments_count = outcome.assignments.len(),
                trips_count = outcome.trips.len(),
                skipped_routes = outcome.skipped_routes.len(),
                "排班生成完成"
            ),
            Err(e) => error!(date = %date, force = req.force_regenerate, "排班生成失败，已回滚: {}", e),
        }
        result
    }

    fn generate_in(tx: &Connection, req: &GenerationRequest<'_>) -> EngineResult<GenerationOutcome> {
        let date = req.date;

        let existing = TripRepository::count_for_date_in(tx, date)?;
        if existing > 0 && !req.force_regenerate {
            info!(date = %date, existing_trips = existing, "当日已有排班，跳过生成");
            return Ok(GenerationOutcome::already_generated(date));
        }

        let purged = if req.force_regenerate {
            Some(Self::purge_date_in(tx, date)?)
        } else {
            None
        };

        let allocation = ResourcePoolSelector::select(tx, date)?;
        if allocation.is_empty() {
            warn!(date = %date, skipped_routes = allocation.skipped.len(), "没有可排班的线路");
        }

        let mut all_assignments = Vec::new();
        let mut all_trips = Vec::new();

        for crew in &allocation.crews {
            let assignments = AssignmentBuilder::build(crew, date, req.settings, req.now);
            for assignment in &assignments {
                AssignmentRepository::insert_in(tx, assignment)?;
            }

            let trips = TripSequencer::sequence(&crew.route, &assignments, date, req.settings, req.now)?;
            TripRepository::batch_insert_in(tx, &trips)?;

            info!(
                route_id = %crew.route.route_id,
                route_name = %crew.route.name,
                standby_driver = crew.standby_driver().map(|d| d.driver_id.as_str()).unwrap_or("-"),
                trips_count = trips.len(),
                "线路排班已生成"
            );

            all_assignments.extend(assignments);
            all_trips.extend(trips);
        }

        let mode = if req.force_regenerate {
            GenerationMode::Regenerated
        } else {
            GenerationMode::Created
        };
        let action = match mode {
            GenerationMode::Regenerated => AuditAction::RegenerateSchedule,
            _ => AuditAction::GenerateSchedule,
        };

        let mut audit = AuditLog::new(
            req.actor.map(str::to_string),
            action,
            SCHEDULE_ENTITY,
            Some(date.to_string()),
            req.now,
        )
        .with_new_values(&json!({
            "assignments_count": all_assignments.len(),
            "trips_count": all_trips.len(),
            "skipped_routes": allocation.skipped,
            "config": req.config_snapshot,
        }));
        if let Some(summary) = &purged {
            audit = audit.with_old_values(summary);
        }
        AuditLogRepository::insert_in(tx, &audit)?;

        Ok(GenerationOutcome {
            date,
            mode,
            assignments: all_assignments,
            trips: all_trips,
            purged,
            skipped_routes: allocation.skipped,
        })
    }

    /// 清理某日全部生成数据
    ///
    /// # 顺序
    /// 1. 先收集分配 ID 与班次 ID（避免遗漏孤儿记录）
    /// 2. 车票、位置记录（按班次 ID）
    /// 3. 换班记录（按分配 ID 或班次 ID）
    /// 4. 班次
    /// 5. 分配
    fn purge_date_in(tx: &Connection, date: NaiveDate) -> EngineResult<PurgeSummary> {
        let assignment_ids = AssignmentRepository::list_ids_for_date_in(tx, date)?;
        let trip_ids = TripRepository::list_ids_for_date_in(tx, date)?;

        let summary = PurgeSummary {
            tickets: TicketRepository::delete_by_trip_ids_in(tx, &trip_ids)?,
            position_logs: PositionLogRepository::delete_by_trip_ids_in(tx, &trip_ids)?,
            exchanges: ExchangeRepository::delete_by_assignment_or_trip_ids_in(
                tx,
                &assignment_ids,
                &trip_ids,
            )?,
            trips: TripRepository::delete_by_ids_in(tx, &trip_ids)?,
            assignments: AssignmentRepository::delete_by_ids_in(tx, &assignment_ids)?,
        };

        info!(
            date = %date,
            tickets = summary.tickets,
            position_logs = summary.position_logs,
            exchanges = summary.exchanges,
            trips = summary.trips,
            assignments = summary.assignments,
            "已清理当日排班数据"
        );
        Ok(summary)
    }
}
