// ==========================================
// 公交轮班调度系统 - 排班 API
// ==========================================
// 职责: 生成/重建每日排班，查询排班视图
// 流程: 读取配置 -> 阻塞线程池内执行生成事务 -> 提交后推送通知
// 红线: 不做权限判断（调用方负责）
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::RotationConfigReader;
use crate::db::now_local;
use crate::domain::rotation::RotationAssignment;
use crate::domain::trip::TripView;
use crate::engine::{
    GenerationMode, GenerationOutcome, GenerationRequest, Notification, NotificationCategory,
    OptionalRelay, ScheduleReconciler,
};
use crate::repository::{AssignmentRepository, RouteRepository, TripRepository};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

pub struct ScheduleApi {
    reconciler: Arc<ScheduleReconciler>,
    trip_repo: Arc<TripRepository>,
    assignment_repo: Arc<AssignmentRepository>,
    route_repo: Arc<RouteRepository>,
    config: Arc<dyn RotationConfigReader>,
    relay: OptionalRelay,
}

impl ScheduleApi {
    pub fn new(
        reconciler: Arc<ScheduleReconciler>,
        trip_repo: Arc<TripRepository>,
        assignment_repo: Arc<AssignmentRepository>,
        route_repo: Arc<RouteRepository>,
        config: Arc<dyn RotationConfigReader>,
        relay: OptionalRelay,
    ) -> Self {
        Self {
            reconciler,
            trip_repo,
            assignment_repo,
            route_repo,
            config,
            relay,
        }
    }

    /// 生成某日排班
    ///
    /// # 参数
    /// - `date`: 排班日期
    /// - `force_regenerate`: true 时清理当日已有数据后重建
    /// - `actor`: 操作人（写入审计记录）
    ///
    /// # 返回
    /// - Ok(outcome): `outcome.trips` 为本次新生成的班次；当日已生成且未强制时为空
    pub async fn generate_schedule(
        &self,
        date: NaiveDate,
        force_regenerate: bool,
        actor: Option<&str>,
    ) -> ApiResult<GenerationOutcome> {
        self.generate_schedule_at(date, force_regenerate, actor, now_local())
            .await
    }

    /// 同 `generate_schedule`，显式指定当前时间
    pub async fn generate_schedule_at(
        &self,
        date: NaiveDate,
        force_regenerate: bool,
        actor: Option<&str>,
        now: NaiveDateTime,
    ) -> ApiResult<GenerationOutcome> {
        let settings = self.config.load_settings().await?;
        let snapshot = self.config.get_config_snapshot().await?;

        info!(date = %date, force = force_regenerate, actor = actor.unwrap_or("-"), "开始生成排班");

        let reconciler = Arc::clone(&self.reconciler);
        let actor_owned = actor.map(str::to_string);
        let outcome = tokio::task::spawn_blocking(move || {
            reconciler.generate(GenerationRequest {
                date,
                force_regenerate,
                settings: &settings,
                config_snapshot: Some(snapshot),
                actor: actor_owned.as_deref(),
                now,
            })
        })
        .await
        .map_err(|e| ApiError::InternalError(format!("排班生成任务异常退出: {}", e)))??;

        if outcome.mode != GenerationMode::AlreadyGenerated {
            self.notify_assigned_drivers(&outcome);
        }
        Ok(outcome)
    }

    /// 查询某日班次视图（按计划开始时间排序）
    pub fn list_trips_for_date(&self, date: NaiveDate) -> ApiResult<Vec<TripView>> {
        Ok(self.trip_repo.list_views_for_date(date)?)
    }

    /// 查询某日轮班分配
    pub fn list_assignments_for_date(&self, date: NaiveDate) -> ApiResult<Vec<RotationAssignment>> {
        Ok(self.assignment_repo.list_for_date(date)?)
    }

    /// 提交后向获得分配的司机推送排班通知（尽力投递）
    fn notify_assigned_drivers(&self, outcome: &GenerationOutcome) {
        let mut route_names: HashMap<&str, String> = HashMap::new();
        let mut delivered = 0usize;

        for assignment in &outcome.assignments {
            let route_name = route_names
                .entry(assignment.route_id.as_str())
                .or_insert_with(|| {
                    self.route_repo
                        .find_by_id(&assignment.route_id)
                        .ok()
                        .flatten()
                        .map(|r| r.name)
                        .unwrap_or_else(|| assignment.route_id.clone())
                })
                .clone();

            let trips_count = outcome
                .trips
                .iter()
                .filter(|t| t.assignment_id.as_deref() == Some(assignment.assignment_id.as_str()))
                .count();

            let notification = Notification::new(
                assignment.driver_id.clone(),
                "排班通知",
                format!(
                    "{} {} {} 线路 {}，{} - {}，共 {} 个班次",
                    outcome.date,
                    assignment.shift_type,
                    assignment.position,
                    route_name,
                    assignment.shift_start_time.format("%H:%M"),
                    assignment.shift_end_time.format("%H:%M"),
                    trips_count
                ),
                NotificationCategory::Schedule,
            );
            delivered += self.relay.notify(&notification);
        }

        info!(
            date = %outcome.date,
            recipients = outcome.assignments.len(),
            delivered = delivered,
            "排班通知已推送"
        );
    }
}
