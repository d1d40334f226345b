// ==========================================
// 公交轮班调度系统 - 班次编排器
// ==========================================
// 职责: 沿发车时间轴为线路生成去程/回程班次
// 规则:
// - 从早班开始时刻起，每个发车周期生成一个去程
// - 回程开始 = 去程结束 + 折返时间，且必须早于发车窗口上界
// - 两个分配按周期交替承担（toggle 0/1）
// ==========================================

use crate::config::RotationSettings;
use crate::domain::fleet::Route;
use crate::domain::rotation::RotationAssignment;
use crate::domain::trip::Trip;
use crate::domain::types::{TripDirection, TripStatus};
use crate::engine::error::{EngineError, EngineResult};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use uuid::Uuid;

/// 一天的分钟数，线路耗时与折返时间的上界
pub const MINUTES_PER_DAY: i64 = 24 * 60;

/// 分钟数（可带小数）转换为时长，精确到毫秒
pub fn minutes(value: f64) -> Duration {
    Duration::milliseconds((value * 60_000.0).round() as i64)
}

/// 班次展示编号: 线路名前三字母大写-HHMM-O/I
///
/// # 示例
/// - `RIV-0600-O`
pub fn trip_number(route: &Route, start: NaiveDateTime, direction: TripDirection) -> String {
    format!(
        "{}-{}-{}",
        route.code_prefix(),
        start.format("%H%M"),
        direction.suffix()
    )
}

pub struct TripSequencer;

impl TripSequencer {
    /// 为一条线路编排当日班次
    ///
    /// # 参数
    /// - `route`: 线路（提供单程耗时与折返时间）
    /// - `assignments`: 该线路的上岗分配，按位次排列
    /// - `date`: 排班日期
    /// - `settings`: 发车间隔与时间窗
    /// - `now`: 创建时间
    ///
    /// # 返回
    /// - 按时间顺序排列的班次（同一周期内去程在前）
    /// - Err(Validation): 线路耗时非法
    pub fn sequence(
        route: &Route,
        assignments: &[RotationAssignment],
        date: NaiveDate,
        settings: &RotationSettings,
        now: NaiveDateTime,
    ) -> EngineResult<Vec<Trip>> {
        validate_route(route)?;
        if settings.dispatch_frequency_minutes <= 0 {
            return Err(EngineError::Validation(format!(
                "发车间隔必须大于 0: {}",
                settings.dispatch_frequency_minutes
            )));
        }
        if assignments.is_empty() {
            return Ok(Vec::new());
        }

        let travel = minutes(route.estimated_time_minutes);
        let turnaround = minutes(route.turnaround_time_minutes);
        // 窗口不超过一天，超过一天的间隔等价于只发一班
        let frequency = Duration::minutes(settings.dispatch_frequency_minutes.min(MINUTES_PER_DAY));
        let window_end = date.and_time(settings.dispatch_window_end);

        let mut trips = Vec::new();
        let mut current = date.and_time(settings.morning_shift_start);
        let mut toggle = 0usize;

        while current < window_end {
            let assignment = &assignments[toggle % assignments.len()];
            toggle = 1 - toggle;

            let outbound_end = advance(route, current, travel)?;
            trips.push(build_trip(
                route,
                assignment,
                TripDirection::Outbound,
                current,
                outbound_end,
                now,
            ));

            let return_start = advance(route, outbound_end, turnaround)?;
            if return_start < window_end {
                trips.push(build_trip(
                    route,
                    assignment,
                    TripDirection::Inbound,
                    return_start,
                    advance(route, return_start, travel)?,
                    now,
                ));
            }

            current = advance(route, current, frequency)?;
        }

        Ok(trips)
    }
}

/// 线路耗时: 单程取毫秒后必须为正，两者都不超过一天
fn validate_route(route: &Route) -> EngineResult<()> {
    let max = MINUTES_PER_DAY as f64;
    let estimated = route.estimated_time_minutes;
    if !estimated.is_finite() || estimated > max || minutes(estimated) <= Duration::zero() {
        return Err(EngineError::Validation(format!(
            "线路 {} 的单程耗时必须在 (0, {}] 分钟内且不短于 1 毫秒: {}",
            route.route_id, max, estimated
        )));
    }
    let turnaround = route.turnaround_time_minutes;
    if !turnaround.is_finite() || turnaround < 0.0 || turnaround > max {
        return Err(EngineError::Validation(format!(
            "线路 {} 的折返时间必须在 [0, {}] 分钟内: {}",
            route.route_id, max, turnaround
        )));
    }
    Ok(())
}

fn advance(route: &Route, at: NaiveDateTime, by: Duration) -> EngineResult<NaiveDateTime> {
    at.checked_add_signed(by).ok_or_else(|| {
        EngineError::Validation(format!("线路 {} 的班次时间超出可表示范围: {}", route.route_id, at))
    })
}

fn build_trip(
    route: &Route,
    assignment: &RotationAssignment,
    direction: TripDirection,
    start: NaiveDateTime,
    end: NaiveDateTime,
    now: NaiveDateTime,
) -> Trip {
    Trip {
        trip_id: Uuid::new_v4().to_string(),
        trip_number: trip_number(route, start, direction),
        route_id: route.route_id.clone(),
        driver_id: assignment.driver_id.clone(),
        vehicle_id: assignment.vehicle_id.clone(),
        assignment_id: Some(assignment.assignment_id.clone()),
        direction,
        status: TripStatus::Scheduled,
        scheduled_start: start,
        scheduled_end: end,
        created_at: now,
    }
}
