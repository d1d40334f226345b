// ==========================================
// 公交轮班调度系统 - 司机休息生命周期
// ==========================================
// 状态机: ACTIVE --start_break--> ON_BREAK --end_break--> ACTIVE
// 红线:
// - 只有 ACTIVE 状态、完成班次数达标且仍有休息额度时可以开始休息
// - break_time_remaining 永不为负
// - trips_since_last_break 只在结束休息时清零
// - 每个司机同一时刻最多一条未结束休息记录
// ==========================================

use crate::config::RotationSettings;
use crate::domain::audit_log::{AuditAction, AuditLog};
use crate::domain::break_log::{BreakLog, BreakStatus};
use crate::domain::fleet::Driver;
use crate::domain::types::DriverStatus;
use crate::engine::error::{EngineError, EngineResult, IneligibilityReason};
use crate::repository::{
    AuditLogRepository, BreakLogRepository, DriverRepository, RepositoryError, UnitOfWork,
};
use chrono::NaiveDateTime;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};
use uuid::Uuid;

/// 审计实体类型
pub const DRIVER_ENTITY: &str = "Driver";

// ==========================================
// 纯规则函数
// ==========================================

/// 判断司机能否开始休息
///
/// # 规则（按顺序检查）
/// 1. 状态必须为 ACTIVE
/// 2. trips_since_last_break >= 最少班次数
/// 3. break_time_remaining > 0
pub fn check_break_eligibility(
    driver: &Driver,
    settings: &RotationSettings,
) -> Result<(), IneligibilityReason> {
    if driver.status != DriverStatus::Active {
        return Err(IneligibilityReason::NotActive {
            status: driver.status.to_db_str().to_string(),
        });
    }
    if driver.trips_since_last_break < settings.min_trips_before_break {
        return Err(IneligibilityReason::InsufficientTrips {
            completed: driver.trips_since_last_break,
            required: settings.min_trips_before_break,
        });
    }
    if driver.break_time_remaining <= 0.0 {
        return Err(IneligibilityReason::NoBreakTimeRemaining);
    }
    Ok(())
}

/// 休息时长（分钟，带小数），时钟回拨时取 0
pub fn elapsed_minutes(start: NaiveDateTime, end: NaiveDateTime) -> f64 {
    let millis = (end - start).num_milliseconds();
    (millis.max(0) as f64) / 60_000.0
}

/// 汇总休息额度与资格
pub fn break_status(driver: &Driver, settings: &RotationSettings) -> BreakStatus {
    BreakStatus {
        driver_id: driver.driver_id.clone(),
        break_time_remaining: driver.break_time_remaining,
        total_break_time_today: driver.total_break_time_today,
        trips_since_last_break: driver.trips_since_last_break,
        current_break_number: driver.current_break_number,
        on_break: driver.is_on_break(),
        is_eligible: check_break_eligibility(driver, settings).is_ok(),
    }
}

// ==========================================
// BreakManager
// ==========================================
pub struct BreakManager {
    driver_repo: DriverRepository,
    break_log_repo: BreakLogRepository,
    uow: UnitOfWork,
}

impl BreakManager {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            driver_repo: DriverRepository::new(conn.clone()),
            break_log_repo: BreakLogRepository::new(conn.clone()),
            uow: UnitOfWork::new(conn),
        }
    }

    /// 开始休息
    ///
    /// # 返回
    /// - Ok(BreakLog): 新开启的休息记录
    /// - Err(IneligibleBreak): 不满足条件（含并发开启时的败者）
    /// - Err(NotFound): 司机不存在
    pub fn start_break(
        &self,
        driver_id: &str,
        settings: &RotationSettings,
        actor: Option<&str>,
        now: NaiveDateTime,
    ) -> EngineResult<BreakLog> {
        let log = self.uow.execute(|tx| {
            let mut driver = load_driver(tx, driver_id)?;

            check_break_eligibility(&driver, settings).map_err(|reason| {
                EngineError::IneligibleBreak {
                    driver_id: driver_id.to_string(),
                    reason,
                }
            })?;

            let before = driver.clone();
            driver.status = DriverStatus::OnBreak;
            driver.break_start_time = Some(now);
            driver.current_break_number += 1;
            driver.updated_at = now;
            DriverRepository::update_break_state_in(tx, &driver)?;

            let log = BreakLog {
                break_id: Uuid::new_v4().to_string(),
                driver_id: driver.driver_id.clone(),
                shift_date: now.date(),
                break_number: driver.current_break_number,
                start_time: now,
                end_time: None,
                duration_minutes: None,
                replaced_by_driver_id: None,
            };
            BreakLogRepository::insert_in(tx, &log).map_err(|e| {
                if e.is_unique_violation() {
                    EngineError::IneligibleBreak {
                        driver_id: driver_id.to_string(),
                        reason: IneligibilityReason::AlreadyOnBreak,
                    }
                } else {
                    EngineError::from(e)
                }
            })?;

            let audit = AuditLog::new(
                actor.map(str::to_string),
                AuditAction::StartBreak,
                DRIVER_ENTITY,
                Some(driver.driver_id.clone()),
                now,
            )
            .with_old_values(&before)
            .with_new_values(&driver);
            AuditLogRepository::insert_in(tx, &audit)?;

            Ok::<_, EngineError>(log)
        });

        match &log {
            Ok(log) => info!(
                driver_id = driver_id,
                break_number = log.break_number,
                "司机开始休息"
            ),
            Err(e) => warn!(driver_id = driver_id, "开始休息被拒绝: {}", e),
        }
        log
    }

    /// 结束休息
    ///
    /// # 返回
    /// - Ok(Driver): 更新后的司机
    /// - Err(NotOnBreak): 状态不是 ON_BREAK 或缺少开始时间
    pub fn end_break(
        &self,
        driver_id: &str,
        actor: Option<&str>,
        now: NaiveDateTime,
    ) -> EngineResult<Driver> {
        let result = self.uow.execute(|tx| {
            let mut driver = load_driver(tx, driver_id)?;

            let started_at = match (driver.status, driver.break_start_time) {
                (DriverStatus::OnBreak, Some(start)) => start,
                _ => {
                    return Err(EngineError::NotOnBreak {
                        driver_id: driver_id.to_string(),
                    })
                }
            };

            let duration = elapsed_minutes(started_at, now);
            let before = driver.clone();

            driver.status = DriverStatus::Active;
            driver.break_time_remaining = (driver.break_time_remaining - duration).max(0.0);
            driver.total_break_time_today += duration;
            driver.break_start_time = None;
            driver.trips_since_last_break = 0;
            driver.updated_at = now;
            DriverRepository::update_break_state_in(tx, &driver)?;

            match BreakLogRepository::find_open_for_driver_in(tx, driver_id)? {
                Some(open) => BreakLogRepository::close_in(tx, &open.break_id, now, duration)?,
                None => warn!(driver_id = driver_id, "司机处于休息状态但没有未结束的休息记录"),
            }

            let audit = AuditLog::new(
                actor.map(str::to_string),
                AuditAction::EndBreak,
                DRIVER_ENTITY,
                Some(driver.driver_id.clone()),
                now,
            )
            .with_old_values(&before)
            .with_new_values(&driver);
            AuditLogRepository::insert_in(tx, &audit)?;

            Ok(driver)
        });

        match &result {
            Ok(driver) => info!(
                driver_id = driver_id,
                break_time_remaining = driver.break_time_remaining,
                total_break_time_today = driver.total_break_time_today,
                "司机结束休息"
            ),
            Err(e) => warn!(driver_id = driver_id, "结束休息失败: {}", e),
        }
        result
    }

    /// 查询休息额度与资格
    pub fn get_break_status(
        &self,
        driver_id: &str,
        settings: &RotationSettings,
    ) -> EngineResult<BreakStatus> {
        let driver = self
            .driver_repo
            .find_by_id(driver_id)?
            .ok_or_else(|| driver_not_found(driver_id))?;
        Ok(break_status(&driver, settings))
    }

    /// 司机的休息记录（按开始时间升序）
    pub fn list_break_logs(&self, driver_id: &str) -> EngineResult<Vec<BreakLog>> {
        if self.driver_repo.find_by_id(driver_id)?.is_none() {
            return Err(driver_not_found(driver_id));
        }
        Ok(self.break_log_repo.list_for_driver(driver_id)?)
    }

    /// 记录司机完成一个班次（递增休息门槛所读的计数）
    pub fn record_completed_trip(&self, driver_id: &str, now: NaiveDateTime) -> EngineResult<Driver> {
        self.uow.execute(|tx| {
            DriverRepository::increment_trip_counters_in(tx, driver_id, now).map_err(|e| match e {
                RepositoryError::NotFound { .. } => driver_not_found(driver_id),
                other => EngineError::from(other),
            })?;
            load_driver(tx, driver_id)
        })
    }
}

fn load_driver(conn: &Connection, driver_id: &str) -> EngineResult<Driver> {
    DriverRepository::find_by_id_in(conn, driver_id)?.ok_or_else(|| driver_not_found(driver_id))
}

fn driver_not_found(driver_id: &str) -> EngineError {
    EngineError::NotFound {
        entity: DRIVER_ENTITY.to_string(),
        id: driver_id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn driver(status: DriverStatus, trips: i32, remaining: f64) -> Driver {
        Driver {
            driver_id: "D1".to_string(),
            full_name: "Ana".to_string(),
            license_number: "L1".to_string(),
            status,
            break_time_remaining: remaining,
            total_break_time_today: 0.0,
            break_start_time: None,
            trips_since_last_break: trips,
            current_break_number: 0,
            total_trips_today: trips,
            created_at: at(0, 0),
            updated_at: at(0, 0),
        }
    }

    #[test]
    fn test_zero_trips_is_ineligible_with_minimum_one() {
        let settings = RotationSettings::default();
        let result = check_break_eligibility(&driver(DriverStatus::Active, 0, 60.0), &settings);
        assert_eq!(
            result,
            Err(IneligibilityReason::InsufficientTrips {
                completed: 0,
                required: 1
            })
        );
    }

    #[test]
    fn test_eligible_when_trips_met_and_budget_left() {
        let settings = RotationSettings::default();
        assert!(check_break_eligibility(&driver(DriverStatus::Active, 1, 0.5), &settings).is_ok());
    }

    #[test]
    fn test_exhausted_budget_is_ineligible() {
        let settings = RotationSettings::default();
        assert_eq!(
            check_break_eligibility(&driver(DriverStatus::Active, 3, 0.0), &settings),
            Err(IneligibilityReason::NoBreakTimeRemaining)
        );
    }

    #[test]
    fn test_only_active_drivers_may_start() {
        let settings = RotationSettings::default();
        for status in [DriverStatus::OnTrip, DriverStatus::OnBreak, DriverStatus::OffDuty] {
            let result = check_break_eligibility(&driver(status, 5, 60.0), &settings);
            assert!(
                matches!(result, Err(IneligibilityReason::NotActive { .. })),
                "状态 {} 不应允许开始休息",
                status
            );
        }
    }

    #[test]
    fn test_elapsed_minutes() {
        assert_eq!(elapsed_minutes(at(10, 0), at(10, 22)), 22.0);
        assert_eq!(elapsed_minutes(at(10, 0), at(9, 0)), 0.0);
        let half = at(10, 0) + chrono::Duration::seconds(30);
        assert_eq!(elapsed_minutes(at(10, 0), half), 0.5);
    }

    #[test]
    fn test_break_status_eligibility_flag() {
        let settings = RotationSettings::default();
        let status = break_status(&driver(DriverStatus::Active, 2, 15.0), &settings);
        assert!(status.is_eligible);
        assert!(!status.on_break);

        let status = break_status(&driver(DriverStatus::Active, 0, 15.0), &settings);
        assert!(!status.is_eligible);
    }
}
