// ==========================================
// 公交轮班调度系统 - 司机数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑（休息资格判断在引擎层）
// ==========================================

use crate::db::fmt_datetime;
use crate::domain::fleet::Driver;
use crate::domain::types::DriverStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sql_builder::{datetime_col, enum_col, opt_datetime_col};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex, MutexGuard};

const DRIVER_COLUMNS: &str = "driver_id, full_name, license_number, status, \
     break_time_remaining, total_break_time_today, break_start_time, \
     trips_since_last_break, current_break_number, total_trips_today, \
     created_at, updated_at";

// ==========================================
// DriverRepository - 司机仓储
// ==========================================
pub struct DriverRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DriverRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 新增司机
    pub fn insert(&self, driver: &Driver) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        Self::insert_in(&conn, driver)
    }

    pub fn insert_in(conn: &Connection, driver: &Driver) -> RepositoryResult<()> {
        conn.execute(
            r#"
            INSERT INTO drivers (
                driver_id, full_name, license_number, status,
                break_time_remaining, total_break_time_today, break_start_time,
                trips_since_last_break, current_break_number, total_trips_today,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                driver.driver_id,
                driver.full_name,
                driver.license_number,
                driver.status.to_db_str(),
                driver.break_time_remaining,
                driver.total_break_time_today,
                driver.break_start_time.as_ref().map(fmt_datetime),
                driver.trips_since_last_break,
                driver.current_break_number,
                driver.total_trips_today,
                fmt_datetime(&driver.created_at),
                fmt_datetime(&driver.updated_at),
            ],
        )?;
        Ok(())
    }

    /// 写回休息相关字段
    ///
    /// # 说明
    /// - 只更新状态与休息计数字段，不覆盖姓名/证件等主数据
    /// - 影响行数为 0 时返回 NotFound
    pub fn update_break_state_in(conn: &Connection, driver: &Driver) -> RepositoryResult<()> {
        let rows = conn.execute(
            r#"
            UPDATE drivers SET
                status = ?2,
                break_time_remaining = ?3,
                total_break_time_today = ?4,
                break_start_time = ?5,
                trips_since_last_break = ?6,
                current_break_number = ?7,
                updated_at = ?8
            WHERE driver_id = ?1
            "#,
            params![
                driver.driver_id,
                driver.status.to_db_str(),
                driver.break_time_remaining,
                driver.total_break_time_today,
                driver.break_start_time.as_ref().map(fmt_datetime),
                driver.trips_since_last_break,
                driver.current_break_number,
                fmt_datetime(&driver.updated_at),
            ],
        )?;
        if rows == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Driver".to_string(),
                id: driver.driver_id.clone(),
            });
        }
        Ok(())
    }

    /// 完成一个班次后递增计数（trips_since_last_break 与 total_trips_today）
    pub fn increment_trip_counters_in(
        conn: &Connection,
        driver_id: &str,
        now: NaiveDateTime,
    ) -> RepositoryResult<()> {
        let rows = conn.execute(
            r#"
            UPDATE drivers SET
                trips_since_last_break = trips_since_last_break + 1,
                total_trips_today = total_trips_today + 1,
                updated_at = ?2
            WHERE driver_id = ?1
            "#,
            params![driver_id, fmt_datetime(&now)],
        )?;
        if rows == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Driver".to_string(),
                id: driver_id.to_string(),
            });
        }
        Ok(())
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 按 ID 查询司机
    pub fn find_by_id(&self, driver_id: &str) -> RepositoryResult<Option<Driver>> {
        let conn = self.get_conn()?;
        Self::find_by_id_in(&conn, driver_id)
    }

    pub fn find_by_id_in(conn: &Connection, driver_id: &str) -> RepositoryResult<Option<Driver>> {
        let sql = format!("SELECT {} FROM drivers WHERE driver_id = ?1", DRIVER_COLUMNS);
        let driver = conn
            .query_row(&sql, params![driver_id], Self::map_row)
            .optional()?;
        Ok(driver)
    }

    /// 查询可参与排班的司机（状态非 OFF_DUTY）
    ///
    /// # 排序
    /// - created_at, driver_id 升序
    pub fn list_available_in(conn: &Connection) -> RepositoryResult<Vec<Driver>> {
        let sql = format!(
            "SELECT {} FROM drivers WHERE status <> ?1 ORDER BY created_at ASC, driver_id ASC",
            DRIVER_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let drivers = stmt
            .query_map(params![DriverStatus::OffDuty.to_db_str()], Self::map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(drivers)
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<Driver> {
        Ok(Driver {
            driver_id: row.get(0)?,
            full_name: row.get(1)?,
            license_number: row.get(2)?,
            status: enum_col(row, 3, DriverStatus::from_db_str)?,
            break_time_remaining: row.get(4)?,
            total_break_time_today: row.get(5)?,
            break_start_time: opt_datetime_col(row, 6)?,
            trips_since_last_break: row.get(7)?,
            current_break_number: row.get(8)?,
            total_trips_today: row.get(9)?,
            created_at: datetime_col(row, 10)?,
            updated_at: datetime_col(row, 11)?,
        })
    }
}
