// ==========================================
// 公交轮班调度系统 - 休息记录数据仓储
// ==========================================
// 红线: 记录只新增与关闭，不删除
// 约束: uq_break_logs_open 保证每个司机最多一条未结束记录
// ==========================================

use crate::db::{fmt_date, fmt_datetime};
use crate::domain::break_log::BreakLog;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sql_builder::{date_col, datetime_col, opt_datetime_col};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex, MutexGuard};

const BREAK_LOG_COLUMNS: &str = "break_id, driver_id, shift_date, break_number, \
     start_time, end_time, duration_minutes, replaced_by_driver_id";

pub struct BreakLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl BreakLogRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新增（开启）休息记录
    ///
    /// # 返回
    /// - Err(UniqueConstraintViolation): 该司机已有未结束记录
    pub fn insert_in(conn: &Connection, log: &BreakLog) -> RepositoryResult<()> {
        conn.execute(
            r#"
            INSERT INTO break_logs (
                break_id, driver_id, shift_date, break_number,
                start_time, end_time, duration_minutes, replaced_by_driver_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                log.break_id,
                log.driver_id,
                fmt_date(&log.shift_date),
                log.break_number,
                fmt_datetime(&log.start_time),
                log.end_time.as_ref().map(fmt_datetime),
                log.duration_minutes,
                log.replaced_by_driver_id,
            ],
        )?;
        Ok(())
    }

    /// 查询司机最近一条未结束记录
    pub fn find_open_for_driver_in(
        conn: &Connection,
        driver_id: &str,
    ) -> RepositoryResult<Option<BreakLog>> {
        let sql = format!(
            "SELECT {} FROM break_logs WHERE driver_id = ?1 AND end_time IS NULL \
             ORDER BY start_time DESC LIMIT 1",
            BREAK_LOG_COLUMNS
        );
        let log = conn
            .query_row(&sql, params![driver_id], Self::map_row)
            .optional()?;
        Ok(log)
    }

    /// 关闭休息记录
    pub fn close_in(
        conn: &Connection,
        break_id: &str,
        end_time: NaiveDateTime,
        duration_minutes: f64,
    ) -> RepositoryResult<()> {
        let rows = conn.execute(
            "UPDATE break_logs SET end_time = ?2, duration_minutes = ?3 \
             WHERE break_id = ?1 AND end_time IS NULL",
            params![break_id, fmt_datetime(&end_time), duration_minutes],
        )?;
        if rows == 0 {
            return Err(RepositoryError::NotFound {
                entity: "BreakLog".to_string(),
                id: break_id.to_string(),
            });
        }
        Ok(())
    }

    /// 查询司机全部休息记录（按开始时间升序）
    pub fn list_for_driver(&self, driver_id: &str) -> RepositoryResult<Vec<BreakLog>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM break_logs WHERE driver_id = ?1 ORDER BY start_time ASC, break_number ASC",
            BREAK_LOG_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let logs = stmt
            .query_map(params![driver_id], Self::map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(logs)
    }

    /// 统计司机未结束记录数（正常情况下为 0 或 1）
    pub fn count_open_for_driver(&self, driver_id: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM break_logs WHERE driver_id = ?1 AND end_time IS NULL",
            params![driver_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<BreakLog> {
        Ok(BreakLog {
            break_id: row.get(0)?,
            driver_id: row.get(1)?,
            shift_date: date_col(row, 2)?,
            break_number: row.get(3)?,
            start_time: datetime_col(row, 4)?,
            end_time: opt_datetime_col(row, 5)?,
            duration_minutes: row.get(6)?,
            replaced_by_driver_id: row.get(7)?,
        })
    }
}
