// ==========================================
// 公交轮班调度系统 - 轮班分配数据仓储
// ==========================================
// 红线: 只由生成流程写入，只由重建流程删除
// ==========================================

use crate::db::{fmt_date, fmt_datetime};
use crate::domain::rotation::RotationAssignment;
use crate::domain::types::{RotationPosition, ShiftType};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sql_builder::{date_col, datetime_col, delete_where_in, enum_col};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex, MutexGuard};

const ASSIGNMENT_COLUMNS: &str = "assignment_id, route_id, driver_id, vehicle_id, \
     shift_type, position, shift_date, shift_start_time, shift_end_time, is_active, created_at";

pub struct AssignmentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AssignmentRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新增轮班分配
    ///
    /// # 返回
    /// - Err(UniqueConstraintViolation): 同一 (线路, 班制, 位次, 日期) 已存在
    pub fn insert_in(conn: &Connection, a: &RotationAssignment) -> RepositoryResult<()> {
        conn.execute(
            r#"
            INSERT INTO rotation_assignments (
                assignment_id, route_id, driver_id, vehicle_id,
                shift_type, position, shift_date, shift_start_time, shift_end_time,
                is_active, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                a.assignment_id,
                a.route_id,
                a.driver_id,
                a.vehicle_id,
                a.shift_type.to_db_str(),
                a.position.to_db_str(),
                fmt_date(&a.shift_date),
                fmt_datetime(&a.shift_start_time),
                fmt_datetime(&a.shift_end_time),
                a.is_active,
                fmt_datetime(&a.created_at),
            ],
        )?;
        Ok(())
    }

    /// 查询某日全部分配 ID
    pub fn list_ids_for_date_in(conn: &Connection, date: NaiveDate) -> RepositoryResult<Vec<String>> {
        let mut stmt = conn.prepare(
            "SELECT assignment_id FROM rotation_assignments WHERE shift_date = ?1",
        )?;
        let ids = stmt
            .query_map(params![fmt_date(&date)], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ids)
    }

    /// 查询某日全部分配（按线路、班制、位次排序）
    pub fn list_for_date(&self, date: NaiveDate) -> RepositoryResult<Vec<RotationAssignment>> {
        let conn = self.get_conn()?;
        Self::list_for_date_in(&conn, date)
    }

    pub fn list_for_date_in(
        conn: &Connection,
        date: NaiveDate,
    ) -> RepositoryResult<Vec<RotationAssignment>> {
        let sql = format!(
            "SELECT {} FROM rotation_assignments WHERE shift_date = ?1 \
             ORDER BY route_id ASC, shift_type ASC, position ASC",
            ASSIGNMENT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![fmt_date(&date)], Self::map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// 按 ID 集合删除
    pub fn delete_by_ids_in(conn: &Connection, ids: &[String]) -> RepositoryResult<usize> {
        Ok(delete_where_in(conn, "rotation_assignments", "assignment_id", ids)?)
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<RotationAssignment> {
        Ok(RotationAssignment {
            assignment_id: row.get(0)?,
            route_id: row.get(1)?,
            driver_id: row.get(2)?,
            vehicle_id: row.get(3)?,
            shift_type: enum_col(row, 4, ShiftType::from_db_str)?,
            position: enum_col(row, 5, RotationPosition::from_db_str)?,
            shift_date: date_col(row, 6)?,
            shift_start_time: datetime_col(row, 7)?,
            shift_end_time: datetime_col(row, 8)?,
            is_active: row.get(9)?,
            created_at: datetime_col(row, 10)?,
        })
    }
}
