// ==========================================
// 公交轮班调度系统 - 班次数据仓储
// ==========================================
// 日期归属: 以 scheduled_start 所在自然日为准
// ==========================================

use crate::db::{day_bounds, fmt_datetime};
use crate::domain::trip::{Trip, TripView};
use crate::domain::types::{TripDirection, TripStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sql_builder::{datetime_col, delete_where_in, enum_col};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex, MutexGuard};

const TRIP_COLUMNS: &str = "trip_id, trip_number, route_id, driver_id, vehicle_id, \
     assignment_id, direction, status, scheduled_start, scheduled_end, created_at";

pub struct TripRepository {
    conn: Arc<Mutex<Connection>>,
}

impl TripRepository {
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

    pub fn insert_in(conn: &Connection, trip: &Trip) -> RepositoryResult<()> {
        conn.execute(
            r#"
            INSERT INTO trips (
                trip_id, trip_number, route_id, driver_id, vehicle_id,
                assignment_id, direction, status, scheduled_start, scheduled_end, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                trip.trip_id,
                trip.trip_number,
                trip.route_id,
                trip.driver_id,
                trip.vehicle_id,
                trip.assignment_id,
                trip.direction.to_db_str(),
                trip.status.to_db_str(),
                fmt_datetime(&trip.scheduled_start),
                fmt_datetime(&trip.scheduled_end),
                fmt_datetime(&trip.created_at),
            ],
        )?;
        Ok(())
    }

    /// 批量插入（调用方负责事务）
    pub fn batch_insert_in(conn: &Connection, trips: &[Trip]) -> RepositoryResult<usize> {
        for trip in trips {
            Self::insert_in(conn, trip)?;
        }
        Ok(trips.len())
    }

    pub fn delete_by_ids_in(conn: &Connection, ids: &[String]) -> RepositoryResult<usize> {
        Ok(delete_where_in(conn, "trips", "trip_id", ids)?)
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 统计某日班次数
    pub fn count_for_date_in(conn: &Connection, date: NaiveDate) -> RepositoryResult<i64> {
        let (start, end) = day_bounds(date);
        let count = conn.query_row(
            "SELECT COUNT(*) FROM trips WHERE scheduled_start >= ?1 AND scheduled_start < ?2",
            params![start, end],
            |row| row.get::<_, i64>(0),
        )?;
        Ok(count)
    }

    pub fn list_ids_for_date_in(conn: &Connection, date: NaiveDate) -> RepositoryResult<Vec<String>> {
        let (start, end) = day_bounds(date);
        let mut stmt = conn.prepare(
            "SELECT trip_id FROM trips WHERE scheduled_start >= ?1 AND scheduled_start < ?2",
        )?;
        let ids = stmt
            .query_map(params![start, end], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ids)
    }

    /// 查询某日全部班次（按计划开始时间、线路排序）
    pub fn list_for_date(&self, date: NaiveDate) -> RepositoryResult<Vec<Trip>> {
        let conn = self.get_conn()?;
        Self::list_for_date_in(&conn, date)
    }

    pub fn list_for_date_in(conn: &Connection, date: NaiveDate) -> RepositoryResult<Vec<Trip>> {
        let (start, end) = day_bounds(date);
        let sql = format!(
            "SELECT {} FROM trips WHERE scheduled_start >= ?1 AND scheduled_start < ?2 \
             ORDER BY scheduled_start ASC, route_id ASC, direction DESC",
            TRIP_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let trips = stmt
            .query_map(params![start, end], Self::map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(trips)
    }

    /// 查询某日班次展示视图（关联线路名与起止站）
    pub fn list_views_for_date(&self, date: NaiveDate) -> RepositoryResult<Vec<TripView>> {
        let conn = self.get_conn()?;
        let (start, end) = day_bounds(date);
        let mut stmt = conn.prepare(
            r#"
            SELECT t.trip_id, t.trip_number, t.status, t.direction,
                   r.name, r.start_location, r.end_location,
                   t.driver_id, t.vehicle_id, t.scheduled_start, t.scheduled_end
            FROM trips t
            JOIN routes r ON r.route_id = t.route_id
            WHERE t.scheduled_start >= ?1 AND t.scheduled_start < ?2
            ORDER BY t.scheduled_start ASC, r.name ASC
            "#,
        )?;
        let views = stmt
            .query_map(params![start, end], |row| {
                let direction = enum_col(row, 3, TripDirection::from_db_str)?;
                let start_location: String = row.get(5)?;
                let end_location: String = row.get(6)?;
                let (origin, destination) = match direction {
                    TripDirection::Outbound => (start_location, end_location),
                    TripDirection::Inbound => (end_location, start_location),
                };
                Ok(TripView {
                    trip_id: row.get(0)?,
                    trip_number: row.get(1)?,
                    status: enum_col(row, 2, TripStatus::from_db_str)?,
                    direction,
                    route_name: row.get(4)?,
                    origin,
                    destination,
                    driver_id: row.get(7)?,
                    vehicle_id: row.get(8)?,
                    scheduled_start: datetime_col(row, 9)?,
                    scheduled_end: datetime_col(row, 10)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(views)
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<Trip> {
        Ok(Trip {
            trip_id: row.get(0)?,
            trip_number: row.get(1)?,
            route_id: row.get(2)?,
            driver_id: row.get(3)?,
            vehicle_id: row.get(4)?,
            assignment_id: row.get(5)?,
            direction: enum_col(row, 6, TripDirection::from_db_str)?,
            status: enum_col(row, 7, TripStatus::from_db_str)?,
            scheduled_start: datetime_col(row, 8)?,
            scheduled_end: datetime_col(row, 9)?,
            created_at: datetime_col(row, 10)?,
        })
    }
}
