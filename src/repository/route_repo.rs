// ==========================================
// 公交轮班调度系统 - 线路数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::db::fmt_datetime;
use crate::domain::fleet::Route;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sql_builder::datetime_col;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex, MutexGuard};

const ROUTE_COLUMNS: &str = "route_id, name, start_location, end_location, \
     estimated_time_minutes, turnaround_time_minutes, is_active, created_at";

// ==========================================
// RouteRepository - 线路仓储
// ==========================================
pub struct RouteRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RouteRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新增线路
    pub fn insert(&self, route: &Route) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        Self::insert_in(&conn, route)
    }

    pub fn insert_in(conn: &Connection, route: &Route) -> RepositoryResult<()> {
        conn.execute(
            r#"
            INSERT INTO routes (
                route_id, name, start_location, end_location,
                estimated_time_minutes, turnaround_time_minutes, is_active, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                route.route_id,
                route.name,
                route.start_location,
                route.end_location,
                route.estimated_time_minutes,
                route.turnaround_time_minutes,
                route.is_active,
                fmt_datetime(&route.created_at),
            ],
        )?;
        Ok(())
    }

    /// 按 ID 查询线路
    pub fn find_by_id(&self, route_id: &str) -> RepositoryResult<Option<Route>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM routes WHERE route_id = ?1", ROUTE_COLUMNS);
        let route = conn
            .query_row(&sql, params![route_id], Self::map_row)
            .optional()?;
        Ok(route)
    }

    /// 查询全部启用线路
    ///
    /// # 排序
    /// - created_at, route_id 升序（保证同一数据集下的生成结果确定）
    pub fn list_active_in(conn: &Connection) -> RepositoryResult<Vec<Route>> {
        let sql = format!(
            "SELECT {} FROM routes WHERE is_active = 1 ORDER BY created_at ASC, route_id ASC",
            ROUTE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let routes = stmt
            .query_map([], Self::map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(routes)
    }

    pub fn list_active(&self) -> RepositoryResult<Vec<Route>> {
        let conn = self.get_conn()?;
        Self::list_active_in(&conn)
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<Route> {
        Ok(Route {
            route_id: row.get(0)?,
            name: row.get(1)?,
            start_location: row.get(2)?,
            end_location: row.get(3)?,
            estimated_time_minutes: row.get(4)?,
            turnaround_time_minutes: row.get(5)?,
            is_active: row.get(6)?,
            created_at: datetime_col(row, 7)?,
        })
    }
}
