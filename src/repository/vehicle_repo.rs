// ==========================================
// 公交轮班调度系统 - 车辆数据仓储
// ==========================================

use crate::db::fmt_datetime;
use crate::domain::fleet::Vehicle;
use crate::domain::types::VehicleStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sql_builder::{datetime_col, enum_col};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex, MutexGuard};

const VEHICLE_COLUMNS: &str = "vehicle_id, plate_number, model, capacity, status, created_at";

pub struct VehicleRepository {
    conn: Arc<Mutex<Connection>>,
}

impl VehicleRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn insert(&self, vehicle: &Vehicle) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        Self::insert_in(&conn, vehicle)
    }

    pub fn insert_in(conn: &Connection, vehicle: &Vehicle) -> RepositoryResult<()> {
        conn.execute(
            r#"
            INSERT INTO vehicles (vehicle_id, plate_number, model, capacity, status, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                vehicle.vehicle_id,
                vehicle.plate_number,
                vehicle.model,
                vehicle.capacity,
                vehicle.status.to_db_str(),
                fmt_datetime(&vehicle.created_at),
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id(&self, vehicle_id: &str) -> RepositoryResult<Option<Vehicle>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM vehicles WHERE vehicle_id = ?1", VEHICLE_COLUMNS);
        let vehicle = conn
            .query_row(&sql, params![vehicle_id], Self::map_row)
            .optional()?;
        Ok(vehicle)
    }

    /// 查询可参与排班的车辆（状态非 OUT_OF_SERVICE），按 created_at, vehicle_id 升序
    pub fn list_available_in(conn: &Connection) -> RepositoryResult<Vec<Vehicle>> {
        let sql = format!(
            "SELECT {} FROM vehicles WHERE status <> ?1 ORDER BY created_at ASC, vehicle_id ASC",
            VEHICLE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let vehicles = stmt
            .query_map(params![VehicleStatus::OutOfService.to_db_str()], Self::map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(vehicles)
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<Vehicle> {
        Ok(Vehicle {
            vehicle_id: row.get(0)?,
            plate_number: row.get(1)?,
            model: row.get(2)?,
            capacity: row.get(3)?,
            status: enum_col(row, 4, VehicleStatus::from_db_str)?,
            created_at: datetime_col(row, 5)?,
        })
    }
}
