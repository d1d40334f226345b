// ==========================================
// 公交轮班调度系统 - 班次从属记录仓储
// ==========================================
// 覆盖: tickets / position_logs / driver_exchanges
// 用途: 重建排班前按 ID 集合清理从属记录
// ==========================================

use crate::db::fmt_datetime;
use crate::domain::rotation::DriverExchange;
use crate::domain::trip::{PositionLog, Ticket};
use crate::repository::error::RepositoryResult;
use crate::repository::sql_builder::delete_where_in;
use rusqlite::{params, Connection};

// ==========================================
// TicketRepository - 车票
// ==========================================
pub struct TicketRepository;

impl TicketRepository {
    pub fn insert_in(conn: &Connection, ticket: &Ticket) -> RepositoryResult<()> {
        conn.execute(
            r#"
            INSERT INTO tickets (
                ticket_id, trip_id, passenger_name, seat_number, price, status, purchase_time
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                ticket.ticket_id,
                ticket.trip_id,
                ticket.passenger_name,
                ticket.seat_number,
                ticket.price,
                ticket.status,
                fmt_datetime(&ticket.purchase_time),
            ],
        )?;
        Ok(())
    }

    pub fn delete_by_trip_ids_in(conn: &Connection, trip_ids: &[String]) -> RepositoryResult<usize> {
        Ok(delete_where_in(conn, "tickets", "trip_id", trip_ids)?)
    }

    pub fn count_all_in(conn: &Connection) -> RepositoryResult<i64> {
        Ok(conn.query_row("SELECT COUNT(*) FROM tickets", [], |row| row.get(0))?)
    }
}

// ==========================================
// PositionLogRepository - 车辆位置记录
// ==========================================
pub struct PositionLogRepository;

impl PositionLogRepository {
    pub fn insert_in(conn: &Connection, log: &PositionLog) -> RepositoryResult<()> {
        conn.execute(
            r#"
            INSERT INTO position_logs (
                position_id, vehicle_id, trip_id, latitude, longitude, speed, recorded_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                log.position_id,
                log.vehicle_id,
                log.trip_id,
                log.latitude,
                log.longitude,
                log.speed,
                fmt_datetime(&log.recorded_at),
            ],
        )?;
        Ok(())
    }

    pub fn delete_by_trip_ids_in(conn: &Connection, trip_ids: &[String]) -> RepositoryResult<usize> {
        Ok(delete_where_in(conn, "position_logs", "trip_id", trip_ids)?)
    }

    pub fn count_all_in(conn: &Connection) -> RepositoryResult<i64> {
        Ok(conn.query_row("SELECT COUNT(*) FROM position_logs", [], |row| row.get(0))?)
    }
}

// ==========================================
// ExchangeRepository - 换班记录
// ==========================================
pub struct ExchangeRepository;

impl ExchangeRepository {
    pub fn insert_in(conn: &Connection, ex: &DriverExchange) -> RepositoryResult<()> {
        conn.execute(
            r#"
            INSERT INTO driver_exchanges (
                exchange_id, assignment_id, outgoing_driver_id, incoming_driver_id,
                reason, exchange_time, return_time, trip_id, notes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                ex.exchange_id,
                ex.assignment_id,
                ex.outgoing_driver_id,
                ex.incoming_driver_id,
                ex.reason.to_db_str(),
                fmt_datetime(&ex.exchange_time),
                ex.return_time.as_ref().map(fmt_datetime),
                ex.trip_id,
                ex.notes,
            ],
        )?;
        Ok(())
    }

    /// 删除引用任一分配或任一班次的换班记录
    ///
    /// # 说明
    /// - 两个集合都可能为空，为空的一侧不执行语句
    pub fn delete_by_assignment_or_trip_ids_in(
        conn: &Connection,
        assignment_ids: &[String],
        trip_ids: &[String],
    ) -> RepositoryResult<usize> {
        let mut affected = delete_where_in(conn, "driver_exchanges", "assignment_id", assignment_ids)?;
        affected += delete_where_in(conn, "driver_exchanges", "trip_id", trip_ids)?;
        Ok(affected)
    }

    pub fn count_all_in(conn: &Connection) -> RepositoryResult<i64> {
        Ok(conn.query_row("SELECT COUNT(*) FROM driver_exchanges", [], |row| row.get(0))?)
    }
}
