// ==========================================
// 公交轮班调度系统 - 审计日志数据仓储
// ==========================================
// 红线: 审计写入与业务写入处于同一事务（调用方传入事务）
// ==========================================

use crate::db::fmt_datetime;
use crate::domain::audit_log::AuditLog;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sql_builder::datetime_col;
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex, MutexGuard};

pub struct AuditLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AuditLogRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入审计日志
    ///
    /// # 返回
    /// - `Ok(audit_id)`
    pub fn insert_in(conn: &Connection, log: &AuditLog) -> RepositoryResult<String> {
        conn.execute(
            r#"
            INSERT INTO audit_logs (
                audit_id, actor, action, entity_type, entity_id,
                old_values, new_values, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                log.audit_id,
                log.actor,
                log.action,
                log.entity_type,
                log.entity_id,
                log.old_values.as_ref().map(|v| v.to_string()),
                log.new_values.as_ref().map(|v| v.to_string()),
                fmt_datetime(&log.created_at),
            ],
        )?;
        Ok(log.audit_id.clone())
    }

    /// 按实体查询审计日志（按时间升序）
    pub fn list_by_entity(
        &self,
        entity_type: &str,
        entity_id: &str,
    ) -> RepositoryResult<Vec<AuditLog>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT audit_id, actor, action, entity_type, entity_id,
                   old_values, new_values, created_at
            FROM audit_logs
            WHERE entity_type = ?1 AND entity_id = ?2
            ORDER BY created_at ASC, rowid ASC
            "#,
        )?;
        let logs = stmt
            .query_map(params![entity_type, entity_id], Self::map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(logs)
    }

    /// 按操作类型查询审计日志
    pub fn list_by_action(&self, action: &str) -> RepositoryResult<Vec<AuditLog>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT audit_id, actor, action, entity_type, entity_id,
                   old_values, new_values, created_at
            FROM audit_logs
            WHERE action = ?1
            ORDER BY created_at ASC, rowid ASC
            "#,
        )?;
        let logs = stmt
            .query_map(params![action], Self::map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(logs)
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<AuditLog> {
        Ok(AuditLog {
            audit_id: row.get(0)?,
            actor: row.get(1)?,
            action: row.get(2)?,
            entity_type: row.get(3)?,
            entity_id: row.get(4)?,
            old_values: row
                .get::<_, Option<String>>(5)?
                .and_then(|s| serde_json::from_str(&s).ok()),
            new_values: row
                .get::<_, Option<String>>(6)?
                .and_then(|s| serde_json::from_str(&s).ok()),
            created_at: datetime_col(row, 7)?,
        })
    }
}
