// ==========================================
// 公交轮班调度系统 - SQL 构建与行映射工具
// ==========================================
// 职责: IN 子句构建、按 ID 集合分块批量删除、TEXT 列到领域类型的转换
// ==========================================

use crate::db::{parse_date, parse_datetime};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::Type;
use rusqlite::{Connection, Row};

/// 单条语句最多绑定的 ID 数量（低于 SQLite 默认变量上限）
pub const DELETE_CHUNK_SIZE: usize = 500;

/// 构建 IN 子句
///
/// # 参数
/// - `column`: 列名
/// - `count`: 占位符数量
///
/// # 返回
/// - `column IN (?, ?, ...)`；count 为 0 时返回恒假条件 `1 = 0`
///
/// # 示例
/// ```
/// use transit_rotation::repository::sql_builder::build_in_clause;
///
/// assert_eq!(build_in_clause("trip_id", 3), "trip_id IN (?, ?, ?)");
/// assert_eq!(build_in_clause("trip_id", 0), "1 = 0");
/// ```
pub fn build_in_clause(column: &str, count: usize) -> String {
    if count == 0 {
        return "1 = 0".to_string();
    }
    let placeholders = vec!["?"; count].join(", ");
    format!("{} IN ({})", column, placeholders)
}

/// 按 ID 集合批量删除
///
/// # 参数
/// - `conn`: 数据库连接（通常为事务）
/// - `table_name`: 目标表名
/// - `column`: 过滤列名
/// - `ids`: ID 列表，为空时不执行任何语句
///
/// # 返回
/// - 成功: 受影响的总行数
pub fn delete_where_in(
    conn: &Connection,
    table_name: &str,
    column: &str,
    ids: &[String],
) -> rusqlite::Result<usize> {
    let mut affected = 0;
    for chunk in ids.chunks(DELETE_CHUNK_SIZE) {
        let sql = format!(
            "DELETE FROM {} WHERE {}",
            table_name,
            build_in_clause(column, chunk.len())
        );
        affected += conn.execute(&sql, rusqlite::params_from_iter(chunk.iter()))?;
    }
    Ok(affected)
}

/// 读取枚举列（非法字符串转换为 FromSqlConversionFailure）
pub fn enum_col<T>(row: &Row<'_>, idx: usize, parse: fn(&str) -> Option<T>) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    parse(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("无法识别的枚举值: {}", raw).into(),
        )
    })
}

/// 读取时间戳列
pub fn datetime_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let raw: String = row.get(idx)?;
    parse_datetime(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("无法解析的时间戳: {}", raw).into(),
        )
    })
}

/// 读取可空时间戳列
pub fn opt_datetime_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<NaiveDateTime>> {
    match row.get::<_, Option<String>>(idx)? {
        None => Ok(None),
        Some(raw) => parse_datetime(&raw).map(Some).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                Type::Text,
                format!("无法解析的时间戳: {}", raw).into(),
            )
        }),
    }
}

/// 读取日期列
pub fn date_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    parse_date(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("无法解析的日期: {}", raw).into(),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_in_clause_empty() {
        assert_eq!(build_in_clause("id", 0), "1 = 0");
        assert_eq!(build_in_clause("id", 1), "id IN (?)");
    }

    #[test]
    fn test_delete_where_in_chunks() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (id TEXT PRIMARY KEY)").unwrap();
        let ids: Vec<String> = (0..1203).map(|i| format!("id-{}", i)).collect();
        for id in &ids {
            conn.execute("INSERT INTO t (id) VALUES (?1)", [id]).unwrap();
        }

        let removed = delete_where_in(&conn, "t", "id", &ids[..1200]).unwrap();
        assert_eq!(removed, 1200);

        let left: i64 = conn.query_row("SELECT COUNT(*) FROM t", [], |r| r.get(0)).unwrap();
        assert_eq!(left, 3);
        assert_eq!(delete_where_in(&conn, "t", "id", &[]).unwrap(), 0);
    }

    #[test]
    fn test_enum_col_rejects_unknown_value() {
        let conn = Connection::open_in_memory().unwrap();
        let err = conn
            .query_row("SELECT 'SLEEPING'", [], |row| {
                enum_col(row, 0, crate::domain::types::DriverStatus::from_db_str)
            })
            .unwrap_err();
        assert!(matches!(err, rusqlite::Error::FromSqlConversionFailure(0, _, _)));
    }
}
