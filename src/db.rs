// ==========================================
// 公交轮班调度系统 - SQLite 连接初始化与建表
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键、busy_timeout）
// - 统一时间/日期的 TEXT 存储格式
// - 幂等建表，记录 schema_version
// ==========================================

use chrono::{Local, NaiveDate, NaiveDateTime, Timelike};
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 时间戳存储格式（毫秒，定长，字符串比较即时间比较）
pub const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// 日期存储格式
pub const DATE_FMT: &str = "%Y-%m-%d";

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置，多个连接争用写锁时依赖它排队
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 初始化全部表结构（幂等）
///
/// # 说明
/// - break_logs 上的部分唯一索引保证每个司机最多一条未结束休息记录
/// - rotation_assignments 的唯一约束保证 (线路, 班制, 位次, 日期) 唯一
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 格式化时间戳为存储字符串
pub fn fmt_datetime(dt: &NaiveDateTime) -> String {
    dt.format(DATETIME_FMT).to_string()
}

/// 格式化日期为存储字符串
pub fn fmt_date(d: &NaiveDate) -> String {
    d.format(DATE_FMT).to_string()
}

/// 解析存储的时间戳（兼容不带毫秒的旧数据）
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f").ok()
}

/// 解析存储的日期
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FMT).ok()
}

/// 本地当前时间，截断到毫秒（与存储精度一致）
pub fn now_local() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(now.nanosecond() / 1_000_000 * 1_000_000)
        .unwrap_or(now)
}

/// 某日 [00:00, 次日 00:00) 的存储字符串区间
pub fn day_bounds(date: NaiveDate) -> (String, String) {
    let start = date.and_time(chrono::NaiveTime::MIN);
    let end = start + chrono::Duration::days(1);
    (fmt_datetime(&start), fmt_datetime(&end))
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id TEXT NOT NULL,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

CREATE TABLE IF NOT EXISTS routes (
    route_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    start_location TEXT NOT NULL,
    end_location TEXT NOT NULL,
    estimated_time_minutes REAL NOT NULL CHECK (estimated_time_minutes > 0),
    turnaround_time_minutes REAL NOT NULL DEFAULT 0 CHECK (turnaround_time_minutes >= 0),
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS drivers (
    driver_id TEXT PRIMARY KEY,
    full_name TEXT NOT NULL,
    license_number TEXT NOT NULL UNIQUE,
    status TEXT NOT NULL DEFAULT 'ACTIVE',
    break_time_remaining REAL NOT NULL DEFAULT 60 CHECK (break_time_remaining >= 0),
    total_break_time_today REAL NOT NULL DEFAULT 0,
    break_start_time TEXT,
    trips_since_last_break INTEGER NOT NULL DEFAULT 0,
    current_break_number INTEGER NOT NULL DEFAULT 0,
    total_trips_today INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS vehicles (
    vehicle_id TEXT PRIMARY KEY,
    plate_number TEXT NOT NULL UNIQUE,
    model TEXT NOT NULL,
    capacity INTEGER NOT NULL DEFAULT 0,
    status TEXT NOT NULL DEFAULT 'FREE',
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS rotation_assignments (
    assignment_id TEXT PRIMARY KEY,
    route_id TEXT NOT NULL REFERENCES routes(route_id),
    driver_id TEXT NOT NULL REFERENCES drivers(driver_id),
    vehicle_id TEXT NOT NULL REFERENCES vehicles(vehicle_id),
    shift_type TEXT NOT NULL,
    position TEXT NOT NULL,
    shift_date TEXT NOT NULL,
    shift_start_time TEXT NOT NULL,
    shift_end_time TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    UNIQUE (route_id, shift_type, position, shift_date)
);
CREATE INDEX IF NOT EXISTS idx_assignments_date ON rotation_assignments(shift_date);

CREATE TABLE IF NOT EXISTS trips (
    trip_id TEXT PRIMARY KEY,
    trip_number TEXT NOT NULL,
    route_id TEXT NOT NULL REFERENCES routes(route_id),
    driver_id TEXT NOT NULL REFERENCES drivers(driver_id),
    vehicle_id TEXT NOT NULL REFERENCES vehicles(vehicle_id),
    assignment_id TEXT REFERENCES rotation_assignments(assignment_id),
    direction TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'SCHEDULED',
    scheduled_start TEXT NOT NULL,
    scheduled_end TEXT NOT NULL,
    created_at TEXT NOT NULL,
    CHECK (scheduled_start < scheduled_end)
);
CREATE INDEX IF NOT EXISTS idx_trips_start ON trips(scheduled_start);

CREATE TABLE IF NOT EXISTS tickets (
    ticket_id TEXT PRIMARY KEY,
    trip_id TEXT NOT NULL REFERENCES trips(trip_id),
    passenger_name TEXT,
    seat_number TEXT,
    price REAL NOT NULL DEFAULT 0,
    status TEXT NOT NULL DEFAULT 'BOOKED',
    purchase_time TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS position_logs (
    position_id TEXT PRIMARY KEY,
    vehicle_id TEXT NOT NULL REFERENCES vehicles(vehicle_id),
    trip_id TEXT REFERENCES trips(trip_id),
    latitude REAL NOT NULL,
    longitude REAL NOT NULL,
    speed REAL NOT NULL DEFAULT 0,
    recorded_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS driver_exchanges (
    exchange_id TEXT PRIMARY KEY,
    assignment_id TEXT NOT NULL REFERENCES rotation_assignments(assignment_id),
    outgoing_driver_id TEXT NOT NULL REFERENCES drivers(driver_id),
    incoming_driver_id TEXT NOT NULL REFERENCES drivers(driver_id),
    reason TEXT NOT NULL,
    exchange_time TEXT NOT NULL,
    return_time TEXT,
    trip_id TEXT REFERENCES trips(trip_id),
    notes TEXT
);

CREATE TABLE IF NOT EXISTS break_logs (
    break_id TEXT PRIMARY KEY,
    driver_id TEXT NOT NULL REFERENCES drivers(driver_id),
    shift_date TEXT NOT NULL,
    break_number INTEGER NOT NULL,
    start_time TEXT NOT NULL,
    end_time TEXT,
    duration_minutes REAL,
    replaced_by_driver_id TEXT REFERENCES drivers(driver_id)
);
CREATE UNIQUE INDEX IF NOT EXISTS uq_break_logs_open
    ON break_logs(driver_id) WHERE end_time IS NULL;

CREATE TABLE IF NOT EXISTS audit_logs (
    audit_id TEXT PRIMARY KEY,
    actor TEXT,
    action TEXT NOT NULL,
    entity_type TEXT NOT NULL,
    entity_id TEXT,
    old_values TEXT,
    new_values TEXT,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_audit_logs_entity ON audit_logs(entity_type, entity_id);
"#;
