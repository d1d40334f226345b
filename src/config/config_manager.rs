// ==========================================
// 公交轮班调度系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::rotation_config_trait::RotationConfigReader;
use crate::config::settings::{config_keys, parse_time_of_day, ConfigError, RotationSettings};
use crate::db::open_sqlite_connection;
use async_trait::async_trait;
use chrono::NaiveTime;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

/// 全局作用域
pub const GLOBAL_SCOPE: &str = "global";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, ConfigError> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> Result<MutexGuard<'_, Connection>, ConfigError> {
        self.conn
            .lock()
            .map_err(|e| ConfigError::Database(format!("锁获取失败: {}", e)))
    }

    /// 读取 global scope 的配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, ConfigError> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![GLOBAL_SCOPE, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入（覆盖）global scope 的配置值
    pub fn set_config_value(&self, key: &str, value: &str) -> Result<(), ConfigError> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES (?1, ?2, ?3, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![GLOBAL_SCOPE, key, value],
        )?;
        tracing::info!(key = key, value = value, "配置已更新");
        Ok(())
    }

    /// 删除 global scope 的配置值（恢复默认）
    pub fn remove_config_value(&self, key: &str) -> Result<bool, ConfigError> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM config_kv WHERE scope_id = ?1 AND key = ?2",
            params![GLOBAL_SCOPE, key],
        )?;
        Ok(affected > 0)
    }

    /// 获取所有配置的快照（JSON格式）
    ///
    /// # 用途
    /// - 生成排班时写入审计记录，便于追溯当时生效的参数
    pub fn get_config_snapshot(&self) -> Result<serde_json::Value, ConfigError> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;
        let rows = stmt.query_map(params![GLOBAL_SCOPE], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        serde_json::to_value(config_map).map_err(|e| ConfigError::Database(e.to_string()))
    }

    /// 读取数值配置，缺省返回默认值
    fn get_number_or<T: FromStr>(&self, key: &str, default: T) -> Result<T, ConfigError> {
        match self.get_global_config_value(key)? {
            None => Ok(default),
            Some(raw) => raw.trim().parse::<T>().map_err(|_| ConfigError::Parse {
                key: key.to_string(),
                value: raw,
            }),
        }
    }

    /// 读取时刻配置 (HH:MM)，缺省返回默认值
    fn get_time_or(&self, key: &str, default: NaiveTime) -> Result<NaiveTime, ConfigError> {
        match self.get_global_config_value(key)? {
            None => Ok(default),
            Some(raw) => parse_time_of_day(key, &raw),
        }
    }

    /// 同步装配调度参数（供非 async 调用方使用，如启动时计算定时任务时刻）
    pub fn read_settings(&self) -> Result<RotationSettings, ConfigError> {
        let d = RotationSettings::default();
        let settings = RotationSettings {
            min_trips_before_break: self
                .get_number_or(config_keys::MIN_TRIPS_BEFORE_BREAK, d.min_trips_before_break)?,
            break_time_per_shift_minutes: self.get_number_or(
                config_keys::BREAK_TIME_PER_SHIFT_MINUTES,
                d.break_time_per_shift_minutes,
            )?,
            dispatch_frequency_minutes: self.get_number_or(
                config_keys::DISPATCH_FREQUENCY_MINUTES,
                d.dispatch_frequency_minutes,
            )?,
            morning_shift_start: self
                .get_time_or(config_keys::MORNING_SHIFT_START, d.morning_shift_start)?,
            morning_shift_end: self.get_time_or(config_keys::MORNING_SHIFT_END, d.morning_shift_end)?,
            dispatch_window_end: self
                .get_time_or(config_keys::DISPATCH_WINDOW_END, d.dispatch_window_end)?,
            daily_generation_time: self
                .get_time_or(config_keys::DAILY_GENERATION_TIME, d.daily_generation_time)?,
        };
        settings.validate()?;
        Ok(settings)
    }
}

#[async_trait]
impl RotationConfigReader for ConfigManager {
    async fn load_settings(&self) -> Result<RotationSettings, ConfigError> {
        self.read_settings()
    }

    async fn get_min_trips_before_break(&self) -> Result<i32, ConfigError> {
        self.get_number_or(config_keys::MIN_TRIPS_BEFORE_BREAK, 1)
    }

    async fn get_break_time_per_shift_minutes(&self) -> Result<f64, ConfigError> {
        self.get_number_or(config_keys::BREAK_TIME_PER_SHIFT_MINUTES, 60.0)
    }

    async fn get_config_snapshot(&self) -> Result<serde_json::Value, ConfigError> {
        ConfigManager::get_config_snapshot(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;

    fn manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn)))
    }

    #[test]
    fn test_defaults_when_table_empty() {
        let m = manager();
        assert_eq!(m.read_settings().unwrap(), RotationSettings::default());
    }

    #[test]
    fn test_override_and_snapshot() {
        let m = manager();
        m.set_config_value(config_keys::DISPATCH_FREQUENCY_MINUTES, "30").unwrap();
        m.set_config_value(config_keys::DISPATCH_FREQUENCY_MINUTES, "45").unwrap();
        m.set_config_value(config_keys::DISPATCH_WINDOW_END, "13:30").unwrap();

        let s = m.read_settings().unwrap();
        assert_eq!(s.dispatch_frequency_minutes, 45);
        assert_eq!(s.dispatch_window_end, NaiveTime::from_hms_opt(13, 30, 0).unwrap());

        let snapshot = m.get_config_snapshot().unwrap();
        assert_eq!(snapshot["dispatch_frequency_minutes"], "45");
        assert_eq!(snapshot["dispatch_window_end"], "13:30");
    }

    #[test]
    fn test_unparseable_value_is_reported() {
        let m = manager();
        m.set_config_value(config_keys::MIN_TRIPS_BEFORE_BREAK, "two").unwrap();
        match m.read_settings() {
            Err(ConfigError::Parse { key, value }) => {
                assert_eq!(key, config_keys::MIN_TRIPS_BEFORE_BREAK);
                assert_eq!(value, "two");
            }
            other => panic!("期望解析错误，实际: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_combination_is_rejected() {
        let m = manager();
        m.set_config_value(config_keys::DISPATCH_FREQUENCY_MINUTES, "-5").unwrap();
        assert!(matches!(m.read_settings(), Err(ConfigError::Invalid(_))));
    }
}
