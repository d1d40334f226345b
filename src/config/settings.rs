// ==========================================
// 公交轮班调度系统 - 调度参数
// ==========================================
// 职责: 排班/休息相关参数的强类型表示与校验
// 来源: config_kv 表 (scope_id = 'global')，缺省时使用默认值
// ==========================================

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ==========================================
// ConfigError - 配置层错误
// ==========================================
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置读取失败: {0}")]
    Database(String),

    #[error("配置值无法解析: key={key}, value={value}")]
    Parse { key: String, value: String },

    #[error("配置不合法: {0}")]
    Invalid(String),
}

impl From<rusqlite::Error> for ConfigError {
    fn from(err: rusqlite::Error) -> Self {
        ConfigError::Database(err.to_string())
    }
}

// ==========================================
// 配置键
// ==========================================
pub mod config_keys {
    // ===== 休息 =====
    pub const MIN_TRIPS_BEFORE_BREAK: &str = "min_trips_before_break";
    pub const BREAK_TIME_PER_SHIFT_MINUTES: &str = "break_time_per_shift_minutes";

    // ===== 发车 =====
    pub const DISPATCH_FREQUENCY_MINUTES: &str = "dispatch_frequency_minutes";
    pub const MORNING_SHIFT_START: &str = "morning_shift_start";
    pub const MORNING_SHIFT_END: &str = "morning_shift_end";
    pub const DISPATCH_WINDOW_END: &str = "dispatch_window_end";

    // ===== 定时任务 =====
    pub const DAILY_GENERATION_TIME: &str = "daily_generation_time";
}

/// 时刻配置的文本格式
pub const TIME_OF_DAY_FMT: &str = "%H:%M";

// ==========================================
// RotationSettings - 调度参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RotationSettings {
    /// 开始休息前至少完成的班次数
    pub min_trips_before_break: i32,
    /// 每个班次的休息额度（分钟）
    pub break_time_per_shift_minutes: f64,
    /// 发车间隔（分钟）
    pub dispatch_frequency_minutes: i64,
    /// 早班开始（同时为首班发车时刻）
    pub morning_shift_start: NaiveTime,
    /// 早班结束
    pub morning_shift_end: NaiveTime,
    /// 发车窗口上界: 发车时刻与回程开始都必须早于此时刻
    pub dispatch_window_end: NaiveTime,
    /// 每日自动生成时刻
    pub daily_generation_time: NaiveTime,
}

impl Default for RotationSettings {
    fn default() -> Self {
        Self {
            min_trips_before_break: 1,
            break_time_per_shift_minutes: 60.0,
            dispatch_frequency_minutes: 60,
            morning_shift_start: hm(6, 0),
            morning_shift_end: hm(15, 0),
            dispatch_window_end: hm(14, 0),
            daily_generation_time: hm(5, 30),
        }
    }
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

impl RotationSettings {
    /// 校验参数组合
    ///
    /// # 规则
    /// - 发车间隔 > 0
    /// - 早班开始 < 发车窗口上界 <= 早班结束
    /// - 最少班次数 >= 0，休息额度 >= 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dispatch_frequency_minutes <= 0 {
            return Err(ConfigError::Invalid(format!(
                "{} 必须大于 0，实际为 {}",
                config_keys::DISPATCH_FREQUENCY_MINUTES,
                self.dispatch_frequency_minutes
            )));
        }
        if self.morning_shift_start >= self.dispatch_window_end {
            return Err(ConfigError::Invalid(format!(
                "早班开始 {} 必须早于发车窗口上界 {}",
                self.morning_shift_start, self.dispatch_window_end
            )));
        }
        if self.dispatch_window_end > self.morning_shift_end {
            return Err(ConfigError::Invalid(format!(
                "发车窗口上界 {} 不能晚于早班结束 {}",
                self.dispatch_window_end, self.morning_shift_end
            )));
        }
        if self.min_trips_before_break < 0 {
            return Err(ConfigError::Invalid(format!(
                "{} 不能为负数",
                config_keys::MIN_TRIPS_BEFORE_BREAK
            )));
        }
        if self.break_time_per_shift_minutes.is_nan() || self.break_time_per_shift_minutes < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "{} 不能为负数",
                config_keys::BREAK_TIME_PER_SHIFT_MINUTES
            )));
        }
        Ok(())
    }
}

/// 解析 HH:MM 时刻
pub fn parse_time_of_day(key: &str, value: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(value.trim(), TIME_OF_DAY_FMT).map_err(|_| ConfigError::Parse {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        let s = RotationSettings::default();
        assert!(s.validate().is_ok());
        assert_eq!(s.min_trips_before_break, 1);
        assert_eq!(s.break_time_per_shift_minutes, 60.0);
        assert_eq!(s.dispatch_window_end, hm(14, 0));
        assert_eq!(s.daily_generation_time, hm(5, 30));
    }

    #[test]
    fn test_zero_frequency_rejected() {
        let s = RotationSettings {
            dispatch_frequency_minutes: 0,
            ..RotationSettings::default()
        };
        assert!(matches!(s.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_window_end_after_shift_end_rejected() {
        let s = RotationSettings {
            dispatch_window_end: hm(16, 0),
            ..RotationSettings::default()
        };
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_window_must_be_non_empty() {
        let s = RotationSettings {
            morning_shift_start: hm(14, 0),
            ..RotationSettings::default()
        };
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_parse_time_of_day() {
        assert_eq!(parse_time_of_day("k", "05:30").unwrap(), hm(5, 30));
        assert_eq!(parse_time_of_day("k", " 14:00 ").unwrap(), hm(14, 0));
        assert!(matches!(
            parse_time_of_day("k", "25:99"),
            Err(ConfigError::Parse { .. })
        ));
    }
}
