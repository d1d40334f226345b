// ==========================================
// 公交轮班调度系统 - 休息记录领域模型
// ==========================================
// 对齐: break_logs 表
// 红线: 每个司机同一时刻最多一条未结束记录; 记录只关闭不删除
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// BreakLog - 休息记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakLog {
    pub break_id: String,
    pub driver_id: String,
    pub shift_date: NaiveDate,
    pub break_number: i32,
    pub start_time: NaiveDateTime,
    pub end_time: Option<NaiveDateTime>,
    pub duration_minutes: Option<f64>,
    pub replaced_by_driver_id: Option<String>,
}

impl BreakLog {
    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }
}

// ==========================================
// BreakStatus - 休息额度与资格快照
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakStatus {
    pub driver_id: String,
    pub break_time_remaining: f64,
    pub total_break_time_today: f64,
    pub trips_since_last_break: i32,
    pub current_break_number: i32,
    pub on_break: bool,
    pub is_eligible: bool,
}
