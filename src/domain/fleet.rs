// ==========================================
// 公交轮班调度系统 - 线路/司机/车辆领域模型
// ==========================================
// 对齐: routes / drivers / vehicles 表
// 红线: 生成过程中线路数据只读
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{DriverStatus, VehicleStatus};

// ==========================================
// Route - 线路
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub route_id: String,
    pub name: String,
    pub start_location: String,
    pub end_location: String,
    pub estimated_time_minutes: f64,  // 单程预计耗时
    pub turnaround_time_minutes: f64, // 终点站折返最短停留
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

impl Route {
    /// 线路名前三个字母（大写），作为班次编号前缀
    pub fn code_prefix(&self) -> String {
        self.name.chars().take(3).collect::<String>().to_uppercase()
    }
}

// ==========================================
// Driver - 司机
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    pub driver_id: String,
    pub full_name: String,
    pub license_number: String,
    pub status: DriverStatus,

    // ===== 休息管理 =====
    pub break_time_remaining: f64,   // 剩余休息额度（分钟，非负）
    pub total_break_time_today: f64, // 今日已休息（分钟）
    pub break_start_time: Option<NaiveDateTime>,
    pub trips_since_last_break: i32,
    pub current_break_number: i32,

    // ===== 统计 =====
    pub total_trips_today: i32,

    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Driver {
    pub fn is_on_break(&self) -> bool {
        self.status == DriverStatus::OnBreak
    }
}

// ==========================================
// Vehicle - 车辆
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub vehicle_id: String,
    pub plate_number: String,
    pub model: String,
    pub capacity: i32,
    pub status: VehicleStatus,
    pub created_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn route(name: &str) -> Route {
        Route {
            route_id: "R1".to_string(),
            name: name.to_string(),
            start_location: "A".to_string(),
            end_location: "B".to_string(),
            estimated_time_minutes: 40.0,
            turnaround_time_minutes: 10.0,
            is_active: true,
            created_at: NaiveDate::from_ymd_opt(2026, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn test_code_prefix() {
        assert_eq!(route("Riverside Express").code_prefix(), "RIV");
        assert_eq!(route("ab").code_prefix(), "AB");
        assert_eq!(route("Ring Line").code_prefix(), "RIN");
    }
}
