// ==========================================
// 公交轮班调度系统 - 班次领域模型
// ==========================================
// 对齐: trips / tickets / position_logs 表
// 红线: scheduled_start < scheduled_end
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{TripDirection, TripStatus};

// ==========================================
// Trip - 班次
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub trip_id: String,
    pub trip_number: String, // 展示编号,如 RIV-0600-O,不保证唯一
    pub route_id: String,
    pub driver_id: String,
    pub vehicle_id: String,
    pub assignment_id: Option<String>,
    pub direction: TripDirection,
    pub status: TripStatus,
    pub scheduled_start: NaiveDateTime,
    pub scheduled_end: NaiveDateTime,
    pub created_at: NaiveDateTime,
}

impl Trip {
    /// 计划时长（分钟）
    pub fn duration_minutes(&self) -> i64 {
        (self.scheduled_end - self.scheduled_start).num_minutes()
    }

    /// 两个班次的计划时间窗是否重叠（首尾相接不算重叠）
    pub fn overlaps(&self, other: &Trip) -> bool {
        self.scheduled_start < other.scheduled_end && other.scheduled_start < self.scheduled_end
    }
}

// ==========================================
// TripView - 班次展示视图
// ==========================================
// 起止站按方向推导: 去程 起点->终点, 回程 终点->起点
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripView {
    pub trip_id: String,
    pub trip_number: String,
    pub status: TripStatus,
    pub direction: TripDirection,
    pub route_name: String,
    pub origin: String,
    pub destination: String,
    pub driver_id: String,
    pub vehicle_id: String,
    pub scheduled_start: NaiveDateTime,
    pub scheduled_end: NaiveDateTime,
}

// ==========================================
// Ticket - 车票（依赖 trip）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub ticket_id: String,
    pub trip_id: String,
    pub passenger_name: Option<String>,
    pub seat_number: Option<String>,
    pub price: f64,
    pub status: String,
    pub purchase_time: NaiveDateTime,
}

// ==========================================
// PositionLog - 车辆位置记录（可关联 trip）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionLog {
    pub position_id: String,
    pub vehicle_id: String,
    pub trip_id: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub speed: f64,
    pub recorded_at: NaiveDateTime,
}
