// ==========================================
// 公交轮班调度系统 - 轮班分配领域模型
// ==========================================
// 对齐: rotation_assignments / driver_exchanges 表
// 红线: (route, shift_type, position, shift_date) 唯一
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::types::{ReplacementReason, RotationPosition, ShiftType};

// ==========================================
// RotationAssignment - 轮班分配
// ==========================================
// 一个司机+车辆组合绑定到某线路某日某班次的某个位次
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RotationAssignment {
    pub assignment_id: String,
    pub route_id: String,
    pub driver_id: String,
    pub vehicle_id: String,
    pub shift_type: ShiftType,
    pub position: RotationPosition,
    pub shift_date: NaiveDate,
    pub shift_start_time: NaiveDateTime,
    pub shift_end_time: NaiveDateTime,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

// ==========================================
// DriverExchange - 换班记录
// ==========================================
// 仅有数据模型: 替班匹配算法尚未实现
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverExchange {
    pub exchange_id: String,
    pub assignment_id: String,
    pub outgoing_driver_id: String,
    pub incoming_driver_id: String,
    pub reason: ReplacementReason,
    pub exchange_time: NaiveDateTime,
    pub return_time: Option<NaiveDateTime>,
    pub trip_id: Option<String>,
    pub notes: Option<String>,
}
