// ==========================================
// 公交轮班调度系统 - 领域类型定义
// ==========================================
// 存储格式: 数据库中以 SCREAMING_SNAKE_CASE 字符串保存
// 约定: 仅在仓储边界通过 to_db_str / from_db_str 转换
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 司机状态 (Driver Status)
// ==========================================
// ON_TRIP / OFF_DUTY 由外部流程设置,本系统只在 ACTIVE <-> ON_BREAK 之间迁移
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DriverStatus {
    Active,  // 可出车/候车
    OnTrip,  // 行车中
    OnBreak, // 休息中
    OffDuty, // 下班
}

impl fmt::Display for DriverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl DriverStatus {
    /// 从数据库字符串解析
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ACTIVE" => Some(DriverStatus::Active),
            "ON_TRIP" => Some(DriverStatus::OnTrip),
            "ON_BREAK" => Some(DriverStatus::OnBreak),
            "OFF_DUTY" => Some(DriverStatus::OffDuty),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            DriverStatus::Active => "ACTIVE",
            DriverStatus::OnTrip => "ON_TRIP",
            DriverStatus::OnBreak => "ON_BREAK",
            DriverStatus::OffDuty => "OFF_DUTY",
        }
    }
}

// ==========================================
// 车辆状态 (Vehicle Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleStatus {
    Free,         // 空闲
    Assigned,     // 已分配
    EnRoute,      // 运营中
    Maintenance,  // 保养
    OutOfService, // 停运
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl VehicleStatus {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "FREE" => Some(VehicleStatus::Free),
            "ASSIGNED" => Some(VehicleStatus::Assigned),
            "EN_ROUTE" => Some(VehicleStatus::EnRoute),
            "MAINTENANCE" => Some(VehicleStatus::Maintenance),
            "OUT_OF_SERVICE" => Some(VehicleStatus::OutOfService),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            VehicleStatus::Free => "FREE",
            VehicleStatus::Assigned => "ASSIGNED",
            VehicleStatus::EnRoute => "EN_ROUTE",
            VehicleStatus::Maintenance => "MAINTENANCE",
            VehicleStatus::OutOfService => "OUT_OF_SERVICE",
        }
    }
}

// ==========================================
// 班次状态 (Trip Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripStatus {
    Scheduled, // 已排班
    Active,    // 执行中
    Completed, // 已完成
    Cancelled, // 已取消
}

impl fmt::Display for TripStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl TripStatus {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "SCHEDULED" => Some(TripStatus::Scheduled),
            "ACTIVE" => Some(TripStatus::Active),
            "COMPLETED" => Some(TripStatus::Completed),
            "CANCELLED" => Some(TripStatus::Cancelled),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            TripStatus::Scheduled => "SCHEDULED",
            TripStatus::Active => "ACTIVE",
            TripStatus::Completed => "COMPLETED",
            TripStatus::Cancelled => "CANCELLED",
        }
    }
}

// ==========================================
// 行车方向 (Trip Direction)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripDirection {
    Outbound, // 去程: 起点 -> 终点
    Inbound,  // 回程: 终点 -> 起点
}

impl fmt::Display for TripDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl TripDirection {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "OUTBOUND" => Some(TripDirection::Outbound),
            "INBOUND" => Some(TripDirection::Inbound),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            TripDirection::Outbound => "OUTBOUND",
            TripDirection::Inbound => "INBOUND",
        }
    }

    /// 班次编号后缀
    pub fn suffix(&self) -> char {
        match self {
            TripDirection::Outbound => 'O',
            TripDirection::Inbound => 'I',
        }
    }
}

// ==========================================
// 班制 (Shift Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShiftType {
    Morning, // 早班
    Evening, // 晚班
}

impl fmt::Display for ShiftType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl ShiftType {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "MORNING" => Some(ShiftType::Morning),
            "EVENING" => Some(ShiftType::Evening),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            ShiftType::Morning => "MORNING",
            ShiftType::Evening => "EVENING",
        }
    }
}

// ==========================================
// 轮班位次 (Rotation Position)
// ==========================================
// DRIVER_3 预留给休息替班,生成流程不填充
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RotationPosition {
    #[serde(rename = "DRIVER_1")]
    Driver1,
    #[serde(rename = "DRIVER_2")]
    Driver2,
    #[serde(rename = "DRIVER_3")]
    Driver3,
}

impl fmt::Display for RotationPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl RotationPosition {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "DRIVER_1" => Some(RotationPosition::Driver1),
            "DRIVER_2" => Some(RotationPosition::Driver2),
            "DRIVER_3" => Some(RotationPosition::Driver3),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            RotationPosition::Driver1 => "DRIVER_1",
            RotationPosition::Driver2 => "DRIVER_2",
            RotationPosition::Driver3 => "DRIVER_3",
        }
    }
}

// ==========================================
// 换班原因 (Replacement Reason)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReplacementReason {
    Break,              // 休息替班
    EmergencyCrowding,  // 客流拥挤加派
    EmergencyBreakdown, // 车辆故障
    NoShow,             // 司机缺勤
}

impl fmt::Display for ReplacementReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl ReplacementReason {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "BREAK" => Some(ReplacementReason::Break),
            "EMERGENCY_CROWDING" => Some(ReplacementReason::EmergencyCrowding),
            "EMERGENCY_BREAKDOWN" => Some(ReplacementReason::EmergencyBreakdown),
            "NO_SHOW" => Some(ReplacementReason::NoShow),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            ReplacementReason::Break => "BREAK",
            ReplacementReason::EmergencyCrowding => "EMERGENCY_CROWDING",
            ReplacementReason::EmergencyBreakdown => "EMERGENCY_BREAKDOWN",
            ReplacementReason::NoShow => "NO_SHOW",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_status_db_strings() {
        for status in [
            DriverStatus::Active,
            DriverStatus::OnTrip,
            DriverStatus::OnBreak,
            DriverStatus::OffDuty,
        ] {
            assert_eq!(DriverStatus::from_db_str(status.to_db_str()), Some(status));
        }
        assert_eq!(DriverStatus::from_db_str("on_break"), Some(DriverStatus::OnBreak));
        assert_eq!(DriverStatus::from_db_str("SLEEPING"), None);
    }

    #[test]
    fn test_vehicle_status_unknown_is_none() {
        assert_eq!(VehicleStatus::from_db_str("OUT_OF_SERVICE"), Some(VehicleStatus::OutOfService));
        assert_eq!(VehicleStatus::from_db_str(""), None);
    }

    #[test]
    fn test_direction_suffix() {
        assert_eq!(TripDirection::Outbound.suffix(), 'O');
        assert_eq!(TripDirection::Inbound.suffix(), 'I');
    }

    #[test]
    fn test_serde_matches_db_encoding() {
        let json = serde_json::to_string(&RotationPosition::Driver2).unwrap();
        assert_eq!(json, "\"DRIVER_2\"");
        let json = serde_json::to_string(&DriverStatus::OnBreak).unwrap();
        assert_eq!(json, "\"ON_BREAK\"");
    }
}
