// ==========================================
// 公交轮班调度系统 - 轮班分配构建器
// ==========================================
// 职责: 为每条线路构建早班 DRIVER_1 / DRIVER_2 两个分配
// 说明: DRIVER_3 位次预留给休息替班，本构建器不填充
// ==========================================

use crate::config::RotationSettings;
use crate::domain::rotation::RotationAssignment;
use crate::domain::types::{RotationPosition, ShiftType};
use crate::engine::resource_pool::RouteCrew;
use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

const ON_DUTY_POSITIONS: [RotationPosition; 2] = [RotationPosition::Driver1, RotationPosition::Driver2];

pub struct AssignmentBuilder;

impl AssignmentBuilder {
    /// 构建某线路某日的早班分配
    ///
    /// # 参数
    /// - `crew`: 线路领取到的司机与车辆（至少 2 + 2）
    /// - `date`: 排班日期
    /// - `settings`: 提供早班起止时刻
    /// - `now`: 创建时间
    ///
    /// # 返回
    /// - 按位次排列的分配；第 i 名司机搭配第 i 辆车
    pub fn build(
        crew: &RouteCrew,
        date: NaiveDate,
        settings: &RotationSettings,
        now: NaiveDateTime,
    ) -> Vec<RotationAssignment> {
        let shift_start = date.and_time(settings.morning_shift_start);
        let shift_end = date.and_time(settings.morning_shift_end);

        crew.on_duty_drivers()
            .iter()
            .zip(crew.vehicles.iter())
            .zip(ON_DUTY_POSITIONS.iter())
            .map(|((driver, vehicle), position)| RotationAssignment {
                assignment_id: Uuid::new_v4().to_string(),
                route_id: crew.route.route_id.clone(),
                driver_id: driver.driver_id.clone(),
                vehicle_id: vehicle.vehicle_id.clone(),
                shift_type: ShiftType::Morning,
                position: *position,
                shift_date: date,
                shift_start_time: shift_start,
                shift_end_time: shift_end,
                is_active: true,
                created_at: now,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fleet::{Driver, Route, Vehicle};
    use crate::domain::types::{DriverStatus, VehicleStatus};
    use chrono::NaiveTime;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn crew(driver_count: usize) -> RouteCrew {
        let drivers = (1..=driver_count)
            .map(|i| Driver {
                driver_id: format!("D{}", i),
                full_name: format!("Driver {}", i),
                license_number: format!("L{}", i),
                status: DriverStatus::Active,
                break_time_remaining: 60.0,
                total_break_time_today: 0.0,
                break_start_time: None,
                trips_since_last_break: 0,
                current_break_number: 0,
                total_trips_today: 0,
                created_at: ts(),
                updated_at: ts(),
            })
            .collect();
        let vehicles = (1..=2)
            .map(|i| Vehicle {
                vehicle_id: format!("V{}", i),
                plate_number: format!("P{}", i),
                model: "Bus".to_string(),
                capacity: 40,
                status: VehicleStatus::Free,
                created_at: ts(),
            })
            .collect();
        RouteCrew {
            route: Route {
                route_id: "R1".to_string(),
                name: "Riverside Express".to_string(),
                start_location: "Harbor".to_string(),
                end_location: "Uptown".to_string(),
                estimated_time_minutes: 40.0,
                turnaround_time_minutes: 10.0,
                is_active: true,
                created_at: ts(),
            },
            drivers,
            vehicles,
        }
    }

    #[test]
    fn test_builds_two_morning_positions_only() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let assignments =
            AssignmentBuilder::build(&crew(3), date, &RotationSettings::default(), ts());

        assert_eq!(assignments.len(), 2, "第三名司机不应生成分配");
        assert_eq!(assignments[0].position, RotationPosition::Driver1);
        assert_eq!(assignments[0].driver_id, "D1");
        assert_eq!(assignments[0].vehicle_id, "V1");
        assert_eq!(assignments[1].position, RotationPosition::Driver2);
        assert_eq!(assignments[1].driver_id, "D2");
        assert_eq!(assignments[1].vehicle_id, "V2");

        for a in &assignments {
            assert_eq!(a.shift_type, ShiftType::Morning);
            assert_eq!(a.shift_date, date);
            assert_eq!(a.shift_start_time.time(), NaiveTime::from_hms_opt(6, 0, 0).unwrap());
            assert_eq!(a.shift_end_time.time(), NaiveTime::from_hms_opt(15, 0, 0).unwrap());
        }
        assert_ne!(assignments[0].assignment_id, assignments[1].assignment_id);
    }
}
