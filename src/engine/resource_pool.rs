// ==========================================
// 公交轮班调度系统 - 资源池选择器
// ==========================================
// 职责: 读取可用线路/司机/车辆，并按共享轮转游标切分给各线路
// 红线: 资源不足不是错误（返回空分配 + 告警日志）
// ==========================================

use crate::domain::fleet::{Driver, Route, Vehicle};
use crate::repository::{DriverRepository, RepositoryResult, RouteRepository, VehicleRepository};
use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, warn};

/// 每条线路领取的司机数（第 3 名为替班预备）
pub const DRIVERS_PER_ROUTE: usize = 3;
/// 每条线路领取的车辆数
pub const VEHICLES_PER_ROUTE: usize = 2;
/// 线路可排班的最少司机/车辆数
pub const MIN_CREW_SIZE: usize = 2;

// ==========================================
// 数据结构
// ==========================================

/// 原始资源池（已按确定顺序排列）
#[derive(Debug, Clone, Default)]
pub struct ResourcePools {
    pub routes: Vec<Route>,
    pub drivers: Vec<Driver>,
    pub vehicles: Vec<Vehicle>,
}

/// 某条线路领取到的资源
#[derive(Debug, Clone)]
pub struct RouteCrew {
    pub route: Route,
    pub drivers: Vec<Driver>,
    pub vehicles: Vec<Vehicle>,
}

impl RouteCrew {
    /// 上岗司机（前两名，对应 DRIVER_1 / DRIVER_2）
    pub fn on_duty_drivers(&self) -> &[Driver] {
        let n = self.drivers.len().min(MIN_CREW_SIZE);
        &self.drivers[..n]
    }

    /// 替班预备司机（第三名，不落库）
    pub fn standby_driver(&self) -> Option<&Driver> {
        self.drivers.get(MIN_CREW_SIZE)
    }
}

/// 被跳过的线路
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRoute {
    pub route_id: String,
    pub route_name: String,
    pub reason: String,
}

/// 切分结果
#[derive(Debug, Clone, Default)]
pub struct PoolAllocation {
    pub crews: Vec<RouteCrew>,
    pub skipped: Vec<SkippedRoute>,
}

impl PoolAllocation {
    pub fn is_empty(&self) -> bool {
        self.crews.is_empty()
    }
}

// ==========================================
// ResourcePoolSelector
// ==========================================
pub struct ResourcePoolSelector;

impl ResourcePoolSelector {
    /// 读取资源池
    ///
    /// # 过滤
    /// - 线路: is_active = 1
    /// - 司机: 状态非 OFF_DUTY
    /// - 车辆: 状态非 OUT_OF_SERVICE
    pub fn load(conn: &Connection) -> RepositoryResult<ResourcePools> {
        Ok(ResourcePools {
            routes: RouteRepository::list_active_in(conn)?,
            drivers: DriverRepository::list_available_in(conn)?,
            vehicles: VehicleRepository::list_available_in(conn)?,
        })
    }

    /// 读取并切分
    pub fn select(conn: &Connection, date: NaiveDate) -> RepositoryResult<PoolAllocation> {
        let pools = Self::load(conn)?;
        debug!(
            date = %date,
            routes = pools.routes.len(),
            drivers = pools.drivers.len(),
            vehicles = pools.vehicles.len(),
            "资源池已读取"
        );
        Ok(Self::partition(&pools))
    }

    /// 按共享轮转游标切分资源池
    ///
    /// # 规则
    /// - 每条线路从游标处领取至多 3 名司机、2 辆车，越界时回绕
    /// - 同一线路内不会重复领取同一司机/车辆（领取数不超过池大小）
    /// - 领取不足 2 名司机或 2 辆车的线路跳过，游标不前进
    pub fn partition(pools: &ResourcePools) -> PoolAllocation {
        let mut allocation = PoolAllocation::default();

        if pools.drivers.is_empty() || pools.vehicles.is_empty() {
            warn!(
                drivers = pools.drivers.len(),
                vehicles = pools.vehicles.len(),
                "资源池为空，不生成任何排班"
            );
            return allocation;
        }

        let mut driver_idx = 0usize;
        let mut vehicle_idx = 0usize;

        for route in &pools.routes {
            let drivers = claim(&pools.drivers, driver_idx, DRIVERS_PER_ROUTE);
            let vehicles = claim(&pools.vehicles, vehicle_idx, VEHICLES_PER_ROUTE);

            if drivers.len() < MIN_CREW_SIZE || vehicles.len() < MIN_CREW_SIZE {
                let reason = format!(
                    "资源不足: 司机 {}/{}，车辆 {}/{}",
                    drivers.len(),
                    MIN_CREW_SIZE,
                    vehicles.len(),
                    MIN_CREW_SIZE
                );
                warn!(route_id = %route.route_id, route_name = %route.name, "跳过线路: {}", reason);
                allocation.skipped.push(SkippedRoute {
                    route_id: route.route_id.clone(),
                    route_name: route.name.clone(),
                    reason,
                });
                continue;
            }

            driver_idx = (driver_idx + drivers.len()) % pools.drivers.len();
            vehicle_idx = (vehicle_idx + vehicles.len()) % pools.vehicles.len();

            allocation.crews.push(RouteCrew {
                route: route.clone(),
                drivers,
                vehicles,
            });
        }

        allocation
    }
}

/// 从 start 开始回绕领取至多 want 个不重复元素
fn claim<T: Clone>(pool: &[T], start: usize, want: usize) -> Vec<T> {
    let take = want.min(pool.len());
    (0..take).map(|k| pool[(start + k) % pool.len()].clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{DriverStatus, VehicleStatus};
    use chrono::NaiveDateTime;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn route(id: &str) -> Route {
        Route {
            route_id: id.to_string(),
            name: format!("Route {}", id),
            start_location: "A".to_string(),
            end_location: "B".to_string(),
            estimated_time_minutes: 40.0,
            turnaround_time_minutes: 10.0,
            is_active: true,
            created_at: ts(),
        }
    }

    fn driver(id: &str) -> Driver {
        Driver {
            driver_id: id.to_string(),
            full_name: id.to_string(),
            license_number: format!("L-{}", id),
            status: DriverStatus::Active,
            break_time_remaining: 60.0,
            total_break_time_today: 0.0,
            break_start_time: None,
            trips_since_last_break: 0,
            current_break_number: 0,
            total_trips_today: 0,
            created_at: ts(),
            updated_at: ts(),
        }
    }

    fn vehicle(id: &str) -> Vehicle {
        Vehicle {
            vehicle_id: id.to_string(),
            plate_number: id.to_string(),
            model: "City Bus".to_string(),
            capacity: 40,
            status: VehicleStatus::Free,
            created_at: ts(),
        }
    }

    fn ids<T, F: Fn(&T) -> &str>(items: &[T], f: F) -> Vec<String> {
        items.iter().map(|x| f(x).to_string()).collect()
    }

    #[test]
    fn test_empty_pool_yields_empty_allocation() {
        let pools = ResourcePools {
            routes: vec![route("R1")],
            drivers: vec![],
            vehicles: vec![vehicle("V1"), vehicle("V2")],
        };
        let allocation = ResourcePoolSelector::partition(&pools);
        assert!(allocation.is_empty());
        assert!(allocation.skipped.is_empty());
    }

    #[test]
    fn test_rotating_index_wraps_without_duplicates() {
        let pools = ResourcePools {
            routes: vec![route("R1"), route("R2")],
            drivers: vec![driver("D1"), driver("D2"), driver("D3"), driver("D4")],
            vehicles: vec![vehicle("V1"), vehicle("V2"), vehicle("V3")],
        };
        let allocation = ResourcePoolSelector::partition(&pools);
        assert_eq!(allocation.crews.len(), 2);

        let first = &allocation.crews[0];
        assert_eq!(ids(&first.drivers, |d| d.driver_id.as_str()), vec!["D1", "D2", "D3"]);
        assert_eq!(ids(&first.vehicles, |v| v.vehicle_id.as_str()), vec!["V1", "V2"]);

        let second = &allocation.crews[1];
        assert_eq!(ids(&second.drivers, |d| d.driver_id.as_str()), vec!["D4", "D1", "D2"]);
        assert_eq!(ids(&second.vehicles, |v| v.vehicle_id.as_str()), vec!["V3", "V1"]);
        assert_eq!(second.standby_driver().map(|d| d.driver_id.as_str()), Some("D2"));
    }

    #[test]
    fn test_route_skipped_when_pool_below_minimum() {
        let pools = ResourcePools {
            routes: vec![route("R1")],
            drivers: vec![driver("D1"), driver("D2")],
            vehicles: vec![vehicle("V1")],
        };
        let allocation = ResourcePoolSelector::partition(&pools);
        assert!(allocation.crews.is_empty());
        assert_eq!(allocation.skipped.len(), 1);
        assert_eq!(allocation.skipped[0].route_id, "R1");
    }

    #[test]
    fn test_two_driver_pool_has_no_standby() {
        let pools = ResourcePools {
            routes: vec![route("R1")],
            drivers: vec![driver("D1"), driver("D2")],
            vehicles: vec![vehicle("V1"), vehicle("V2")],
        };
        let allocation = ResourcePoolSelector::partition(&pools);
        let crew = &allocation.crews[0];
        assert_eq!(crew.on_duty_drivers().len(), 2);
        assert!(crew.standby_driver().is_none());
    }
}
