// ==========================================
// 公交轮班调度系统 - 演示数据初始化
// ==========================================
// 用法: seed_demo_fleet [DB_PATH]
// 说明: 已存在的数据库先备份再重建，写入演示线路/司机/车辆
// ==========================================

use chrono::Local;
use std::error::Error;
use std::fs;
use std::path::Path;
use uuid::Uuid;

use transit_rotation::app::get_default_db_path;
use transit_rotation::config::{ConfigManager, RotationSettings};
use transit_rotation::db::{init_schema, now_local, open_sqlite_connection};
use transit_rotation::domain::{Driver, DriverStatus, Route, Vehicle, VehicleStatus};
use transit_rotation::repository::{DriverRepository, RouteRepository, VehicleRepository};

/// (名称, 起点, 终点, 单程分钟, 折返分钟)
const DEMO_ROUTES: [(&str, &str, &str, f64, f64); 3] = [
    ("Riverside Express", "Riverside Terminal", "City Center", 40.0, 10.0),
    ("Harbor Loop", "Harbor Gate", "Old Town", 25.0, 5.0),
    ("Airport Shuttle", "Central Station", "Airport T2", 50.0, 15.0),
];

const DRIVERS_COUNT: usize = 9;
const VEHICLES_COUNT: usize = 6;

fn main() -> Result<(), Box<dyn Error>> {
    let db_path = std::env::args().nth(1).unwrap_or_else(get_default_db_path);

    backup_and_reset_db(&db_path)?;

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;
    drop(conn);

    let config = ConfigManager::new(&db_path)?;
    let budget = config
        .read_settings()
        .unwrap_or_else(|_| RotationSettings::default())
        .break_time_per_shift_minutes;

    let conn = std::sync::Arc::new(std::sync::Mutex::new(open_sqlite_connection(&db_path)?));
    let route_repo = RouteRepository::new(conn.clone());
    let driver_repo = DriverRepository::new(conn.clone());
    let vehicle_repo = VehicleRepository::new(conn);
    let now = now_local();

    for (name, start, end, estimated, turnaround) in DEMO_ROUTES {
        route_repo.insert(&Route {
            route_id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            start_location: start.to_string(),
            end_location: end.to_string(),
            estimated_time_minutes: estimated,
            turnaround_time_minutes: turnaround,
            is_active: true,
            created_at: now,
        })?;
    }

    for i in 1..=DRIVERS_COUNT {
        driver_repo.insert(&Driver {
            driver_id: Uuid::new_v4().to_string(),
            full_name: format!("Demo Driver {:02}", i),
            license_number: format!("LIC-{:05}", i),
            status: DriverStatus::Active,
            break_time_remaining: budget,
            total_break_time_today: 0.0,
            break_start_time: None,
            trips_since_last_break: 0,
            current_break_number: 0,
            total_trips_today: 0,
            created_at: now,
            updated_at: now,
        })?;
    }

    for i in 1..=VEHICLES_COUNT {
        vehicle_repo.insert(&Vehicle {
            vehicle_id: Uuid::new_v4().to_string(),
            plate_number: format!("BUS-{:03}", i),
            model: "Citaro 12m".to_string(),
            capacity: 80,
            status: VehicleStatus::Free,
            created_at: now,
        })?;
    }

    eprintln!(
        "Seeded {}: routes={}, drivers={}, vehicles={}",
        db_path,
        DEMO_ROUTES.len(),
        DRIVERS_COUNT,
        VEHICLES_COUNT
    );
    Ok(())
}

fn backup_and_reset_db(db_path: &str) -> Result<(), Box<dyn Error>> {
    let path = Path::new(db_path);
    if !path.exists() {
        return Ok(());
    }

    let ts = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let backup_path = format!("{}.bak.{}", db_path, ts);
    fs::copy(path, &backup_path)?;
    fs::remove_file(path)?;

    eprintln!("Backed up {} -> {}", db_path, backup_path);
    Ok(())
}
