// ==========================================
// 排班生成/重建集成测试
// ==========================================
// 职责: 验证 CREATE 幂等、REGENERATE 清理重建、整体回滚与边界场景
// ==========================================


#[cfg(test)]
mod schedule_generation_test {
    use std::collections::{HashMap, HashSet};

    use chrono::NaiveTime;
    use transit_rotation::config::RotationSettings;
    use transit_rotation::domain::{
        DriverExchange, PositionLog, ReplacementReason, RotationAssignment, RotationPosition,
        ShiftType, Ticket, TripDirection,
    };
    use transit_rotation::engine::{
        EngineError, GenerationMode, GenerationOutcome, GenerationRequest, PurgeSummary,
        ScheduleReconciler,
    };
    use transit_rotation::repository::{
        AssignmentRepository, AuditLogRepository, ExchangeRepository, PositionLogRepository,
        RepositoryError, TicketRepository, TripRepository,
    };

    use crate::test_helpers::{
        at, count_rows, create_test_db, insert_drivers, insert_route, insert_vehicles,
        open_shared, seed_riverside, test_date,
    };

    fn generate(
        reconciler: &ScheduleReconciler,
        settings: &RotationSettings,
        force: bool,
    ) -> Result<GenerationOutcome, EngineError> {
        reconciler.generate(GenerationRequest {
            date: test_date(),
            force_regenerate: force,
            settings,
            config_snapshot: None,
            actor: Some("tester"),
            now: at(5, 30),
        })
    }

    // ==========================================
    // 测试1: Riverside Express 边界场景
    // ==========================================

    #[test]
    fn test_riverside_express_produces_sixteen_trips() {
        let (_tmp, db_path) = create_test_db().unwrap();
        let conn = open_shared(&db_path);
        seed_riverside(&conn);

        let reconciler = ScheduleReconciler::new(conn.clone());
        let outcome = generate(&reconciler, &RotationSettings::default(), false).unwrap();

        assert_eq!(outcome.mode, GenerationMode::Created);
        assert_eq!(outcome.assignments.len(), 2);
        assert_eq!(outcome.trips.len(), 16);
        assert!(outcome.skipped_routes.is_empty());

        let positions: Vec<RotationPosition> =
            outcome.assignments.iter().map(|a| a.position).collect();
        assert_eq!(positions, vec![RotationPosition::Driver1, RotationPosition::Driver2]);
        assert!(outcome.assignments.iter().all(|a| a.shift_type == ShiftType::Morning));
        // 第三名司机只作为备班，不落库
        assert!(outcome.assignments.iter().all(|a| a.driver_id != "D03"));

        let first = &outcome.trips[0];
        assert_eq!(first.direction, TripDirection::Outbound);
        assert_eq!(first.scheduled_start, at(6, 0));
        assert_eq!(first.scheduled_end, at(6, 40));
        assert_eq!(first.trip_number, "RIV-0600-O");

        let last = outcome.trips.last().unwrap();
        assert_eq!(last.direction, TripDirection::Inbound);
        assert_eq!(last.scheduled_start, at(13, 50));
        assert_eq!(last.scheduled_end, at(14, 30));

        let stored = TripRepository::new(conn.clone())
            .list_for_date(test_date())
            .unwrap();
        assert_eq!(stored.len(), 16);
        assert_eq!(count_rows(&conn, "rotation_assignments"), 2);
    }

    #[test]
    fn test_each_cycle_stays_with_one_assignment_and_alternates() {
        let (_tmp, db_path) = create_test_db().unwrap();
        let conn = open_shared(&db_path);
        seed_riverside(&conn);

        let outcome = generate(
            &ScheduleReconciler::new(conn.clone()),
            &RotationSettings::default(),
            false,
        )
        .unwrap();

        let drivers: Vec<&str> = outcome.trips.iter().map(|t| t.driver_id.as_str()).collect();
        for (cycle, pair) in drivers.chunks(2).enumerate() {
            assert_eq!(pair[0], pair[1], "去程与回程应属于同一司机");
            let expected = if cycle % 2 == 0 { "D01" } else { "D02" };
            assert_eq!(pair[0], expected);
        }

        for trip in outcome.trips.iter().filter(|t| t.direction == TripDirection::Inbound) {
            let outbound = outcome
                .trips
                .iter()
                .find(|o| {
                    o.direction == TripDirection::Outbound
                        && o.assignment_id == trip.assignment_id
                        && o.scheduled_end <= trip.scheduled_start
                })
                .unwrap();
            assert!(trip.scheduled_start >= outbound.scheduled_end + chrono::Duration::minutes(10));
        }
    }

    #[test]
    fn test_no_driver_has_overlapping_trips() {
        let (_tmp, db_path) = create_test_db().unwrap();
        let conn = open_shared(&db_path);
        insert_route(&conn, "R-A", "Alpha Line", 40.0, 10.0, 1);
        insert_route(&conn, "R-B", "Beta Line", 25.0, 5.0, 2);
        insert_drivers(&conn, 6);
        insert_vehicles(&conn, 4);

        let outcome = generate(
            &ScheduleReconciler::new(conn.clone()),
            &RotationSettings::default(),
            false,
        )
        .unwrap();
        assert_eq!(outcome.assignments.len(), 4);

        let mut by_driver: HashMap<&str, Vec<_>> = HashMap::new();
        for trip in &outcome.trips {
            by_driver.entry(trip.driver_id.as_str()).or_default().push(trip);
        }
        for trips in by_driver.values() {
            for (i, a) in trips.iter().enumerate() {
                for b in &trips[i + 1..] {
                    assert!(!a.overlaps(b), "{} 与 {} 重叠", a.trip_number, b.trip_number);
                }
            }
        }
    }

    // ==========================================
    // 测试2: CREATE 幂等
    // ==========================================

    #[test]
    fn test_second_create_is_noop() {
        let (_tmp, db_path) = create_test_db().unwrap();
        let conn = open_shared(&db_path);
        seed_riverside(&conn);
        let reconciler = ScheduleReconciler::new(conn.clone());
        let settings = RotationSettings::default();

        let first = generate(&reconciler, &settings, false).unwrap();
        let first_ids: HashSet<String> = first.trips.iter().map(|t| t.trip_id.clone()).collect();

        let second = generate(&reconciler, &settings, false).unwrap();
        assert_eq!(second.mode, GenerationMode::AlreadyGenerated);
        assert!(second.trips.is_empty());
        assert!(second.assignments.is_empty());

        let stored: HashSet<String> = TripRepository::new(conn.clone())
            .list_for_date(test_date())
            .unwrap()
            .into_iter()
            .map(|t| t.trip_id)
            .collect();
        assert_eq!(stored, first_ids);

        let audits = AuditLogRepository::new(conn.clone())
            .list_by_action("GENERATE_SCHEDULE")
            .unwrap();
        assert_eq!(audits.len(), 1);
        assert_eq!(audits[0].actor.as_deref(), Some("tester"));
    }

    #[test]
    fn test_generation_is_deterministic_across_databases() {
        let shape = || {
            let (_tmp, db_path) = create_test_db().unwrap();
            let conn = open_shared(&db_path);
            seed_riverside(&conn);
            let outcome = generate(
                &ScheduleReconciler::new(conn),
                &RotationSettings::default(),
                false,
            )
            .unwrap();
            outcome
                .trips
                .into_iter()
                .map(|t| (t.driver_id, t.vehicle_id, t.direction, t.scheduled_start, t.scheduled_end))
                .collect::<Vec<_>>()
        };

        assert_eq!(shape(), shape());
    }

    // ==========================================
    // 测试3: REGENERATE 清理后重建
    // ==========================================

    #[test]
    fn test_force_regenerate_purges_dependents_and_rebuilds() {
        let (_tmp, db_path) = create_test_db().unwrap();
        let conn = open_shared(&db_path);
        seed_riverside(&conn);
        let reconciler = ScheduleReconciler::new(conn.clone());
        let settings = RotationSettings::default();

        let first = generate(&reconciler, &settings, false).unwrap();
        let trip = &first.trips[0];
        let assignment = &first.assignments[0];
        {
            let c = conn.lock().unwrap();
            TicketRepository::insert_in(
                &c,
                &Ticket {
                    ticket_id: "T-1".to_string(),
                    trip_id: trip.trip_id.clone(),
                    passenger_name: Some("Ana".to_string()),
                    seat_number: Some("12".to_string()),
                    price: 2.5,
                    status: "BOOKED".to_string(),
                    purchase_time: at(5, 45),
                },
            )
            .unwrap();
            PositionLogRepository::insert_in(
                &c,
                &PositionLog {
                    position_id: "P-1".to_string(),
                    vehicle_id: trip.vehicle_id.clone(),
                    trip_id: Some(trip.trip_id.clone()),
                    latitude: 31.2,
                    longitude: 121.5,
                    speed: 0.0,
                    recorded_at: at(6, 5),
                },
            )
            .unwrap();
            ExchangeRepository::insert_in(
                &c,
                &DriverExchange {
                    exchange_id: "X-1".to_string(),
                    assignment_id: assignment.assignment_id.clone(),
                    outgoing_driver_id: "D01".to_string(),
                    incoming_driver_id: "D03".to_string(),
                    reason: ReplacementReason::Break,
                    exchange_time: at(9, 0),
                    return_time: None,
                    trip_id: None,
                    notes: None,
                },
            )
            .unwrap();
        }

        let second = generate(&reconciler, &settings, true).unwrap();
        assert_eq!(second.mode, GenerationMode::Regenerated);
        let purged = second.purged.clone().unwrap();
        assert_eq!(purged.tickets, 1);
        assert_eq!(purged.position_logs, 1);
        assert_eq!(purged.exchanges, 1);
        assert_eq!(purged.trips, 16);
        assert_eq!(purged.assignments, 2);

        assert_eq!(count_rows(&conn, "tickets"), 0);
        assert_eq!(count_rows(&conn, "position_logs"), 0);
        assert_eq!(count_rows(&conn, "driver_exchanges"), 0);
        assert_eq!(count_rows(&conn, "rotation_assignments"), 2);

        let old_ids: HashSet<&str> = first.trips.iter().map(|t| t.trip_id.as_str()).collect();
        let stored = TripRepository::new(conn.clone())
            .list_for_date(test_date())
            .unwrap();
        assert_eq!(stored.len(), 16);
        assert!(stored.iter().all(|t| !old_ids.contains(t.trip_id.as_str())));

        let audits = AuditLogRepository::new(conn.clone())
            .list_by_action("REGENERATE_SCHEDULE")
            .unwrap();
        assert_eq!(audits.len(), 1);
        assert_eq!(audits[0].old_values.as_ref().unwrap()["trips"], 16);
    }

    #[test]
    fn test_force_on_empty_date_reports_regenerated_with_zero_purge() {
        let (_tmp, db_path) = create_test_db().unwrap();
        let conn = open_shared(&db_path);
        seed_riverside(&conn);

        let outcome = generate(
            &ScheduleReconciler::new(conn.clone()),
            &RotationSettings::default(),
            true,
        )
        .unwrap();
        assert_eq!(outcome.mode, GenerationMode::Regenerated);
        assert_eq!(outcome.purged.unwrap(), PurgeSummary::default());
        assert_eq!(outcome.trips.len(), 16);
    }

    // ==========================================
    // 测试4: 资源池不足
    // ==========================================

    #[test]
    fn test_empty_vehicle_pool_yields_empty_schedule() {
        let (_tmp, db_path) = create_test_db().unwrap();
        let conn = open_shared(&db_path);
        insert_route(&conn, "R-RIV", "Riverside Express", 40.0, 10.0, 1);
        insert_drivers(&conn, 3);

        let outcome = generate(
            &ScheduleReconciler::new(conn.clone()),
            &RotationSettings::default(),
            false,
        )
        .unwrap();
        assert_eq!(outcome.mode, GenerationMode::Created);
        assert!(outcome.trips.is_empty());
        assert_eq!(count_rows(&conn, "trips"), 0);
    }

    #[test]
    fn test_single_driver_pool_skips_route_with_reason() {
        let (_tmp, db_path) = create_test_db().unwrap();
        let conn = open_shared(&db_path);
        insert_route(&conn, "R-RIV", "Riverside Express", 40.0, 10.0, 1);
        insert_drivers(&conn, 1);
        insert_vehicles(&conn, 2);

        let outcome = generate(
            &ScheduleReconciler::new(conn.clone()),
            &RotationSettings::default(),
            false,
        )
        .unwrap();
        assert!(outcome.trips.is_empty());
        assert_eq!(outcome.skipped_routes.len(), 1);
        assert_eq!(outcome.skipped_routes[0].route_id, "R-RIV");
    }

    // ==========================================
    // 测试5: 失败整体回滚
    // ==========================================

    #[test]
    fn test_invalid_settings_touch_nothing() {
        let (_tmp, db_path) = create_test_db().unwrap();
        let conn = open_shared(&db_path);
        seed_riverside(&conn);

        let settings = RotationSettings {
            dispatch_frequency_minutes: 0,
            ..RotationSettings::default()
        };
        let err = generate(&ScheduleReconciler::new(conn.clone()), &settings, false).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
        assert_eq!(count_rows(&conn, "trips"), 0);
        assert_eq!(count_rows(&conn, "audit_logs"), 0);
    }

    #[test]
    fn test_failure_midway_rolls_back_whole_pass() {
        let (_tmp, db_path) = create_test_db().unwrap();
        let conn = open_shared(&db_path);
        insert_route(&conn, "R-A", "Alpha Line", 40.0, 10.0, 1);
        insert_route(&conn, "R-B", "Beta Line", 30.0, 10.0, 2);
        insert_drivers(&conn, 6);
        insert_vehicles(&conn, 4);

        // 第二条线路上遗留一条没有班次的分配，插入时触发唯一约束
        {
            let c = conn.lock().unwrap();
            AssignmentRepository::insert_in(
                &c,
                &RotationAssignment {
                    assignment_id: "stale".to_string(),
                    route_id: "R-B".to_string(),
                    driver_id: "D06".to_string(),
                    vehicle_id: "V04".to_string(),
                    shift_type: ShiftType::Morning,
                    position: RotationPosition::Driver1,
                    shift_date: test_date(),
                    shift_start_time: at(6, 0),
                    shift_end_time: at(15, 0),
                    is_active: true,
                    created_at: at(5, 0),
                },
            )
            .unwrap();
        }

        let err = generate(
            &ScheduleReconciler::new(conn.clone()),
            &RotationSettings::default(),
            false,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            EngineError::TransactionFailure(RepositoryError::UniqueConstraintViolation(_))
        ));

        // 第一条线路已写入的班次随事务一起回滚
        assert_eq!(count_rows(&conn, "trips"), 0);
        assert_eq!(count_rows(&conn, "rotation_assignments"), 1);
        assert_eq!(count_rows(&conn, "audit_logs"), 0);
    }

    // ==========================================
    // 测试6: 配置影响编排
    // ==========================================

    #[test]
    fn test_shorter_window_cuts_trailing_cycles() {
        let (_tmp, db_path) = create_test_db().unwrap();
        let conn = open_shared(&db_path);
        seed_riverside(&conn);

        let settings = RotationSettings {
            dispatch_window_end: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            ..RotationSettings::default()
        };
        let outcome = generate(&ScheduleReconciler::new(conn.clone()), &settings, false).unwrap();

        // 06:00..09:00 四个发车，09:00 回程 09:50 仍早于 10:00
        assert_eq!(outcome.trips.len(), 8);
        assert!(outcome.trips.iter().all(|t| t.scheduled_start < at(10, 0)));
    }

    // ==========================================
    // 测试7: 小数分钟耗时的存储精度
    // ==========================================

    #[test]
    fn test_fractional_turnaround_survives_storage() {
        let (_tmp, db_path) = create_test_db().unwrap();
        let conn = open_shared(&db_path);
        insert_route(&conn, "R-RIV", "Riverside Express", 40.0, 0.01, 1);
        insert_drivers(&conn, 3);
        insert_vehicles(&conn, 2);

        let outcome = generate(
            &ScheduleReconciler::new(conn.clone()),
            &RotationSettings::default(),
            false,
        )
        .unwrap();

        let stored = TripRepository::new(conn.clone())
            .list_for_date(test_date())
            .unwrap();
        assert_eq!(stored.len(), outcome.trips.len());

        let by_id: HashMap<&str, _> = stored.iter().map(|t| (t.trip_id.as_str(), t)).collect();
        for trip in &outcome.trips {
            let row = by_id[trip.trip_id.as_str()];
            assert_eq!(row.scheduled_start, trip.scheduled_start);
            assert_eq!(row.scheduled_end, trip.scheduled_end);
        }

        let turnaround = chrono::Duration::milliseconds(600);
        for inbound in stored.iter().filter(|t| t.direction == TripDirection::Inbound) {
            let outbound = stored
                .iter()
                .filter(|o| {
                    o.direction == TripDirection::Outbound
                        && o.assignment_id == inbound.assignment_id
                        && o.scheduled_start < inbound.scheduled_start
                })
                .max_by_key(|o| o.scheduled_start)
                .unwrap();
            assert!(
                inbound.scheduled_start >= outbound.scheduled_end + turnaround,
                "{} 早于 {} 结束加折返",
                inbound.trip_number,
                outbound.trip_number
            );
        }
    }

    #[test]
    fn test_sub_second_route_is_stored() {
        let (_tmp, db_path) = create_test_db().unwrap();
        let conn = open_shared(&db_path);
        // 0.005 分钟 = 300 毫秒
        insert_route(&conn, "R-DASH", "Dash Line", 0.005, 0.0, 1);
        insert_drivers(&conn, 3);
        insert_vehicles(&conn, 2);

        let outcome = generate(
            &ScheduleReconciler::new(conn.clone()),
            &RotationSettings::default(),
            false,
        )
        .unwrap();
        assert!(!outcome.trips.is_empty());

        let stored = TripRepository::new(conn.clone())
            .list_for_date(test_date())
            .unwrap();
        assert!(stored.iter().all(|t| t.scheduled_start < t.scheduled_end));
    }

    #[test]
    fn test_oversized_route_is_rejected_and_connection_stays_usable() {
        let (_tmp, db_path) = create_test_db().unwrap();
        let conn = open_shared(&db_path);
        insert_route(&conn, "R-FAR", "Far Away", 1e12, 10.0, 1);
        insert_drivers(&conn, 3);
        insert_vehicles(&conn, 2);

        let reconciler = ScheduleReconciler::new(conn.clone());
        let first = generate(&reconciler, &RotationSettings::default(), false);
        assert!(matches!(first, Err(EngineError::Validation(_))), "{:?}", first);

        // 连接锁未中毒，再次调用仍返回校验错误而非锁错误
        let second = generate(&reconciler, &RotationSettings::default(), false);
        assert!(matches!(second, Err(EngineError::Validation(_))), "{:?}", second);
        assert_eq!(count_rows(&conn, "trips"), 0);
        assert_eq!(count_rows(&conn, "rotation_assignments"), 0);
    }
}
