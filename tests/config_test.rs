// ==========================================
// 配置集成测试
// ==========================================
// 测试目标: 验证配置读取、覆写回退与配置对排班的影响
// ==========================================


use chrono::NaiveTime;
use transit_rotation::api::ApiError;
use transit_rotation::app::AppState;
use transit_rotation::config::{config_keys, ConfigManager, RotationConfigReader, RotationSettings};
use transit_rotation::repository::AuditLogRepository;
use test_helpers::{at, create_test_db, open_shared, seed_riverside, test_date};

#[tokio::test]
async fn test_fresh_database_uses_defaults() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config_manager = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");

    let settings = config_manager.load_settings().await.unwrap();
    assert_eq!(settings, RotationSettings::default());
    assert_eq!(config_manager.get_min_trips_before_break().await.unwrap(), 1);
    assert_eq!(
        config_manager.get_break_time_per_shift_minutes().await.unwrap(),
        60.0
    );
    assert_eq!(
        settings.daily_generation_time,
        NaiveTime::from_hms_opt(5, 30, 0).unwrap()
    );
}

#[tokio::test]
async fn test_overrides_are_read_through_trait() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config_manager = ConfigManager::new(&db_path).unwrap();
    config_manager
        .set_config_value(config_keys::MIN_TRIPS_BEFORE_BREAK, "2")
        .unwrap();
    config_manager
        .set_config_value(config_keys::BREAK_TIME_PER_SHIFT_MINUTES, "45.5")
        .unwrap();

    let reader: &dyn RotationConfigReader = &config_manager;
    assert_eq!(reader.get_min_trips_before_break().await.unwrap(), 2);
    assert_eq!(reader.get_break_time_per_shift_minutes().await.unwrap(), 45.5);

    let snapshot = reader.get_config_snapshot().await.unwrap();
    assert_eq!(snapshot["min_trips_before_break"], "2");
}

#[test]
fn test_invalid_update_is_rolled_back() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let state = AppState::new(db_path).unwrap();

    state
        .config_api
        .update_config(config_keys::DISPATCH_WINDOW_END, "13:00")
        .unwrap();

    // 窗口上界早于早班开始，组合不合法
    let err = state
        .config_api
        .update_config(config_keys::DISPATCH_WINDOW_END, "05:00")
        .unwrap_err();
    assert!(matches!(err, ApiError::ValidationError(_)));

    let settings = state.config_api.get_settings().unwrap();
    assert_eq!(
        settings.dispatch_window_end,
        NaiveTime::from_hms_opt(13, 0, 0).unwrap()
    );

    // 从未覆写过的键回退为删除
    let err = state
        .config_api
        .update_config(config_keys::DISPATCH_FREQUENCY_MINUTES, "often")
        .unwrap_err();
    assert!(matches!(err, ApiError::ValidationError(_)));
    let items = state.config_api.list_configs().unwrap();
    let frequency = items
        .iter()
        .find(|i| i.key == config_keys::DISPATCH_FREQUENCY_MINUTES)
        .unwrap();
    assert_eq!(frequency.value, None);
}

#[test]
fn test_unknown_key_is_invalid_input() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let state = AppState::new(db_path).unwrap();

    let err = state.config_api.update_config("season_mode", "AUTO").unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
    assert!(state.config_api.reset_config("season_mode").is_err());
}

#[tokio::test]
async fn test_frequency_override_changes_generated_schedule_and_is_audited() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    seed_riverside(&open_shared(&db_path));
    let state = AppState::new(db_path.clone()).unwrap();

    state
        .config_api
        .update_config(config_keys::DISPATCH_FREQUENCY_MINUTES, "120")
        .unwrap();

    let outcome = state
        .schedule_api
        .generate_schedule_at(test_date(), false, Some("operator"), at(5, 30))
        .await
        .unwrap();
    // 06:00 / 08:00 / 10:00 / 12:00 四个发车，每个都有回程
    assert_eq!(outcome.trips.len(), 8);

    let audits = AuditLogRepository::new(open_shared(&db_path))
        .list_by_action("GENERATE_SCHEDULE")
        .unwrap();
    assert_eq!(audits.len(), 1);
    let new_values = audits[0].new_values.as_ref().unwrap();
    assert_eq!(new_values["trips_count"], 8);
    assert_eq!(new_values["config"]["dispatch_frequency_minutes"], "120");
}
