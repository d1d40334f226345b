// ==========================================
// 公交轮班调度系统 - 每日定时生成
// ==========================================
// 职责: 每天在配置时刻调用 generate_schedule(today, false)
// 红线: 失败只记日志，不重试；当日已生成时为空操作
// ==========================================

use crate::api::ScheduleApi;
use crate::config::{RotationConfigReader, RotationSettings};
use crate::db::now_local;
use chrono::{Duration, NaiveDateTime, NaiveTime};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// 定时任务的审计操作人
pub const DAILY_TRIGGER_ACTOR: &str = "system:daily";

/// 距离下一次 `at` 时刻的时长（当前时刻已过或恰好等于 `at` 时取次日）
pub fn duration_until_next(now: NaiveDateTime, at: NaiveTime) -> Duration {
    let today_at = now.date().and_time(at);
    let next = if now < today_at {
        today_at
    } else {
        today_at + Duration::days(1)
    };
    next - now
}

/// 启动每日定时生成任务
///
/// 每轮重新读取 `daily_generation_time`，配置修改在下一轮生效
pub fn spawn_daily_trigger(
    schedule_api: Arc<ScheduleApi>,
    config: Arc<dyn RotationConfigReader>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let at = match config.load_settings().await {
                Ok(settings) => settings.daily_generation_time,
                Err(e) => {
                    let fallback = RotationSettings::default().daily_generation_time;
                    warn!("读取定时配置失败，使用默认时刻 {}: {}", fallback, e);
                    fallback
                }
            };

            let wait = duration_until_next(now_local(), at);
            info!(at = %at, wait_secs = wait.num_seconds(), "等待下一次每日排班生成");
            match wait.to_std() {
                Ok(d) => tokio::time::sleep(d).await,
                Err(_) => continue,
            }

            run_once(&schedule_api).await;
        }
    })
}

/// 执行一次当日生成
pub async fn run_once(schedule_api: &ScheduleApi) {
    let today = now_local().date();
    match schedule_api
        .generate_schedule(today, false, Some(DAILY_TRIGGER_ACTOR))
        .await
    {
        Ok(outcome) => info!(
            date = %today,
            mode = ?outcome.mode,
            trips_count = outcome.trips.len(),
            "每日排班生成完成"
        ),
        Err(e) => error!(date = %today, "每日排班生成失败(不重试): {}", e),
    }
}
