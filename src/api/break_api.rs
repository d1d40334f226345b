// ==========================================
// 公交轮班调度系统 - 司机休息 API
// ==========================================
// 职责: 开始/结束休息、查询休息额度与记录、记录完成班次
// 流程: 读取配置 -> 阻塞线程池内执行事务 -> 提交后推送通知
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::RotationConfigReader;
use crate::db::now_local;
use crate::domain::break_log::{BreakLog, BreakStatus};
use crate::domain::fleet::Driver;
use crate::engine::{
    BreakManager, EngineResult, Notification, NotificationCategory, OptionalRelay,
};
use chrono::NaiveDateTime;
use std::sync::Arc;

pub struct BreakApi {
    break_manager: Arc<BreakManager>,
    config: Arc<dyn RotationConfigReader>,
    relay: OptionalRelay,
}

impl BreakApi {
    pub fn new(
        break_manager: Arc<BreakManager>,
        config: Arc<dyn RotationConfigReader>,
        relay: OptionalRelay,
    ) -> Self {
        Self {
            break_manager,
            config,
            relay,
        }
    }

    /// 司机开始休息
    ///
    /// # 返回
    /// - Ok(BreakLog): 新开启的休息记录
    /// - Err(ApiError::IneligibleBreak): 不满足条件，附带原因
    /// - Err(ApiError::NotFound): 司机不存在
    pub async fn start_break(&self, driver_id: &str, actor: Option<&str>) -> ApiResult<BreakLog> {
        self.start_break_at(driver_id, actor, now_local()).await
    }

    /// 同 `start_break`，显式指定当前时间
    pub async fn start_break_at(
        &self,
        driver_id: &str,
        actor: Option<&str>,
        now: NaiveDateTime,
    ) -> ApiResult<BreakLog> {
        let settings = self.config.load_settings().await?;
        let manager = Arc::clone(&self.break_manager);
        let driver = driver_id.to_string();
        let actor_owned = actor.map(str::to_string);

        let log = run_blocking(move || {
            manager.start_break(&driver, &settings, actor_owned.as_deref(), now)
        })
        .await?;

        self.relay.notify(&Notification::new(
            driver_id,
            "休息开始",
            format!(
                "第 {} 次休息已于 {} 开始",
                log.break_number,
                log.start_time.format("%H:%M")
            ),
            NotificationCategory::Break,
        ));
        Ok(log)
    }

    /// 司机结束休息
    ///
    /// # 返回
    /// - Ok(Driver): 扣减额度后的司机
    /// - Err(ApiError::NotOnBreak): 司机当前不在休息中
    pub async fn end_break(&self, driver_id: &str, actor: Option<&str>) -> ApiResult<Driver> {
        self.end_break_at(driver_id, actor, now_local()).await
    }

    /// 同 `end_break`，显式指定当前时间
    pub async fn end_break_at(
        &self,
        driver_id: &str,
        actor: Option<&str>,
        now: NaiveDateTime,
    ) -> ApiResult<Driver> {
        let manager = Arc::clone(&self.break_manager);
        let driver = driver_id.to_string();
        let actor_owned = actor.map(str::to_string);

        let updated =
            run_blocking(move || manager.end_break(&driver, actor_owned.as_deref(), now)).await?;

        self.relay.notify(&Notification::new(
            driver_id,
            "休息结束",
            format!(
                "休息已结束，剩余休息额度 {:.1} 分钟",
                updated.break_time_remaining
            ),
            NotificationCategory::Break,
        ));
        Ok(updated)
    }

    /// 查询司机休息状态
    pub async fn get_break_status(&self, driver_id: &str) -> ApiResult<BreakStatus> {
        let settings = self.config.load_settings().await?;
        let manager = Arc::clone(&self.break_manager);
        let driver = driver_id.to_string();
        run_blocking(move || manager.get_break_status(&driver, &settings)).await
    }

    /// 查询司机的休息记录
    pub async fn list_break_logs(&self, driver_id: &str) -> ApiResult<Vec<BreakLog>> {
        let manager = Arc::clone(&self.break_manager);
        let driver = driver_id.to_string();
        run_blocking(move || manager.list_break_logs(&driver)).await
    }

    /// 记录司机完成一个班次
    pub async fn record_completed_trip(&self, driver_id: &str) -> ApiResult<Driver> {
        let manager = Arc::clone(&self.break_manager);
        let driver = driver_id.to_string();
        let now = now_local();
        run_blocking(move || manager.record_completed_trip(&driver, now)).await
    }
}

/// 在阻塞线程池内执行引擎调用
async fn run_blocking<T, F>(work: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> EngineResult<T> + Send + 'static,
{
    let result = tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::InternalError(format!("休息任务异常退出: {}", e)))?;
    Ok(result?)
}
