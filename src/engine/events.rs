// ==========================================
// 公交轮班调度系统 - 引擎层通知发布
// ==========================================
// 职责: 定义通知投递 trait，实现依赖倒置
// 说明: Engine 层定义 trait，应用层提供连接注册表实现
// 红线: 通知为尽力投递，失败只记日志，不影响已提交的业务写入
// ==========================================

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;

// ==========================================
// 通知类型
// ==========================================

/// 通知类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationCategory {
    /// 排班下发
    Schedule,
    /// 休息开始/结束
    Break,
}

impl NotificationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationCategory::Schedule => "SCHEDULE",
            NotificationCategory::Break => "BREAK",
        }
    }
}

/// 通知
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// 接收人（司机 ID）
    pub recipient: String,
    pub title: String,
    pub message: String,
    pub category: NotificationCategory,
}

impl Notification {
    pub fn new(
        recipient: impl Into<String>,
        title: impl Into<String>,
        message: impl Into<String>,
        category: NotificationCategory,
    ) -> Self {
        Self {
            recipient: recipient.into(),
            title: title.into(),
            message: message.into(),
            category,
        }
    }
}

// ==========================================
// 通知投递 Trait
// ==========================================

/// 通知投递者
///
/// # 实现说明
/// - 应用层的 `ConnectionRegistry` 实现此 trait，按接收人推送到在线连接
pub trait NotificationRelay: Send + Sync {
    /// 投递通知
    ///
    /// # 返回
    /// - `Ok(n)`: 实际送达的连接数（接收人不在线时为 0）
    /// - `Err`: 投递失败
    fn deliver(&self, notification: &Notification) -> Result<usize, Box<dyn Error + Send + Sync>>;
}

/// 空操作投递者
///
/// 用于不需要推送的场景（如单元测试、命令行一次性生成）
#[derive(Debug, Clone, Default)]
pub struct NoOpRelay;

impl NotificationRelay for NoOpRelay {
    fn deliver(&self, notification: &Notification) -> Result<usize, Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            "NoOpRelay: 跳过通知 - recipient={}, category={}",
            notification.recipient,
            notification.category.as_str()
        );
        Ok(0)
    }
}

/// 可选的通知投递者包装
///
/// 吞掉投递错误（记 warn 日志）
#[derive(Clone)]
pub struct OptionalRelay {
    inner: Option<Arc<dyn NotificationRelay>>,
}

impl OptionalRelay {
    pub fn with_relay(relay: Arc<dyn NotificationRelay>) -> Self {
        Self { inner: Some(relay) }
    }

    pub fn none() -> Self {
        Self { inner: None }
    }

    /// 尽力投递，返回送达连接数
    pub fn notify(&self, notification: &Notification) -> usize {
        match &self.inner {
            Some(relay) => match relay.deliver(notification) {
                Ok(n) => n,
                Err(e) => {
                    tracing::warn!(
                        recipient = %notification.recipient,
                        category = notification.category.as_str(),
                        "通知投递失败(已忽略): {}",
                        e
                    );
                    0
                }
            },
            None => 0,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.inner.is_some()
    }
}

impl Default for OptionalRelay {
    fn default() -> Self {
        Self::none()
    }
}
