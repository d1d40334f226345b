// ==========================================
// 公交轮班调度系统 - 引擎层错误类型
// ==========================================

use crate::config::ConfigError;
use crate::repository::error::RepositoryError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ==========================================
// IneligibilityReason - 不能开始休息的原因
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IneligibilityReason {
    /// 司机不处于 ACTIVE 状态
    NotActive { status: String },
    /// 距上次休息完成的班次数不足
    InsufficientTrips { completed: i32, required: i32 },
    /// 休息额度已用尽
    NoBreakTimeRemaining,
    /// 已存在未结束的休息记录（并发开启时的败者）
    AlreadyOnBreak,
}

impl fmt::Display for IneligibilityReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IneligibilityReason::NotActive { status } => {
                write!(f, "司机当前状态为 {}，只有 ACTIVE 状态可以开始休息", status)
            }
            IneligibilityReason::InsufficientTrips { completed, required } => {
                write!(f, "完成班次不足: 已完成 {}，至少需要 {}", completed, required)
            }
            IneligibilityReason::NoBreakTimeRemaining => write!(f, "休息额度已用尽"),
            IneligibilityReason::AlreadyOnBreak => write!(f, "已有未结束的休息记录"),
        }
    }
}

// ==========================================
// EngineError - 引擎层错误
// ==========================================
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("参数校验失败: {0}")]
    Validation(String),

    #[error("不满足休息条件: driver_id={driver_id}, 原因: {reason}")]
    IneligibleBreak {
        driver_id: String,
        reason: IneligibilityReason,
    },

    #[error("司机不在休息中: driver_id={driver_id}")]
    NotOnBreak { driver_id: String },

    #[error("记录未找到: {entity} id={id}")]
    NotFound { entity: String, id: String },

    #[error("事务失败，已回滚: {0}")]
    TransactionFailure(#[from] RepositoryError),
}

impl From<ConfigError> for EngineError {
    fn from(err: ConfigError) -> Self {
        EngineError::Validation(err.to_string())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
