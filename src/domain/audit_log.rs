// ==========================================
// 公交轮班调度系统 - 审计日志领域模型
// ==========================================
// 对齐: audit_logs 表
// 红线: 审计写入与业务写入处于同一事务
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// ==========================================
// AuditLog - 审计日志
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
    pub audit_id: String,
    pub actor: Option<String>,    // 操作人 (定时任务为 system:*)
    pub action: String,           // 操作类型 (存储为字符串)
    pub entity_type: String,      // 实体类型
    pub entity_id: Option<String>,
    pub old_values: Option<JsonValue>, // 变更前快照
    pub new_values: Option<JsonValue>, // 变更后快照
    pub created_at: NaiveDateTime,
}

// ==========================================
// AuditAction - 审计操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    GenerateSchedule,   // 生成当日排班
    RegenerateSchedule, // 强制重建当日排班
    StartBreak,         // 开始休息
    EndBreak,           // 结束休息
}

impl AuditAction {
    /// 转换为字符串 (用于数据库存储)
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::GenerateSchedule => "GENERATE_SCHEDULE",
            AuditAction::RegenerateSchedule => "REGENERATE_SCHEDULE",
            AuditAction::StartBreak => "START_BREAK",
            AuditAction::EndBreak => "END_BREAK",
        }
    }

    /// 从字符串解析
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "GENERATE_SCHEDULE" => Some(AuditAction::GenerateSchedule),
            "REGENERATE_SCHEDULE" => Some(AuditAction::RegenerateSchedule),
            "START_BREAK" => Some(AuditAction::StartBreak),
            "END_BREAK" => Some(AuditAction::EndBreak),
            _ => None,
        }
    }
}

impl AuditLog {
    /// 创建新的审计日志
    pub fn new(
        actor: Option<String>,
        action: AuditAction,
        entity_type: &str,
        entity_id: Option<String>,
        created_at: NaiveDateTime,
    ) -> Self {
        Self {
            audit_id: uuid::Uuid::new_v4().to_string(),
            actor,
            action: action.as_str().to_string(),
            entity_type: entity_type.to_string(),
            entity_id,
            old_values: None,
            new_values: None,
            created_at,
        }
    }

    /// 设置变更前快照 (转换为JSON)
    pub fn with_old_values<T: Serialize>(mut self, values: &T) -> Self {
        self.old_values = serde_json::to_value(values).ok();
        self
    }

    /// 设置变更后快照 (转换为JSON)
    pub fn with_new_values<T: Serialize>(mut self, values: &T) -> Self {
        self.new_values = serde_json::to_value(values).ok();
        self
    }
}
