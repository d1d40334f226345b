// ==========================================
// 公交轮班调度系统 - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 仓储层错误
///
/// 约束类错误按 SQLite 扩展错误码分类，调用方据此区分并发败者与数据问题
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("{entity}(id={id}) 不存在")]
    NotFound { entity: String, id: String },

    #[error("无法打开数据库: {0}")]
    DatabaseConnectionError(String),

    #[error("连接互斥锁已中毒: {0}")]
    LockError(String),

    /// 写锁等待超时（busy_timeout 耗尽）
    #[error("写事务未能获得数据库锁: {0}")]
    DatabaseTransactionError(String),

    #[error("SQL 执行失败: {0}")]
    DatabaseQueryError(String),

    /// 包括主键冲突与 break_logs 的"未结束休息"部分唯一索引
    #[error("重复记录: {0}")]
    UniqueConstraintViolation(String),

    #[error("引用的记录不存在: {0}")]
    ForeignKeyViolation(String),

    #[error("数据不满足表约束: {0}")]
    CheckConstraintViolation(String),

    /// 存储中的枚举/时间文本无法解析
    #[error("列 {field} 的值无法解析: {message}")]
    FieldValueError { field: String, message: String },

    #[error("仓储内部错误: {0}")]
    InternalError(String),
}

impl RepositoryError {
    /// 是否为唯一约束冲突
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, RepositoryError::UniqueConstraintViolation(_))
    }
}

/// 按扩展错误码归类约束失败
fn classify_constraint(extended_code: i32, msg: String) -> RepositoryError {
    use rusqlite::ffi;
    match extended_code {
        ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
            RepositoryError::UniqueConstraintViolation(msg)
        }
        ffi::SQLITE_CONSTRAINT_FOREIGNKEY => RepositoryError::ForeignKeyViolation(msg),
        ffi::SQLITE_CONSTRAINT_CHECK | ffi::SQLITE_CONSTRAINT_NOTNULL => {
            RepositoryError::CheckConstraintViolation(msg)
        }
        _ => RepositoryError::DatabaseQueryError(msg),
    }
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(e, msg) => {
                let msg = msg.unwrap_or_else(|| e.to_string());
                match e.code {
                    rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked => {
                        RepositoryError::DatabaseTransactionError(msg)
                    }
                    rusqlite::ErrorCode::ConstraintViolation => {
                        classify_constraint(e.extended_code, msg)
                    }
                    rusqlite::ErrorCode::CannotOpen => RepositoryError::DatabaseConnectionError(msg),
                    _ => RepositoryError::DatabaseQueryError(msg),
                }
            }
            rusqlite::Error::FromSqlConversionFailure(idx, _, inner) => {
                RepositoryError::FieldValueError {
                    field: format!("#{}", idx),
                    message: inner.to_string(),
                }
            }
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                entity: "row".to_string(),
                id: "-".to_string(),
            },
            other => RepositoryError::DatabaseQueryError(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;
