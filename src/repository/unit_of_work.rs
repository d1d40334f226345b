// ==========================================
// 公交轮班调度系统 - 工作单元（事务边界）
// ==========================================
// 职责: 在单个 BEGIN IMMEDIATE 事务内执行一组仓储写入
// 红线: Ok 则提交，Err 则回滚；不做自动重试
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::sync::{Arc, Mutex, MutexGuard};

/// 工作单元
///
/// 事务以 IMMEDIATE 方式开启：进入事务即持有写锁，
/// 多个连接对同一库的并发写入在存储层串行化（由 busy_timeout 排队）。
pub struct UnitOfWork {
    conn: Arc<Mutex<Connection>>,
}

impl UnitOfWork {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 在事务中执行闭包
    ///
    /// # 参数
    /// - `work`: 接收事务引用的闭包；事务可作为 `&Connection` 传给各仓储的 `*_in` 函数
    ///
    /// # 返回
    /// - 闭包返回 Ok 时提交并返回其结果
    /// - 闭包返回 Err 时回滚并原样返回错误
    pub fn execute<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, E>,
        E: From<RepositoryError>,
    {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        match work(&tx) {
            Ok(value) => {
                tx.commit()
                    .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    tracing::error!("事务回滚失败: {}", rollback_err);
                }
                Err(err)
            }
        }
    }
}
