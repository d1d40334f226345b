// ==========================================
// 公交轮班调度系统 - 在线连接注册表
// ==========================================
// 职责: 维护 接收人 -> 在线连接 映射，实现通知投递
// 说明: 由 AppState 持有并注入，连接方显式 connect/disconnect
// 红线: 投递失败（连接已关闭）只剔除该连接，不向调用方报错
// ==========================================

use crate::engine::events::{Notification, NotificationRelay};
use std::collections::HashMap;
use std::error::Error;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::debug;

/// 连接注册表错误
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("连接注册表锁已中毒: {0}")]
    LockPoisoned(String),
}

/// 连接ID
pub type ConnectionId = u64;

struct ConnectionEntry {
    id: ConnectionId,
    sender: UnboundedSender<Notification>,
}

/// 在线连接注册表
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: Mutex<HashMap<String, Vec<ConnectionEntry>>>,
    next_id: AtomicU64,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Vec<ConnectionEntry>>>, RegistryError> {
        self.connections
            .lock()
            .map_err(|e| RegistryError::LockPoisoned(e.to_string()))
    }

    /// 注册一个连接
    ///
    /// # 返回
    /// - (连接ID, 通知接收端): 接收端被 drop 后该连接在下次投递时被剔除
    pub fn connect(
        &self,
        recipient: &str,
    ) -> Result<(ConnectionId, UnboundedReceiver<Notification>), RegistryError> {
        let (sender, receiver) = unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let mut connections = self.lock()?;
        connections
            .entry(recipient.to_string())
            .or_default()
            .push(ConnectionEntry { id, sender });
        debug!(recipient = recipient, connection_id = id, "连接已注册");
        Ok((id, receiver))
    }

    /// 注销一个连接
    ///
    /// # 返回
    /// - true: 连接存在并已移除
    pub fn disconnect(
        &self,
        recipient: &str,
        connection_id: ConnectionId,
    ) -> Result<bool, RegistryError> {
        let mut connections = self.lock()?;
        let Some(entries) = connections.get_mut(recipient) else {
            return Ok(false);
        };
        let before = entries.len();
        entries.retain(|e| e.id != connection_id);
        let removed = entries.len() < before;
        if entries.is_empty() {
            connections.remove(recipient);
        }
        debug!(recipient = recipient, connection_id = connection_id, removed = removed, "连接已注销");
        Ok(removed)
    }

    /// 某接收人的在线连接数
    pub fn connection_count(&self, recipient: &str) -> usize {
        self.lock()
            .map(|c| c.get(recipient).map(Vec::len).unwrap_or(0))
            .unwrap_or(0)
    }
}

/// 发送到每个连接，剔除已关闭的连接
fn send_and_prune(entries: &mut Vec<ConnectionEntry>, notification: &Notification) -> usize {
    let mut delivered = 0;
    entries.retain(|entry| match entry.sender.send(notification.clone()) {
        Ok(()) => {
            delivered += 1;
            true
        }
        Err(_) => {
            debug!(connection_id = entry.id, "连接已关闭，剔除");
            false
        }
    });
    delivered
}

impl NotificationRelay for ConnectionRegistry {
    fn deliver(&self, notification: &Notification) -> Result<usize, Box<dyn Error + Send + Sync>> {
        let mut connections = self.lock()?;
        let Some(entries) = connections.get_mut(&notification.recipient) else {
            return Ok(0);
        };
        let delivered = send_and_prune(entries, notification);
        if entries.is_empty() {
            connections.remove(&notification.recipient);
        }
        Ok(delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::events::NotificationCategory;

    fn note(recipient: &str) -> Notification {
        Notification::new(recipient, "排班通知", "RIV 06:00", NotificationCategory::Schedule)
    }

    #[test]
    fn test_deliver_to_all_connections_of_recipient() {
        let registry = ConnectionRegistry::new();
        let (_, mut rx1) = registry.connect("D1").unwrap();
        let (_, mut rx2) = registry.connect("D1").unwrap();
        let (_, mut other) = registry.connect("D2").unwrap();

        assert_eq!(registry.deliver(&note("D1")).unwrap(), 2);
        assert_eq!(rx1.try_recv().unwrap().recipient, "D1");
        assert_eq!(rx2.try_recv().unwrap().recipient, "D1");
        assert!(other.try_recv().is_err());
    }

    #[test]
    fn test_offline_recipient_gets_zero() {
        let registry = ConnectionRegistry::new();
        assert_eq!(registry.deliver(&note("nobody")).unwrap(), 0);
    }

    #[test]
    fn test_closed_connection_is_pruned() {
        let registry = ConnectionRegistry::new();
        let (_, rx1) = registry.connect("D1").unwrap();
        let (_, mut rx2) = registry.connect("D1").unwrap();
        drop(rx1);

        assert_eq!(registry.deliver(&note("D1")).unwrap(), 1);
        assert_eq!(registry.connection_count("D1"), 1);
        assert!(rx2.try_recv().is_ok());
    }

    #[test]
    fn test_disconnect_removes_only_that_connection() {
        let registry = ConnectionRegistry::new();
        let (id1, _rx1) = registry.connect("D1").unwrap();
        let (_id2, _rx2) = registry.connect("D1").unwrap();

        assert!(registry.disconnect("D1", id1).unwrap());
        assert!(!registry.disconnect("D1", id1).unwrap());
        assert_eq!(registry.connection_count("D1"), 1);
    }

    #[test]
    fn test_poisoned_lock_is_reported() {
        let registry = std::sync::Arc::new(ConnectionRegistry::new());
        let poisoner = registry.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.connections.lock().unwrap();
            panic!("poison");
        })
        .join();

        assert!(matches!(registry.connect("D1"), Err(RegistryError::LockPoisoned(_))));
        assert!(registry.deliver(&note("D1")).is_err());
        assert_eq!(registry.connection_count("D1"), 0);
    }
}
