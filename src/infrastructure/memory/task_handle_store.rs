//! In-Memory Task Handle Store Implementation

use dashmap::DashMap;
use std::sync::Arc;

use crate::application::ports::{StoreError, TaskHandleStorePort, ACTIVE_TASK_KEY};
use crate::domain::TaskId;

/// 内存活动任务句柄存储
///
/// 进程退出后句柄丢失
pub struct InMemoryTaskHandleStore {
    /// key -> TaskId
    handles: DashMap<String, TaskId>,
    key: String,
}

impl InMemoryTaskHandleStore {
    pub fn new() -> Self {
        Self::with_key(ACTIVE_TASK_KEY)
    }

    pub fn with_key(key: impl Into<String>) -> Self {
        Self {
            handles: DashMap::new(),
            key: key.into(),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl Default for InMemoryTaskHandleStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskHandleStorePort for InMemoryTaskHandleStore {
    fn set(&self, task_id: &TaskId) -> Result<(), StoreError> {
        if let Some(previous) = self.handles.insert(self.key.clone(), task_id.clone()) {
            tracing::debug!(previous = %previous, task_id = %task_id, "Active task replaced");
        }
        Ok(())
    }

    fn get(&self) -> Result<Option<TaskId>, StoreError> {
        Ok(self.handles.get(&self.key).map(|id| id.clone()))
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.handles.remove(&self.key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_lifecycle() {
        let store = InMemoryTaskHandleStore::new();
        assert_eq!(store.get().unwrap(), None);

        let first = TaskId::new("first").unwrap();
        store.set(&first).unwrap();
        assert_eq!(store.get().unwrap(), Some(first));

        // 新的上传覆盖旧句柄
        let second = TaskId::new("second").unwrap();
        store.set(&second).unwrap();
        assert_eq!(store.get().unwrap(), Some(second));

        store.clear().unwrap();
        assert_eq!(store.get().unwrap(), None);

        // 重复清除不报错
        store.clear().unwrap();
    }
}
