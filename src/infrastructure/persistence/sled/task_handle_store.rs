//! Sled-based Task Handle Store Implementation
//!
//! 活动任务句柄写入 sled，进程重启后可恢复

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sled::Db;
use std::path::Path;
use std::sync::Arc;

use crate::application::ports::{StoreError, TaskHandleStorePort, ACTIVE_TASK_KEY};
use crate::domain::TaskId;

/// Sled 句柄存储配置
#[derive(Debug, Clone)]
pub struct SledHandleStoreConfig {
    /// 数据库路径
    pub db_path: String,
    /// 存储键
    pub key: String,
}

impl Default for SledHandleStoreConfig {
    fn default() -> Self {
        Self {
            db_path: "data/streamscale.sled".to_string(),
            key: ACTIVE_TASK_KEY.to_string(),
        }
    }
}

/// 内部句柄条目
#[derive(Debug, Clone, Serialize, Deserialize)]
struct InternalHandleEntry {
    task_id: String,
    stored_at: i64,
}

/// Sled 活动任务句柄存储
pub struct SledTaskHandleStore {
    db: Db,
    key: String,
}

impl SledTaskHandleStore {
    /// 创建新的存储实例
    pub fn new(config: &SledHandleStoreConfig) -> Result<Self, StoreError> {
        let db = sled::open(&config.db_path)
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;

        tracing::info!(
            db_path = %config.db_path,
            key = %config.key,
            "SledTaskHandleStore initialized"
        );

        Ok(Self {
            db,
            key: config.key.clone(),
        })
    }

    /// 打开现有存储
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let config = SledHandleStoreConfig {
            db_path: path.as_ref().to_string_lossy().to_string(),
            ..Default::default()
        };
        Self::new(&config)
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 句柄写入时间
    pub fn stored_at(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        Ok(self
            .read_entry()?
            .and_then(|entry| DateTime::from_timestamp(entry.stored_at, 0)))
    }

    fn read_entry(&self) -> Result<Option<InternalHandleEntry>, StoreError> {
        let Some(data) = self
            .db
            .get(&self.key)
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?
        else {
            return Ok(None);
        };

        let entry = bincode::deserialize(&data)
            .map_err(|e| StoreError::SerializationError(e.to_string()))?;
        Ok(Some(entry))
    }
}

impl TaskHandleStorePort for SledTaskHandleStore {
    fn set(&self, task_id: &TaskId) -> Result<(), StoreError> {
        let entry = InternalHandleEntry {
            task_id: task_id.as_str().to_string(),
            stored_at: Utc::now().timestamp(),
        };
        let bytes =
            bincode::serialize(&entry).map_err(|e| StoreError::SerializationError(e.to_string()))?;

        self.db
            .insert(&self.key, bytes)
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;
        // 立即落盘，进程被杀也不丢句柄
        self.db
            .flush()
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;

        tracing::debug!(task_id = %task_id, "Active task persisted");
        Ok(())
    }

    fn get(&self) -> Result<Option<TaskId>, StoreError> {
        match self.read_entry()? {
            Some(entry) => TaskId::new(entry.task_id)
                .map(Some)
                .map_err(|e| StoreError::InvalidHandle(e.to_string())),
            None => Ok(None),
        }
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.db
            .remove(&self.key)
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;
        self.db
            .flush()
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;
        Ok(())
    }
}
