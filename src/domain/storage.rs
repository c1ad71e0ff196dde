// ==========================================
// 手术室库存系统 - 存储柜领域模型
// ==========================================
// 对齐: storages 表
// 物品只持有 storage_id,存储柜的生命周期归 storages 集合所有
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Storage {
    pub storage_id: String,
    pub room: String, // 所在手术间
    pub name: String, // 柜名
    pub created_at: Option<DateTime<Utc>>,
}

impl Storage {
    pub fn new(storage_id: impl Into<String>, room: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            storage_id: storage_id.into(),
            room: room.into(),
            name: name.into(),
            created_at: None,
        }
    }

    pub fn key(&self) -> StorageKey {
        StorageKey::new(&self.room, &self.name)
    }
}

// ==========================================
// StorageKey - (room, storage_name) 归一化匹配键
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StorageKey {
    room: String,
    name: String,
}

impl StorageKey {
    pub fn new(room: &str, name: &str) -> Self {
        Self {
            room: room.trim().to_lowercase(),
            name: name.trim().to_lowercase(),
        }
    }
}
