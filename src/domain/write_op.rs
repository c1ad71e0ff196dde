// ==========================================
// 手术室库存系统 - 持久化操作
// ==========================================
// 职责: 引擎产出、存储层消费的写操作描述
// 约束: 所有 ID 在客户端预先分配,使"先建柜再引用"可落在同一写组
// ==========================================

use crate::domain::item::{FieldUpdate, InventoryItem};
use crate::domain::storage::Storage;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum WriteOp {
    /// 新建存储柜(storage_id 已预分配)
    CreateStorage(Storage),
    /// 新增物品(item_id 已预分配)
    InsertItem(InventoryItem),
    /// 按字段更新已有物品
    UpdateItem {
        item_id: String,
        updates: Vec<FieldUpdate>,
    },
    /// 删除物品
    DeleteItem { item_id: String },
}
