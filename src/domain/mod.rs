// ==========================================
// 手术室库存系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、值类型、写操作描述
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod activity;
pub mod item;
pub mod mapping;
pub mod storage;
pub mod types;
pub mod write_op;

// 重导出核心类型
pub use activity::{ActivityLog, ActivityType};
pub use item::{FieldUpdate, InventoryItem, ItemField, ItemLocation};
pub use mapping::{ColumnMapping, TargetField};
pub use storage::{Storage, StorageKey};
pub use types::{Category, MaxQty, StockLevel, Usage};
pub use write_op::WriteOp;
