// ==========================================
// 手术室库存系统 - 库存存储 Trait
// ==========================================
// 职责: 定义引擎所需的持久化接口(不包含业务逻辑)
// 红线: Repository 不含业务规则,只做数据读写
// ==========================================

use crate::domain::activity::ActivityLog;
use crate::domain::item::InventoryItem;
use crate::domain::storage::Storage;
use crate::domain::write_op::WriteOp;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

/// 存储层单个原子写组的操作上限
pub const MAX_GROUP_OPS: usize = 500;

/// 引擎可配置的写组上限(严格低于存储层上限)
pub const MAX_WRITE_GROUP_LIMIT: usize = MAX_GROUP_OPS - 1;

// ==========================================
// InventoryStore Trait
// ==========================================
// 实现者: SqliteInventoryStore(使用 rusqlite)
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// 读取全部物品(构建快照用)
    async fn load_items(&self) -> RepositoryResult<Vec<InventoryItem>>;

    /// 读取全部存储柜(构建快照用)
    async fn load_storages(&self) -> RepositoryResult<Vec<Storage>>;

    /// 原子提交一个写组
    ///
    /// # 参数
    /// - ops: 按提交顺序排列的写操作(不超过 MAX_GROUP_OPS)
    ///
    /// # 返回
    /// - Ok(usize): 已应用的操作数
    /// - Err: 整组回滚
    async fn commit_group(&self, ops: &[WriteOp]) -> RepositoryResult<usize>;

    /// 追加操作日志
    async fn append_activity(&self, log: &ActivityLog) -> RepositoryResult<()>;
}
