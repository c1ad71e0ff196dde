// ==========================================
// 手术室库存系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod activity_log_repo;
pub mod error;
pub mod inventory_store;
pub mod inventory_store_impl;

// 重导出核心仓储
pub use activity_log_repo::ActivityLogRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use inventory_store::{InventoryStore, MAX_GROUP_OPS, MAX_WRITE_GROUP_LIMIT};
pub use inventory_store_impl::SqliteInventoryStore;
