// ==========================================
// 手术室库存系统 - 引擎层
// ==========================================
// 职责: 对账、分组写入、批量编辑,不拼 SQL
// 红线: Engine 不拼 SQL,所有持久化经由 InventoryStore
// ==========================================

pub mod batch_writer;
pub mod bulk_mutation;
pub mod error;
pub mod importer;
pub mod reconciliation;
pub mod snapshot;

// 重导出核心引擎
pub use batch_writer::{BatchBuilder, ChunkedBatchWriter, WriteSummary};
pub use bulk_mutation::{
    apply_tag_op, BulkMutationEngine, BulkOperation, BulkOutcome, LocationOp, StorageTarget, TagOp, ValueOp,
};
pub use error::{EngineError, EngineResult};
pub use importer::{ImportOptions, ImportSummary, InventoryImporter};
pub use reconciliation::{ReconcileSettings, ReconcileStats, ReconciliationEngine, ReconciliationPlan};
pub use snapshot::InventorySnapshot;
