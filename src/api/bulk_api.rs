// ==========================================
// 批量编辑API
// ==========================================
// 职责: 封装 BulkMutationEngine,将引擎错误转换为 ApiError
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::ImportConfigReader;
use crate::engine::{BulkMutationEngine, BulkOperation, BulkOutcome};
use crate::repository::InventoryStore;
use std::sync::Arc;

/// 批量编辑API
pub struct BulkApi {
    engine: BulkMutationEngine<dyn InventoryStore, dyn ImportConfigReader>,
}

impl BulkApi {
    pub fn new(store: Arc<dyn InventoryStore>, config: Arc<dyn ImportConfigReader>) -> Self {
        Self {
            engine: BulkMutationEngine::new(store, config),
        }
    }

    /// 对选中物品应用批量操作
    pub async fn apply(&self, item_ids: &[String], operation: &BulkOperation) -> ApiResult<BulkOutcome> {
        Self::require_selection(item_ids)?;
        Ok(self.engine.apply(item_ids, operation).await?)
    }

    /// 删除选中物品
    pub async fn delete(&self, item_ids: &[String]) -> ApiResult<BulkOutcome> {
        Self::require_selection(item_ids)?;
        Ok(self.engine.delete(item_ids).await?)
    }

    fn require_selection(item_ids: &[String]) -> ApiResult<()> {
        if item_ids.iter().all(|id| id.trim().is_empty()) {
            return Err(ApiError::InvalidInput("未选择任何物品".to_string()));
        }
        Ok(())
    }
}
