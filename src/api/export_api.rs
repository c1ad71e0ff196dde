// ==========================================
// 库存导出API
// ==========================================
// 职责: 导出当前库存为 CSV(可经导入流程重新导入)
// ==========================================

use crate::api::error::ApiResult;
use crate::engine::InventorySnapshot;
use crate::importer::InventoryExporter;
use crate::repository::InventoryStore;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// 库存导出API
pub struct ExportApi {
    store: Arc<dyn InventoryStore>,
}

impl ExportApi {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self { store }
    }

    /// 导出到文件,返回导出行数
    pub async fn export_csv(&self, path: &Path) -> ApiResult<usize> {
        let snapshot = InventorySnapshot::load(self.store.as_ref()).await?;
        let rows = InventoryExporter::export_to_file(path, snapshot.items(), snapshot.storages())?;
        info!(rows, path = %path.display(), "库存导出完成");
        Ok(rows)
    }

    /// 导出为字符串
    pub async fn export_csv_string(&self) -> ApiResult<String> {
        let snapshot = InventorySnapshot::load(self.store.as_ref()).await?;
        Ok(InventoryExporter::export_to_string(snapshot.items(), snapshot.storages())?)
    }
}
