// ==========================================
// 手术室库存系统 - 库存导入引擎
// ==========================================
// 职责: 表格 → 规范化 → 对账 → 分组写入 → 操作日志
// 红线: 不含UI逻辑;所有数据库操作通过 InventoryStore
// 约束: 输入错误必须在任何写入之前返回
// ==========================================

use crate::config::ImportConfigReader;
use crate::domain::activity::{ActivityLog, ActivityType};
use crate::domain::mapping::ColumnMapping;
use crate::engine::batch_writer::{ChunkedBatchWriter, WriteSummary};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::reconciliation::{ReconcileSettings, ReconcileStats, ReconciliationEngine};
use crate::engine::snapshot::InventorySnapshot;
use crate::importer::record_normalizer::{NormalizeFlags, RecordNormalizer};
use crate::importer::table_parser::ParsedTable;
use crate::repository::inventory_store::InventoryStore;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};

// ==========================================
// ImportOptions - 导入选项
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOptions {
    /// name 取自 description 列
    pub desc_only: bool,
    /// 覆盖配置项 create_missing_storages
    pub create_missing_storages: Option<bool>,
}

// ==========================================
// ImportSummary - 导入结果
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub total_rows: usize,
    pub skipped_rows: usize, // 缺少 sku 被丢弃的行
    pub stats: ReconcileStats,
    pub write: WriteSummary,
    pub elapsed_ms: u64,
}

// ==========================================
// InventoryImporter - 库存导入引擎
// ==========================================
/// 库存导入引擎
///
/// # 流程
/// 1. 规范化记录(校验映射,丢弃无 sku 的行)
/// 2. 读取配置(写组上限、模糊阈值、词表)
/// 3. 加载快照
/// 4. 对账生成写操作
/// 5. 分组提交
/// 6. 记录操作日志(失败只告警)
pub struct InventoryImporter<S: ?Sized, C: ?Sized>
where
    S: InventoryStore,
    C: ImportConfigReader,
{
    store: Arc<S>,
    config: Arc<C>,
}

impl<S: ?Sized, C: ?Sized> InventoryImporter<S, C>
where
    S: InventoryStore,
    C: ImportConfigReader,
{
    /// 创建新的 InventoryImporter 实例
    ///
    /// # 参数
    /// - store: 库存存储
    /// - config: 配置读取器
    pub fn new(store: Arc<S>, config: Arc<C>) -> Self {
        Self { store, config }
    }

    /// 导入已解析的表格(主入口)
    ///
    /// # 参数
    /// - table: 解析结果
    /// - mapping: 操作员确认后的列映射
    /// - options: 导入选项
    ///
    /// # 返回
    /// - Ok(ImportSummary): 全部写组提交成功
    /// - Err(Import): 输入错误,未写入任何数据
    /// - Err(GroupCommitFailed): 部分写组已生效,可安全重跑
    #[instrument(skip(self, table, mapping), fields(rows = table.rows.len()))]
    pub async fn import_table(
        &self,
        table: &ParsedTable,
        mapping: &ColumnMapping,
        options: ImportOptions,
    ) -> EngineResult<ImportSummary> {
        let start_time = Instant::now();

        // === 步骤 1: 规范化 ===
        let records = RecordNormalizer::normalize(
            table,
            mapping,
            NormalizeFlags {
                desc_only: options.desc_only,
            },
        )?;

        // === 步骤 2: 读取配置 ===
        let settings = self.load_settings(options).await?;
        let group_limit = self
            .config
            .get_write_group_limit()
            .await
            .map_err(|e| EngineError::Config(e.to_string()))?;

        // === 步骤 3: 加载快照 ===
        let snapshot = InventorySnapshot::load(self.store.as_ref())
            .await
            .map_err(EngineError::Snapshot)?;

        // === 步骤 4: 对账 ===
        let plan = ReconciliationEngine::new(settings).reconcile(&records, &snapshot);

        // === 步骤 5: 分组提交 ===
        let writer = ChunkedBatchWriter::new(self.store.clone(), group_limit);
        let write = writer.write_all(plan.ops).await?;

        let summary = ImportSummary {
            total_rows: table.rows.len(),
            skipped_rows: table.rows.len() - records.len(),
            stats: plan.stats,
            write,
            elapsed_ms: start_time.elapsed().as_millis() as u64,
        };

        // === 步骤 6: 操作日志 ===
        self.log_activity(&summary).await;

        info!(
            records = summary.stats.records,
            inserted = summary.stats.inserted,
            updated = summary.stats.updated,
            storages_created = summary.stats.storages_created,
            groups = summary.write.groups,
            elapsed_ms = summary.elapsed_ms,
            "库存导入完成"
        );
        Ok(summary)
    }

    async fn load_settings(&self, options: ImportOptions) -> EngineResult<ReconcileSettings> {
        let config_err = |e: Box<dyn std::error::Error + Send + Sync>| EngineError::Config(e.to_string());

        let create_missing_storages = match options.create_missing_storages {
            Some(flag) => flag,
            None => self.config.get_create_missing_storages().await.map_err(config_err)?,
        };

        Ok(ReconcileSettings {
            max_distance: self.config.get_fuzzy_max_distance().await.map_err(config_err)?,
            category_vocabulary: self.config.get_category_vocabulary().await.map_err(config_err)?,
            type_vocabulary: self.config.get_type_vocabulary().await.map_err(config_err)?,
            create_missing_storages,
        })
    }

    async fn log_activity(&self, summary: &ImportSummary) {
        let log = ActivityLog::new(
            ActivityType::Import,
            format!("Rows: {}", summary.stats.records),
            Some(json!({
                "total_rows": summary.total_rows,
                "records": summary.stats.records,
                "inserted": summary.stats.inserted,
                "updated": summary.stats.updated,
                "storages_created": summary.stats.storages_created,
                "unplaced": summary.stats.unplaced,
                "groups": summary.write.groups,
            })),
        );
        if let Err(e) = self.store.append_activity(&log).await {
            warn!(error = %e, "导入日志写入失败(数据已提交)");
        }
    }
}
