// ==========================================
// 库存导入API
// ==========================================
// 职责: 文件预览(表头/样例行/建议映射)与导入
// 流程: 预览 → 操作员确认映射 → 导入
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::ImportConfigReader;
use crate::domain::mapping::{ColumnMapping, TargetField};
use crate::engine::{ImportOptions, ImportSummary, InventoryImporter};
use crate::importer::{FileParser, HeaderMapper, ParsedTable, UniversalFileParser};
use crate::repository::InventoryStore;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument};

/// 预览返回的样例行数
pub const PREVIEW_SAMPLE_ROWS: usize = 5;

/// 文件预览结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportPreview {
    pub headers: Vec<String>,
    pub row_count: usize,
    pub sample_rows: Vec<Vec<String>>,
    /// 建议映射(操作员可修改)
    pub suggested_mapping: ColumnMapping,
    /// 未能自动映射的表头
    pub unmapped_headers: Vec<String>,
    /// 是否已映射 sku
    pub sku_mapped: bool,
}

impl ImportPreview {
    pub fn from_table(table: &ParsedTable) -> Self {
        let suggested_mapping = HeaderMapper::suggest(&table.headers);
        let unmapped_headers = table
            .headers
            .iter()
            .enumerate()
            .filter(|(index, _)| !suggested_mapping.iter().any(|(_, column)| column == *index))
            .map(|(_, header)| header.clone())
            .collect();

        Self {
            headers: table.headers.clone(),
            row_count: table.row_count(),
            sample_rows: table.rows.iter().take(PREVIEW_SAMPLE_ROWS).cloned().collect(),
            sku_mapped: suggested_mapping.is_mapped(TargetField::Sku),
            suggested_mapping,
            unmapped_headers,
        }
    }
}

/// 库存导入API
pub struct ImportApi {
    store: Arc<dyn InventoryStore>,
    config: Arc<dyn ImportConfigReader>,
}

impl ImportApi {
    /// 创建新的ImportApi实例
    pub fn new(store: Arc<dyn InventoryStore>, config: Arc<dyn ImportConfigReader>) -> Self {
        Self { store, config }
    }

    /// 解析文件并给出建议映射(不写入)
    #[instrument(skip(self), fields(file = %file_path.display()))]
    pub fn preview_file(&self, file_path: &Path) -> ApiResult<ImportPreview> {
        let table = Self::parse(file_path)?;
        let preview = ImportPreview::from_table(&table);
        info!(
            rows = preview.row_count,
            mapped = preview.suggested_mapping.len(),
            sku_mapped = preview.sku_mapped,
            "文件预览完成"
        );
        Ok(preview)
    }

    /// 导入已解析的表格
    pub async fn import_table(
        &self,
        table: &ParsedTable,
        mapping: &ColumnMapping,
        options: ImportOptions,
    ) -> ApiResult<ImportSummary> {
        let importer = InventoryImporter::new(self.store.clone(), self.config.clone());
        Ok(importer.import_table(table, mapping, options).await?)
    }

    /// 导入文件
    ///
    /// # 参数
    /// - mapping: 操作员确认的映射;None 时使用表头建议映射
    #[instrument(skip(self, mapping), fields(file = %file_path.display()))]
    pub async fn import_file(
        &self,
        file_path: &Path,
        mapping: Option<ColumnMapping>,
        options: ImportOptions,
    ) -> ApiResult<ImportSummary> {
        let table = Self::parse(file_path)?;
        let mapping = mapping.unwrap_or_else(|| HeaderMapper::suggest(&table.headers));
        self.import_table(&table, &mapping, options).await
    }

    fn parse(file_path: &Path) -> ApiResult<ParsedTable> {
        if !file_path.exists() {
            return Err(ApiError::InvalidInput(format!("文件不存在: {}", file_path.display())));
        }
        Ok(UniversalFileParser.parse_file(file_path)?)
    }
}
