// ==========================================
// 手术室库存系统 - 记录规范化器
// ==========================================
// 职责: (headers, rows, mapping, flags) → 规范记录
// 规则:
// - 丢弃映射后 sku 为空的行
// - 数值字段: 解析失败/缺失 → 0,负数 → 0,小数向下取整
// - max: 单元格为空 → 无上限(区别于上限 0)
// - system: 按 ';' / ',' 拆分去重,仅在映射了 system 列时生效
// - category/type/supplier: 仅去空白,模糊匹配留给对账阶段
// - 每个字段记录其列是否被映射(None = 未映射,更新时保持原值)
// ==========================================

use crate::domain::item::{clean, split_tags};
use crate::domain::mapping::{ColumnMapping, TargetField};
use crate::domain::types::MaxQty;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::table_parser::ParsedTable;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

// ==========================================
// NormalizeFlags - 规范化选项
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeFlags {
    /// name 取自 description 列(仅当 description 列已映射)
    pub desc_only: bool,
}

// ==========================================
// Placement - 位置原始值
// ==========================================
// 仅当 room 与 storageName 两列都已映射时产生
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub room: String,
    pub storage_name: String,
    pub drawer: String,
    pub slot: String,
}

impl Placement {
    /// room 与 storage_name 均非空
    pub fn is_complete(&self) -> bool {
        !self.room.is_empty() && !self.storage_name.is_empty()
    }

    /// 两者皆空(显式清空位置)
    pub fn is_blank(&self) -> bool {
        self.room.is_empty() && self.storage_name.is_empty()
    }
}

// ==========================================
// NormalizedRecord - 规范记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub row_index: usize, // 数据行下标(0 起,不含表头)
    pub sku: String,
    pub name: Option<String>,
    pub supplier: Option<String>,
    pub system: Option<Vec<String>>,
    pub category: Option<String>,
    pub item_type: Option<String>,
    pub qty: Option<u32>,
    pub min: Option<u32>,
    pub max: Option<MaxQty>,
    pub rop: Option<u32>,
    pub usage: Option<String>,
    pub placement: Option<Placement>,
    pub comments: Option<String>,
}

// ==========================================
// RecordNormalizer
// ==========================================
pub struct RecordNormalizer;

impl RecordNormalizer {
    /// 导入前校验映射(任何写入之前)
    pub fn validate_mapping(table: &ParsedTable, mapping: &ColumnMapping) -> ImportResult<()> {
        if table.headers.is_empty() || table.rows.is_empty() {
            return Err(ImportError::EmptyTable);
        }
        if !mapping.is_mapped(TargetField::Sku) {
            return Err(ImportError::SkuColumnUnmapped);
        }
        if let Some((field, column)) = mapping.out_of_range(table.headers.len()) {
            return Err(ImportError::ColumnOutOfRange {
                field: field.key().to_string(),
                column,
                header_count: table.headers.len(),
            });
        }
        Ok(())
    }

    /// 生成规范记录
    ///
    /// # 返回
    /// - Ok(records): 至少一条有效记录
    /// - Err: 空表 / sku 未映射 / 映射越界 / 无有效记录
    #[instrument(skip(table, mapping), fields(rows = table.rows.len()))]
    pub fn normalize(
        table: &ParsedTable,
        mapping: &ColumnMapping,
        flags: NormalizeFlags,
    ) -> ImportResult<Vec<NormalizedRecord>> {
        Self::validate_mapping(table, mapping)?;

        let records: Vec<NormalizedRecord> = (0..table.rows.len())
            .filter_map(|row| Self::normalize_row(table, mapping, flags, row))
            .collect();

        if records.is_empty() {
            return Err(ImportError::NoValidRows {
                total_rows: table.rows.len(),
            });
        }

        debug!(
            total_rows = table.rows.len(),
            records = records.len(),
            dropped = table.rows.len() - records.len(),
            "记录规范化完成"
        );
        Ok(records)
    }

    fn normalize_row(
        table: &ParsedTable,
        mapping: &ColumnMapping,
        flags: NormalizeFlags,
        row: usize,
    ) -> Option<NormalizedRecord> {
        let get = |field: TargetField| -> Option<String> {
            mapping.get(field).map(|column| clean(table.cell(row, column)))
        };

        let sku = get(TargetField::Sku).filter(|s| !s.is_empty())?;

        let name = match (flags.desc_only, get(TargetField::Description)) {
            (true, Some(description)) => Some(description),
            _ => get(TargetField::Name),
        };

        let placement = match (get(TargetField::Room), get(TargetField::StorageName)) {
            (Some(room), Some(storage_name)) => Some(Placement {
                room,
                storage_name,
                drawer: get(TargetField::Drawer).unwrap_or_default(),
                slot: get(TargetField::Slot).unwrap_or_default(),
            }),
            _ => None,
        };

        Some(NormalizedRecord {
            row_index: row,
            sku,
            name,
            supplier: get(TargetField::Supplier),
            system: get(TargetField::System).map(|raw| split_tags(&raw)),
            category: get(TargetField::Category),
            item_type: get(TargetField::Type),
            qty: get(TargetField::Qty).map(|v| parse_count(&v)),
            min: get(TargetField::Min).map(|v| parse_count(&v)),
            max: get(TargetField::Max).map(|v| parse_max(&v)),
            rop: get(TargetField::Rop).map(|v| parse_count(&v)),
            usage: get(TargetField::Usage),
            placement,
            comments: get(TargetField::Comments),
        })
    }
}

/// 解析非负整数(宽松): 无法解析或负数 → 0,小数向下取整
pub fn parse_count(value: &str) -> u32 {
    let trimmed = value.trim();
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() && n > 0.0 => {
            let floored = n.floor();
            if floored >= f64::from(u32::MAX) {
                u32::MAX
            } else {
                floored as u32
            }
        }
        _ => 0,
    }
}

/// 解析上限: 空 → 无上限
pub fn parse_max(value: &str) -> MaxQty {
    if value.trim().is_empty() {
        MaxQty::Unbounded
    } else {
        MaxQty::Cap(parse_count(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> ParsedTable {
        ParsedTable {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }

    fn mapping(pairs: &[(TargetField, usize)]) -> ColumnMapping {
        let mut m = ColumnMapping::new();
        for (field, column) in pairs {
            m.set(*field, *column);
        }
        m
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("12"), 12);
        assert_eq!(parse_count(" 3.9 "), 3);
        assert_eq!(parse_count("-4"), 0);
        assert_eq!(parse_count("abc"), 0);
        assert_eq!(parse_count(""), 0);
        assert_eq!(parse_max(""), MaxQty::Unbounded);
        assert_eq!(parse_max("0"), MaxQty::Cap(0));
        assert_eq!(parse_max("n/a"), MaxQty::Cap(0));
    }

    #[test]
    fn test_sku_unmapped_is_rejected() {
        let t = table(&["Name", "Qty"], &[&["Swab", "3"]]);
        let m = mapping(&[(TargetField::Name, 0), (TargetField::Qty, 1)]);
        let result = RecordNormalizer::normalize(&t, &m, NormalizeFlags::default());
        assert!(matches!(result, Err(ImportError::SkuColumnUnmapped)));
    }

    #[test]
    fn test_empty_table_and_no_valid_rows() {
        let m = mapping(&[(TargetField::Sku, 0)]);
        let empty = table(&["SKU"], &[]);
        assert!(matches!(
            RecordNormalizer::normalize(&empty, &m, NormalizeFlags::default()),
            Err(ImportError::EmptyTable)
        ));

        let blank_skus = table(&["SKU", "Name"], &[&[" ", "Swab"], &["", "Drape"]]);
        assert!(matches!(
            RecordNormalizer::normalize(&blank_skus, &m, NormalizeFlags::default()),
            Err(ImportError::NoValidRows { total_rows: 2 })
        ));
    }

    #[test]
    fn test_column_out_of_range() {
        let t = table(&["SKU"], &[&["A1"]]);
        let m = mapping(&[(TargetField::Sku, 0), (TargetField::Qty, 5)]);
        let result = RecordNormalizer::normalize(&t, &m, NormalizeFlags::default());
        assert!(matches!(
            result,
            Err(ImportError::ColumnOutOfRange { column: 5, header_count: 1, .. })
        ));
    }

    #[test]
    fn test_normalize_fields_and_mapping_presence() {
        let t = table(
            &["SKU", "Name", "System", "Qty", "Max", "Room", "Storage", "Drawer"],
            &[
                &[" A1 ", " Swab ", "Hip; Knee, Hip", "4.7", "", "Theatre 1", "Cab A", "2"],
                &["", "No sku", "", "", "", "", "", ""],
                &["B2", "Drape", "", "x", "10", "Theatre 1", "", ""],
            ],
        );
        let m = mapping(&[
            (TargetField::Sku, 0),
            (TargetField::Name, 1),
            (TargetField::System, 2),
            (TargetField::Qty, 3),
            (TargetField::Max, 4),
            (TargetField::Room, 5),
            (TargetField::StorageName, 6),
            (TargetField::Drawer, 7),
        ]);

        let records = RecordNormalizer::normalize(&t, &m, NormalizeFlags::default()).unwrap();
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.sku, "A1");
        assert_eq!(first.name.as_deref(), Some("Swab"));
        assert_eq!(first.system, Some(vec!["Hip".to_string(), "Knee".to_string()]));
        assert_eq!(first.qty, Some(4));
        assert_eq!(first.max, Some(MaxQty::Unbounded));
        assert_eq!(first.supplier, None);
        assert_eq!(first.min, None);
        let placement = first.placement.as_ref().unwrap();
        assert!(placement.is_complete());
        assert_eq!(placement.drawer, "2");
        assert_eq!(placement.slot, "");

        let second = &records[1];
        assert_eq!(second.row_index, 2);
        assert_eq!(second.system, Some(vec![]));
        assert_eq!(second.qty, Some(0));
        assert_eq!(second.max, Some(MaxQty::Cap(10)));
        assert!(!second.placement.as_ref().unwrap().is_complete());
    }

    #[test]
    fn test_desc_only_sources_name_from_description() {
        let t = table(&["SKU", "Name", "Description"], &[&["A1", "Short", "Long description"]]);
        let m = mapping(&[
            (TargetField::Sku, 0),
            (TargetField::Name, 1),
            (TargetField::Description, 2),
        ]);

        let plain = RecordNormalizer::normalize(&t, &m, NormalizeFlags::default()).unwrap();
        assert_eq!(plain[0].name.as_deref(), Some("Short"));

        let desc = RecordNormalizer::normalize(&t, &m, NormalizeFlags { desc_only: true }).unwrap();
        assert_eq!(desc[0].name.as_deref(), Some("Long description"));
    }
}
