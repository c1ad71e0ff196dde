// ==========================================
// 手术室库存系统 - CSV 导出器
// ==========================================
// 列顺序与导入别名表兼容,导出文件可直接重新导入
// 所有字段加引号;system 以 "; " 连接;换行压平为空格
// ==========================================

use crate::domain::item::InventoryItem;
use crate::domain::storage::Storage;
use crate::importer::error::{ImportError, ImportResult};
use csv::{QuoteStyle, WriterBuilder};
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use tracing::info;

pub const EXPORT_HEADERS: [&str; 16] = [
    "SKU",
    "Product Description",
    "Supplier",
    "System",
    "Category",
    "Type",
    "Qty",
    "Min",
    "Max",
    "ROP",
    "Usage",
    "Room",
    "Storage",
    "Drawer",
    "Slot",
    "Comments",
];

pub struct InventoryExporter;

impl InventoryExporter {
    /// 写出到任意 Writer
    pub fn write<W: Write>(writer: W, items: &[InventoryItem], storages: &[Storage]) -> ImportResult<usize> {
        let by_id: HashMap<&str, &Storage> = storages.iter().map(|s| (s.storage_id.as_str(), s)).collect();

        let mut csv_writer = WriterBuilder::new().quote_style(QuoteStyle::Always).from_writer(writer);
        csv_writer
            .write_record(EXPORT_HEADERS)
            .map_err(|e| ImportError::ExportError(e.to_string()))?;

        for item in items {
            let (room, storage_name, drawer, slot) = match &item.location {
                Some(loc) => {
                    let storage = by_id.get(loc.storage_id.as_str());
                    (
                        storage.map(|s| s.room.clone()).unwrap_or_default(),
                        storage.map(|s| s.name.clone()).unwrap_or_default(),
                        loc.drawer.clone(),
                        loc.slot.clone(),
                    )
                }
                None => Default::default(),
            };

            let record = [
                item.sku.clone(),
                flatten(&item.name),
                item.supplier.clone().unwrap_or_default(),
                item.system.join("; "),
                item.category.map(|c| c.to_string()).unwrap_or_default(),
                item.item_type.clone().unwrap_or_default(),
                item.qty.to_string(),
                item.min.to_string(),
                item.max.to_string(),
                item.rop.to_string(),
                item.usage.map(|u| u.to_string()).unwrap_or_default(),
                room,
                storage_name,
                drawer,
                slot,
                flatten(&item.comments),
            ];
            csv_writer
                .write_record(&record)
                .map_err(|e| ImportError::ExportError(e.to_string()))?;
        }

        csv_writer.flush()?;
        Ok(items.len())
    }

    pub fn export_to_string(items: &[InventoryItem], storages: &[Storage]) -> ImportResult<String> {
        let mut buffer = Vec::new();
        Self::write(&mut buffer, items, storages)?;
        String::from_utf8(buffer).map_err(|e| ImportError::ExportError(e.to_string()))
    }

    pub fn export_to_file(path: &Path, items: &[InventoryItem], storages: &[Storage]) -> ImportResult<usize> {
        let file = std::fs::File::create(path)?;
        let count = Self::write(file, items, storages)?;
        info!(file = %path.display(), items = count, "库存导出完成");
        Ok(count)
    }
}

fn flatten(value: &str) -> String {
    value.replace("\r\n", " ").replace(['\n', '\r'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::item::ItemLocation;
    use crate::domain::types::{Category, MaxQty};
    use crate::importer::table_parser::FlatTableParser;

    #[test]
    fn test_export_quotes_and_flattens() {
        let storage = Storage::new("s1", "Theatre 2", "Cabinet B");
        let mut item = InventoryItem::new("i1", "AR-1");
        item.name = "Anchor, \"Corkscrew\"".to_string();
        item.system = vec!["Shoulder".to_string(), "Knee".to_string()];
        item.category = Some(Category::Elective);
        item.max = MaxQty::Cap(8);
        item.comments = "line1\nline2".to_string();
        item.location = Some(ItemLocation {
            storage_id: "s1".to_string(),
            drawer: "3".to_string(),
            slot: "".to_string(),
        });
        let unplaced = InventoryItem::new("i2", "AR-2");

        let text = InventoryExporter::export_to_string(&[item, unplaced], &[storage]).unwrap();
        assert!(text.starts_with("\"SKU\",\"Product Description\""));

        let table = FlatTableParser::default().parse_text(&text).unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.cell(0, 1), "Anchor, \"Corkscrew\"");
        assert_eq!(table.cell(0, 3), "Shoulder; Knee");
        assert_eq!(table.cell(0, 4), "elective");
        assert_eq!(table.cell(0, 8), "8");
        assert_eq!(table.cell(0, 11), "Theatre 2");
        assert_eq!(table.cell(0, 12), "Cabinet B");
        assert_eq!(table.cell(0, 15), "line1 line2");
        assert_eq!(table.cell(1, 8), "");
        assert_eq!(table.cell(1, 11), "");
    }
}
