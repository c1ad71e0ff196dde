// ==========================================
// 手术室库存系统 - 表头映射器
// ==========================================
// 职责: 表头 → 目标字段的启发式猜测
// 规则:
// 1. 表头归一化: 小写 + 去除所有非字母数字字符
// 2. 精确别名表命中优先
// 3. 未命中时按关键词匹配,关键词只能从词首开始(最靠前的词优先,同位置取最长)
// 4. 多列映射到同一字段时,第一列胜出
// 约束: 不报告未映射的列;sku 必填由下游校验
// ==========================================

use crate::domain::mapping::{ColumnMapping, TargetField};
use tracing::debug;

// ==========================================
// 精确别名表(归一化后的表头)
// ==========================================
const EXACT_ALIASES: &[(&str, TargetField)] = &[
    // sku
    ("sku", TargetField::Sku),
    ("code", TargetField::Sku),
    ("productcode", TargetField::Sku),
    ("itemcode", TargetField::Sku),
    ("catalogue", TargetField::Sku),
    ("catalog", TargetField::Sku),
    ("cataloguenumber", TargetField::Sku),
    ("catalognumber", TargetField::Sku),
    ("catno", TargetField::Sku),
    ("itemno", TargetField::Sku),
    ("itemnumber", TargetField::Sku),
    ("partno", TargetField::Sku),
    ("partnumber", TargetField::Sku),
    ("stockcode", TargetField::Sku),
    ("stockno", TargetField::Sku),
    ("stocknumber", TargetField::Sku),
    ("ref", TargetField::Sku),
    ("reference", TargetField::Sku),
    // name
    ("name", TargetField::Name),
    ("product", TargetField::Name),
    ("productname", TargetField::Name),
    ("productdescription", TargetField::Name),
    ("item", TargetField::Name),
    ("itemname", TargetField::Name),
    // description(desc_only 模式)
    ("description", TargetField::Description),
    ("desc", TargetField::Description),
    ("itemdescription", TargetField::Description),
    // supplier
    ("supplier", TargetField::Supplier),
    ("manufacturer", TargetField::Supplier),
    ("brand", TargetField::Supplier),
    ("vendor", TargetField::Supplier),
    ("company", TargetField::Supplier),
    // system
    ("system", TargetField::System),
    ("systems", TargetField::System),
    ("tray", TargetField::System),
    ("set", TargetField::System),
    // category / type
    ("category", TargetField::Category),
    ("type", TargetField::Type),
    ("itemtype", TargetField::Type),
    // 数量
    ("qty", TargetField::Qty),
    ("quantity", TargetField::Qty),
    ("stock", TargetField::Qty),
    ("onhand", TargetField::Qty),
    ("soh", TargetField::Qty),
    ("min", TargetField::Min),
    ("minimum", TargetField::Min),
    ("minqty", TargetField::Min),
    ("reorderlevel", TargetField::Min),
    ("max", TargetField::Max),
    ("maximum", TargetField::Max),
    ("maxqty", TargetField::Max),
    ("rop", TargetField::Rop),
    ("reorder", TargetField::Rop),
    ("reorderpoint", TargetField::Rop),
    ("usage", TargetField::Usage),
    // 位置
    ("room", TargetField::Room),
    ("theatre", TargetField::Room),
    ("storage", TargetField::StorageName),
    ("storagename", TargetField::StorageName),
    ("cabinet", TargetField::StorageName),
    ("cupboard", TargetField::StorageName),
    ("drawer", TargetField::Drawer),
    ("drawerlayer", TargetField::Drawer),
    ("layer", TargetField::Drawer),
    ("shelf", TargetField::Drawer),
    ("slot", TargetField::Slot),
    ("bin", TargetField::Slot),
    ("position", TargetField::Slot),
    // 备注
    ("comments", TargetField::Comments),
    ("comment", TargetField::Comments),
    ("notes", TargetField::Comments),
    ("note", TargetField::Comments),
    ("remarks", TargetField::Comments),
];

// ==========================================
// 包含匹配关键词(仅用于精确别名未命中时)
// ==========================================
const KEYWORDS: &[(&str, TargetField)] = &[
    ("sku", TargetField::Sku),
    ("catalog", TargetField::Sku),
    ("code", TargetField::Sku),
    ("supplier", TargetField::Supplier),
    ("manufacturer", TargetField::Supplier),
    ("vendor", TargetField::Supplier),
    ("brand", TargetField::Supplier),
    ("system", TargetField::System),
    ("category", TargetField::Category),
    ("type", TargetField::Type),
    ("quantity", TargetField::Qty),
    ("qty", TargetField::Qty),
    ("stock", TargetField::Qty),
    ("onhand", TargetField::Qty),
    ("minimum", TargetField::Min),
    ("min", TargetField::Min),
    ("maximum", TargetField::Max),
    ("max", TargetField::Max),
    ("reorder", TargetField::Rop),
    ("usage", TargetField::Usage),
    ("room", TargetField::Room),
    ("theatre", TargetField::Room),
    ("storage", TargetField::StorageName),
    ("cabinet", TargetField::StorageName),
    ("cupboard", TargetField::StorageName),
    ("drawer", TargetField::Drawer),
    ("shelf", TargetField::Drawer),
    ("layer", TargetField::Drawer),
    ("slot", TargetField::Slot),
    ("position", TargetField::Slot),
    ("comment", TargetField::Comments),
    ("note", TargetField::Comments),
    ("description", TargetField::Description),
    ("product", TargetField::Name),
    ("name", TargetField::Name),
];

/// 表头归一化: 小写 + 去除空白/分隔符/标点
pub fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// 表头分词: 按非字母数字字符及 camelCase 边界切分,结果小写
fn header_tokens(header: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for c in header.chars() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower && !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_lowercase();
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

pub struct HeaderMapper;

impl HeaderMapper {
    /// 猜测单个表头对应的目标字段
    pub fn guess(header: &str) -> Option<TargetField> {
        let normalized = normalize_header(header);
        if normalized.is_empty() {
            return None;
        }

        if let Some((_, field)) = EXACT_ALIASES.iter().find(|(alias, _)| *alias == normalized) {
            return Some(*field);
        }

        // 词首匹配: 关键词可跨词(如 "On Hand"),但必须从某个词的开头起
        let tokens = header_tokens(header);
        let joined = tokens.concat();
        let mut starts = Vec::with_capacity(tokens.len());
        let mut offset = 0;
        for token in &tokens {
            starts.push(offset);
            offset += token.len();
        }

        // 最靠前的词优先,同一起点取最长关键词
        starts.iter().find_map(|&start| {
            KEYWORDS
                .iter()
                .filter(|(keyword, _)| joined[start..].starts_with(*keyword))
                .max_by_key(|(keyword, _)| keyword.len())
                .map(|(_, field)| *field)
        })
    }

    /// 根据表头行生成建议映射
    ///
    /// # 返回
    /// - ColumnMapping: 每个目标字段取第一个命中的列
    pub fn suggest(headers: &[String]) -> ColumnMapping {
        let mut mapping = ColumnMapping::new();
        for (column, header) in headers.iter().enumerate() {
            if let Some(field) = Self::guess(header) {
                if !mapping.set_if_absent(field, column) {
                    debug!(header = %header, field = %field, column, "重复映射,保留首列");
                }
            }
        }
        debug!(mapped = mapping.len(), headers = headers.len(), "表头映射建议完成");
        mapping
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_reorder_level_variants_map_to_min() {
        for header in ["Re-Order Level", "reorderlevel", "REORDER_LEVEL", "Reorder level"] {
            assert_eq!(HeaderMapper::guess(header), Some(TargetField::Min), "{}", header);
        }
    }

    #[test]
    fn test_exact_aliases() {
        assert_eq!(HeaderMapper::guess("Catalogue"), Some(TargetField::Sku));
        assert_eq!(HeaderMapper::guess("Cat. No."), Some(TargetField::Sku));
        assert_eq!(HeaderMapper::guess("Manufacturer"), Some(TargetField::Supplier));
        assert_eq!(HeaderMapper::guess("Storage Name"), Some(TargetField::StorageName));
        assert_eq!(HeaderMapper::guess("Drawer/Layer"), Some(TargetField::Drawer));
        assert_eq!(HeaderMapper::guess("ROP"), Some(TargetField::Rop));
        assert_eq!(HeaderMapper::guess("Product Description"), Some(TargetField::Name));
    }

    #[test]
    fn test_substring_fallback() {
        assert_eq!(HeaderMapper::guess("Supplier Name"), Some(TargetField::Supplier));
        assert_eq!(HeaderMapper::guess("Min Qty Level"), Some(TargetField::Min));
        assert_eq!(HeaderMapper::guess("Stock On Hand"), Some(TargetField::Qty));
        assert_eq!(HeaderMapper::guess("Storage Location"), Some(TargetField::StorageName));
        assert_eq!(HeaderMapper::guess("Colour"), None);
        assert_eq!(HeaderMapper::guess("  "), None);
    }

    #[test]
    fn test_keywords_match_only_at_word_start() {
        assert_eq!(HeaderMapper::guess("Admin Notes"), Some(TargetField::Comments));
        assert_eq!(HeaderMapper::guess("Stock Code"), Some(TargetField::Sku));
        assert_eq!(HeaderMapper::guess("stock_no"), Some(TargetField::Sku));
        assert_eq!(HeaderMapper::guess("Qty On Hand"), Some(TargetField::Qty));
        assert_eq!(HeaderMapper::guess("minQtyLevel"), Some(TargetField::Min));
        assert_eq!(HeaderMapper::guess("Barcode"), None);
        assert_eq!(HeaderMapper::guess("Admin"), None);
    }

    #[test]
    fn test_notes_column_does_not_steal_min() {
        let mapping = HeaderMapper::suggest(&headers(&["SKU", "Admin Notes", "Min", "Stock Code"]));
        assert_eq!(mapping.get(TargetField::Sku), Some(0));
        assert_eq!(mapping.get(TargetField::Comments), Some(1));
        assert_eq!(mapping.get(TargetField::Min), Some(2));
        assert!(!mapping.is_mapped(TargetField::Qty));
    }

    #[test]
    fn test_header_tokens() {
        assert_eq!(header_tokens("Re-Order Level"), vec!["re", "order", "level"]);
        assert_eq!(header_tokens("storageName"), vec!["storage", "name"]);
        assert_eq!(header_tokens("  "), Vec::<String>::new());
    }

    #[test]
    fn test_first_column_wins() {
        let mapping = HeaderMapper::suggest(&headers(&["Code", "SKU", "Description", "Qty", "Quantity"]));
        assert_eq!(mapping.get(TargetField::Sku), Some(0));
        assert_eq!(mapping.get(TargetField::Description), Some(2));
        assert_eq!(mapping.get(TargetField::Qty), Some(3));
        assert!(!mapping.is_mapped(TargetField::Name));
    }

    #[test]
    fn test_export_headers_map_back() {
        let export_headers = headers(&[
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
        ]);
        let mapping = HeaderMapper::suggest(&export_headers);
        assert_eq!(mapping.len(), 16);
        assert_eq!(mapping.get(TargetField::StorageName), Some(12));
        assert_eq!(mapping.get(TargetField::Comments), Some(15));
    }
}
