// ==========================================
// 手术室库存系统 - 列映射模型
// ==========================================
// 职责: 规范目标字段(封闭枚举) + 目标字段 → 源列下标映射
// 生命周期: 每次导入构建一次,提交前可由操作员修改
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ==========================================
// TargetField - 导入目标字段
// ==========================================
// Description 为辅助字段,仅用于 desc_only 模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TargetField {
    Sku,
    Name,
    Supplier,
    System,
    Category,
    Type,
    Qty,
    Min,
    Max,
    Rop,
    Usage,
    Room,
    StorageName,
    Drawer,
    Slot,
    Comments,
    Description,
}

impl TargetField {
    pub const ALL: [TargetField; 17] = [
        TargetField::Sku,
        TargetField::Name,
        TargetField::Supplier,
        TargetField::System,
        TargetField::Category,
        TargetField::Type,
        TargetField::Qty,
        TargetField::Min,
        TargetField::Max,
        TargetField::Rop,
        TargetField::Usage,
        TargetField::Room,
        TargetField::StorageName,
        TargetField::Drawer,
        TargetField::Slot,
        TargetField::Comments,
        TargetField::Description,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            TargetField::Sku => "sku",
            TargetField::Name => "name",
            TargetField::Supplier => "supplier",
            TargetField::System => "system",
            TargetField::Category => "category",
            TargetField::Type => "type",
            TargetField::Qty => "qty",
            TargetField::Min => "min",
            TargetField::Max => "max",
            TargetField::Rop => "rop",
            TargetField::Usage => "usage",
            TargetField::Room => "room",
            TargetField::StorageName => "storageName",
            TargetField::Drawer => "drawer",
            TargetField::Slot => "slot",
            TargetField::Comments => "comments",
            TargetField::Description => "description",
        }
    }

    /// 映射界面显示名
    pub fn label(&self) -> &'static str {
        match self {
            TargetField::Sku => "SKU",
            TargetField::Name => "Product Description",
            TargetField::Supplier => "Supplier",
            TargetField::System => "System",
            TargetField::Category => "Category",
            TargetField::Type => "Type",
            TargetField::Qty => "Qty",
            TargetField::Min => "Min",
            TargetField::Max => "Max",
            TargetField::Rop => "ROP",
            TargetField::Usage => "Usage",
            TargetField::Room => "Room",
            TargetField::StorageName => "Storage",
            TargetField::Drawer => "Drawer/Layer",
            TargetField::Slot => "Slot",
            TargetField::Comments => "Comments",
            TargetField::Description => "(Alt) Description only",
        }
    }

    pub fn is_required(&self) -> bool {
        matches!(self, TargetField::Sku)
    }
}

impl fmt::Display for TargetField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for TargetField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TargetField::ALL
            .iter()
            .copied()
            .find(|f| f.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("未知目标字段: {}", s))
    }
}

// ==========================================
// ColumnMapping - 目标字段 → 源列下标
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    columns: BTreeMap<TargetField, usize>,
}

impl ColumnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: TargetField) -> Option<usize> {
        self.columns.get(&field).copied()
    }

    pub fn is_mapped(&self, field: TargetField) -> bool {
        self.columns.contains_key(&field)
    }

    /// 指定映射(覆盖已有映射)
    pub fn set(&mut self, field: TargetField, column: usize) {
        self.columns.insert(field, column);
    }

    /// 仅在尚未映射时写入,返回是否写入
    pub fn set_if_absent(&mut self, field: TargetField, column: usize) -> bool {
        if self.columns.contains_key(&field) {
            return false;
        }
        self.columns.insert(field, column);
        true
    }

    pub fn unset(&mut self, field: TargetField) {
        self.columns.remove(&field);
    }

    pub fn iter(&self) -> impl Iterator<Item = (TargetField, usize)> + '_ {
        self.columns.iter().map(|(f, c)| (*f, *c))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// 找出超出表头范围的映射
    pub fn out_of_range(&self, header_count: usize) -> Option<(TargetField, usize)> {
        self.iter().find(|(_, column)| *column >= header_count)
    }
}
