// ==========================================
// 手术室库存系统 - 库存物品领域模型
// ==========================================
// 职责: 规范物品记录 + 字段级更新描述
// 红线: sku 是唯一的身份判定字段(忽略大小写与空白)
// ==========================================

use crate::domain::types::{Category, MaxQty, StockLevel, Usage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// InventoryItem - 规范物品记录
// ==========================================
// 对齐: items 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    // ===== 主键 =====
    pub item_id: String, // 存储层 ID
    pub sku: String,     // 自然键

    // ===== 描述信息 =====
    pub name: String,
    pub supplier: Option<String>,   // None = 字段不存在(不参与筛选)
    pub system: Vec<String>,        // 器械系统标签(去重)
    pub category: Option<Category>,
    pub item_type: Option<String>,  // 小写 + 下划线
    pub comments: String,

    // ===== 库存参数 =====
    pub qty: u32,
    pub min: u32,
    pub max: MaxQty,
    pub rop: u32,
    pub usage: Option<Usage>,

    // ===== 摆放位置 =====
    pub location: Option<ItemLocation>, // None = 未摆放

    // ===== 审计字段(存储层写入) =====
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl InventoryItem {
    /// 创建仅含 sku 的空白记录,其余字段取默认值
    pub fn new(item_id: impl Into<String>, sku: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            sku: sku.into(),
            name: String::new(),
            supplier: None,
            system: Vec::new(),
            category: None,
            item_type: None,
            comments: String::new(),
            qty: 0,
            min: 0,
            max: MaxQty::Unbounded,
            rop: 0,
            usage: None,
            location: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// 库存水位: qty < min → Below; 有上限且 qty > max → Over
    pub fn stock_level(&self) -> StockLevel {
        if let MaxQty::Cap(max) = self.max {
            if max > 0 && self.qty > max {
                return StockLevel::Over;
            }
        }
        if self.qty < self.min {
            return StockLevel::Below;
        }
        StockLevel::Ok
    }

    pub fn is_unplaced(&self) -> bool {
        self.location.is_none()
    }

    /// 依次应用字段更新
    pub fn apply_updates(&mut self, updates: &[FieldUpdate]) {
        for update in updates {
            update.apply_to(self);
        }
    }
}

// ==========================================
// ItemLocation - 摆放位置(弱引用 Storage)
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemLocation {
    pub storage_id: String,
    pub drawer: String,
    pub slot: String,
}

// ==========================================
// ItemField - 可写字段(封闭枚举)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemField {
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
    Location,
    Comments,
}

impl ItemField {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemField::Sku => "sku",
            ItemField::Name => "name",
            ItemField::Supplier => "supplier",
            ItemField::System => "system",
            ItemField::Category => "category",
            ItemField::Type => "type",
            ItemField::Qty => "qty",
            ItemField::Min => "min",
            ItemField::Max => "max",
            ItemField::Rop => "rop",
            ItemField::Usage => "usage",
            ItemField::Location => "location",
            ItemField::Comments => "comments",
        }
    }
}

// ==========================================
// FieldUpdate - 单字段更新
// ==========================================
// Option 字段中 None 表示删除该字段(而非写入空串)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum FieldUpdate {
    Sku(String),
    Name(String),
    Supplier(Option<String>),
    System(Vec<String>),
    Category(Option<Category>),
    Type(Option<String>),
    Qty(u32),
    Min(u32),
    Max(MaxQty),
    Rop(u32),
    Usage(Option<Usage>),
    Location(Option<ItemLocation>),
    Comments(String),
}

impl FieldUpdate {
    pub fn field(&self) -> ItemField {
        match self {
            FieldUpdate::Sku(_) => ItemField::Sku,
            FieldUpdate::Name(_) => ItemField::Name,
            FieldUpdate::Supplier(_) => ItemField::Supplier,
            FieldUpdate::System(_) => ItemField::System,
            FieldUpdate::Category(_) => ItemField::Category,
            FieldUpdate::Type(_) => ItemField::Type,
            FieldUpdate::Qty(_) => ItemField::Qty,
            FieldUpdate::Min(_) => ItemField::Min,
            FieldUpdate::Max(_) => ItemField::Max,
            FieldUpdate::Rop(_) => ItemField::Rop,
            FieldUpdate::Usage(_) => ItemField::Usage,
            FieldUpdate::Location(_) => ItemField::Location,
            FieldUpdate::Comments(_) => ItemField::Comments,
        }
    }

    pub fn apply_to(&self, item: &mut InventoryItem) {
        match self {
            FieldUpdate::Sku(v) => item.sku = v.clone(),
            FieldUpdate::Name(v) => item.name = v.clone(),
            FieldUpdate::Supplier(v) => item.supplier = v.clone(),
            FieldUpdate::System(v) => item.system = v.clone(),
            FieldUpdate::Category(v) => item.category = *v,
            FieldUpdate::Type(v) => item.item_type = v.clone(),
            FieldUpdate::Qty(v) => item.qty = *v,
            FieldUpdate::Min(v) => item.min = *v,
            FieldUpdate::Max(v) => item.max = *v,
            FieldUpdate::Rop(v) => item.rop = *v,
            FieldUpdate::Usage(v) => item.usage = *v,
            FieldUpdate::Location(v) => item.location = v.clone(),
            FieldUpdate::Comments(v) => item.comments = v.clone(),
        }
    }
}

// ==========================================
// 文本规范化辅助
// ==========================================

/// 去除首尾空白
pub fn clean(value: &str) -> String {
    value.trim().to_string()
}

/// SKU 匹配键: 小写 + 去除所有空白
pub fn sku_key(sku: &str) -> String {
    sku.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// 拆分系统标签: 按 ';' 或 ',' 分割,去空白,保序去重
pub fn split_tags(raw: &str) -> Vec<String> {
    dedup_tags(raw.split([';', ',']).map(str::to_string))
}

/// 标签去重(保留首次出现顺序,丢弃空标签)
pub fn dedup_tags<I>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = clean(&tag);
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

/// 类型值规范化: 小写 + 空白替换为下划线
pub fn underscore_type(value: &str) -> String {
    value
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}
