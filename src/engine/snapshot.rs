// ==========================================
// 手术室库存系统 - 库存快照
// ==========================================
// 职责: 调用开始时一次性加载物品与存储柜,构建只读索引
// 约束: 构建写组期间不修改快照;本次运行新建的存储柜由调用方单独跟踪
// ==========================================

use crate::domain::item::{sku_key, InventoryItem};
use crate::domain::storage::{Storage, StorageKey};
use crate::importer::fuzzy_resolver::normalize_token;
use crate::repository::error::RepositoryResult;
use crate::repository::inventory_store::InventoryStore;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Default)]
pub struct InventorySnapshot {
    items: Vec<InventoryItem>,
    storages: Vec<Storage>,
    by_sku: HashMap<String, usize>,
    by_id: HashMap<String, usize>,
    storage_by_key: HashMap<StorageKey, usize>,
    storage_by_id: HashMap<String, usize>,
}

impl InventorySnapshot {
    pub fn new(items: Vec<InventoryItem>, storages: Vec<Storage>) -> Self {
        let mut by_sku = HashMap::new();
        let mut by_id = HashMap::new();
        for (idx, item) in items.iter().enumerate() {
            // 历史数据中重复的 sku: 第一条为准
            by_sku.entry(sku_key(&item.sku)).or_insert(idx);
            by_id.insert(item.item_id.clone(), idx);
        }

        let mut storage_by_key = HashMap::new();
        let mut storage_by_id = HashMap::new();
        for (idx, storage) in storages.iter().enumerate() {
            storage_by_key.entry(storage.key()).or_insert(idx);
            storage_by_id.insert(storage.storage_id.clone(), idx);
        }

        Self {
            items,
            storages,
            by_sku,
            by_id,
            storage_by_key,
            storage_by_id,
        }
    }

    /// 从存储层加载
    pub async fn load<S>(store: &S) -> RepositoryResult<Self>
    where
        S: InventoryStore + ?Sized,
    {
        let items = store.load_items().await?;
        let storages = store.load_storages().await?;
        Ok(Self::new(items, storages))
    }

    pub fn items(&self) -> &[InventoryItem] {
        &self.items
    }

    pub fn storages(&self) -> &[Storage] {
        &self.storages
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// 按 sku 查找(忽略大小写与空白)
    pub fn item_by_sku(&self, sku: &str) -> Option<&InventoryItem> {
        self.by_sku.get(&sku_key(sku)).map(|idx| &self.items[*idx])
    }

    pub fn item_by_id(&self, item_id: &str) -> Option<&InventoryItem> {
        self.by_id.get(item_id).map(|idx| &self.items[*idx])
    }

    /// 按 (room, storage_name) 查找存储柜 ID(忽略大小写)
    pub fn storage_id_for(&self, room: &str, name: &str) -> Option<&str> {
        self.storage_by_key
            .get(&StorageKey::new(room, name))
            .map(|idx| self.storages[*idx].storage_id.as_str())
    }

    pub fn storage_by_id(&self, storage_id: &str) -> Option<&Storage> {
        self.storage_by_id.get(storage_id).map(|idx| &self.storages[*idx])
    }

    /// 已知供应商(去重,保留首次出现的写法)
    pub fn suppliers(&self) -> Vec<String> {
        distinct(self.items.iter().filter_map(|i| i.supplier.as_deref()))
    }

    /// 已知系统标签(去重,保留首次出现的写法)
    pub fn system_tags(&self) -> Vec<String> {
        distinct(self.items.iter().flat_map(|i| i.system.iter().map(String::as_str)))
    }
}

fn distinct<'a, I>(values: I) -> Vec<String>
where
    I: Iterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for value in values {
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        if seen.insert(normalize_token(value)) {
            out.push(value.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_indexes() {
        let mut a = InventoryItem::new("i1", "ABC-1");
        a.supplier = Some("Stryker".to_string());
        a.system = vec!["Hip".to_string(), "Knee".to_string()];
        let mut b = InventoryItem::new("i2", "XYZ");
        b.supplier = Some("stryker".to_string());
        b.system = vec!["hip".to_string(), "Spine".to_string()];

        let snapshot = InventorySnapshot::new(
            vec![a, b],
            vec![Storage::new("s1", "Theatre 1", "Cabinet A")],
        );

        assert_eq!(snapshot.item_by_sku(" abc-1").map(|i| i.item_id.as_str()), Some("i1"));
        assert!(snapshot.item_by_id("i2").is_some());
        assert_eq!(snapshot.storage_id_for("THEATRE 1", "cabinet a"), Some("s1"));
        assert_eq!(snapshot.storage_id_for("Theatre 2", "Cabinet A"), None);
        assert_eq!(snapshot.suppliers(), vec!["Stryker"]);
        assert_eq!(snapshot.system_tags(), vec!["Hip", "Knee", "Spine"]);
    }
}
