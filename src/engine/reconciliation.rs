// ==========================================
// 手术室库存系统 - 对账引擎
// ==========================================
// 职责: 规范记录 + 库存快照 → 有序写操作
// 输出顺序: 新建存储柜 → 更新已有物品 → 新增物品
// 规则:
// - 身份键: 归一化 sku(忽略大小写与空白)
// - 已映射字段: 后导入者覆盖;未映射字段保持原值
// - 同一次导入中重复的 sku 合并为一个写操作(后行覆盖前行)
// - (room, storage_name) 缺失时预分配 ID 新建一次,后续行复用
// - 位置无法解析(仅填一半或禁止建柜)时物品照常导入,保持未摆放
// 约束: 纯计算,无 I/O
// ==========================================

use crate::domain::item::{clean, sku_key, underscore_type, FieldUpdate, InventoryItem, ItemLocation};
use crate::domain::storage::{Storage, StorageKey};
use crate::domain::types::{Category, Usage};
use crate::domain::write_op::WriteOp;
use crate::engine::snapshot::InventorySnapshot;
use crate::importer::fuzzy_resolver::{CachedResolver, FuzzyResolver};
use crate::importer::record_normalizer::{NormalizedRecord, Placement};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

// ==========================================
// ReconcileSettings - 对账参数
// ==========================================
#[derive(Debug, Clone)]
pub struct ReconcileSettings {
    pub max_distance: usize,
    pub category_vocabulary: Vec<String>,
    pub type_vocabulary: Vec<String>,
    pub create_missing_storages: bool,
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        Self {
            max_distance: crate::importer::fuzzy_resolver::DEFAULT_MAX_DISTANCE,
            category_vocabulary: Category::vocabulary(),
            type_vocabulary: crate::config::config_manager::DEFAULT_TYPE_VOCABULARY
                .iter()
                .map(|s| s.to_string())
                .collect(),
            create_missing_storages: true,
        }
    }
}

// ==========================================
// ReconcileStats - 对账统计
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileStats {
    pub records: usize,
    pub inserted: usize,
    pub updated: usize,
    pub merged_duplicates: usize,
    pub storages_created: usize,
    pub unplaced: usize,
    pub unresolved_categories: usize,
}

#[derive(Debug, Clone)]
pub struct ReconciliationPlan {
    pub ops: Vec<WriteOp>,
    pub stats: ReconcileStats,
}

// ==========================================
// ReconciliationEngine
// ==========================================
pub struct ReconciliationEngine {
    settings: ReconcileSettings,
}

/// 位置解析结果
enum LocationChange {
    Untouched,
    Set(Option<ItemLocation>),
}

/// 单次运行中的可变状态
struct RunState {
    storage_ops: Vec<WriteOp>,
    update_ops: Vec<WriteOp>,
    insert_ops: Vec<WriteOp>,
    pending_storages: HashMap<StorageKey, String>,
    // sku_key → (是否为新增, 在对应列表中的下标)
    touched: HashMap<String, (bool, usize)>,
    stats: ReconcileStats,
}

impl ReconciliationEngine {
    pub fn new(settings: ReconcileSettings) -> Self {
        Self { settings }
    }

    /// 生成写操作计划
    #[instrument(skip_all, fields(records = records.len(), existing = snapshot.item_count()))]
    pub fn reconcile(&self, records: &[NormalizedRecord], snapshot: &InventorySnapshot) -> ReconciliationPlan {
        let resolver = FuzzyResolver::new(self.settings.max_distance);
        let suppliers = snapshot.suppliers();
        let mut supplier_resolver = CachedResolver::new(resolver, &suppliers);
        let mut category_resolver = CachedResolver::new(resolver, &self.settings.category_vocabulary);
        let mut type_resolver = CachedResolver::new(resolver, &self.settings.type_vocabulary);

        let mut run = RunState {
            storage_ops: Vec::new(),
            update_ops: Vec::new(),
            insert_ops: Vec::new(),
            pending_storages: HashMap::new(),
            touched: HashMap::new(),
            stats: ReconcileStats {
                records: records.len(),
                ..Default::default()
            },
        };

        for record in records {
            let location = self.resolve_location(record.placement.as_ref(), snapshot, &mut run);
            let mut updates = Vec::new();

            updates.push(FieldUpdate::Sku(clean(&record.sku)));
            if let Some(name) = &record.name {
                updates.push(FieldUpdate::Name(name.clone()));
            }
            if let Some(supplier) = &record.supplier {
                let resolved = supplier_resolver.resolve(supplier);
                updates.push(FieldUpdate::Supplier(non_empty(resolved)));
            }
            if let Some(system) = &record.system {
                updates.push(FieldUpdate::System(system.clone()));
            }
            if let Some(category) = &record.category {
                let value = if category.is_empty() {
                    None
                } else {
                    let resolved = category_resolver.resolve(category);
                    let parsed = Category::parse(&resolved);
                    if parsed.is_none() {
                        run.stats.unresolved_categories += 1;
                        warn!(row = record.row_index, sku = %record.sku, category = %category, "分类无法识别,已留空");
                    }
                    parsed
                };
                updates.push(FieldUpdate::Category(value));
            }
            if let Some(item_type) = &record.item_type {
                let value = if item_type.is_empty() {
                    None
                } else {
                    non_empty(underscore_type(&type_resolver.resolve(item_type)))
                };
                updates.push(FieldUpdate::Type(value));
            }
            if let Some(qty) = record.qty {
                updates.push(FieldUpdate::Qty(qty));
            }
            if let Some(min) = record.min {
                updates.push(FieldUpdate::Min(min));
            }
            if let Some(max) = record.max {
                updates.push(FieldUpdate::Max(max));
            }
            if let Some(rop) = record.rop {
                updates.push(FieldUpdate::Rop(rop));
            }
            if let Some(usage) = &record.usage {
                updates.push(FieldUpdate::Usage(Usage::parse(usage)));
            }
            if let LocationChange::Set(location) = location {
                updates.push(FieldUpdate::Location(location));
            }
            if let Some(comments) = &record.comments {
                updates.push(FieldUpdate::Comments(comments.clone()));
            }

            Self::place_record(&record.sku, updates, snapshot, &mut run);
        }

        debug!(
            distinct_suppliers = supplier_resolver.distinct_inputs(),
            distinct_categories = category_resolver.distinct_inputs(),
            distinct_types = type_resolver.distinct_inputs(),
            "模糊匹配完成"
        );

        let RunState {
            mut storage_ops,
            update_ops,
            insert_ops,
            stats,
            ..
        } = run;
        storage_ops.extend(update_ops);
        storage_ops.extend(insert_ops);

        debug!(
            ops = storage_ops.len(),
            inserted = stats.inserted,
            updated = stats.updated,
            storages_created = stats.storages_created,
            "对账完成"
        );
        ReconciliationPlan { ops: storage_ops, stats }
    }

    /// 将一行的字段更新归入写操作(新增 / 更新 / 合并)
    fn place_record(sku: &str, updates: Vec<FieldUpdate>, snapshot: &InventorySnapshot, run: &mut RunState) {
        let key = sku_key(sku);

        if let Some((is_insert, idx)) = run.touched.get(&key).copied() {
            run.stats.merged_duplicates += 1;
            if is_insert {
                if let WriteOp::InsertItem(item) = &mut run.insert_ops[idx] {
                    item.apply_updates(&updates);
                }
            } else if let WriteOp::UpdateItem { updates: existing, .. } = &mut run.update_ops[idx] {
                merge_updates(existing, updates);
            }
            return;
        }

        match snapshot.item_by_sku(sku) {
            Some(existing) => {
                run.update_ops.push(WriteOp::UpdateItem {
                    item_id: existing.item_id.clone(),
                    updates,
                });
                run.touched.insert(key, (false, run.update_ops.len() - 1));
                run.stats.updated += 1;
            }
            None => {
                let mut item = InventoryItem::new(Uuid::new_v4().to_string(), clean(sku));
                item.apply_updates(&updates);
                run.insert_ops.push(WriteOp::InsertItem(item));
                run.touched.insert(key, (true, run.insert_ops.len() - 1));
                run.stats.inserted += 1;
            }
        }
    }

    fn resolve_location(
        &self,
        placement: Option<&Placement>,
        snapshot: &InventorySnapshot,
        run: &mut RunState,
    ) -> LocationChange {
        let placement = match placement {
            Some(p) => p,
            None => return LocationChange::Untouched,
        };

        if placement.is_blank() {
            return LocationChange::Set(None);
        }
        if !placement.is_complete() {
            run.stats.unplaced += 1;
            return LocationChange::Set(None);
        }

        let storage_id = match snapshot.storage_id_for(&placement.room, &placement.storage_name) {
            Some(id) => id.to_string(),
            None => {
                let key = StorageKey::new(&placement.room, &placement.storage_name);
                match run.pending_storages.get(&key) {
                    Some(id) => id.clone(),
                    None if self.settings.create_missing_storages => {
                        let id = Uuid::new_v4().to_string();
                        run.storage_ops.push(WriteOp::CreateStorage(Storage::new(
                            id.clone(),
                            placement.room.clone(),
                            placement.storage_name.clone(),
                        )));
                        run.pending_storages.insert(key, id.clone());
                        run.stats.storages_created += 1;
                        id
                    }
                    None => {
                        run.stats.unplaced += 1;
                        return LocationChange::Set(None);
                    }
                }
            }
        };

        LocationChange::Set(Some(ItemLocation {
            storage_id,
            drawer: placement.drawer.clone(),
            slot: placement.slot.clone(),
        }))
    }
}

/// 合并字段更新: 同一字段以后者为准
pub fn merge_updates(existing: &mut Vec<FieldUpdate>, incoming: Vec<FieldUpdate>) {
    for update in incoming {
        match existing.iter_mut().find(|u| u.field() == update.field()) {
            Some(slot) => *slot = update,
            None => existing.push(update),
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
