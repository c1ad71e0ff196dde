// ==========================================
// 手术室库存系统 - 批量编辑引擎
// ==========================================
// 职责: 对选中的物品集合统一应用一个字段级操作
// 字段:
// - system: add(并集) / remove(差集) / replace(覆盖) / clear(清空)
// - supplier/category/type: set(模糊匹配后写入) / clear(删除字段)
// - location: move(存储柜只解析/新建一次,整批复用) / clear(变为未摆放)
// 约束:
// - 校验失败时不写入任何数据
// - 写入经由 ChunkedBatchWriter 分组提交
// - 不在快照中的 ID 跳过;值未变化的物品不产生写操作
// ==========================================

use crate::config::ImportConfigReader;
use crate::domain::activity::{ActivityLog, ActivityType};
use crate::domain::item::{clean, dedup_tags, underscore_type, FieldUpdate, InventoryItem, ItemField, ItemLocation};
use crate::domain::storage::Storage;
use crate::domain::types::Category;
use crate::domain::write_op::WriteOp;
use crate::engine::batch_writer::{ChunkedBatchWriter, WriteSummary};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::snapshot::InventorySnapshot;
use crate::importer::fuzzy_resolver::{normalize_token, FuzzyResolver};
use crate::repository::inventory_store::InventoryStore;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

// ==========================================
// BulkOperation - 批量操作描述(封闭枚举)
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "tags", rename_all = "snake_case")]
pub enum TagOp {
    Add(Vec<String>),
    Remove(Vec<String>),
    Replace(Vec<String>),
    Clear,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "snake_case")]
pub enum ValueOp {
    Set(String),
    Clear,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageTarget {
    /// 选择已有存储柜
    Existing(String),
    /// 新建(若同名柜已存在则复用)
    Create { room: String, name: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum LocationOp {
    Move {
        storage: Option<StorageTarget>,
        #[serde(default)]
        drawer: String,
        #[serde(default)]
        slot: String,
    },
    Clear,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "operation", rename_all = "snake_case")]
pub enum BulkOperation {
    System(TagOp),
    Supplier(ValueOp),
    Category(ValueOp),
    Type(ValueOp),
    Location(LocationOp),
}

impl BulkOperation {
    pub fn field(&self) -> ItemField {
        match self {
            BulkOperation::System(_) => ItemField::System,
            BulkOperation::Supplier(_) => ItemField::Supplier,
            BulkOperation::Category(_) => ItemField::Category,
            BulkOperation::Type(_) => ItemField::Type,
            BulkOperation::Location(_) => ItemField::Location,
        }
    }

    pub fn op_name(&self) -> &'static str {
        match self {
            BulkOperation::System(TagOp::Add(_)) => "add",
            BulkOperation::System(TagOp::Remove(_)) => "remove",
            BulkOperation::System(TagOp::Replace(_)) => "replace",
            BulkOperation::System(TagOp::Clear) => "clear",
            BulkOperation::Supplier(op) | BulkOperation::Category(op) | BulkOperation::Type(op) => match op {
                ValueOp::Set(_) => "set",
                ValueOp::Clear => "clear",
            },
            BulkOperation::Location(LocationOp::Move { .. }) => "move",
            BulkOperation::Location(LocationOp::Clear) => "clear",
        }
    }

    /// 不依赖快照的校验
    pub fn validate(&self) -> EngineResult<()> {
        match self {
            BulkOperation::Location(LocationOp::Move { storage, .. }) => match storage {
                None => Err(EngineError::Validation("移动位置需要选择或新建存储柜".to_string())),
                Some(StorageTarget::Existing(id)) if id.trim().is_empty() => {
                    Err(EngineError::Validation("移动位置需要选择或新建存储柜".to_string()))
                }
                Some(StorageTarget::Create { room, name }) if room.trim().is_empty() || name.trim().is_empty() => {
                    Err(EngineError::Validation("新建存储柜需要填写手术间和柜名".to_string()))
                }
                _ => Ok(()),
            },
            BulkOperation::Supplier(ValueOp::Set(v))
            | BulkOperation::Category(ValueOp::Set(v))
            | BulkOperation::Type(ValueOp::Set(v))
                if v.trim().is_empty() =>
            {
                Err(EngineError::Validation(format!(
                    "{} 的设置值不能为空(清空请使用 clear)",
                    self.field().as_str()
                )))
            }
            _ => Ok(()),
        }
    }
}

// ==========================================
// BulkOutcome - 批量操作结果
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkOutcome {
    pub selected: usize,
    pub affected: usize,  // 产生写操作的物品数
    pub unchanged: usize, // 值未变化
    pub missing: usize,   // 不在快照中
    pub storage_created: Option<String>,
    pub write: WriteSummary,
}

/// 批量操作预解析后的目标值
enum Resolved {
    Tags(TagOp),
    Supplier(Option<String>),
    Category(Option<Category>),
    Type(Option<String>),
    Location(Option<ItemLocation>),
}

// ==========================================
// BulkMutationEngine
// ==========================================
pub struct BulkMutationEngine<S: ?Sized, C: ?Sized>
where
    S: InventoryStore,
    C: ImportConfigReader,
{
    store: Arc<S>,
    config: Arc<C>,
}

impl<S: ?Sized, C: ?Sized> BulkMutationEngine<S, C>
where
    S: InventoryStore,
    C: ImportConfigReader,
{
    pub fn new(store: Arc<S>, config: Arc<C>) -> Self {
        Self { store, config }
    }

    /// 对选中物品应用批量操作
    ///
    /// # 返回
    /// - Ok(BulkOutcome): 全部写组提交成功
    /// - Err(Validation): 未写入任何数据
    /// - Err(GroupCommitFailed): 部分写组已生效,重跑安全
    #[instrument(skip(self, selection), fields(selected = selection.len(), field = operation.field().as_str()))]
    pub async fn apply(&self, selection: &[String], operation: &BulkOperation) -> EngineResult<BulkOutcome> {
        operation.validate()?;

        let ids = dedup_ids(selection);
        if ids.is_empty() {
            return Ok(BulkOutcome::default());
        }

        let max_distance = self
            .config
            .get_fuzzy_max_distance()
            .await
            .map_err(|e| EngineError::Config(e.to_string()))?;
        let snapshot = InventorySnapshot::load(self.store.as_ref())
            .await
            .map_err(EngineError::Snapshot)?;

        // === 预解析(校验在任何写入前完成) ===
        let mut ops = Vec::new();
        let mut outcome = BulkOutcome {
            selected: ids.len(),
            ..Default::default()
        };
        let resolved = self
            .resolve(operation, &snapshot, FuzzyResolver::new(max_distance), &mut ops, &mut outcome)
            .await?;

        // === 逐个物品生成更新 ===
        let known_tags = snapshot.system_tags();
        for id in &ids {
            let item = match snapshot.item_by_id(id) {
                Some(item) => item,
                None => {
                    outcome.missing += 1;
                    continue;
                }
            };
            match Self::update_for(item, &resolved, &known_tags) {
                Some(update) => {
                    ops.push(WriteOp::UpdateItem {
                        item_id: item.item_id.clone(),
                        updates: vec![update],
                    });
                    outcome.affected += 1;
                }
                None => outcome.unchanged += 1,
            }
        }

        if outcome.missing > 0 {
            warn!(missing = outcome.missing, "部分选中物品已不存在,已跳过");
        }

        // 没有物品移入时不建柜
        if outcome.affected == 0 {
            ops.clear();
            outcome.storage_created = None;
        }

        outcome.write = self.write(ops).await?;

        self.log_activity(
            ActivityType::BulkEdit,
            format!("{}: {}", operation.field().as_str(), outcome.affected),
            json!({
                "field": operation.field().as_str(),
                "op": operation.op_name(),
                "count": outcome.affected,
                "selected": outcome.selected,
            }),
        )
        .await;

        info!(
            field = operation.field().as_str(),
            op = operation.op_name(),
            affected = outcome.affected,
            unchanged = outcome.unchanged,
            "批量编辑完成"
        );
        Ok(outcome)
    }

    /// 批量删除选中物品
    #[instrument(skip(self, selection), fields(selected = selection.len()))]
    pub async fn delete(&self, selection: &[String]) -> EngineResult<BulkOutcome> {
        let ids = dedup_ids(selection);
        if ids.is_empty() {
            return Ok(BulkOutcome::default());
        }

        let snapshot = InventorySnapshot::load(self.store.as_ref())
            .await
            .map_err(EngineError::Snapshot)?;

        let mut outcome = BulkOutcome {
            selected: ids.len(),
            ..Default::default()
        };
        let mut ops = Vec::new();
        for id in &ids {
            if snapshot.item_by_id(id).is_some() {
                ops.push(WriteOp::DeleteItem { item_id: id.clone() });
                outcome.affected += 1;
            } else {
                outcome.missing += 1;
            }
        }

        outcome.write = self.write(ops).await?;

        self.log_activity(
            ActivityType::BulkDelete,
            format!("Deleted: {}", outcome.affected),
            json!({ "count": outcome.affected, "selected": outcome.selected }),
        )
        .await;

        info!(deleted = outcome.affected, "批量删除完成");
        Ok(outcome)
    }

    async fn write(&self, ops: Vec<WriteOp>) -> EngineResult<WriteSummary> {
        if ops.is_empty() {
            return Ok(WriteSummary::default());
        }
        let group_limit = self
            .config
            .get_write_group_limit()
            .await
            .map_err(|e| EngineError::Config(e.to_string()))?;
        ChunkedBatchWriter::new(self.store.clone(), group_limit).write_all(ops).await
    }

    /// 解析目标值;需要新建存储柜时把建柜操作放在最前
    async fn resolve(
        &self,
        operation: &BulkOperation,
        snapshot: &InventorySnapshot,
        resolver: FuzzyResolver,
        ops: &mut Vec<WriteOp>,
        outcome: &mut BulkOutcome,
    ) -> EngineResult<Resolved> {
        let resolved = match operation {
            BulkOperation::System(op) => Resolved::Tags(op.clone()),
            BulkOperation::Supplier(ValueOp::Set(value)) => {
                Resolved::Supplier(Some(resolver.resolve(value, &snapshot.suppliers())))
            }
            BulkOperation::Supplier(ValueOp::Clear) => Resolved::Supplier(None),
            BulkOperation::Category(ValueOp::Set(value)) => {
                let vocabulary = self
                    .config
                    .get_category_vocabulary()
                    .await
                    .map_err(|e| EngineError::Config(e.to_string()))?;
                let resolved = resolver.resolve(value, &vocabulary);
                match Category::parse(&resolved) {
                    Some(category) => Resolved::Category(Some(category)),
                    None => {
                        return Err(EngineError::Validation(format!("无法识别的分类: {}", value.trim())));
                    }
                }
            }
            BulkOperation::Category(ValueOp::Clear) => Resolved::Category(None),
            BulkOperation::Type(ValueOp::Set(value)) => {
                let vocabulary = self
                    .config
                    .get_type_vocabulary()
                    .await
                    .map_err(|e| EngineError::Config(e.to_string()))?;
                Resolved::Type(Some(underscore_type(&resolver.resolve(value, &vocabulary))))
            }
            BulkOperation::Type(ValueOp::Clear) => Resolved::Type(None),
            BulkOperation::Location(LocationOp::Clear) => Resolved::Location(None),
            BulkOperation::Location(LocationOp::Move { storage, drawer, slot }) => {
                let storage_id = match storage {
                    Some(StorageTarget::Existing(id)) => {
                        let id = id.trim();
                        if snapshot.storage_by_id(id).is_none() {
                            return Err(EngineError::Validation(format!("存储柜不存在: {}", id)));
                        }
                        id.to_string()
                    }
                    Some(StorageTarget::Create { room, name }) => {
                        let (room, name) = (clean(room), clean(name));
                        match snapshot.storage_id_for(&room, &name) {
                            Some(existing) => existing.to_string(),
                            None => {
                                let id = Uuid::new_v4().to_string();
                                ops.push(WriteOp::CreateStorage(Storage::new(id.clone(), room, name)));
                                outcome.storage_created = Some(id.clone());
                                id
                            }
                        }
                    }
                    None => {
                        return Err(EngineError::Validation("移动位置需要选择或新建存储柜".to_string()));
                    }
                };
                Resolved::Location(Some(ItemLocation {
                    storage_id,
                    drawer: clean(drawer),
                    slot: clean(slot),
                }))
            }
        };
        Ok(resolved)
    }

    /// 计算单个物品的更新;值不变时返回 None
    fn update_for(item: &InventoryItem, resolved: &Resolved, known_tags: &[String]) -> Option<FieldUpdate> {
        match resolved {
            Resolved::Tags(op) => {
                let next = apply_tag_op(&item.system, op, known_tags);
                (next != item.system).then_some(FieldUpdate::System(next))
            }
            Resolved::Supplier(value) => (item.supplier != *value).then(|| FieldUpdate::Supplier(value.clone())),
            Resolved::Category(value) => (item.category != *value).then_some(FieldUpdate::Category(*value)),
            Resolved::Type(value) => (item.item_type != *value).then(|| FieldUpdate::Type(value.clone())),
            Resolved::Location(value) => (item.location != *value).then(|| FieldUpdate::Location(value.clone())),
        }
    }
}

/// 标签集合运算
///
/// 输入标签按已知标签精确(归一化)匹配统一写法,未命中则保留原文
pub fn apply_tag_op(current: &[String], op: &TagOp, known_tags: &[String]) -> Vec<String> {
    let canonical = |tags: &[String]| -> Vec<String> {
        dedup_tags(tags.iter().map(|tag| {
            let key = normalize_token(tag);
            known_tags
                .iter()
                .find(|known| normalize_token(known) == key)
                .cloned()
                .unwrap_or_else(|| clean(tag))
        }))
    };

    match op {
        TagOp::Add(tags) => {
            let mut next = current.to_vec();
            let existing: HashSet<String> = current.iter().map(|t| normalize_token(t)).collect();
            for tag in canonical(tags) {
                if !existing.contains(&normalize_token(&tag)) {
                    next.push(tag);
                }
            }
            next
        }
        TagOp::Remove(tags) => {
            let removed: HashSet<String> = tags.iter().map(|t| normalize_token(t)).collect();
            current
                .iter()
                .filter(|t| !removed.contains(&normalize_token(t)))
                .cloned()
                .collect()
        }
        TagOp::Replace(tags) => canonical(tags),
        TagOp::Clear => Vec::new(),
    }
}

fn dedup_ids(selection: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    selection
        .iter()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty() && seen.insert(id.clone()))
        .collect()
}

impl<S: ?Sized, C: ?Sized> BulkMutationEngine<S, C>
where
    S: InventoryStore,
    C: ImportConfigReader,
{
    async fn log_activity(&self, activity_type: ActivityType, details: String, payload: serde_json::Value) {
        let log = ActivityLog::new(activity_type, details, Some(payload));
        if let Err(e) = self.store.append_activity(&log).await {
            warn!(error = %e, "批量操作日志写入失败(数据已提交)");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_remove_is_idempotent() {
        let op = TagOp::Remove(tags(&["A"]));
        let once = apply_tag_op(&tags(&["A", "B"]), &op, &[]);
        assert_eq!(once, tags(&["B"]));
        let twice = apply_tag_op(&once, &op, &[]);
        assert_eq!(twice, once);
    }

    #[test]
    fn test_add_is_union_with_canonical_tags() {
        let known = tags(&["Hip", "Knee"]);
        let next = apply_tag_op(&tags(&["Hip"]), &TagOp::Add(tags(&["hip", " knee ", "Spine"])), &known);
        assert_eq!(next, tags(&["Hip", "Knee", "Spine"]));
        let again = apply_tag_op(&next, &TagOp::Add(tags(&["Spine"])), &known);
        assert_eq!(again, next);
    }

    #[test]
    fn test_replace_and_clear() {
        let current = tags(&["A", "B"]);
        assert_eq!(apply_tag_op(&current, &TagOp::Replace(tags(&["C", "C"])), &[]), tags(&["C"]));
        assert!(apply_tag_op(&current, &TagOp::Clear, &[]).is_empty());
    }

    #[test]
    fn test_validation() {
        let no_storage = BulkOperation::Location(LocationOp::Move {
            storage: None,
            drawer: String::new(),
            slot: String::new(),
        });
        assert!(matches!(no_storage.validate(), Err(EngineError::Validation(_))));

        let blank_room = BulkOperation::Location(LocationOp::Move {
            storage: Some(StorageTarget::Create {
                room: " ".to_string(),
                name: "Cabinet".to_string(),
            }),
            drawer: String::new(),
            slot: String::new(),
        });
        assert!(matches!(blank_room.validate(), Err(EngineError::Validation(_))));

        assert!(BulkOperation::Supplier(ValueOp::Set("  ".to_string())).validate().is_err());
        assert!(BulkOperation::Supplier(ValueOp::Clear).validate().is_ok());
        assert!(BulkOperation::System(TagOp::Clear).validate().is_ok());
    }

    #[test]
    fn test_operation_serde() {
        let op: BulkOperation = serde_json::from_value(serde_json::json!({
            "field": "system",
            "operation": { "op": "remove", "tags": ["A"] }
        }))
        .unwrap();
        assert_eq!(op, BulkOperation::System(TagOp::Remove(tags(&["A"]))));
        assert_eq!(op.op_name(), "remove");
        assert_eq!(op.field(), ItemField::System);
    }
}
