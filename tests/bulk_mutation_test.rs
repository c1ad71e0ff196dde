// ==========================================
// 手术室库存系统 - 批量编辑集成测试
// ==========================================
// 覆盖: 标签幂等、批量移动建柜、写入前校验、批量删除
// ==========================================


use std::sync::Arc;
use test_helpers::{item, placed_item, FixedConfig, MemoryStore};
use theatre_inventory::domain::{ActivityType, Category, Storage, WriteOp};
use theatre_inventory::engine::{
    BulkMutationEngine, BulkOperation, EngineError, LocationOp, StorageTarget, TagOp, ValueOp,
};

fn engine(store: Arc<MemoryStore>) -> BulkMutationEngine<MemoryStore, FixedConfig> {
    BulkMutationEngine::new(store, Arc::new(FixedConfig::default()))
}

fn ids(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("id-{}", i)).collect()
}

fn seeded(n: usize) -> Arc<MemoryStore> {
    let items = (0..n).map(|i| item(&format!("id-{}", i), &format!("SKU-{}", i))).collect();
    Arc::new(MemoryStore::with_data(items, Vec::new()))
}

// ==========================================
// 测试1: 标签移除幂等
// ==========================================
#[tokio::test]
async fn test_tag_remove_is_idempotent() {
    let mut tagged = item("id-0", "SKU-0");
    tagged.system = vec!["Synthes".to_string(), "Stryker".to_string()];
    let store = Arc::new(MemoryStore::with_data(vec![tagged], Vec::new()));
    let engine = engine(store.clone());
    let op = BulkOperation::System(TagOp::Remove(vec!["synthes".to_string()]));

    let first = engine.apply(&ids(1), &op).await.unwrap();
    assert_eq!(first.affected, 1);
    assert_eq!(store.items()[0].system, vec!["Stryker".to_string()]);

    let second = engine.apply(&ids(1), &op).await.unwrap();
    assert_eq!(second.affected, 0);
    assert_eq!(second.unchanged, 1);
    assert_eq!(second.write.groups, 0);
    assert_eq!(store.items()[0].system, vec!["Stryker".to_string()]);
    assert_eq!(store.group_sizes(), vec![1]);
}

#[tokio::test]
async fn test_tag_add_uses_known_spelling() {
    let mut tagged = item("id-0", "SKU-0");
    tagged.system = vec!["Synthes".to_string()];
    let store = Arc::new(MemoryStore::with_data(vec![tagged, item("id-1", "SKU-1")], Vec::new()));

    engine(store.clone())
        .apply(&ids(2), &BulkOperation::System(TagOp::Add(vec!["SYNTHES".to_string()])))
        .await
        .unwrap();

    for item in store.items() {
        assert_eq!(item.system, vec!["Synthes".to_string()]);
    }
}

// ==========================================
// 测试2: 10 条记录移动到新柜 → 只建一个柜
// ==========================================
#[tokio::test]
async fn test_move_to_new_storage_creates_exactly_one() {
    let store = seeded(10);
    let op = BulkOperation::Location(LocationOp::Move {
        storage: Some(StorageTarget::Create {
            room: "OR 3".to_string(),
            name: "Trolley".to_string(),
        }),
        drawer: "2".to_string(),
        slot: String::new(),
    });

    let outcome = engine(store.clone()).apply(&ids(10), &op).await.unwrap();

    assert_eq!(outcome.affected, 10);
    let storages = store.storages();
    assert_eq!(storages.len(), 1);
    assert_eq!(outcome.storage_created.as_deref(), Some(storages[0].storage_id.as_str()));

    let state = store.state.lock().unwrap();
    let ops: Vec<&WriteOp> = state.groups.iter().flatten().collect();
    assert_eq!(ops.len(), 11);
    assert!(matches!(ops[0], WriteOp::CreateStorage(_)));
    drop(state);

    for item in store.items() {
        let location = item.location.unwrap();
        assert_eq!(location.storage_id, storages[0].storage_id);
        assert_eq!(location.drawer, "2");
    }
}

#[tokio::test]
async fn test_move_reuses_storage_with_same_name() {
    let existing = Storage::new("st-1", "OR 3", "Trolley");
    let items = vec![item("id-0", "SKU-0")];
    let store = Arc::new(MemoryStore::with_data(items, vec![existing]));
    let op = BulkOperation::Location(LocationOp::Move {
        storage: Some(StorageTarget::Create {
            room: "or 3".to_string(),
            name: "TROLLEY".to_string(),
        }),
        drawer: String::new(),
        slot: String::new(),
    });

    let outcome = engine(store.clone()).apply(&ids(1), &op).await.unwrap();

    assert!(outcome.storage_created.is_none());
    assert_eq!(store.storages().len(), 1);
    assert_eq!(store.items()[0].location.as_ref().unwrap().storage_id, "st-1");
}

#[tokio::test]
async fn test_move_without_affected_items_creates_no_storage() {
    let store = seeded(1);
    let op = BulkOperation::Location(LocationOp::Move {
        storage: Some(StorageTarget::Create {
            room: "OR".to_string(),
            name: "T".to_string(),
        }),
        drawer: String::new(),
        slot: String::new(),
    });
    let selection = vec!["ghost-1".to_string(), "ghost-2".to_string()];

    let outcome = engine(store.clone()).apply(&selection, &op).await.unwrap();

    assert_eq!(outcome.affected, 0);
    assert_eq!(outcome.missing, 2);
    assert!(outcome.storage_created.is_none());
    assert_eq!(outcome.write.groups, 0);
    assert!(store.storages().is_empty());
    assert!(store.group_sizes().is_empty());
}

// ==========================================
// 测试3: 校验失败 → 不写入
// ==========================================
#[tokio::test]
async fn test_unknown_storage_is_rejected_before_write() {
    let store = seeded(3);
    let op = BulkOperation::Location(LocationOp::Move {
        storage: Some(StorageTarget::Existing("nope".to_string())),
        drawer: String::new(),
        slot: String::new(),
    });

    let err = engine(store.clone()).apply(&ids(3), &op).await.unwrap_err();

    assert!(matches!(err, EngineError::Validation(_)));
    assert!(store.group_sizes().is_empty());
    assert!(store.activities().is_empty());
}

#[tokio::test]
async fn test_unresolvable_category_is_rejected() {
    let store = seeded(2);
    let op = BulkOperation::Category(ValueOp::Set("xyz123".to_string()));

    let err = engine(store.clone()).apply(&ids(2), &op).await.unwrap_err();

    assert!(matches!(err, EngineError::Validation(_)));
    assert!(store.group_sizes().is_empty());
}

#[tokio::test]
async fn test_category_set_resolves_typo() {
    let store = seeded(2);
    let op = BulkOperation::Category(ValueOp::Set("Electve".to_string()));

    let outcome = engine(store.clone()).apply(&ids(2), &op).await.unwrap();

    assert_eq!(outcome.affected, 2);
    for item in store.items() {
        assert_eq!(item.category, Some(Category::Elective));
    }
}

// ==========================================
// 测试4: 缺失的选中项被跳过,日志记录字段与数量
// ==========================================
#[tokio::test]
async fn test_missing_selection_is_skipped_and_logged() {
    let store = seeded(2);
    let selection = vec!["id-0".to_string(), "id-1".to_string(), "gone".to_string()];

    let outcome = engine(store.clone())
        .apply(&selection, &BulkOperation::Supplier(ValueOp::Set("Medline".to_string())))
        .await
        .unwrap();

    assert_eq!(outcome.selected, 3);
    assert_eq!(outcome.affected, 2);
    assert_eq!(outcome.missing, 1);

    let activities = store.activities();
    assert_eq!(activities.len(), 1);
    assert_eq!(activities[0].activity_type, ActivityType::BulkEdit.as_str());
    assert_eq!(activities[0].details, "supplier: 2");
}

#[tokio::test]
async fn test_location_clear_unplaces_items() {
    let items = vec![placed_item("id-0", "SKU-0", "st-1"), item("id-1", "SKU-1")];
    let store = Arc::new(MemoryStore::with_data(items, vec![Storage::new("st-1", "OR 1", "A")]));

    let outcome = engine(store.clone())
        .apply(&ids(2), &BulkOperation::Location(LocationOp::Clear))
        .await
        .unwrap();

    assert_eq!(outcome.affected, 1);
    assert_eq!(outcome.unchanged, 1);
    assert!(store.items().iter().all(|item| item.location.is_none()));
}

// ==========================================
// 测试5: 批量删除
// ==========================================
#[tokio::test]
async fn test_bulk_delete() {
    let store = seeded(5);
    let selection = vec!["id-1".to_string(), "id-3".to_string(), "id-9".to_string()];

    let outcome = engine(store.clone()).delete(&selection).await.unwrap();

    assert_eq!(outcome.affected, 2);
    assert_eq!(outcome.missing, 1);
    let remaining: Vec<String> = store.items().into_iter().map(|item| item.item_id).collect();
    assert_eq!(remaining, vec!["id-0", "id-2", "id-4"]);
    assert_eq!(store.activities()[0].activity_type, ActivityType::BulkDelete.as_str());
}

#[tokio::test]
async fn test_bulk_write_failure_reports_committed_groups() {
    let items = (0..600).map(|i| item(&format!("id-{}", i), &format!("SKU-{}", i))).collect();
    let store = Arc::new(MemoryStore::failing_at(2));
    store.state.lock().unwrap().items = items;

    let err = engine(store.clone())
        .apply(&ids(600), &BulkOperation::Type(ValueOp::Set("Implant".to_string())))
        .await
        .unwrap_err();

    match err {
        EngineError::GroupCommitFailed {
            committed_groups,
            total_groups,
            ..
        } => assert_eq!((committed_groups, total_groups), (1, 2)),
        other => panic!("unexpected error: {:?}", other),
    }
    let typed = store
        .items()
        .iter()
        .filter(|item| item.item_type.as_deref() == Some("implant"))
        .count();
    assert_eq!(typed, 450);
}
