// ==========================================
// 手术室库存系统 - 导入流程集成测试
// ==========================================
// 覆盖: 分组写入、同 SKU 合并、写入前校验、部分写入
// ==========================================


use std::sync::Arc;
use test_helpers::{item, FixedConfig, MemoryStore};
use theatre_inventory::domain::{ActivityType, Category, ColumnMapping, MaxQty, TargetField, WriteOp};
use theatre_inventory::engine::{EngineError, ImportOptions, InventoryImporter};
use theatre_inventory::importer::{FlatTableParser, HeaderMapper, ImportError, ParsedTable};

fn table(text: &str) -> ParsedTable {
    FlatTableParser::default().parse_text(text).unwrap()
}

fn importer(store: Arc<MemoryStore>) -> InventoryImporter<MemoryStore, FixedConfig> {
    InventoryImporter::new(store, Arc::new(FixedConfig::default()))
}

fn bulk_csv(rows: usize) -> String {
    let mut text = String::from("SKU,Product Description,Qty\n");
    for i in 0..rows {
        text.push_str(&format!("SKU-{:05},Item {},{}\n", i, i, i % 7));
    }
    text
}

// ==========================================
// 测试1: 1200 条新增 → 450/450/300 三个写组,顺序保持
// ==========================================
#[tokio::test]
async fn test_large_import_is_split_into_ordered_groups() {
    let store = Arc::new(MemoryStore::new());
    let table = table(&bulk_csv(1200));
    let mapping = HeaderMapper::suggest(&table.headers);

    let summary = importer(store.clone())
        .import_table(&table, &mapping, ImportOptions::default())
        .await
        .unwrap();

    assert_eq!(summary.stats.inserted, 1200);
    assert_eq!(summary.write.groups, 3);
    assert_eq!(summary.write.ops, 1200);
    assert_eq!(store.group_sizes(), vec![450, 450, 300]);

    let state = store.state.lock().unwrap();
    let skus: Vec<String> = state
        .groups
        .iter()
        .flatten()
        .map(|op| match op {
            WriteOp::InsertItem(item) => item.sku.clone(),
            other => panic!("unexpected op: {:?}", other),
        })
        .collect();
    let expected: Vec<String> = (0..1200).map(|i| format!("SKU-{:05}", i)).collect();
    assert_eq!(skus, expected);
}

// ==========================================
// 测试2: 同一文件内 SKU 大小写不同 → 只产生一条记录
// ==========================================
#[tokio::test]
async fn test_same_sku_different_case_yields_single_item() {
    let store = Arc::new(MemoryStore::new());
    let table = table("SKU,Product Description,Qty\nabc-1,Gauze,3\nABC-1,Gauze Swab,5\n");
    let mapping = HeaderMapper::suggest(&table.headers);

    let summary = importer(store.clone())
        .import_table(&table, &mapping, ImportOptions::default())
        .await
        .unwrap();

    assert_eq!(summary.stats.inserted, 1);
    assert_eq!(summary.stats.merged_duplicates, 1);

    let items = store.items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].name, "Gauze Swab");
    assert_eq!(items[0].qty, 5);
}

// ==========================================
// 测试3: SKU 未映射 → 写入前拒绝
// ==========================================
#[tokio::test]
async fn test_unmapped_sku_is_rejected_before_any_write() {
    let store = Arc::new(MemoryStore::new());
    let table = table("Product Description,Qty\nGauze,3\n");
    let mut mapping = ColumnMapping::new();
    mapping.set(TargetField::Name, 0);
    mapping.set(TargetField::Qty, 1);

    let err = importer(store.clone())
        .import_table(&table, &mapping, ImportOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Import(ImportError::SkuColumnUnmapped)));
    assert!(store.group_sizes().is_empty());
    assert!(store.activities().is_empty());
}

#[tokio::test]
async fn test_rows_without_sku_only_is_rejected() {
    let store = Arc::new(MemoryStore::new());
    let table = table("SKU,Product Description\n,Gauze\n  ,Tape\n");
    let mapping = HeaderMapper::suggest(&table.headers);

    let err = importer(store.clone())
        .import_table(&table, &mapping, ImportOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Import(ImportError::NoValidRows { total_rows: 2 })));
    assert!(store.group_sizes().is_empty());
}

// ==========================================
// 测试4: 已存在的物品只更新映射到的字段
// ==========================================
#[tokio::test]
async fn test_existing_item_keeps_unmapped_fields() {
    let mut existing = item("id-1", "K-100");
    existing.comments = "keep me".to_string();
    existing.qty = 9;
    let store = Arc::new(MemoryStore::with_data(vec![existing], Vec::new()));

    let table = table("Cat No,Qty,Max,Category\nk-100,4,,Traum\n");
    let mapping = HeaderMapper::suggest(&table.headers);
    let summary = importer(store.clone())
        .import_table(&table, &mapping, ImportOptions::default())
        .await
        .unwrap();

    assert_eq!(summary.stats.updated, 1);
    assert_eq!(summary.stats.inserted, 0);

    let updated = store.item_by_sku("K-100").unwrap();
    assert_eq!(updated.item_id, "id-1");
    assert_eq!(updated.qty, 4);
    assert_eq!(updated.max, MaxQty::Unbounded);
    assert_eq!(updated.category, Some(Category::Trauma));
    assert_eq!(updated.comments, "keep me");
}

// ==========================================
// 测试5: 新存储柜只创建一次,且先于引用它的物品提交
// ==========================================
#[tokio::test]
async fn test_missing_storage_created_once_before_items() {
    let store = Arc::new(MemoryStore::new());
    let table = table(
        "SKU,Room,Storage,Drawer,Slot\nA1,OR 1,Cabinet A,1,a\nA2,or 1,cabinet a,2,b\nA3,OR 2,Cabinet A,1,c\n",
    );
    let mapping = HeaderMapper::suggest(&table.headers);

    let summary = importer(store.clone())
        .import_table(&table, &mapping, ImportOptions::default())
        .await
        .unwrap();

    assert_eq!(summary.stats.storages_created, 2);
    assert_eq!(store.storages().len(), 2);

    let state = store.state.lock().unwrap();
    let ops: Vec<&WriteOp> = state.groups.iter().flatten().collect();
    assert!(matches!(ops[0], WriteOp::CreateStorage(_)));
    assert!(matches!(ops[1], WriteOp::CreateStorage(_)));
    drop(state);

    let a1 = store.item_by_sku("A1").unwrap();
    let a2 = store.item_by_sku("A2").unwrap();
    assert_eq!(
        a1.location.as_ref().map(|l| l.storage_id.clone()),
        a2.location.as_ref().map(|l| l.storage_id.clone())
    );
}

#[tokio::test]
async fn test_storage_creation_can_be_disabled() {
    let store = Arc::new(MemoryStore::new());
    let table = table("SKU,Room,Storage\nA1,OR 1,Cabinet A\n");
    let mapping = HeaderMapper::suggest(&table.headers);

    let summary = importer(store.clone())
        .import_table(
            &table,
            &mapping,
            ImportOptions {
                create_missing_storages: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(summary.stats.storages_created, 0);
    assert_eq!(summary.stats.unplaced, 1);
    assert!(store.storages().is_empty());
    assert!(store.item_by_sku("A1").unwrap().location.is_none());
}

// ==========================================
// 测试6: 第 k 组失败 → 报告已提交组数,之前的组保留
// ==========================================
#[tokio::test]
async fn test_failure_in_second_group_reports_partial_write() {
    let store = Arc::new(MemoryStore::failing_at(2));
    let table = table(&bulk_csv(1000));
    let mapping = HeaderMapper::suggest(&table.headers);

    let err = importer(store.clone())
        .import_table(&table, &mapping, ImportOptions::default())
        .await
        .unwrap_err();

    match &err {
        EngineError::GroupCommitFailed {
            committed_groups,
            total_groups,
            committed_ops,
            ..
        } => {
            assert_eq!(*committed_groups, 1);
            assert_eq!(*total_groups, 3);
            assert_eq!(*committed_ops, 450);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(err.is_partial_write());
    assert_eq!(store.items().len(), 450);
    assert!(store.activities().is_empty());

    // 重跑: 已提交的 450 条变为更新
    let retry_store = Arc::new(MemoryStore::with_data(store.items(), Vec::new()));
    let summary = importer(retry_store.clone())
        .import_table(&table, &mapping, ImportOptions::default())
        .await
        .unwrap();
    assert_eq!(summary.stats.updated, 450);
    assert_eq!(summary.stats.inserted, 550);
    assert_eq!(retry_store.items().len(), 1000);
}

// ==========================================
// 测试7: 导入完成后记录一条 Import 日志
// ==========================================
#[tokio::test]
async fn test_import_appends_activity() {
    let store = Arc::new(MemoryStore::new());
    let table = table("SKU\nA1\nA2\n");
    let mapping = HeaderMapper::suggest(&table.headers);

    importer(store.clone())
        .import_table(&table, &mapping, ImportOptions::default())
        .await
        .unwrap();

    let activities = store.activities();
    assert_eq!(activities.len(), 1);
    assert_eq!(activities[0].activity_type, ActivityType::Import.as_str());
    assert_eq!(activities[0].details, "Rows: 2");
}

// ==========================================
// 测试8: desc_only 时名称取自描述列
// ==========================================
#[tokio::test]
async fn test_desc_only_takes_name_from_description() {
    let store = Arc::new(MemoryStore::new());
    let table = table("SKU,Name,Description\nA1,short,Long description\n");
    let mapping = HeaderMapper::suggest(&table.headers);
    assert_eq!(mapping.get(TargetField::Description), Some(2));

    importer(store.clone())
        .import_table(
            &table,
            &mapping,
            ImportOptions {
                desc_only: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(store.item_by_sku("A1").unwrap().name, "Long description");
}
