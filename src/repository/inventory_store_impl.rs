// ==========================================
// 手术室库存系统 - 库存存储 SQLite 实现
// ==========================================
// 职责: 实现 InventoryStore(使用 rusqlite)
// 约束: 每个写组对应一个 SQLite 事务,失败整组回滚
// 红线: Repository 不含业务规则,只做数据读写
// ==========================================

use crate::db::{configure_sqlite_connection, init_schema};
use crate::domain::activity::ActivityLog;
use crate::domain::item::{FieldUpdate, InventoryItem, ItemLocation};
use crate::domain::storage::Storage;
use crate::domain::types::{Category, MaxQty, Usage};
use crate::domain::write_op::WriteOp;
use crate::repository::activity_log_repo::ActivityLogRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::inventory_store::{InventoryStore, MAX_GROUP_OPS};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction};
use std::sync::{Arc, Mutex};
use tracing::{debug, instrument};

// ==========================================
// SqliteInventoryStore
// ==========================================
pub struct SqliteInventoryStore {
    conn: Arc<Mutex<Connection>>,
    activity_repo: ActivityLogRepository,
}

impl SqliteInventoryStore {
    /// 打开数据库文件并建表
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = Connection::open(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        configure_sqlite_connection(&conn)?;
        init_schema(&conn)?;
        Ok(Self::from_connection(Arc::new(Mutex::new(conn))))
    }

    /// 共享已有连接(调用方负责建表)
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            activity_repo: ActivityLogRepository::new(conn.clone()),
            conn,
        }
    }

    pub fn activity_repo(&self) -> &ActivityLogRepository {
        &self.activity_repo
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ===== 事务内写入 =====

    fn apply_op(tx: &Transaction, op: &WriteOp, now: DateTime<Utc>) -> RepositoryResult<()> {
        match op {
            WriteOp::CreateStorage(storage) => {
                tx.execute(
                    "INSERT INTO storages (storage_id, room, name, created_at) VALUES (?1, ?2, ?3, ?4)",
                    params![storage.storage_id, storage.room, storage.name, now],
                )?;
            }
            WriteOp::InsertItem(item) => {
                let (storage_id, drawer, slot) = location_columns(item.location.as_ref());
                tx.execute(
                    r#"
                    INSERT INTO items (
                        item_id, sku, name, supplier, system_json, category, item_type,
                        comments, qty, min_qty, max_qty, rop, usage,
                        storage_id, drawer, slot, created_at, updated_at
                    ) VALUES (
                        ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?17
                    )
                    "#,
                    params![
                        item.item_id,
                        item.sku,
                        item.name,
                        item.supplier,
                        serde_json::to_string(&item.system)?,
                        item.category.map(|c| c.as_str()),
                        item.item_type,
                        item.comments,
                        item.qty,
                        item.min,
                        item.max.to_column(),
                        item.rop,
                        item.usage.map(|u| u.as_str()),
                        storage_id,
                        drawer,
                        slot,
                        now,
                    ],
                )?;
            }
            WriteOp::UpdateItem { item_id, updates } => {
                let mut assignments: Vec<&'static str> = Vec::new();
                let mut values: Vec<Value> = Vec::new();
                for update in updates {
                    push_update(update, &mut assignments, &mut values)?;
                }
                assignments.push("updated_at = ?");
                values.push(Value::Text(now.format("%F %T%.f%:z").to_string()));
                values.push(Value::Text(item_id.clone()));

                let sql = format!("UPDATE items SET {} WHERE item_id = ?", assignments.join(", "));
                let affected = tx.execute(&sql, params_from_iter(values))?;
                if affected == 0 {
                    return Err(RepositoryError::NotFound {
                        entity: "InventoryItem".to_string(),
                        id: item_id.clone(),
                    });
                }
            }
            WriteOp::DeleteItem { item_id } => {
                // 已删除的物品视为成功(重跑幂等)
                tx.execute("DELETE FROM items WHERE item_id = ?1", params![item_id])?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl InventoryStore for SqliteInventoryStore {
    async fn load_items(&self) -> RepositoryResult<Vec<InventoryItem>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT item_id, sku, name, supplier, system_json, category, item_type,
                   comments, qty, min_qty, max_qty, rop, usage,
                   storage_id, drawer, slot, created_at, updated_at
            FROM items
            ORDER BY sku, item_id
            "#,
        )?;
        let items = stmt
            .query_map([], map_item_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    async fn load_storages(&self) -> RepositoryResult<Vec<Storage>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT storage_id, room, name, created_at FROM storages ORDER BY room, name",
        )?;
        let storages = stmt
            .query_map([], |row| {
                Ok(Storage {
                    storage_id: row.get(0)?,
                    room: row.get(1)?,
                    name: row.get(2)?,
                    created_at: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(storages)
    }

    #[instrument(skip(self, ops), fields(ops = ops.len()))]
    async fn commit_group(&self, ops: &[WriteOp]) -> RepositoryResult<usize> {
        if ops.len() > MAX_GROUP_OPS {
            return Err(RepositoryError::GroupTooLarge {
                ops: ops.len(),
                limit: MAX_GROUP_OPS,
            });
        }
        if ops.is_empty() {
            return Ok(0);
        }

        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        let now = Utc::now();

        for op in ops {
            // 出错时 tx 被 drop,整组回滚
            Self::apply_op(&tx, op, now)?;
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        debug!(ops = ops.len(), "写组提交成功");
        Ok(ops.len())
    }

    async fn append_activity(&self, log: &ActivityLog) -> RepositoryResult<()> {
        self.activity_repo.insert(log)?;
        Ok(())
    }
}

// ==========================================
// 行映射辅助
// ==========================================

fn location_columns(location: Option<&ItemLocation>) -> (Option<&str>, Option<&str>, Option<&str>) {
    match location {
        Some(loc) => (
            Some(loc.storage_id.as_str()),
            Some(loc.drawer.as_str()),
            Some(loc.slot.as_str()),
        ),
        None => (None, None, None),
    }
}

fn text_or_null(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |v| Value::Text(v.to_string()))
}

fn push_update(
    update: &FieldUpdate,
    assignments: &mut Vec<&'static str>,
    values: &mut Vec<Value>,
) -> RepositoryResult<()> {
    match update {
        FieldUpdate::Sku(v) => {
            assignments.push("sku = ?");
            values.push(Value::Text(v.clone()));
        }
        FieldUpdate::Name(v) => {
            assignments.push("name = ?");
            values.push(Value::Text(v.clone()));
        }
        FieldUpdate::Supplier(v) => {
            assignments.push("supplier = ?");
            values.push(text_or_null(v.as_deref()));
        }
        FieldUpdate::System(v) => {
            assignments.push("system_json = ?");
            values.push(Value::Text(serde_json::to_string(v)?));
        }
        FieldUpdate::Category(v) => {
            assignments.push("category = ?");
            values.push(text_or_null(v.map(|c| c.as_str())));
        }
        FieldUpdate::Type(v) => {
            assignments.push("item_type = ?");
            values.push(text_or_null(v.as_deref()));
        }
        FieldUpdate::Qty(v) => {
            assignments.push("qty = ?");
            values.push(Value::Integer(i64::from(*v)));
        }
        FieldUpdate::Min(v) => {
            assignments.push("min_qty = ?");
            values.push(Value::Integer(i64::from(*v)));
        }
        FieldUpdate::Max(v) => {
            assignments.push("max_qty = ?");
            values.push(v.to_column().map_or(Value::Null, Value::Integer));
        }
        FieldUpdate::Rop(v) => {
            assignments.push("rop = ?");
            values.push(Value::Integer(i64::from(*v)));
        }
        FieldUpdate::Usage(v) => {
            assignments.push("usage = ?");
            values.push(text_or_null(v.map(|u| u.as_str())));
        }
        FieldUpdate::Location(v) => {
            let (storage_id, drawer, slot) = location_columns(v.as_ref());
            assignments.push("storage_id = ?");
            values.push(text_or_null(storage_id));
            assignments.push("drawer = ?");
            values.push(text_or_null(drawer));
            assignments.push("slot = ?");
            values.push(text_or_null(slot));
        }
        FieldUpdate::Comments(v) => {
            assignments.push("comments = ?");
            values.push(Value::Text(v.clone()));
        }
    }
    Ok(())
}

fn map_item_row(row: &Row<'_>) -> rusqlite::Result<InventoryItem> {
    let system_json: String = row.get(4)?;
    let system: Vec<String> = serde_json::from_str(&system_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let category: Option<String> = row.get(5)?;
    let usage: Option<String> = row.get(12)?;
    let storage_id: Option<String> = row.get(13)?;

    let location = match storage_id {
        Some(storage_id) => Some(ItemLocation {
            storage_id,
            drawer: row.get::<_, Option<String>>(14)?.unwrap_or_default(),
            slot: row.get::<_, Option<String>>(15)?.unwrap_or_default(),
        }),
        None => None,
    };

    Ok(InventoryItem {
        item_id: row.get(0)?,
        sku: row.get(1)?,
        name: row.get(2)?,
        supplier: row.get(3)?,
        system,
        category: category.as_deref().and_then(Category::parse),
        item_type: row.get(6)?,
        comments: row.get(7)?,
        qty: row.get(8)?,
        min: row.get(9)?,
        max: MaxQty::from_column(row.get(10)?),
        rop: row.get(11)?,
        usage: usage.as_deref().and_then(Usage::parse),
        location,
        created_at: row.get(16)?,
        updated_at: row.get(17)?,
    })
}
