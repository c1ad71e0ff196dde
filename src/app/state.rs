// ==========================================
// 手术室库存系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{BulkApi, ExportApi, ImportApi};
use crate::config::config_manager::ConfigManager;
use crate::config::ImportConfigReader;
use crate::db::{init_schema, open_sqlite_connection};
use crate::repository::{InventoryStore, SqliteInventoryStore};

/// 应用状态
///
/// 所有API共享同一个 SQLite 连接
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 库存存储
    pub store: Arc<SqliteInventoryStore>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 导入API
    pub import_api: Arc<ImportApi>,

    /// 批量编辑API
    pub bulk_api: Arc<BulkApi>,

    /// 导出API
    pub export_api: Arc<ExportApi>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 说明
    /// 1. 打开数据库并应用统一 PRAGMA
    /// 2. 初始化 schema(幂等)
    /// 3. 创建存储、配置与各 API
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState,数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("数据库初始化失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        let store = Arc::new(SqliteInventoryStore::from_connection(conn.clone()));
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn).map_err(|e| format!("无法初始化配置管理器: {}", e))?,
        );

        let store_dyn: Arc<dyn InventoryStore> = store.clone();
        let config_dyn: Arc<dyn ImportConfigReader> = config_manager.clone();

        let import_api = Arc::new(ImportApi::new(store_dyn.clone(), config_dyn.clone()));
        let bulk_api = Arc::new(BulkApi::new(store_dyn.clone(), config_dyn));
        let export_api = Arc::new(ExportApi::new(store_dyn));

        tracing::info!("AppState初始化完成");
        Ok(Self {
            db_path,
            store,
            config_manager,
            import_api,
            bulk_api,
            export_api,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先使用环境变量 THEATRE_INVENTORY_DB_PATH,否则位于用户数据目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("THEATRE_INVENTORY_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./theatre_inventory.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("theatre-inventory");
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("theatre_inventory.db");
        }
    }

    path.to_string_lossy().to_string()
}
