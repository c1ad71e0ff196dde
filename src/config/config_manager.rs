// ==========================================
// 手术室库存系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::import_config_trait::{ConfigResult, ImportConfigReader};
use crate::domain::types::Category;
use crate::repository::inventory_store::MAX_WRITE_GROUP_LIMIT;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};
use tracing::warn;

pub const DEFAULT_WRITE_GROUP_LIMIT: usize = 450;
pub const DEFAULT_FUZZY_MAX_DISTANCE: usize = 2;
pub const DEFAULT_TYPE_VOCABULARY: [&str; 6] = [
    "consumable",
    "instrument_tray",
    "single_pack",
    "implant",
    "medical_device",
    "table_attach",
];

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 从已有连接创建 ConfigManager
    ///
    /// 说明: 会对传入连接再次应用统一 PRAGMA(幂等)
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值(scope_id='global')
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 写入 global scope 的配置值(UPSERT)
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 从 config_kv 表读取配置值,带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> ConfigResult<String> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    fn parse_list(value: &str) -> Vec<String> {
        value
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_write_group_limit(&self) -> ConfigResult<usize> {
        let default = DEFAULT_WRITE_GROUP_LIMIT.to_string();
        let value = self.get_config_or_default(config_keys::WRITE_GROUP_LIMIT, &default)?;
        let parsed = value.trim().parse::<usize>().unwrap_or(DEFAULT_WRITE_GROUP_LIMIT);
        let clamped = parsed.clamp(1, MAX_WRITE_GROUP_LIMIT);
        if clamped != parsed {
            warn!(
                config_key = config_keys::WRITE_GROUP_LIMIT,
                configured = parsed,
                applied = clamped,
                "写组上限超出范围,已截断"
            );
        }
        Ok(clamped)
    }

    async fn get_fuzzy_max_distance(&self) -> ConfigResult<usize> {
        let default = DEFAULT_FUZZY_MAX_DISTANCE.to_string();
        let value = self.get_config_or_default(config_keys::FUZZY_MAX_DISTANCE, &default)?;
        Ok(value.trim().parse::<usize>().unwrap_or(DEFAULT_FUZZY_MAX_DISTANCE))
    }

    async fn get_category_vocabulary(&self) -> ConfigResult<Vec<String>> {
        match self.get_config_value(config_keys::CATEGORY_VOCABULARY)? {
            Some(value) if !Self::parse_list(&value).is_empty() => Ok(Self::parse_list(&value)),
            _ => Ok(Category::vocabulary()),
        }
    }

    async fn get_type_vocabulary(&self) -> ConfigResult<Vec<String>> {
        match self.get_config_value(config_keys::TYPE_VOCABULARY)? {
            Some(value) if !Self::parse_list(&value).is_empty() => Ok(Self::parse_list(&value)),
            _ => Ok(DEFAULT_TYPE_VOCABULARY.iter().map(|s| s.to_string()).collect()),
        }
    }

    async fn get_create_missing_storages(&self) -> ConfigResult<bool> {
        let value = self.get_config_or_default(config_keys::CREATE_MISSING_STORAGES, "true")?;
        Ok(!matches!(
            value.trim().to_lowercase().as_str(),
            "false" | "0" | "no" | "off"
        ))
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 写组
    pub const WRITE_GROUP_LIMIT: &str = "write_group_limit";

    // 模糊匹配
    pub const FUZZY_MAX_DISTANCE: &str = "fuzzy_max_distance";
    pub const CATEGORY_VOCABULARY: &str = "category_vocabulary"; // 逗号分隔
    pub const TYPE_VOCABULARY: &str = "type_vocabulary"; // 逗号分隔

    // 存储柜
    pub const CREATE_MISSING_STORAGES: &str = "create_missing_storages";
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[tokio::test]
    async fn test_defaults() {
        let config = manager();
        assert_eq!(config.get_write_group_limit().await.unwrap(), 450);
        assert_eq!(config.get_fuzzy_max_distance().await.unwrap(), 2);
        assert_eq!(
            config.get_category_vocabulary().await.unwrap(),
            vec!["trauma", "emergency", "elective"]
        );
        assert_eq!(config.get_type_vocabulary().await.unwrap().len(), 6);
        assert!(config.get_create_missing_storages().await.unwrap());
    }

    #[tokio::test]
    async fn test_overrides_and_clamping() {
        let config = manager();
        config.set_global_config_value(config_keys::WRITE_GROUP_LIMIT, "900").unwrap();
        config.set_global_config_value(config_keys::FUZZY_MAX_DISTANCE, "1").unwrap();
        config
            .set_global_config_value(config_keys::TYPE_VOCABULARY, "implant, screw ,")
            .unwrap();
        config
            .set_global_config_value(config_keys::CREATE_MISSING_STORAGES, "false")
            .unwrap();

        assert_eq!(config.get_write_group_limit().await.unwrap(), 499);
        assert_eq!(config.get_fuzzy_max_distance().await.unwrap(), 1);
        assert_eq!(config.get_type_vocabulary().await.unwrap(), vec!["implant", "screw"]);
        assert!(!config.get_create_missing_storages().await.unwrap());

        config.set_global_config_value(config_keys::WRITE_GROUP_LIMIT, "0").unwrap();
        assert_eq!(config.get_write_group_limit().await.unwrap(), 1);
    }
}
