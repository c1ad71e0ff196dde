// ==========================================
// 手术室库存系统 - 操作日志数据仓储
// ==========================================
// 对齐: activities 表
// 写入方式: 追加;读取按时间倒序
// ==========================================

use crate::domain::activity::ActivityLog;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ==========================================
// ActivityLogRepository - 操作日志仓储
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
pub struct ActivityLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ActivityLogRepository {
    /// 创建新的操作日志仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入操作日志
    ///
    /// # 返回
    /// - `Ok(activity_id)`: 成功插入
    /// - `Err(...)`: 数据库错误
    pub fn insert(&self, log: &ActivityLog) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"
            INSERT INTO activities (
                activity_id, activity_type, details, payload_json, created_at
            ) VALUES (?, ?, ?, ?, ?)
            "#,
            params![
                log.activity_id,
                log.activity_type,
                log.details,
                log.payload_json.as_ref().map(|v| v.to_string()),
                log.created_at.format(TS_FORMAT).to_string(),
            ],
        )?;

        Ok(log.activity_id.clone())
    }

    /// 查询最近的操作日志
    pub fn list_recent(&self, limit: i64) -> RepositoryResult<Vec<ActivityLog>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT activity_id, activity_type, details, payload_json, created_at
            FROM activities
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?
            "#,
        )?;

        let logs = stmt
            .query_map(params![limit], map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(logs)
    }

    /// 按类型查询(如 "Import" / "Bulk Edit")
    pub fn find_by_type(&self, activity_type: &str, limit: i64) -> RepositoryResult<Vec<ActivityLog>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT activity_id, activity_type, details, payload_json, created_at
            FROM activities
            WHERE activity_type = ?
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?
            "#,
        )?;

        let logs = stmt
            .query_map(params![activity_type, limit], map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(logs)
    }
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<ActivityLog> {
    let payload: Option<String> = row.get(3)?;
    let created_at: String = row.get(4)?;
    Ok(ActivityLog {
        activity_id: row.get(0)?,
        activity_type: row.get(1)?,
        details: row.get(2)?,
        payload_json: payload.and_then(|s| serde_json::from_str(&s).ok()),
        created_at: NaiveDateTime::parse_from_str(&created_at, TS_FORMAT).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?,
    })
}
