// ==========================================
// 手术室库存系统 - 操作日志领域模型
// ==========================================
// 对齐: activities 表
// 写入方式: 追加即忘(失败不回滚业务写入)
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// ==========================================
// ActivityLog - 操作日志
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityLog {
    pub activity_id: String,
    pub activity_type: String, // 存储为字符串(见 ActivityType::as_str)
    pub details: String,       // 面向操作员的摘要
    pub payload_json: Option<JsonValue>,
    pub created_at: NaiveDateTime,
}

impl ActivityLog {
    pub fn new(activity_type: ActivityType, details: impl Into<String>, payload: Option<JsonValue>) -> Self {
        Self {
            activity_id: uuid::Uuid::new_v4().to_string(),
            activity_type: activity_type.as_str().to_string(),
            details: details.into(),
            payload_json: payload,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}

// ==========================================
// ActivityType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityType {
    Import,     // 表格导入
    BulkEdit,   // 批量编辑
    BulkDelete, // 批量删除
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Import => "Import",
            ActivityType::BulkEdit => "Bulk Edit",
            ActivityType::BulkDelete => "Bulk Delete",
        }
    }
}
