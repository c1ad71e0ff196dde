// ==========================================
// 手术室库存系统 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入/批量编辑所需的配置读取接口(不包含实现)
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use async_trait::async_trait;
use std::error::Error;

pub type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 引擎所需的配置读取接口
// 实现者: ConfigManager(从 config_kv 表读取)
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    // ===== 写组配置 =====

    /// 获取单个写组的操作上限
    ///
    /// # 默认值
    /// - 450(存储层硬上限 500,预留余量)
    ///
    /// # 约束
    /// - 超出 1..=500 时截断
    async fn get_write_group_limit(&self) -> ConfigResult<usize>;

    // ===== 模糊匹配配置 =====

    /// 获取编辑距离阈值
    ///
    /// # 默认值
    /// - 2
    async fn get_fuzzy_max_distance(&self) -> ConfigResult<usize>;

    /// 获取分类词表
    ///
    /// # 默认值
    /// - ["trauma", "emergency", "elective"]
    async fn get_category_vocabulary(&self) -> ConfigResult<Vec<String>>;

    /// 获取类型词表(开放词表的种子值)
    ///
    /// # 默认值
    /// - ["consumable", "instrument_tray", "single_pack", "implant", "medical_device", "table_attach"]
    async fn get_type_vocabulary(&self) -> ConfigResult<Vec<String>>;

    // ===== 存储柜配置 =====

    /// 导入时是否自动创建缺失的存储柜
    ///
    /// # 默认值
    /// - true
    async fn get_create_missing_storages(&self) -> ConfigResult<bool>;
}
