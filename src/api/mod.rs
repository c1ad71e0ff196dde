// ==========================================
// 手术室库存系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供命令行及上层调用
// ==========================================

pub mod bulk_api;
pub mod error;
pub mod export_api;
pub mod import_api;

// 重导出核心类型
pub use bulk_api::BulkApi;
pub use error::{ApiError, ApiResult};
pub use export_api::ExportApi;
pub use import_api::{ImportApi, ImportPreview, PREVIEW_SAMPLE_ROWS};
