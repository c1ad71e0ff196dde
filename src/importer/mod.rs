// ==========================================
// 手术室库存系统 - 导入层
// ==========================================
// 职责: 表格解析 → 表头映射 → 模糊匹配 → 记录规范化;CSV 导出
// 约束: 纯计算,不访问数据库
// 支持: Excel, CSV
// ==========================================

// 模块声明
pub mod error;
pub mod exporter;
pub mod file_parser;
pub mod fuzzy_resolver;
pub mod header_mapper;
pub mod record_normalizer;
pub mod table_parser;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use exporter::{InventoryExporter, EXPORT_HEADERS};
pub use file_parser::{CsvParser, ExcelParser, FileParser, UniversalFileParser};
pub use fuzzy_resolver::{CachedResolver, FuzzyResolver, DEFAULT_MAX_DISTANCE};
pub use header_mapper::{normalize_header, HeaderMapper};
pub use record_normalizer::{NormalizeFlags, NormalizedRecord, Placement, RecordNormalizer};
pub use table_parser::{FlatTableParser, ParsedTable};
