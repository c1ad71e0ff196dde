// ==========================================
// 手术室库存系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 约束: 输入类错误必须在任何写入前返回
// ==========================================

use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xls/.csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    // ===== 输入校验错误(写入前) =====
    #[error("文件为空: 未找到表头或数据行")]
    EmptyTable,

    #[error("SKU 列未映射: 导入至少需要映射 sku")]
    SkuColumnUnmapped,

    #[error("列映射越界: 字段 {field} 指向第 {column} 列,但表头只有 {header_count} 列")]
    ColumnOutOfRange {
        field: String,
        column: usize,
        header_count: usize,
    },

    #[error("没有可导入的记录: {total_rows} 行均缺少 SKU")]
    NoValidRows { total_rows: usize },

    // ===== 导出错误 =====
    #[error("导出失败: {0}")]
    ExportError(String),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
