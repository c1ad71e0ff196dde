// ==========================================
// 手术室库存系统 - 文件解析器实现
// ==========================================
// 支持: Excel (.xlsx/.xls) / CSV (.csv/.txt)
// 输出: 统一交给 FlatTableParser 生成 { headers, rows }
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::table_parser::{FlatTableParser, ParsedTable};
use calamine::{open_workbook_auto, Reader};
use std::path::Path;
use tracing::debug;

/// 文件解析接口
pub trait FileParser: Send + Sync {
    /// 解析文件为平面表格
    fn parse_file(&self, file_path: &Path) -> ImportResult<ParsedTable>;
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser {
    table_parser: FlatTableParser,
}

impl CsvParser {
    pub fn new(delimiter: u8) -> Self {
        Self {
            table_parser: FlatTableParser::new(delimiter),
        }
    }
}

impl Default for CsvParser {
    fn default() -> Self {
        Self::new(b',')
    }
}

impl FileParser for CsvParser {
    fn parse_file(&self, file_path: &Path) -> ImportResult<ParsedTable> {
        // 检查文件存在
        if !file_path.exists() {
            return Err(ImportError::FileNotFound(file_path.display().to_string()));
        }

        let bytes = std::fs::read(file_path)?;
        // 非 UTF-8 字节按替换字符处理,不中断导入
        let text = String::from_utf8_lossy(&bytes);
        let table = self.table_parser.parse_text(&text)?;

        debug!(
            file = %file_path.display(),
            headers = table.headers.len(),
            rows = table.rows.len(),
            "CSV 解析完成"
        );
        Ok(table)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl FileParser for ExcelParser {
    fn parse_file(&self, file_path: &Path) -> ImportResult<ParsedTable> {
        // 检查文件存在
        if !file_path.exists() {
            return Err(ImportError::FileNotFound(file_path.display().to_string()));
        }

        // 打开 Excel 文件(xlsx/xls 自动识别)
        let mut workbook = open_workbook_auto(file_path)?;

        // 读取第一个 sheet
        let sheet_names = workbook.sheet_names().to_owned();
        let sheet_name = sheet_names
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))?;

        let range = workbook.worksheet_range(&sheet_name)?;

        let grid: Vec<Vec<String>> = range
            .rows()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect();

        let table = FlatTableParser::from_grid(grid);
        debug!(
            file = %file_path.display(),
            sheet = %sheet_name,
            rows = table.rows.len(),
            "Excel 解析完成"
        );
        Ok(table)
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    pub fn is_excel(path: &Path) -> bool {
        matches!(Self::extension(path).as_str(), "xlsx" | "xls" | "xlsm")
    }

    fn extension(path: &Path) -> String {
        path.extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase()
    }
}

impl FileParser for UniversalFileParser {
    fn parse_file(&self, file_path: &Path) -> ImportResult<ParsedTable> {
        let ext = Self::extension(file_path);
        match ext.as_str() {
            "csv" | "txt" => CsvParser::default().parse_file(file_path),
            "tsv" => CsvParser::new(b'\t').parse_file(file_path),
            "xlsx" | "xls" | "xlsm" => ExcelParser.parse_file(file_path),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }
}
