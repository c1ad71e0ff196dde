// ==========================================
// 手术室库存系统 - 平面表格解析器
// ==========================================
// 职责: 分隔文本 / 内存网格 → { headers, rows }
// 约束: 纯函数,无副作用
// 规则:
// - 双引号包裹的字段可包含分隔符与换行,"" 表示字面量 "
// - 未闭合的引号按字面量读到输入末尾(宽松解析,不报错)
// - 所有单元格去空白后均为空的行被丢弃
// ==========================================

use crate::importer::error::ImportResult;
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};

// ==========================================
// ParsedTable - 解析结果
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ParsedTable {
    /// 读取单元格,缺失列视为空串
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// 无表头或无数据行
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() || self.rows.is_empty()
    }
}

// ==========================================
// FlatTableParser
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct FlatTableParser {
    delimiter: u8,
}

impl Default for FlatTableParser {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl FlatTableParser {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }

    /// 解析分隔文本
    ///
    /// # 参数
    /// - text: 原始文本(首行为表头)
    ///
    /// # 返回
    /// - ParsedTable: 空文本返回空表,不报错
    pub fn parse_text(&self, text: &str) -> ImportResult<ParsedTable> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true) // 允许行长度不一致
            .delimiter(self.delimiter)
            .double_quote(true)
            .from_reader(text.as_bytes());

        let mut grid = Vec::new();
        for result in reader.records() {
            let record = result?;
            grid.push(record.iter().map(str::to_string).collect::<Vec<_>>());
        }

        Ok(Self::from_grid(grid))
    }

    /// 从内存网格构建(首行为表头)
    pub fn from_grid(grid: Vec<Vec<String>>) -> ParsedTable {
        let mut lines = grid.into_iter();
        let headers: Vec<String> = match lines.next() {
            Some(first) => first
                .iter()
                .enumerate()
                .map(|(idx, h)| {
                    let h = if idx == 0 { h.trim_start_matches('\u{feff}') } else { h.as_str() };
                    h.trim().to_string()
                })
                .collect(),
            None => return ParsedTable::default(),
        };

        // 跳过完全空白的行
        let rows = lines
            .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
            .collect();

        ParsedTable { headers, rows }
    }
}
