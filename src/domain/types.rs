// ==========================================
// 手术室库存系统 - 领域类型定义
// ==========================================
// 职责: 分类/用量/上限/库存水位等值类型
// 红线: 封闭词表,不接受任意字符串
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 手术流程分类 (Category)
// ==========================================
// 词表固定: trauma / emergency / elective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Trauma,    // 创伤
    Emergency, // 急诊
    Elective,  // 择期
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Trauma, Category::Emergency, Category::Elective];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Trauma => "trauma",
            Category::Emergency => "emergency",
            Category::Elective => "elective",
        }
    }

    /// 精确解析(忽略大小写与首尾空白)
    ///
    /// 模糊匹配不在此处,由 FuzzyResolver 先行规范化
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "trauma" => Some(Category::Trauma),
            "emergency" => Some(Category::Emergency),
            "elective" => Some(Category::Elective),
            _ => None,
        }
    }

    /// 供模糊匹配使用的候选词表
    pub fn vocabulary() -> Vec<String> {
        Self::ALL.iter().map(|c| c.as_str().to_string()).collect()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 使用频率 (Usage)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Usage {
    High,
    Medium,
    Low,
}

impl Usage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Usage::High => "high",
            Usage::Medium => "medium",
            Usage::Low => "low",
        }
    }

    /// 解析用量标记,兼容 H/M/L 缩写
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "high" | "h" => Some(Usage::High),
            "medium" | "med" | "m" => Some(Usage::Medium),
            "low" | "l" => Some(Usage::Low),
            _ => None,
        }
    }
}

impl fmt::Display for Usage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 库存上限 (MaxQty)
// ==========================================
// 区分"无上限"与"上限为 0"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxQty {
    #[default]
    Unbounded,
    Cap(u32),
}

impl MaxQty {
    /// 数据库列值: NULL 表示无上限
    pub fn to_column(self) -> Option<i64> {
        match self {
            MaxQty::Unbounded => None,
            MaxQty::Cap(n) => Some(i64::from(n)),
        }
    }

    pub fn from_column(value: Option<i64>) -> Self {
        match value {
            None => MaxQty::Unbounded,
            Some(n) => MaxQty::Cap(u32::try_from(n.max(0)).unwrap_or(u32::MAX)),
        }
    }
}

impl fmt::Display for MaxQty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaxQty::Unbounded => write!(f, ""),
            MaxQty::Cap(n) => write!(f, "{}", n),
        }
    }
}

// ==========================================
// 库存水位 (StockLevel)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockLevel {
    Below, // 低于最小库存
    Ok,    // 正常
    Over,  // 超出上限
}
