// ==========================================
// 手术室库存系统 - 模糊匹配解析器
// ==========================================
// 职责: 自由文本 → 已知词表中的最佳候选
// 优先级: 精确(归一化) > 前缀 > 包含 > 编辑距离(<= 阈值)
// 兜底: 无合格候选时原样返回去空白后的输入(永不失败)
// ==========================================

use std::collections::HashMap;
use strsim::levenshtein;
use tracing::trace;

/// 默认编辑距离阈值
pub const DEFAULT_MAX_DISTANCE: usize = 2;

/// 匹配归一化: 小写 + 去除非字母数字
pub fn normalize_token(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

#[derive(Debug, Clone, Copy)]
pub struct FuzzyResolver {
    max_distance: usize,
}

impl Default for FuzzyResolver {
    fn default() -> Self {
        Self {
            max_distance: DEFAULT_MAX_DISTANCE,
        }
    }
}

impl FuzzyResolver {
    pub fn new(max_distance: usize) -> Self {
        Self { max_distance }
    }

    pub fn max_distance(&self) -> usize {
        self.max_distance
    }

    /// 解析输入值
    ///
    /// # 参数
    /// - input: 原始输入
    /// - candidates: 已知合法值(保持调用方给定的顺序)
    ///
    /// # 返回
    /// - 命中的候选(原样),或去空白后的输入
    pub fn resolve(&self, input: &str, candidates: &[String]) -> String {
        let cleaned = input.trim();
        let needle = normalize_token(cleaned);
        if needle.is_empty() || candidates.is_empty() {
            return cleaned.to_string();
        }

        let normalized: Vec<String> = candidates.iter().map(|c| normalize_token(c)).collect();

        // 1. 精确匹配
        if let Some(idx) = normalized.iter().position(|c| *c == needle) {
            return candidates[idx].clone();
        }

        // 2. 前缀匹配
        if let Some(idx) = normalized
            .iter()
            .position(|c| !c.is_empty() && c.starts_with(&needle))
        {
            return candidates[idx].clone();
        }

        // 3. 包含匹配
        if let Some(idx) = normalized
            .iter()
            .position(|c| !c.is_empty() && c.contains(&needle))
        {
            return candidates[idx].clone();
        }

        // 4. 编辑距离(并列时取第一个)
        let best = normalized
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_empty())
            .map(|(idx, c)| (levenshtein(&needle, c), idx))
            .min_by_key(|(distance, idx)| (*distance, *idx));

        match best {
            Some((distance, idx)) if distance <= self.max_distance => {
                trace!(input = %cleaned, matched = %candidates[idx], distance, "编辑距离命中");
                candidates[idx].clone()
            }
            _ => cleaned.to_string(),
        }
    }
}

// ==========================================
// CachedResolver - 按不同输入值缓存解析结果
// ==========================================
// 同一次导入中相同的供应商/分类/类型只计算一次
pub struct CachedResolver<'a> {
    resolver: FuzzyResolver,
    candidates: &'a [String],
    cache: HashMap<String, String>,
}

impl<'a> CachedResolver<'a> {
    pub fn new(resolver: FuzzyResolver, candidates: &'a [String]) -> Self {
        Self {
            resolver,
            candidates,
            cache: HashMap::new(),
        }
    }

    pub fn resolve(&mut self, input: &str) -> String {
        if let Some(hit) = self.cache.get(input) {
            return hit.clone();
        }
        let resolved = self.resolver.resolve(input, self.candidates);
        self.cache.insert(input.to_string(), resolved.clone());
        resolved
    }

    pub fn distinct_inputs(&self) -> usize {
        self.cache.len()
    }
}
