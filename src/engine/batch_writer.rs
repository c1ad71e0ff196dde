// ==========================================
// 手术室库存系统 - 分组批量写入器
// ==========================================
// 职责: 将任意长度的有序写操作切分为写组并依次提交
// 约束:
// - 每组不超过 group_limit(默认 450,存储层硬上限 500)
// - 保持提交顺序,不跨组重排(先建柜后引用)
// - 顺序提交,第 N 组成功后才开始第 N+1 组
// - 组内原子,组间不保证;失败时报告已提交组数
// ==========================================

use crate::domain::write_op::WriteOp;
use crate::engine::error::{EngineError, EngineResult};
use crate::repository::inventory_store::{InventoryStore, MAX_WRITE_GROUP_LIMIT};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

// ==========================================
// BatchBuilder - 写组构建器(不依赖存储)
// ==========================================
#[derive(Debug)]
pub struct BatchBuilder {
    limit: usize,
    current: Vec<WriteOp>,
}

impl BatchBuilder {
    /// limit 会被截断到 1..=MAX_WRITE_GROUP_LIMIT
    pub fn new(limit: usize) -> Self {
        let limit = limit.clamp(1, MAX_WRITE_GROUP_LIMIT);
        Self {
            limit,
            current: Vec::with_capacity(limit),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn pending(&self) -> usize {
        self.current.len()
    }

    /// 追加操作;达到上限时返回已满的写组
    pub fn add(&mut self, op: WriteOp) -> Option<Vec<WriteOp>> {
        self.current.push(op);
        if self.current.len() >= self.limit {
            return self.flush();
        }
        None
    }

    /// 取出当前未满的写组(为空时返回 None)
    pub fn flush(&mut self) -> Option<Vec<WriteOp>> {
        if self.current.is_empty() {
            return None;
        }
        Some(std::mem::replace(&mut self.current, Vec::with_capacity(self.limit)))
    }

    /// 一次性切分全部操作
    pub fn split(ops: Vec<WriteOp>, limit: usize) -> Vec<Vec<WriteOp>> {
        let mut builder = Self::new(limit);
        let mut groups: Vec<Vec<WriteOp>> = ops.into_iter().filter_map(|op| builder.add(op)).collect();
        groups.extend(builder.flush());
        groups
    }
}

// ==========================================
// WriteSummary - 写入统计
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteSummary {
    pub groups: usize,
    pub ops: usize,
}

// ==========================================
// ChunkedBatchWriter
// ==========================================
pub struct ChunkedBatchWriter<S: ?Sized>
where
    S: InventoryStore,
{
    store: Arc<S>,
    group_limit: usize,
}

impl<S: ?Sized> ChunkedBatchWriter<S>
where
    S: InventoryStore,
{
    pub fn new(store: Arc<S>, group_limit: usize) -> Self {
        Self {
            store,
            group_limit: group_limit.clamp(1, MAX_WRITE_GROUP_LIMIT),
        }
    }

    pub fn group_limit(&self) -> usize {
        self.group_limit
    }

    /// 依次提交全部写操作
    ///
    /// # 返回
    /// - Ok(WriteSummary): 全部写组提交成功
    /// - Err(GroupCommitFailed): 第 k 组失败,此前 k-1 组已生效
    #[instrument(skip(self, ops), fields(ops = ops.len(), group_limit = self.group_limit))]
    pub async fn write_all(&self, ops: Vec<WriteOp>) -> EngineResult<WriteSummary> {
        let groups = BatchBuilder::split(ops, self.group_limit);
        let total_groups = groups.len();
        let mut summary = WriteSummary::default();

        for (index, group) in groups.iter().enumerate() {
            match self.store.commit_group(group).await {
                Ok(applied) => {
                    summary.groups += 1;
                    summary.ops += applied;
                    debug!(group = index + 1, total_groups, ops = group.len(), "写组已提交");
                }
                Err(source) => {
                    error!(
                        group = index + 1,
                        total_groups,
                        committed_ops = summary.ops,
                        error = %source,
                        "写组提交失败,之前的写组已生效"
                    );
                    return Err(EngineError::GroupCommitFailed {
                        committed_groups: summary.groups,
                        total_groups,
                        committed_ops: summary.ops,
                        source,
                    });
                }
            }
        }

        info!(groups = summary.groups, ops = summary.ops, "批量写入完成");
        Ok(summary)
    }
}
