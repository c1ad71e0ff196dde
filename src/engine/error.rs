// ==========================================
// 手术室库存系统 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 分类:
// - 输入/校验错误: 任何写入之前返回
// - 写组失败: 之前的写组已生效,携带已提交/总组数
// ==========================================

use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    // ===== 写入前错误 =====
    #[error(transparent)]
    Import(#[from] ImportError),

    #[error("参数校验失败: {0}")]
    Validation(String),

    #[error("配置读取失败: {0}")]
    Config(String),

    #[error("快照加载失败: {0}")]
    Snapshot(#[source] RepositoryError),

    // ===== 写入错误 =====
    #[error(
        "写组提交失败: 已提交 {committed_groups}/{total_groups} 组({committed_ops} 个操作),失败原因: {source}"
    )]
    GroupCommitFailed {
        committed_groups: usize,
        total_groups: usize,
        committed_ops: usize,
        #[source]
        source: RepositoryError,
    },
}

impl EngineError {
    /// 是否已有部分写组生效
    pub fn is_partial_write(&self) -> bool {
        matches!(self, EngineError::GroupCommitFailed { committed_groups, .. } if *committed_groups > 0)
    }
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
