// ==========================================
// 手术室库存系统 - API层错误类型
// ==========================================
// 职责: 将 Repository / Importer / Engine 错误转换为用户可读的错误消息
// 约束: 部分写入必须带上已提交写组数
// ==========================================

use crate::engine::error::EngineError;
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 输入与业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("数据校验失败: {0}")]
    ValidationError(String),

    // ==========================================
    // 部分写入
    // ==========================================
    #[error("部分写入: 已提交 {committed_groups}/{total_groups} 个写组({committed_ops} 条操作),可安全重跑: {message}")]
    PartialWrite {
        committed_groups: usize,
        total_groups: usize,
        committed_ops: usize,
        message: String,
    },

    // ==========================================
    // 数据库错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // 导入导出与配置
    // ==========================================
    #[error("导入失败: {0}")]
    ImportError(String),

    #[error("导出失败: {0}")]
    ExportError(String),

    #[error("配置错误: {0}")]
    ConfigError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从RepositoryError转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})", entity, id))
            }

            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::LockError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::DatabaseTransactionError(msg) => ApiError::DatabaseTransactionError(msg),
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::ValidationError(format!("唯一约束冲突: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::ValidationError(format!("外键约束冲突: {}", msg))
            }
            RepositoryError::GroupTooLarge { ops, limit } => {
                ApiError::InternalError(format!("写组过大: {} > {}", ops, limit))
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }

            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从ImportError转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::FileNotFound(_) | ImportError::UnsupportedFormat(_) => {
                ApiError::InvalidInput(err.to_string())
            }
            ImportError::EmptyTable
            | ImportError::SkuColumnUnmapped
            | ImportError::ColumnOutOfRange { .. }
            | ImportError::NoValidRows { .. } => ApiError::ValidationError(err.to_string()),
            ImportError::ExportError(msg) => ApiError::ExportError(msg),
            ImportError::InternalError(msg) => ApiError::InternalError(msg),
            ImportError::Other(err) => ApiError::Other(err),
            other => ApiError::ImportError(other.to_string()),
        }
    }
}

// ==========================================
// 从EngineError转换
// ==========================================
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Import(e) => e.into(),
            EngineError::Validation(msg) => ApiError::ValidationError(msg),
            EngineError::Config(msg) => ApiError::ConfigError(msg),
            EngineError::Snapshot(e) => e.into(),
            EngineError::GroupCommitFailed {
                committed_groups,
                total_groups,
                committed_ops,
                source,
            } => ApiError::PartialWrite {
                committed_groups,
                total_groups,
                committed_ops,
                message: source.to_string(),
            },
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_commit_failure_maps_to_partial_write() {
        let err = EngineError::GroupCommitFailed {
            committed_groups: 2,
            total_groups: 3,
            committed_ops: 900,
            source: RepositoryError::DatabaseTransactionError("disk full".to_string()),
        };
        match ApiError::from(err) {
            ApiError::PartialWrite {
                committed_groups,
                total_groups,
                committed_ops,
                message,
            } => {
                assert_eq!((committed_groups, total_groups, committed_ops), (2, 3, 900));
                assert!(message.contains("disk full"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_input_errors_map_to_validation() {
        let err: ApiError = EngineError::Import(ImportError::SkuColumnUnmapped).into();
        assert!(matches!(err, ApiError::ValidationError(_)));

        let err: ApiError = RepositoryError::NotFound {
            entity: "item".to_string(),
            id: "x".to_string(),
        }
        .into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
