// ==========================================
// 牙科治疗工作流排程系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型, 转换 Repository/Session 错误为用户可读的错误
// 红线: 所有错误信息必须包含显式原因 (可解释性)
// ==========================================

use crate::engine::session::SessionError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
///
/// 注意: 排程移动的顺序冲突不是错误, 以 MoveNodeResult 结构化返回
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 输入与业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    // ==========================================
    // 会话错误
    // ==========================================
    #[error("会话操作失败: {0}")]
    Session(#[from] SessionError),

    #[error("会话状态锁获取失败: {0}")]
    SessionLockError(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("会话快照损坏: {0}")]
    SnapshotCorrupted(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// 目的: 将仓储层的技术错误转换为用户可读的业务错误
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::SnapshotEncodeError(msg) => ApiError::SnapshotCorrupted(msg),
            RepositoryError::SnapshotDecodeError { session_id, message } => {
                ApiError::SnapshotCorrupted(format!("session_id={}: {}", session_id, message))
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
