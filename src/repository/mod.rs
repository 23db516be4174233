// ==========================================
// 牙科治疗工作流排程系统 - 数据仓储层
// ==========================================
// 职责: 整会话快照的持久化, 屏蔽数据库细节
// 红线: Repository 不含业务逻辑; 核心引擎绝不直接访问存储
// 约束: 所有查询使用参数化, 防止 SQL 注入
// ==========================================

pub mod error;
pub mod session_repo;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use session_repo::{EditSessionRepository, SessionSummary, StoredSession};
