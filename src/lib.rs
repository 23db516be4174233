// ==========================================
// 牙科治疗工作流排程系统 - 核心库
// ==========================================
// 系统定位: 诊疗决策支持系统 (医生保留最终控制权)
// 核心职责:
// - 将每颗牙的编码诊断展开为有序的治疗步骤卡片 (可多次就诊)
// - 带顺序约束校验的就诊槽位分配 (疗程第2步绝不排在第1步之前或同一次)
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 目录层 - 条件/治疗方案主数据
pub mod catalog;

// 引擎层 - 生成与排程规则
pub mod engine;

// 数据仓储层 - 会话快照持久化
pub mod repository;

// API 层 - 业务接口
pub mod api;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    BaseId, Condition, ConditionCode, GroupingMode, NodeId, ScheduleSlot, ToothConditions,
    ToothId, TreatmentRule, UnitKey, WorkflowNode,
};

// 目录
pub use catalog::{default_catalog, CatalogError, TreatmentCatalog};

// 引擎
pub use engine::{
    suggested_slot_count, MoveConflict, RuleSelectionStore, SessionSnapshot, SlotAllocator,
    UnscheduledGroup, WorkflowGenerator, WorkflowSession, DEFAULT_SLOT_COUNT,
};

// 仓储
pub use repository::{EditSessionRepository, SessionSummary, StoredSession};

// API
pub use api::{ApiError, ApiResult, MoveNodeResult, WorkflowApi, WorkflowOverview};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "牙科治疗工作流排程系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
