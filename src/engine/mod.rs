// ==========================================
// 牙科治疗工作流排程系统 - 引擎层
// ==========================================
// 职责: 实现生成与排程的业务规则, 纯内存, 不做数据访问
// 红线: 所有拒绝必须输出结构化原因; 拒绝不产生部分变更
// ==========================================

pub mod allocator;
pub mod generator;
pub mod overrides;
pub mod session;

// 重导出核心引擎
pub use allocator::{
    MoveConflict, SlotAllocator, SnapshotIntegrityError, UnscheduledGroup, DEFAULT_SLOT_COUNT,
};
pub use generator::{suggested_slot_count, WorkflowGenerator};
pub use overrides::RuleSelectionStore;
pub use session::{SessionError, SessionSnapshot, SlotAssignment, WorkflowSession};
