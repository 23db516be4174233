// ==========================================
// 牙科治疗工作流排程系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、值类型、业务不变式辅助方法
// 红线: 不含数据访问逻辑, 不含引擎逻辑
// ==========================================

pub mod condition;
pub mod tooth;
pub mod treatment;
pub mod types;
pub mod workflow;

// 重导出核心类型
pub use condition::{Condition, ConditionCode, ConditionCodeError};
pub use tooth::ToothConditions;
pub use treatment::TreatmentRule;
pub use types::{GroupingMode, ToothId, ToothIdParseError};
pub use workflow::{BaseId, NodeId, ScheduleSlot, UnitKey, WorkflowNode};
