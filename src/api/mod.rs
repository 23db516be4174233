// ==========================================
// 牙科治疗工作流排程系统 - API 层
// ==========================================
// 职责: 面向 UI 的业务接口, 编排引擎与仓储
// 红线: 本层不含排程规则本体; 规则全部在引擎层
// ==========================================

pub mod dto;
pub mod error;
pub mod workflow_api;

// 重导出核心接口
pub use dto::{
    MoveNodeRequest, MoveNodeResult, RestoreSessionResponse, SaveSessionResponse, WorkflowOverview,
};
pub use error::{ApiError, ApiResult};
pub use workflow_api::WorkflowApi;
