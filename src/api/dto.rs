// ==========================================
// 牙科治疗工作流排程系统 - API层数据传输对象
// ==========================================
// 职责: 面向 UI 的请求/响应结构
// ==========================================

use crate::domain::workflow::NodeId;
use serde::{Deserialize, Serialize};

// ==========================================
// 移动操作
// ==========================================

/// 移动请求: 将治疗步骤放入某次就诊, 或移回待排 (to_slot = None)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveNodeRequest {
    pub node_id: String,
    pub to_slot: Option<usize>,
}

/// 移动结果
///
/// 顺序冲突是结构化数据而不是错误: success=false + conflict_type + error
#[derive(Debug, Clone, Serialize)]
pub struct MoveNodeResult {
    pub node_id: NodeId,
    pub success: bool,
    pub from_slot: Option<usize>,    // 移动前所在槽位 (待排为 None)
    pub to_slot: Option<usize>,      // 请求的目标槽位 (移回待排为 None)
    pub error: Option<String>,       // 冲突原因 (人读)
    pub conflict_type: Option<String>, // 冲突类型代码 (机读)
}

// ==========================================
// 会话保存/恢复
// ==========================================

#[derive(Debug, Clone, Serialize)]
pub struct SaveSessionResponse {
    pub session_id: String,
    pub session_name: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RestoreSessionResponse {
    pub session_id: String,
    pub overview: WorkflowOverview,
    pub message: String,
}

// ==========================================
// 工作流概览
// ==========================================

/// 当前会话的汇总视图
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowOverview {
    pub node_count: usize,        // 卡片总数
    pub scheduled_count: usize,   // 已排入槽位数
    pub unscheduled_count: usize, // 待排数
    pub slot_count: usize,        // 槽位总数
    pub tooth_count: usize,       // 有条件记录的牙位数
    pub condition_count: usize,   // 条件记录总数
    pub grouping_mode: String,    // 分组模式
    pub catalog_version: String,  // 目录版本
}
