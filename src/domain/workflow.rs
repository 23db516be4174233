// ==========================================
// 牙科治疗工作流排程系统 - 工作流领域模型
// ==========================================
// WorkflowNode = 一次就诊的治疗步骤卡片
// 红线: 节点 id 仅在单次生成内唯一, 跨生成比较必须使用 base_id + card_number
// ==========================================

use crate::domain::condition::ConditionCode;
use crate::domain::treatment::TreatmentRule;
use crate::domain::types::ToothId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// NodeId - 节点标识
// ==========================================
// 每次生成调用内唯一; 不承载任何结构语义
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(uuid::Uuid);

impl NodeId {
    pub fn new() -> Self {
        NodeId(uuid::Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NodeId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(NodeId(uuid::Uuid::parse_str(s.trim())?))
    }
}

// ==========================================
// UnitKey - 治疗单元键
// ==========================================
// 标识 条件+牙位范围 的分组, 每个单元可独立选择备选治疗方案
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitKey(String);

impl UnitKey {
    /// 按牙独立模式的单元键: "{条件}@{牙位}"
    pub fn individual(code: &ConditionCode, tooth: &ToothId) -> Self {
        UnitKey(format!("{}@{}", code, tooth))
    }

    /// 合并模式的单元键: "{条件}@{牙位1,牙位2,...}" (牙位已排序)
    pub fn grouped(code: &ConditionCode, teeth: &[ToothId]) -> Self {
        let mut sorted: Vec<&ToothId> = teeth.iter().collect();
        sorted.sort();
        let joined: Vec<String> = sorted.iter().map(|t| t.to_string()).collect();
        UnitKey(format!("{}@{}", code, joined.join(",")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UnitKey {
    fn from(s: &str) -> Self {
        UnitKey(s.trim().to_string())
    }
}

// ==========================================
// BaseId - 治疗疗程标识
// ==========================================
// 同一疗程 (同条件+同单元+同方案) 的所有卡片共享一个 base_id,
// 且在重新生成后对未变化的单元保持稳定
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BaseId(String);

impl BaseId {
    pub fn new(unit_key: &UnitKey, rule_name: &str) -> Self {
        BaseId(format!("{}#{}", unit_key, rule_name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ==========================================
// WorkflowNode - 治疗步骤卡片
// ==========================================
// 一次就诊对应一个节点; 多次就诊方案展开为同 base_id 的连续编号卡片
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowNode {
    pub id: NodeId,                        // 节点标识 (本次生成内唯一)
    pub base_id: BaseId,                   // 疗程标识
    pub condition: ConditionCode,          // 条件代码
    pub treatment_name: String,            // 治疗方案名称
    pub step_name: String,                 // 本次就诊的步骤名称
    pub teeth: Vec<ToothId>,               // 覆盖的牙位
    pub card_number: u32,                  // 疗程内序号 (1 起)
    pub total_cards: u32,                  // 疗程卡片总数
    pub unit_key: UnitKey,                 // 治疗单元键
    pub available_rules: Vec<TreatmentRule>, // 备选方案快照
    pub selected_rule_index: usize,        // 当前选中的方案序号
}

impl WorkflowNode {
    /// 是否属于多次就诊疗程 (需要顺序约束)
    pub fn is_sequential(&self) -> bool {
        self.total_cards > 1
    }

    /// 该单元是否存在多个备选方案
    pub fn has_multiple_rules(&self) -> bool {
        self.available_rules.len() > 1
    }

    /// 跨生成的结构等价比较 (忽略节点 id)
    pub fn same_step(&self, other: &WorkflowNode) -> bool {
        self.base_id == other.base_id
            && self.card_number == other.card_number
            && self.condition == other.condition
            && self.teeth == other.teeth
    }
}

// ==========================================
// ScheduleSlot - 就诊槽位视图
// ==========================================
// slot_no 从 1 起; 槽位内节点保持放入顺序
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSlot {
    pub slot_no: usize,           // 就诊序号 (1 起)
    pub nodes: Vec<WorkflowNode>, // 该次就诊安排的治疗步骤
}
