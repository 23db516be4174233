// ==========================================
// 牙科治疗工作流排程系统 - 就诊槽位分配引擎
// ==========================================
// 职责: 独占持有 节点仓 + 每槽位节点序列, 提供带校验的移动操作
// 红线1: 同疗程卡片必须按 card_number 严格递增占用槽位
// 红线2: 校验失败时状态完全不变 (无部分变更)
// 红线3: 槽位列表是节点归属的唯一真实来源, 未入槽即"待排"
// ==========================================

use crate::domain::workflow::{BaseId, NodeId, ScheduleSlot, WorkflowNode};
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

#[cfg(test)]
mod tests;

/// 默认就诊槽位数
pub const DEFAULT_SLOT_COUNT: usize = 15;

// ==========================================
// MoveConflict - 移动冲突
// ==========================================
// 结构化的非致命结果, 返回给调用方, 不是异常
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveConflict {
    #[error("治疗步骤不存在: node_id={0}")]
    NodeNotFound(NodeId),

    #[error("目标就诊槽位超出范围: slot_no={slot_no}, slot_count={slot_count}")]
    SlotOutOfRange { slot_no: usize, slot_count: usize },

    #[error("前序步骤排程靠后: 本步骤最早可放入第{required_slot}次就诊")]
    TooEarly { required_slot: usize },

    #[error("后续步骤已排在更早或同一次就诊")]
    LaterStepAlreadyPlacedEarlier,
}

impl MoveConflict {
    /// 冲突类型代码 (用于响应结构)
    pub fn kind(&self) -> &'static str {
        match self {
            MoveConflict::NodeNotFound(_) => "NODE_NOT_FOUND",
            MoveConflict::SlotOutOfRange { .. } => "SLOT_OUT_OF_RANGE",
            MoveConflict::TooEarly { .. } => "TOO_EARLY",
            MoveConflict::LaterStepAlreadyPlacedEarlier => "LATER_STEP_ALREADY_PLACED_EARLIER",
        }
    }
}

// ==========================================
// SnapshotIntegrityError - 快照完整性错误
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotIntegrityError {
    #[error("快照槽位引用了不存在的节点: node_id={0}")]
    UnknownNode(NodeId),

    #[error("快照中节点被放入多个槽位: node_id={0}")]
    DuplicatePlacement(NodeId),
}

// ==========================================
// UnscheduledGroup - 待排分组
// ==========================================
// 多次就诊疗程整组展示 (卡片按 card_number), 单次步骤单独成组
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnscheduledGroup {
    pub base_id: BaseId,
    pub nodes: Vec<WorkflowNode>,
}

impl UnscheduledGroup {
    pub fn is_sequential(&self) -> bool {
        self.nodes.first().is_some_and(WorkflowNode::is_sequential)
    }
}

// ==========================================
// SlotAllocator - 就诊槽位分配引擎
// ==========================================
#[derive(Debug, Clone)]
pub struct SlotAllocator {
    nodes: HashMap<NodeId, WorkflowNode>, // 节点仓
    order: Vec<NodeId>,                   // 生成顺序
    slots: Vec<Vec<NodeId>>,              // 每槽位的节点序列 (归属唯一真实来源)
}

impl Default for SlotAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl SlotAllocator {
    pub fn new() -> Self {
        Self::with_slot_count(DEFAULT_SLOT_COUNT)
    }

    pub fn with_slot_count(slot_count: usize) -> Self {
        Self {
            nodes: HashMap::new(),
            order: Vec::new(),
            slots: vec![Vec::new(); slot_count],
        }
    }

    /// 整体重建: 装入一批新生成的节点, 全部回到待排状态
    pub fn load(&mut self, nodes: Vec<WorkflowNode>, slot_count: usize) {
        self.order = nodes.iter().map(|n| n.id).collect();
        self.nodes = nodes.into_iter().map(|n| (n.id, n)).collect();
        self.slots = vec![Vec::new(); slot_count];
    }

    /// 从快照恢复: 节点 + 槽位归属一并装入
    ///
    /// 校验: 槽位引用的节点必须存在, 且一个节点至多出现在一个槽位
    pub fn restore(
        nodes: Vec<WorkflowNode>,
        slot_lists: Vec<Vec<NodeId>>,
    ) -> Result<Self, SnapshotIntegrityError> {
        let mut allocator = Self::with_slot_count(slot_lists.len());
        allocator.order = nodes.iter().map(|n| n.id).collect();
        allocator.nodes = nodes.into_iter().map(|n| (n.id, n)).collect();

        let mut seen: std::collections::HashSet<NodeId> = std::collections::HashSet::new();
        for list in &slot_lists {
            for id in list {
                if !allocator.nodes.contains_key(id) {
                    return Err(SnapshotIntegrityError::UnknownNode(*id));
                }
                if !seen.insert(*id) {
                    return Err(SnapshotIntegrityError::DuplicatePlacement(*id));
                }
            }
        }
        allocator.slots = slot_lists;
        Ok(allocator)
    }

    // ==========================================
    // 查询接口
    // ==========================================

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn node(&self, id: &NodeId) -> Option<&WorkflowNode> {
        self.nodes.get(id)
    }

    /// 全部节点 (生成顺序)
    pub fn nodes(&self) -> Vec<&WorkflowNode> {
        self.order.iter().filter_map(|id| self.nodes.get(id)).collect()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// 节点当前所在槽位 (1 起); 待排返回 None
    pub fn slot_of(&self, id: &NodeId) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.contains(id))
            .map(|index| index + 1)
    }

    pub fn is_scheduled(&self, id: &NodeId) -> bool {
        self.slot_of(id).is_some()
    }

    pub fn scheduled_count(&self) -> usize {
        self.slots.iter().map(Vec::len).sum()
    }

    pub fn unscheduled_count(&self) -> usize {
        self.node_count() - self.scheduled_count()
    }

    /// 全部槽位视图 (含空槽位)
    pub fn slots(&self) -> Vec<ScheduleSlot> {
        self.slots
            .iter()
            .enumerate()
            .map(|(index, ids)| ScheduleSlot {
                slot_no: index + 1,
                nodes: ids.iter().filter_map(|id| self.nodes.get(id)).cloned().collect(),
            })
            .collect()
    }

    /// 槽位归属快照 (仅 id 列表)
    pub fn slot_assignments(&self) -> Vec<Vec<NodeId>> {
        self.slots.clone()
    }

    /// 待排分组: 按 base_id 首次出现顺序分组, 疗程内卡片保持编号顺序
    ///
    /// 纯查询, 不变更状态
    pub fn unscheduled_groups(&self) -> Vec<UnscheduledGroup> {
        let mut groups: Vec<UnscheduledGroup> = Vec::new();
        let mut index_of: HashMap<&BaseId, usize> = HashMap::new();

        for id in &self.order {
            if self.slot_of(id).is_some() {
                continue;
            }
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            match index_of.get(&node.base_id) {
                Some(&i) => groups[i].nodes.push(node.clone()),
                None => {
                    index_of.insert(&node.base_id, groups.len());
                    groups.push(UnscheduledGroup {
                        base_id: node.base_id.clone(),
                        nodes: vec![node.clone()],
                    });
                }
            }
        }

        for group in &mut groups {
            group.nodes.sort_by_key(|n| n.card_number);
        }
        groups
    }

    // ==========================================
    // 移动操作
    // ==========================================

    /// 将节点放入目标槽位
    ///
    /// 校验 (仅对多次就诊疗程的卡片):
    /// - 已放置的更大编号同疗程卡片占用槽位 <= 目标 -> LaterStepAlreadyPlacedEarlier
    /// - 最早可放槽位 = max(目标, 已放置更小编号卡片的最大槽位 + 1);
    ///   若大于目标 -> TooEarly
    ///
    /// 校验通过后原子完成: 从当前槽位移出 (若有) 并追加到目标槽位;
    /// 任何拒绝都不触碰状态
    pub fn place(&mut self, id: &NodeId, slot_no: usize) -> Result<(), MoveConflict> {
        let node = self
            .nodes
            .get(id)
            .ok_or(MoveConflict::NodeNotFound(*id))?;
        if slot_no < 1 || slot_no > self.slots.len() {
            return Err(MoveConflict::SlotOutOfRange {
                slot_no,
                slot_count: self.slots.len(),
            });
        }

        if node.is_sequential() {
            let base_id = node.base_id.clone();
            let card_number = node.card_number;

            let mut min_required_slot = slot_no;
            for sibling in self.nodes.values() {
                if sibling.base_id != base_id || sibling.id == *id {
                    continue;
                }
                let Some(sibling_slot) = self.slot_of(&sibling.id) else {
                    continue;
                };
                if sibling.card_number > card_number && sibling_slot <= slot_no {
                    return Err(MoveConflict::LaterStepAlreadyPlacedEarlier);
                }
                if sibling.card_number < card_number {
                    min_required_slot = min_required_slot.max(sibling_slot + 1);
                }
            }
            if min_required_slot > slot_no {
                return Err(MoveConflict::TooEarly {
                    required_slot: min_required_slot,
                });
            }
        }

        // 校验全部通过, 此后才触碰状态
        self.detach(id);
        self.slots[slot_no - 1].push(*id);
        Ok(())
    }

    /// 将节点移回待排 (总是成功; 本就待排时无操作)
    ///
    /// # 返回
    /// true = 节点此前在某槽位中
    pub fn unplace(&mut self, id: &NodeId) -> bool {
        self.detach(id)
    }

    fn detach(&mut self, id: &NodeId) -> bool {
        for slot in &mut self.slots {
            if let Some(position) = slot.iter().position(|n| n == id) {
                slot.remove(position);
                return true;
            }
        }
        false
    }
}
