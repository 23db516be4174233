// ==========================================
// 牙科治疗工作流排程系统 - 编辑会话聚合
// ==========================================
// 职责: 持有一次编辑会话的全部内存状态
//   目录快照 + 分组模式 + 牙位条件录入 + 方案选择 + 槽位分配器
// 所有操作同步原子完成, 与宿主 UI 事件循环协作, 无后台处理
// 红线1: 更换方案只失效受影响单元的疗程, 其余单元的排程必须保留
// 红线2: 跨生成匹配节点只用 (base_id, card_number), 绝不用节点 id
// ==========================================

use crate::catalog::TreatmentCatalog;
use crate::domain::condition::ConditionCode;
use crate::domain::tooth::ToothConditions;
use crate::domain::types::{GroupingMode, ToothId};
use crate::domain::workflow::{BaseId, NodeId, ScheduleSlot, UnitKey, WorkflowNode};
use crate::engine::allocator::{
    MoveConflict, SlotAllocator, SnapshotIntegrityError, UnscheduledGroup, DEFAULT_SLOT_COUNT,
};
use crate::engine::generator::{suggested_slot_count, WorkflowGenerator};
use crate::engine::overrides::RuleSelectionStore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// 会话操作错误
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("条件代码未在目录中登记: {0}")]
    UnknownCondition(ConditionCode),

    #[error("治疗单元不在当前工作流中: {0}")]
    UnknownUnit(UnitKey),

    #[error("治疗方案序号超出范围: unit={unit_key}, index={index}, available={available}")]
    RuleIndexOutOfRange {
        unit_key: UnitKey,
        index: usize,
        available: usize,
    },

    #[error("会话快照损坏: {0}")]
    CorruptSnapshot(#[from] SnapshotIntegrityError),

    #[error("会话快照中疗程编号不连续: base_id={0}")]
    InvalidCourseNumbering(BaseId),

    #[error("会话快照中槽位编号不连续: slot_no={0}")]
    InvalidSlotNumbering(usize),
}

// ==========================================
// SessionSnapshot - 整会话快照
// ==========================================
// 交给持久化协作方的自包含快照; 核心自身绝不直接访问存储
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub tooth_conditions: ToothConditions,
    pub workflow_nodes: Vec<WorkflowNode>,
    pub schedule_slots: Vec<SlotAssignment>,
    pub selected_overrides: RuleSelectionStore,
    pub grouping_mode: GroupingMode,
    pub catalog_version: String,
}

/// 单个槽位的归属记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotAssignment {
    pub slot_no: usize,
    pub node_ids: Vec<NodeId>,
}

// ==========================================
// WorkflowSession - 编辑会话
// ==========================================
pub struct WorkflowSession {
    catalog: TreatmentCatalog,
    grouping_mode: GroupingMode,
    tooth_conditions: ToothConditions,
    selections: RuleSelectionStore,
    allocator: SlotAllocator,
    generator: WorkflowGenerator,
    finding_seq: u32, // 非牙位记录的单调序号
}

impl WorkflowSession {
    /// 以目录快照开启新会话
    pub fn new(catalog: TreatmentCatalog) -> Self {
        Self {
            catalog,
            grouping_mode: GroupingMode::default(),
            tooth_conditions: ToothConditions::new(),
            selections: RuleSelectionStore::new(),
            allocator: SlotAllocator::new(),
            generator: WorkflowGenerator::new(),
            finding_seq: 0,
        }
    }

    // ==========================================
    // 临床录入事件
    // ==========================================

    /// 切换某牙位上的某条件
    ///
    /// 录入即校验: 目录未登记的代码在这里拒绝, 而不是等到生成时静默消失
    ///
    /// # 返回
    /// true = 本次为添加, false = 本次为移除
    pub fn toggle_condition(
        &mut self,
        tooth: ToothId,
        code: ConditionCode,
    ) -> Result<bool, SessionError> {
        if !self.catalog.contains(&code) {
            return Err(SessionError::UnknownCondition(code));
        }
        Ok(self.tooth_conditions.toggle(tooth, code))
    }

    /// 录入不挂牙位的临床所见, 返回为其分配的记录标识
    pub fn record_unattached_condition(
        &mut self,
        code: ConditionCode,
    ) -> Result<ToothId, SessionError> {
        if !self.catalog.contains(&code) {
            return Err(SessionError::UnknownCondition(code));
        }
        self.finding_seq += 1;
        let tooth = ToothId::unattached(format!("finding-{}", self.finding_seq));
        self.tooth_conditions.add(tooth.clone(), code);
        Ok(tooth)
    }

    pub fn set_grouping_mode(&mut self, mode: GroupingMode) {
        self.grouping_mode = mode;
    }

    /// 清空临床录入 (不触碰已生成的工作流)
    pub fn clear_conditions(&mut self) {
        self.tooth_conditions.clear();
    }

    /// 清空工作流与排程 (保留临床录入)
    pub fn clear_workflow(&mut self) {
        self.allocator.load(Vec::new(), DEFAULT_SLOT_COUNT);
        self.selections.clear();
    }

    /// 整体复位
    pub fn reset(&mut self) {
        self.tooth_conditions.clear();
        self.clear_workflow();
        self.grouping_mode = GroupingMode::default();
        self.finding_seq = 0;
    }

    // ==========================================
    // 生成与方案选择
    // ==========================================

    /// 触发生成: 整体重建工作流, 全部排程清空
    ///
    /// # 返回
    /// 生成的卡片数
    pub fn generate(&mut self) -> usize {
        self.regenerate(None);
        self.allocator.node_count()
    }

    /// 更换某治疗单元的方案
    ///
    /// 重新生成后, 未受影响单元的排程按 (base_id, card_number) 重放保留;
    /// 被更换单元的旧疗程整体失效, 卡片回到待排
    pub fn select_rule(&mut self, unit_key: &UnitKey, rule_index: usize) -> Result<(), SessionError> {
        let available = self
            .allocator
            .nodes()
            .iter()
            .find(|n| &n.unit_key == unit_key)
            .map(|n| n.available_rules.len())
            .ok_or_else(|| SessionError::UnknownUnit(unit_key.clone()))?;
        if rule_index >= available {
            return Err(SessionError::RuleIndexOutOfRange {
                unit_key: unit_key.clone(),
                index: rule_index,
                available,
            });
        }

        self.selections.set(unit_key.clone(), rule_index);
        self.regenerate(Some(unit_key));
        Ok(())
    }

    /// 重新生成工作流
    ///
    /// - `keep_placements_except = None`: 整体重建, 排程全部清空
    /// - `keep_placements_except = Some(unit)`: 除该单元外, 其余节点的排程
    ///   按 (base_id, card_number) 匹配重放
    fn regenerate(&mut self, keep_placements_except: Option<&UnitKey>) {
        // 重放清单必须在重建前采集
        let mut preserved: Vec<((BaseId, u32), usize)> = match keep_placements_except {
            Some(changed_unit) => self
                .allocator
                .nodes()
                .iter()
                .filter(|n| &n.unit_key != changed_unit)
                .filter_map(|n| {
                    self.allocator
                        .slot_of(&n.id)
                        .map(|slot| ((n.base_id.clone(), n.card_number), slot))
                })
                .collect(),
            None => Vec::new(),
        };

        let nodes = self.generator.generate(
            &self.tooth_conditions,
            &self.catalog,
            self.grouping_mode,
            &self.selections,
        );
        let slot_count = DEFAULT_SLOT_COUNT.max(suggested_slot_count(nodes.len()));
        self.allocator.load(nodes, slot_count);

        if preserved.is_empty() {
            return;
        }

        // 按 (槽位, 卡号) 升序重放, 顺序约束校验自然通过
        preserved.sort_by_key(|((_, card), slot)| (*slot, *card));
        let index: HashMap<(BaseId, u32), NodeId> = self
            .allocator
            .nodes()
            .iter()
            .map(|n| ((n.base_id.clone(), n.card_number), n.id))
            .collect();

        for ((base_id, card_number), slot_no) in preserved {
            // 新结果中已不存在的疗程 (如条件被移除) 直接丢弃
            let Some(id) = index.get(&(base_id.clone(), card_number)) else {
                continue;
            };
            if let Err(conflict) = self.allocator.place(id, slot_no) {
                tracing::warn!(
                    base_id = %base_id,
                    card_number,
                    slot_no,
                    %conflict,
                    "重放历史排程失败, 该卡片回到待排"
                );
            }
        }
    }

    // ==========================================
    // 排程事件
    // ==========================================

    /// 将治疗步骤放入目标就诊槽位 (见分配器的顺序约束)
    pub fn place(&mut self, node_id: &NodeId, slot_no: usize) -> Result<(), MoveConflict> {
        self.allocator.place(node_id, slot_no)
    }

    /// 将治疗步骤移回待排
    pub fn unplace(&mut self, node_id: &NodeId) -> bool {
        self.allocator.unplace(node_id)
    }

    // ==========================================
    // 查询接口
    // ==========================================

    pub fn catalog(&self) -> &TreatmentCatalog {
        &self.catalog
    }

    pub fn grouping_mode(&self) -> GroupingMode {
        self.grouping_mode
    }

    pub fn tooth_conditions(&self) -> &ToothConditions {
        &self.tooth_conditions
    }

    pub fn workflow_nodes(&self) -> Vec<&WorkflowNode> {
        self.allocator.nodes()
    }

    pub fn node(&self, id: &NodeId) -> Option<&WorkflowNode> {
        self.allocator.node(id)
    }

    pub fn node_count(&self) -> usize {
        self.allocator.node_count()
    }

    pub fn scheduled_count(&self) -> usize {
        self.allocator.scheduled_count()
    }

    pub fn slot_count(&self) -> usize {
        self.allocator.slot_count()
    }

    pub fn slot_of(&self, id: &NodeId) -> Option<usize> {
        self.allocator.slot_of(id)
    }

    pub fn schedule_slots(&self) -> Vec<ScheduleSlot> {
        self.allocator.slots()
    }

    pub fn unscheduled_groups(&self) -> Vec<UnscheduledGroup> {
        self.allocator.unscheduled_groups()
    }

    /// 单元当前生效的方案序号 (未显式选择返回 0)
    pub fn selected_rule_index(&self, unit_key: &UnitKey) -> usize {
        self.selections.get(unit_key).unwrap_or(0)
    }

    // ==========================================
    // 快照
    // ==========================================

    /// 导出整会话快照 (交给持久化协作方)
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            tooth_conditions: self.tooth_conditions.clone(),
            workflow_nodes: self.allocator.nodes().into_iter().cloned().collect(),
            schedule_slots: self
                .allocator
                .slot_assignments()
                .into_iter()
                .enumerate()
                .map(|(index, node_ids)| SlotAssignment {
                    slot_no: index + 1,
                    node_ids,
                })
                .collect(),
            selected_overrides: self.selections.clone(),
            grouping_mode: self.grouping_mode,
            catalog_version: self.catalog.version(),
        }
    }

    /// 从快照恢复会话
    ///
    /// 快照自包含 (节点内嵌方案快照), 目录版本不一致仅告警不拒绝;
    /// 结构性损坏 (槽位引用未知节点、疗程编号不连续) 以错误拒绝
    pub fn restore(
        snapshot: SessionSnapshot,
        catalog: TreatmentCatalog,
    ) -> Result<Self, SessionError> {
        if snapshot.catalog_version != catalog.version() {
            tracing::warn!(
                snapshot_version = %snapshot.catalog_version,
                catalog_version = %catalog.version(),
                "快照与当前目录版本不一致, 按快照内容恢复"
            );
        }

        Self::validate_course_numbering(&snapshot.workflow_nodes)?;

        // 槽位必须从1连续编号
        let mut assignments = snapshot.schedule_slots;
        assignments.sort_by_key(|a| a.slot_no);
        let mut slot_lists: Vec<Vec<NodeId>> = Vec::with_capacity(assignments.len());
        for (index, assignment) in assignments.into_iter().enumerate() {
            if assignment.slot_no != index + 1 {
                return Err(SessionError::InvalidSlotNumbering(assignment.slot_no));
            }
            slot_lists.push(assignment.node_ids);
        }

        let finding_seq = Self::max_finding_seq(&snapshot.tooth_conditions);
        let allocator = SlotAllocator::restore(snapshot.workflow_nodes, slot_lists)?;

        Ok(Self {
            catalog,
            grouping_mode: snapshot.grouping_mode,
            tooth_conditions: snapshot.tooth_conditions,
            selections: snapshot.selected_overrides,
            allocator,
            generator: WorkflowGenerator::new(),
            finding_seq,
        })
    }

    /// 不变式: 同 base_id 的卡片编号必须为连续的 1..=total
    fn validate_course_numbering(nodes: &[WorkflowNode]) -> Result<(), SessionError> {
        let mut courses: HashMap<&BaseId, Vec<(u32, u32)>> = HashMap::new();
        for node in nodes {
            courses
                .entry(&node.base_id)
                .or_default()
                .push((node.card_number, node.total_cards));
        }
        for (base_id, mut cards) in courses {
            cards.sort_unstable();
            let total = cards[0].1;
            let contiguous = cards.len() as u32 == total
                && cards
                    .iter()
                    .enumerate()
                    .all(|(i, (number, t))| *number == i as u32 + 1 && *t == total);
            if !contiguous {
                return Err(SessionError::InvalidCourseNumbering(base_id.clone()));
            }
        }
        Ok(())
    }

    /// 恢复非牙位记录的序号水位, 保证后续分配不重号
    fn max_finding_seq(tooth_conditions: &ToothConditions) -> u32 {
        tooth_conditions
            .iter()
            .filter_map(|(tooth, _)| match tooth {
                ToothId::Unattached(label) => label
                    .strip_prefix("finding-")
                    .and_then(|n| n.parse::<u32>().ok()),
                ToothId::Tooth(_) => None,
            })
            .max()
            .unwrap_or(0)
    }
}
