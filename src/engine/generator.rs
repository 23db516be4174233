// ==========================================
// 牙科治疗工作流排程系统 - 工作流生成引擎
// ==========================================
// 职责: 将 牙位条件录入 按目录展开为有序的治疗步骤卡片列表
// 输入: 牙位条件映射 + 目录快照 + 分组模式 + 方案选择
// 输出: 按 (临床优先级, 单元顺序) 排列的 WorkflowNode 列表
// 红线: 生成永不报错; 目录未登记的条件静默跳过并记录告警
// ==========================================

use crate::catalog::TreatmentCatalog;
use crate::domain::condition::{Condition, ConditionCode};
use crate::domain::tooth::ToothConditions;
use crate::domain::treatment::TreatmentRule;
use crate::domain::types::{GroupingMode, ToothId};
use crate::domain::workflow::{BaseId, NodeId, UnitKey, WorkflowNode};
use crate::engine::overrides::RuleSelectionStore;
use std::collections::BTreeSet;


// ==========================================
// WorkflowGenerator - 工作流生成引擎
// ==========================================
pub struct WorkflowGenerator {
    // 无状态引擎, 不需要注入依赖
}

impl WorkflowGenerator {
    pub fn new() -> Self {
        Self {}
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 生成治疗步骤卡片列表
    ///
    /// 算法:
    /// 1) 按目录临床优先级遍历条件 (不按录入顺序)
    /// 2) 收集携带该条件的牙位, 无则跳过
    /// 3) 按分组模式划分治疗单元 (individual: 每牙一单元 / grouped: 合并一单元)
    /// 4) 每单元解析生效方案: 选择存储中的序号, 越界或未设置回落到序号0;
    ///    条件无方案则跳过该单元 (非致命)
    /// 5) 方案按就诊次数展开为连续编号卡片, 同单元疗程共享 base_id
    ///
    /// # 参数
    /// - `tooth_conditions`: 牙位条件录入
    /// - `catalog`: 目录快照
    /// - `grouping_mode`: 分组模式
    /// - `selections`: 各单元的方案选择
    ///
    /// # 返回
    /// 卡片列表; 空录入返回空列表 (表示"尚无临床录入", 不是错误)
    pub fn generate(
        &self,
        tooth_conditions: &ToothConditions,
        catalog: &TreatmentCatalog,
        grouping_mode: GroupingMode,
        selections: &RuleSelectionStore,
    ) -> Vec<WorkflowNode> {
        let mut nodes: Vec<WorkflowNode> = Vec::new();

        self.warn_uncataloged_codes(tooth_conditions, catalog);

        for condition in catalog.conditions_by_priority() {
            let teeth = tooth_conditions.teeth_with(&condition.code);
            if teeth.is_empty() {
                continue;
            }

            let rules = catalog.rules_for(&condition.code);
            if rules.is_empty() {
                tracing::warn!(
                    condition = %condition.code,
                    "条件无可用治疗方案, 跳过该单元"
                );
                continue;
            }

            match grouping_mode {
                GroupingMode::Individual => {
                    for tooth in &teeth {
                        let unit_key = UnitKey::individual(&condition.code, tooth);
                        self.expand_unit(
                            &mut nodes,
                            condition,
                            rules,
                            unit_key,
                            vec![tooth.clone()],
                            selections,
                        );
                    }
                }
                GroupingMode::Grouped => {
                    let unit_key = UnitKey::grouped(&condition.code, &teeth);
                    self.expand_unit(&mut nodes, condition, rules, unit_key, teeth, selections);
                }
            }
        }

        nodes
    }

    /// 将一个治疗单元展开为疗程卡片
    fn expand_unit(
        &self,
        nodes: &mut Vec<WorkflowNode>,
        condition: &Condition,
        rules: &[TreatmentRule],
        unit_key: UnitKey,
        teeth: Vec<ToothId>,
        selections: &RuleSelectionStore,
    ) {
        // 越界的选择序号回落到默认方案 (序号0)
        let selected = selections
            .get(&unit_key)
            .filter(|index| *index < rules.len())
            .unwrap_or(0);
        let rule = &rules[selected];

        let base_id = BaseId::new(&unit_key, &rule.name);
        for i in 0..rule.visit_count {
            nodes.push(WorkflowNode {
                id: NodeId::new(),
                base_id: base_id.clone(),
                condition: condition.code.clone(),
                treatment_name: rule.name.clone(),
                step_name: rule.step_name(i),
                teeth: teeth.clone(),
                card_number: i + 1,
                total_cards: rule.visit_count,
                unit_key: unit_key.clone(),
                available_rules: rules.to_vec(),
                selected_rule_index: selected,
            });
        }
    }

    /// 录入中存在但目录未登记的条件代码 -> 告警 (质量缺陷, 不中断生成)
    fn warn_uncataloged_codes(&self, tooth_conditions: &ToothConditions, catalog: &TreatmentCatalog) {
        let mut unknown: BTreeSet<&ConditionCode> = BTreeSet::new();
        for (_, codes) in tooth_conditions.iter() {
            for code in codes {
                if !catalog.contains(code) {
                    unknown.insert(code);
                }
            }
        }
        for code in unknown {
            tracing::warn!(condition = %code, "录入的条件代码未在目录中登记, 已从生成结果排除");
        }
    }
}

impl Default for WorkflowGenerator {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// 占位槽位脚手架 (仅供展示)
// ==========================================

/// 根据卡片数估算展示用的占位就诊槽位数: max(8, ceil(n/2))
///
/// 仅是展示脚手架; 排程开始后以分配器的槽位数为准
pub fn suggested_slot_count(node_count: usize) -> usize {
    std::cmp::max(8, node_count.div_ceil(2))
}
