use super::{MoveConflict, SlotAllocator, SnapshotIntegrityError, DEFAULT_SLOT_COUNT};
use crate::domain::condition::ConditionCode;
use crate::domain::treatment::TreatmentRule;
use crate::domain::types::ToothId;
use crate::domain::workflow::{BaseId, NodeId, UnitKey, WorkflowNode};

// ==========================================
// 测试辅助函数
// ==========================================

/// 构造一个疗程 (visit_count 张连续编号卡片)
fn course(condition: &str, rule_name: &str, tooth_no: u8, visit_count: u32) -> Vec<WorkflowNode> {
    let code = ConditionCode::new(condition).unwrap();
    let tooth = ToothId::tooth(tooth_no).unwrap();
    let unit_key = UnitKey::individual(&code, &tooth);
    let base_id = BaseId::new(&unit_key, rule_name);
    let rule = TreatmentRule::new(rule_name, visit_count, vec![]);

    (0..visit_count)
        .map(|i| WorkflowNode {
            id: NodeId::new(),
            base_id: base_id.clone(),
            condition: code.clone(),
            treatment_name: rule_name.to_string(),
            step_name: rule.step_name(i),
            teeth: vec![tooth.clone()],
            card_number: i + 1,
            total_cards: visit_count,
            unit_key: unit_key.clone(),
            available_rules: vec![rule.clone()],
            selected_rule_index: 0,
        })
        .collect()
}

fn allocator_with(nodes: Vec<WorkflowNode>) -> SlotAllocator {
    let mut allocator = SlotAllocator::new();
    allocator.load(nodes, DEFAULT_SLOT_COUNT);
    allocator
}

// ==========================================
// 顺序约束测试
// ==========================================

#[test]
fn test_scenario_01_forward_guard_too_early() {
    // 场景1: 卡1在槽3, 卡2放槽2 -> TooEarly{required_slot: 4}; 放槽4成功
    let nodes = course("per", "根管治疗", 11, 2);
    let (card1, card2) = (nodes[0].id, nodes[1].id);
    let mut allocator = allocator_with(nodes);

    allocator.place(&card1, 3).unwrap();

    let err = allocator.place(&card2, 2).unwrap_err();
    assert_eq!(err, MoveConflict::TooEarly { required_slot: 4 });
    // 同槽位也不允许
    let err = allocator.place(&card2, 3).unwrap_err();
    assert_eq!(err, MoveConflict::TooEarly { required_slot: 4 });

    allocator.place(&card2, 4).unwrap();
    assert_eq!(allocator.slot_of(&card2), Some(4));
}

#[test]
fn test_scenario_02_reverse_guard_later_step_earlier() {
    // 场景2: 卡2已在槽5, 卡1放槽5 -> LaterStepAlreadyPlacedEarlier
    let nodes = course("per", "根管治疗", 11, 2);
    let (card1, card2) = (nodes[0].id, nodes[1].id);
    let mut allocator = allocator_with(nodes);

    allocator.place(&card2, 5).unwrap();

    let err = allocator.place(&card1, 5).unwrap_err();
    assert_eq!(err, MoveConflict::LaterStepAlreadyPlacedEarlier);
    let err = allocator.place(&card1, 6).unwrap_err();
    assert_eq!(err, MoveConflict::LaterStepAlreadyPlacedEarlier);

    // 更早的槽位可以
    allocator.place(&card1, 4).unwrap();
    assert_eq!(allocator.slot_of(&card1), Some(4));
}

#[test]
fn test_scenario_03_rejection_leaves_state_unchanged() {
    // 场景3: 拒绝不产生部分变更 (节点保持原槽位)
    let nodes = course("pul", "根管治疗", 36, 3);
    let (card1, card2) = (nodes[0].id, nodes[1].id);
    let mut allocator = allocator_with(nodes);

    allocator.place(&card1, 2).unwrap();
    allocator.place(&card2, 6).unwrap();

    // 把卡2往前挪, 撞上卡1的约束
    let err = allocator.place(&card2, 1).unwrap_err();
    assert_eq!(err, MoveConflict::TooEarly { required_slot: 3 });

    // 卡2仍在原槽位
    assert_eq!(allocator.slot_of(&card2), Some(6));
    assert_eq!(allocator.scheduled_count(), 2);
}

#[test]
fn test_scenario_04_move_between_slots_is_atomic() {
    // 场景4: 合法移动 = 原槽位移出 + 目标槽位追加
    let nodes = course("C2", "树脂充填", 11, 1);
    let id = nodes[0].id;
    let mut allocator = allocator_with(nodes);

    allocator.place(&id, 3).unwrap();
    allocator.place(&id, 7).unwrap();

    assert_eq!(allocator.slot_of(&id), Some(7));
    assert_eq!(allocator.scheduled_count(), 1); // 不会留在两个槽位
}

#[test]
fn test_scenario_05_non_sequential_placement_unguarded() {
    // 场景5: 单次步骤不做顺序校验, 任意槽位可放
    let nodes = course("C1", "氟化物涂布", 11, 1);
    let id = nodes[0].id;
    let mut allocator = allocator_with(nodes);

    allocator.place(&id, 15).unwrap();
    allocator.place(&id, 1).unwrap();
    assert_eq!(allocator.slot_of(&id), Some(1));
}

#[test]
fn test_scenario_06_three_step_chain_required_slot() {
    // 场景6: 三步疗程, 最早可放槽位取所有前序卡片的最大槽位+1
    let nodes = course("per", "根管治疗", 46, 3);
    let (card1, card2, card3) = (nodes[0].id, nodes[1].id, nodes[2].id);
    let mut allocator = allocator_with(nodes);

    allocator.place(&card1, 2).unwrap();
    allocator.place(&card2, 8).unwrap();

    // 卡3受卡2 (槽8) 约束, 而不只是卡1
    let err = allocator.place(&card3, 5).unwrap_err();
    assert_eq!(err, MoveConflict::TooEarly { required_slot: 9 });
    allocator.place(&card3, 9).unwrap();
}

#[test]
fn test_scenario_07_sibling_courses_do_not_interfere() {
    // 场景7: 不同疗程之间无顺序约束
    let mut nodes = course("per", "根管治疗", 11, 2);
    nodes.extend(course("pul", "根管治疗", 21, 2));
    let (a1, b2) = (nodes[0].id, nodes[3].id);
    let mut allocator = allocator_with(nodes);

    // B 疗程的卡2可以放在 A 疗程卡1之前的槽位 (先放B1)
    let b1 = allocator.nodes()[2].id;
    allocator.place(&b1, 1).unwrap();
    allocator.place(&b2, 2).unwrap();
    allocator.place(&a1, 5).unwrap();
    assert_eq!(allocator.scheduled_count(), 3);
}

// ==========================================
// 待排/撤排测试
// ==========================================

#[test]
fn test_scenario_08_unplace_always_succeeds() {
    // 场景8: 撤排总是成功, 待排时无操作
    let nodes = course("per", "根管治疗", 11, 2);
    let (card1, card2) = (nodes[0].id, nodes[1].id);
    let mut allocator = allocator_with(nodes);

    allocator.place(&card1, 3).unwrap();
    assert!(allocator.unplace(&card1));
    assert!(!allocator.is_scheduled(&card1));

    // 本就待排
    assert!(!allocator.unplace(&card2));
    // 不存在的节点同样无操作
    assert!(!allocator.unplace(&NodeId::new()));
}

#[test]
fn test_scenario_09_unscheduled_groups_stacking() {
    // 场景9: 待排分组 - 疗程整组, 单次步骤单独成组
    let mut nodes = course("per", "根管治疗", 11, 3);
    nodes.extend(course("C1", "氟化物涂布", 21, 1));
    let card2 = nodes[1].id;
    let mut allocator = allocator_with(nodes);

    let groups = allocator.unscheduled_groups();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].nodes.len(), 3);
    assert!(groups[0].is_sequential());
    assert_eq!(groups[1].nodes.len(), 1);
    assert!(!groups[1].is_sequential());

    // 疗程内卡片按编号排列
    let numbers: Vec<u32> = groups[0].nodes.iter().map(|n| n.card_number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);

    // 放走一张后该组缩小 (卡1未放置时卡2无前序约束)
    allocator.place(&card2, 1).unwrap();
    let groups = allocator.unscheduled_groups();
    assert_eq!(groups[0].nodes.len(), 2);
}

#[test]
fn test_scenario_10_slot_out_of_range_and_unknown_node() {
    // 场景10: 越界槽位与未知节点 -> 结构化冲突
    let nodes = course("C2", "树脂充填", 11, 1);
    let id = nodes[0].id;
    let mut allocator = allocator_with(nodes);

    let err = allocator.place(&id, 0).unwrap_err();
    assert_eq!(
        err,
        MoveConflict::SlotOutOfRange { slot_no: 0, slot_count: 15 }
    );
    let err = allocator.place(&id, 16).unwrap_err();
    assert_eq!(
        err,
        MoveConflict::SlotOutOfRange { slot_no: 16, slot_count: 15 }
    );

    let ghost = NodeId::new();
    let err = allocator.place(&ghost, 1).unwrap_err();
    assert_eq!(err, MoveConflict::NodeNotFound(ghost));
}

// ==========================================
// 装载/恢复测试
// ==========================================

#[test]
fn test_scenario_11_load_resets_placements() {
    // 场景11: 整体重建后全部回到待排
    let nodes = course("per", "根管治疗", 11, 2);
    let card1 = nodes[0].id;
    let mut allocator = allocator_with(nodes);
    allocator.place(&card1, 3).unwrap();

    let fresh = course("C1", "氟化物涂布", 21, 1);
    allocator.load(fresh, 20);

    assert_eq!(allocator.slot_count(), 20);
    assert_eq!(allocator.node_count(), 1);
    assert_eq!(allocator.scheduled_count(), 0);
}

#[test]
fn test_scenario_12_restore_validates_integrity() {
    // 场景12: 恢复时校验槽位引用
    let nodes = course("per", "根管治疗", 11, 2);
    let (card1, card2) = (nodes[0].id, nodes[1].id);

    // 合法快照
    let mut slot_lists = vec![Vec::new(); 15];
    slot_lists[2] = vec![card1];
    slot_lists[6] = vec![card2];
    let allocator = SlotAllocator::restore(nodes.clone(), slot_lists).unwrap();
    assert_eq!(allocator.slot_of(&card1), Some(3));
    assert_eq!(allocator.slot_of(&card2), Some(7));

    // 未知节点
    let ghost = NodeId::new();
    let mut slot_lists = vec![Vec::new(); 15];
    slot_lists[0] = vec![ghost];
    let err = SlotAllocator::restore(nodes.clone(), slot_lists).unwrap_err();
    assert_eq!(err, SnapshotIntegrityError::UnknownNode(ghost));

    // 重复放置
    let mut slot_lists = vec![Vec::new(); 15];
    slot_lists[0] = vec![card1];
    slot_lists[1] = vec![card1];
    let err = SlotAllocator::restore(nodes, slot_lists).unwrap_err();
    assert_eq!(err, SnapshotIntegrityError::DuplicatePlacement(card1));
}
