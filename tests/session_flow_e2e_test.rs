// ==========================================
// 编辑会话完整流程端到端测试
// ==========================================
// 职责: 验证 录入 -> 生成 -> 排程 -> 换方案 -> 快照往返 的完整链路
// ==========================================

mod helpers;

use dental_aps::catalog::default_catalog;
use dental_aps::domain::types::GroupingMode;
use dental_aps::domain::workflow::UnitKey;
use dental_aps::engine::session::WorkflowSession;
use helpers::test_data_builder::{code, tooth, SessionBuilder};

// ==========================================
// 完整编辑流程
// ==========================================

#[test]
fn test_full_edit_flow() {
    let mut session = SessionBuilder::new()
        .condition(11, "C3")
        .condition(21, "per")
        .build_generated();

    // per (4次) 优先于 C3; C3 默认方案拔髓 (1次)
    assert_eq!(session.node_count(), 5);
    let nodes: Vec<_> = session.workflow_nodes().into_iter().cloned().collect();
    assert_eq!(nodes[0].condition, code("per"));

    // 按顺序排入前两步
    session.place(&nodes[0].id, 1).unwrap();
    session.place(&nodes[1].id, 2).unwrap();
    assert_eq!(session.scheduled_count(), 2);

    // 槽位视图反映放置
    let slots = session.schedule_slots();
    assert_eq!(slots[0].nodes.len(), 1);
    assert_eq!(slots[0].nodes[0].card_number, 1);

    // 撤排回待排
    session.unplace(&nodes[1].id);
    assert_eq!(session.scheduled_count(), 1);
}

// ==========================================
// 换方案的局部性
// ==========================================

#[test]
fn test_rule_change_preserves_unrelated_placements() {
    // 两个单元: 牙11 C3, 牙21 per; 排程 per 的前两步后更换 C3 的方案
    let mut session = SessionBuilder::new()
        .condition(11, "C3")
        .condition(21, "per")
        .build_generated();

    let per_unit = UnitKey::individual(&code("per"), &tooth(21));
    let c3_unit = UnitKey::individual(&code("C3"), &tooth(11));

    let per_cards: Vec<_> = session
        .workflow_nodes()
        .iter()
        .filter(|n| n.unit_key == per_unit)
        .map(|n| n.id)
        .collect();
    session.place(&per_cards[0], 2).unwrap();
    session.place(&per_cards[1], 5).unwrap();

    // 更换 C3 单元: 拔髓(1次) -> 根管治疗(3次)
    session.select_rule(&c3_unit, 1).unwrap();

    // C3 单元重新展开为3张, 全部待排
    let c3_nodes: Vec<_> = session
        .workflow_nodes()
        .into_iter()
        .filter(|n| n.unit_key == c3_unit)
        .cloned()
        .collect();
    assert_eq!(c3_nodes.len(), 3);
    assert_eq!(c3_nodes[0].treatment_name, "根管治疗");
    assert!(c3_nodes.iter().all(|n| session.slot_of(&n.id).is_none()));

    // per 单元的排程原样保留 (按 base_id+卡号匹配, 节点 id 已更换)
    let per_nodes: Vec<_> = session
        .workflow_nodes()
        .into_iter()
        .filter(|n| n.unit_key == per_unit)
        .cloned()
        .collect();
    assert_eq!(session.slot_of(&per_nodes[0].id), Some(2));
    assert_eq!(session.slot_of(&per_nodes[1].id), Some(5));
    assert_eq!(session.slot_of(&per_nodes[2].id), None);
}

#[test]
fn test_rule_change_back_invalidates_only_changed_unit_again() {
    // 换回原方案同样只影响本单元
    let mut session = SessionBuilder::new()
        .condition(11, "C3")
        .condition(21, "per")
        .build_generated();

    let per_unit = UnitKey::individual(&code("per"), &tooth(21));
    let c3_unit = UnitKey::individual(&code("C3"), &tooth(11));

    let per_first = session
        .workflow_nodes()
        .iter()
        .find(|n| n.unit_key == per_unit)
        .unwrap()
        .id;
    session.place(&per_first, 3).unwrap();

    session.select_rule(&c3_unit, 1).unwrap();
    session.select_rule(&c3_unit, 0).unwrap();

    let per_first_now = session
        .workflow_nodes()
        .into_iter()
        .find(|n| n.unit_key == per_unit && n.card_number == 1)
        .cloned()
        .unwrap();
    assert_eq!(session.slot_of(&per_first_now.id), Some(3));

    let c3_count = session
        .workflow_nodes()
        .iter()
        .filter(|n| n.unit_key == c3_unit)
        .count();
    assert_eq!(c3_count, 1); // 回到拔髓 1次
}

#[test]
fn test_select_rule_validation() {
    let mut session = SessionBuilder::new().condition(11, "C3").build_generated();

    // 不存在的单元
    let ghost = UnitKey::from("C3@48");
    assert!(session.select_rule(&ghost, 0).is_err());

    // 越界序号
    let c3_unit = UnitKey::individual(&code("C3"), &tooth(11));
    assert!(session.select_rule(&c3_unit, 9).is_err());
}

// ==========================================
// 整体重新生成
// ==========================================

#[test]
fn test_full_generate_resets_placements() {
    let mut session = SessionBuilder::new().condition(11, "per").build_generated();
    let first = session.workflow_nodes()[0].id;
    session.place(&first, 1).unwrap();

    // 追加录入后重新生成: 排程整体清空
    session.toggle_condition(tooth(21), code("C1")).unwrap();
    session.generate();

    assert_eq!(session.scheduled_count(), 0);
    assert_eq!(session.node_count(), 5);
}

// ==========================================
// 非牙位记录
// ==========================================

#[test]
fn test_unattached_findings_unique_ids() {
    let mut session = WorkflowSession::new(default_catalog());

    let a = session.record_unattached_condition(code("P2")).unwrap();
    let b = session.record_unattached_condition(code("P1")).unwrap();
    assert_ne!(a, b);

    session.generate();
    // P2 (SRP 2次) + P1 (洁治 1次)
    assert_eq!(session.node_count(), 3);
}

// ==========================================
// 快照往返
// ==========================================

#[test]
fn test_snapshot_roundtrip_preserves_everything() {
    let mut session = SessionBuilder::new()
        .grouped()
        .condition(11, "C2")
        .condition(12, "C2")
        .condition(21, "per")
        .build_generated();

    // 换方案 + 排程
    let c2_unit = UnitKey::grouped(&code("C2"), &[tooth(11), tooth(12)]);
    session.select_rule(&c2_unit, 1).unwrap(); // 嵌体修复 2次

    let nodes: Vec<_> = session.workflow_nodes().into_iter().cloned().collect();
    let per_first = nodes
        .iter()
        .find(|n| n.condition == code("per") && n.card_number == 1)
        .unwrap()
        .id;
    session.place(&per_first, 2).unwrap();

    // 快照 -> JSON -> 恢复
    let snapshot = session.snapshot();
    let json = serde_json::to_string(&snapshot).unwrap();
    let decoded = serde_json::from_str(&json).unwrap();
    let restored = WorkflowSession::restore(decoded, default_catalog()).unwrap();

    assert_eq!(restored.grouping_mode(), GroupingMode::Grouped);
    assert_eq!(restored.node_count(), session.node_count());
    assert_eq!(restored.scheduled_count(), 1);
    assert_eq!(restored.selected_rule_index(&c2_unit), 1);
    assert_eq!(restored.slot_of(&per_first), Some(2));

    // 恢复后的会话可继续编辑: 顺序约束仍然生效
    let mut restored = restored;
    let per_second = restored
        .workflow_nodes()
        .into_iter()
        .find(|n| n.condition == code("per") && n.card_number == 2)
        .cloned()
        .unwrap();
    let err = restored.place(&per_second.id, 1).unwrap_err();
    assert_eq!(
        err,
        dental_aps::engine::MoveConflict::TooEarly { required_slot: 3 }
    );
}

#[test]
fn test_restore_rejects_corrupt_snapshot() {
    let mut session = SessionBuilder::new().condition(11, "per").build_generated();
    let first = session.workflow_nodes()[0].id;
    session.place(&first, 1).unwrap();

    let mut snapshot = session.snapshot();
    // 在槽位里塞入一个不存在的节点 id
    snapshot.schedule_slots[0]
        .node_ids
        .push(dental_aps::domain::workflow::NodeId::new());

    assert!(WorkflowSession::restore(snapshot, default_catalog()).is_err());
}

#[test]
fn test_restore_accepts_catalog_version_mismatch() {
    // 目录版本不一致只告警不拒绝 (快照自包含)
    let session = SessionBuilder::new().condition(11, "C1").build_generated();
    let mut snapshot = session.snapshot();
    snapshot.catalog_version = "ancient-0.1".to_string();

    let restored = WorkflowSession::restore(snapshot, default_catalog()).unwrap();
    assert_eq!(restored.node_count(), 1);
}

#[test]
fn test_restored_finding_sequence_continues() {
    // 恢复后继续录入非牙位记录不重号
    let mut session = WorkflowSession::new(default_catalog());
    let first = session.record_unattached_condition(code("P1")).unwrap();
    assert_eq!(first.to_string(), "finding-1");

    let snapshot = session.snapshot();
    let mut restored = WorkflowSession::restore(snapshot, default_catalog()).unwrap();
    let next = restored.record_unattached_condition(code("P2")).unwrap();
    assert_eq!(next.to_string(), "finding-2");
}
