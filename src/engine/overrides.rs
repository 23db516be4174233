// ==========================================
// 牙科治疗工作流排程系统 - 方案选择存储
// ==========================================
// 职责: 记录每个治疗单元选中的备选方案序号
// 约束: set 之后调用方必须重新生成, 并将受影响单元的旧卡片视为失效
// ==========================================

use crate::domain::workflow::UnitKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// RuleSelectionStore - 方案选择存储
// ==========================================
// BTreeMap 保证快照序列化顺序确定
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSelectionStore {
    selections: BTreeMap<UnitKey, usize>,
}

impl RuleSelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 查询单元当前选中的方案序号 (未设置返回 None, 调用方按序号0处理)
    pub fn get(&self, unit_key: &UnitKey) -> Option<usize> {
        self.selections.get(unit_key).copied()
    }

    /// 设置单元的方案序号
    ///
    /// # 返回
    /// 之前的序号 (若有)
    pub fn set(&mut self, unit_key: UnitKey, rule_index: usize) -> Option<usize> {
        self.selections.insert(unit_key, rule_index)
    }

    /// 移除单元的选择记录
    pub fn remove(&mut self, unit_key: &UnitKey) -> Option<usize> {
        self.selections.remove(unit_key)
    }

    /// 清空全部选择
    pub fn clear(&mut self) {
        self.selections.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    pub fn len(&self) -> usize {
        self.selections.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&UnitKey, usize)> {
        self.selections.iter().map(|(k, v)| (k, *v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let mut store = RuleSelectionStore::new();
        let key = UnitKey::from("C3@11");

        assert_eq!(store.get(&key), None);
        assert_eq!(store.set(key.clone(), 2), None);
        assert_eq!(store.get(&key), Some(2));

        // 覆盖设置返回旧值
        assert_eq!(store.set(key.clone(), 0), Some(2));
        assert_eq!(store.remove(&key), Some(0));
        assert!(store.is_empty());
    }
}
