// ==========================================
// 牙科治疗工作流排程系统 - 牙位条件映射
// ==========================================
// 职责: 维护 牙位 -> 条件代码集合 的有序映射
// 红线: 值类型封装, 不暴露裸字典; 空集合的牙位条目必须移除
// ==========================================

use crate::domain::condition::ConditionCode;
use crate::domain::types::ToothId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// ==========================================
// ToothConditions - 牙位条件映射
// ==========================================
// 迭代顺序确定: 牙位按编号, 条件按代码
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToothConditions {
    map: BTreeMap<ToothId, BTreeSet<ConditionCode>>,
}

impl ToothConditions {
    pub fn new() -> Self {
        Self::default()
    }

    /// 是否没有任何临床录入
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// 有条件记录的牙位数
    pub fn tooth_count(&self) -> usize {
        self.map.len()
    }

    /// 条件记录总数 (跨牙位累计)
    pub fn condition_count(&self) -> usize {
        self.map.values().map(BTreeSet::len).sum()
    }

    /// 切换某牙位上的某条件: 无则加, 有则删
    ///
    /// 删除后该牙位再无条件时, 整个牙位条目一并移除
    ///
    /// # 返回
    /// true = 本次为添加, false = 本次为移除
    pub fn toggle(&mut self, tooth: ToothId, code: ConditionCode) -> bool {
        let set = self.map.entry(tooth.clone()).or_default();
        if set.remove(&code) {
            if set.is_empty() {
                self.map.remove(&tooth);
            }
            false
        } else {
            set.insert(code);
            true
        }
    }

    /// 在某牙位上添加条件 (已存在则无操作)
    pub fn add(&mut self, tooth: ToothId, code: ConditionCode) -> bool {
        self.map.entry(tooth).or_default().insert(code)
    }

    /// 移除某牙位上的某条件
    pub fn remove(&mut self, tooth: &ToothId, code: &ConditionCode) -> bool {
        let Some(set) = self.map.get_mut(tooth) else {
            return false;
        };
        let removed = set.remove(code);
        if set.is_empty() {
            self.map.remove(tooth);
        }
        removed
    }

    /// 移除整个牙位的所有条件
    pub fn remove_tooth(&mut self, tooth: &ToothId) -> bool {
        self.map.remove(tooth).is_some()
    }

    /// 清空所有录入
    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// 某牙位当前的条件集合 (无记录返回空集)
    pub fn conditions_of(&self, tooth: &ToothId) -> Vec<&ConditionCode> {
        self.map
            .get(tooth)
            .map(|set| set.iter().collect())
            .unwrap_or_default()
    }

    /// 是否记录了某条件在某牙位上
    pub fn has(&self, tooth: &ToothId, code: &ConditionCode) -> bool {
        self.map.get(tooth).is_some_and(|set| set.contains(code))
    }

    /// 携带某条件的全部牙位 (按牙位顺序)
    pub fn teeth_with(&self, code: &ConditionCode) -> Vec<ToothId> {
        self.map
            .iter()
            .filter(|(_, codes)| codes.contains(code))
            .map(|(tooth, _)| tooth.clone())
            .collect()
    }

    /// 迭代全部 (牙位, 条件集合)
    pub fn iter(&self) -> impl Iterator<Item = (&ToothId, &BTreeSet<ConditionCode>)> {
        self.map.iter()
    }
}
