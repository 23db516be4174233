// ==========================================
// 牙科治疗工作流排程系统 - 条件/治疗方案目录
// ==========================================
// 职责: 维护 条件主数据 + 每条件的备选治疗方案列表
// 生成时目录是只读快照; 编辑操作由设置协作方调用, 每次编辑递增版本
// 红线: 临床优先级随条件条目维护, 目录与优先级不可能脱节
// ==========================================

pub mod defaults;

use crate::domain::condition::{Condition, ConditionCode};
use crate::domain::treatment::TreatmentRule;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

pub use defaults::default_catalog;

/// 目录操作错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("条件未在目录中登记: {0}")]
    UnknownCondition(ConditionCode),

    #[error("治疗方案序号超出范围: condition={condition}, index={index}, available={available}")]
    RuleIndexOutOfRange {
        condition: ConditionCode,
        index: usize,
        available: usize,
    },
}

// ==========================================
// TreatmentCatalog - 目录快照
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreatmentCatalog {
    base_version: String,                             // 基础版本号
    revision: u32,                                    // 编辑修订号 (每次编辑 +1)
    conditions: Vec<Condition>,                       // 条件条目 (code 唯一)
    rules: BTreeMap<ConditionCode, Vec<TreatmentRule>>, // 条件 -> 备选方案 (序号0为默认)
}

impl TreatmentCatalog {
    /// 构造空目录
    pub fn new(base_version: impl Into<String>) -> Self {
        Self {
            base_version: base_version.into(),
            revision: 0,
            conditions: Vec::new(),
            rules: BTreeMap::new(),
        }
    }

    /// 目录版本字符串 (编辑过的目录带修订号后缀)
    pub fn version(&self) -> String {
        if self.revision == 0 {
            self.base_version.clone()
        } else {
            format!("{}.r{}", self.base_version, self.revision)
        }
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    // ==========================================
    // 查询接口 (生成路径只用这些)
    // ==========================================

    /// 条件条目查找
    pub fn condition(&self, code: &ConditionCode) -> Option<&Condition> {
        self.conditions.iter().find(|c| &c.code == code)
    }

    /// 条件是否已登记
    pub fn contains(&self, code: &ConditionCode) -> bool {
        self.condition(code).is_some()
    }

    /// 全部条件 (登记顺序)
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// 全部条件, 按临床优先级排序 (priority 升序, 同级按代码)
    pub fn conditions_by_priority(&self) -> Vec<&Condition> {
        let mut ordered: Vec<&Condition> = self.conditions.iter().collect();
        ordered.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.code.cmp(&b.code)));
        ordered
    }

    /// 某条件的备选方案列表 (未登记或无方案返回空切片)
    pub fn rules_for(&self, code: &ConditionCode) -> &[TreatmentRule] {
        self.rules.get(code).map(Vec::as_slice).unwrap_or(&[])
    }

    // ==========================================
    // 编辑接口 (设置协作方专用)
    // ==========================================

    /// 新增或替换条件条目 (按 code 匹配)
    pub fn upsert_condition(&mut self, condition: Condition) {
        match self.conditions.iter_mut().find(|c| c.code == condition.code) {
            Some(existing) => *existing = condition,
            None => self.conditions.push(condition),
        }
        self.touch();
    }

    /// 移除条件条目, 连同其全部治疗方案
    pub fn remove_condition(&mut self, code: &ConditionCode) -> bool {
        let before = self.conditions.len();
        self.conditions.retain(|c| &c.code != code);
        let removed = self.conditions.len() < before;
        if removed {
            self.rules.remove(code);
            self.touch();
        }
        removed
    }

    /// 为条件追加备选方案
    pub fn add_rule(&mut self, code: &ConditionCode, rule: TreatmentRule) -> Result<(), CatalogError> {
        if !self.contains(code) {
            return Err(CatalogError::UnknownCondition(code.clone()));
        }
        self.rules.entry(code.clone()).or_default().push(rule);
        self.touch();
        Ok(())
    }

    /// 移除条件的第 index 个备选方案
    pub fn remove_rule(&mut self, code: &ConditionCode, index: usize) -> Result<TreatmentRule, CatalogError> {
        let rules = self
            .rules
            .get_mut(code)
            .ok_or_else(|| CatalogError::UnknownCondition(code.clone()))?;
        if index >= rules.len() {
            return Err(CatalogError::RuleIndexOutOfRange {
                condition: code.clone(),
                index,
                available: rules.len(),
            });
        }
        let removed = rules.remove(index);
        self.touch();
        Ok(removed)
    }

    /// 调整条件备选方案的顺序 (from -> to)
    ///
    /// 序号0是默认方案, 此操作即"更换默认方案"的数据层入口
    pub fn move_rule(&mut self, code: &ConditionCode, from: usize, to: usize) -> Result<(), CatalogError> {
        let rules = self
            .rules
            .get_mut(code)
            .ok_or_else(|| CatalogError::UnknownCondition(code.clone()))?;
        let len = rules.len();
        if from >= len {
            return Err(CatalogError::RuleIndexOutOfRange {
                condition: code.clone(),
                index: from,
                available: len,
            });
        }
        if to >= len {
            return Err(CatalogError::RuleIndexOutOfRange {
                condition: code.clone(),
                index: to,
                available: len,
            });
        }
        let moved = rules.remove(from);
        rules.insert(to, moved);
        self.touch();
        Ok(())
    }
}
