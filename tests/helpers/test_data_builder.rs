// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================

use dental_aps::catalog::{default_catalog, TreatmentCatalog};
use dental_aps::domain::condition::ConditionCode;
use dental_aps::domain::tooth::ToothConditions;
use dental_aps::domain::types::{GroupingMode, ToothId};
use dental_aps::engine::session::WorkflowSession;

// ==========================================
// 基础构造函数
// ==========================================

pub fn code(s: &str) -> ConditionCode {
    ConditionCode::new(s).expect("test condition code")
}

pub fn tooth(no: u8) -> ToothId {
    ToothId::tooth(no).expect("test tooth number")
}

// ==========================================
// ToothConditions 构建器
// ==========================================

pub struct ConditionsBuilder {
    conditions: ToothConditions,
}

impl ConditionsBuilder {
    pub fn new() -> Self {
        Self {
            conditions: ToothConditions::new(),
        }
    }

    pub fn with(mut self, tooth_no: u8, condition: &str) -> Self {
        self.conditions.add(tooth(tooth_no), code(condition));
        self
    }

    pub fn with_unattached(mut self, label: &str, condition: &str) -> Self {
        self.conditions.add(ToothId::unattached(label), code(condition));
        self
    }

    pub fn build(self) -> ToothConditions {
        self.conditions
    }
}

impl Default for ConditionsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// 会话构建器
// ==========================================

pub struct SessionBuilder {
    catalog: TreatmentCatalog,
    grouping_mode: GroupingMode,
    entries: Vec<(u8, String)>,
}

impl SessionBuilder {
    /// 以出厂目录构建会话
    pub fn new() -> Self {
        Self {
            catalog: default_catalog(),
            grouping_mode: GroupingMode::Individual,
            entries: Vec::new(),
        }
    }

    pub fn catalog(mut self, catalog: TreatmentCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn grouped(mut self) -> Self {
        self.grouping_mode = GroupingMode::Grouped;
        self
    }

    pub fn condition(mut self, tooth_no: u8, condition: &str) -> Self {
        self.entries.push((tooth_no, condition.to_string()));
        self
    }

    /// 构建会话 (已录入条件, 未生成)
    pub fn build(self) -> WorkflowSession {
        let mut session = WorkflowSession::new(self.catalog);
        session.set_grouping_mode(self.grouping_mode);
        for (tooth_no, condition) in self.entries {
            session
                .toggle_condition(tooth(tooth_no), code(&condition))
                .expect("builder condition must be cataloged");
        }
        session
    }

    /// 构建会话并立即生成工作流
    pub fn build_generated(self) -> WorkflowSession {
        let mut session = self.build();
        session.generate();
        session
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

