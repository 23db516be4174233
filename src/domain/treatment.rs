// ==========================================
// 牙科治疗工作流排程系统 - 治疗方案主数据
// ==========================================
// 治疗方案 = 解决某条件的命名多步骤程序
// visit_count 即该方案需要的就诊次数
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// TreatmentRule - 治疗方案
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreatmentRule {
    pub name: String,       // 方案名称
    pub visit_count: u32,   // 就诊次数
    pub steps: Vec<String>, // 各次就诊的步骤名称 (允许短于 visit_count)
}

impl TreatmentRule {
    pub fn new(name: impl Into<String>, visit_count: u32, steps: Vec<String>) -> Self {
        Self {
            name: name.into(),
            visit_count,
            steps,
        }
    }

    /// 第 index 次就诊的步骤名称 (index 从 0 起)
    ///
    /// steps 未覆盖到的次数回落到 "方案名(序号)"
    pub fn step_name(&self, index: u32) -> String {
        self.steps
            .get(index as usize)
            .cloned()
            .unwrap_or_else(|| format!("{}({})", self.name, index + 1))
    }

    /// 是否为多次就诊方案
    pub fn is_sequential(&self) -> bool {
        self.visit_count > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_name_from_list() {
        let rule = TreatmentRule::new(
            "根管治疗",
            3,
            vec![
                "根管扩大冲洗".to_string(),
                "根管充填".to_string(),
                "暂封".to_string(),
            ],
        );
        assert_eq!(rule.step_name(0), "根管扩大冲洗");
        assert_eq!(rule.step_name(2), "暂封");
    }

    #[test]
    fn test_step_name_fallback() {
        // steps 短于 visit_count 时回落到 "方案名(序号)"
        let rule = TreatmentRule::new("种植修复", 4, vec!["种植体植入".to_string()]);
        assert_eq!(rule.step_name(0), "种植体植入");
        assert_eq!(rule.step_name(1), "种植修复(2)");
        assert_eq!(rule.step_name(3), "种植修复(4)");
    }

    #[test]
    fn test_is_sequential() {
        let single = TreatmentRule::new("拔牙", 1, vec!["拔牙".to_string()]);
        assert!(!single.is_sequential());

        let multi = TreatmentRule::new("SRP", 2, vec![]);
        assert!(multi.is_sequential());
    }
}
