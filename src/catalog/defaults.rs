// ==========================================
// 牙科治疗工作流排程系统 - 出厂目录数据
// ==========================================
// 临床优先级: 急性感染 > 牙髓疾病 > 深龋/残根 > 牙周 > 浅中龋 > 缺失修复
// 每个条件的方案列表序号0为默认方案
// ==========================================

use crate::catalog::TreatmentCatalog;
use crate::domain::condition::{Condition, ConditionCode};
use crate::domain::treatment::TreatmentRule;

/// 出厂目录版本号
pub const BUILTIN_CATALOG_VERSION: &str = "builtin-2024.1";

fn code(s: &str) -> ConditionCode {
    // 出厂数据的代码均为合法字面量
    ConditionCode::new(s).expect("builtin condition code")
}

fn rule(name: &str, visit_count: u32, steps: &[&str]) -> TreatmentRule {
    TreatmentRule::new(name, visit_count, steps.iter().map(|s| s.to_string()).collect())
}

/// 构造出厂目录
///
/// 条件代码沿用临床惯用记法 (龋齿分度 C1-C4, 牙髓炎 pul, 根尖周炎 per,
/// 牙周病 P1/P2, 缺失牙 MT)
pub fn default_catalog() -> TreatmentCatalog {
    let mut catalog = TreatmentCatalog::new(BUILTIN_CATALOG_VERSION);

    // ===== 条件主数据 (priority 升序 = 临床先后) =====
    let entries = [
        ("per", "per（根尖周炎）", "per", "rose", 10),
        ("pul", "pul（牙髓炎）", "pul", "pink", 20),
        ("C4", "C4（残根）", "C4", "red-deep", 30),
        ("C3", "C3（深龋）", "C3", "red", 40),
        ("P2", "P2（中度牙周病）", "P2", "purple-deep", 50),
        ("C2", "C2（中龋）", "C2", "orange", 60),
        ("P1", "P1（轻度牙周病）", "P1", "purple", 70),
        ("C1", "C1（浅龋）", "C1", "yellow", 80),
        ("MT", "缺失牙", "×", "gray", 90),
    ];
    for (c, name, symbol, style, priority) in entries {
        catalog.upsert_condition(Condition::new(code(c), name, symbol, style, priority));
    }

    // ===== 治疗方案 =====
    let rule_sets: [(&str, Vec<TreatmentRule>); 9] = [
        ("C1", vec![rule("氟化物涂布", 1, &["氟化物涂布"])]),
        (
            "C2",
            vec![
                rule("树脂充填", 1, &["树脂充填"]),
                rule("嵌体修复", 2, &["取模", "戴入"]),
            ],
        ),
        (
            "C3",
            vec![
                rule("拔髓", 1, &["拔髓"]),
                rule("根管治疗", 3, &["根管扩大冲洗", "根管充填", "暂封"]),
                rule("全冠修复", 3, &["桩核修复", "取模", "戴冠"]),
            ],
        ),
        (
            "C4",
            vec![
                rule("根管治疗", 3, &["根管扩大冲洗", "根管充填", "暂封"]),
                rule("拔牙", 1, &["拔牙"]),
            ],
        ),
        ("pul", vec![rule("根管治疗", 3, &["拔髓", "根管扩大冲洗", "根管充填"])]),
        (
            "per",
            vec![
                rule("根管治疗", 4, &["根管扩大冲洗", "根管冲洗", "根管充填", "暂封"]),
                rule("拔牙", 1, &["拔牙"]),
            ],
        ),
        ("P1", vec![rule("龈上洁治", 1, &["龈上洁治"])]),
        ("P2", vec![rule("SRP", 2, &["龈上洁治", "根面平整"])]),
        (
            "MT",
            vec![
                rule("种植修复", 4, &["种植体植入", "愈合期", "取模", "戴冠"]),
                rule("固定桥", 3, &["基牙预备", "取模", "戴冠"]),
            ],
        ),
    ];
    for (c, rules) in rule_sets {
        let c = code(c);
        for r in rules {
            catalog
                .add_rule(&c, r)
                .expect("builtin rule references builtin condition");
        }
    }

    // 出厂装配不计入编辑修订
    catalog.revision = 0;
    catalog
}
