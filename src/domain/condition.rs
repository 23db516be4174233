// ==========================================
// 牙科治疗工作流排程系统 - 临床条件主数据
// ==========================================
// 条件 = 编码的临床所见 (如龋齿分度 C1-C4)
// 红线: 临床优先级是目录数据的一部分, 不允许独立维护的优先级表与目录脱节
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// ConditionCode - 条件代码
// ==========================================
// 校验过的代码值类型, 作为所有条件查找的键
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConditionCode(String);

impl ConditionCode {
    /// 构造条件代码
    ///
    /// 约束: 非空, 不含空白字符, 长度不超过 32
    pub fn new(code: impl Into<String>) -> Result<Self, ConditionCodeError> {
        let code = code.into();
        if code.is_empty() {
            return Err(ConditionCodeError::Empty);
        }
        if code.chars().any(char::is_whitespace) {
            return Err(ConditionCodeError::ContainsWhitespace(code));
        }
        if code.chars().count() > 32 {
            return Err(ConditionCodeError::TooLong(code));
        }
        Ok(ConditionCode(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConditionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ConditionCode {
    type Err = ConditionCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConditionCode::new(s.trim())
    }
}

/// 条件代码校验错误
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConditionCodeError {
    #[error("条件代码不能为空")]
    Empty,

    #[error("条件代码不能包含空白字符: {0:?}")]
    ContainsWhitespace(String),

    #[error("条件代码过长 (最多32字符): {0:?}")]
    TooLong(String),
}

// ==========================================
// Condition - 临床条件主数据条目
// ==========================================
// 生成时只读 (目录快照的一部分)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub code: ConditionCode,  // 条件代码
    pub display_name: String, // 显示名称
    pub symbol: String,       // 牙位图符号
    pub style_hint: String,   // UI 样式提示
    pub priority: u32,        // 临床优先级 (数值越小越先治疗)
}

impl Condition {
    pub fn new(
        code: ConditionCode,
        display_name: impl Into<String>,
        symbol: impl Into<String>,
        style_hint: impl Into<String>,
        priority: u32,
    ) -> Self {
        Self {
            code,
            display_name: display_name.into(),
            symbol: symbol.into(),
            style_hint: style_hint.into(),
            priority,
        }
    }
}
