// ==========================================
// 牙科治疗工作流排程系统 - 领域类型定义
// ==========================================
// 依据: 口腔临床诊疗流程 - 牙位/分组模式
// 牙位编码: FDI 两位数记法 (象限1-8 × 牙位1-8)
// ==========================================

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 治疗分组模式 (Grouping Mode)
// ==========================================
// individual: 每颗受累牙独立成一个治疗单元
// grouped:    同一条件的所有受累牙合并为一个治疗单元
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupingMode {
    Individual, // 按牙独立
    Grouped,    // 按条件合并
}

impl Default for GroupingMode {
    fn default() -> Self {
        GroupingMode::Individual
    }
}

impl fmt::Display for GroupingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupingMode::Individual => write!(f, "INDIVIDUAL"),
            GroupingMode::Grouped => write!(f, "GROUPED"),
        }
    }
}

impl GroupingMode {
    /// 从字符串解析分组模式
    pub fn parse(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "GROUPED" => GroupingMode::Grouped,
            _ => GroupingMode::Individual, // 默认值
        }
    }
}

// ==========================================
// 牙位标识 (Tooth Identifier)
// ==========================================
// Tooth:      具体牙位, FDI 两位数编号 (恒牙象限1-4, 乳牙象限5-8)
// Unattached: 不挂在具体牙位上的临床所见 (如全口检查记录)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ToothId {
    Tooth(u8),
    Unattached(String),
}

impl ToothId {
    /// 构造具体牙位, 编号必须是合法的 FDI 两位数
    pub fn tooth(no: u8) -> Option<Self> {
        if Self::is_valid_fdi(no) {
            Some(ToothId::Tooth(no))
        } else {
            None
        }
    }

    /// 构造非牙位记录标识
    pub fn unattached(label: impl Into<String>) -> Self {
        ToothId::Unattached(label.into())
    }

    /// FDI 两位数编号校验: 象限 1-8, 牙位 1-8
    pub fn is_valid_fdi(no: u8) -> bool {
        let quadrant = no / 10;
        let position = no % 10;
        (1..=8).contains(&quadrant) && (1..=8).contains(&position)
    }

    /// 是否为具体牙位
    pub fn is_tooth(&self) -> bool {
        matches!(self, ToothId::Tooth(_))
    }
}

impl fmt::Display for ToothId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToothId::Tooth(no) => write!(f, "{}", no),
            ToothId::Unattached(label) => write!(f, "{}", label),
        }
    }
}

impl FromStr for ToothId {
    type Err = ToothIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ToothIdParseError::Empty);
        }
        if let Ok(no) = s.parse::<u8>() {
            return ToothId::tooth(no).ok_or(ToothIdParseError::InvalidFdiNumber(no));
        }
        Ok(ToothId::Unattached(s.to_string()))
    }
}

/// 牙位标识解析错误
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToothIdParseError {
    #[error("牙位标识不能为空")]
    Empty,

    #[error("非法的 FDI 牙位编号: {0}")]
    InvalidFdiNumber(u8),
}

// 排序: 具体牙位在前 (按编号), 非牙位记录在后 (按标签)
impl Ord for ToothId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        match (self, other) {
            (ToothId::Tooth(a), ToothId::Tooth(b)) => a.cmp(b),
            (ToothId::Tooth(_), ToothId::Unattached(_)) => std::cmp::Ordering::Less,
            (ToothId::Unattached(_), ToothId::Tooth(_)) => std::cmp::Ordering::Greater,
            (ToothId::Unattached(a), ToothId::Unattached(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for ToothId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

// 序列化为字符串, 以便作为 JSON 对象键使用
impl Serialize for ToothId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ToothId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
