// ==========================================
// 登山队审议会议排程系统 - 领域类型定义
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 内部标识符
// ==========================================
// 红线: 内部计算一律按 id 索引,人名/队名仅在输入输出边界出现

/// 人员内部 ID（载入时按出现顺序分配的稠密下标）
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PersonId(pub usize);

/// 登山队内部 ID
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TeamId(pub usize);

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ==========================================
// 空闲代码 (Availability Code)
// ==========================================
// 原始表格值 0〜4；其中 0 与 4 同义（不可参加），在载入时一次性归一，
// 后续流程只见两值枚举，不再出现散落的特判。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AvailabilityCode {
    Available,
    Unavailable,
}

impl AvailabilityCode {
    /// 从原始单元格值归一
    ///
    /// # 映射
    /// - {1,2,3} → Available
    /// - {0,4} 及其他任何值 → Unavailable
    pub fn from_raw(value: u8) -> Self {
        match value {
            1 | 2 | 3 => AvailabilityCode::Available,
            _ => AvailabilityCode::Unavailable,
        }
    }

    pub fn is_available(self) -> bool {
        self == AvailabilityCode::Available
    }
}

// ==========================================
// 会议来源 (Meeting Origin)
// ==========================================
// 红线: Fixed/Prior 会议为只读输入,本次运行绝不改动
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MeetingOrigin {
    /// 既有固定会议
    Fixed,
    /// 上一轮运行产出、作为固定取入的会议（追加审议场景）
    Prior,
    /// 本次求解新生成的会议
    Generated,
}

impl MeetingOrigin {
    /// 是否为本次运行之前就已存在的会议
    pub fn is_preexisting(self) -> bool {
        matches!(self, MeetingOrigin::Fixed | MeetingOrigin::Prior)
    }
}

impl fmt::Display for MeetingOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeetingOrigin::Fixed => write!(f, "FIXED"),
            MeetingOrigin::Prior => write!(f, "PRIOR"),
            MeetingOrigin::Generated => write!(f, "GENERATED"),
        }
    }
}
