// ==========================================
// 登山队审议会议排程系统 - 外部输入记录
// ==========================================
// 外部 I/O 层（表格解析等）产出的普通记录,一律以名称为键。
// ==========================================

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

// ==========================================
// 人员记录
// ==========================================

/// 单日空闲代码行（原始值 0〜4,长度 = 每日槽位数）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayAvailabilityRecord {
    pub date: NaiveDate,
    pub codes: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonRecord {
    pub name: String,
    #[serde(default)]
    pub is_committee: bool,
    #[serde(default)]
    pub is_senior: bool,
    #[serde(default)]
    pub availability: Vec<DayAvailabilityRecord>,
}

// ==========================================
// 登山队记录
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamRecord {
    pub name: String,
    pub leader_name: String,
    #[serde(default)]
    pub member_names: Vec<String>,
    pub deadline: NaiveDate,
    pub base_required: u32,
    /// 追加审议回数（来自追加要求输入,缺省 0）
    #[serde(default)]
    pub additional_required: u32,
}

// ==========================================
// 既有会议记录（fixed 与 prev 共用同一形状）
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixedMeetingRecord {
    pub team_name: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub leader_name: String,
    pub committee_names: Vec<String>,
}

// ==========================================
// RawInput - 一次运行的全部输入
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawInput {
    pub persons: Vec<PersonRecord>,
    pub teams: Vec<TeamRecord>,
    /// 既有固定会议
    #[serde(default)]
    pub fixed_meetings: Vec<FixedMeetingRecord>,
    /// 上一轮运行产出（追加审议时作为固定取入）
    #[serde(default)]
    pub prior_meetings: Vec<FixedMeetingRecord>,
    /// 生成开始日时：新生成会议可放置的最早时刻
    pub generation_start: NaiveDateTime,
}
