// ==========================================
// 登山队审议会议排程系统 - 会议领域模型
// ==========================================
// 红线: Fixed/Prior 会议只读；Generated 会议仅由解映射器创建
// ==========================================

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::types::{MeetingOrigin, PersonId, TeamId};

// ==========================================
// Meeting - 审议会议
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meeting {
    pub team: TeamId,
    pub start_slot: usize,           // 全局槽位
    pub leader: PersonId,
    pub committee: Vec<PersonId>,    // 出席的许可委员
    pub origin: MeetingOrigin,

    // ===== 汇总字段（按队时间序补充） =====
    pub meeting_no: Option<u32>,           // 该队第几回审议
    pub handover_person: Option<PersonId>, // 与上一回共通的委员（引继担当）
}

impl Meeting {
    /// 全体出席者（队长 + 许可委员）
    pub fn attendees(&self) -> impl Iterator<Item = PersonId> + '_ {
        std::iter::once(self.leader).chain(self.committee.iter().copied())
    }

    /// 与另一场会议的槽位区间是否重叠（跨队比较用；槽位为全局索引）
    pub fn overlaps(&self, other: &Meeting, meeting_slots: usize) -> bool {
        self.start_slot < other.start_slot + meeting_slots
            && other.start_slot < self.start_slot + meeting_slots
    }
}

// ==========================================
// CandidateWindow - 候选会议窗口
// ==========================================
// 队长与合格许可委员集合在连续 meeting_slots 个槽位上共同空闲的窗口；
// eligible 携带全部合格委员,实际出席子集由求解器选择。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateWindow {
    pub team: TeamId,
    pub start_slot: usize,
    pub eligible: Vec<PersonId>, // 升序,保证可复现
}

// ==========================================
// Schedule - 排程聚合根
// ==========================================
// 不变量: 任何人不得出现在两场槽位区间重叠的会议中
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub run_id: Uuid,
    pub meetings: Vec<Meeting>,
    by_team: HashMap<TeamId, Vec<usize>>,
    by_person: HashMap<PersonId, Vec<usize>>,
}

impl Schedule {
    /// 从完整会议清单建立聚合（含按人/按队索引）
    pub fn new(run_id: Uuid, meetings: Vec<Meeting>) -> Self {
        let mut by_team: HashMap<TeamId, Vec<usize>> = HashMap::new();
        let mut by_person: HashMap<PersonId, Vec<usize>> = HashMap::new();
        for (idx, meeting) in meetings.iter().enumerate() {
            by_team.entry(meeting.team).or_default().push(idx);
            for person in meeting.attendees() {
                by_person.entry(person).or_default().push(idx);
            }
        }
        Self {
            run_id,
            meetings,
            by_team,
            by_person,
        }
    }

    /// 某队的全部会议（按输入顺序）
    pub fn meetings_of_team(&self, team: TeamId) -> impl Iterator<Item = &Meeting> {
        self.by_team
            .get(&team)
            .into_iter()
            .flatten()
            .map(|idx| &self.meetings[*idx])
    }

    /// 某人出席的全部会议
    pub fn meetings_of_person(&self, person: PersonId) -> impl Iterator<Item = &Meeting> {
        self.by_person
            .get(&person)
            .into_iter()
            .flatten()
            .map(|idx| &self.meetings[*idx])
    }

    /// 本次运行新生成的会议数
    pub fn generated_count(&self) -> usize {
        self.meetings
            .iter()
            .filter(|m| m.origin == MeetingOrigin::Generated)
            .count()
    }
}
