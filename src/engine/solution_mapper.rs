// ==========================================
// 登山队审议会议排程系统 - 解映射引擎
// ==========================================
// 职责: 求解器变量赋值 → Generated 会议,并与既有会议合并为排程聚合
// 红线: 仅在求解可行后调用；合并结果必须通过全部不变量校验
// ==========================================

use itertools::Itertools;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::domain::{Meeting, MeetingOrigin, PersonId, Schedule};
use crate::engine::model_builder::BuiltModel;
use crate::error::{SchedResult, SchedulerError};
use crate::ingest::LoadedInput;
use crate::solver::SolveOutcome;

// ==========================================
// SolutionMapper - 解映射引擎
// ==========================================
pub struct SolutionMapper {
    quorum_size: usize,
}

impl SolutionMapper {
    pub fn new(quorum_size: usize) -> Self {
        Self { quorum_size }
    }

    /// 将可行解映射为最终排程
    ///
    /// # 失败
    /// - Consistency: 出席人数/会议回数/槽位边界/重叠 任一不变量被破坏
    ///   （意味着构建器缺陷,必为致命）
    #[instrument(skip_all, fields(windows = built.windows.len()))]
    pub fn map(
        &self,
        loaded: &LoadedInput,
        built: &BuiltModel,
        outcome: &SolveOutcome,
    ) -> SchedResult<Schedule> {
        // ===== 选中窗口 → Generated 会议 =====
        let mut meetings: Vec<Meeting> = loaded.preexisting.clone();
        for (idx, window) in built.windows.iter().enumerate() {
            if !outcome.is_set(built.selection_vars[idx]) {
                continue;
            }
            let committee: Vec<PersonId> = built.attendance_vars[idx]
                .iter()
                .filter(|(_, var)| outcome.is_set(*var))
                .map(|(p, _)| *p)
                .sorted()
                .collect();
            if committee.len() != self.quorum_size {
                return Err(SchedulerError::Consistency(format!(
                    "窗口 ({}, s{}) 出席委员 {} 名,应为 {} 名",
                    window.team,
                    window.start_slot,
                    committee.len(),
                    self.quorum_size
                )));
            }
            meetings.push(Meeting {
                team: window.team,
                start_slot: window.start_slot,
                leader: loaded.teams[window.team.0].leader,
                committee,
                origin: MeetingOrigin::Generated,
                meeting_no: None,
                handover_person: None,
            });
        }

        // ===== 按队时间序补充回数与引继担当 =====
        meetings.sort_by_key(|m| (m.team, m.start_slot));
        self.assign_sequence_fields(&mut meetings);

        // ===== 不变量校验 =====
        self.verify_counts(loaded, &meetings)?;
        self.verify_window_bounds(loaded, &meetings)?;
        self.verify_no_overlap(loaded, &meetings)?;

        let generated = meetings
            .iter()
            .filter(|m| m.origin == MeetingOrigin::Generated)
            .count();
        debug!(
            total = meetings.len(),
            generated, "解映射完成"
        );

        Ok(Schedule::new(Uuid::new_v4(), meetings))
    }

    /// 各队按时间序编号；新会议挑选与上一回共通的委员作为引继担当
    fn assign_sequence_fields(&self, meetings: &mut [Meeting]) {
        let mut start = 0;
        while start < meetings.len() {
            let team = meetings[start].team;
            let mut end = start;
            while end < meetings.len() && meetings[end].team == team {
                end += 1;
            }

            for (offset, idx) in (start..end).enumerate() {
                meetings[idx].meeting_no = Some(offset as u32 + 1);
                if meetings[idx].origin == MeetingOrigin::Generated && idx > start {
                    let prev_committee = meetings[idx - 1].committee.clone();
                    meetings[idx].handover_person = meetings[idx]
                        .committee
                        .iter()
                        .copied()
                        .find(|p| prev_committee.contains(p));
                }
            }
            start = end;
        }
    }

    fn verify_counts(&self, loaded: &LoadedInput, meetings: &[Meeting]) -> SchedResult<()> {
        for team in &loaded.teams {
            let count = meetings.iter().filter(|m| m.team == team.id).count() as u32;
            if count != team.total_required() {
                return Err(SchedulerError::Consistency(format!(
                    "登山队 {} 最终会议 {} 场,应恰好为 {} 场",
                    team.name,
                    count,
                    team.total_required()
                )));
            }
        }
        Ok(())
    }

    fn verify_window_bounds(&self, loaded: &LoadedInput, meetings: &[Meeting]) -> SchedResult<()> {
        for meeting in meetings {
            if meeting.origin != MeetingOrigin::Generated {
                continue;
            }
            let team = &loaded.teams[meeting.team.0];
            if meeting.start_slot < loaded.generation_start_slot {
                return Err(SchedulerError::Consistency(format!(
                    "登山队 {} 的新会议早于生成开始槽位",
                    team.name
                )));
            }
            let limit = loaded.grid.deadline_limit_slot(team.deadline)?;
            if meeting.start_slot > limit {
                return Err(SchedulerError::Consistency(format!(
                    "登山队 {} 的新会议越过截止日",
                    team.name
                )));
            }
        }
        Ok(())
    }

    /// 任何人不得出现在两场槽位区间重叠的会议中
    fn verify_no_overlap(&self, loaded: &LoadedInput, meetings: &[Meeting]) -> SchedResult<()> {
        let meeting_slots = loaded.grid.meeting_slots();
        let mut by_person: std::collections::HashMap<PersonId, Vec<usize>> =
            std::collections::HashMap::new();
        for meeting in meetings {
            for person in meeting.attendees() {
                by_person.entry(person).or_default().push(meeting.start_slot);
            }
        }
        for (person, mut slots) in by_person {
            slots.sort_unstable();
            for (a, b) in slots.iter().tuple_windows() {
                if a + meeting_slots > *b {
                    return Err(SchedulerError::Consistency(format!(
                        "{} 出现在两场重叠会议中（槽位 {a} 与 {b}）",
                        loaded.names.person_name(person)
                    )));
                }
            }
        }
        Ok(())
    }
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::engine::{AvailabilityIndex, CandidateGenerator, ConstraintModelBuilder};
    use crate::ingest::records::{
        DayAvailabilityRecord, FixedMeetingRecord, PersonRecord, RawInput, TeamRecord,
    };
    use crate::solver::{SolveOutcome, SolveStatus};
    use chrono::{NaiveDate, NaiveTime};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, day).unwrap()
    }

    fn person(name: &str, is_committee: bool, codes: Vec<u8>) -> PersonRecord {
        PersonRecord {
            name: name.to_string(),
            is_committee,
            is_senior: is_committee,
            availability: vec![DayAvailabilityRecord { date: d(5), codes }],
        }
    }

    /// 队长+单委员、窗口起点 3/4/5,需新增 1 场
    fn mapped_case(
        with_fixed: bool,
    ) -> (AppConfig, LoadedInput, BuiltModel) {
        let mut cfg = AppConfig::default();
        cfg.quorum.quorum_size = 1;
        cfg.quorum.senior_min = 0;

        let mut codes = vec![4u8; 26];
        for intra in 3..9 {
            codes[intra] = 1;
        }
        let mut input = RawInput {
            persons: vec![
                person("队长甲", false, codes.clone()),
                person("委员乙", true, codes),
            ],
            teams: vec![TeamRecord {
                name: "北壁队".to_string(),
                leader_name: "队长甲".to_string(),
                member_names: vec![],
                deadline: d(5),
                base_required: if with_fixed { 2 } else { 1 },
                additional_required: 0,
            }],
            fixed_meetings: vec![],
            prior_meetings: vec![],
            generation_start: d(1).and_hms_opt(9, 0, 0).unwrap(),
        };
        if with_fixed {
            // 固定会议 1 月 5 日 16:00（日内 14,与空闲段无重叠）
            input.fixed_meetings.push(FixedMeetingRecord {
                team_name: "北壁队".to_string(),
                date: d(5),
                start_time: NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
                leader_name: "队长甲".to_string(),
                committee_names: vec!["委员乙".to_string()],
            });
        }
        let loaded = crate::ingest::loader::load(&input, &cfg).unwrap();
        let index = AvailabilityIndex::build(&loaded).unwrap();
        let candidates = CandidateGenerator::new(cfg.quorum.clone()).generate_all(&loaded, &index);
        let built = ConstraintModelBuilder::new(cfg.quorum.clone(), cfg.weights.clone())
            .build(&loaded, &candidates);
        (cfg, loaded, built)
    }

    /// 手工构造"选中第 0 窗口 + 其唯一委员出席"的赋值
    fn outcome_selecting_window(built: &BuiltModel, window_idx: usize) -> SolveOutcome {
        let mut values = vec![0.0; built.model.num_vars()];
        values[built.selection_vars[window_idx].0] = 1.0;
        for (_, var) in &built.attendance_vars[window_idx] {
            values[var.0] = 1.0;
        }
        SolveOutcome {
            status: SolveStatus::Optimal,
            values,
        }
    }

    #[test]
    fn test_map_generates_meeting_with_sequence() {
        let (cfg, loaded, built) = mapped_case(false);
        let outcome = outcome_selecting_window(&built, 0);
        let schedule = SolutionMapper::new(cfg.quorum.quorum_size)
            .map(&loaded, &built, &outcome)
            .unwrap();

        assert_eq!(schedule.meetings.len(), 1);
        let meeting = &schedule.meetings[0];
        assert_eq!(meeting.origin, MeetingOrigin::Generated);
        assert_eq!(meeting.meeting_no, Some(1));
        assert_eq!(meeting.committee, vec![PersonId(1)]);
        assert!(meeting.handover_person.is_none()); // 初回无引继
    }

    #[test]
    fn test_map_numbers_merged_with_fixed() {
        let (cfg, loaded, built) = mapped_case(true);
        let outcome = outcome_selecting_window(&built, 0);
        let schedule = SolutionMapper::new(cfg.quorum.quorum_size)
            .map(&loaded, &built, &outcome)
            .unwrap();

        assert_eq!(schedule.meetings.len(), 2);
        // 新会议(10:30 起)在固定会议(16:00 起)之前 → 回数 1
        let generated = schedule
            .meetings
            .iter()
            .find(|m| m.origin == MeetingOrigin::Generated)
            .unwrap();
        assert_eq!(generated.meeting_no, Some(1));
        let fixed = schedule
            .meetings
            .iter()
            .find(|m| m.origin == MeetingOrigin::Fixed)
            .unwrap();
        assert_eq!(fixed.meeting_no, Some(2));
    }

    #[test]
    fn test_map_rejects_wrong_attendance_count() {
        let (cfg, loaded, built) = mapped_case(false);
        let mut outcome = outcome_selecting_window(&built, 0);
        // 抹掉出席变量 → 出席 0 名 ≠ quorum_size
        for (_, var) in &built.attendance_vars[0] {
            outcome.values[var.0] = 0.0;
        }
        let err = SolutionMapper::new(cfg.quorum.quorum_size)
            .map(&loaded, &built, &outcome)
            .unwrap_err();
        assert!(matches!(err, SchedulerError::Consistency(_)));
    }

    #[test]
    fn test_map_rejects_count_mismatch() {
        let (cfg, loaded, built) = mapped_case(false);
        // 什么都不选 → 最终 0 场 ≠ 要求 1 场
        let outcome = SolveOutcome {
            status: SolveStatus::Optimal,
            values: vec![0.0; built.model.num_vars()],
        };
        let err = SolutionMapper::new(cfg.quorum.quorum_size)
            .map(&loaded, &built, &outcome)
            .unwrap_err();
        assert!(matches!(err, SchedulerError::Consistency(_)));
    }

    #[test]
    fn test_map_rejects_double_selection_overlap() {
        let (cfg, loaded, built) = mapped_case(false);
        // 同时选中窗口 0 与 1（槽位重叠,委员相同）→ 重叠校验失败
        // 注: 回数校验先于重叠触发也属一致性错误,两者均可接受
        let mut outcome = outcome_selecting_window(&built, 0);
        let second = outcome_selecting_window(&built, 1);
        for (idx, value) in second.values.iter().enumerate() {
            if *value > 0.5 {
                outcome.values[idx] = 1.0;
            }
        }
        let err = SolutionMapper::new(cfg.quorum.quorum_size)
            .map(&loaded, &built, &outcome)
            .unwrap_err();
        assert!(matches!(err, SchedulerError::Consistency(_)));
    }
}
