// ==========================================
// 登山队审议会议排程系统 - 汇总层
// ==========================================
// 职责: 排程聚合 → 以名称为键的会议清单/队汇总/人员汇总
// 红线: 输出一律名称键,内部 ID 不外泄
// ==========================================

use chrono::{NaiveDate, NaiveTime};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::domain::{MeetingOrigin, Schedule};
use crate::ingest::LoadedInput;

// ==========================================
// 输出行
// ==========================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingRow {
    pub origin: MeetingOrigin,
    pub team_name: String,
    pub meeting_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub leader_name: String,
    pub committee_names: Vec<String>,
    pub senior_count: usize,
    pub meeting_no: Option<u32>,
    pub handover_person: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamSummaryRow {
    pub team_name: String,
    pub required_total: u32,
    pub scheduled_total: u32,
    pub earliest_meeting_date: Option<NaiveDate>,
    pub latest_meeting_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonSummaryRow {
    pub person_name: String,
    pub total_attend: u32,
    pub leader_count: u32,
    pub committee_count: u32,
    pub first_commitment: Option<NaiveDate>,
    pub last_commitment: Option<NaiveDate>,
}

// ==========================================
// 汇总构建
// ==========================================

/// 会议清单（队名→日期→时刻 升序）
pub fn build_meeting_rows(loaded: &LoadedInput, schedule: &Schedule) -> Vec<MeetingRow> {
    let grid = &loaded.grid;
    schedule
        .meetings
        .iter()
        .map(|meeting| {
            let (date, start_time) = grid.date_time_of(meeting.start_slot);
            let senior_count = meeting
                .committee
                .iter()
                .filter(|p| loaded.persons[p.0].is_senior_committee())
                .count();
            MeetingRow {
                origin: meeting.origin,
                team_name: loaded.names.team_name(meeting.team).to_string(),
                meeting_date: date,
                start_time,
                end_time: grid.meeting_end_time(meeting.start_slot),
                leader_name: loaded.names.person_name(meeting.leader).to_string(),
                committee_names: meeting
                    .committee
                    .iter()
                    .map(|p| loaded.names.person_name(*p).to_string())
                    .collect(),
                senior_count,
                meeting_no: meeting.meeting_no,
                handover_person: meeting
                    .handover_person
                    .map(|p| loaded.names.person_name(p).to_string()),
            }
        })
        .sorted_by(|a, b| {
            (&a.team_name, a.meeting_date, a.start_time)
                .cmp(&(&b.team_name, b.meeting_date, b.start_time))
        })
        .collect()
}

/// 队汇总: 要求回数 / 实际回数 / 最早与最晚会议日
pub fn build_team_summary(loaded: &LoadedInput, schedule: &Schedule) -> Vec<TeamSummaryRow> {
    loaded
        .teams
        .iter()
        .map(|team| {
            let dates: Vec<NaiveDate> = schedule
                .meetings_of_team(team.id)
                .map(|m| loaded.grid.day_of_slot(m.start_slot))
                .collect();
            TeamSummaryRow {
                team_name: team.name.clone(),
                required_total: team.total_required(),
                scheduled_total: dates.len() as u32,
                earliest_meeting_date: dates.iter().min().copied(),
                latest_meeting_date: dates.iter().max().copied(),
            }
        })
        .collect()
}

/// 人员汇总: 出席总数（队长/委员身份分列）与出席日期范围
/// 排序: 出席总数降序,同数按名称升序
pub fn build_person_summary(loaded: &LoadedInput, schedule: &Schedule) -> Vec<PersonSummaryRow> {
    loaded
        .persons
        .iter()
        .map(|person| {
            let mut leader_count = 0u32;
            let mut committee_count = 0u32;
            let mut dates: Vec<NaiveDate> = Vec::new();
            for meeting in schedule.meetings_of_person(person.id) {
                if meeting.leader == person.id {
                    leader_count += 1;
                } else {
                    committee_count += 1;
                }
                dates.push(loaded.grid.day_of_slot(meeting.start_slot));
            }
            PersonSummaryRow {
                person_name: person.name.clone(),
                total_attend: leader_count + committee_count,
                leader_count,
                committee_count,
                first_commitment: dates.iter().min().copied(),
                last_commitment: dates.iter().max().copied(),
            }
        })
        .sorted_by(|a, b| {
            b.total_attend
                .cmp(&a.total_attend)
                .then_with(|| a.person_name.cmp(&b.person_name))
        })
        .collect()
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::domain::{Meeting, PersonId, TeamId};
    use crate::ingest::records::{
        DayAvailabilityRecord, PersonRecord, RawInput, TeamRecord,
    };
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, day).unwrap()
    }

    fn loaded_fixture() -> LoadedInput {
        let input = RawInput {
            persons: vec![
                PersonRecord {
                    name: "队长甲".to_string(),
                    is_committee: false,
                    is_senior: false,
                    availability: vec![DayAvailabilityRecord {
                        date: d(5),
                        codes: vec![1; 26],
                    }],
                },
                PersonRecord {
                    name: "委员乙".to_string(),
                    is_committee: true,
                    is_senior: true,
                    availability: vec![DayAvailabilityRecord {
                        date: d(5),
                        codes: vec![1; 26],
                    }],
                },
            ],
            teams: vec![TeamRecord {
                name: "北壁队".to_string(),
                leader_name: "队长甲".to_string(),
                member_names: vec![],
                deadline: d(31),
                base_required: 1,
                additional_required: 0,
            }],
            fixed_meetings: vec![],
            prior_meetings: vec![],
            generation_start: d(1).and_hms_opt(9, 0, 0).unwrap(),
        };
        crate::ingest::loader::load(&input, &AppConfig::default()).unwrap()
    }

    #[test]
    fn test_rows_are_name_keyed() {
        let loaded = loaded_fixture();
        let base = loaded.grid.first_slot_of_day(d(5)).unwrap();
        let schedule = Schedule::new(
            Uuid::nil(),
            vec![Meeting {
                team: TeamId(0),
                start_slot: base + 3, // 10:30
                leader: PersonId(0),
                committee: vec![PersonId(1)],
                origin: MeetingOrigin::Generated,
                meeting_no: Some(1),
                handover_person: None,
            }],
        );

        let rows = build_meeting_rows(&loaded, &schedule);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].team_name, "北壁队");
        assert_eq!(rows[0].leader_name, "队长甲");
        assert_eq!(rows[0].committee_names, vec!["委员乙".to_string()]);
        assert_eq!(rows[0].start_time.to_string(), "10:30:00");
        assert_eq!(rows[0].end_time.to_string(), "12:30:00");
        assert_eq!(rows[0].senior_count, 1);

        let teams = build_team_summary(&loaded, &schedule);
        assert_eq!(teams[0].scheduled_total, 1);
        assert_eq!(teams[0].earliest_meeting_date, Some(d(5)));
        assert_eq!(teams[0].latest_meeting_date, Some(d(5)));

        let persons = build_person_summary(&loaded, &schedule);
        // 两人各出席 1 场,按名称升序
        assert_eq!(persons[0].total_attend, 1);
        assert_eq!(persons[1].total_attend, 1);
        assert_eq!(persons[0].person_name, "委员乙");
        assert_eq!(persons[0].committee_count, 1);
        assert_eq!(persons[1].leader_count, 1);
    }

    #[test]
    fn test_empty_schedule_summary() {
        let loaded = loaded_fixture();
        let schedule = Schedule::new(Uuid::nil(), vec![]);
        let teams = build_team_summary(&loaded, &schedule);
        assert_eq!(teams[0].scheduled_total, 0);
        assert!(teams[0].earliest_meeting_date.is_none());
    }
}
