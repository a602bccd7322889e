// ==========================================
// 登山队审议会议排程系统 - 输入完整性校验
// ==========================================
// 职责: 建模前的前置校验（生成开始时刻 / 委员名额 / 既有会议一致性）
// 红线: 校验失败即短路,不进入任何建模阶段
// ==========================================

use std::collections::HashMap;

use chrono::NaiveDateTime;
use itertools::Itertools;
use tracing::debug;

use crate::config::QuorumConfig;
use crate::domain::{MeetingOrigin, PersonId, TeamId};
use crate::error::{SchedResult, SchedulerError};
use crate::ingest::LoadedInput;

/// 生成开始时刻必须晚于当前时刻,否则终止运行
pub fn check_generation_start(
    now: NaiveDateTime,
    generation_start: NaiveDateTime,
) -> SchedResult<()> {
    if generation_start <= now {
        return Err(SchedulerError::PastStart {
            generation_start,
            now,
        });
    }
    Ok(())
}

/// 建模前完整性校验
///
/// # 校验项
/// - 许可委员总数 ≥ 出席人数要求
/// - 上级许可委员总数 ≥ 上级最低人数
/// - 追加审议要求存在时必须提供上一轮结果
/// - 既有会议数不得超过该队会议总要求
/// - 既有会议之间任何出席者不得时间重叠
pub fn validate_integrity(loaded: &LoadedInput, quorum: &QuorumConfig) -> SchedResult<()> {
    let committee_total = loaded.persons.iter().filter(|p| p.is_committee).count();
    if committee_total < quorum.quorum_size {
        return Err(SchedulerError::Data(format!(
            "许可委员总数 {} 不足出席人数要求 {}",
            committee_total, quorum.quorum_size
        )));
    }

    let senior_total = loaded
        .persons
        .iter()
        .filter(|p| p.is_senior_committee())
        .count();
    if senior_total < quorum.senior_min {
        return Err(SchedulerError::Data(format!(
            "上级许可委员总数 {} 不足最低要求 {}（任何会议均无法满足上级人数）",
            senior_total, quorum.senior_min
        )));
    }

    // 追加审议必须伴随上一轮结果
    let has_additional = loaded.teams.iter().any(|t| t.additional_required > 0);
    let has_prior = loaded
        .preexisting
        .iter()
        .any(|m| m.origin == MeetingOrigin::Prior);
    if has_additional && !has_prior {
        return Err(SchedulerError::Data(
            "存在追加审议要求,但未提供上一轮运行结果（prev）".to_string(),
        ));
    }

    // 既有会议数不得超过总要求（总要求为硬性的"恰好"约束）
    for team in &loaded.teams {
        let preexisting = loaded.preexisting_count(team.id) as u32;
        if preexisting > team.total_required() {
            return Err(SchedulerError::Data(format!(
                "登山队 {} 既有会议 {} 场,已超过会议总要求 {} 场",
                team.name,
                preexisting,
                team.total_required()
            )));
        }
    }

    check_preexisting_overlaps(loaded)?;

    debug!(
        committee_total,
        senior_total,
        preexisting = loaded.preexisting.len(),
        "完整性校验通过"
    );
    Ok(())
}

/// 既有会议（输入数据）之间的出席者重叠属数据错误,
/// 在此拦截后,解映射阶段的重叠只可能来自构建器缺陷。
fn check_preexisting_overlaps(loaded: &LoadedInput) -> SchedResult<()> {
    let meeting_slots = loaded.grid.meeting_slots();
    let mut by_person: HashMap<PersonId, Vec<(usize, TeamId)>> = HashMap::new();
    for meeting in &loaded.preexisting {
        for person in meeting.attendees() {
            by_person
                .entry(person)
                .or_default()
                .push((meeting.start_slot, meeting.team));
        }
    }

    for (person, mut slots) in by_person {
        slots.sort_unstable();
        for ((a_slot, a_team), (b_slot, b_team)) in slots.iter().copied().tuple_windows() {
            if a_slot + meeting_slots > b_slot {
                return Err(SchedulerError::Data(format!(
                    "既有会议重叠: {} 同时出现在 {} 与 {} 的会议中",
                    loaded.names.person_name(person),
                    loaded.names.team_name(a_team),
                    loaded.names.team_name(b_team)
                )));
            }
        }
    }
    Ok(())
}
