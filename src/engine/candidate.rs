// ==========================================
// 登山队审议会议排程系统 - 候选窗口生成引擎
// ==========================================
// 职责: 逐队枚举 队长×合格委员集合 共同空闲的 2 小时窗口
// 输入: 只读空闲索引 + 时间网格 + 队信息
// 输出: 按槽位升序、可复现的候选窗口序列
// 红线: 生成期间不得改动空闲索引（各队可并行）
// ==========================================

use tracing::debug;

use crate::config::QuorumConfig;
use crate::domain::{CandidateWindow, Person, PersonId, Team, TeamId};
use crate::engine::availability::AvailabilityIndex;
use crate::ingest::LoadedInput;

// ==========================================
// CandidateGenerator - 候选窗口生成引擎
// ==========================================
#[derive(Debug, Clone)]
pub struct CandidateGenerator {
    quorum: QuorumConfig,
}

impl CandidateGenerator {
    pub fn new(quorum: QuorumConfig) -> Self {
        Self { quorum }
    }

    /// 逐队生成候选窗口（惰性序列,收集后返回）
    ///
    /// 条件:
    /// - 窗口起点 ≥ 生成开始槽位（生成开始当日更早的起点被排除）
    /// - 整场会议在队截止日内结束
    /// - 队长全程空闲
    /// - 合格委员集合（排除本队利益相反者）满足出席人数与上级人数要求
    pub fn windows_for_team(
        &self,
        loaded: &LoadedInput,
        index: &AvailabilityIndex,
        team_id: TeamId,
    ) -> Vec<CandidateWindow> {
        let team = &loaded.teams[team_id.0];
        let committee = committee_members(&loaded.persons);

        let windows: Vec<CandidateWindow> = self
            .window_iter(loaded, index, team, &committee)
            .collect();

        debug!(
            team = %loaded.names.team_name(team_id),
            windows = windows.len(),
            "候选窗口生成完成"
        );
        windows
    }

    /// 全队顺序生成（并行版本由编排器按队派发）
    pub fn generate_all(
        &self,
        loaded: &LoadedInput,
        index: &AvailabilityIndex,
    ) -> Vec<(TeamId, Vec<CandidateWindow>)> {
        loaded
            .teams
            .iter()
            .map(|team| (team.id, self.windows_for_team(loaded, index, team.id)))
            .collect()
    }

    fn window_iter<'a>(
        &'a self,
        loaded: &'a LoadedInput,
        index: &'a AvailabilityIndex,
        team: &'a Team,
        committee: &'a [PersonId],
    ) -> impl Iterator<Item = CandidateWindow> + 'a {
        let grid = &loaded.grid;
        let meeting_slots = grid.meeting_slots();
        let latest_intra = grid.latest_start_in_day();

        // 截止日不在网格内时按无候选处理（网格覆盖截止日,正常不会发生）
        let deadline_limit = grid.deadline_limit_slot(team.deadline).ok();

        deadline_limit.into_iter().flat_map(move |limit| {
            (loaded.generation_start_slot..=limit)
                .filter(move |slot| grid.intra_of_slot(*slot) <= latest_intra)
                .filter_map(move |slot| {
                    // 队长全程空闲
                    if !index.is_free_range(team.leader, slot, meeting_slots) {
                        return None;
                    }

                    // 合格委员 = 全程空闲 ∧ 非本队利益相反者
                    let eligible: Vec<PersonId> = committee
                        .iter()
                        .copied()
                        .filter(|p| !team.conflict_of_interest(*p))
                        .filter(|p| index.is_free_range(*p, slot, meeting_slots))
                        .collect();

                    if eligible.len() < self.quorum.quorum_size {
                        return None;
                    }
                    if self.quorum.senior_min > 0 {
                        let senior_count = eligible
                            .iter()
                            .filter(|p| loaded.persons[p.0].is_senior_committee())
                            .count();
                        if senior_count < self.quorum.senior_min {
                            return None;
                        }
                    }

                    Some(CandidateWindow {
                        team: team.id,
                        start_slot: slot,
                        eligible,
                    })
                })
        })
    }
}

/// 全体许可委员（PersonId 升序,保证输出可复现）
fn committee_members(persons: &[Person]) -> Vec<PersonId> {
    persons
        .iter()
        .filter(|p| p.is_committee)
        .map(|p| p.id)
        .collect()
}
