// ==========================================
// 登山队审议会议排程系统 - 约束模型构建引擎
// ==========================================
// 职责: 候选窗口 → 选择/出席决策变量 + 硬约束 + 目标函数
// 输出: 不透明 MILP 模型 + 约束名→来源 的诊断对照表
// 红线: 构建器绝不调用求解器
// ==========================================
// 硬约束:
//   (1) 各队新生成会议数 恰好等于 还需回数
//   (2) 出席联动: 会议被选中时恰好 quorum_size 名合格委员出席,
//       其中上级委员不少于 senior_min
//   (3) 同一人任意槽位至多出现在一场会议（含队长身份）
//   (4) 同队同日至多一场新会议
// 目标（最小化）:
//   负担均衡（最大个人出席次数）为主, 延迟（距各队最早可行窗口的
//   槽位距离之和）为次, 权重外部配置且前者严格更高
// ==========================================

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::{debug, instrument};

use crate::config::{ObjectiveWeights, QuorumConfig};
use crate::domain::{CandidateWindow, PersonId, TeamId};
use crate::ingest::LoadedInput;
use crate::solver::{CmpOp, LinearExpr, MilpModel, VarDomain, VarId};

// ==========================================
// ConstraintOrigin - 约束来源（诊断用）
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ConstraintOrigin {
    pub team: Option<TeamId>,
    pub start_slot: Option<usize>,
    pub person: Option<PersonId>,
}

// ==========================================
// BuiltModel - 构建产物
// ==========================================
#[derive(Debug, Clone)]
pub struct BuiltModel {
    pub model: MilpModel,
    /// 展平后的候选窗口（按队、按槽位升序）
    pub windows: Vec<CandidateWindow>,
    /// 每个窗口的选择变量
    pub selection_vars: Vec<VarId>,
    /// 每个窗口的 (合格委员, 出席变量) 列表
    pub attendance_vars: Vec<Vec<(PersonId, VarId)>>,
    /// 约束名 → 来源
    pub diagnostics: HashMap<String, ConstraintOrigin>,
}

// ==========================================
// ConstraintModelBuilder - 约束模型构建引擎
// ==========================================
pub struct ConstraintModelBuilder {
    quorum: QuorumConfig,
    weights: ObjectiveWeights,
}

impl ConstraintModelBuilder {
    pub fn new(quorum: QuorumConfig, weights: ObjectiveWeights) -> Self {
        Self { quorum, weights }
    }

    /// 构建选择问题
    ///
    /// # 参数
    /// - loaded: 只读输入聚合
    /// - candidates: 各队候选窗口（由候选生成引擎产出）
    #[instrument(skip_all, fields(
        teams = loaded.teams.len(),
        windows = candidates.iter().map(|(_, w)| w.len()).sum::<usize>()
    ))]
    pub fn build(
        &self,
        loaded: &LoadedInput,
        candidates: &[(TeamId, Vec<CandidateWindow>)],
    ) -> BuiltModel {
        let mut model = MilpModel::new();
        let mut diagnostics: HashMap<String, ConstraintOrigin> = HashMap::new();

        // ===== 展平窗口并登记决策变量 =====
        let mut windows: Vec<CandidateWindow> = Vec::new();
        for (_, team_windows) in candidates {
            windows.extend(team_windows.iter().cloned());
        }

        let selection_vars: Vec<VarId> = windows
            .iter()
            .map(|w| {
                model.add_var(
                    format!("y[{},s{}]", w.team, w.start_slot),
                    VarDomain::Binary,
                )
            })
            .collect();

        let attendance_vars: Vec<Vec<(PersonId, VarId)>> = windows
            .iter()
            .map(|w| {
                w.eligible
                    .iter()
                    .map(|p| {
                        let var = model.add_var(
                            format!("x[{},s{},{}]", w.team, w.start_slot, p),
                            VarDomain::Binary,
                        );
                        (*p, var)
                    })
                    .collect()
            })
            .collect();

        // 个人负担变量与最大负担变量
        let load_vars: Vec<VarId> = loaded
            .persons
            .iter()
            .map(|p| model.add_var(format!("w[{}]", p.id), VarDomain::Integer { min: 0.0 }))
            .collect();
        let max_load_var = model.add_var("w_max", VarDomain::Integer { min: 0.0 });

        // ===== (1) 各队恰好 need_new 场 =====
        let window_indexes_by_team = group_windows_by_team(&windows);
        for team in &loaded.teams {
            let need_new = loaded.need_new(team.id);
            let indexes = window_indexes_by_team.get(&team.id);
            if need_new == 0 && indexes.is_none() {
                continue;
            }
            let mut expr = LinearExpr::new();
            for idx in indexes.into_iter().flatten() {
                expr.add_term(selection_vars[*idx], 1.0);
            }
            let name = format!("exact_count[{}]", team.id);
            diagnostics.insert(
                name.clone(),
                ConstraintOrigin {
                    team: Some(team.id),
                    ..Default::default()
                },
            );
            model.add_constraint(name, expr, CmpOp::Eq, f64::from(need_new));
        }

        // ===== (2) 出席联动（人数恰好 + 上级下限） =====
        for (idx, window) in windows.iter().enumerate() {
            let y = selection_vars[idx];

            let mut exact = LinearExpr::new();
            for (_, x) in &attendance_vars[idx] {
                exact.add_term(*x, 1.0);
            }
            exact.add_term(y, -(self.quorum.quorum_size as f64));
            let name = format!("quorum[{},s{}]", window.team, window.start_slot);
            diagnostics.insert(name.clone(), origin_of(window));
            model.add_constraint(name, exact, CmpOp::Eq, 0.0);

            if self.quorum.senior_min > 0 {
                let mut senior = LinearExpr::new();
                for (p, x) in &attendance_vars[idx] {
                    if loaded.persons[p.0].is_senior_committee() {
                        senior.add_term(*x, 1.0);
                    }
                }
                senior.add_term(y, -(self.quorum.senior_min as f64));
                let name = format!("senior[{},s{}]", window.team, window.start_slot);
                diagnostics.insert(name.clone(), origin_of(window));
                model.add_constraint(name, senior, CmpOp::Ge, 0.0);
            }
        }

        // ===== (3) 任意人×任意槽位 至多一场 =====
        // 既有会议占用已在空闲索引阶段排除,此处只需约束新会议之间
        let meeting_slots = loaded.grid.meeting_slots();
        let mut terms_by_person_slot: HashMap<(PersonId, usize), Vec<VarId>> = HashMap::new();
        for (idx, window) in windows.iter().enumerate() {
            let leader = loaded.teams[window.team.0].leader;
            for slot in window.start_slot..window.start_slot + meeting_slots {
                for (p, x) in &attendance_vars[idx] {
                    terms_by_person_slot
                        .entry((*p, slot))
                        .or_default()
                        .push(*x);
                }
                terms_by_person_slot
                    .entry((leader, slot))
                    .or_default()
                    .push(selection_vars[idx]);
            }
        }
        let mut keys: Vec<(PersonId, usize)> = terms_by_person_slot.keys().copied().collect();
        keys.sort_unstable();
        for key in keys {
            let vars = &terms_by_person_slot[&key];
            if vars.len() < 2 {
                continue;
            }
            let mut expr = LinearExpr::new();
            for var in vars {
                expr.add_term(*var, 1.0);
            }
            let (person, slot) = key;
            let name = format!("no_double_booking[{person},slot{slot}]");
            diagnostics.insert(
                name.clone(),
                ConstraintOrigin {
                    person: Some(person),
                    start_slot: Some(slot),
                    ..Default::default()
                },
            );
            model.add_constraint(name, expr, CmpOp::Le, 1.0);
        }

        // ===== (4) 同队同日至多一场新会议 =====
        for team in &loaded.teams {
            let Some(indexes) = window_indexes_by_team.get(&team.id) else {
                continue;
            };
            let mut by_day: HashMap<NaiveDate, Vec<usize>> = HashMap::new();
            for idx in indexes {
                by_day
                    .entry(loaded.grid.day_of_slot(windows[*idx].start_slot))
                    .or_default()
                    .push(*idx);
            }
            let mut days: Vec<NaiveDate> = by_day.keys().copied().collect();
            days.sort_unstable();
            for day in days {
                let idxs = &by_day[&day];
                if idxs.len() < 2 {
                    continue;
                }
                let mut expr = LinearExpr::new();
                for idx in idxs {
                    expr.add_term(selection_vars[*idx], 1.0);
                }
                let name = format!("one_per_day[{},{day}]", team.id);
                diagnostics.insert(
                    name.clone(),
                    ConstraintOrigin {
                        team: Some(team.id),
                        start_slot: Some(windows[idxs[0]].start_slot),
                        ..Default::default()
                    },
                );
                model.add_constraint(name, expr, CmpOp::Le, 1.0);
            }
        }

        // ===== 负担定义与最大负担 =====
        // w[p] = 既有出席次数（常数） + 新会议出席（委员 x + 队长 y）
        let fixed_attend = fixed_attend_counts(loaded);
        for person in &loaded.persons {
            let mut expr = LinearExpr::new();
            expr.add_term(load_vars[person.id.0], 1.0);
            for (idx, window) in windows.iter().enumerate() {
                if loaded.teams[window.team.0].leader == person.id {
                    expr.add_term(selection_vars[idx], -1.0);
                }
                for (p, x) in &attendance_vars[idx] {
                    if *p == person.id {
                        expr.add_term(*x, -1.0);
                    }
                }
            }
            let name = format!("load_def[{}]", person.id);
            diagnostics.insert(
                name.clone(),
                ConstraintOrigin {
                    person: Some(person.id),
                    ..Default::default()
                },
            );
            model.add_constraint(name, expr, CmpOp::Eq, fixed_attend[person.id.0] as f64);

            let mut ge = LinearExpr::new();
            ge.add_term(max_load_var, 1.0);
            ge.add_term(load_vars[person.id.0], -1.0);
            let name = format!("max_load_ge[{}]", person.id);
            model.add_constraint(name, ge, CmpOp::Ge, 0.0);
        }

        // ===== 目标函数 =====
        // 主项: 负担均衡; 次项: 延迟（距该队最早可行窗口的槽位距离）
        let earliest_by_team = earliest_slot_by_team(&windows);
        let mut objective = LinearExpr::new();
        objective.add_term(max_load_var, self.weights.w_load_balance);
        for (idx, window) in windows.iter().enumerate() {
            let earliest = earliest_by_team[&window.team];
            let lateness = (window.start_slot - earliest) as f64;
            if lateness > 0.0 {
                objective.add_term(selection_vars[idx], self.weights.w_lateness * lateness);
            }
        }
        model.set_objective(objective);

        debug!(
            num_vars = model.num_vars(),
            num_constraints = model.num_constraints(),
            "约束模型构建完成"
        );

        BuiltModel {
            model,
            windows,
            selection_vars,
            attendance_vars,
            diagnostics,
        }
    }
}

// ==========================================
// 辅助
// ==========================================

fn origin_of(window: &CandidateWindow) -> ConstraintOrigin {
    ConstraintOrigin {
        team: Some(window.team),
        start_slot: Some(window.start_slot),
        person: None,
    }
}

fn group_windows_by_team(windows: &[CandidateWindow]) -> HashMap<TeamId, Vec<usize>> {
    let mut by_team: HashMap<TeamId, Vec<usize>> = HashMap::new();
    for (idx, window) in windows.iter().enumerate() {
        by_team.entry(window.team).or_default().push(idx);
    }
    by_team
}

fn earliest_slot_by_team(windows: &[CandidateWindow]) -> HashMap<TeamId, usize> {
    let mut earliest: HashMap<TeamId, usize> = HashMap::new();
    for window in windows {
        earliest
            .entry(window.team)
            .and_modify(|slot| *slot = (*slot).min(window.start_slot))
            .or_insert(window.start_slot);
    }
    earliest
}

/// 既有会议（Fixed + Prior）带来的每人出席次数常数
fn fixed_attend_counts(loaded: &LoadedInput) -> Vec<u32> {
    let mut counts = vec![0u32; loaded.persons.len()];
    for meeting in &loaded.preexisting {
        for person in meeting.attendees() {
            counts[person.0] += 1;
        }
    }
    counts
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::engine::{AvailabilityIndex, CandidateGenerator};
    use crate::ingest::records::{
        DayAvailabilityRecord, PersonRecord, RawInput, TeamRecord,
    };
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, day).unwrap()
    }

    fn person(name: &str, is_committee: bool, is_senior: bool, codes: Vec<u8>) -> PersonRecord {
        PersonRecord {
            name: name.to_string(),
            is_committee,
            is_senior,
            availability: vec![DayAvailabilityRecord {
                date: d(5),
                codes,
            }],
        }
    }

    /// 单队、单委员、仅 10:30〜13:00 共同空闲（两个窗口起点）
    fn small_case() -> (AppConfig, LoadedInput, Vec<(TeamId, Vec<crate::domain::CandidateWindow>)>) {
        let mut cfg = AppConfig::default();
        cfg.quorum.quorum_size = 1;
        cfg.quorum.senior_min = 0;

        let mut codes = vec![4u8; 26];
        for intra in 3..9 {
            codes[intra] = 1;
        }
        let input = RawInput {
            persons: vec![
                person("队长甲", false, false, codes.clone()),
                person("委员乙", true, true, codes),
            ],
            teams: vec![TeamRecord {
                name: "北壁队".to_string(),
                leader_name: "队长甲".to_string(),
                member_names: vec![],
                deadline: d(5),
                base_required: 1,
                additional_required: 0,
            }],
            fixed_meetings: vec![],
            prior_meetings: vec![],
            generation_start: d(1).and_hms_opt(9, 0, 0).unwrap(),
        };
        let loaded = crate::ingest::loader::load(&input, &cfg).unwrap();
        let index = AvailabilityIndex::build(&loaded).unwrap();
        let candidates = CandidateGenerator::new(cfg.quorum.clone()).generate_all(&loaded, &index);
        (cfg, loaded, candidates)
    }

    #[test]
    fn test_build_variable_and_constraint_inventory() {
        let (cfg, loaded, candidates) = small_case();
        let windows: usize = candidates.iter().map(|(_, w)| w.len()).sum();
        assert_eq!(windows, 3); // 起点 3/4/5（3..9 内的 4 连续槽位）

        let built =
            ConstraintModelBuilder::new(cfg.quorum.clone(), cfg.weights.clone()).build(&loaded, &candidates);

        // y×3 + x×3 + w×2 + w_max
        assert_eq!(built.model.num_vars(), 3 + 3 + 2 + 1);
        assert_eq!(built.selection_vars.len(), 3);
        assert_eq!(built.attendance_vars[0].len(), 1);

        // 恰好回数约束存在且 rhs = 1
        let exact = built
            .model
            .constraints
            .iter()
            .find(|c| c.name.starts_with("exact_count"))
            .unwrap();
        assert_eq!(exact.op, CmpOp::Eq);
        assert_eq!(exact.rhs, 1.0);

        // 同日窗口 ≥2 → 同队同日约束存在
        assert!(built
            .model
            .constraints
            .iter()
            .any(|c| c.name.starts_with("one_per_day")));

        // 重叠槽位上存在双订约束（委员乙在槽位 4/5 同时被三个窗口覆盖）
        assert!(built
            .model
            .constraints
            .iter()
            .any(|c| c.name.starts_with("no_double_booking")));

        // 诊断对照表覆盖恰好回数约束
        let origin = &built.diagnostics[&exact.name];
        assert_eq!(origin.team, Some(TeamId(0)));
    }

    #[test]
    fn test_exact_count_reflects_preexisting() {
        let (cfg, mut loaded, candidates) = small_case();
        // 人工注入一场既有会议: need_new 由 1 降为 0
        loaded.preexisting.push(crate::domain::Meeting {
            team: TeamId(0),
            start_slot: 0,
            leader: crate::domain::PersonId(0),
            committee: vec![crate::domain::PersonId(1)],
            origin: crate::domain::MeetingOrigin::Fixed,
            meeting_no: None,
            handover_person: None,
        });
        let built =
            ConstraintModelBuilder::new(cfg.quorum.clone(), cfg.weights.clone()).build(&loaded, &candidates);
        let exact = built
            .model
            .constraints
            .iter()
            .find(|c| c.name.starts_with("exact_count"))
            .unwrap();
        assert_eq!(exact.rhs, 0.0);
    }

    #[test]
    fn test_objective_prefers_load_balance_and_earliness() {
        let (cfg, loaded, candidates) = small_case();
        let built =
            ConstraintModelBuilder::new(cfg.quorum.clone(), cfg.weights.clone()).build(&loaded, &candidates);

        let obj = &built.model.objective;
        // 目标含 w_max 项,系数为负担均衡权重
        let max_load_term = obj
            .terms
            .iter()
            .find(|(var, _)| built.model.variables[var.0].name == "w_max")
            .unwrap();
        assert_eq!(max_load_term.1, cfg.weights.w_load_balance);

        // 最早窗口(槽位距离 0)不产生延迟项; 第二/三窗口分别为 1/2 槽位距离
        let y1 = built.selection_vars[1];
        let lateness_term = obj.terms.iter().find(|(var, _)| *var == y1).unwrap();
        assert!((lateness_term.1 - cfg.weights.w_lateness).abs() < 1e-9);
        let y0 = built.selection_vars[0];
        assert!(!obj.terms.iter().any(|(var, _)| *var == y0));
    }

    #[test]
    fn test_senior_constraint_emitted_when_configured() {
        let (mut cfg, loaded, candidates) = small_case();
        cfg.quorum.senior_min = 1;
        let built =
            ConstraintModelBuilder::new(cfg.quorum.clone(), cfg.weights.clone()).build(&loaded, &candidates);
        assert!(built
            .model
            .constraints
            .iter()
            .any(|c| c.name.starts_with("senior")));
    }
}
