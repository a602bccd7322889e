// ==========================================
// 登山队审议会议排程系统 - 引擎编排器
// ==========================================
// 用途: 协调排程流水线各阶段的执行顺序
// 流程: 前置校验 → 装载 → 空闲索引 → 候选生成(按队并行)
//       → 约束建模 → 限时求解 → 解映射 → 汇总
// 红线: 求解失败/超时时不产出任何部分排程
// ==========================================

use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::domain::{CandidateWindow, Schedule, TeamId};
use crate::engine::{
    validation, AvailabilityIndex, CandidateGenerator, ConstraintModelBuilder, SolutionMapper,
};
use crate::error::{SchedResult, SchedulerError};
use crate::ingest::{loader, LoadedInput, RawInput};
use crate::report::{
    build_meeting_rows, build_person_summary, build_team_summary, MeetingRow, PersonSummaryRow,
    TeamSummaryRow,
};
use crate::solver::{MilpSolver, SolveStatus};

// ==========================================
// ScheduleOutcome - 排程结果
// ==========================================
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleOutcome {
    pub run_id: Uuid,
    pub status: SolveStatus,
    #[serde(skip)]
    pub schedule: Schedule,
    pub meetings: Vec<MeetingRow>,
    pub team_summaries: Vec<TeamSummaryRow>,
    pub person_summaries: Vec<PersonSummaryRow>,
}

// ==========================================
// ScheduleOrchestrator - 引擎编排器
// ==========================================
pub struct ScheduleOrchestrator<S>
where
    S: MilpSolver,
{
    config: Arc<AppConfig>,
    solver: S,
    generator: CandidateGenerator,
    builder: ConstraintModelBuilder,
}

impl<S> ScheduleOrchestrator<S>
where
    S: MilpSolver,
{
    /// 创建新的编排器实例
    ///
    /// # 参数
    /// - config: 排程配置
    /// - solver: MILP 求解器实现
    pub fn new(config: Arc<AppConfig>, solver: S) -> Self {
        Self {
            generator: CandidateGenerator::new(config.quorum.clone()),
            builder: ConstraintModelBuilder::new(config.quorum.clone(), config.weights.clone()),
            config,
            solver,
        }
    }

    /// 执行完整排程流程（单次批处理）
    ///
    /// # 参数
    /// - input: 外部 I/O 层解析好的全部输入记录
    /// - now: 当前时刻（由调用方提供,便于校验与复现）
    ///
    /// # 返回
    /// 排程结果；任何失败均为结构化错误,不产出部分结果
    #[instrument(skip(self, input), fields(generation_start = %input.generation_start))]
    pub async fn run(&self, input: &RawInput, now: NaiveDateTime) -> SchedResult<ScheduleOutcome> {
        // ==========================================
        // 步骤1: 生成开始时刻校验（过期即终止）
        // ==========================================
        validation::check_generation_start(now, input.generation_start)?;

        // ==========================================
        // 步骤2: 装载与完整性校验
        // ==========================================
        let loaded = Arc::new(loader::load(input, &self.config)?);
        validation::validate_integrity(&loaded, &self.config.quorum)?;

        // ==========================================
        // 步骤3: 空闲索引（既有会议占用一次性扣除）
        // ==========================================
        let index = Arc::new(AvailabilityIndex::build(&loaded)?);

        // ==========================================
        // 步骤4: 候选窗口生成（按队并行,空闲索引只读共享）
        // ==========================================
        let candidates = self
            .generate_candidates(Arc::clone(&loaded), Arc::clone(&index))
            .await?;

        // 无候选且仍需新会议的队,整批收集后一并报告
        let infeasible: Vec<String> = candidates
            .iter()
            .filter(|(team, windows)| windows.is_empty() && loaded.need_new(*team) > 0)
            .map(|(team, _)| loaded.names.team_name(*team).to_string())
            .collect();
        if !infeasible.is_empty() {
            return Err(SchedulerError::InfeasibleCandidates { teams: infeasible });
        }

        // ==========================================
        // 步骤5: 约束建模
        // ==========================================
        let built = self.builder.build(&loaded, &candidates);

        // ==========================================
        // 步骤6: 限时求解
        // ==========================================
        let time_limit = Duration::from_secs(self.config.solver.time_limit_secs);
        let outcome = self.solver.solve(&built.model, time_limit).await?;
        info!(status = %outcome.status, "求解完成");

        match outcome.status {
            SolveStatus::TimedOut => {
                return Err(SchedulerError::SolverTimeout {
                    limit_secs: self.config.solver.time_limit_secs,
                });
            }
            SolveStatus::Infeasible => {
                return Err(SchedulerError::SolverInfeasible {
                    diagnostics: Some(infeasibility_summary(&loaded, &candidates)),
                });
            }
            SolveStatus::Unbounded => {
                // 目标各项均有下界,无界只能源于构建器缺陷
                return Err(SchedulerError::Consistency("模型目标无界".to_string()));
            }
            SolveStatus::Optimal | SolveStatus::Feasible => {}
        }

        // ==========================================
        // 步骤7: 解映射与汇总
        // ==========================================
        let mapper = SolutionMapper::new(self.config.quorum.quorum_size);
        let schedule = mapper.map(&loaded, &built, &outcome)?;

        let meetings = build_meeting_rows(&loaded, &schedule);
        let team_summaries = build_team_summary(&loaded, &schedule);
        let person_summaries = build_person_summary(&loaded, &schedule);

        info!(
            run_id = %schedule.run_id,
            meetings = meetings.len(),
            generated = schedule.generated_count(),
            "排程完成"
        );

        Ok(ScheduleOutcome {
            run_id: schedule.run_id,
            status: outcome.status,
            schedule,
            meetings,
            team_summaries,
            person_summaries,
        })
    }

    /// 按队并行生成候选窗口,再按队序收拢保证可复现
    async fn generate_candidates(
        &self,
        loaded: Arc<LoadedInput>,
        index: Arc<AvailabilityIndex>,
    ) -> SchedResult<Vec<(TeamId, Vec<CandidateWindow>)>> {
        let mut handles = Vec::with_capacity(loaded.teams.len());
        for team in &loaded.teams {
            let generator = self.generator.clone();
            let loaded = Arc::clone(&loaded);
            let index = Arc::clone(&index);
            let team_id = team.id;
            handles.push(tokio::spawn(async move {
                (team_id, generator.windows_for_team(&loaded, &index, team_id))
            }));
        }

        let mut results = futures::future::try_join_all(handles)
            .await
            .map_err(|e| SchedulerError::Other(anyhow!("候选生成任务失败: {e}")))?;
        results.sort_by_key(|(team, _)| *team);

        debug!(
            windows = results.iter().map(|(_, w)| w.len()).sum::<usize>(),
            "候选窗口生成阶段完成"
        );
        Ok(results)
    }
}

/// 无可行解时的逐队诊断摘要
fn infeasibility_summary(
    loaded: &LoadedInput,
    candidates: &[(TeamId, Vec<CandidateWindow>)],
) -> String {
    candidates
        .iter()
        .filter(|(team, _)| loaded.need_new(*team) > 0)
        .map(|(team, windows)| {
            format!(
                "{}（需新增 {} 场,候选 {} 窗）",
                loaded.names.team_name(*team),
                loaded.need_new(*team),
                windows.len()
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}
