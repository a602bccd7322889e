// ==========================================
// 求解边界契约测试
// ==========================================
// 职责: 验证编排器对求解器各结论的处理（接口可替换性）
// 场景: 以桩求解器替换 good_lp 后端
// ==========================================


use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use expedition_review_scheduler::{
    MilpModel, MilpSolver, ScheduleOrchestrator, SchedulerError, SolveOutcome, SolveStatus,
    SolverError,
};
use test_helpers::*;

/// 固定返回指定结论的桩求解器
struct StubSolver {
    status: SolveStatus,
}

#[async_trait]
impl MilpSolver for StubSolver {
    async fn solve(
        &self,
        model: &MilpModel,
        _time_limit: Duration,
    ) -> Result<SolveOutcome, SolverError> {
        let values = if self.status.has_assignment() {
            // 全零赋值: 对"需新增 > 0"的模型必然违反恰好回数
            vec![0.0; model.num_vars()]
        } else {
            Vec::new()
        };
        Ok(SolveOutcome {
            status: self.status,
            values,
        })
    }
}

fn simple_input() -> expedition_review_scheduler::RawInput {
    raw_input(
        vec![
            person_on_days("队长甲", false, false, &[5], codes_free_in(0..8)),
            person_on_days("委员乙", true, true, &[5], codes_free_in(0..8)),
        ],
        vec![team("北壁队", "队长甲", 5, 1)],
        dt(5, 9, 0),
    )
}

#[tokio::test]
async fn test_timed_out_surfaces_as_solver_timeout() {
    let orchestrator = ScheduleOrchestrator::new(
        Arc::new(config(1, 0)),
        StubSolver {
            status: SolveStatus::TimedOut,
        },
    );
    let err = orchestrator.run(&simple_input(), dt(1, 0, 0)).await.unwrap_err();
    match err {
        SchedulerError::SolverTimeout { limit_secs } => assert_eq!(limit_secs, 60),
        other => panic!("应为 SolverTimeout,实际 {other:?}"),
    }
}

#[tokio::test]
async fn test_infeasible_surfaces_with_diagnostics() {
    let orchestrator = ScheduleOrchestrator::new(
        Arc::new(config(1, 0)),
        StubSolver {
            status: SolveStatus::Infeasible,
        },
    );
    let err = orchestrator.run(&simple_input(), dt(1, 0, 0)).await.unwrap_err();
    match err {
        SchedulerError::SolverInfeasible { diagnostics } => {
            assert!(diagnostics.unwrap().contains("北壁队"));
        }
        other => panic!("应为 SolverInfeasible,实际 {other:?}"),
    }
}

#[tokio::test]
async fn test_invariant_violating_assignment_is_consistency_error() {
    // 可行结论 + 全零赋值 → 解映射阶段的恰好回数校验必须拦截
    let orchestrator = ScheduleOrchestrator::new(
        Arc::new(config(1, 0)),
        StubSolver {
            status: SolveStatus::Optimal,
        },
    );
    let err = orchestrator.run(&simple_input(), dt(1, 0, 0)).await.unwrap_err();
    assert!(matches!(err, SchedulerError::Consistency(_)));
}
