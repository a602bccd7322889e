// ==========================================
// 登山队审议会议排程系统 - good_lp 求解后端
// ==========================================
// 职责: 将不透明模型翻译为 good_lp 问题并限时求解
// 说明: 默认特性启用纯 Rust 的 microlp 后端；求解在阻塞任务中执行,
//       由 tokio 计时器裁决超时,超时即返回 TimedOut（后台线程被放弃）
// ==========================================

use std::time::Duration;

use async_trait::async_trait;
use good_lp::solvers::ObjectiveDirection;
use good_lp::{constraint, default_solver, variable, Expression, ProblemVariables, Solution, SolverModel, Variable};
use tracing::{debug, warn};

use super::{CmpOp, LinearExpr, MilpModel, MilpSolver, SolveOutcome, SolveStatus, SolverError, VarDomain};

// ==========================================
// GoodLpSolver
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct GoodLpSolver;

impl GoodLpSolver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MilpSolver for GoodLpSolver {
    async fn solve(
        &self,
        model: &MilpModel,
        time_limit: Duration,
    ) -> Result<SolveOutcome, SolverError> {
        debug!(
            num_vars = model.num_vars(),
            num_constraints = model.num_constraints(),
            time_limit_secs = time_limit.as_secs(),
            "提交 MILP 模型求解"
        );

        let model = model.clone();
        let handle = tokio::task::spawn_blocking(move || solve_blocking(&model));

        match tokio::time::timeout(time_limit, handle).await {
            // 限时内完成
            Ok(joined) => joined.map_err(|e| SolverError::Join(e.to_string()))?,
            // 超时: 放弃求解线程,按契约返回 TimedOut
            Err(_) => {
                warn!(time_limit_secs = time_limit.as_secs(), "求解超时");
                Ok(SolveOutcome {
                    status: SolveStatus::TimedOut,
                    values: Vec::new(),
                })
            }
        }
    }
}

// ==========================================
// 阻塞求解实现
// ==========================================

fn solve_blocking(model: &MilpModel) -> Result<SolveOutcome, SolverError> {
    let mut vars = ProblemVariables::new();

    // 变量按 VarId 顺序注册,保证取值回读时下标对齐
    let handles: Vec<Variable> = model
        .variables
        .iter()
        .map(|def| {
            let vd = match def.domain {
                VarDomain::Binary => variable().binary(),
                VarDomain::Integer { min } => variable().integer().min(min),
            };
            vars.add(vd.name(def.name.clone()))
        })
        .collect();

    let objective = to_expression(&model.objective, &handles);
    let mut problem = vars
        .optimise(ObjectiveDirection::Minimisation, objective)
        .using(default_solver);

    for c in &model.constraints {
        let lhs = to_expression(&c.expr, &handles);
        let cons = match c.op {
            CmpOp::Le => constraint::leq(lhs, c.rhs),
            CmpOp::Ge => constraint::geq(lhs, c.rhs),
            CmpOp::Eq => constraint::eq(lhs, c.rhs),
        };
        problem = problem.with(cons);
    }

    match problem.solve() {
        Ok(solution) => {
            let values = handles.iter().map(|v| solution.value(*v)).collect();
            Ok(SolveOutcome {
                status: SolveStatus::Optimal,
                values,
            })
        }
        Err(good_lp::ResolutionError::Infeasible) => Ok(SolveOutcome {
            status: SolveStatus::Infeasible,
            values: Vec::new(),
        }),
        Err(good_lp::ResolutionError::Unbounded) => Ok(SolveOutcome {
            status: SolveStatus::Unbounded,
            values: Vec::new(),
        }),
        Err(other) => Err(SolverError::Backend(other.to_string())),
    }
}

fn to_expression(expr: &LinearExpr, handles: &[Variable]) -> Expression {
    let mut out = Expression::default();
    for (var, coef) in &expr.terms {
        out += handles[var.0] * *coef;
    }
    if expr.constant != 0.0 {
        out += expr.constant;
    }
    out
}
