// ==========================================
// 登山队审议会议排程系统 - MILP 求解边界
// ==========================================
// 职责: 定义"变量/线性约束/目标/限时求解"的窄接口
// 红线: 核心不实现任何分支定界/单纯形算法,只消费该接口
// ==========================================

pub mod backend;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use backend::GoodLpSolver;

// ==========================================
// 变量与线性表达式
// ==========================================

/// 模型内变量句柄（构建顺序下标）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VarId(pub usize);

/// 变量定义域
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum VarDomain {
    Binary,
    /// 下界约束的整数变量
    Integer { min: f64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VarDef {
    pub name: String,
    pub domain: VarDomain,
}

/// 线性表达式: Σ coef·var + constant
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinearExpr {
    pub terms: Vec<(VarId, f64)>,
    pub constant: f64,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_term(&mut self, var: VarId, coef: f64) -> &mut Self {
        self.terms.push((var, coef));
        self
    }
}

/// 约束比较方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CmpOp {
    Le,
    Ge,
    Eq,
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CmpOp::Le => write!(f, "<="),
            CmpOp::Ge => write!(f, ">="),
            CmpOp::Eq => write!(f, "=="),
        }
    }
}

/// 线性约束: expr (<=|>=|==) rhs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearConstraint {
    pub name: String,
    pub expr: LinearExpr,
    pub op: CmpOp,
    pub rhs: f64,
}

// ==========================================
// MilpModel - 不透明模型对象
// ==========================================
// 目标方向固定为最小化
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MilpModel {
    pub variables: Vec<VarDef>,
    pub constraints: Vec<LinearConstraint>,
    pub objective: LinearExpr,
}

impl MilpModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_var(&mut self, name: impl Into<String>, domain: VarDomain) -> VarId {
        let id = VarId(self.variables.len());
        self.variables.push(VarDef {
            name: name.into(),
            domain,
        });
        id
    }

    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        expr: LinearExpr,
        op: CmpOp,
        rhs: f64,
    ) {
        self.constraints.push(LinearConstraint {
            name: name.into(),
            expr,
            op,
            rhs,
        });
    }

    pub fn set_objective(&mut self, objective: LinearExpr) {
        self.objective = objective;
    }

    pub fn num_vars(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }
}

// ==========================================
// 求解结论
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolveStatus {
    Optimal,
    Feasible,
    Infeasible,
    Unbounded,
    TimedOut,
}

impl SolveStatus {
    /// 是否带可用的变量赋值
    pub fn has_assignment(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible)
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveStatus::Optimal => write!(f, "OPTIMAL"),
            SolveStatus::Feasible => write!(f, "FEASIBLE"),
            SolveStatus::Infeasible => write!(f, "INFEASIBLE"),
            SolveStatus::Unbounded => write!(f, "UNBOUNDED"),
            SolveStatus::TimedOut => write!(f, "TIMED_OUT"),
        }
    }
}

/// 求解结果：结论 + （可行时）按 VarId 下标排列的变量取值
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveOutcome {
    pub status: SolveStatus,
    pub values: Vec<f64>,
}

impl SolveOutcome {
    pub fn value(&self, var: VarId) -> f64 {
        self.values[var.0]
    }

    /// 二值变量是否被置位（容忍数值误差）
    pub fn is_set(&self, var: VarId) -> bool {
        self.value(var) > 0.5
    }
}

// ==========================================
// 求解器错误与接口
// ==========================================

#[derive(Error, Debug)]
pub enum SolverError {
    #[error("求解后端失败: {0}")]
    Backend(String),

    #[error("求解任务中断: {0}")]
    Join(String),
}

/// MILP 求解器接口
///
/// 任何满足"变量/线性约束/目标/限时求解"契约的求解器均可替换接入；
/// 超过限时必须返回 TimedOut 而不是挂起。
#[async_trait]
pub trait MilpSolver: Send + Sync {
    async fn solve(
        &self,
        model: &MilpModel,
        time_limit: Duration,
    ) -> Result<SolveOutcome, SolverError>;
}
