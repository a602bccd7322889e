// ==========================================
// 登山队审议会议排程系统 - 统一错误类型
// ==========================================
// 工具: thiserror 派生宏
// 红线: 所有失败以结构化结果返回,不允许只打日志
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

/// 排程核心错误类型
#[derive(Error, Debug)]
pub enum SchedulerError {
    // ===== 输入数据错误 =====
    #[error("数据错误: {0}")]
    Data(String),

    #[error("日期超出已加载日历范围: {date}")]
    Range { date: NaiveDate },

    // ===== 生成开始校验 =====
    #[error("生成开始时刻已过期 (generation_start={generation_start}, now={now})，不执行优化")]
    PastStart {
        generation_start: NaiveDateTime,
        now: NaiveDateTime,
    },

    // ===== 候选生成失败 =====
    #[error("以下登山队在截止日前不存在任何候选窗口: {}", .teams.join(", "))]
    InfeasibleCandidates { teams: Vec<String> },

    // ===== 求解器结论 =====
    #[error("模型无可行解{}", .diagnostics.as_deref().map(|d| format!("：{d}")).unwrap_or_default())]
    SolverInfeasible { diagnostics: Option<String> },

    #[error("求解超时 (限时 {limit_secs} 秒)，本次运行不产出任何会议")]
    SolverTimeout { limit_secs: u64 },

    // ===== 解后一致性校验（构建器缺陷,必为致命） =====
    #[error("解后一致性校验失败: {0}")]
    Consistency(String),

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<crate::solver::SolverError> for SchedulerError {
    fn from(err: crate::solver::SolverError) -> Self {
        SchedulerError::Other(anyhow::anyhow!(err))
    }
}

/// Result 类型别名
pub type SchedResult<T> = Result<T, SchedulerError>;
