// ==========================================
// 登山队审议会议排程系统 - 核心库
// ==========================================
// 技术栈: Rust + good_lp (MILP)
// 系统定位: 批处理排程优化引擎（表格解析/前端为外部协作者）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 输入边界层 - 外部记录装载
pub mod ingest;

// 引擎层 - 排程流水线
pub mod engine;

// 求解边界 - MILP 接口与后端
pub mod solver;

// 汇总层 - 名称键输出
pub mod report;

// 配置层 - 排程参数
pub mod config;

// 统一错误类型
pub mod error;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    AvailabilityCode, CandidateWindow, Meeting, MeetingOrigin, Person, PersonId, Schedule, Team,
    TeamId, TimeGrid,
};

// 输入记录
pub use ingest::{
    DayAvailabilityRecord, FixedMeetingRecord, LoadedInput, NameTable, PersonRecord, RawInput,
    TeamRecord,
};

// 引擎
pub use engine::{
    AvailabilityIndex, BuiltModel, CandidateGenerator, ConstraintModelBuilder,
    ScheduleOrchestrator, ScheduleOutcome, SolutionMapper,
};

// 求解边界
pub use solver::{
    GoodLpSolver, MilpModel, MilpSolver, SolveOutcome, SolveStatus, SolverError,
};

// 汇总
pub use report::{MeetingRow, PersonSummaryRow, TeamSummaryRow};

// 配置与错误
pub use config::AppConfig;
pub use error::{SchedResult, SchedulerError};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "登山队审议会议排程系统";

// ==========================================
// 预编译检查
// ==========================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
