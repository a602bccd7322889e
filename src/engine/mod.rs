// ==========================================
// 登山队审议会议排程系统 - 引擎层
// ==========================================
// 职责: 实现排程流水线各阶段（空闲索引 → 候选生成 → 建模 → 解映射）
// 红线: 数据严格单向流动,任一阶段不得回写上游
// ==========================================

pub mod availability;
pub mod candidate;
pub mod model_builder;
pub mod orchestrator;
pub mod solution_mapper;
pub mod validation;

// 重导出核心引擎
pub use availability::AvailabilityIndex;
pub use candidate::CandidateGenerator;
pub use model_builder::{BuiltModel, ConstraintModelBuilder, ConstraintOrigin};
pub use orchestrator::{ScheduleOrchestrator, ScheduleOutcome};
pub use solution_mapper::SolutionMapper;
