// ==========================================
// 登山队审议会议排程系统 - 配置层
// ==========================================
// 职责: 排程参数集中管理（网格边界/法定人数/目标权重/求解限时）
// 红线: 法定人数与权重属外部配置,引擎内不得出现硬编码常量
// ==========================================

pub mod app_config;

// 重导出核心配置类型
pub use app_config::{
    AppConfig, GridConfig, ObjectiveWeights, QuorumConfig, SolverConfig,
};
