// ==========================================
// 登山队审议会议排程系统 - 排程配置
// ==========================================
// 职责: 定义排程运行所需的全部可调参数及其默认值
// 说明: 可整体从 JSON 文件载入（字段缺省时取默认值）
// ==========================================

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

// ==========================================
// GridConfig - 时间网格参数
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// 每日首个槽位的起始整点（默认 9 点）
    pub day_start_hour: u32,

    /// 每日槽位数（默认 26：09:00〜21:30 的 30 分钟起点）
    pub slots_per_day: usize,

    /// 单个槽位的分钟数（默认 30）
    pub slot_minutes: u32,

    /// 单场会议占用的连续槽位数（默认 4，即 2 小时）
    pub meeting_slots: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            day_start_hour: 9,
            slots_per_day: 26,
            slot_minutes: 30,
            meeting_slots: 4,
        }
    }
}

impl GridConfig {
    /// 当日允许的最晚会议开始槽位（保证整场会议不跨日）
    pub fn latest_start_slot(&self) -> usize {
        self.slots_per_day.saturating_sub(self.meeting_slots)
    }
}

// ==========================================
// QuorumConfig - 许可委员构成要求
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuorumConfig {
    /// 每场会议出席的许可委员人数（默认 4）
    pub quorum_size: usize,

    /// 其中上级委员的最低人数（默认 2；0 表示不作要求）
    pub senior_min: usize,
}

impl Default for QuorumConfig {
    fn default() -> Self {
        Self {
            quorum_size: 4,
            senior_min: 2,
        }
    }
}

// ==========================================
// ObjectiveWeights - 目标函数权重
// ==========================================
// 红线: 负担均衡权重必须严格高于延迟权重
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectiveWeights {
    /// 最大个人出席次数（负担均衡）的权重
    pub w_load_balance: f64,

    /// 总延迟（候选槽位相对各队最早可行槽位的距离之和）的权重
    pub w_lateness: f64,
}

impl Default for ObjectiveWeights {
    fn default() -> Self {
        Self {
            w_load_balance: 10.0,
            w_lateness: 0.1,
        }
    }
}

// ==========================================
// SolverConfig - 求解器参数
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// 求解限时（秒），超时返回 TimedOut 而非挂起
    pub time_limit_secs: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_limit_secs: 60,
        }
    }
}

// ==========================================
// AppConfig - 配置聚合根
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub grid: GridConfig,
    pub quorum: QuorumConfig,
    pub weights: ObjectiveWeights,
    pub solver: SolverConfig,
}

impl AppConfig {
    /// 从 JSON 文件载入配置
    ///
    /// # 参数
    /// - path: 配置文件路径
    ///
    /// # 返回
    /// 缺省字段按默认值补齐后的配置
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
        let cfg: AppConfig = serde_json::from_str(&raw)
            .with_context(|| format!("解析配置文件失败: {}", path.display()))?;
        Ok(cfg)
    }
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.grid.day_start_hour, 9);
        assert_eq!(cfg.grid.slots_per_day, 26);
        assert_eq!(cfg.grid.latest_start_slot(), 22); // 26 - 4
        assert_eq!(cfg.quorum.quorum_size, 4);
        assert_eq!(cfg.quorum.senior_min, 2);
        assert!(cfg.weights.w_load_balance > cfg.weights.w_lateness);
        assert_eq!(cfg.solver.time_limit_secs, 60);
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        // 仅覆盖法定人数，其余字段取默认
        let cfg: AppConfig =
            serde_json::from_str(r#"{"quorum": {"quorum_size": 3, "senior_min": 1}}"#).unwrap();
        assert_eq!(cfg.quorum.quorum_size, 3);
        assert_eq!(cfg.quorum.senior_min, 1);
        assert_eq!(cfg.grid.slots_per_day, 26);
    }
}
