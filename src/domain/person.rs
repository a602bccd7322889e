// ==========================================
// 登山队审议会议排程系统 - 人员与登山队实体
// ==========================================
// 红线: 载入后只读,引擎不得修改
// ==========================================

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::types::{PersonId, TeamId};

// ==========================================
// Person - 人员
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub name: String,          // 唯一显示键
    pub is_committee: bool,    // 许可委员
    pub is_senior: bool,       // 上级委员
}

impl Person {
    /// 是否为可出席会议的上级许可委员
    pub fn is_senior_committee(&self) -> bool {
        self.is_committee && self.is_senior
    }
}

// ==========================================
// Team - 登山队
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,                // 唯一显示键
    pub leader: PersonId,
    pub members: BTreeSet<PersonId>, // 不含 leader
    pub deadline: NaiveDate,         // 当日会议允许,次日起不允许
    pub base_required: u32,
    pub additional_required: u32,    // 追加审议要求（缺省 0）
}

impl Team {
    /// 本次运行结束后该队应有的会议总数
    pub fn total_required(&self) -> u32 {
        self.base_required + self.additional_required
    }

    /// 利益相反集合：队长与队员不得以许可委员身份出席本队会议
    pub fn conflict_of_interest(&self, person: PersonId) -> bool {
        person == self.leader || self.members.contains(&person)
    }
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;

    fn make_team() -> Team {
        Team {
            id: TeamId(0),
            name: "北壁队".to_string(),
            leader: PersonId(0),
            members: [PersonId(1), PersonId(2)].into_iter().collect(),
            deadline: NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
            base_required: 2,
            additional_required: 1,
        }
    }

    #[test]
    fn test_total_required() {
        assert_eq!(make_team().total_required(), 3);
    }

    #[test]
    fn test_conflict_of_interest() {
        let team = make_team();
        assert!(team.conflict_of_interest(PersonId(0))); // 队长
        assert!(team.conflict_of_interest(PersonId(2))); // 队员
        assert!(!team.conflict_of_interest(PersonId(9)));
    }
}
