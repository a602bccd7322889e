// ==========================================
// 登山队审议会议排程系统 - 空闲索引
// ==========================================
// 职责: 按人员×全局槽位的布尔空闲位图
// 输入: 归一后的空闲代码 + 既有会议（Fixed/Prior）
// 红线: 构建时一次性扣除既有会议占用,此后引擎阶段只读
// ==========================================

use tracing::debug;

use crate::domain::{Meeting, PersonId, TimeGrid};
use crate::error::SchedResult;
use crate::ingest::LoadedInput;

// ==========================================
// AvailabilityIndex - 空闲索引
// ==========================================
// 未出现在任何排期表中的日期一律视为不可参加
#[derive(Debug, Clone)]
pub struct AvailabilityIndex {
    slots_per_day: usize,
    free: Vec<Vec<bool>>, // [人员][全局槽位]
}

impl AvailabilityIndex {
    /// 从载入聚合构建空闲索引
    ///
    /// 构建步骤:
    /// 1. 代码行铺入位图（Available → 空闲）
    /// 2. 每场既有会议的槽位区间,对其全体出席者一次性扣除
    pub fn build(loaded: &LoadedInput) -> SchedResult<Self> {
        let grid = &loaded.grid;
        let total = grid.total_slots();
        let mut free = vec![vec![false; total]; loaded.persons.len()];

        for person in &loaded.persons {
            let bitmap = &mut free[person.id.0];
            for (date, codes) in &loaded.availability[person.id.0] {
                let base = grid.first_slot_of_day(*date)?;
                for (intra, code) in codes.iter().enumerate() {
                    bitmap[base + intra] = code.is_available();
                }
            }
        }

        let mut index = Self {
            slots_per_day: grid.slots_per_day(),
            free,
        };

        // 既有会议占用扣除（Fixed 与 Prior 各扣一次,不重复计）
        for meeting in &loaded.preexisting {
            index.mark_meeting_unavailable(meeting, grid);
        }

        debug!(
            persons = index.free.len(),
            total_slots = total,
            preexisting = loaded.preexisting.len(),
            "空闲索引构建完成"
        );
        Ok(index)
    }

    /// 单槽位是否空闲
    pub fn is_free(&self, person: PersonId, slot: usize) -> bool {
        self.free[person.0].get(slot).copied().unwrap_or(false)
    }

    /// 连续区间整体空闲,且区间不跨日
    pub fn is_free_range(&self, person: PersonId, start: usize, len: usize) -> bool {
        if start / self.slots_per_day != (start + len - 1) / self.slots_per_day {
            return false;
        }
        (start..start + len).all(|slot| self.is_free(person, slot))
    }

    /// 扣除一段占用
    pub fn mark_unavailable(&mut self, person: PersonId, start: usize, len: usize) {
        let bitmap = &mut self.free[person.0];
        for slot in start..(start + len).min(bitmap.len()) {
            bitmap[slot] = false;
        }
    }

    fn mark_meeting_unavailable(&mut self, meeting: &Meeting, grid: &TimeGrid) {
        let range = grid.meeting_slots_covered(meeting.start_slot);
        for person in meeting.attendees() {
            self.mark_unavailable(person, range.start, range.end - range.start);
        }
    }
}
