// ==========================================
// 登山队审议会议排程系统 - 时间网格
// ==========================================
// 职责: 日历日期×时刻 与 稠密槽位索引 的双向映射
// 输入: 各排期表涉及的月份 + 截止日 + 生成开始日
// 红线: 日历天数（含闰年）一律由 chrono 推导,不得硬编码
// ==========================================

use std::collections::{BTreeSet, HashMap};

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};

use crate::config::GridConfig;
use crate::error::{SchedResult, SchedulerError};

// ==========================================
// TimeGrid - 时间网格
// ==========================================
// 覆盖日按升序编号；全局槽位 = 日序号 × 每日槽位数 + 日内槽位。
// 覆盖范围 = 排期表月份全月 ∪ 截止日 ∪ 生成开始日，
// 因此任何输入引用的日期要么在网格内，要么直接报 Range 错误。
#[derive(Debug, Clone)]
pub struct TimeGrid {
    day_start_hour: u32,
    slot_minutes: u32,
    slots_per_day: usize,
    meeting_slots: usize,
    days: Vec<NaiveDate>,
    day_index: HashMap<NaiveDate, usize>,
}

impl TimeGrid {
    /// 构建时间网格
    ///
    /// # 参数
    /// - cfg: 网格参数
    /// - sheet_dates: 排期表出现过的日期（所在月份整月纳入覆盖）
    /// - extra_dates: 额外单日覆盖（截止日、生成开始日）
    pub fn build(
        cfg: &GridConfig,
        sheet_dates: &BTreeSet<NaiveDate>,
        extra_dates: &BTreeSet<NaiveDate>,
    ) -> Self {
        let mut days: BTreeSet<NaiveDate> = BTreeSet::new();

        // 排期表月份整月展开（当月天数由日历推导）
        let month_firsts: BTreeSet<NaiveDate> =
            sheet_dates.iter().filter_map(|d| d.with_day(1)).collect();
        for first in month_firsts {
            let month = first.month();
            let mut day = first;
            while day.month() == month {
                days.insert(day);
                match day.succ_opt() {
                    Some(next) => day = next,
                    None => break,
                }
            }
        }

        days.extend(extra_dates.iter().copied());

        let days: Vec<NaiveDate> = days.into_iter().collect();
        let day_index = days
            .iter()
            .enumerate()
            .map(|(idx, d)| (*d, idx))
            .collect();

        Self {
            day_start_hour: cfg.day_start_hour,
            slot_minutes: cfg.slot_minutes,
            slots_per_day: cfg.slots_per_day,
            meeting_slots: cfg.meeting_slots,
            days,
            day_index,
        }
    }

    // ==========================================
    // 基本访问
    // ==========================================

    pub fn slots_per_day(&self) -> usize {
        self.slots_per_day
    }

    pub fn meeting_slots(&self) -> usize {
        self.meeting_slots
    }

    pub fn total_slots(&self) -> usize {
        self.days.len() * self.slots_per_day
    }

    /// 覆盖日（升序）
    pub fn days(&self) -> &[NaiveDate] {
        &self.days
    }

    pub fn contains_day(&self, date: NaiveDate) -> bool {
        self.day_index.contains_key(&date)
    }

    /// 当日允许的最晚会议开始日内槽位
    pub fn latest_start_in_day(&self) -> usize {
        self.slots_per_day.saturating_sub(self.meeting_slots)
    }

    // ==========================================
    // 正向映射: 日期×时刻 → 槽位
    // ==========================================

    /// 日期对应的日序号
    pub fn day_ordinal(&self, date: NaiveDate) -> SchedResult<usize> {
        self.day_index
            .get(&date)
            .copied()
            .ok_or(SchedulerError::Range { date })
    }

    /// 日期当日首个全局槽位
    pub fn first_slot_of_day(&self, date: NaiveDate) -> SchedResult<usize> {
        Ok(self.day_ordinal(date)? * self.slots_per_day)
    }

    /// 日期×时刻 → 全局槽位（时刻向下取整到槽位边界）
    pub fn slot_of(&self, date: NaiveDate, time: NaiveTime) -> SchedResult<usize> {
        let ordinal = self.day_ordinal(date)?;
        let minutes = time.hour() * 60 + time.minute();
        let day_start = self.day_start_hour * 60;
        if minutes < day_start {
            return Err(SchedulerError::Range { date });
        }
        let intra = ((minutes - day_start) / self.slot_minutes) as usize;
        if intra >= self.slots_per_day {
            return Err(SchedulerError::Range { date });
        }
        Ok(ordinal * self.slots_per_day + intra)
    }

    /// 生成开始日期×时刻 → 首个允许的开始槽位下界
    ///
    /// 时刻向上取整；当日已无槽位时落到次日零槽位。
    pub fn start_slot_at_or_after(
        &self,
        date: NaiveDate,
        time: NaiveTime,
    ) -> SchedResult<usize> {
        let ordinal = self.day_ordinal(date)?;
        let minutes = time.hour() * 60 + time.minute();
        let day_start = self.day_start_hour * 60;
        let intra = if minutes <= day_start {
            0
        } else {
            (minutes - day_start).div_ceil(self.slot_minutes) as usize
        };
        Ok(ordinal * self.slots_per_day + intra.min(self.slots_per_day))
    }

    /// 截止日当日允许的最晚会议开始全局槽位
    /// （保证整场会议在截止日内结束）
    pub fn deadline_limit_slot(&self, deadline: NaiveDate) -> SchedResult<usize> {
        Ok(self.day_ordinal(deadline)? * self.slots_per_day + self.latest_start_in_day())
    }

    // ==========================================
    // 反向映射: 槽位 → 日期×时刻
    // ==========================================

    pub fn day_of_slot(&self, slot: usize) -> NaiveDate {
        self.days[slot / self.slots_per_day]
    }

    pub fn intra_of_slot(&self, slot: usize) -> usize {
        slot % self.slots_per_day
    }

    /// 全局槽位 → (日期, 开始时刻)
    pub fn date_time_of(&self, slot: usize) -> (NaiveDate, NaiveTime) {
        (
            self.day_of_slot(slot),
            self.time_of_intra(self.intra_of_slot(slot)),
        )
    }

    /// 以某槽位开始的会议的结束时刻
    pub fn meeting_end_time(&self, start_slot: usize) -> NaiveTime {
        self.time_of_intra(self.intra_of_slot(start_slot) + self.meeting_slots)
    }

    /// 一场会议覆盖的全局槽位区间
    pub fn meeting_slots_covered(&self, start_slot: usize) -> std::ops::Range<usize> {
        start_slot..start_slot + self.meeting_slots
    }

    fn time_of_intra(&self, intra: usize) -> NaiveTime {
        let minutes = self.day_start_hour * 60 + (intra as u32) * self.slot_minutes;
        // 网格参数在载入时已校验不越过午夜
        NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0).unwrap_or(NaiveTime::MIN)
    }
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn grid_for(dates: &[NaiveDate]) -> TimeGrid {
        let sheet: BTreeSet<NaiveDate> = dates.iter().copied().collect();
        TimeGrid::build(&GridConfig::default(), &sheet, &BTreeSet::new())
    }

    #[test]
    fn test_month_expansion_and_total_slots() {
        // 2026-01 整月 31 天
        let grid = grid_for(&[d(2026, 1, 15)]);
        assert_eq!(grid.days().len(), 31);
        assert_eq!(grid.total_slots(), 31 * 26);
        assert!(grid.contains_day(d(2026, 1, 1)));
        assert!(grid.contains_day(d(2026, 1, 31)));
        assert!(!grid.contains_day(d(2026, 2, 1)));
    }

    #[test]
    fn test_leap_year_february() {
        // 闰年 2 月应有 29 天（来自日历推导）
        let grid = grid_for(&[d(2024, 2, 10)]);
        assert_eq!(grid.days().len(), 29);
        assert!(grid.contains_day(d(2024, 2, 29)));
    }

    #[test]
    fn test_slot_round_trip() {
        let grid = grid_for(&[d(2026, 1, 15)]);
        // 1 月 3 日 10:30 → 日序号 2, 日内槽位 3
        let slot = grid.slot_of(d(2026, 1, 3), t(10, 30)).unwrap();
        assert_eq!(slot, 2 * 26 + 3);
        let (date, time) = grid.date_time_of(slot);
        assert_eq!(date, d(2026, 1, 3));
        assert_eq!(time, t(10, 30));
        // 2 小时会议的结束时刻
        assert_eq!(grid.meeting_end_time(slot), t(12, 30));
    }

    #[test]
    fn test_slot_of_out_of_range_date() {
        let grid = grid_for(&[d(2026, 1, 15)]);
        let err = grid.slot_of(d(2026, 3, 1), t(9, 0)).unwrap_err();
        assert!(matches!(err, SchedulerError::Range { .. }));
    }

    #[test]
    fn test_slot_of_out_of_day_bounds() {
        let grid = grid_for(&[d(2026, 1, 15)]);
        // 08:00 早于日内首槽位
        assert!(grid.slot_of(d(2026, 1, 3), t(8, 0)).is_err());
        // 22:00 晚于日内末槽位（21:30）
        assert!(grid.slot_of(d(2026, 1, 3), t(22, 0)).is_err());
    }

    #[test]
    fn test_extra_dates_extend_coverage() {
        let sheet: BTreeSet<NaiveDate> = [d(2026, 1, 10)].into_iter().collect();
        let extra: BTreeSet<NaiveDate> = [d(2026, 2, 5)].into_iter().collect();
        let grid = TimeGrid::build(&GridConfig::default(), &sheet, &extra);
        // 1 月整月 + 2 月 5 日单日
        assert_eq!(grid.days().len(), 32);
        assert!(grid.contains_day(d(2026, 2, 5)));
        assert!(!grid.contains_day(d(2026, 2, 4)));
    }

    #[test]
    fn test_start_slot_at_or_after_rounds_up() {
        let grid = grid_for(&[d(2026, 1, 15)]);
        // 10:31 → 向上取整到 11:00 槽位（日内 4）
        let slot = grid.start_slot_at_or_after(d(2026, 1, 1), t(10, 31)).unwrap();
        assert_eq!(slot, 4);
        // 整点边界不取整
        let slot = grid.start_slot_at_or_after(d(2026, 1, 1), t(10, 30)).unwrap();
        assert_eq!(slot, 3);
        // 日始之前 → 当日零槽位
        let slot = grid.start_slot_at_or_after(d(2026, 1, 1), t(7, 0)).unwrap();
        assert_eq!(slot, 0);
    }

    #[test]
    fn test_deadline_limit_slot() {
        let grid = grid_for(&[d(2026, 1, 15)]);
        // 1 月 2 日截止：最晚开始为当日日内槽位 22（20:00）
        let limit = grid.deadline_limit_slot(d(2026, 1, 2)).unwrap();
        assert_eq!(limit, 26 + 22);
        assert_eq!(grid.meeting_end_time(limit), t(22, 0));
    }
}
