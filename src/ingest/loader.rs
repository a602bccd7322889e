// ==========================================
// 登山队审议会议排程系统 - 输入装载器
// ==========================================
// 职责: 记录 → 内部只读聚合（ID 分配/对照表/网格/既有会议落位）
// 红线: 名称仅在本层与汇总层出现,内部一律 ID 索引
// ==========================================

use std::collections::{BTreeSet, HashMap};

use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::domain::{
    AvailabilityCode, Meeting, MeetingOrigin, Person, PersonId, Team, TeamId, TimeGrid,
};
use crate::error::{SchedResult, SchedulerError};
use crate::ingest::records::{FixedMeetingRecord, RawInput};

// ==========================================
// NameTable - 名称↔ID 双向对照表
// ==========================================
// 载入时建立一次,仅在输入/汇总两个边界使用
#[derive(Debug, Clone, Default)]
pub struct NameTable {
    person_ids: HashMap<String, PersonId>,
    person_names: Vec<String>,
    team_ids: HashMap<String, TeamId>,
    team_names: Vec<String>,
}

impl NameTable {
    pub fn person_id(&self, name: &str) -> Option<PersonId> {
        self.person_ids.get(name).copied()
    }

    pub fn person_name(&self, id: PersonId) -> &str {
        &self.person_names[id.0]
    }

    pub fn team_id(&self, name: &str) -> Option<TeamId> {
        self.team_ids.get(name).copied()
    }

    pub fn team_name(&self, id: TeamId) -> &str {
        &self.team_names[id.0]
    }

    fn push_person(&mut self, name: &str) -> SchedResult<PersonId> {
        if self.person_ids.contains_key(name) {
            return Err(SchedulerError::Data(format!("人员名重复: {name}")));
        }
        let id = PersonId(self.person_names.len());
        self.person_ids.insert(name.to_string(), id);
        self.person_names.push(name.to_string());
        Ok(id)
    }

    fn push_team(&mut self, name: &str) -> SchedResult<TeamId> {
        if self.team_ids.contains_key(name) {
            return Err(SchedulerError::Data(format!("登山队名重复: {name}")));
        }
        let id = TeamId(self.team_names.len());
        self.team_ids.insert(name.to_string(), id);
        self.team_names.push(name.to_string());
        Ok(id)
    }

    fn require_person(&self, name: &str, context: &str) -> SchedResult<PersonId> {
        self.person_id(name)
            .ok_or_else(|| SchedulerError::Data(format!("{context}: 人员 {name} 不在人员名册中")))
    }

    fn require_team(&self, name: &str, context: &str) -> SchedResult<TeamId> {
        self.team_id(name)
            .ok_or_else(|| SchedulerError::Data(format!("{context}: 登山队 {name} 不在队名册中")))
    }
}

// ==========================================
// LoadedInput - 载入完成的只读输入聚合
// ==========================================
#[derive(Debug, Clone)]
pub struct LoadedInput {
    pub persons: Vec<Person>,
    pub teams: Vec<Team>,
    pub names: NameTable,
    pub grid: TimeGrid,
    /// 按人员下标索引的 日期→归一后代码行
    pub availability: Vec<HashMap<NaiveDate, Vec<AvailabilityCode>>>,
    /// 既有会议（Fixed + Prior,均已落位到全局槽位）
    pub preexisting: Vec<Meeting>,
    pub generation_start: NaiveDateTime,
    /// 新生成会议允许的最早开始槽位
    pub generation_start_slot: usize,
}

impl LoadedInput {
    /// 某队既有会议（Fixed + Prior）数量
    pub fn preexisting_count(&self, team: TeamId) -> usize {
        self.preexisting.iter().filter(|m| m.team == team).count()
    }

    /// 某队还需新生成的会议数
    pub fn need_new(&self, team: TeamId) -> u32 {
        let total = self.teams[team.0].total_required();
        total.saturating_sub(self.preexisting_count(team) as u32)
    }
}

// ==========================================
// 装载入口
// ==========================================

/// 将外部记录装载为内部只读聚合
///
/// # 失败
/// - Data: 名称重复/引用缺失/代码行长度不符/网格参数不合法
/// - Range: 既有会议日期或时刻超出网格
pub fn load(input: &RawInput, config: &AppConfig) -> SchedResult<LoadedInput> {
    check_grid_config(config)?;

    // ===== 人员与对照表 =====
    let mut names = NameTable::default();
    let mut persons = Vec::with_capacity(input.persons.len());
    let mut availability: Vec<HashMap<NaiveDate, Vec<AvailabilityCode>>> =
        Vec::with_capacity(input.persons.len());

    for record in &input.persons {
        let id = names.push_person(&record.name)?;
        persons.push(Person {
            id,
            name: record.name.clone(),
            is_committee: record.is_committee,
            is_senior: record.is_senior,
        });

        // 空闲代码归一（0 视同 4）；同一日期重复时后出现的行覆盖前者
        let mut by_date: HashMap<NaiveDate, Vec<AvailabilityCode>> = HashMap::new();
        for day in &record.availability {
            if day.codes.len() != config.grid.slots_per_day {
                return Err(SchedulerError::Data(format!(
                    "人员 {} 在 {} 的代码行长度为 {}，应为 {}",
                    record.name,
                    day.date,
                    day.codes.len(),
                    config.grid.slots_per_day
                )));
            }
            by_date.insert(
                day.date,
                day.codes.iter().map(|v| AvailabilityCode::from_raw(*v)).collect(),
            );
        }
        availability.push(by_date);
    }

    // ===== 登山队 =====
    let mut teams = Vec::with_capacity(input.teams.len());
    for record in &input.teams {
        let id = names.push_team(&record.name)?;
        let context = format!("登山队 {}", record.name);
        let leader = names.require_person(&record.leader_name, &context)?;
        let mut members = BTreeSet::new();
        for member_name in &record.member_names {
            let member = names.require_person(member_name, &context)?;
            if member != leader {
                members.insert(member);
            }
        }
        teams.push(Team {
            id,
            name: record.name.clone(),
            leader,
            members,
            deadline: record.deadline,
            base_required: record.base_required,
            additional_required: record.additional_required,
        });
    }

    // 队长必须有排期表
    for team in &teams {
        if availability[team.leader.0].is_empty() {
            return Err(SchedulerError::Data(format!(
                "登山队 {} 的队长 {} 没有任何排期表",
                team.name,
                names.person_name(team.leader)
            )));
        }
    }

    // ===== 时间网格 =====
    // 覆盖 = 排期表月份全月 + 各队截止日 + 生成开始日
    let sheet_dates: BTreeSet<NaiveDate> = availability
        .iter()
        .flat_map(|by_date| by_date.keys().copied())
        .collect();
    let mut extra_dates: BTreeSet<NaiveDate> =
        teams.iter().map(|t| t.deadline).collect();
    extra_dates.insert(input.generation_start.date());
    let grid = TimeGrid::build(&config.grid, &sheet_dates, &extra_dates);

    debug!(
        days = grid.days().len(),
        total_slots = grid.total_slots(),
        "时间网格构建完成"
    );

    // ===== 既有会议落位 =====
    let mut preexisting = Vec::new();
    for record in &input.fixed_meetings {
        preexisting.push(load_meeting(record, MeetingOrigin::Fixed, &names, &grid, config)?);
    }
    for record in &input.prior_meetings {
        preexisting.push(load_meeting(record, MeetingOrigin::Prior, &names, &grid, config)?);
    }

    // 既有会议的出席者必须持有排期表（占用扣除的对象）
    for meeting in &preexisting {
        for person in meeting.attendees() {
            if availability[person.0].is_empty() {
                return Err(SchedulerError::Data(format!(
                    "既有会议（{} {}）的出席者 {} 没有任何排期表",
                    names.team_name(meeting.team),
                    grid.day_of_slot(meeting.start_slot),
                    names.person_name(person)
                )));
            }
        }
    }

    // ===== 生成开始槽位 =====
    let generation_start_slot = grid.start_slot_at_or_after(
        input.generation_start.date(),
        input.generation_start.time(),
    )?;

    info!(
        persons = persons.len(),
        teams = teams.len(),
        preexisting = preexisting.len(),
        generation_start_slot,
        "输入装载完成"
    );

    Ok(LoadedInput {
        persons,
        teams,
        names,
        grid,
        availability,
        preexisting,
        generation_start: input.generation_start,
        generation_start_slot,
    })
}

// ==========================================
// 辅助
// ==========================================

fn check_grid_config(config: &AppConfig) -> SchedResult<()> {
    let grid = &config.grid;
    if grid.slot_minutes == 0 || grid.slots_per_day == 0 || grid.meeting_slots == 0 {
        return Err(SchedulerError::Data("网格参数不得为 0".to_string()));
    }
    if grid.meeting_slots > grid.slots_per_day {
        return Err(SchedulerError::Data(format!(
            "单场会议槽位数 {} 超过每日槽位数 {}",
            grid.meeting_slots, grid.slots_per_day
        )));
    }
    // 末槽位结束时刻不得越过午夜
    let day_end_minutes =
        grid.day_start_hour * 60 + (grid.slots_per_day as u32) * grid.slot_minutes;
    if day_end_minutes > 24 * 60 {
        return Err(SchedulerError::Data(format!(
            "每日槽位越过午夜: 起始 {} 点 × {} 槽位 × {} 分钟",
            grid.day_start_hour, grid.slots_per_day, grid.slot_minutes
        )));
    }
    if config.quorum.quorum_size == 0 {
        return Err(SchedulerError::Data("许可委员出席人数不得为 0".to_string()));
    }
    if config.quorum.senior_min > config.quorum.quorum_size {
        return Err(SchedulerError::Data(format!(
            "上级委员最低人数 {} 超过出席人数 {}",
            config.quorum.senior_min, config.quorum.quorum_size
        )));
    }
    Ok(())
}

fn load_meeting(
    record: &FixedMeetingRecord,
    origin: MeetingOrigin,
    names: &NameTable,
    grid: &TimeGrid,
    config: &AppConfig,
) -> SchedResult<Meeting> {
    let context = format!("既有会议（{} {}）", record.team_name, record.date);
    let team = names.require_team(&record.team_name, &context)?;
    let leader = names.require_person(&record.leader_name, &context)?;

    if record.committee_names.is_empty()
        || record.committee_names.len() > config.quorum.quorum_size
    {
        return Err(SchedulerError::Data(format!(
            "{context}: 许可委员人数为 {}，应在 1〜{} 之间",
            record.committee_names.len(),
            config.quorum.quorum_size
        )));
    }
    let mut committee = Vec::with_capacity(record.committee_names.len());
    for name in &record.committee_names {
        let person = names.require_person(name, &context)?;
        if person == leader {
            return Err(SchedulerError::Data(format!(
                "{context}: 队长 {name} 不得同时列为许可委员"
            )));
        }
        if committee.contains(&person) {
            return Err(SchedulerError::Data(format!(
                "{context}: 许可委员 {name} 重复"
            )));
        }
        committee.push(person);
    }

    let start_slot = grid.slot_of(record.date, record.start_time)?;
    // 整场会议必须落在当日之内
    if grid.intra_of_slot(start_slot) > grid.latest_start_in_day() {
        return Err(SchedulerError::Range { date: record.date });
    }

    Ok(Meeting {
        team,
        start_slot,
        leader,
        committee,
        origin,
        meeting_no: None,
        handover_person: None,
    })
}
