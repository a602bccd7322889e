// ==========================================
// 登山队审议会议排程系统 - 输入边界层
// ==========================================
// 职责: 接收外部 I/O 层解析好的普通记录,建立 名称↔内部ID 对照表,
//       归一空闲代码,落位既有会议,产出只读的内部输入聚合
// 红线: 表格解析/写出属外部协作者,本层只认记录
// ==========================================

pub mod loader;
pub mod records;

pub use loader::{LoadedInput, NameTable};
pub use records::{
    DayAvailabilityRecord, FixedMeetingRecord, PersonRecord, RawInput, TeamRecord,
};
