pub mod achievements;
pub mod domain;
pub mod entries;
pub mod export;
pub mod lifecycle;
pub mod memory;
pub mod planner;
pub mod ports;
pub mod schedule;
pub mod subjects;
pub mod time;

pub use achievements::{AchievementReport, ReportRange};
pub use domain::{
    DailyEntry, DateId, ExamInput, LateTask, NotificationSettings, Preferences, Priority,
    ScheduleTask, StudyInput, Subject, TaskRef, TaskSource, TaskStatus, TaskView, UserId,
};
pub use entries::{EntryDraft, UpcomingExam, Urgency};
pub use lifecycle::DayBoard;
pub use memory::InMemoryStore;
pub use planner::{RegenerationPolicy, StudyPlanner};
pub use ports::{PortError, PortResult, StudyStore};
pub use subjects::RepairReport;
pub use time::{Clock, FixedClock, StudyCalendar, SystemClock};
