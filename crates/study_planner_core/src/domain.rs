//! crates/study_planner_core/src/domain.rs
//!
//! Defines the pure, core data structures for the study planner.
//! These structs are independent of any database; they derive serde only so
//! that adapters can persist embedded sequences as documents.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub type UserId = Uuid;
pub type SubjectId = Uuid;
pub type TaskId = Uuid;
pub type LateTaskId = Uuid;

//=========================================================================================
// Calendar Day Key
//=========================================================================================

/// Canonical `YYYY-MM-DD` calendar-day key. Every per-day collection is
/// partitioned by this value, and ordering follows the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DateId(NaiveDate);

impl DateId {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl From<NaiveDate> for DateId {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for DateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a YYYY-MM-DD date")]
pub struct DateIdParseError(pub String);

impl FromStr for DateId {
    type Err = DateIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // chrono accepts unpadded fields, the key format does not.
        if s.len() != 10 {
            return Err(DateIdParseError(s.to_string()));
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Self)
            .map_err(|_| DateIdParseError(s.to_string()))
    }
}

impl TryFrom<String> for DateId {
    type Error = DateIdParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DateId> for String {
    fn from(value: DateId) -> Self {
        value.to_string()
    }
}

/// Structural reference to a stored task: the day it is stored under plus its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskRef {
    pub day: DateId,
    pub id: TaskId,
}

impl TaskRef {
    pub fn new(day: DateId, id: TaskId) -> Self {
        Self { day, id }
    }
}

//=========================================================================================
// Subjects and Daily Entries
//=========================================================================================

/// A subject the user studies. Names are unique per user once repaired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    pub active: bool,
    /// Unset only on legacy records; the repair pass backfills it.
    pub created_at: Option<DateTime<Utc>>,
}

/// One studied subject reported in a daily entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyInput {
    pub subject_id: SubjectId,
    pub pages: u32,
    /// 1..=5, lower means the subject needs more attention.
    pub focus: u8,
    pub difficulty: Option<String>,
    pub note: Option<String>,
}

impl StudyInput {
    pub fn needs_attention(&self) -> bool {
        self.focus < 3 || self.has_difficulty()
    }

    pub fn has_difficulty(&self) -> bool {
        self.difficulty
            .as_deref()
            .map(|d| !d.trim().is_empty())
            .unwrap_or(false)
    }
}

/// An upcoming exam or assignment recorded on the day it was entered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamInput {
    pub subject_name: String,
    pub due_date: NaiveDate,
    pub required_hours: f64,
    pub pages: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewType {
    Solving,
    Summaries,
    Videos,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    pub review_types: Vec<ReviewType>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExamReminder {
    #[default]
    Off,
    DayBefore,
}

/// Reminder settings. Stored verbatim; delivery happens elsewhere.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationSettings {
    pub daily_reminder: bool,
    pub exam_reminders: ExamReminder,
}

/// The user's input for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyEntry {
    pub date_id: DateId,
    pub studied: Vec<StudyInput>,
    pub available_hours: f64,
    pub exam_tasks: Vec<ExamInput>,
    pub preferences: Preferences,
    pub notifications: NotificationSettings,
    pub updated_at: Option<DateTime<Utc>>,
}

//=========================================================================================
// Schedule Tasks
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Med,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskSource {
    Exam,
    Entry,
    Late,
}

impl TaskSource {
    /// Tasks produced by the schedule generator, as opposed to pulled copies.
    pub fn is_generated(&self) -> bool {
        matches!(self, TaskSource::Exam | TaskSource::Entry)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Completed,
}

macro_rules! str_enum {
    ($ty:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $text,)+
                }
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($ty::$variant),)+
                    other => Err(format!("unknown {} '{}'", stringify!($ty), other)),
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(Priority { High => "high", Med => "med", Low => "low" });
str_enum!(TaskSource { Exam => "exam", Entry => "entry", Late => "late" });
str_enum!(TaskStatus { Pending => "pending", Completed => "completed" });

/// A creation request emitted by the schedule generator or by a pull.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub subject_id: Option<SubjectId>,
    pub subject_name: Option<String>,
    pub pages: u32,
    pub minutes: u32,
    pub priority: Priority,
    pub source: TaskSource,
    pub note: Option<String>,
    pub pulled_from: Option<TaskRef>,
}

/// A task stored under `date_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleTask {
    pub id: TaskId,
    /// Storage key.
    pub date_id: DateId,
    /// The day the task conceptually belongs to.
    pub original_date_id: DateId,
    pub subject_id: Option<SubjectId>,
    pub subject_name: Option<String>,
    pub pages: u32,
    pub minutes: u32,
    pub priority: Priority,
    pub source: TaskSource,
    pub status: TaskStatus,
    pub completed_pages: Option<u32>,
    pub note: Option<String>,
    pub pulled_from: Option<TaskRef>,
    pub created_at: DateTime<Utc>,
}

impl ScheduleTask {
    /// Materializes a creation request as a pending task under `date_id`.
    pub fn from_new(new: NewTask, date_id: DateId, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            date_id,
            original_date_id: date_id,
            subject_id: new.subject_id,
            subject_name: new.subject_name,
            pages: new.pages,
            minutes: new.minutes,
            priority: new.priority,
            source: new.source,
            status: TaskStatus::Pending,
            completed_pages: None,
            note: new.note,
            pulled_from: new.pulled_from,
            created_at,
        }
    }

    pub fn reference(&self) -> TaskRef {
        TaskRef::new(self.date_id, self.id)
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// Late is derived at view time, never stored.
    pub fn is_late(&self, today: DateId) -> bool {
        self.status == TaskStatus::Pending && self.original_date_id < today
    }
}

/// A task as presented to a caller, tagged with where it lives.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskView {
    pub reference: TaskRef,
    pub late: bool,
    pub task: ScheduleTask,
}

/// A parked late task, pointing at the stored task it stands for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LateTask {
    pub id: LateTaskId,
    pub origin: TaskRef,
    pub subject_id: Option<SubjectId>,
    pub subject_name: Option<String>,
    pub pages: u32,
    pub minutes: u32,
    pub source: TaskSource,
    pub created_at: Option<DateTime<Utc>>,
}
