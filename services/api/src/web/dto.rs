//! services/api/src/web/dto.rs
//!
//! Request and response payloads for the REST API, and their conversions to and
//! from the core domain types.

use axum::http::StatusCode;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use study_planner_core::domain::{
    DailyEntry, DateId, ExamInput, ExamReminder, LateTask, NotificationSettings, Preferences,
    ReviewType, ScheduleTask, StudyInput, Subject, TaskRef, TaskView,
};
use study_planner_core::{
    AchievementReport, DayBoard, EntryDraft, RepairReport, UpcomingExam, Urgency,
};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::HandlerError;

/// Parses a `YYYY-MM-DD` path segment.
pub fn parse_day(raw: &str) -> Result<DateId, HandlerError> {
    raw.parse::<DateId>()
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))
}

//=========================================================================================
// Subjects
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct CreateSubjectRequest {
    pub name: String,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateSubjectRequest {
    pub name: Option<String>,
    pub active: Option<bool>,
}

#[derive(Serialize, ToSchema)]
pub struct SubjectResponse {
    pub id: Uuid,
    pub name: String,
    pub active: bool,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<Subject> for SubjectResponse {
    fn from(s: Subject) -> Self {
        Self {
            id: s.id,
            name: s.name,
            active: s.active,
            created_at: s.created_at,
        }
    }
}

//=========================================================================================
// Daily Entries
//=========================================================================================

fn default_focus() -> u8 {
    3
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct StudyInputPayload {
    pub subject_id: Uuid,
    #[serde(default)]
    pub pages: u32,
    /// 1..=5, lower means the subject needs more attention.
    #[serde(default = "default_focus")]
    pub focus: u8,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ExamPayload {
    pub subject_name: String,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub required_hours: f64,
    #[serde(default)]
    pub pages: u32,
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum ReviewTypePayload {
    Solving,
    Summaries,
    Videos,
}

#[derive(Serialize, Deserialize, ToSchema, Default)]
pub struct NotificationsPayload {
    #[serde(default)]
    pub daily_reminder: bool,
    /// Remind one day before each exam.
    #[serde(default)]
    pub exam_reminders: bool,
}

#[derive(Deserialize, ToSchema)]
pub struct SubmitEntryRequest {
    #[serde(default)]
    pub studied: Vec<StudyInputPayload>,
    #[serde(default)]
    pub available_hours: f64,
    #[serde(default)]
    pub exam_tasks: Vec<ExamPayload>,
    #[serde(default)]
    pub review_types: Vec<ReviewTypePayload>,
    #[serde(default)]
    pub notifications: NotificationsPayload,
}

#[derive(Serialize, ToSchema)]
pub struct EntryResponse {
    pub date_id: String,
    pub studied: Vec<StudyInputPayload>,
    pub available_hours: f64,
    pub exam_tasks: Vec<ExamPayload>,
    pub review_types: Vec<ReviewTypePayload>,
    pub notifications: NotificationsPayload,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<StudyInputPayload> for StudyInput {
    fn from(p: StudyInputPayload) -> Self {
        Self {
            subject_id: p.subject_id,
            pages: p.pages,
            focus: p.focus,
            difficulty: p.difficulty.filter(|d| !d.trim().is_empty()),
            note: p.note.filter(|n| !n.trim().is_empty()),
        }
    }
}

impl From<StudyInput> for StudyInputPayload {
    fn from(s: StudyInput) -> Self {
        Self {
            subject_id: s.subject_id,
            pages: s.pages,
            focus: s.focus,
            difficulty: s.difficulty,
            note: s.note,
        }
    }
}

impl From<ExamPayload> for ExamInput {
    fn from(p: ExamPayload) -> Self {
        Self {
            subject_name: p.subject_name,
            due_date: p.due_date,
            required_hours: p.required_hours,
            pages: p.pages,
        }
    }
}

impl From<ExamInput> for ExamPayload {
    fn from(e: ExamInput) -> Self {
        Self {
            subject_name: e.subject_name,
            due_date: e.due_date,
            required_hours: e.required_hours,
            pages: e.pages,
        }
    }
}

impl From<ReviewTypePayload> for ReviewType {
    fn from(p: ReviewTypePayload) -> Self {
        match p {
            ReviewTypePayload::Solving => ReviewType::Solving,
            ReviewTypePayload::Summaries => ReviewType::Summaries,
            ReviewTypePayload::Videos => ReviewType::Videos,
        }
    }
}

impl From<ReviewType> for ReviewTypePayload {
    fn from(r: ReviewType) -> Self {
        match r {
            ReviewType::Solving => ReviewTypePayload::Solving,
            ReviewType::Summaries => ReviewTypePayload::Summaries,
            ReviewType::Videos => ReviewTypePayload::Videos,
        }
    }
}

impl From<SubmitEntryRequest> for EntryDraft {
    fn from(req: SubmitEntryRequest) -> Self {
        Self {
            studied: req.studied.into_iter().map(Into::into).collect(),
            available_hours: req.available_hours,
            exam_tasks: req.exam_tasks.into_iter().map(Into::into).collect(),
            preferences: Preferences {
                review_types: req.review_types.into_iter().map(Into::into).collect(),
            },
            notifications: NotificationSettings {
                daily_reminder: req.notifications.daily_reminder,
                exam_reminders: if req.notifications.exam_reminders {
                    ExamReminder::DayBefore
                } else {
                    ExamReminder::Off
                },
            },
        }
    }
}

impl From<DailyEntry> for EntryResponse {
    fn from(e: DailyEntry) -> Self {
        Self {
            date_id: e.date_id.to_string(),
            studied: e.studied.into_iter().map(Into::into).collect(),
            available_hours: e.available_hours,
            exam_tasks: e.exam_tasks.into_iter().map(Into::into).collect(),
            review_types: e
                .preferences
                .review_types
                .into_iter()
                .map(Into::into)
                .collect(),
            notifications: NotificationsPayload {
                daily_reminder: e.notifications.daily_reminder,
                exam_reminders: e.notifications.exam_reminders == ExamReminder::DayBefore,
            },
            updated_at: e.updated_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct UpcomingExamResponse {
    pub entry_day: String,
    pub index: usize,
    pub exam: ExamPayload,
    pub days_left: i64,
    /// One of `today`, `tomorrow`, `soon`, `this_week`, `later`.
    pub urgency: String,
}

impl From<UpcomingExam> for UpcomingExamResponse {
    fn from(u: UpcomingExam) -> Self {
        let urgency = match u.urgency {
            Urgency::Today => "today",
            Urgency::Tomorrow => "tomorrow",
            Urgency::Soon => "soon",
            Urgency::ThisWeek => "this_week",
            Urgency::Later => "later",
        };
        Self {
            entry_day: u.entry_day.to_string(),
            index: u.index,
            exam: u.exam.into(),
            days_left: u.days_left,
            urgency: urgency.to_string(),
        }
    }
}

//=========================================================================================
// Tasks
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct TaskRefPayload {
    pub day: String,
    pub id: Uuid,
}

impl From<TaskRef> for TaskRefPayload {
    fn from(r: TaskRef) -> Self {
        Self {
            day: r.day.to_string(),
            id: r.id,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct TaskResponse {
    pub id: Uuid,
    /// The day the task is stored under; together with `id` it addresses the task.
    pub date_id: String,
    pub original_date_id: String,
    pub subject_id: Option<Uuid>,
    pub subject_name: Option<String>,
    pub pages: u32,
    pub minutes: u32,
    pub priority: String,
    pub source: String,
    pub status: String,
    pub completed_pages: Option<u32>,
    pub note: Option<String>,
    pub pulled_from: Option<TaskRefPayload>,
    pub created_at: DateTime<Utc>,
    pub late: bool,
}

impl TaskResponse {
    pub fn new(task: ScheduleTask, late: bool) -> Self {
        Self {
            id: task.id,
            date_id: task.date_id.to_string(),
            original_date_id: task.original_date_id.to_string(),
            subject_id: task.subject_id,
            subject_name: task.subject_name,
            pages: task.pages,
            minutes: task.minutes,
            priority: task.priority.to_string(),
            source: task.source.to_string(),
            status: task.status.to_string(),
            completed_pages: task.completed_pages,
            note: task.note,
            pulled_from: task.pulled_from.map(Into::into),
            created_at: task.created_at,
            late,
        }
    }

    /// Lateness relative to `today`.
    pub fn at(task: ScheduleTask, today: DateId) -> Self {
        let late = task.is_late(today);
        Self::new(task, late)
    }
}

impl From<TaskView> for TaskResponse {
    fn from(v: TaskView) -> Self {
        Self::new(v.task, v.late)
    }
}

#[derive(Serialize, ToSchema)]
pub struct SubmitEntryResponse {
    pub entry: EntryResponse,
    pub tasks: Vec<TaskResponse>,
}

#[derive(Serialize, ToSchema)]
pub struct DayBoardResponse {
    pub date_id: String,
    pub pending_count: usize,
    pub completed_count: usize,
    pub pending: Vec<TaskResponse>,
    pub completed: Vec<TaskResponse>,
}

impl From<DayBoard> for DayBoardResponse {
    fn from(b: DayBoard) -> Self {
        Self {
            date_id: b.date_id.to_string(),
            pending_count: b.pending_count(),
            completed_count: b.completed_count(),
            pending: b.pending.into_iter().map(Into::into).collect(),
            completed: b.completed.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct CompletionRequest {
    pub completed: bool,
    #[serde(default)]
    pub completed_pages: Option<u32>,
}

#[derive(Serialize, ToSchema)]
pub struct LateTaskResponse {
    pub id: Uuid,
    pub origin: TaskRefPayload,
    pub subject_id: Option<Uuid>,
    pub subject_name: Option<String>,
    pub pages: u32,
    pub minutes: u32,
    pub source: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<LateTask> for LateTaskResponse {
    fn from(l: LateTask) -> Self {
        Self {
            id: l.id,
            origin: l.origin.into(),
            subject_id: l.subject_id,
            subject_name: l.subject_name,
            pages: l.pages,
            minutes: l.minutes,
            source: l.source.to_string(),
            created_at: l.created_at,
        }
    }
}

//=========================================================================================
// Reports and Maintenance
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct RangeQuery {
    /// `day`, `week` or `month`; defaults to `day`.
    pub range: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct ReportResponse {
    pub range: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub completed: usize,
    pub pending: usize,
    pub completed_pages: u64,
    pub items: Vec<TaskResponse>,
}

impl ReportResponse {
    pub fn new(report: AchievementReport, today: DateId) -> Self {
        Self {
            range: report.range.to_string(),
            start: report.start,
            end: report.end,
            completed: report.completed,
            pending: report.pending,
            completed_pages: report.completed_pages,
            items: report
                .items
                .into_iter()
                .map(|t| TaskResponse::at(t, today))
                .collect(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct RepairResponse {
    pub removed_blank_subjects: usize,
    pub removed_duplicate_subjects: usize,
    pub backfilled_subjects: usize,
    pub backfilled_entries: usize,
    pub backfilled_late_tasks: usize,
}

impl From<RepairReport> for RepairResponse {
    fn from(r: RepairReport) -> Self {
        Self {
            removed_blank_subjects: r.removed_blank_subjects,
            removed_duplicate_subjects: r.removed_duplicate_subjects,
            backfilled_subjects: r.backfilled_subjects,
            backfilled_entries: r.backfilled_entries,
            backfilled_late_tasks: r.backfilled_late_tasks,
        }
    }
}
