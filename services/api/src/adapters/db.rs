//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `StudyStore` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use study_planner_core::domain::{
    DailyEntry, DateId, ExamInput, LateTask, LateTaskId, NotificationSettings, Preferences,
    ScheduleTask, StudyInput, Subject, SubjectId, TaskRef, TaskStatus, UserId,
};
use study_planner_core::ports::{PortError, PortResult, StudyStore};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `StudyStore` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn not_found_or(e: sqlx::Error, what: String) -> PortError {
    match e {
        sqlx::Error::RowNotFound => PortError::NotFound(what),
        _ => PortError::Unexpected(e.to_string()),
    }
}

fn parse_column<T: std::str::FromStr<Err = String>>(value: &str) -> PortResult<T> {
    value.parse().map_err(PortError::Unexpected)
}

/// Count columns are `BIGINT` and hold any `u32`.
fn to_count(value: i64) -> PortResult<u32> {
    u32::try_from(value)
        .map_err(|_| PortError::Unexpected(format!("count column holds {}", value)))
}

fn to_column(value: u32) -> i64 {
    i64::from(value)
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct SubjectRecord {
    id: Uuid,
    name: String,
    active: bool,
    created_at: Option<DateTime<Utc>>,
}
impl SubjectRecord {
    fn to_domain(self) -> Subject {
        Subject {
            id: self.id,
            name: self.name,
            active: self.active,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct EntryRecord {
    date_id: NaiveDate,
    studied: Json<Vec<StudyInput>>,
    available_hours: f64,
    exam_tasks: Json<Vec<ExamInput>>,
    preferences: Json<Preferences>,
    notifications: Json<NotificationSettings>,
    updated_at: Option<DateTime<Utc>>,
}
impl EntryRecord {
    fn to_domain(self) -> DailyEntry {
        DailyEntry {
            date_id: DateId::new(self.date_id),
            studied: self.studied.0,
            available_hours: self.available_hours,
            exam_tasks: self.exam_tasks.0,
            preferences: self.preferences.0,
            notifications: self.notifications.0,
            updated_at: self.updated_at,
        }
    }
}

#[derive(FromRow)]
struct TaskRecord {
    id: Uuid,
    date_id: NaiveDate,
    original_date_id: NaiveDate,
    subject_id: Option<Uuid>,
    subject_name: Option<String>,
    pages: i64,
    minutes: i64,
    priority: String,
    source: String,
    status: String,
    completed_pages: Option<i64>,
    note: Option<String>,
    pulled_from_day: Option<NaiveDate>,
    pulled_from_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}
impl TaskRecord {
    fn to_domain(self) -> PortResult<ScheduleTask> {
        let pulled_from = match (self.pulled_from_day, self.pulled_from_id) {
            (Some(day), Some(id)) => Some(TaskRef::new(DateId::new(day), id)),
            _ => None,
        };
        Ok(ScheduleTask {
            id: self.id,
            date_id: DateId::new(self.date_id),
            original_date_id: DateId::new(self.original_date_id),
            subject_id: self.subject_id,
            subject_name: self.subject_name,
            pages: to_count(self.pages)?,
            minutes: to_count(self.minutes)?,
            priority: parse_column(&self.priority)?,
            source: parse_column(&self.source)?,
            status: parse_column(&self.status)?,
            completed_pages: self.completed_pages.map(to_count).transpose()?,
            note: self.note,
            pulled_from,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct LateTaskRecord {
    id: Uuid,
    origin_day: NaiveDate,
    origin_task_id: Uuid,
    subject_id: Option<Uuid>,
    subject_name: Option<String>,
    pages: i64,
    minutes: i64,
    source: String,
    created_at: Option<DateTime<Utc>>,
}
impl LateTaskRecord {
    fn to_domain(self) -> PortResult<LateTask> {
        Ok(LateTask {
            id: self.id,
            origin: TaskRef::new(DateId::new(self.origin_day), self.origin_task_id),
            subject_id: self.subject_id,
            subject_name: self.subject_name,
            pages: to_count(self.pages)?,
            minutes: to_count(self.minutes)?,
            source: parse_column(&self.source)?,
            created_at: self.created_at,
        })
    }
}

const TASK_COLUMNS: &str = "id, date_id, original_date_id, subject_id, subject_name, pages, minutes, \
     priority, source, status, completed_pages, note, pulled_from_day, pulled_from_id, created_at";

const ENTRY_COLUMNS: &str =
    "date_id, studied, available_hours, exam_tasks, preferences, notifications, updated_at";

//=========================================================================================
// `StudyStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl StudyStore for DbAdapter {
    async fn get_or_create_user(&self, user_id: UserId) -> PortResult<()> {
        sqlx::query("INSERT INTO users (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn list_subjects(&self, user_id: UserId) -> PortResult<Vec<Subject>> {
        let records = sqlx::query_as::<_, SubjectRecord>(
            "SELECT id, name, active, created_at FROM subjects WHERE user_id = $1 \
             ORDER BY created_at ASC NULLS FIRST, id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn get_subject(&self, user_id: UserId, subject_id: SubjectId) -> PortResult<Subject> {
        let record = sqlx::query_as::<_, SubjectRecord>(
            "SELECT id, name, active, created_at FROM subjects WHERE user_id = $1 AND id = $2",
        )
        .bind(user_id)
        .bind(subject_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or(e, format!("Subject {} not found", subject_id)))?;
        Ok(record.to_domain())
    }

    async fn save_subject(&self, user_id: UserId, subject: &Subject) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO subjects (id, user_id, name, active, created_at) VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name, active = EXCLUDED.active, \
             created_at = EXCLUDED.created_at",
        )
        .bind(subject.id)
        .bind(user_id)
        .bind(&subject.name)
        .bind(subject.active)
        .bind(subject.created_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn remove_subject(&self, user_id: UserId, subject_id: SubjectId) -> PortResult<()> {
        sqlx::query("DELETE FROM subjects WHERE user_id = $1 AND id = $2")
            .bind(user_id)
            .bind(subject_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn get_entry(&self, user_id: UserId, date_id: DateId) -> PortResult<Option<DailyEntry>> {
        let record = sqlx::query_as::<_, EntryRecord>(&format!(
            "SELECT {} FROM daily_entries WHERE user_id = $1 AND date_id = $2",
            ENTRY_COLUMNS
        ))
        .bind(user_id)
        .bind(date_id.date())
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(|r| r.to_domain()))
    }

    async fn save_entry(&self, user_id: UserId, entry: &DailyEntry) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO daily_entries \
             (user_id, date_id, studied, available_hours, exam_tasks, preferences, notifications, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (user_id, date_id) DO UPDATE SET studied = EXCLUDED.studied, \
             available_hours = EXCLUDED.available_hours, exam_tasks = EXCLUDED.exam_tasks, \
             preferences = EXCLUDED.preferences, notifications = EXCLUDED.notifications, \
             updated_at = EXCLUDED.updated_at",
        )
        .bind(user_id)
        .bind(entry.date_id.date())
        .bind(Json(&entry.studied))
        .bind(entry.available_hours)
        .bind(Json(&entry.exam_tasks))
        .bind(Json(&entry.preferences))
        .bind(Json(&entry.notifications))
        .bind(entry.updated_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn list_entries(&self, user_id: UserId) -> PortResult<Vec<DailyEntry>> {
        let records = sqlx::query_as::<_, EntryRecord>(&format!(
            "SELECT {} FROM daily_entries WHERE user_id = $1 ORDER BY date_id ASC",
            ENTRY_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn touch_entry(
        &self,
        user_id: UserId,
        date_id: DateId,
        updated_at: DateTime<Utc>,
    ) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE daily_entries SET updated_at = $1 WHERE user_id = $2 AND date_id = $3",
        )
        .bind(updated_at)
        .bind(user_id)
        .bind(date_id.date())
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Entry {} not found", date_id)));
        }
        Ok(())
    }

    async fn insert_task(&self, user_id: UserId, task: &ScheduleTask) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO schedule_tasks (id, user_id, date_id, original_date_id, subject_id, \
             subject_name, pages, minutes, priority, source, status, completed_pages, note, \
             pulled_from_day, pulled_from_id, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)",
        )
        .bind(task.id)
        .bind(user_id)
        .bind(task.date_id.date())
        .bind(task.original_date_id.date())
        .bind(task.subject_id)
        .bind(&task.subject_name)
        .bind(to_column(task.pages))
        .bind(to_column(task.minutes))
        .bind(task.priority.as_str())
        .bind(task.source.as_str())
        .bind(task.status.as_str())
        .bind(task.completed_pages.map(to_column))
        .bind(&task.note)
        .bind(task.pulled_from.map(|r| r.day.date()))
        .bind(task.pulled_from.map(|r| r.id))
        .bind(task.created_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn list_tasks(&self, user_id: UserId, date_id: DateId) -> PortResult<Vec<ScheduleTask>> {
        let records = sqlx::query_as::<_, TaskRecord>(&format!(
            "SELECT {} FROM schedule_tasks WHERE user_id = $1 AND date_id = $2 \
             ORDER BY created_at ASC, seq ASC",
            TASK_COLUMNS
        ))
        .bind(user_id)
        .bind(date_id.date())
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn get_task(&self, user_id: UserId, task: TaskRef) -> PortResult<ScheduleTask> {
        let record = sqlx::query_as::<_, TaskRecord>(&format!(
            "SELECT {} FROM schedule_tasks WHERE user_id = $1 AND date_id = $2 AND id = $3",
            TASK_COLUMNS
        ))
        .bind(user_id)
        .bind(task.day.date())
        .bind(task.id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or(e, format!("Task {} on {} not found", task.id, task.day)))?;
        record.to_domain()
    }

    async fn update_task_status(
        &self,
        user_id: UserId,
        task: TaskRef,
        status: TaskStatus,
        completed_pages: Option<u32>,
    ) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE schedule_tasks SET status = $1, completed_pages = $2 \
             WHERE user_id = $3 AND date_id = $4 AND id = $5",
        )
        .bind(status.as_str())
        .bind(completed_pages.map(to_column))
        .bind(user_id)
        .bind(task.day.date())
        .bind(task.id)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Task {} on {} not found",
                task.id, task.day
            )));
        }
        Ok(())
    }

    async fn remove_task(&self, user_id: UserId, task: TaskRef) -> PortResult<()> {
        sqlx::query("DELETE FROM schedule_tasks WHERE user_id = $1 AND date_id = $2 AND id = $3")
            .bind(user_id)
            .bind(task.day.date())
            .bind(task.id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn insert_late_task(&self, user_id: UserId, late: &LateTask) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO late_tasks (id, user_id, origin_day, origin_task_id, subject_id, \
             subject_name, pages, minutes, source, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(late.id)
        .bind(user_id)
        .bind(late.origin.day.date())
        .bind(late.origin.id)
        .bind(late.subject_id)
        .bind(&late.subject_name)
        .bind(to_column(late.pages))
        .bind(to_column(late.minutes))
        .bind(late.source.as_str())
        .bind(late.created_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn list_late_tasks(&self, user_id: UserId) -> PortResult<Vec<LateTask>> {
        let records = sqlx::query_as::<_, LateTaskRecord>(
            "SELECT id, origin_day, origin_task_id, subject_id, subject_name, pages, minutes, \
             source, created_at FROM late_tasks WHERE user_id = $1 \
             ORDER BY created_at ASC NULLS FIRST, id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn remove_late_task(&self, user_id: UserId, late_id: LateTaskId) -> PortResult<()> {
        sqlx::query("DELETE FROM late_tasks WHERE user_id = $1 AND id = $2")
            .bind(user_id)
            .bind(late_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn touch_late_task(
        &self,
        user_id: UserId,
        late_id: LateTaskId,
        created_at: DateTime<Utc>,
    ) -> PortResult<()> {
        let result = sqlx::query("UPDATE late_tasks SET created_at = $1 WHERE user_id = $2 AND id = $3")
            .bind(created_at)
            .bind(user_id)
            .bind(late_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Late task {} not found", late_id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_round_trip_through_bigint_columns() {
        for value in [0, 12, i32::MAX as u32 + 1, u32::MAX] {
            assert_eq!(to_count(to_column(value)).unwrap(), value);
        }
    }

    #[test]
    fn out_of_range_counts_are_rejected() {
        assert!(matches!(to_count(-1), Err(PortError::Unexpected(_))));
        assert!(matches!(
            to_count(i64::from(u32::MAX) + 1),
            Err(PortError::Unexpected(_))
        ));
    }
}
