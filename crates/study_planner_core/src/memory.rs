//! crates/study_planner_core/src/memory.rs
//!
//! An in-process `StudyStore`. Backs the test suites and serves as the fallback
//! backend when no database is configured. State lives only as long as the process.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use crate::domain::{
    DailyEntry, DateId, LateTask, LateTaskId, ScheduleTask, Subject, SubjectId, TaskRef,
    TaskStatus, UserId,
};
use crate::ports::{PortError, PortResult, StudyStore};

#[derive(Debug, Default)]
struct UserData {
    subjects: Vec<Subject>,
    entries: BTreeMap<DateId, DailyEntry>,
    tasks: BTreeMap<DateId, Vec<ScheduleTask>>,
    late_tasks: Vec<LateTask>,
}

#[derive(Debug)]
pub struct InMemoryStore {
    users: RwLock<HashMap<UserId, UserData>>,
    /// Remaining task inserts before every further insert fails. `usize::MAX` disables.
    insert_budget: AtomicUsize,
    /// Subject listings that fail before reads succeed again.
    subject_read_failures: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            insert_budget: AtomicUsize::new(usize::MAX),
            subject_read_failures: AtomicUsize::new(0),
        }
    }

    /// Lets `n` more task inserts succeed, then fails the rest.
    pub fn fail_task_inserts_after(&self, n: usize) {
        self.insert_budget.store(n, Ordering::SeqCst);
    }

    /// Fails the next `n` subject listings.
    pub fn fail_next_subject_reads(&self, n: usize) {
        self.subject_read_failures.store(n, Ordering::SeqCst);
    }

    fn take_insert_permit(&self) -> PortResult<()> {
        let granted = self
            .insert_budget
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| match left {
                usize::MAX => Some(usize::MAX),
                0 => None,
                n => Some(n - 1),
            })
            .is_ok();
        if granted {
            Ok(())
        } else {
            Err(PortError::Unexpected("task store unavailable".to_string()))
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn task_not_found(task: TaskRef) -> PortError {
    PortError::NotFound(format!("Task {} on {} not found", task.id, task.day))
}

#[async_trait]
impl StudyStore for InMemoryStore {
    async fn get_or_create_user(&self, user_id: UserId) -> PortResult<()> {
        self.users.write().await.entry(user_id).or_default();
        Ok(())
    }

    async fn list_subjects(&self, user_id: UserId) -> PortResult<Vec<Subject>> {
        let failing = self
            .subject_read_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failing {
            return Err(PortError::Unexpected("subject store unavailable".to_string()));
        }
        let users = self.users.read().await;
        Ok(users
            .get(&user_id)
            .map(|u| u.subjects.clone())
            .unwrap_or_default())
    }

    async fn get_subject(&self, user_id: UserId, subject_id: SubjectId) -> PortResult<Subject> {
        let users = self.users.read().await;
        users
            .get(&user_id)
            .and_then(|u| u.subjects.iter().find(|s| s.id == subject_id))
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Subject {} not found", subject_id)))
    }

    async fn save_subject(&self, user_id: UserId, subject: &Subject) -> PortResult<()> {
        let mut users = self.users.write().await;
        let data = users.entry(user_id).or_default();
        match data.subjects.iter_mut().find(|s| s.id == subject.id) {
            Some(existing) => *existing = subject.clone(),
            None => data.subjects.push(subject.clone()),
        }
        Ok(())
    }

    async fn remove_subject(&self, user_id: UserId, subject_id: SubjectId) -> PortResult<()> {
        if let Some(data) = self.users.write().await.get_mut(&user_id) {
            data.subjects.retain(|s| s.id != subject_id);
        }
        Ok(())
    }

    async fn get_entry(&self, user_id: UserId, date_id: DateId) -> PortResult<Option<DailyEntry>> {
        let users = self.users.read().await;
        Ok(users
            .get(&user_id)
            .and_then(|u| u.entries.get(&date_id))
            .cloned())
    }

    async fn save_entry(&self, user_id: UserId, entry: &DailyEntry) -> PortResult<()> {
        let mut users = self.users.write().await;
        users
            .entry(user_id)
            .or_default()
            .entries
            .insert(entry.date_id, entry.clone());
        Ok(())
    }

    async fn list_entries(&self, user_id: UserId) -> PortResult<Vec<DailyEntry>> {
        let users = self.users.read().await;
        Ok(users
            .get(&user_id)
            .map(|u| u.entries.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn touch_entry(
        &self,
        user_id: UserId,
        date_id: DateId,
        updated_at: DateTime<Utc>,
    ) -> PortResult<()> {
        let mut users = self.users.write().await;
        let entry = users
            .get_mut(&user_id)
            .and_then(|u| u.entries.get_mut(&date_id))
            .ok_or_else(|| PortError::NotFound(format!("Entry {} not found", date_id)))?;
        entry.updated_at = Some(updated_at);
        Ok(())
    }

    async fn insert_task(&self, user_id: UserId, task: &ScheduleTask) -> PortResult<()> {
        self.take_insert_permit()?;
        let mut users = self.users.write().await;
        users
            .entry(user_id)
            .or_default()
            .tasks
            .entry(task.date_id)
            .or_default()
            .push(task.clone());
        Ok(())
    }

    async fn list_tasks(&self, user_id: UserId, date_id: DateId) -> PortResult<Vec<ScheduleTask>> {
        let users = self.users.read().await;
        Ok(users
            .get(&user_id)
            .and_then(|u| u.tasks.get(&date_id))
            .cloned()
            .unwrap_or_default())
    }

    async fn get_task(&self, user_id: UserId, task: TaskRef) -> PortResult<ScheduleTask> {
        let users = self.users.read().await;
        users
            .get(&user_id)
            .and_then(|u| u.tasks.get(&task.day))
            .and_then(|tasks| tasks.iter().find(|t| t.id == task.id))
            .cloned()
            .ok_or_else(|| task_not_found(task))
    }

    async fn update_task_status(
        &self,
        user_id: UserId,
        task: TaskRef,
        status: TaskStatus,
        completed_pages: Option<u32>,
    ) -> PortResult<()> {
        let mut users = self.users.write().await;
        let stored = users
            .get_mut(&user_id)
            .and_then(|u| u.tasks.get_mut(&task.day))
            .and_then(|tasks| tasks.iter_mut().find(|t| t.id == task.id))
            .ok_or_else(|| task_not_found(task))?;
        stored.status = status;
        stored.completed_pages = completed_pages;
        Ok(())
    }

    async fn remove_task(&self, user_id: UserId, task: TaskRef) -> PortResult<()> {
        if let Some(tasks) = self
            .users
            .write()
            .await
            .get_mut(&user_id)
            .and_then(|u| u.tasks.get_mut(&task.day))
        {
            tasks.retain(|t| t.id != task.id);
        }
        Ok(())
    }

    async fn insert_late_task(&self, user_id: UserId, late: &LateTask) -> PortResult<()> {
        let mut users = self.users.write().await;
        users.entry(user_id).or_default().late_tasks.push(late.clone());
        Ok(())
    }

    async fn list_late_tasks(&self, user_id: UserId) -> PortResult<Vec<LateTask>> {
        let users = self.users.read().await;
        Ok(users
            .get(&user_id)
            .map(|u| u.late_tasks.clone())
            .unwrap_or_default())
    }

    async fn remove_late_task(&self, user_id: UserId, late_id: LateTaskId) -> PortResult<()> {
        if let Some(data) = self.users.write().await.get_mut(&user_id) {
            data.late_tasks.retain(|l| l.id != late_id);
        }
        Ok(())
    }

    async fn touch_late_task(
        &self,
        user_id: UserId,
        late_id: LateTaskId,
        created_at: DateTime<Utc>,
    ) -> PortResult<()> {
        let mut users = self.users.write().await;
        let late = users
            .get_mut(&user_id)
            .and_then(|u| u.late_tasks.iter_mut().find(|l| l.id == late_id))
            .ok_or_else(|| PortError::NotFound(format!("Late task {} not found", late_id)))?;
        late.created_at = Some(created_at);
        Ok(())
    }
}
